//! Network fetching with timeout support.
//!
//! Implements [`Transport`] on top of the browser Fetch API, racing each
//! request against a timeout.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use js_sys::{Array, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::core::error::ApiError;
use crate::core::transport::{HttpRequest, RawResponse, Transport};
use crate::utils::dom;

// =============================================================================
// Promise Racing Utilities
// =============================================================================

/// Result of a promise race with timeout.
#[derive(Debug)]
enum RaceResult {
    /// The promise completed before timeout.
    Completed(JsValue),
    /// Timeout occurred before promise completed.
    TimedOut,
    /// Promise rejected with an error.
    Error(String),
}

/// Race a promise against a timeout using `Promise.race`.
async fn race_with_timeout(promise: Promise, timeout_ms: i32) -> RaceResult {
    let Some(window) = dom::window() else {
        return RaceResult::Error("Window not available".to_string());
    };

    // Resolves to undefined, which a fetch never does
    let timeout_promise = Promise::new(&mut |resolve, _| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout_ms);
    });

    let race_array = Array::new();
    race_array.push(&promise);
    race_array.push(&timeout_promise);
    let race_promise = Promise::race(&race_array);

    match JsFuture::from(race_promise).await {
        Ok(result) => {
            if result.is_undefined() {
                RaceResult::TimedOut
            } else {
                RaceResult::Completed(result)
            }
        }
        Err(e) => RaceResult::Error(
            e.as_string()
                .or_else(|| {
                    e.dyn_ref::<js_sys::Error>()
                        .map(|err| String::from(err.message()))
                })
                .unwrap_or_else(|| "Failed to fetch".to_string()),
        ),
    }
}

// =============================================================================
// Fetch Transport
// =============================================================================

/// [`Transport`] backed by `window.fetch`.
#[derive(Debug, Clone, Copy)]
pub struct FetchTransport {
    timeout_ms: i32,
}

impl FetchTransport {
    pub fn new(timeout_ms: i32) -> Self {
        Self { timeout_ms }
    }
}

impl Transport for FetchTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<RawResponse, ApiError>> {
        fetch_raw(request, self.timeout_ms).boxed_local()
    }
}

/// Issue a request and collect status, content type, and body text.
///
/// Non-2xx statuses are returned as responses; interpreting them is the
/// client's job.
async fn fetch_raw(request: HttpRequest, timeout_ms: i32) -> Result<RawResponse, ApiError> {
    let window = dom::window().ok_or(ApiError::NoWindow)?;

    let opts = RequestInit::new();
    opts.set_method(request.method.as_str());
    opts.set_mode(RequestMode::Cors);

    let headers = Headers::new().map_err(|_| ApiError::RequestCreationFailed)?;
    for (name, value) in &request.headers {
        headers
            .set(name, value)
            .map_err(|_| ApiError::RequestCreationFailed)?;
    }
    opts.set_headers(&headers);

    if let Some(body) = &request.body {
        opts.set_body(&JsValue::from_str(body));
    }

    let js_request = Request::new_with_str_and_init(&request.url, &opts)
        .map_err(|_| ApiError::RequestCreationFailed)?;

    let fetch_promise = window.fetch_with_request(&js_request);

    match race_with_timeout(fetch_promise, timeout_ms).await {
        RaceResult::TimedOut => Err(ApiError::Timeout),
        RaceResult::Error(msg) => Err(ApiError::Network(msg)),
        RaceResult::Completed(result) => {
            let resp: Response = result.dyn_into().map_err(|_| ApiError::ResponseReadFailed)?;

            let content_type = resp
                .headers()
                .get("content-type")
                .ok()
                .flatten()
                .unwrap_or_default();

            let text = JsFuture::from(resp.text().map_err(|_| ApiError::ResponseReadFailed)?)
                .await
                .map_err(|_| ApiError::ResponseReadFailed)?;

            Ok(RawResponse {
                status: resp.status(),
                content_type,
                body: text.as_string().unwrap_or_default(),
            })
        }
    }
}
