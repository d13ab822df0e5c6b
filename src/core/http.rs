//! HTTP client for the movie backend.
//!
//! Resolves paths against the configured origin, attaches the stored bearer
//! token, and folds every outcome into a single `Result`: parsed body on
//! 2xx, [`ApiError`] otherwise. The client never touches cache or session
//! state itself.

use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use log::{debug, error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::core::error::ApiError;
use crate::core::storage::{LocalTokenStore, TokenStore};
use crate::core::transport::{HttpRequest, Method, RawResponse, Transport};
use crate::models::{MovieSummary, decode_movie_list};
use crate::utils::{FetchTransport, resolve_api_url};

// =============================================================================
// Request / Response Types
// =============================================================================

/// Per-request options, mirroring the subset of `fetch` options in use.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::get()
        }
    }

    /// Request with a JSON body and matching `Content-Type`.
    pub fn json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Self {
            method,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Explicit bearer token; suppresses the automatic one from storage.
    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    fn has_authorization(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"))
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Successful response body, parsed according to its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Deserialize the body. Text bodies are parsed as JSON as a fallback.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            Self::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
            }
        }
    }

    /// Decode a movie list from either `{ movies: [...] }` or a bare array.
    pub fn into_movies(self) -> Result<Vec<MovieSummary>, ApiError> {
        match self {
            Self::Json(value) => decode_movie_list(value),
            Self::Text(_) => Err(ApiError::Decode("expected a JSON movie list".to_string())),
        }
    }

    /// Message from a FastAPI-style `detail` or a generic `message` field.
    fn error_message(&self) -> Option<String> {
        let Self::Json(value) = self else {
            return None;
        };
        ["detail", "message"]
            .iter()
            .find_map(|field| value.get(field).and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// Interpret a raw response: parse by content type, then map non-2xx to an error.
pub fn parse_response(raw: RawResponse) -> Result<ResponseBody, ApiError> {
    let success = raw.is_success();
    let body = if raw.content_type.contains("application/json") {
        // Unparseable JSON is treated as an empty body
        ResponseBody::Json(serde_json::from_str(&raw.body).unwrap_or(Value::Null))
    } else {
        ResponseBody::Text(raw.body)
    };

    if !success {
        let message = body
            .error_message()
            .unwrap_or_else(|| format!("Request failed: {}", raw.status));
        return Err(ApiError::Status {
            status: raw.status,
            message,
        });
    }

    Ok(body)
}

// =============================================================================
// ApiClient
// =============================================================================

/// Thin HTTP shim used by the cache and session layers.
pub struct ApiClient {
    config: ApiConfig,
    transport: Rc<dyn Transport>,
    tokens: Rc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, transport: Rc<dyn Transport>, tokens: Rc<dyn TokenStore>) -> Self {
        Self {
            config,
            transport,
            tokens,
        }
    }

    /// Client wired to `fetch` and localStorage, using the compile-time origin.
    pub fn browser() -> Self {
        let config = ApiConfig::from_env();
        let transport = Rc::new(FetchTransport::new(config.timeout_ms));
        Self::new(config, transport, Rc::new(LocalTokenStore::new()))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Full URL for a request path.
    pub fn url_for(&self, path: &str) -> String {
        resolve_api_url(&self.config.origin, path)
    }

    /// Send a request and parse the response.
    ///
    /// The request is built and handed to the transport before this returns,
    /// so the token is read at call time. The returned future owns
    /// everything it needs.
    pub fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> LocalBoxFuture<'static, Result<ResponseBody, ApiError>> {
        let mut headers = options.headers.clone();
        if !options.has_authorization()
            && let Some(token) = self.tokens.get()
        {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let request = HttpRequest {
            method: options.method,
            url: self.url_for(path),
            headers,
            body: options.body,
        };

        debug!(
            "[api] {} {} (body: {})",
            request.method,
            request.url,
            request.body.is_some()
        );

        let method = request.method;
        let url = request.url.clone();
        let pending = self.transport.send(request);

        async move {
            let result = pending.await.and_then(parse_response);
            match &result {
                Ok(_) => debug!("[api] {} {} ok", method, url),
                Err(e) => error!("[api] {} {} failed: {}", method, url, e),
            }
            result
        }
        .boxed_local()
    }

    /// GET and deserialize.
    pub fn get<T: DeserializeOwned + 'static>(
        &self,
        path: &str,
    ) -> LocalBoxFuture<'static, Result<T, ApiError>> {
        let pending = self.request(path, RequestOptions::get());
        async move { pending.await?.decode() }.boxed_local()
    }

    /// Send a JSON body and deserialize the response.
    pub fn send_json<B, T>(
        &self,
        path: &str,
        method: Method,
        body: &B,
    ) -> LocalBoxFuture<'static, Result<T, ApiError>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + 'static,
    {
        let options = match RequestOptions::json(method, body) {
            Ok(options) => options,
            Err(e) => return futures::future::ready(Err(e)).boxed_local(),
        };
        let pending = self.request(path, options);
        async move { pending.await?.decode() }.boxed_local()
    }

    /// GET a movie list endpoint.
    pub fn get_movies(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<MovieSummary>, ApiError>> {
        let pending = self.request(path, RequestOptions::get());
        async move { pending.await?.into_movies() }.boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryTokenStore;
    use crate::mock::MockTransport;
    use serde_json::json;

    const ORIGIN: &str = "http://api.test";

    fn client(transport: &MockTransport, tokens: MemoryTokenStore) -> ApiClient {
        ApiClient::new(
            ApiConfig::new(ORIGIN),
            Rc::new(transport.clone()),
            Rc::new(tokens),
        )
    }

    #[test]
    fn test_parse_json_success() {
        let body = parse_response(RawResponse::json(200, &json!({"movies": []}))).unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"movies": []})));
    }

    #[test]
    fn test_parse_text_success() {
        let body = parse_response(RawResponse::text(200, "pong")).unwrap();
        assert_eq!(body, ResponseBody::Text("pong".to_string()));
    }

    #[test]
    fn test_parse_error_uses_detail() {
        let err = parse_response(RawResponse::json(400, &json!({"detail": "Email already registered"})))
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: "Email already registered".to_string()
            }
        );
    }

    #[test]
    fn test_parse_error_uses_message_field() {
        let err = parse_response(RawResponse::json(500, &json!({"message": "boom"}))).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_parse_error_generic_message() {
        let err = parse_response(RawResponse::text(502, "<html>bad gateway</html>")).unwrap_err();
        assert_eq!(err.to_string(), "Request failed: 502");
        assert_eq!(err.status(), Some(502));

        let err = parse_response(RawResponse::json(404, &json!({"detail": [1, 2]}))).unwrap_err();
        assert_eq!(err.to_string(), "Request failed: 404");
    }

    #[test]
    fn test_parse_malformed_json_is_null() {
        let raw = RawResponse {
            status: 200,
            content_type: "application/json".to_string(),
            body: "{not json".to_string(),
        };
        assert_eq!(parse_response(raw).unwrap(), ResponseBody::Json(Value::Null));
    }

    #[test]
    fn test_parse_status_range() {
        assert_eq!(
            parse_response(RawResponse::text(204, "")).unwrap(),
            ResponseBody::Text(String::new())
        );
        let err = parse_response(RawResponse::text(301, "")).unwrap_err();
        assert_eq!(err.status(), Some(301));
        assert_eq!(err.to_string(), "Request failed: 301");
    }

    #[tokio::test]
    async fn test_injects_stored_token() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/api/user/history/", RawResponse::json(200, &json!({"movies": []})));
        let api = client(&transport, MemoryTokenStore::with_token("tok-1"));

        api.request("/api/user/history/", RequestOptions::get()).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://api.test/api/user/history/");
        assert_eq!(calls[0].header("Authorization"), Some("Bearer tok-1"));
    }

    #[tokio::test]
    async fn test_explicit_authorization_wins() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/api/current_user", RawResponse::json(200, &json!({})));
        let api = client(&transport, MemoryTokenStore::with_token("stored"));

        api.request("/api/current_user", RequestOptions::get().with_bearer("fresh"))
            .await
            .unwrap();

        let calls = transport.calls();
        let auth: Vec<_> = calls[0]
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(calls[0].header("authorization"), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn test_no_token_no_header() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/api/cold-sample", RawResponse::json(200, &json!({"movies": []})));
        let api = client(&transport, MemoryTokenStore::new());

        api.get_movies("/api/cold-sample").await.unwrap();
        assert_eq!(transport.calls()[0].header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_send_json_sets_body_and_content_type() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Post,
            "/api/login",
            RawResponse::json(200, &json!({"access_token": "t", "token_type": "bearer"})),
        );
        let api = client(&transport, MemoryTokenStore::new());

        let response: Value = api
            .send_json("/api/login", Method::Post, &json!({"email": "a@b.c", "password": "pw"}))
            .await
            .unwrap();
        assert_eq!(response["access_token"], "t");

        let call = &transport.calls()[0];
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.header("Content-Type"), Some("application/json"));
        let sent: Value = serde_json::from_str(call.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"email": "a@b.c", "password": "pw"}));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = MockTransport::new();
        transport.fail(Method::Get, "/api/search?query=up", ApiError::Network("offline".into()));
        let api = client(&transport, MemoryTokenStore::new());

        let err = api.get_movies("/api/search?query=up").await.unwrap_err();
        assert_eq!(err, ApiError::Network("offline".into()));
    }
}
