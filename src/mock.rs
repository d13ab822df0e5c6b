//! Test doubles for the platform seams.
//!
//! Compiled for unit tests and behind the `mock` feature for integration
//! tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::{Value, json};

use crate::core::clock::Clock;
use crate::core::error::ApiError;
use crate::core::transport::{HttpRequest, Method, RawResponse, Transport};

// ============================================================================
// ManualClock
// ============================================================================

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ============================================================================
// MockTransport
// ============================================================================

type Reply = Result<RawResponse, ApiError>;
type Gate = Shared<oneshot::Receiver<()>>;

#[derive(Default)]
struct MockState {
    /// Keyed by method and path (URL with the origin stripped).
    replies: HashMap<(Method, String), VecDeque<Reply>>,
    defaults: HashMap<(Method, String), Reply>,
    calls: Vec<HttpRequest>,
    gate: Option<Gate>,
}

/// Holds responses back until opened (or dropped).
pub struct ResponseGate {
    sender: oneshot::Sender<()>,
}

impl ResponseGate {
    pub fn open(self) {
        let _ = self.sender.send(());
    }
}

/// Scripted transport that records every request.
///
/// Routes match on method and the request path including its query string;
/// any origin in front of `/api` is ignored. Clones share state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every matching request with `response`.
    pub fn respond(&self, method: Method, path: &str, response: RawResponse) {
        self.state
            .borrow_mut()
            .defaults
            .insert((method, path.to_string()), Ok(response));
    }

    /// Answer the next matching request with `response`, ahead of any default.
    pub fn respond_once(&self, method: Method, path: &str, response: RawResponse) {
        self.state
            .borrow_mut()
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Ok(response));
    }

    /// Fail every matching request at the transport level.
    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.state
            .borrow_mut()
            .defaults
            .insert((method, path.to_string()), Err(error));
    }

    /// Fail only the next matching request.
    pub fn fail_once(&self, method: Method, path: &str, error: ApiError) {
        self.state
            .borrow_mut()
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Err(error));
    }

    /// Hold all responses until the returned gate is opened.
    pub fn pause(&self) -> ResponseGate {
        let (sender, receiver) = oneshot::channel();
        self.state.borrow_mut().gate = Some(receiver.shared());
        ResponseGate { sender }
    }

    /// Every request sent so far, in order.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.state.borrow().calls.clone()
    }

    /// Number of requests sent to `path` with `method`.
    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.method == method && request_path(&call.url) == path)
            .count()
    }

    fn reply_for(&self, method: Method, path: &str) -> Reply {
        let mut state = self.state.borrow_mut();
        let key = (method, path.to_string());
        if let Some(reply) = state.replies.get_mut(&key).and_then(VecDeque::pop_front) {
            return reply;
        }
        state
            .defaults
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Network(format!("no mock route for {} {}", method, path))))
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<RawResponse, ApiError>> {
        let path = request_path(&request.url).to_string();
        let reply = self.reply_for(request.method, &path);

        let gate = {
            let mut state = self.state.borrow_mut();
            state.calls.push(request);
            state.gate.clone()
        };

        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            reply
        }
        .boxed_local()
    }
}

/// Strip scheme and host, keeping path and query.
fn request_path(url: &str) -> &str {
    let Some(rest) = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
    else {
        return url;
    };
    rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/")
}

// ============================================================================
// Payload helpers
// ============================================================================

/// `{ "movies": [...] }` with one minimal movie per id.
pub fn movies_body(ids: &[i64]) -> Value {
    json!({ "movies": movie_array(ids) })
}

/// Bare array of minimal movies.
pub fn movie_array(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({
                    "id": id,
                    "title": format!("Movie {}", id),
                    "poster_path": format!("/poster{}.jpg", id),
                    "vote_average": 7.5,
                    "genre_ids": [18],
                    "release_date": "2020-01-01",
                    "overview": "",
                })
            })
            .collect(),
    )
}
