//! Scripted in-memory transport for tests.
//!
//! Enabled with the `test-util` feature.
//!
//! ```rust,ignore
//! let transport = Arc::new(MockTransport::new());
//! transport.push_ok(json!([{"update_id": 5}]));
//! // ...run code that calls getUpdates...
//! assert_eq!(transport.request_json(0)["limit"], 100);
//! ```
//!
//! Replies are consumed in order. Once the script is exhausted every further
//! request hangs forever, like a long poll with no pending updates; pair it
//! with a cancellation token.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::error::{TransportError, TransportResult};
use crate::transport::{FormPart, HttpRequest, HttpResponse, HttpTransport};

enum Reply {
    Response(HttpResponse),
    Error(TransportError),
}

/// An [`HttpTransport`] that records requests and replays scripted replies.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    notify: Notify,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful envelope carrying `result`.
    pub fn push_ok(&self, result: Value) {
        self.push_json(200, json!({ "ok": true, "result": result }));
    }

    /// Queues a JSON body with the given status.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string());
    }

    /// Queues a raw body with the given status.
    pub fn push_raw(&self, status: u16, body: impl Into<String>) {
        self.replies.lock().push_back(Reply::Response(HttpResponse {
            status,
            body: body.into().into_bytes(),
        }));
    }

    /// Queues a transport-level failure.
    pub fn push_error(&self, error: TransportError) {
        self.replies.lock().push_back(Reply::Error(error));
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Decodes the body of the `index`-th request as JSON.
    ///
    /// # Panics
    ///
    /// Panics if there is no such request or its body is not JSON.
    pub fn request_json(&self, index: usize) -> Value {
        let requests = self.requests.lock();
        let bytes = requests[index]
            .body
            .as_bytes()
            .expect("request body is multipart");
        serde_json::from_slice(bytes).expect("request body is not JSON")
    }

    /// Returns the form fields of the `index`-th request.
    ///
    /// # Panics
    ///
    /// Panics if there is no such request or its body is not multipart.
    pub fn request_parts(&self, index: usize) -> Vec<FormPart> {
        let requests = self.requests.lock();
        requests[index]
            .body
            .parts()
            .expect("request body is not multipart")
            .to_vec()
    }

    /// Waits until at least `n` requests have been recorded.
    pub async fn wait_for_requests(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.request_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        self.requests.lock().push(request);
        self.notify.notify_waiters();

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(error)) => Err(error),
            None => std::future::pending().await,
        }
    }
}
