//! The request pipeline: validate, serialize, send, decode.
//!
//! [`execute`] performs exactly one HTTP call per invocation and never
//! retries. Callers that want to honour `retry_after` inspect the returned
//! [`ApiError`] and call again.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::api_url::{ApiUrl, DEFAULT_API_URL};
use crate::error::{ApiError, ApiResult, DisplayParameters};
use crate::envelope::Envelope;
use crate::request::RequestBody;
use crate::transport::{HttpRequest, HttpTransport};

/// Per-call options.
///
/// Unset fields fall back to their defaults when the call runs:
///
/// | Field | Default |
/// |-------|---------|
/// | `api_url` | [`DEFAULT_API_URL`] (invalid templates also fall back) |
/// | `cancel` | never cancelled |
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Endpoint URL template with `{token}` and `{method}` placeholders.
    pub api_url: Option<String>,
    /// Cancels the in-flight call when triggered.
    pub cancel: Option<CancellationToken>,
}

impl ExecuteOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint URL template.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Layers `other` on top of `self`: fields set in `other` win.
    pub fn merge(self, other: ExecuteOptions) -> Self {
        Self {
            api_url: other.api_url.or(self.api_url),
            cancel: other.cancel.or(self.cancel),
        }
    }

    fn api_url(&self) -> ApiUrl {
        ApiUrl::parse_or_default(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    }
}

/// Executes `body` and returns the raw result payload.
///
/// `Ok(None)` means the call succeeded without a result.
pub async fn execute<B>(
    transport: &dyn HttpTransport,
    token: &str,
    body: &B,
    options: &ExecuteOptions,
) -> ApiResult<Option<Value>>
where
    B: RequestBody + ?Sized,
{
    let method = body.endpoint();

    body.validate()?;

    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }

    // Reader first: the content type describes the payload just built.
    let payload = body.reader()?;
    let content_type = body.content_type();

    let request = HttpRequest {
        url: options.api_url().format(token, method),
        content_type,
        body: payload,
    };

    debug!(method = %method, len = request.body.len(), "Calling Bot API");

    let response = match &options.cancel {
        Some(cancel) => {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ApiError::Cancelled),
                response = transport.post(request) => response?,
            }
        }
        None => transport.post(request).await?,
    };

    trace!(method = %method, status = response.status, "Bot API response");

    let envelope = Envelope::parse(response.status, &response.body)?;
    if !envelope.ok {
        debug!(
            method = %method,
            code = ?envelope.error_code,
            parameters = %DisplayParameters(&envelope.parameters),
            "Bot API reported failure",
        );
    }
    envelope.into_result()
}

/// Executes `body` and decodes its result into `T`.
///
/// A missing result decodes as JSON `null`, so `Option<_>` accepts calls that
/// return nothing. Use [`execute`] and drop the value to ignore the payload.
pub async fn execute_into<T, B>(
    transport: &dyn HttpTransport,
    token: &str,
    body: &B,
    options: &ExecuteOptions,
) -> ApiResult<T>
where
    T: DeserializeOwned,
    B: RequestBody + ?Sized,
{
    let raw = execute(transport, token, body, options).await?;
    serde_json::from_value(raw.unwrap_or(Value::Null))
        .map_err(|e| ApiError::ResultDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::error::{TransportError, ValidationError, ValidationResult};
    use crate::request::{JSON_CONTENT_TYPE, MULTIPART_CONTENT_TYPE, json_body};
    use crate::testing::MockTransport;
    use crate::transport::{FormPart, FormValue, HttpBody};
    use crate::types::User;

    struct SendText {
        text: String,
    }

    impl RequestBody for SendText {
        fn endpoint(&self) -> &str {
            "sendMessage"
        }

        fn validate(&self) -> ValidationResult {
            let len = self.text.chars().count();
            if !(1..=4096).contains(&len) {
                return Err(ValidationError::new(
                    "text parameter must be between 1 and 4096 characters",
                ));
            }
            Ok(())
        }

        fn reader(&self) -> ApiResult<HttpBody> {
            json_body(&json!({ "chat_id": 1, "text": self.text }))
        }

        fn content_type(&self) -> String {
            JSON_CONTENT_TYPE.to_string()
        }
    }

    fn text(s: &str) -> SendText {
        SendText { text: s.to_string() }
    }

    #[tokio::test]
    async fn test_validation_short_circuits_network() {
        let transport = MockTransport::new();
        let err = execute(&transport, "123:abc", &text(""), &ExecuteOptions::new())
            .await
            .unwrap_err();

        match err {
            ApiError::Validation(e) => assert_eq!(
                e.message(),
                "text parameter must be between 1 and 4096 characters"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let transport = MockTransport::new();
        let err = assert_err!(execute(&transport, "", &text("hi"), &ExecuteOptions::new()).await);
        assert!(matches!(err, ApiError::MissingToken));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = MockTransport::new();
        transport.push_ok(json!(true));

        let options = ExecuteOptions::new().with_api_url("http://127.0.0.1:8081/bot{token}/{method}");
        assert_ok!(execute(&transport, "123:abc", &text("hello"), &options).await);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://127.0.0.1:8081/bot123:abc/sendMessage");
        assert_eq!(requests[0].content_type, "application/json");
        assert_eq!(transport.request_json(0)["text"], "hello");
    }

    #[tokio::test]
    async fn test_invalid_template_uses_default() {
        let transport = MockTransport::new();
        transport.push_ok(json!(true));

        let options = ExecuteOptions::new().with_api_url("https://example.com/bot%s/%s");
        assert_ok!(execute(&transport, "t", &text("x"), &options).await);
        assert_eq!(
            transport.requests()[0].url,
            "https://api.telegram.org/bott/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_remote_error_with_retry_after() {
        let transport = MockTransport::new();
        transport.push_json(
            429,
            json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests",
                "parameters": {"retry_after": 5}
            }),
        );

        let err = assert_err!(execute(&transport, "t", &text("x"), &ExecuteOptions::new()).await);
        assert_eq!(err.code(), Some(429));
        assert_eq!(err.retry_after(), Some(5));
        assert_eq!(err.to_string(), "API error (429): Too Many Requests");
    }

    #[tokio::test]
    async fn test_transport_error() {
        let transport = MockTransport::new();
        transport.push_error(TransportError::ConnectionFailed {
            url: "https://api.telegram.org".into(),
            reason: "connection refused".into(),
        });

        let err = assert_err!(execute(&transport, "t", &text("x"), &ExecuteOptions::new()).await);
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let transport = MockTransport::new();
        transport.push_raw(200, "not json");

        let err = assert_err!(execute(&transport, "t", &text("x"), &ExecuteOptions::new()).await);
        assert!(matches!(err, ApiError::MalformedResponse { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_decode_into_destination() {
        let transport = MockTransport::new();
        transport.push_ok(json!({"id": 42, "is_bot": true, "first_name": "Echo"}));

        let user: User = assert_ok!(
            execute_into(&transport, "t", &text("x"), &ExecuteOptions::new()).await
        );
        assert_eq!(user.id, 42);
        assert!(user.is_bot);
    }

    #[tokio::test]
    async fn test_result_decode_error() {
        let transport = MockTransport::new();
        transport.push_ok(json!("not a user"));

        let err = assert_err!(
            execute_into::<User, _>(&transport, "t", &text("x"), &ExecuteOptions::new()).await
        );
        assert!(matches!(err, ApiError::ResultDecode(_)));
    }

    #[tokio::test]
    async fn test_no_destination_ignores_result() {
        let transport = MockTransport::new();
        transport.push_ok(json!({"anything": [1, 2, 3]}));

        assert_ok!(execute(&transport, "t", &text("x"), &ExecuteOptions::new()).await);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_call() {
        let transport = Arc::new(MockTransport::new());
        let cancel = CancellationToken::new();
        let options = ExecuteOptions::new().with_cancel(cancel.clone());

        let t = transport.clone();
        let call = tokio::spawn(async move { execute(t.as_ref(), "t", &text("x"), &options).await });

        transport.wait_for_requests(1).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), call)
            .await
            .expect("call did not observe cancellation")
            .unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    struct Upload {
        built: AtomicBool,
    }

    impl RequestBody for Upload {
        fn endpoint(&self) -> &str {
            "setWebhook"
        }

        fn reader(&self) -> ApiResult<HttpBody> {
            self.built.store(true, Ordering::SeqCst);
            Ok(HttpBody::Multipart(vec![FormPart {
                name: "certificate".into(),
                value: FormValue::File {
                    file_name: "cert.pem".into(),
                    mime: "application/x-pem-file".into(),
                    data: b"PEM".to_vec(),
                },
            }]))
        }

        fn content_type(&self) -> String {
            if self.built.load(Ordering::SeqCst) {
                MULTIPART_CONTENT_TYPE.to_string()
            } else {
                "unset".to_string()
            }
        }
    }

    #[tokio::test]
    async fn test_reader_runs_before_content_type() {
        let transport = MockTransport::new();
        transport.push_ok(json!(true));

        let body = Upload {
            built: AtomicBool::new(false),
        };
        assert_ok!(execute(&transport, "t", &body, &ExecuteOptions::new()).await);

        let request = &transport.requests()[0];
        assert_eq!(request.content_type, "multipart/form-data");
        assert_eq!(transport.request_parts(0)[0].name, "certificate");
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = ExecuteOptions::new().with_api_url("http://a/{token}/{method}");
        let merged = base.clone().merge(ExecuteOptions::new());
        assert_eq!(merged.api_url.as_deref(), Some("http://a/{token}/{method}"));

        let merged = base.merge(ExecuteOptions::new().with_api_url("http://b/{token}/{method}"));
        assert_eq!(merged.api_url.as_deref(), Some("http://b/{token}/{method}"));
    }
}
