//! `reqwest`-backed HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, Url};
use tracing::trace;

use tgbot_core::{
    FormPart, FormValue, HttpBody, HttpRequest, HttpResponse, HttpTransport, TransportError,
    TransportResult,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An [`HttpTransport`] over a shared `reqwest` client.
///
/// No overall request timeout is set by default: long polls are held open by
/// the server for as long as the `timeout` parameter asks.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a 10 second connect timeout.
    pub fn new() -> TransportResult<Self> {
        Self::build(ClientBuilder::new().connect_timeout(CONNECT_TIMEOUT))
    }

    /// Creates a transport that also bounds every request to `timeout`.
    ///
    /// Keep it above the long-poll timeout when used for polling.
    pub fn with_timeout(timeout: Duration) -> TransportResult<Self> {
        Self::build(
            ClientBuilder::new()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(timeout),
        )
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build(builder: ClientBuilder) -> TransportResult<Self> {
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let HttpRequest {
            url,
            content_type,
            body,
        } = request;

        let builder = self.client.post(&url);
        let builder = match body {
            HttpBody::Bytes(bytes) => builder.header(CONTENT_TYPE, content_type).body(bytes),
            // reqwest sets the content type with its own boundary.
            HttpBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| map_error(e, &url))?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| map_error(e, &url))?;
        trace!(status, len = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn build_form(parts: Vec<FormPart>) -> TransportResult<Form> {
    parts
        .into_iter()
        .try_fold(Form::new(), |form, FormPart { name, value }| match value {
            FormValue::Text(text) => Ok(form.text(name, text)),
            FormValue::File {
                file_name,
                mime,
                data,
            } => {
                let part = Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|e| TransportError::InvalidRequest(format!("mime error: {e}")))?;
                Ok(form.part(name, part))
            }
        })
}

/// Builds the default transport shared by clients that don't supply one.
pub fn default_transport() -> TransportResult<Arc<dyn HttpTransport>> {
    Ok(Arc::new(ReqwestTransport::new()?))
}

fn map_error(err: reqwest::Error, url: &str) -> TransportError {
    // Request URLs embed the bot token.
    let url = redact(url);
    let err = err.without_url();
    if err.is_timeout() {
        TransportError::Timeout { url }
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else if err.is_connect() || err.is_request() {
        TransportError::ConnectionFailed {
            url,
            reason: err.to_string(),
        }
    } else {
        TransportError::Io(err.to_string())
    }
}

fn redact(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| "<invalid url>".to_string())
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use tokio::net::TcpListener;

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned() {
        let app = Router::new().route(
            "/bot1:x/getMe",
            post(|headers: HeaderMap, body: String| async move {
                assert_eq!(headers[CONTENT_TYPE.as_str()], "application/json");
                assert_eq!(body, "{}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    r#"{"ok":false,"error_code":429,"description":"Too Many Requests"}"#,
                )
            }),
        );
        let base = serve(app).await;

        let transport = ReqwestTransport::new().unwrap();
        let resp = transport
            .post(HttpRequest {
                url: format!("{base}/bot1:x/getMe"),
                content_type: "application/json".into(),
                body: HttpBody::Bytes(b"{}".to_vec()),
            })
            .await
            .unwrap();

        assert_eq!(resp.status, 429);
        assert!(String::from_utf8(resp.body).unwrap().contains("Too Many Requests"));
    }

    #[tokio::test]
    async fn test_multipart_body_is_encoded() {
        let app = Router::new().route(
            "/bot1:x/setWebhook",
            post(|headers: HeaderMap, body: String| async move {
                let content_type = headers[CONTENT_TYPE.as_str()].to_str().unwrap();
                let boundary = content_type
                    .strip_prefix("multipart/form-data; boundary=")
                    .unwrap();
                assert!(body.starts_with(&format!("--{boundary}\r\n")));
                assert!(body.contains("name=\"url\"\r\n\r\nhttps://x/webhook\r\n"));
                assert!(body.contains("name=\"certificate\"; filename=\"cert.pem\""));
                assert!(body.contains("Content-Type: application/x-pem-file\r\n"));
                assert!(body.contains("-----BEGIN"));
                r#"{"ok":true,"result":true}"#
            }),
        );
        let base = serve(app).await;

        let transport = ReqwestTransport::new().unwrap();
        let resp = transport
            .post(HttpRequest {
                url: format!("{base}/bot1:x/setWebhook"),
                content_type: "multipart/form-data".into(),
                body: HttpBody::Multipart(vec![
                    FormPart {
                        name: "url".into(),
                        value: FormValue::Text("https://x/webhook".into()),
                    },
                    FormPart {
                        name: "certificate".into(),
                        value: FormValue::File {
                            file_name: "cert.pem".into(),
                            mime: "application/x-pem-file".into(),
                            data: b"-----BEGIN".to_vec(),
                        },
                    },
                ]),
            })
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_invalid_mime_is_rejected() {
        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .post(HttpRequest {
                url: "http://127.0.0.1:9/bot1:x/setWebhook".into(),
                content_type: "multipart/form-data".into(),
                body: HttpBody::Multipart(vec![FormPart {
                    name: "certificate".into(),
                    value: FormValue::File {
                        file_name: "cert.pem".into(),
                        mime: "not a mime".into(),
                        data: Vec::new(),
                    },
                }]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_hides_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .post(HttpRequest {
                url: format!("http://{addr}/bot123:SECRET/getMe"),
                content_type: "application/json".into(),
                body: HttpBody::Bytes(Vec::new()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
        assert!(!err.to_string().contains("SECRET"));
    }

    #[test]
    fn test_redact_keeps_origin() {
        assert_eq!(
            redact("https://api.telegram.org/bot1:abc/getMe"),
            "https://api.telegram.org"
        );
    }
}
