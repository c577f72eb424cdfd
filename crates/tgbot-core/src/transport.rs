//! HTTP transport abstraction.
//!
//! The executor talks to the network only through [`HttpTransport`]. The
//! `tgbot-transport` crate provides the reqwest implementation; tests use the
//! scripted transport from [`testing`](crate::testing).

use std::fmt;

use async_trait::async_trait;

use crate::error::TransportResult;

/// One field of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: FormValue,
}

/// Value of a [`FormPart`].
#[derive(Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field.
    Text(String),
    /// File upload.
    File {
        file_name: String,
        mime: String,
        data: Vec<u8>,
    },
}

impl FormValue {
    fn len(&self) -> usize {
        match self {
            FormValue::Text(text) => text.len(),
            FormValue::File { data, .. } => data.len(),
        }
    }
}

impl fmt::Debug for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            FormValue::File {
                file_name,
                mime,
                data,
            } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("mime", mime)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Payload of an [`HttpRequest`].
///
/// Multipart bodies travel as their parts; the transport encodes them and
/// picks the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Already serialized bytes, sent with the request's content type.
    Bytes(Vec<u8>),
    /// `multipart/form-data` fields.
    Multipart(Vec<FormPart>),
}

impl HttpBody {
    /// Payload size in bytes, not counting multipart framing.
    pub fn len(&self) -> usize {
        match self {
            HttpBody::Bytes(bytes) => bytes.len(),
            HttpBody::Multipart(parts) => parts.iter().map(|p| p.value.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the serialized bytes, or `None` for multipart bodies.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HttpBody::Bytes(bytes) => Some(bytes),
            HttpBody::Multipart(_) => None,
        }
    }

    /// Returns the form fields, or `None` for serialized bodies.
    pub fn parts(&self) -> Option<&[FormPart]> {
        match self {
            HttpBody::Bytes(_) => None,
            HttpBody::Multipart(parts) => Some(parts),
        }
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(bytes: Vec<u8>) -> Self {
        HttpBody::Bytes(bytes)
    }
}

/// A fully built outbound POST.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL with token and method already substituted.
    pub url: String,
    /// Value of the `Content-Type` header. For multipart bodies the transport
    /// appends the boundary it generates.
    pub content_type: String,
    /// Request body.
    pub body: HttpBody,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The URL embeds the bot token.
        f.debug_struct("HttpRequest")
            .field("content_type", &self.content_type)
            .field("len", &self.body.len())
            .finish_non_exhaustive()
    }
}

/// The raw answer to an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// Sends requests over the wire.
///
/// Implementations must return non-2xx responses as `Ok`: failed API calls
/// still carry a decodable envelope. Only connection-level problems are errors.
/// Shared read-only across all workers, so `&self` only.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs one POST and returns the response.
    async fn post(&self, request: HttpRequest) -> TransportResult<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_len_and_debug_skip_file_bytes() {
        let body = HttpBody::Multipart(vec![
            FormPart {
                name: "url".into(),
                value: FormValue::Text("https://x".into()),
            },
            FormPart {
                name: "certificate".into(),
                value: FormValue::File {
                    file_name: "cert.pem".into(),
                    mime: "application/x-pem-file".into(),
                    data: b"SECRETPEM".to_vec(),
                },
            },
        ]);

        assert_eq!(body.len(), 18);
        assert!(body.as_bytes().is_none());
        assert_eq!(body.parts().map(<[FormPart]>::len), Some(2));
        assert!(!format!("{body:?}").contains("SECRETPEM"));
    }
}
