//! The request-body capability consumed by the executor.
//!
//! A [`RequestBody`] is anything that can name its remote method, check its
//! own parameters, and serialize itself. Concrete bodies live in
//! `tgbot-methods`; the executor only sees this trait.

use serde::Serialize;

use crate::error::{ApiError, ApiResult, ValidationResult};
use crate::transport::HttpBody;

/// Content type of JSON-encoded request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of form bodies, before the transport adds its boundary.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Parameters of one outbound call.
///
/// [`reader`](RequestBody::reader) is always called before
/// [`content_type`](RequestBody::content_type): a body may pick its encoding
/// while building the payload, and the content type must describe that payload.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct Close;
///
/// impl RequestBody for Close {
///     fn endpoint(&self) -> &str {
///         "close"
///     }
///
///     fn reader(&self) -> ApiResult<HttpBody> {
///         json_body(self)
///     }
///
///     fn content_type(&self) -> String {
///         JSON_CONTENT_TYPE.to_string()
///     }
/// }
/// ```
pub trait RequestBody: Send + Sync {
    /// Remote method name, e.g. `"sendMessage"`.
    fn endpoint(&self) -> &str;

    /// Checks the parameters without touching the network.
    fn validate(&self) -> ValidationResult {
        Ok(())
    }

    /// Produces the payload. Called once per execution.
    fn reader(&self) -> ApiResult<HttpBody>;

    /// MIME type of the payload produced by the last [`reader`](RequestBody::reader) call.
    fn content_type(&self) -> String;
}

impl<T: RequestBody + ?Sized> RequestBody for &T {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn validate(&self) -> ValidationResult {
        (**self).validate()
    }

    fn reader(&self) -> ApiResult<HttpBody> {
        (**self).reader()
    }

    fn content_type(&self) -> String {
        (**self).content_type()
    }
}

/// Serializes `value` as a JSON request payload.
pub fn json_body<T: Serialize + ?Sized>(value: &T) -> ApiResult<HttpBody> {
    serde_json::to_vec(value)
        .map(HttpBody::Bytes)
        .map_err(|e| ApiError::Encode(e.to_string()))
}
