//! The uniform response wrapper returned by every remote method.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult, ResponseParameters};

/// Response envelope: `{"ok": .., "result": ..}` or
/// `{"ok": false, "error_code": .., "description": ..}`.
///
/// `result` is kept as raw JSON and only decoded once the caller asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Numeric error code, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    /// Human-readable description, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structured hints, present on some failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ResponseParameters>,
    /// Raw result payload, absent for calls that return nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Envelope {
    /// Decodes an envelope from a response body.
    ///
    /// The HTTP status is only used for error reporting: failed calls still
    /// carry a regular envelope with a non-2xx status.
    pub fn parse(status: u16, body: &[u8]) -> ApiResult<Self> {
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedResponse {
            status,
            reason: e.to_string(),
        })
    }

    /// Converts a failed envelope into [`ApiError::Remote`], otherwise yields the raw result.
    pub fn into_result(self) -> ApiResult<Option<Value>> {
        if self.ok {
            return Ok(self.result);
        }
        Err(ApiError::Remote {
            code: self.error_code.unwrap_or_default(),
            description: self
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
            parameters: self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_keeps_raw_result() {
        let env = Envelope::parse(200, br#"{"ok":true,"result":[1,2,3]}"#).unwrap();
        let result = env.into_result().unwrap();
        assert_eq!(result, Some(serde_json::json!([1, 2, 3])));
    }

    #[test]
    fn test_success_without_result() {
        let env = Envelope::parse(200, br#"{"ok":true}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), None);
    }

    #[test]
    fn test_failure_carries_parameters() {
        let body = br#"{"ok":false,"error_code":429,"description":"Too Many Requests","parameters":{"retry_after":5}}"#;
        let err = Envelope::parse(429, body).unwrap().into_result().unwrap_err();
        match err {
            ApiError::Remote {
                code,
                description,
                parameters,
            } => {
                assert_eq!(code, 429);
                assert_eq!(description, "Too Many Requests");
                assert_eq!(parameters.and_then(|p| p.retry_after), Some(5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_json() {
        let err = Envelope::parse(502, b"<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { status: 502, .. }));
    }
}
