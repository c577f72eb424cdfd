//! Webhook registration: `setWebhook`, `deleteWebhook`, `getWebhookInfo`.

use serde::{Deserialize, Serialize};
use tgbot_core::{
    ApiResult, HttpBody, JSON_CONTENT_TYPE, MULTIPART_CONTENT_TYPE, RequestBody, ValidationError,
    ValidationResult, json_body, validate_update_types,
};

use crate::input_file::InputFile;
use crate::json_request;
use crate::multipart::MultipartForm;

/// Default `max_connections` applied by the server when unset.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 40;

/// Checks a webhook secret: 1-256 characters of `A-Z`, `a-z`, `0-9`, `_` and `-`.
pub fn validate_secret_token(token: &str) -> ValidationResult {
    if !(1..=256).contains(&token.len()) {
        return Err(ValidationError::new(
            "secret_token must be between 1 and 256 characters",
        ));
    }
    if !token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(ValidationError::new(
            "secret_token may only contain A-Z, a-z, 0-9, _ and -",
        ));
    }
    Ok(())
}

/// Checks `max_connections` against the accepted range 1-100.
pub fn validate_max_connections(max_connections: u32) -> ValidationResult {
    if !(1..=100).contains(&max_connections) {
        return Err(ValidationError::new(format!(
            "max_connections must be between 1 and 100, got {max_connections}"
        )));
    }
    Ok(())
}

/// Registers the URL updates are pushed to. Results: `bool`.
///
/// Sent as JSON, or as `multipart/form-data` when a certificate is attached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetWebhook {
    pub url: String,
    /// Public key certificate for self-signed setups.
    #[serde(skip)]
    pub certificate: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_pending_updates: Option<bool>,
    /// Echoed back in the `X-Telegram-Bot-Api-Secret-Token` header of every push.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
}

impl SetWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_certificate(mut self, certificate: InputFile) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    pub fn with_allowed_updates<S: Into<String>>(
        mut self,
        allowed: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allowed_updates = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_drop_pending_updates(mut self, drop: bool) -> Self {
        self.drop_pending_updates = Some(drop);
        self
    }

    pub fn with_secret_token(mut self, secret: impl Into<String>) -> Self {
        self.secret_token = Some(secret.into());
        self
    }
}

impl RequestBody for SetWebhook {
    fn endpoint(&self) -> &str {
        "setWebhook"
    }

    fn validate(&self) -> ValidationResult {
        if self.url.is_empty() {
            return Err(ValidationError::new("url must not be empty"));
        }
        if let Some(max) = self.max_connections {
            validate_max_connections(max)?;
        }
        if let Some(secret) = &self.secret_token {
            validate_secret_token(secret)?;
        }
        if let Some(allowed) = &self.allowed_updates {
            validate_update_types(allowed.as_slice())
                .map_err(|e| ValidationError::new(e.to_string()))?;
        }
        Ok(())
    }

    fn reader(&self) -> ApiResult<HttpBody> {
        let Some(certificate) = &self.certificate else {
            return json_body(self);
        };
        let form = MultipartForm::new()
            .json_fields(self)?
            .file("certificate", certificate);
        Ok(form.into_body())
    }

    fn content_type(&self) -> String {
        if self.certificate.is_some() {
            MULTIPART_CONTENT_TYPE.to_string()
        } else {
            JSON_CONTENT_TYPE.to_string()
        }
    }
}

/// Removes the webhook so `getUpdates` can be used again. Results: `bool`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteWebhook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_pending_updates: Option<bool>,
}

json_request!(DeleteWebhook => "deleteWebhook");

/// Reports the current webhook status. Results: [`WebhookInfo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetWebhookInfo {}

json_request!(GetWebhookInfo => "getWebhookInfo");

/// Webhook status as reported by `getWebhookInfo`. `url` is empty when no
/// webhook is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookInfo {
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synchronization_error_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tgbot_core::testing::MockTransport;
    use tgbot_core::{ApiClient, ApiError, FormValue};
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_secret_token_rules() {
        assert_ok!(validate_secret_token("abc_DEF-123"));
        assert_ok!(validate_secret_token(&"a".repeat(256)));
        assert_err!(validate_secret_token(""));
        assert_err!(validate_secret_token(&"a".repeat(257)));
        assert_err!(validate_secret_token("no spaces"));
        assert_err!(validate_secret_token("ünicode"));
    }

    #[test]
    fn test_set_webhook_validation() {
        assert_ok!(SetWebhook::new("https://bot.example.com/webhook").validate());
        assert_err!(SetWebhook::new("").validate());
        assert_err!(
            SetWebhook::new("https://x")
                .with_max_connections(0)
                .validate()
        );
        assert_err!(
            SetWebhook::new("https://x")
                .with_max_connections(101)
                .validate()
        );
        assert_err!(
            SetWebhook::new("https://x")
                .with_allowed_updates(["nope"])
                .validate()
        );
    }

    #[test]
    fn test_json_without_certificate() {
        let body = SetWebhook::new("https://x/webhook")
            .with_max_connections(40)
            .with_secret_token("s3cret");

        assert_eq!(body.content_type(), "application/json");
        let payload = body.reader().unwrap();
        let value: serde_json::Value = serde_json::from_slice(payload.as_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"url": "https://x/webhook", "max_connections": 40, "secret_token": "s3cret"})
        );
    }

    #[tokio::test]
    async fn test_multipart_with_certificate() {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(json!(true));
        let client = ApiClient::new("t", transport.clone());

        let body = SetWebhook::new("https://x/webhook")
            .with_drop_pending_updates(true)
            .with_certificate(InputFile::from_bytes("cert.pem", b"-----BEGIN".to_vec()));
        assert_ok!(client.call::<bool, _>(&body).await);

        let request = &transport.requests()[0];
        assert_eq!(request.content_type, "multipart/form-data");

        let parts = transport.request_parts(0);
        let field = |name: &str| parts.iter().find(|p| p.name == name).map(|p| &p.value);
        assert_eq!(
            field("url"),
            Some(&FormValue::Text("https://x/webhook".into()))
        );
        assert_eq!(
            field("drop_pending_updates"),
            Some(&FormValue::Text("true".into()))
        );
        assert!(matches!(
            field("certificate"),
            Some(FormValue::File { file_name, data, .. })
                if file_name == "cert.pem" && data.as_slice() == b"-----BEGIN"
        ));
    }

    #[tokio::test]
    async fn test_registration_failure_is_remote_error() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            400,
            json!({"ok": false, "error_code": 400, "description": "Bad Request: bad webhook"}),
        );
        let client = ApiClient::new("t", transport.clone());

        let err = client
            .call::<bool, _>(&SetWebhook::new("https://x/webhook"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Remote { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_webhook_info() {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(json!({
            "url": "https://x/webhook",
            "has_custom_certificate": false,
            "pending_update_count": 3,
            "max_connections": 40
        }));
        let client = ApiClient::new("t", transport.clone());

        let info: WebhookInfo = client.call(&GetWebhookInfo {}).await.unwrap();
        assert_eq!(info.pending_update_count, 3);
        assert_eq!(info.max_connections, Some(40));
        assert_eq!(info.last_error_message, None);
    }
}
