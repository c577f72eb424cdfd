//! `sendMessage`.

use serde::{Deserialize, Serialize};
use tgbot_core::{ValidationError, ValidationResult};

use crate::json_request;

/// Maximum message length, in characters.
pub const MAX_TEXT_LENGTH: usize = 4096;

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "MarkdownV2")]
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "Markdown")]
    Markdown,
}

/// Sends a text message. Results: `Message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
}

impl SendMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            reply_to_message_id: None,
            disable_notification: None,
        }
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = Some(true);
        self
    }

    fn check(&self) -> ValidationResult {
        let len = self.text.chars().count();
        if !(1..=MAX_TEXT_LENGTH).contains(&len) {
            return Err(ValidationError::new(format!(
                "text parameter must be between 1 and {MAX_TEXT_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

json_request!(SendMessage => "sendMessage", validate = SendMessage::check);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tgbot_core::testing::MockTransport;
    use tgbot_core::{ApiClient, ApiError, Message, RequestBody};

    use super::*;

    #[test]
    fn test_text_length_counts_chars() {
        assert!(SendMessage::new(1, "é".repeat(MAX_TEXT_LENGTH)).validate().is_ok());
        assert!(SendMessage::new(1, "a".repeat(MAX_TEXT_LENGTH + 1)).validate().is_err());
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_sending() {
        let transport = Arc::new(MockTransport::new());
        let client = ApiClient::new("t", transport.clone());

        let err = client
            .call::<Message, _>(&SendMessage::new(1, ""))
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
    async fn test_send_reply() {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(json!({
            "message_id": 11,
            "date": 1700000000,
            "chat": {"id": 42, "type": "private"},
            "text": "*hi*"
        }));
        let client = ApiClient::new("t", transport.clone());

        let body = SendMessage::new(42, "*hi*")
            .with_parse_mode(ParseMode::MarkdownV2)
            .reply_to(10);
        let sent: Message = client.call(&body).await.unwrap();

        assert_eq!(sent.message_id, 11);
        assert_eq!(
            transport.request_json(0),
            json!({
                "chat_id": 42,
                "text": "*hi*",
                "parse_mode": "MarkdownV2",
                "reply_to_message_id": 10
            })
        );
    }
}
