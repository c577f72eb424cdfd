//! # tgbot Methods
//!
//! Request bodies for the Bot API methods used by the delivery engines and
//! the most common follow-up calls.
//!
//! | Body | Method | Result |
//! |------|--------|--------|
//! | [`GetUpdates`] | `getUpdates` | `Vec<Update>` |
//! | [`SetWebhook`] | `setWebhook` | `bool` |
//! | [`DeleteWebhook`] | `deleteWebhook` | `bool` |
//! | [`GetWebhookInfo`] | `getWebhookInfo` | [`WebhookInfo`] |
//! | [`GetMe`] | `getMe` | `User` |
//! | [`SendMessage`] | `sendMessage` | `Message` |
//!
//! Bodies not listed here can be declared with [`json_request!`].

pub mod get_me;
pub mod get_updates;
pub mod input_file;
pub mod multipart;
pub mod send_message;
pub mod webhook;

pub use get_me::GetMe;
pub use get_updates::{GetUpdates, MAX_UPDATES_LIMIT};
pub use input_file::InputFile;
pub use multipart::MultipartForm;
pub use send_message::{MAX_TEXT_LENGTH, ParseMode, SendMessage};
pub use webhook::{
    DEFAULT_MAX_CONNECTIONS, DeleteWebhook, GetWebhookInfo, SetWebhook, WebhookInfo,
    validate_max_connections, validate_secret_token,
};

#[doc(hidden)]
pub mod __private {
    pub use tgbot_core::{
        ApiResult, HttpBody, JSON_CONTENT_TYPE, RequestBody, ValidationResult, json_body,
    };
}

/// Implements `RequestBody` for a `Serialize` struct sent as JSON.
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// pub struct LogOut;
///
/// json_request!(LogOut => "logOut");
///
/// // With a validation function `fn(&Self) -> ValidationResult`:
/// json_request!(SendMessage => "sendMessage", validate = SendMessage::check);
/// ```
#[macro_export]
macro_rules! json_request {
    ($ty:ty => $endpoint:literal) => {
        impl $crate::__private::RequestBody for $ty {
            fn endpoint(&self) -> &str {
                $endpoint
            }

            fn reader(&self) -> $crate::__private::ApiResult<$crate::__private::HttpBody> {
                $crate::__private::json_body(self)
            }

            fn content_type(&self) -> String {
                $crate::__private::JSON_CONTENT_TYPE.to_string()
            }
        }
    };
    ($ty:ty => $endpoint:literal, validate = $validate:path) => {
        impl $crate::__private::RequestBody for $ty {
            fn endpoint(&self) -> &str {
                $endpoint
            }

            fn validate(&self) -> $crate::__private::ValidationResult {
                $validate(self)
            }

            fn reader(&self) -> $crate::__private::ApiResult<$crate::__private::HttpBody> {
                $crate::__private::json_body(self)
            }

            fn content_type(&self) -> String {
                $crate::__private::JSON_CONTENT_TYPE.to_string()
            }
        }
    };
}
