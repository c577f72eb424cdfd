//! `multipart/form-data` bodies for uploads.
//!
//! ```rust,ignore
//! let body = MultipartForm::new()
//!     .text("url", "https://example.com/webhook")
//!     .file("certificate", &InputFile::from_path("cert.pem")?)
//!     .into_body();
//! ```
//!
//! The form only collects fields. The transport encodes them and chooses the
//! boundary when the request is sent.

use serde::Serialize;
use serde_json::Value;
use tgbot_core::{ApiError, ApiResult, FormPart, FormValue, HttpBody};

use crate::input_file::InputFile;

/// Fields of one upload request, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    /// Adds a file field.
    pub fn file(mut self, name: impl Into<String>, file: &InputFile) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::File {
                file_name: file.file_name().to_string(),
                mime: file.mime().to_string(),
                data: file.data().to_vec(),
            },
        });
        self
    }

    /// Adds every non-null field of a serializable struct as a text field.
    ///
    /// Strings are sent as-is; numbers, booleans, arrays and objects are sent
    /// as their JSON text.
    pub fn json_fields<T: Serialize + ?Sized>(mut self, value: &T) -> ApiResult<Self> {
        let Value::Object(fields) =
            serde_json::to_value(value).map_err(|e| ApiError::Encode(e.to_string()))?
        else {
            return Err(ApiError::Encode("form fields must be a JSON object".into()));
        };

        for (name, value) in fields {
            match value {
                Value::Null => {}
                Value::String(s) => self = self.text(name, s),
                other => self = self.text(name, other.to_string()),
            }
        }
        Ok(self)
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_body(self) -> HttpBody {
        HttpBody::Multipart(self.parts)
    }
}
