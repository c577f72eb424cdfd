//! Files uploaded as part of a request.

use std::fmt;
use std::path::Path;

/// An in-memory file to be sent as a multipart part.
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    file_name: String,
    mime: String,
    data: Vec<u8>,
}

impl InputFile {
    /// Creates a file from raw bytes, typed `application/octet-stream`.
    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: "application/octet-stream".to_string(),
            data: data.into(),
        }
    }

    /// Reads a file from disk. The part is named after the last path component.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self::from_bytes(file_name, data))
    }

    /// Overrides the MIME type of the part.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Returns the file name sent in the part header.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the MIME type sent in the part header.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Returns the file contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.data.len())
            .finish()
    }
}
