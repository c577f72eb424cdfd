//! `getUpdates`: the long-poll request.

use serde::{Deserialize, Serialize};
use tgbot_core::{ValidationError, ValidationResult, validate_update_types};

use crate::json_request;

/// Upper bound of the `limit` parameter.
pub const MAX_UPDATES_LIMIT: u32 = 100;

/// Fetches pending updates, holding the connection for up to `timeout` seconds.
///
/// Results: `Vec<Update>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUpdates {
    /// First update to return; acknowledges everything before it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Maximum number of updates, 1-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Long-poll timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Update kinds to receive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}

impl GetUpdates {
    /// Creates a request with every parameter unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the update kinds to receive.
    pub fn with_allowed_updates<S: Into<String>>(
        mut self,
        allowed: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allowed_updates = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    fn check(&self) -> ValidationResult {
        if let Some(limit) = self.limit
            && !(1..=MAX_UPDATES_LIMIT).contains(&limit)
        {
            return Err(ValidationError::new(format!(
                "limit must be between 1 and {MAX_UPDATES_LIMIT}, got {limit}"
            )));
        }
        if let Some(allowed) = &self.allowed_updates {
            validate_update_types(allowed.as_slice())
                .map_err(|e| ValidationError::new(e.to_string()))?;
        }
        Ok(())
    }
}

json_request!(GetUpdates => "getUpdates", validate = GetUpdates::check);
