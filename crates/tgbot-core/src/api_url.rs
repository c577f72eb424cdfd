//! The two-placeholder endpoint URL template.

use std::fmt;

use tracing::debug;

/// Public API endpoint template.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org/bot{token}/{method}";

const TOKEN_PLACEHOLDER: &str = "{token}";
const METHOD_PLACEHOLDER: &str = "{method}";

/// A validated endpoint template containing `{token}` then `{method}`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiUrl(String);

impl ApiUrl {
    /// Validates a template.
    ///
    /// A template is accepted when it uses `http://` or `https://`, contains
    /// each placeholder exactly once with `{token}` first, and has no other
    /// braces.
    pub fn parse(template: &str) -> Option<Self> {
        if !(template.starts_with("http://") || template.starts_with("https://")) {
            return None;
        }
        if template.matches(TOKEN_PLACEHOLDER).count() != 1
            || template.matches(METHOD_PLACEHOLDER).count() != 1
        {
            return None;
        }
        let token_at = template.find(TOKEN_PLACEHOLDER)?;
        let method_at = template.find(METHOD_PLACEHOLDER)?;
        if token_at > method_at {
            return None;
        }
        if template.matches('{').count() != 2 || template.matches('}').count() != 2 {
            return None;
        }
        Some(Self(template.to_string()))
    }

    /// Validates a template, falling back to [`DEFAULT_API_URL`] when invalid.
    pub fn parse_or_default(template: &str) -> Self {
        Self::parse(template).unwrap_or_else(|| {
            debug!("Ignoring malformed API URL template, using the default");
            Self::default()
        })
    }

    /// Substitutes token and method.
    pub fn format(&self, token: &str, method: &str) -> String {
        self.0
            .replacen(TOKEN_PLACEHOLDER, token, 1)
            .replacen(METHOD_PLACEHOLDER, method, 1)
    }

    /// Returns the template.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ApiUrl {
    fn default() -> Self {
        Self(DEFAULT_API_URL.to_string())
    }
}

impl fmt::Debug for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiUrl").field(&self.0).finish()
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let url = ApiUrl::default();
        assert_eq!(
            url.format("123:abc", "getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
    }

    #[test]
    fn test_custom_template() {
        let url = ApiUrl::parse("http://localhost:8081/bot{token}/{method}").unwrap();
        assert_eq!(
            url.format("t", "sendMessage"),
            "http://localhost:8081/bott/sendMessage"
        );
    }

    #[test]
    fn test_invalid_templates_fall_back() {
        for bad in [
            "https://api.telegram.org/bot%s/%s",
            "https://example.com/{method}/{token}",
            "https://example.com/{token}",
            "https://example.com/{token}/{method}/{token}",
            "ftp://example.com/{token}/{method}",
            "https://example.com/{token}/{method}/{extra}",
            "",
        ] {
            assert!(ApiUrl::parse(bad).is_none(), "accepted {bad:?}");
            assert_eq!(ApiUrl::parse_or_default(bad), ApiUrl::default());
        }
    }
}
