//! Configuration validation utilities.
//!
//! The engines run the same checks at start, so a configuration that passes
//! [`validate_config`] will not be rejected later.

use std::net::SocketAddr;

use tgbot_core::validate_update_types;
use tgbot_methods::{MAX_UPDATES_LIMIT, validate_max_connections, validate_secret_token};

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LogOutput, LoggingConfig, PollingConfig, WebhookConfig};

/// Validates the entire configuration.
///
/// The webhook `public_url` may be left empty here; it is only required when
/// the webhook server starts.
pub fn validate_config(config: &BotConfig) -> ConfigResult<()> {
    validate_token(&config.token)?;
    validate_polling(&config.polling)?;
    validate_webhook(&config.webhook)?;
    validate_logging(&config.logging)?;
    Ok(())
}

/// Validates the bot token.
pub fn validate_token(token: &str) -> ConfigResult<()> {
    if token.is_empty() {
        return Err(ConfigError::missing_field("token"));
    }
    Ok(())
}

/// Validates long-polling settings.
pub fn validate_polling(polling: &PollingConfig) -> ConfigResult<()> {
    if !(1..=MAX_UPDATES_LIMIT).contains(&polling.limit) {
        return Err(ConfigError::validation(format!(
            "polling.limit must be between 1 and {MAX_UPDATES_LIMIT}, got {}",
            polling.limit
        )));
    }

    if polling.workers == 0 {
        return Err(ConfigError::validation(
            "polling.workers must be at least 1",
        ));
    }

    validate_update_types(polling.allowed_updates.as_slice())
        .map_err(|e| ConfigError::validation(format!("polling.allowed_updates: {e}")))?;

    Ok(())
}

/// Validates webhook settings.
pub fn validate_webhook(webhook: &WebhookConfig) -> ConfigResult<()> {
    webhook
        .listen
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::InvalidAddress(webhook.listen.clone()))?;

    if !webhook.path.starts_with('/') {
        return Err(ConfigError::validation(
            "webhook.path must start with '/'",
        ));
    }

    if !webhook.public_url.is_empty()
        && !["http://", "https://"]
            .iter()
            .any(|s| webhook.public_url.starts_with(s))
    {
        return Err(ConfigError::invalid_url(
            &webhook.public_url,
            "URL must start with http:// or https://",
        ));
    }

    validate_max_connections(webhook.max_connections)
        .map_err(|e| ConfigError::validation(format!("webhook.{e}")))?;

    if let Some(secret) = &webhook.secret_token {
        validate_secret_token(secret)
            .map_err(|e| ConfigError::validation(format!("webhook.{e}")))?;
    }

    validate_update_types(webhook.allowed_updates.as_slice())
        .map_err(|e| ConfigError::validation(format!("webhook.allowed_updates: {e}")))?;

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BotConfig {
        BotConfig {
            token: "123:abc".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_defaults_with_token() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_validate_missing_token() {
        let result = validate_config(&BotConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField { field }) if field == "token"));
    }

    #[test]
    fn test_validate_polling_limit() {
        let mut config = config();
        config.polling.limit = 0;
        assert!(validate_config(&config).is_err());
        config.polling.limit = 101;
        assert!(validate_config(&config).is_err());
        config.polling.limit = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_unknown_update_type() {
        let mut config = config();
        config.polling.allowed_updates = vec!["message".into(), "bogus".into()];
        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: polling.allowed_updates: unknown update type 'bogus'"
        );
    }

    #[test]
    fn test_validate_webhook() {
        let mut config = config();
        config.webhook.listen = "not an address".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidAddress(_))
        ));

        let mut config = self::config();
        config.webhook.public_url = "ftp://example.com".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));

        let mut config = self::config();
        config.webhook.secret_token = Some("has space".into());
        assert!(validate_config(&config).is_err());

        let mut config = self::config();
        config.webhook.max_connections = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = config();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
