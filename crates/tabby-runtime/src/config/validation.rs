//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LogOutput, LoggingConfig, TabbyConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &TabbyConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.host.is_empty() {
        return Err(ConfigError::missing_field("bot.host"));
    }

    if bot.port == 0 {
        return Err(ConfigError::InvalidPort(bot.port));
    }

    if !bot.endpoint.starts_with('/') {
        return Err(ConfigError::validation("Endpoint must start with '/'"));
    }

    if bot.api_timeout_ms == 0 {
        return Err(ConfigError::validation("API timeout must be greater than 0"));
    }

    if let Some(prefix) = &bot.command_prefix
        && prefix.contains(char::is_whitespace)
    {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&TabbyConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_port_and_timeout() {
        let mut config = TabbyConfig::default();
        config.bot.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));

        let mut config = TabbyConfig::default();
        config.bot.api_timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_endpoint_and_prefix() {
        let mut config = TabbyConfig::default();
        config.bot.endpoint = "ws".into();
        assert!(validate_config(&config).is_err());

        let mut config = TabbyConfig::default();
        config.bot.command_prefix = Some("/ ".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = TabbyConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
        config.logging.file_path = Some("tabby.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
