use chrono::FixedOffset;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Portal timeout and catalog page size are not 0
/// - Retry budget is at least one attempt
/// - Trigger poll interval stays below 100ms
/// - Portal UTC offset parses
/// - Captcha command is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.portal.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "portal.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.catalog.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.page_size cannot be 0".to_string(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "retry.backoff_multiplier must be >= 1.0".to_string(),
        ));
    }

    if !(1..100).contains(&config.trigger.poll_interval_ms) {
        return Err(ConfigError::ValidationError(format!(
            "trigger.poll_interval_ms must be between 1 and 99, got {}",
            config.trigger.poll_interval_ms
        )));
    }

    parse_utc_offset(&config.portal.utc_offset)?;

    if config.captcha.command.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "captcha.command cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parse an offset of the form `+HH:MM` / `-HH:MM` (or `Z`).
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::ValidationError(format!("invalid UTC offset: {:?}", value));

    let value = value.trim();
    if value.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_page_size_fails() {
        let mut config = Config::default();
        config.catalog.page_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_coarse_poll_interval_fails() {
        let mut config = Config::default();
        config.trigger.poll_interval_ms = 100;
        assert!(validate_config(&config).is_err());

        config.trigger.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        config.trigger.poll_interval_ms = 99;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bad_offset_fails() {
        let mut config = Config::default();
        config.portal.utc_offset = "Asia/Shanghai".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_captcha_command_fails() {
        let mut config = Config::default();
        config.captcha.command = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(
            parse_utc_offset("-05:30").unwrap().local_minus_utc(),
            -(5 * 3600 + 30 * 60)
        );
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("08:00").is_err());
        assert!(parse_utc_offset("+24:00").is_err());
        assert!(parse_utc_offset("+8").is_err());
    }
}
