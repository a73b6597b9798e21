use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid cron expression '{0}': {1}")]
    InvalidCron(String, String),

    #[error("Invalid retry delays: base {0}s exceeds ceiling {1}s")]
    InvalidRetryDelays(u64, u64),

    #[error("Invalid delay bounds: min {0}s exceeds max {1}s")]
    InvalidDelayBounds(u64, u64),

    #[error("Invalid lunch window: start hour {0} must be below end hour {1}, both within 0-24")]
    InvalidLunchWindow(u32, u32),

    #[error("Invalid probability for {0}: {1}. Must be within 0.0-1.0")]
    InvalidProbability(&'static str, f64),

    #[error("Invalid quota cap for {0}: must be at least 1")]
    InvalidQuotaCap(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .cadence/config.yaml (project config)
    /// 3. .cadence/local.yaml (local overrides, optional)
    /// 4. Environment variables (CADENCE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".cadence/config.yaml"))
            .merge(Yaml::file(".cadence/local.yaml"))
            .merge(Env::prefixed("CADENCE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.scheduler.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::InvalidTimezone(
                config.scheduler.timezone.clone(),
            ));
        }
        for expression in [&config.scheduler.poll_schedule, &config.scheduler.cleanup_schedule] {
            if let Err(e) = expression.parse::<cron::Schedule>() {
                return Err(ConfigError::InvalidCron(expression.clone(), e.to_string()));
            }
        }

        if config.retry.base_delay_secs > config.retry.max_delay_secs {
            return Err(ConfigError::InvalidRetryDelays(
                config.retry.base_delay_secs,
                config.retry.max_delay_secs,
            ));
        }

        for (name, cap) in [
            ("daily_connection_requests", config.quota.daily_connection_requests),
            ("daily_messages", config.quota.daily_messages),
            ("daily_profile_views", config.quota.daily_profile_views),
            ("hourly_actions", config.quota.hourly_actions),
            ("daily_actions", config.quota.daily_actions),
        ] {
            if cap == 0 {
                return Err(ConfigError::InvalidQuotaCap(name));
            }
        }

        if config.safety.min_delay_secs > config.safety.max_delay_secs {
            return Err(ConfigError::InvalidDelayBounds(
                config.safety.min_delay_secs,
                config.safety.max_delay_secs,
            ));
        }
        if config.behavior.scroll_step_delay_min_secs > config.behavior.scroll_step_delay_max_secs
        {
            return Err(ConfigError::InvalidDelayBounds(
                config.behavior.scroll_step_delay_min_secs,
                config.behavior.scroll_step_delay_max_secs,
            ));
        }

        if config.time_window.lunch_start_hour >= config.time_window.lunch_end_hour
            || config.time_window.lunch_end_hour > 24
        {
            return Err(ConfigError::InvalidLunchWindow(
                config.time_window.lunch_start_hour,
                config.time_window.lunch_end_hour,
            ));
        }

        for (name, p) in [
            (
                "weekend_activity_multiplier",
                config.time_window.weekend_activity_multiplier,
            ),
            (
                "profile_visit_probability",
                config.behavior.profile_visit_probability,
            ),
            ("scroll_probability", config.behavior.scroll_probability),
            ("pause_probability", config.behavior.pause_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidProbability(name, p));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let mut config = Config::default();
        config.scheduler.timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_bad_cron_rejected() {
        let mut config = Config::default();
        config.scheduler.poll_schedule = "whenever".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCron(_, _))
        ));
    }

    #[test]
    fn test_inverted_delay_bounds_rejected() {
        let mut config = Config::default();
        config.safety.min_delay_secs = 200;
        config.safety.max_delay_secs = 100;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDelayBounds(200, 100))
        ));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let mut config = Config::default();
        config.behavior.scroll_probability = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProbability("scroll_probability", _))
        ));
    }

    #[test]
    fn test_zero_quota_cap_rejected() {
        let mut config = Config::default();
        config.quota.hourly_actions = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidQuotaCap("hourly_actions"))
        ));
    }

    #[test]
    fn test_load_from_yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "scheduler:\n  timezone: America/New_York\nquota:\n  daily_messages: 5\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.scheduler.timezone, "America/New_York");
        assert_eq!(config.quota.daily_messages, 5);
        // Untouched sections keep their defaults
        assert_eq!(config.retry.max_retries, 3);
    }
}
