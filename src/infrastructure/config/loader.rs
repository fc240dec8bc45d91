use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::services::fact_extractor::{compile_pattern, PatternError, REQUIRED_GROUPS};
use crate::services::state_reader::DATE_GROUPS;

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "dateinsert.yaml";

/// Prefix of environment overrides, e.g. `DATEINSERT_BROWSER__KIND=chrome`
pub const ENV_PREFIX: &str = "DATEINSERT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid target_url: {0}. Must be an http(s) URL")]
    InvalidTargetUrl(String),

    #[error("Invalid max_passes: {0}. Must be at least 1")]
    InvalidMaxPasses(u32),

    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("Invalid wait schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid poll_interval_ms: {0}. Must be positive")]
    InvalidPollInterval(u64),

    #[error("Selector '{0}' cannot be empty")]
    EmptySelector(&'static str),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty, compact")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The YAML file at `path`, or `dateinsert.yaml` in the working directory
    /// 3. Environment variables (`DATEINSERT_*` prefix, `__` separates sections)
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let config: Config = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if !config.target_url.starts_with("http://") && !config.target_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidTargetUrl(config.target_url.clone()));
        }

        if config.max_passes == 0 {
            return Err(ConfigError::InvalidMaxPasses(config.max_passes));
        }

        compile_pattern("filename", &config.filename_pattern, REQUIRED_GROUPS)?;
        compile_pattern("date label", &config.locale.date_pattern, DATE_GROUPS)?;

        // Locale
        let labels = &config.locale.time;
        if labels.morning.is_empty() || labels.afternoon.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "half-day markers cannot be empty".to_string(),
            ));
        }
        if labels.morning == labels.afternoon {
            return Err(ConfigError::ValidationFailed(format!(
                "half-day markers must differ, both are '{}'",
                labels.morning
            )));
        }
        if labels.hour_suffix.is_empty() || labels.minute_suffix.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "hour and minute suffixes cannot be empty".to_string(),
            ));
        }

        // Waits
        let schedule = &config.waits.schedule_ms;
        if schedule.is_empty() {
            return Err(ConfigError::InvalidSchedule(
                "schedule_ms needs at least one offset".to_string(),
            ));
        }
        if let Some(pair) = schedule.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidSchedule(format!(
                "offsets must be strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }
        if config.waits.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(
                config.waits.poll_interval_ms,
            ));
        }

        // Selectors
        if let Some((name, _)) = config
            .ui
            .entries()
            .into_iter()
            .find(|(_, selector)| selector.trim().is_empty())
        {
            return Err(ConfigError::EmptySelector(name));
        }

        // Browser
        if config.browser.driver_url.is_none() && config.browser.driver_port == 0 {
            return Err(ConfigError::ValidationFailed(
                "browser.driver_port must be set when no driver_url is given".to_string(),
            ));
        }

        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty", "compact"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }

    /// Default configuration rendered as YAML.
    pub fn default_yaml() -> Result<String> {
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")
    }

    /// Write the default configuration to `path`, refusing to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, Self::default_yaml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BrowserKind, HourConvention};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_passes, 10);
        assert_eq!(config.waits.schedule_ms, vec![1000, 2000, 3000, 5000, 10000]);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
target_url: https://photos.example.test/all
max_passes: 3
hour_convention: twelve_based
browser:
  kind: chrome
  headless: true
waits:
  schedule_ms: [100, 200]
logging:
  level: debug
  format: pretty
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.target_url, "https://photos.example.test/all");
        assert_eq!(config.max_passes, 3);
        assert_eq!(config.hour_convention, HourConvention::TwelveBased);
        assert_eq!(config.browser.kind, BrowserKind::Chrome);
        assert!(config.browser.headless);
        assert_eq!(config.browser.driver_port, 4444);
        assert_eq!(config.waits.schedule_ms, vec![100, 200]);
        assert_eq!(config.waits.poll_interval_ms, 250);
        assert_eq!(config.logging.format, "pretty");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_passes() {
        let config = Config {
            max_passes: 0,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxPasses(0)
        ));
    }

    #[test]
    fn test_validate_target_url() {
        let config = Config {
            target_url: "photos.example.test".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTargetUrl(_)
        ));
    }

    #[test]
    fn test_validate_filename_pattern_groups() {
        let config = Config {
            filename_pattern: r"IMG_(\d{4})(\d{2})(\d{2})".to_string(),
            ..Default::default()
        };
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern(PatternError::TooFewGroups { found: 3, .. })
        ));
    }

    #[test]
    fn test_validate_broken_date_pattern() {
        let mut config = Config::default();
        config.locale.date_pattern = "(".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidPattern(PatternError::Regex { .. })
        ));
    }

    #[test]
    fn test_validate_schedule() {
        let mut config = Config::default();
        config.waits.schedule_ms = vec![];
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidSchedule(_)
        ));

        config.waits.schedule_ms = vec![1000, 1000, 3000];
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidSchedule(msg) => assert!(msg.contains("1000 then 1000")),
            other => panic!("Expected InvalidSchedule error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.waits.poll_interval_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidPollInterval(0)
        ));
    }

    #[test]
    fn test_validate_empty_selector() {
        let mut config = Config::default();
        config.ui.save_button = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptySelector("save_button")
        ));
    }

    #[test]
    fn test_validate_identical_half_markers() {
        let mut config = Config::default();
        config.locale.time.afternoon = config.locale.time.morning.clone();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_validate_logging() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            _ => panic!("Expected InvalidLogLevel error"),
        }

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRotation(_)
        ));
    }

    #[test]
    fn test_load_file_and_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_passes: 4\nbrowser:\n  kind: chrome\nlogging:\n  level: warn"
        )
        .unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("DATEINSERT_MAX_PASSES", Some("7")),
                ("DATEINSERT_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load(Some(file.path())).unwrap();
                assert_eq!(config.max_passes, 7, "Env should win over the file");
                assert_eq!(config.logging.level, "debug");
                assert_eq!(
                    config.browser.kind,
                    BrowserKind::Chrome,
                    "File value should persist when not overridden"
                );
            },
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config.max_passes, 10);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_passes: 0").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("max_passes"));
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dateinsert.yaml");

        ConfigLoader::write_default(&path, false).unwrap();
        let written: Config =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.filename_pattern, Config::default().filename_pattern);

        assert!(ConfigLoader::write_default(&path, false).is_err());
        ConfigLoader::write_default(&path, true).unwrap();
    }
}
