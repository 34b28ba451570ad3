//! Configuration: TOML file holding the rule set and application settings.
//!
//! ```toml
//! nagging_conditions = [{ kind = "overdue", at_least = 1 }]
//! downtime_conditions = [{ kind = "time_window", from = "22:00", to = "07:00" }]
//!
//! [settings]
//! poll_interval_secs = 60
//!
//! [[custom_state_rules]]
//! condition = { kind = "no_current_task" }
//! resulting_status = "warning"
//! resulting_message = "Pick a task"
//! ```

use super::condition::{Condition, MatchError};
use super::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "nudge.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{section}[{index}]: {source}")]
    InvalidCondition {
        section: &'static str,
        index: usize,
        #[source]
        source: MatchError,
    },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Application settings outside the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between polls in `watch`.
    pub poll_interval_secs: u64,
    /// Record snapshot changes to the history database.
    pub history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            history: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(flatten)]
    pub rules: RuleSet<Condition>,
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if the text is not a valid config.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Loads the given file, or `nudge.toml` if present, or the defaults.
    ///
    /// # Errors
    /// Returns error if an explicit path is missing or any file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Checks settings and every condition eagerly.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidSetting(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }

        let rule_conditions = self.rules.custom_state_rules.iter().map(|r| &r.condition);
        check_all("custom_state_rules", rule_conditions)?;
        check_all("nagging_conditions", self.rules.nagging_conditions.iter())?;
        check_all("downtime_conditions", self.rules.downtime_conditions.iter())?;
        Ok(())
    }
}

fn check_all<'a>(
    section: &'static str,
    conditions: impl Iterator<Item = &'a Condition>,
) -> Result<(), ConfigError> {
    for (index, condition) in conditions.enumerate() {
        condition
            .validate()
            .map_err(|source| ConfigError::InvalidCondition {
                section,
                index,
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::condition::OverdueScope;
    use crate::engine::types::Severity;

    fn parse(content: &str) -> Config {
        Config::from_toml(content, Path::new("test.toml")).expect("parse")
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("");
        assert_eq!(config, Config::default());
        assert!(config.rules.is_empty());
        assert_eq!(config.settings.poll_interval_secs, 60);
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            nagging_conditions = [{ kind = "overdue", scope = "marked_current" }]
            downtime_conditions = [{ kind = "time_window", from = "22:00", to = "07:00" }]

            [settings]
            poll_interval_secs = 30
            history = false

            [[custom_state_rules]]
            condition = { kind = "no_current_task" }
            resulting_status = "warning"
            resulting_message = "Pick a task"

            [[custom_state_rules]]
            condition = { kind = "multiple_current_tasks" }
            resulting_status = "error"
            resulting_message = "Too many"
            "#,
        );

        assert_eq!(config.settings.poll_interval_secs, 30);
        assert!(!config.settings.history);
        assert_eq!(config.rules.custom_state_rules.len(), 2);
        assert_eq!(config.rules.custom_state_rules[0].resulting_status, Severity::Warning);
        assert_eq!(config.rules.custom_state_rules[1].resulting_message, "Too many");
        assert_eq!(
            config.rules.nagging_conditions,
            vec![Condition::Overdue {
                at_least: 1,
                scope: OverdueScope::MarkedCurrent
            }]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_location() {
        let config = parse(
            r#"
            downtime_conditions = [
                { kind = "always" },
                { kind = "time_window", from = "22:00", to = "7pm" },
            ]
            "#,
        );
        match config.validate() {
            Err(ConfigError::InvalidCondition { section, index, .. }) => {
                assert_eq!(section, "downtime_conditions");
                assert_eq!(index, 1);
            }
            other => panic!("expected invalid condition, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = parse("[settings]\npoll_interval_secs = 0\n");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_unknown_condition_kind_is_parse_error() {
        let result = Config::from_toml(
            "nagging_conditions = [{ kind = \"sometimes\" }]",
            Path::new("bad.toml"),
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
    }
}
