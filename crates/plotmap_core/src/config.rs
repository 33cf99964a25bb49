//! Engine configuration.
//!
//! # Responsibility
//! - Hold every tunable the engine reads: adjacency threshold, per-account
//!   plot limit, default price, snapping, collision policy, storage timeouts
//!   and logging.
//! - Load partial JSON documents on top of defaults and validate them.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`from_file` has passed `validate`.

use crate::editor::CollisionPolicy;
use crate::geometry::SnapSettings;
use crate::logging::{default_log_level, normalize_level};
use crate::model::plot::DEFAULT_PLOT_PRICE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default max edge distance for two cells to count as adjacent.
pub const DEFAULT_ADJACENCY_THRESHOLD: f64 = 25.0;
/// Default cap on plots held by one account.
pub const DEFAULT_MAX_PLOTS_PER_ACCOUNT: usize = 4;
/// Default SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Max edge distance (map units) for adjacency. Inclusive.
    pub adjacency_threshold: f64,
    pub max_plots_per_account: usize,
    /// Price for plot items without a numeric `price` property.
    pub default_plot_price: f64,
    pub snap: SnapSettings,
    /// World units per map unit when recentering for renderers.
    pub unit_size: f64,
    /// Collision policy editor callers use when they have no explicit choice.
    pub collision_policy: CollisionPolicy,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adjacency_threshold: DEFAULT_ADJACENCY_THRESHOLD,
            max_plots_per_account: DEFAULT_MAX_PLOTS_PER_ACCOUNT,
            default_plot_price: DEFAULT_PLOT_PRICE,
            snap: SnapSettings::default(),
            unit_size: 1.0,
            collision_policy: CollisionPolicy::Reject,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a config for tests: shorter storage waits, file logging off.
    pub fn for_testing() -> Self {
        Self {
            busy_timeout_ms: 2_000,
            logging: LoggingConfig {
                level: "debug".to_string(),
                log_dir: None,
            },
            ..Default::default()
        }
    }

    /// Parses a (possibly partial) JSON document over defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.adjacency_threshold.is_finite() && self.adjacency_threshold >= 0.0) {
            return Err(ConfigError::invalid(
                "adjacency_threshold",
                "must be a finite, non-negative number",
            ));
        }
        if self.max_plots_per_account == 0 {
            return Err(ConfigError::invalid("max_plots_per_account", "must be at least 1"));
        }
        if !(self.default_plot_price.is_finite() && self.default_plot_price >= 0.0) {
            return Err(ConfigError::invalid(
                "default_plot_price",
                "must be a finite, non-negative number",
            ));
        }
        if !(self.snap.grid_size.is_finite() && self.snap.grid_size > 0.0) {
            return Err(ConfigError::invalid("snap.gridSize", "must be positive"));
        }
        if !(self.unit_size.is_finite() && self.unit_size > 0.0) {
            return Err(ConfigError::invalid("unit_size", "must be positive"));
        }
        normalize_level(&self.logging.level)
            .map_err(|reason| ConfigError::invalid("logging.level", reason))?;
        Ok(())
    }
}

/// File logging settings. Logging stays off when `log_dir` is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Config loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};
    use crate::editor::CollisionPolicy;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"adjacency_threshold": 30}"#).unwrap();
        assert_eq!(config.adjacency_threshold, 30.0);
        assert_eq!(config.max_plots_per_account, 4);
        assert_eq!(config.default_plot_price, 100.0);
        assert_eq!(config.collision_policy, CollisionPolicy::Reject);
    }

    #[test]
    fn collision_policy_and_snap_parse() {
        let config = EngineConfig::from_json_str(
            r#"{"collision_policy": "allow", "snap": {"enabled": false, "gridSize": 2}}"#,
        )
        .unwrap();
        assert_eq!(config.collision_policy, CollisionPolicy::Allow);
        assert!(!config.snap.enabled);
        assert_eq!(config.snap.grid_size, 2.0);
    }

    #[test]
    fn unknown_and_out_of_range_fields_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"max_plots": 3}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"max_plots_per_account": 0}"#),
            Err(ConfigError::Invalid { field: "max_plots_per_account", .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"logging": {"level": "loud"}}"#),
            Err(ConfigError::Invalid { field: "logging.level", .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = EngineConfig::from_file("/nonexistent/plotmap.json").unwrap_err();
        assert!(error.to_string().contains("/nonexistent/plotmap.json"));
    }

    #[test]
    fn testing_profile_is_valid() {
        assert!(EngineConfig::for_testing().validate().is_ok());
    }
}
