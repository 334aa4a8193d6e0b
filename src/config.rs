//! Configuration loader and validator for the publish menu.
use crate::schedule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub workflow: Workflow,
    pub site: Site,
    #[serde(default)]
    pub text: Text,
}

/// Polling settings for delivery confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workflow {
    pub poll_interval_ms: u64,
    pub max_poll_ms: u64,
    pub retry_poll_bound_ms: u64,
}

/// Site-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub timezone: String,
    pub min_schedule_lead_secs: u64,
}

/// Display string overrides, keyed by text key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Text {
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

/// Poll timings used by the workflow controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
    pub retry_bound: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_wait: Duration::from_millis(15_000),
            retry_bound: Duration::from_millis(1000),
        }
    }
}

impl Config {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.workflow.poll_interval_ms),
            max_wait: Duration::from_millis(self.workflow.max_poll_ms),
            retry_bound: Duration::from_millis(self.workflow.retry_poll_bound_ms),
        }
    }

    pub fn site_timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        schedule::parse_timezone(&self.site.timezone)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.workflow.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid("workflow.poll_interval_ms must be > 0"));
    }
    if cfg.workflow.max_poll_ms < cfg.workflow.poll_interval_ms {
        return Err(ConfigError::Invalid(
            "workflow.max_poll_ms must be >= workflow.poll_interval_ms",
        ));
    }
    if cfg.workflow.retry_poll_bound_ms == 0 {
        return Err(ConfigError::Invalid("workflow.retry_poll_bound_ms must be > 0"));
    }

    if cfg.site.timezone.trim().is_empty() {
        return Err(ConfigError::Invalid("site.timezone must be non-empty"));
    }
    cfg.site_timezone()?;

    if cfg.text.overrides.keys().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Invalid("text.overrides keys must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the binary.
pub fn example() -> &'static str {
    r#"workflow:
  poll_interval_ms: 1000
  max_poll_ms: 15000
  retry_poll_bound_ms: 1000

site:
  timezone: "Etc/UTC"
  min_schedule_lead_secs: 120

text:
  overrides:
    "taskButton.Publish": "Publish"
"#
}
