//! Wait settings loaded from YAML and the environment.
//!
//! ```yaml
//! ui:
//!   interval_ms: 1000
//!   timeout_ms: 60000
//! api:
//!   interval_ms: 250
//!   timeout_ms: 5000
//!   max_attempts: 40
//! ```
//!
//! Settings are plain values handed to pollers; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::policy::PollPolicy;
use crate::poller::Poller;
use crate::result::ConfigError;

/// Overrides the UI timeout in milliseconds
pub const ENV_UI_TIMEOUT_MS: &str = "EVENTUAL_UI_TIMEOUT_MS";
/// Overrides the UI polling interval in milliseconds
pub const ENV_UI_INTERVAL_MS: &str = "EVENTUAL_UI_INTERVAL_MS";
/// Overrides the API timeout in milliseconds
pub const ENV_API_TIMEOUT_MS: &str = "EVENTUAL_API_TIMEOUT_MS";
/// Overrides the API polling interval in milliseconds
pub const ENV_API_INTERVAL_MS: &str = "EVENTUAL_API_INTERVAL_MS";

/// Default policies for UI and API waits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Policy for waits on rendered page state
    #[serde(default = "PollPolicy::ui")]
    pub ui: PollPolicy,
    /// Policy for waits on REST resources
    #[serde(default = "PollPolicy::api")]
    pub api: PollPolicy,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            ui: PollPolicy::ui(),
            api: PollPolicy::api(),
        }
    }
}

impl WaitSettings {
    /// Parse settings from YAML; missing sections keep their presets
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.as_ref().display(), ?settings, "loaded wait settings");
        Ok(settings)
    }

    /// Serialize settings to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `EVENTUAL_*_MS` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = read_millis(&lookup, ENV_UI_TIMEOUT_MS)? {
            self.ui.timeout = Some(ms);
        }
        if let Some(ms) = read_millis(&lookup, ENV_UI_INTERVAL_MS)? {
            self.ui.interval = ms;
        }
        if let Some(ms) = read_millis(&lookup, ENV_API_TIMEOUT_MS)? {
            self.api.timeout = Some(ms);
        }
        if let Some(ms) = read_millis(&lookup, ENV_API_INTERVAL_MS)? {
            self.api.interval = ms;
        }
        Ok(self)
    }

    /// Poller for UI waits
    #[must_use]
    pub fn ui_poller(&self) -> Poller {
        Poller::new(self.ui)
    }

    /// Poller for API waits
    #[must_use]
    pub fn api_poller(&self) -> Poller {
        Poller::new(self.api)
    }
}

fn read_millis<F>(lookup: &F, name: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw,
        })
}
