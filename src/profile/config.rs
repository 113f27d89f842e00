use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoverError, Result};
use crate::types::PollPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderAuth {
    #[serde(rename = "api_key_env", alias = "env", alias = "api_key")]
    ApiKeyEnv {
        #[serde(default)]
        keys: Vec<String>,
    },
    #[serde(alias = "auth_command")]
    Command { command: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PollConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl PollConfig {
    /// Fills unset fields with the defaults. A zero interval or timeout is rejected.
    pub fn policy(&self) -> Result<PollPolicy> {
        let defaults = PollPolicy::default();
        let interval = positive_millis("poll.interval_ms", self.interval_ms)?
            .unwrap_or(defaults.interval);
        let timeout =
            positive_millis("poll.timeout_ms", self.timeout_ms)?.unwrap_or(defaults.timeout);
        Ok(PollPolicy::new(interval, timeout))
    }
}

fn positive_millis(field: &str, value: Option<u64>) -> Result<Option<Duration>> {
    match value {
        Some(0) => Err(CoverError::Config(format!("{field} must be greater than zero"))),
        other => Ok(other.map(Duration::from_millis)),
    }
}

/// Provider settings, usually read from a TOML file.
///
/// Unset fields fall back to the environment (`AI_IMAGE_API_BASE`,
/// `AI_IMAGE_MODEL`, `AI_IMAGE_API_KEY`) and then to built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, alias = "model")]
    pub default_model: Option<String>,
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<ProviderAuth>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll: PollConfig,
}

impl ProviderConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }
}
