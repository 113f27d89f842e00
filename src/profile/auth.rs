use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Deserialize;

use crate::{CoverError, Result};

use super::config::ProviderAuth;
use super::env::Env;

/// Env keys consulted when `auth` is unset or lists no keys.
pub const DEFAULT_API_KEY_ENV: &[&str] = &["AI_IMAGE_API_KEY"];

/// Pre-built `Authorization: Bearer ...` header; the value is marked sensitive.
#[derive(Clone)]
pub(crate) struct BearerAuth {
    value: HeaderValue,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("value", &"<redacted>")
            .finish()
    }
}

impl BearerAuth {
    pub(crate) fn new(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoverError::Config("api key must be non-empty".to_string()));
        }
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| CoverError::Config(format!("invalid api key: {err}")))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }

    pub(crate) fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(AUTHORIZATION, self.value.clone())
    }
}

pub async fn resolve_api_key(auth: Option<&ProviderAuth>, env: &Env) -> Result<String> {
    match auth {
        None => resolve_from_env(DEFAULT_API_KEY_ENV, env),
        Some(ProviderAuth::ApiKeyEnv { keys }) if keys.is_empty() => {
            resolve_from_env(DEFAULT_API_KEY_ENV, env)
        }
        Some(ProviderAuth::ApiKeyEnv { keys }) => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            resolve_from_env(&keys, env)
        }
        Some(ProviderAuth::Command { command }) => resolve_from_command(command).await,
    }
}

fn resolve_from_env(keys: &[&str], env: &Env) -> Result<String> {
    keys.iter()
        .find_map(|key| env.get(key))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            CoverError::Config(format!(
                "missing api key env (tried: {})",
                keys.join(", ")
            ))
        })
}

/// Runs `command` and reads `{"api_key": ...}` or `{"token": ...}` from its stdout.
async fn resolve_from_command(command: &[String]) -> Result<String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| CoverError::AuthCommand("command is empty".to_string()))?;
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|err| CoverError::AuthCommand(format!("spawn {program}: {err}")))?;
    if !output.status.success() {
        return Err(CoverError::AuthCommand(format!(
            "command failed with status {}",
            output.status
        )));
    }

    #[derive(Deserialize)]
    struct AuthCommandOutput {
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        token: Option<String>,
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed = serde_json::from_str::<AuthCommandOutput>(stdout.trim())?;
    parsed
        .api_key
        .or(parsed.token)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CoverError::AuthCommand("json missing api_key/token".to_string()))
}
