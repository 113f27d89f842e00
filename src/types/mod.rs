use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Aspect ratio of a WeChat red packet cover (957x1278 px).
pub const COVER_ASPECT_RATIO: &str = "3:4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

/// Body of `POST /model/generateImage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: String,
    pub output_format: OutputFormat,
    #[serde(rename = "enable_sync_mode")]
    pub sync_mode: bool,
}

impl GenerationRequest {
    /// Request with the fixed cover policy: 3:4, png, synchronous mode requested.
    pub fn cover(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            aspect_ratio: COVER_ASPECT_RATIO.to_string(),
            output_format: OutputFormat::Png,
            sync_mode: true,
        }
    }
}

/// Deferred provider job. Only meaningful while it is being polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

/// Coarse state of a provider job, derived from its raw `status` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some("completed" | "succeeded") => Self::Succeeded,
            Some("failed" | "error") => Self::Failed,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2_000);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);

    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_TIMEOUT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    InvalidPrompt,
    Transport,
    ProviderRejection,
    ContractViolation,
    JobFailure,
    Timeout,
    Cancelled,
}

/// Terminal value of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationResult {
    Success {
        url: String,
    },
    Failure {
        kind: FailureKind,
        reason: String,
        http_status: u16,
    },
}

impl GenerationResult {
    pub fn success(url: impl Into<String>) -> Self {
        Self::Success { url: url.into() }
    }

    pub fn failure(kind: FailureKind, reason: impl Into<String>, http_status: u16) -> Self {
        Self::Failure {
            kind,
            reason: reason.into(),
            http_status,
        }
    }

    pub fn missing_api_key() -> Self {
        Self::failure(
            FailureKind::Configuration,
            "AI_IMAGE_API_KEY is not configured",
            500,
        )
    }

    pub fn invalid_api_key() -> Self {
        Self::failure(
            FailureKind::Configuration,
            "AI_IMAGE_API_KEY is not a valid bearer token",
            500,
        )
    }

    pub fn invalid_prompt() -> Self {
        Self::failure(
            FailureKind::InvalidPrompt,
            "prompt must be a non-empty string",
            400,
        )
    }

    pub fn network_error() -> Self {
        Self::failure(FailureKind::Transport, "network error", 500)
    }

    pub fn rejected(status: u16) -> Self {
        Self::failure(
            FailureKind::ProviderRejection,
            format!("generation failed: {status}"),
            status,
        )
    }

    pub fn contract_violation(reason: impl Into<String>) -> Self {
        Self::failure(FailureKind::ContractViolation, reason, 500)
    }

    pub fn job_failed(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::JobFailure, message, 500)
    }

    pub fn timed_out() -> Self {
        Self::failure(FailureKind::Timeout, "generation timed out", 504)
    }

    pub fn cancelled() -> Self {
        Self::failure(FailureKind::Cancelled, "generation cancelled", 499)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Success { url } => Some(url.as_str()),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}
