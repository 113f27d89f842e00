use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use super::atlascloud_payload::{extract_image_url, job_handle, unwrap_envelope};

use crate::Result;
use crate::image::CoverGenerator;
use crate::profile::{BearerAuth, Env, ProviderConfig, build_http_client, resolve_api_key};
use crate::types::{GenerationRequest, GenerationResult, PollPolicy};
use crate::utils::clock::{PollClock, TokioClock};
use crate::utils::http::join_endpoint;

pub const DEFAULT_BASE_URL: &str = "https://api.atlascloud.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/nano-banana/text-to-image";

pub(super) const GENERATE_IMAGE_PATH: &str = "model/generateImage";
pub(super) const PREDICTION_PATH: &str = "model/prediction";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Cap on how much of a rejected submit body ends up in the logs.
const MAX_REJECTION_LOG_BYTES: usize = 8 * 1024;

/// Bearer credential state. An unusable key is kept apart from a missing one so
/// the failure reason says which it was.
#[derive(Clone, Debug)]
pub(super) enum ApiKey {
    Ready(BearerAuth),
    Missing,
    Invalid,
}

impl ApiKey {
    fn from_raw(api_key: &str) -> Self {
        if api_key.trim().is_empty() {
            return Self::Missing;
        }
        match BearerAuth::new(api_key) {
            Ok(auth) => Self::Ready(auth),
            Err(err) => {
                tracing::warn!(error = %err, "api key cannot be sent as a bearer token");
                Self::Invalid
            }
        }
    }

    pub(super) fn bearer(&self) -> std::result::Result<&BearerAuth, GenerationResult> {
        match self {
            Self::Ready(auth) => Ok(auth),
            Self::Missing => Err(GenerationResult::missing_api_key()),
            Self::Invalid => Err(GenerationResult::invalid_api_key()),
        }
    }
}

/// Text-to-image client for AtlasCloud-compatible prediction APIs.
///
/// Asks the provider for a synchronous result and falls back to polling
/// `model/prediction/{id}` when the provider answers with a job handle instead.
#[derive(Clone)]
pub struct AtlasCloudImages {
    pub(super) http: reqwest::Client,
    pub(super) base_url: String,
    pub(super) api_key: ApiKey,
    pub(super) model: String,
    pub(super) poll: PollPolicy,
    pub(super) clock: Arc<dyn PollClock>,
}

impl std::fmt::Debug for AtlasCloudImages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasCloudImages")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl AtlasCloudImages {
    /// An empty or unusable `api_key` yields a client whose every generation
    /// fails with a configuration error.
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: ApiKey::from_raw(&api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            poll: PollPolicy::default(),
            clock: Arc::new(TokioClock::new()),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_clock(mut self, clock: impl PollClock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Resolves key, base url and model from `config`, then `env`, then defaults.
    ///
    /// Fails when no API key can be found.
    pub async fn from_config(config: &ProviderConfig, env: &Env) -> Result<Self> {
        let api_key = resolve_api_key(config.auth.as_ref(), env).await?;
        let timeout = config
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let base_url = non_empty(config.base_url.clone())
            .or_else(|| non_empty(env.get("AI_IMAGE_API_BASE")))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_empty(config.default_model.clone())
            .or_else(|| non_empty(env.get("AI_IMAGE_MODEL")))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            http: build_http_client(timeout, &config.http_headers)?,
            base_url,
            api_key: ApiKey::Ready(BearerAuth::new(&api_key)?),
            model,
            poll: config.poll.policy()?,
            clock: Arc::new(TokioClock::new()),
        })
    }

    /// Like [`CoverGenerator::generate`], but stops polling once `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let span = tracing::info_span!(
            "cover.generate",
            model = %self.model,
            job_id = tracing::field::Empty,
        );
        let result = self.run(prompt, cancel).instrument(span).await;
        match &result {
            GenerationResult::Success { url } => {
                tracing::info!(model = %self.model, %url, "cover generated")
            }
            GenerationResult::Failure {
                kind,
                reason,
                http_status,
            } => tracing::info!(
                model = %self.model,
                ?kind,
                %reason,
                http_status,
                "cover generation failed"
            ),
        }
        result
    }

    async fn run(&self, prompt: &str, cancel: &CancellationToken) -> GenerationResult {
        let auth = match self.api_key.bearer() {
            Ok(auth) => auth,
            Err(failure) => return failure,
        };
        if prompt.trim().is_empty() {
            return GenerationResult::invalid_prompt();
        }

        let request = GenerationRequest::cover(self.model.clone(), prompt);
        let raw = match self.submit(auth, &request).await {
            Ok(raw) => raw,
            Err(failure) => return failure,
        };

        let payload = unwrap_envelope(&raw);
        if let Some(url) = extract_image_url(payload) {
            return GenerationResult::success(url);
        }

        let Some(job) = job_handle(payload) else {
            tracing::warn!(response = %raw, "response carries neither image url nor job id");
            return GenerationResult::contract_violation("no image URL or job id in response");
        };

        tracing::Span::current().record("job_id", tracing::field::display(&job.id));
        tracing::debug!(job_id = %job.id, "provider deferred generation; polling");
        self.poll_until_done(auth, &job, cancel).await
    }

    async fn submit(
        &self,
        auth: &BearerAuth,
        request: &GenerationRequest,
    ) -> std::result::Result<Value, GenerationResult> {
        let url = join_endpoint(&self.base_url, GENERATE_IMAGE_PATH);
        let response = auth
            .apply(self.http.post(url))
            .json(request)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "generation request failed to send");
                GenerationResult::network_error()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = rejection_body(response).await;
            tracing::warn!(status = status.as_u16(), %body, "provider rejected generation request");
            return Err(GenerationResult::rejected(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|err| {
            tracing::warn!(error = %err, "generation response is not valid json");
            GenerationResult::network_error()
        })
    }
}

#[async_trait]
impl CoverGenerator for AtlasCloudImages {
    fn provider(&self) -> &str {
        "atlascloud"
    }

    fn model_id(&self) -> &str {
        self.model.as_str()
    }

    async fn generate(&self, prompt: &str) -> GenerationResult {
        self.generate_with_cancel(prompt, &CancellationToken::new())
            .await
    }
}

/// Leading part of a rejected submit response, for the warn log only.
async fn rejection_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_REJECTION_LOG_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    let truncated = body.len() > MAX_REJECTION_LOG_BYTES;
    body.truncate(MAX_REJECTION_LOG_BYTES);
    let mut text = String::from_utf8_lossy(&body).into_owned();
    if truncated {
        text.push_str("...(truncated)");
    }
    text
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;

    use super::*;
    use crate::types::FailureKind;
    use crate::utils::clock::ManualClock;

    fn client(server: &MockServer) -> AtlasCloudImages {
        AtlasCloudImages::new("sk-test")
            .with_base_url(server.url("/api/v1"))
            .with_model("google/nano-banana/text-to-image")
            .with_clock(ManualClock::new())
    }

    #[tokio::test]
    async fn sync_result_skips_polling() {
        if crate::utils::test_support::should_skip_local_upstream() {
            return;
        }
        let server = MockServer::start_async().await;
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/model/generateImage")
                    .header("authorization", "Bearer sk-test")
                    .body_includes("\"model\":\"google/nano-banana/text-to-image\"")
                    .body_includes("\"prompt\":\"golden horse\"")
                    .body_includes("\"aspect_ratio\":\"3:4\"")
                    .body_includes("\"output_format\":\"png\"")
                    .body_includes("\"enable_sync_mode\":true");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(json!({ "outputs": ["http://img/1.png"] }).to_string());
            })
            .await;
        let poll = server
            .mock_async(|when, then| {
                when.method(GET).path_includes("/model/prediction/");
                then.status(200).body("{}");
            })
            .await;

        let result = client(&server).generate("golden horse").await;

        submit.assert_async().await;
        assert_eq!(poll.hits_async().await, 0);
        assert_eq!(result, GenerationResult::success("http://img/1.png"));
    }

    #[tokio::test]
    async fn wrapped_sync_result_is_unwrapped() {
        if crate::utils::test_support::should_skip_local_upstream() {
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/model/generateImage");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "code": 200,
                            "data": { "id": "job-1", "images": [{ "url": "http://img/wrapped.png" }] }
                        })
                        .to_string(),
                    );
            })
            .await;

        let result = client(&server).generate("golden horse").await;
        assert_eq!(result, GenerationResult::success("http://img/wrapped.png"));
    }

    #[tokio::test]
    async fn provider_rejection_echoes_status() {
        if crate::utils::test_support::should_skip_local_upstream() {
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/model/generateImage");
                then.status(500).body("rate limited");
            })
            .await;

        let result = client(&server).generate("golden horse").await;
        assert_eq!(
            result,
            GenerationResult::failure(
                FailureKind::ProviderRejection,
                "generation failed: 500",
                500
            )
        );
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_network_error() {
        if crate::utils::test_support::should_skip_local_upstream() {
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/model/generateImage");
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        let result = client(&server).generate("golden horse").await;
        assert_eq!(result, GenerationResult::network_error());
    }

    #[tokio::test]
    async fn missing_url_and_job_id_is_a_contract_violation() {
        if crate::utils::test_support::should_skip_local_upstream() {
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/model/generateImage");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(json!({ "code": 200, "data": { "status": "created" } }).to_string());
            })
            .await;

        let result = client(&server).generate("golden horse").await;
        assert_eq!(
            result,
            GenerationResult::failure(
                FailureKind::ContractViolation,
                "no image URL or job id in response",
                500
            )
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_network_error() {
        let listener = match std::net::TcpListener::bind(("127.0.0.1", 0)) {
            Ok(listener) => listener,
            Err(_) => return,
        };
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let result = AtlasCloudImages::new("sk-test")
            .with_base_url(format!("http://{addr}/api/v1"))
            .generate("golden horse")
            .await;
        assert_eq!(result, GenerationResult::network_error());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let result = AtlasCloudImages::new("")
            .with_base_url("http://127.0.0.1:9/unreachable")
            .generate("golden horse")
            .await;
        assert_eq!(result, GenerationResult::missing_api_key());
        assert_eq!(result.failure_kind(), Some(FailureKind::Configuration));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_submit() {
        let result = AtlasCloudImages::new("sk-test")
            .with_base_url("http://127.0.0.1:9/unreachable")
            .generate("   ")
            .await;
        assert_eq!(result, GenerationResult::invalid_prompt());
    }

    #[tokio::test]
    async fn from_config_prefers_config_then_env_then_defaults() -> crate::Result<()> {
        let env = Env {
            dotenv: BTreeMap::from([
                ("AI_IMAGE_API_KEY".to_string(), "sk-env".to_string()),
                (
                    "AI_IMAGE_API_BASE".to_string(),
                    "https://env.example/api/v1".to_string(),
                ),
            ]),
        };
        let config = ProviderConfig {
            default_model: Some("google/imagen4".to_string()),
            ..ProviderConfig::default()
        };

        let client = AtlasCloudImages::from_config(&config, &env).await?;
        assert_eq!(client.base_url(), "https://env.example/api/v1");
        assert_eq!(client.model_id(), "google/imagen4");
        assert_eq!(client.poll_policy(), PollPolicy::default());

        let env = Env {
            dotenv: BTreeMap::from([("AI_IMAGE_API_KEY".to_string(), "sk-env".to_string())]),
        };
        let client = AtlasCloudImages::from_config(&ProviderConfig::default(), &env).await?;
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model_id(), DEFAULT_MODEL);
        Ok(())
    }

    #[tokio::test]
    async fn from_config_requires_api_key() {
        let config = ProviderConfig {
            auth: Some(crate::profile::ProviderAuth::ApiKeyEnv {
                keys: vec!["HONGBAO_TEST_NEVER_SET".to_string()],
            }),
            ..ProviderConfig::default()
        };
        let err = AtlasCloudImages::from_config(&config, &Env::default())
            .await
            .expect_err("missing key should fail");
        assert!(matches!(err, crate::CoverError::Config(_)));
    }

    #[tokio::test]
    async fn unusable_api_key_is_reported_as_invalid() {
        let result = AtlasCloudImages::new("sk-bad\nkey")
            .with_base_url("http://127.0.0.1:9/unreachable")
            .generate("golden horse")
            .await;
        assert_eq!(result, GenerationResult::invalid_api_key());
        assert_ne!(result, GenerationResult::missing_api_key());
        assert_eq!(result.failure_kind(), Some(FailureKind::Configuration));
    }

    #[tokio::test]
    async fn from_config_rejects_zero_poll_interval() {
        let env = Env {
            dotenv: BTreeMap::from([("AI_IMAGE_API_KEY".to_string(), "sk-env".to_string())]),
        };
        let config = ProviderConfig {
            poll: crate::profile::PollConfig {
                interval_ms: Some(0),
                timeout_ms: None,
            },
            ..ProviderConfig::default()
        };
        let err = AtlasCloudImages::from_config(&config, &env)
            .await
            .expect_err("zero interval should fail");
        assert!(matches!(err, crate::CoverError::Config(_)));
    }
}
