use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::atlascloud::{AtlasCloudImages, PREDICTION_PATH};
use super::atlascloud_payload::{
    extract_image_url, job_status, provider_error_message, unwrap_envelope,
};

use crate::profile::BearerAuth;
use crate::types::{GenerationResult, JobHandle, JobPhase};
use crate::utils::http::join_endpoint;

/// Floor for a single poll request's timeout, so the last tick of the budget
/// still gets a real attempt.
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

impl AtlasCloudImages {
    /// Polls `model/prediction/{id}` until the job settles or the poll budget runs out.
    ///
    /// Failed or unparsable poll responses are skipped; only a terminal job status
    /// or the timeout ends the loop early.
    pub async fn poll_for_result(&self, job: &JobHandle) -> GenerationResult {
        let auth = match self.api_key.bearer() {
            Ok(auth) => auth,
            Err(failure) => return failure,
        };
        self.poll_until_done(auth, job, &CancellationToken::new())
            .await
    }

    pub(super) async fn poll_until_done(
        &self,
        auth: &BearerAuth,
        job: &JobHandle,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let Some(url) = self.prediction_url(job) else {
            tracing::warn!(base_url = %self.base_url, job_id = %job.id, "cannot build prediction url");
            return GenerationResult::network_error();
        };
        let started = self.clock.now();
        let mut attempt: u32 = 0;

        while self.clock.now().saturating_sub(started) < self.poll.timeout {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %job.id, attempt, "prediction polling cancelled");
                    return GenerationResult::cancelled();
                }
                _ = self.clock.sleep(self.poll.interval) => {}
            }
            attempt += 1;

            let attempt_budget = self
                .poll
                .timeout
                .saturating_sub(self.clock.now().saturating_sub(started))
                .max(MIN_ATTEMPT_TIMEOUT);
            let Some(raw) = self
                .fetch_prediction(auth, url.clone(), attempt_budget, attempt)
                .await
            else {
                continue;
            };
            let payload = unwrap_envelope(&raw);
            let status = job_status(payload);

            match JobPhase::from_status(status) {
                JobPhase::Pending => {
                    tracing::debug!(
                        job_id = %job.id,
                        attempt,
                        status = status.unwrap_or("<none>"),
                        "prediction still pending"
                    );
                }
                JobPhase::Succeeded => {
                    return match extract_image_url(payload) {
                        Some(url) => GenerationResult::success(url),
                        None => {
                            tracing::warn!(job_id = %job.id, response = %raw, "completed prediction has no image url");
                            GenerationResult::contract_violation(
                                "no image URL in completed response",
                            )
                        }
                    };
                }
                JobPhase::Failed => {
                    let message = provider_error_message(payload);
                    tracing::warn!(job_id = %job.id, %message, "prediction failed");
                    return GenerationResult::job_failed(message);
                }
            }
        }

        tracing::warn!(
            job_id = %job.id,
            attempts = attempt,
            timeout_ms = self.poll.timeout.as_millis() as u64,
            "prediction polling timed out"
        );
        GenerationResult::timed_out()
    }

    /// `<base>/model/prediction/<id>` with the id escaped as a single path segment.
    pub(super) fn prediction_url(&self, job: &JobHandle) -> Option<reqwest::Url> {
        let mut url = reqwest::Url::parse(&join_endpoint(&self.base_url, PREDICTION_PATH)).ok()?;
        url.path_segments_mut().ok()?.push(&job.id);
        Some(url)
    }

    /// One poll attempt, bounded by what is left of the poll budget; `None` means
    /// the attempt was inconclusive.
    async fn fetch_prediction(
        &self,
        auth: &BearerAuth,
        url: reqwest::Url,
        budget: Duration,
        attempt: u32,
    ) -> Option<Value> {
        let request = auth.apply(self.http.get(url)).timeout(budget);
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(
                    attempt,
                    timed_out = err.is_timeout(),
                    error = %err,
                    "prediction poll failed to send"
                );
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(attempt, status = status.as_u16(), "prediction poll returned error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(raw) => Some(raw),
            Err(err) => {
                tracing::debug!(attempt, error = %err, "prediction poll body is not valid json");
                None
            }
        }
    }
}
