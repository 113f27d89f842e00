use async_trait::async_trait;

use crate::types::GenerationResult;

/// Something that turns a prompt into a cover image URL.
///
/// Implementations never fail with an error; every outcome, including
/// misconfiguration, is reported through [`GenerationResult`].
#[async_trait]
pub trait CoverGenerator: Send + Sync {
    fn provider(&self) -> &str;
    fn model_id(&self) -> &str;

    async fn generate(&self, prompt: &str) -> GenerationResult;
}
