use crate::error::Result;
use async_trait::async_trait;

/// An external service that turns a text prompt into free-form text.
///
/// Implementations report transport problems (unreachable, timeout, quota, bad status)
/// as [`crate::AnalyzerError::AiService`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
