//! Text generation trait definition.

use async_trait::async_trait;

use crate::error::GenerateError;
use crate::types::Generation;

/// The abstract text-generation capability consumed by the pipeline.
///
/// Implementations wrap one concrete hosted service; the pipeline never
/// distinguishes between them.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the provider ID (e.g., "openai", "groq").
    fn id(&self) -> &str;

    /// Run one completion for `prompt` against `model`.
    async fn generate(&self, prompt: &str, model: &str) -> Result<Generation, GenerateError>;
}
