use async_trait::async_trait;

use crate::error::Result;

/// Per-call generation knobs. Each summary level gets its own token budget.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
    fn name(&self) -> &str;
}
