pub mod openai;
pub mod prompts;

pub use openai::OpenAiClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AiClient: Send + Sync {
    /// Sends a single-turn prompt and returns the first completion verbatim.
    async fn complete(&self, prompt: String) -> Result<String>;
    fn model_name(&self) -> &str;
}
