//! Language model seam and the OpenAI-compatible client

mod openai;
mod sse;

pub use openai::OpenAiClient;
pub use sse::{SseDecoder, DONE_SENTINEL};

use async_trait::async_trait;
use crm_query_core::CrmError;
use futures::Stream;
use std::pin::Pin;

/// Ordered text chunks from a generation; dropping it stops the generation
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, CrmError>> + Send>>;

/// Trait for text-completion backends
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt and return the whole reply
    async fn complete(&self, prompt: &str) -> Result<String, CrmError>;

    /// Complete a prompt, yielding the reply in chunks as they arrive
    async fn stream(&self, prompt: &str) -> Result<TextStream, CrmError>;

    /// Whether `stream` yields incrementally
    fn supports_streaming(&self) -> bool {
        true
    }

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}
