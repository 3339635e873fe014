//! Model-backed implementation of the memory summarization seam.

use async_trait::async_trait;

use memory_center::{MemoryError, Summarizer};
use webpilot_core_types::MemoryEntry;

use crate::llm::{ChatMessage, ModelClient};
use crate::prompts;

/// Adapts a [`ModelClient`] to the summarizer seam the memory store expects.
pub struct ModelSummarizer<'a> {
    model: &'a dyn ModelClient,
}

impl<'a> ModelSummarizer<'a> {
    pub fn new(model: &'a dyn ModelClient) -> Self {
        Self { model }
    }

    async fn summarize_with(
        &self,
        prompt: String,
    ) -> Result<String, MemoryError> {
        let reply = self
            .model
            .complete(&[ChatMessage::user(prompt)])
            .await
            .map_err(|err| MemoryError::summarize(err.to_string()))?;
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for ModelSummarizer<'_> {
    async fn summarize_site(
        &self,
        url: &str,
        episodes: &[MemoryEntry],
    ) -> Result<String, MemoryError> {
        let payload = serde_json::to_string_pretty(episodes)
            .map_err(|err| MemoryError::summarize(err.to_string()))?;
        self.summarize_with(prompts::format_site_summary_prompt(url, &payload))
            .await
    }

    async fn summarize_successes(
        &self,
        url: &str,
        episodes: &[MemoryEntry],
    ) -> Result<String, MemoryError> {
        let payload = serde_json::to_string_pretty(episodes)
            .map_err(|err| MemoryError::summarize(err.to_string()))?;
        self.summarize_with(prompts::format_procedural_summary_prompt(url, &payload))
            .await
    }
}
