// AI implementation using OpenAI chat completions
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};

use super::{BaseAI, ChatPrompt};

/// OpenAI implementation of chat completion for a fixed model
#[derive(Clone)]
pub struct OpenAIChat {
    client: OpenAIClient,
    model: String,
}

impl OpenAIChat {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseAI for OpenAIChat {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(Message::system(&prompt.system))
            .message(Message::user(&prompt.user))
            .max_tokens(prompt.max_tokens)
            .temperature(prompt.temperature);

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt.user.len(),
            "Calling OpenAI chat completion"
        );

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, model = %self.model, "OpenAI chat completion failed");
                e
            })
            .context("Failed to call OpenAI API")?;

        tracing::debug!(
            response_length = response.content.len(),
            total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
            model = %self.model,
            "OpenAI chat completion received"
        );

        Ok(response.content)
    }
}
