//! Minimal OpenAI REST API client
//!
//! Covers the two endpoints the search service needs: chat completions and
//! embeddings. Both report token usage so callers can do their own accounting.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::new(std::env::var("OPENAI_API_KEY")?);
//!
//! let response = client
//!     .chat_completion(
//!         ChatRequest::new("gpt-4o-mini")
//!             .message(Message::user("Hello!"))
//!             .max_tokens(150),
//!     )
//!     .await?;
//!
//! let output = client.create_embedding("help with rent", "text-embedding-3-small").await?;
//! println!("{} dims, {} tokens", output.embedding.len(), output.usage.total_tokens);
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Set a custom base URL (for Azure, proxies, local stubs).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Apply a per-request timeout to every call made by this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key);

        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let response = builder.send().await.map_err(|e| self.map_transport(e, what))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI {} error", what);
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }

    fn map_transport(&self, error: reqwest::Error, what: &str) -> OpenAIError {
        warn!(error = %error, "OpenAI {} request failed", what);
        match (error.is_timeout(), self.timeout) {
            (true, Some(timeout)) => OpenAIError::Timeout(timeout),
            _ => OpenAIError::Network(error.to_string()),
        }
    }

    /// Chat completion.
    ///
    /// An empty `content` is returned as-is; callers decide whether that is a failure.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = Instant::now();

        let raw: types::ChatResponseRaw = self
            .send(self.post("chat/completions").json(&request), "chat")
            .await?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .ok_or(OpenAIError::Empty("no choices in chat response"))?
            .message
            .content
            .unwrap_or_default();

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    /// Create an embedding for text.
    ///
    /// Returns the vector (1536 dimensions for text-embedding-3-small) and the
    /// token usage reported by the API, zeroed when the API omits it.
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<EmbeddingOutput> {
        let request = types::EmbeddingRequest { model, input: text };

        let raw: types::EmbeddingResponse = self
            .send(self.post("embeddings").json(&request), "embedding")
            .await?;

        let embedding = raw
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(OpenAIError::Empty("no embedding in response"))?;

        Ok(EmbeddingOutput {
            embedding,
            usage: raw.usage.unwrap_or_default(),
        })
    }
}
