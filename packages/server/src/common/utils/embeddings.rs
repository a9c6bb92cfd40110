use anyhow::Result;
use async_trait::async_trait;
use openai_client::OpenAIClient;

use crate::kernel::{BaseEmbeddingService, Embedding};

/// Default embedding model; need embeddings in the database are 1536-dimensional.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Embedding service backed by OpenAI's embeddings endpoint
pub struct EmbeddingService {
    client: OpenAIClient,
    model: String,
}

impl EmbeddingService {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseEmbeddingService for EmbeddingService {
    async fn generate(&self, text: &str) -> Result<Embedding> {
        let output = self.client.create_embedding(text, &self.model).await?;

        Ok(Embedding {
            vector: output.embedding,
            total_tokens: i64::from(output.usage.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_generate_embedding() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let service = EmbeddingService::new(OpenAIClient::new(api_key), DEFAULT_EMBEDDING_MODEL);

        let embedding = service
            .generate("I need help paying rent this month")
            .await
            .expect("Failed to generate embedding");

        assert_eq!(embedding.vector.len(), 1536);
        assert!(embedding.total_tokens > 0);
    }
}
