//! Backfills embeddings for needs that don't have one yet.
//!
//! Search only matches needs with an embedding, so run this after seeding or
//! editing the taxonomy.

use anyhow::{Context, Result};
use linksy_core::common::utils::EmbeddingService;
use linksy_core::domains::needs::Need;
use linksy_core::kernel::BaseEmbeddingService;
use linksy_core::Config;
use openai_client::OpenAIClient;
use sqlx::PgPool;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;

    // Connect to database
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Connected to database");

    let embeddings = EmbeddingService::new(
        OpenAIClient::new(&config.openai_api_key),
        &config.embedding_model,
    );

    let needs = Need::find_without_embeddings(&pool)
        .await
        .context("Failed to find needs without embeddings")?;

    println!("Found {} needs without embeddings\n", needs.len());

    let mut updated = 0;
    let mut tokens = 0i64;
    for need in needs {
        match embeddings.generate(&need.embedding_text()).await {
            Ok(embedding) => {
                if let Err(e) = Need::update_embedding(need.id, &embedding.vector, &pool).await {
                    eprintln!("Failed to store embedding for need {}: {}", need.id, e);
                } else {
                    updated += 1;
                    tokens += embedding.total_tokens;
                    println!("  Updated embedding for {} ({})", need.name, need.id);
                }
            }
            Err(e) => {
                eprintln!("Failed to generate embedding for need {}: {}", need.id, e);
            }
        }
    }

    println!("\nEmbedding generation complete!");
    println!("  Needs: {} updated", updated);
    println!("  Tokens used: {}", tokens);

    Ok(())
}
