use std::cmp::Ordering;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{debug, instrument};

use crate::domains::needs::NeedMatch;
use crate::domains::search::SearchError;
use crate::kernel::{BaseEmbeddingService, BaseSearchStore};

/// Minimum cosine similarity for a need to count as a match (inclusive).
pub const NEED_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Most needs a single query can match.
pub const MAX_NEED_MATCHES: usize = 5;

/// Needs matched for a query plus the embedding tokens spent finding them
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub needs: Vec<NeedMatch>,
    pub embedding_tokens: i64,
}

/// Keeps matches at or above the threshold, best first, ties by id, at most five.
pub fn normalize_matches(mut matches: Vec<NeedMatch>) -> Vec<NeedMatch> {
    matches.retain(|m| m.similarity >= NEED_SIMILARITY_THRESHOLD);
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    matches.truncate(MAX_NEED_MATCHES);
    matches
}

/// Embeds the query and finds the closest needs.
///
/// Embedding failure or timeout and similarity search failure are hard errors.
#[instrument(skip(embedder, store), fields(query_len = query.len()))]
pub async fn match_needs(
    query: &str,
    embedder: &dyn BaseEmbeddingService,
    store: &dyn BaseSearchStore,
    timeout: Duration,
) -> Result<QueryMatch, SearchError> {
    let embedding = tokio::time::timeout(timeout, embedder.generate(query))
        .await
        .map_err(|_| SearchError::NeedSearch(anyhow!("embedding timed out after {:?}", timeout)))?
        .map_err(SearchError::NeedSearch)?;

    let matches = store
        .match_needs(
            &embedding.vector,
            NEED_SIMILARITY_THRESHOLD,
            MAX_NEED_MATCHES as i64,
        )
        .await
        .map_err(SearchError::NeedSearch)?;

    let needs = normalize_matches(matches);
    debug!(
        matched = needs.len(),
        tokens = embedding.total_tokens,
        "Need matching complete"
    );

    Ok(QueryMatch {
        needs,
        embedding_tokens: embedding.total_tokens.max(0),
    })
}
