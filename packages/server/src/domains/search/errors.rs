use thiserror::Error;

/// Reasons a search request is rejected or aborted.
///
/// Soft failures (geocoding, summarization, telemetry) never reach this type;
/// they degrade inside the pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Query is required")]
    InvalidQuery,

    #[error("Invalid or inactive host")]
    HostForbidden,

    #[error("Monthly search budget exceeded")]
    BudgetExceeded,

    #[error("Rate limit exceeded")]
    RateLimited {
        limit: u32,
        remaining: u32,
        /// Unix timestamp (seconds)
        reset: u64,
    },

    #[error("Failed to search needs")]
    NeedSearch(#[source] anyhow::Error),

    #[error("Failed to fetch providers")]
    ProviderFetch(#[source] anyhow::Error),

    #[error("An error occurred while searching")]
    Internal(#[source] anyhow::Error),
}

impl SearchError {
    /// Hard failures are logged server-side; the rest are caller errors.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            SearchError::NeedSearch(_) | SearchError::ProviderFetch(_) | SearchError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_hide_upstream_detail() {
        let err = SearchError::NeedSearch(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(err.to_string(), "Failed to search needs");
        assert!(err.is_server_error());
        assert!(!SearchError::BudgetExceeded.is_server_error());
    }
}
