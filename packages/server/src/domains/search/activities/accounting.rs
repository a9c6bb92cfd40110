use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::common::{Coordinates, ProviderId, SearchSessionId};
use crate::domains::search::NewSearchSession;
use crate::kernel::BaseUsageStore;

/// Runs `task` on its own. The handle resolves to `true` on success; a failure
/// is logged and resolves to `false`.
pub fn spawn_best_effort<F>(label: &'static str, task: F) -> JoinHandle<bool>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match task.await {
            Ok(()) => true,
            Err(e) => {
                warn!(task = label, error = %e, "Background task failed");
                false
            }
        }
    })
}

/// Side effects started by a search that outlive the response
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<bool>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: JoinHandle<bool>) {
        self.handles.push(handle);
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Lets the tasks run to completion unobserved.
    pub fn detach(self) {
        drop(self.handles);
    }

    /// Waits for every task; a panicked task counts as failed.
    pub async fn join(self) -> Vec<bool> {
        join_all(self.handles)
            .await
            .into_iter()
            .map(|result| result.unwrap_or(false))
            .collect()
    }
}

/// Telemetry for one completed search
#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub query: String,
    pub tokens: i64,
    pub model: String,
    pub location: Option<Coordinates>,
    pub zip_code: Option<String>,
    pub host_id: Option<ProviderId>,
    pub radius_miles: Option<u32>,
    pub session_id: Option<SearchSessionId>,
}

/// Persists usage for a search.
///
/// A new session is created (awaited) when the caller has none; its id is
/// returned, or `None` if the insert failed. Counter increments for an
/// existing session and for the host are started in the background.
pub async fn record_search(
    record: UsageRecord,
    usage: Arc<dyn BaseUsageStore>,
) -> (Option<SearchSessionId>, BackgroundTasks) {
    let mut tasks = BackgroundTasks::new();

    let session_id = match record.session_id {
        Some(id) => {
            let store = usage.clone();
            let tokens = record.tokens;
            tasks.push(spawn_best_effort("increment_session_usage", async move {
                store.increment_session_usage(id, tokens).await
            }));
            Some(id)
        }
        None => {
            let session = NewSearchSession::builder()
                .initial_query(record.query.clone())
                .total_tokens_used(record.tokens)
                .model(record.model.clone())
                .user_location(record.location)
                .zip_code_searched(record.zip_code.clone())
                .host_provider_id(record.host_id)
                .search_radius_miles(record.radius_miles.and_then(|r| i32::try_from(r).ok()))
                .build();

            match usage.create_session(&session).await {
                Ok(id) => Some(id),
                Err(e) => {
                    error!(error = %e, "Failed to create search session");
                    None
                }
            }
        }
    };

    if let Some(host_id) = record.host_id {
        let store = usage.clone();
        let tokens = record.tokens;
        tasks.push(spawn_best_effort("increment_host_usage", async move {
            store.increment_host_usage(host_id, tokens).await
        }));
    }

    (session_id, tasks)
}
