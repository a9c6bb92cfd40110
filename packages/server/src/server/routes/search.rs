use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};

use crate::domains::search::{run_search, SearchOutcome, SearchRequest};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::ClientIp;

/// `POST /api/search`
///
/// Telemetry writes started by the search keep running after the response
/// is sent.
pub async fn search_handler(
    Extension(state): Extension<AxumAppState>,
    client_ip: Option<Extension<ClientIp>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected search body");
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let client_ip = client_ip.map(|Extension(ClientIp(ip))| ip);
    let run = run_search(request, client_ip, &state.deps).await?;
    run.background.detach();

    Ok(Json(run.outcome))
}
