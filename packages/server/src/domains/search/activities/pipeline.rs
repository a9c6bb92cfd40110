use std::net::IpAddr;

use tracing::{info, instrument};

use super::accounting::{record_search, BackgroundTasks, UsageRecord};
use super::gate::{authorize_host, check_excluded_terms, EXCLUDED_QUERY_MESSAGE};
use super::location::resolve_location;
use super::matching::match_needs;
use super::ranking::{rank_providers, MAX_RESULTS};
use super::ring_search::{ring_search, RingSearchOutcome};
use super::service_area::partition_by_service_area;
use super::summarize::{summarize, SummaryContext};
use crate::common::{ProviderId, SearchSessionId};
use crate::domains::crisis::detect_crisis;
use crate::domains::search::{
    FilteredResponse, SearchError, SearchOutcome, SearchRequest, SearchResponse,
};
use crate::kernel::ServerDeps;

/// Providers fetched per search, before service-area filtering.
pub const PROVIDER_FETCH_LIMIT: i64 = 10;

/// A finished search plus the telemetry writes it started
#[derive(Debug)]
pub struct SearchRun {
    pub outcome: SearchOutcome,
    pub background: BackgroundTasks,
}

/// Message for a query that matched no needs.
pub fn no_match_message(query: &str) -> String {
    format!(
        "I couldn't find any services matching \"{}\". Try describing your need differently, or call 211 to speak with someone who can help.",
        query
    )
}

/// Runs a search end to end.
///
/// Order: validate, excluded terms, host gate, then the crisis check and the
/// primary search concurrently, then usage accounting.
#[instrument(skip(request, deps), fields(host = ?request.host_provider_id))]
pub async fn run_search(
    request: SearchRequest,
    client_ip: Option<IpAddr>,
    deps: &ServerDeps,
) -> Result<SearchRun, SearchError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidQuery);
    }

    let host_id = request.parsed_host_id()?;
    let session_id = request.parsed_session_id();

    if let Some(host_id) = host_id {
        if check_excluded_terms(query, host_id, deps).await.is_some() {
            return Ok(SearchRun {
                outcome: SearchOutcome::Filtered(FilteredResponse::new(
                    query,
                    EXCLUDED_QUERY_MESSAGE,
                )),
                background: BackgroundTasks::new(),
            });
        }

        authorize_host(host_id, client_ip, deps).await?;
    }

    let (crisis, primary) = tokio::join!(
        detect_crisis(query, deps.store.as_ref()),
        primary_search(query, &request, host_id, session_id, deps)
    );
    let (mut response, usage) = primary?;
    response.crisis = crisis;

    let mut background = BackgroundTasks::new();
    if let Some(record) = usage {
        let (session_id, tasks) = record_search(record, deps.usage.clone()).await;
        response.session_id = session_id;
        background = tasks;
    }

    info!(
        needs = response.needs.len(),
        providers = response.providers.len(),
        radius = ?response.search_radius_miles,
        "Search complete"
    );

    Ok(SearchRun {
        outcome: SearchOutcome::Results(response),
        background,
    })
}

/// Location, needs, providers, ranking and summary.
///
/// Returns the usage to record, or `None` when no need matched.
async fn primary_search(
    query: &str,
    request: &SearchRequest,
    host_id: Option<ProviderId>,
    session_id: Option<SearchSessionId>,
    deps: &ServerDeps,
) -> Result<(SearchResponse, Option<UsageRecord>), SearchError> {
    let settings = &deps.settings;
    let zip = request.trimmed_zip();

    let location = resolve_location(
        request.location,
        zip,
        deps.geocoder.as_ref(),
        settings.geocoder_timeout,
    )
    .await;

    let matched = match_needs(
        query,
        deps.embedding_service.as_ref(),
        deps.store.as_ref(),
        settings.embedding_timeout,
    )
    .await?;

    if matched.needs.is_empty() {
        info!("No needs matched query");
        return Ok((
            SearchResponse {
                query: query.to_string(),
                needs: Vec::new(),
                providers: Vec::new(),
                message: no_match_message(query),
                search_radius_miles: None,
                session_id,
                excluded_by_zip: None,
                client_zip_code: None,
                crisis: None,
            },
            None,
        ));
    }

    let rings = match location {
        Some(center) => ring_search(center, deps.store.as_ref()).await,
        None => RingSearchOutcome::default(),
    };

    let need_ids: Vec<_> = matched.needs.iter().map(|n| n.id).collect();
    let providers = deps
        .store
        .find_providers_for_needs(&need_ids, rings.constraint(), PROVIDER_FETCH_LIMIT)
        .await
        .map_err(SearchError::ProviderFetch)?;

    let (providers, excluded_by_zip) = match zip {
        Some(zip) => {
            let (kept, excluded) = partition_by_service_area(providers, zip);
            (kept, (!excluded.is_empty()).then_some(excluded))
        }
        None => (providers, None),
    };

    let mut ranked = rank_providers(providers, location);
    let total_providers = ranked.len();
    ranked.truncate(MAX_RESULTS);

    let need_names: Vec<String> = matched.needs.iter().map(|n| n.name.clone()).collect();
    let message = summarize(
        SummaryContext {
            query,
            need_names: &need_names,
            total_providers,
            top_providers: &ranked,
            has_location: location.is_some(),
            radius_miles: rings.radius_miles,
        },
        deps.ai.as_ref(),
        settings.chat_timeout,
    )
    .await;

    let usage = UsageRecord {
        query: query.to_string(),
        tokens: matched.embedding_tokens,
        model: deps.embedding_service.model_name().to_string(),
        location,
        zip_code: zip.map(String::from),
        host_id,
        radius_miles: rings.radius_miles,
        session_id,
    };

    Ok((
        SearchResponse {
            query: query.to_string(),
            needs: matched.needs,
            providers: ranked,
            message,
            search_radius_miles: rings.radius_miles,
            session_id: None,
            excluded_by_zip,
            client_zip_code: zip.map(String::from),
            crisis: None,
        },
        Some(usage),
    ))
}
