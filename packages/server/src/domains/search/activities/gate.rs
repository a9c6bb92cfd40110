use std::net::IpAddr;

use tracing::{info, instrument, warn};

use crate::common::ProviderId;
use crate::domains::providers::HostProfile;
use crate::domains::search::SearchError;
use crate::kernel::ServerDeps;

/// Shown instead of results when a host has excluded the query's topic.
pub const EXCLUDED_QUERY_MESSAGE: &str = "I'm not able to help with that search on this site. Please try describing a different need, or call 211 to speak with someone who can help.";

/// The first excluded term contained in `query`, case-insensitively.
///
/// `terms` are expected to be lowercased already.
pub fn find_excluded_term<'a>(query: &str, terms: &'a [String]) -> Option<&'a str> {
    let query = query.to_lowercase();
    terms
        .iter()
        .map(String::as_str)
        .find(|term| !term.is_empty() && query.contains(term))
}

/// Returns the matched term when the host excludes this query.
///
/// A lookup failure is logged and treated as "no exclusions".
#[instrument(skip(query, deps))]
pub async fn check_excluded_terms(
    query: &str,
    host_id: ProviderId,
    deps: &ServerDeps,
) -> Option<String> {
    let terms = match deps.store.host_excluded_terms(host_id).await {
        Ok(terms) => terms,
        Err(e) => {
            warn!(error = %e, "Failed to load excluded terms, continuing without them");
            return None;
        }
    };

    let term = find_excluded_term(query, &terms)?;
    info!(term, "Query matched a host excluded term");
    Some(term.to_string())
}

/// Host must exist, be active with embedded search on, have budget left,
/// and the caller must be under the host's per-IP rate limit.
#[instrument(skip(deps))]
pub async fn authorize_host(
    host_id: ProviderId,
    client_ip: Option<IpAddr>,
    deps: &ServerDeps,
) -> Result<HostProfile, SearchError> {
    let host = deps
        .store
        .find_host(host_id)
        .await
        .map_err(SearchError::Internal)?
        .filter(HostProfile::can_host_search)
        .ok_or(SearchError::HostForbidden)?;

    if host.budget_exhausted() {
        info!(
            tokens_used = host.host_tokens_used_this_month,
            budget = ?host.host_monthly_token_budget,
            "Host monthly token budget exhausted"
        );
        return Err(SearchError::BudgetExceeded);
    }

    let limit = host.rate_limit_per_minute(deps.settings.default_rate_limit_per_minute);
    let decision = deps.rate_limiter.check(host_id, client_ip, limit);
    if !decision.allowed {
        info!(limit, ip = ?client_ip, "Host search rate limit exceeded");
        return Err(SearchError::RateLimited {
            limit: decision.limit,
            remaining: decision.remaining,
            reset: decision.reset_at,
        });
    }

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_excluded_term_is_case_insensitive_substring() {
        let terms = terms(&["firearm", "payday loan"]);
        assert_eq!(
            find_excluded_term("Where can I get a PAYDAY LOAN fast", &terms),
            Some("payday loan")
        );
        assert_eq!(find_excluded_term("firearms training", &terms), Some("firearm"));
        assert_eq!(find_excluded_term("help with rent", &terms), None);
    }

    #[test]
    fn test_blank_terms_never_match() {
        assert_eq!(find_excluded_term("anything", &terms(&[""])), None);
        assert_eq!(find_excluded_term("anything", &[]), None);
    }
}
