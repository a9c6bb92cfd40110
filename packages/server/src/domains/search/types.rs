use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::{Coordinates, ProviderId, SearchSessionId};
use crate::domains::crisis::CrisisAlert;
use crate::domains::needs::NeedMatch;

use super::activities::{RankedProvider, ZipExclusion};
use super::SearchError;

/// Body of `POST /api/search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Missing is treated like empty and rejected during validation
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub zip_code: Option<String>,
    /// Kept raw so a malformed id is judged by the pipeline, not the extractor
    #[serde(default)]
    pub host_provider_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Trimmed ZIP, or `None` when absent or blank.
    pub fn trimmed_zip(&self) -> Option<&str> {
        self.zip_code
            .as_deref()
            .map(str::trim)
            .filter(|zip| !zip.is_empty())
    }

    /// Host the search runs for. An id that does not parse names no valid host.
    pub fn parsed_host_id(&self) -> Result<Option<ProviderId>, SearchError> {
        match non_blank(&self.host_provider_id) {
            Some(raw) => raw.parse().map(Some).map_err(|_| SearchError::HostForbidden),
            None => Ok(None),
        }
    }

    /// Session to continue. A malformed id is dropped, so a new session starts.
    pub fn parsed_session_id(&self) -> Option<SearchSessionId> {
        let raw = non_blank(&self.session_id)?;
        match raw.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(session_id = %raw, error = %e, "Ignoring malformed session id");
                None
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Results of a search that ran
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub needs: Vec<NeedMatch>,
    pub providers: Vec<RankedProvider>,
    pub message: String,
    pub search_radius_miles: Option<u32>,
    pub session_id: Option<SearchSessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_by_zip: Option<Vec<ZipExclusion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crisis: Option<CrisisAlert>,
}

/// Returned instead of results when a host's excluded term matched
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredResponse {
    pub query: String,
    pub filtered: bool,
    pub needs: Vec<NeedMatch>,
    pub providers: Vec<RankedProvider>,
    pub message: String,
}

impl FilteredResponse {
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filtered: true,
            needs: Vec::new(),
            providers: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Filtered(FilteredResponse),
    Results(SearchResponse),
}

impl SearchOutcome {
    pub fn is_filtered(&self) -> bool {
        matches!(self, SearchOutcome::Filtered(_))
    }

    pub fn results(&self) -> Option<&SearchResponse> {
        match self {
            SearchOutcome::Results(response) => Some(response),
            SearchOutcome::Filtered(_) => None,
        }
    }
}
