use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::domains::crisis::CrisisKeyword;
use crate::kernel::BaseSearchStore;

/// A hotline or emergency service shown alongside crisis results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisResource {
    pub name: String,
    pub contact: String,
    pub description: String,
}

/// Attached to a search response when the query looks like a crisis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisAlert {
    pub crisis_type: String,
    pub severity: i32,
    pub message: String,
    pub resources: Vec<CrisisResource>,
}

fn resource(name: &str, contact: &str, description: &str) -> CrisisResource {
    CrisisResource {
        name: name.to_string(),
        contact: contact.to_string(),
        description: description.to_string(),
    }
}

fn emergency_services() -> CrisisResource {
    resource("Emergency Services", "911", "Call if you or someone else is in immediate danger")
}

fn community_helpline() -> CrisisResource {
    resource(
        "211 Helpline",
        "211",
        "Free, confidential help finding local services, 24/7",
    )
}

/// Fixed hotlines per crisis type.
pub fn crisis_resources(crisis_type: &str) -> Vec<CrisisResource> {
    match crisis_type {
        "suicide" | "self_harm" | "mental_health" => vec![
            resource(
                "988 Suicide & Crisis Lifeline",
                "988",
                "Call or text 988 any time to reach a trained crisis counselor",
            ),
            emergency_services(),
        ],
        "domestic_violence" => vec![
            resource(
                "National Domestic Violence Hotline",
                "1-800-799-7233",
                "Confidential support 24/7; text START to 88788",
            ),
            emergency_services(),
        ],
        "medical_emergency" | "violence" => vec![emergency_services(), community_helpline()],
        _ => vec![community_helpline()],
    }
}

fn crisis_message(crisis_type: &str) -> String {
    match crisis_type {
        "suicide" | "self_harm" | "mental_health" => {
            "It sounds like you may be going through something really hard. You don't have to face it alone. Please reach out to the 988 Suicide & Crisis Lifeline now."
        }
        "domestic_violence" => {
            "Your safety matters. If you are in danger, call 911. The National Domestic Violence Hotline can help you make a safety plan."
        }
        "medical_emergency" | "violence" => "If this is an emergency, call 911 right away.",
        _ => "If you need urgent help, call 211 to talk with someone right now.",
    }
    .to_string()
}

/// The highest-severity keyword contained in `query`, case-insensitively.
///
/// Ties go to the keyword listed first.
pub fn match_crisis<'a>(query: &str, keywords: &'a [CrisisKeyword]) -> Option<&'a CrisisKeyword> {
    let query = query.to_lowercase();

    keywords
        .iter()
        .filter(|k| {
            let keyword = k.keyword.trim().to_lowercase();
            !keyword.is_empty() && query.contains(&keyword)
        })
        .fold(None, |best: Option<&CrisisKeyword>, candidate| match best {
            Some(current) if current.severity >= candidate.severity => Some(current),
            _ => Some(candidate),
        })
}

pub fn build_alert(keyword: &CrisisKeyword) -> CrisisAlert {
    CrisisAlert {
        crisis_type: keyword.crisis_type.clone(),
        severity: keyword.severity,
        message: crisis_message(&keyword.crisis_type),
        resources: crisis_resources(&keyword.crisis_type),
    }
}

/// Checks `query` against active crisis keywords.
///
/// Never fails: a keyword lookup error is logged and treated as no crisis.
#[instrument(skip(query, store))]
pub async fn detect_crisis(query: &str, store: &dyn BaseSearchStore) -> Option<CrisisAlert> {
    let keywords = match store.active_crisis_keywords().await {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!(error = %e, "Crisis keyword lookup failed, skipping crisis check");
            return None;
        }
    };

    let keyword = match_crisis(query, &keywords)?;
    info!(
        crisis_type = %keyword.crisis_type,
        severity = keyword.severity,
        "Crisis language detected in search query"
    );

    Some(build_alert(keyword))
}
