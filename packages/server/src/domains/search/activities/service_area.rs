use serde::Serialize;

use crate::common::ProviderId;
use crate::domains::providers::{Provider, ProviderWithRelations};

/// A provider left out because it does not serve the caller's ZIP
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipExclusion {
    pub id: ProviderId,
    pub name: String,
    pub service_zip_codes: Vec<String>,
}

/// A missing or empty service list means the provider serves everywhere.
pub fn serves_zip(provider: &Provider, zip: &str) -> bool {
    match provider.service_zip_codes.as_deref() {
        None | Some([]) => true,
        Some(codes) => {
            let zip = zip.trim();
            codes.iter().any(|code| code == zip)
        }
    }
}

/// Splits providers into those serving `zip` and exclusions to report.
pub fn partition_by_service_area(
    providers: Vec<ProviderWithRelations>,
    zip: &str,
) -> (Vec<ProviderWithRelations>, Vec<ZipExclusion>) {
    let mut kept = Vec::with_capacity(providers.len());
    let mut excluded = Vec::new();

    for entry in providers {
        if serves_zip(&entry.provider, zip) {
            kept.push(entry);
        } else {
            excluded.push(ZipExclusion {
                id: entry.provider.id,
                name: entry.provider.name.clone(),
                service_zip_codes: entry.provider.service_zip_codes.clone().unwrap_or_default(),
            });
        }
    }

    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, zips: Option<&[&str]>) -> ProviderWithRelations {
        ProviderWithRelations {
            provider: Provider {
                id: ProviderId::new(),
                name: name.to_string(),
                description: None,
                phone: None,
                email: None,
                website: None,
                sector: None,
                referral_type: None,
                is_active: true,
                provider_status: "active".to_string(),
                llm_context_card: None,
                service_zip_codes: zips.map(|z| z.iter().map(|s| s.to_string()).collect()),
            },
            locations: Vec::new(),
            needs: Vec::new(),
        }
    }

    #[test]
    fn test_unrestricted_providers_serve_every_zip() {
        for zip in ["32073", "90210", ""] {
            assert!(serves_zip(&provider("Anywhere", None).provider, zip));
            assert!(serves_zip(&provider("Empty list", Some(&[])).provider, zip));
        }
    }

    #[test]
    fn test_restricted_provider_requires_exact_match() {
        let clay = provider("Clay County Food Bank", Some(&["32073"]));
        assert!(serves_zip(&clay.provider, "32073"));
        assert!(serves_zip(&clay.provider, " 32073 "));
        assert!(!serves_zip(&clay.provider, "32074"));
        assert!(!serves_zip(&clay.provider, "3207"));
    }

    #[test]
    fn test_partition_reports_exclusions_in_order() {
        let providers = vec![
            provider("A", None),
            provider("B", Some(&["32073"])),
            provider("C", Some(&["32080", "32084"])),
            provider("D", Some(&["32084"])),
        ];

        let (kept, excluded) = partition_by_service_area(providers, "32084");

        let kept: Vec<_> = kept.iter().map(|p| p.provider.name.as_str()).collect();
        assert_eq!(kept, vec!["A", "C", "D"]);
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].name, "B");
        assert_eq!(excluded[0].service_zip_codes, vec!["32073".to_string()]);
    }
}
