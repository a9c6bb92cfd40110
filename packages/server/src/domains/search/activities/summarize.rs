use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::RankedProvider;
use crate::kernel::{BaseAI, ChatPrompt};

pub const CONTEXT_CARD_SEPARATOR: &str = "\n\n---\n\n";
pub const SUMMARY_MAX_TOKENS: u32 = 150;
pub const SUMMARY_TEMPERATURE: f32 = 0.5;

/// Need names quoted in the template message.
const MAX_TEMPLATE_NEEDS: usize = 3;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a warm, concise assistant for a community resource directory. \
You help people find social services. Reply in two or three short sentences. \
Do not list the organizations by name or repeat their contact details; they are shown to the user separately. \
In one sentence, mention how far the search reached (or that no location was given).";

/// What the summarizer knows about a finished search
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub query: &'a str,
    pub need_names: &'a [String],
    /// Providers after filtering, before the top-N slice
    pub total_providers: usize,
    pub top_providers: &'a [RankedProvider],
    pub has_location: bool,
    pub radius_miles: Option<u32>,
}

/// Deterministic message when nothing survived filtering.
pub fn no_providers_message(has_location: bool) -> String {
    if has_location {
        "I couldn't find any organizations near you that match what you're looking for. Try describing your need differently, or call 211 to speak with someone who can help.".to_string()
    } else {
        "I couldn't find any organizations that match what you're looking for. Try describing your need differently, adding your location, or call 211 to speak with someone who can help.".to_string()
    }
}

/// Location-dependent closing sentence of the template message.
pub fn location_trailer(has_location: bool, radius_miles: Option<u32>) -> String {
    match (has_location, radius_miles) {
        (_, Some(radius)) => format!(
            " These are the closest options within {} miles of your location:",
            radius
        ),
        (true, None) => " No providers found nearby, showing results from a wider area:".to_string(),
        (false, None) => {
            " Here are some options (add your location to see results sorted by distance):"
                .to_string()
        }
    }
}

pub fn template_message(
    total_providers: usize,
    need_names: &[String],
    has_location: bool,
    radius_miles: Option<u32>,
) -> String {
    let noun = if total_providers == 1 {
        "organization"
    } else {
        "organizations"
    };
    let needs = need_names
        .iter()
        .take(MAX_TEMPLATE_NEEDS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "I found {} {} that can help with {}.{}",
        total_providers,
        noun,
        needs,
        location_trailer(has_location, radius_miles)
    )
}

/// Chat prompt built from the top providers' context cards, if any have one.
pub fn build_prompt(ctx: &SummaryContext<'_>) -> Option<ChatPrompt> {
    let cards: Vec<&str> = ctx
        .top_providers
        .iter()
        .filter_map(|p| p.provider.context_card())
        .collect();

    if cards.is_empty() {
        return None;
    }

    let reach = match (ctx.radius_miles, ctx.has_location) {
        (Some(radius), _) => format!("Results are within {} miles of the person's location.", radius),
        (None, true) => "Nothing was found close by, so results come from a wider area.".to_string(),
        (None, false) => "The person did not share a location, so results are not sorted by distance.".to_string(),
    };

    let user = format!(
        "The person searched for: \"{}\"\n\
         Matched services: {}\n\
         Organizations found: {}\n\
         {}\n\n\
         Organization notes:\n{}",
        ctx.query,
        ctx.need_names.join(", "),
        ctx.total_providers,
        reach,
        cards.join(CONTEXT_CARD_SEPARATOR)
    );

    Some(ChatPrompt {
        system: SUMMARY_SYSTEM_PROMPT.to_string(),
        user,
        max_tokens: SUMMARY_MAX_TOKENS,
        temperature: SUMMARY_TEMPERATURE,
    })
}

/// LLM summary; `None` on error, timeout or blank output.
async fn try_llm_summary(prompt: &ChatPrompt, ai: &dyn BaseAI, timeout: Duration) -> Option<String> {
    match tokio::time::timeout(timeout, ai.complete(prompt)).await {
        Ok(Ok(text)) => {
            let text = text.trim();
            if text.is_empty() {
                debug!("Summary completion was empty");
                None
            } else {
                Some(text.to_string())
            }
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Summary completion failed, using template");
            None
        }
        Err(_) => {
            warn!(timeout = ?timeout, "Summary completion timed out, using template");
            None
        }
    }
}

/// Conversational message for the result set. Never fails.
#[instrument(skip_all, fields(total = ctx.total_providers))]
pub async fn summarize(ctx: SummaryContext<'_>, ai: &dyn BaseAI, timeout: Duration) -> String {
    if ctx.total_providers == 0 {
        return no_providers_message(ctx.has_location);
    }

    let llm = match build_prompt(&ctx) {
        Some(prompt) => try_llm_summary(&prompt, ai, timeout).await,
        None => None,
    };

    llm.unwrap_or_else(|| {
        template_message(
            ctx.total_providers,
            ctx.need_names,
            ctx.has_location,
            ctx.radius_miles,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::common::ProviderId;
    use crate::domains::providers::Provider;
    use crate::kernel::test_dependencies::MockAI;

    /// Never answers
    struct StalledAI;

    #[async_trait]
    impl BaseAI for StalledAI {
        async fn complete(&self, _prompt: &ChatPrompt) -> anyhow::Result<String> {
            std::future::pending().await
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn ranked(card: Option<&str>) -> RankedProvider {
        RankedProvider {
            provider: Provider {
                id: ProviderId::new(),
                name: "Northeast Florida Housing".to_string(),
                description: None,
                phone: None,
                email: None,
                website: None,
                sector: None,
                referral_type: None,
                is_active: true,
                provider_status: "active".to_string(),
                llm_context_card: card.map(String::from),
                service_zip_codes: None,
            },
            locations: Vec::new(),
            needs: Vec::new(),
            primary_location: None,
            distance: None,
        }
    }

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_template_without_location() {
        assert_eq!(
            template_message(3, &names(&["Housing Assistance"]), false, None),
            "I found 3 organizations that can help with Housing Assistance. Here are some options (add your location to see results sorted by distance):"
        );
    }

    #[test]
    fn test_template_with_radius_and_singular() {
        assert_eq!(
            template_message(1, &names(&["Food Pantry", "Meals"]), true, Some(25)),
            "I found 1 organization that can help with Food Pantry, Meals. These are the closest options within 25 miles of your location:"
        );
    }

    #[test]
    fn test_template_wider_area_and_need_cap() {
        let message = template_message(
            4,
            &names(&["Rent", "Utilities", "Food", "Clothing"]),
            true,
            None,
        );
        assert_eq!(
            message,
            "I found 4 organizations that can help with Rent, Utilities, Food. No providers found nearby, showing results from a wider area:"
        );
    }

    #[test]
    fn test_no_providers_message_mentions_211() {
        assert!(no_providers_message(true).contains("211"));
        assert!(no_providers_message(false).contains("211"));
        assert_ne!(no_providers_message(true), no_providers_message(false));
    }

    #[test]
    fn test_prompt_joins_cards_and_skips_blank_ones() {
        let top = vec![ranked(Some("Card A")), ranked(None), ranked(Some("  ")), ranked(Some("Card B"))];
        let need_names = names(&["Housing Assistance"]);
        let ctx = SummaryContext {
            query: "help with rent",
            need_names: &need_names,
            total_providers: 4,
            top_providers: &top,
            has_location: true,
            radius_miles: Some(10),
        };

        let prompt = build_prompt(&ctx).unwrap();

        assert!(prompt.user.contains("Card A\n\n---\n\nCard B"));
        assert!(prompt.user.contains("within 10 miles"));
        assert_eq!(prompt.max_tokens, 150);
        assert_eq!(prompt.temperature, 0.5);
    }

    #[tokio::test]
    async fn test_no_cards_skips_llm() {
        let ai = MockAI::new().with_response("should not be used");
        let top = vec![ranked(None)];
        let need_names = names(&["Food Pantry"]);
        let ctx = SummaryContext {
            query: "food",
            need_names: &need_names,
            total_providers: 1,
            top_providers: &top,
            has_location: false,
            radius_miles: None,
        };

        let message = summarize(ctx, &ai, TIMEOUT).await;

        assert!(message.starts_with("I found 1 organization that can help with Food Pantry."));
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_reply_is_used_when_cards_exist() {
        let ai = MockAI::new().with_response("  Here is some help nearby.  ");
        let top = vec![ranked(Some("Helps with rent"))];
        let need_names = names(&["Housing Assistance"]);
        let ctx = SummaryContext {
            query: "rent",
            need_names: &need_names,
            total_providers: 1,
            top_providers: &top,
            has_location: false,
            radius_miles: None,
        };

        assert_eq!(summarize(ctx, &ai, TIMEOUT).await, "Here is some help nearby.");
        assert!(ai.was_called_with("Helps with rent"));
    }

    #[tokio::test]
    async fn test_llm_failure_or_empty_reply_falls_back_to_template() {
        let top = vec![ranked(Some("Helps with rent"))];
        let need_names = names(&["Housing Assistance"]);
        let ctx = SummaryContext {
            query: "rent",
            need_names: &need_names,
            total_providers: 1,
            top_providers: &top,
            has_location: false,
            radius_miles: None,
        };
        let expected = template_message(1, &need_names, false, None);

        let failing = MockAI::new().with_error("upstream 500");
        assert_eq!(summarize(ctx, &failing, TIMEOUT).await, expected);

        let empty = MockAI::new().with_response("   ");
        assert_eq!(summarize(ctx, &empty, TIMEOUT).await, expected);
    }

    #[tokio::test]
    async fn test_llm_timeout_falls_back_to_template() {
        let top = vec![ranked(Some("Helps with rent"))];
        let need_names = names(&["Housing Assistance"]);
        let ctx = SummaryContext {
            query: "rent",
            need_names: &need_names,
            total_providers: 1,
            top_providers: &top,
            has_location: false,
            radius_miles: None,
        };

        let message = summarize(ctx, &StalledAI, Duration::from_millis(20)).await;

        assert_eq!(message, template_message(1, &need_names, false, None));
    }

    #[tokio::test]
    async fn test_zero_providers_never_calls_llm() {
        let ai = MockAI::new();
        let ctx = SummaryContext {
            query: "rent",
            need_names: &[],
            total_providers: 0,
            top_providers: &[],
            has_location: true,
            radius_miles: None,
        };

        assert_eq!(summarize(ctx, &ai, TIMEOUT).await, no_providers_message(true));
        assert_eq!(ai.call_count(), 0);
    }
}
