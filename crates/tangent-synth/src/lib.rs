//! Synthesizer: turns a retrieved item plus the user's context into a
//! human-readable `Suggestion` (spec §4.7), and a cheap time-sensitivity
//! pre-check supplemented from `openai_client.py::should_search_web`
//! (spec §B.1).

use serde::Deserialize;
use serde_json::{json, Value};
use tangent_clients::{CompletionRequest, LlmClient};
use tangent_core::{Item, Suggestion, SuggestionSource};
use tracing::warn;

const SYNTH_SYSTEM_PROMPT: &str = r#"You are a brilliant research assistant who synthesizes information into actionable insights.

Your job is to extract the MOST VALUABLE specific knowledge from a source and connect it directly to what the user is working on. Emphasize what's DIFFERENT, CONTRASTING, or COMPLEMENTARY about this source relative to the user's current context — never restate what they already have in front of them.

CRITICAL RULES:
1. Extract SPECIFIC facts, numbers, frameworks, or techniques - not vague summaries
2. Show exactly HOW this applies to the user's current work, by addition or contrast, not repetition
3. Be concrete and actionable - what should they DO or CONSIDER?
4. Write like a smart colleague sharing a discovery, not a search engine describing a link

Return JSON:
{
    "title": "Action-oriented title that hints at the specific insight (max 60 chars)",
    "body": "2-4 sentences extracting the SPECIFIC valuable information and showing exactly how it complements their current context. Include concrete numbers, frameworks, or techniques when available.",
    "reasoning": "One sentence explaining the direct connection to their work."
}"#;

fn suggestion_schema() -> Value {
    json!({
        "name": "suggestion",
        "schema": {
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "body": { "type": "string" },
                "reasoning": { "type": "string" }
            },
            "required": ["title", "body", "reasoning"],
            "additionalProperties": false
        }
    })
}

#[derive(Debug, Deserialize)]
struct SynthesisPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    reasoning: String,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn item_description(item: &Item) -> String {
    match item {
        Item::Memory(m) => format!("SOURCE (from your saved notes):\n{}", truncate_chars(&m.content, 2000)),
        Item::Web(w) => format!("SOURCE ({}):\n{}", w.title, truncate_chars(&w.text, 2000)),
    }
}

fn fallback_suggestion(item: &Item, source: SuggestionSource, relevance_score: f32, novelty_score: f32) -> Suggestion {
    let (title, body) = match item {
        Item::Memory(m) => (truncate_chars(&m.content, 60), truncate_chars(&m.content, 300)),
        Item::Web(w) => (truncate_chars(&w.title, 60), truncate_chars(&w.text, 300)),
    };
    let source_url = match item {
        Item::Web(w) => Some(w.url.clone()),
        Item::Memory(_) => None,
    };

    Suggestion {
        id: Suggestion::new_id(),
        title,
        content: body,
        reasoning: "This information relates to your current context.".to_string(),
        source,
        relevance_score,
        novelty_score,
        timestamp: chrono::Utc::now(),
        source_url,
    }
}

/// Synthesizes one retrieved item into a `Suggestion`. `source` is decided
/// by the caller (the router already knows whether this item came from
/// local memory, plain web search, or one of the orthogonal strategies —
/// that provenance doesn't survive into the plain `Item` enum, so it's
/// threaded through explicitly rather than re-derived here).
pub async fn synthesize(
    llm: &dyn LlmClient,
    model: &str,
    item: &Item,
    context: &str,
    relevance_score: f32,
    novelty_score: f32,
    source: SuggestionSource,
) -> Suggestion {
    let user_prompt = format!(
        "WHAT THE USER IS CURRENTLY WORKING ON:\n{}\n\n---\n\n{}\n\n---\n\nExtract the most specific, actionable insight from this source that directly complements what the user is working on. Be concrete - include specific numbers, frameworks, techniques, or facts when available.",
        truncate_chars(context, 2500),
        item_description(item)
    );

    let request = CompletionRequest::single_turn(model, SYNTH_SYSTEM_PROMPT, user_prompt)
        .with_temperature(0.7)
        .with_max_tokens(500);

    let source_url = match item {
        Item::Web(w) => Some(w.url.clone()),
        Item::Memory(_) => None,
    };

    match llm.complete_structured(&request, &suggestion_schema()).await {
        Ok(value) => match serde_json::from_value::<SynthesisPayload>(value) {
            Ok(payload) if !payload.body.is_empty() => Suggestion {
                id: Suggestion::new_id(),
                title: truncate_chars(&payload.title, 60),
                content: truncate_chars(&payload.body, 600),
                reasoning: if payload.reasoning.is_empty() {
                    "This connects to what you're currently viewing.".to_string()
                } else {
                    payload.reasoning
                },
                source,
                relevance_score,
                novelty_score,
                timestamp: chrono::Utc::now(),
                source_url,
            },
            Ok(_) => {
                warn!("synthesis payload had an empty body, using fallback");
                fallback_suggestion(item, source, relevance_score, novelty_score)
            }
            Err(err) => {
                warn!(error = %err, "synthesis payload did not match expected shape, using fallback");
                fallback_suggestion(item, source, relevance_score, novelty_score)
            }
        },
        Err(err) => {
            warn!(error = %err, "synthesis LLM call failed, using fallback");
            fallback_suggestion(item, source, relevance_score, novelty_score)
        }
    }
}

/// Cheap, LLM-free pre-check: is this topic time-sensitive enough to
/// warrant an explicit "Search Web" affordance? Looks for recency
/// language in the main subject and tangential concepts.
pub fn should_search_web(subject: &str, concepts: &[String]) -> bool {
    const RECENCY_MARKERS: &[&str] = &[
        "latest", "news", "today", "breaking", "recent", "current", "this week", "this year", "update", "release",
        "announcement", "2024", "2025", "2026",
    ];

    let haystack = std::iter::once(subject.to_lowercase())
        .chain(concepts.iter().map(|c| c.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ");

    RECENCY_MARKERS.iter().any(|marker| haystack.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_search_web_flags_recency_markers() {
        assert!(should_search_web("latest AI developments", &[]));
        assert!(should_search_web("", &vec!["breaking news".to_string()]));
    }

    #[test]
    fn should_search_web_false_for_timeless_topics() {
        assert!(!should_search_web("wabi-sabi pottery", &vec!["Japanese ceramics".to_string(), "kintsugi".to_string()]));
    }

    #[test]
    fn fallback_suggestion_truncates_memory_content() {
        let item = Item::Memory(tangent_core::Memory {
            id: "m".to_string(),
            content: "a".repeat(500),
            similarity: Some(0.8),
            created_at: None,
            last_accessed: None,
            relationships: Vec::new(),
        });
        let suggestion = fallback_suggestion(&item, SuggestionSource::Local, 0.8, 0.5);
        assert_eq!(suggestion.title.chars().count(), 60);
        assert_eq!(suggestion.content.chars().count(), 300);
        assert!(suggestion.source_url.is_none());
    }

    #[test]
    fn fallback_suggestion_keeps_web_source_url() {
        let item = Item::Web(tangent_core::SearchResult {
            title: "Title".to_string(),
            url: "https://example.com".to_string(),
            text: "body text".to_string(),
            score: 0.9,
            published_date: None,
        });
        let suggestion = fallback_suggestion(&item, SuggestionSource::Web, 0.7, 0.6);
        assert_eq!(suggestion.source_url.as_deref(), Some("https://example.com"));
    }
}
