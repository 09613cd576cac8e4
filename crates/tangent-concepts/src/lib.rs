//! Concept extraction: tangential concepts, main-subject redundancy key,
//! and the abstract "vibe" fingerprint of a piece of content (spec §4.1).
//!
//! `extract_concepts` is deliberately exclusion-biased — it must return
//! what would *expand* the user's understanding, never the topic already
//! on screen. Per the rewrite's structured-output policy (spec §9), only
//! this operation keeps a tolerant freeform parser (matching the legacy
//! prompt style); `extract_main_subject` and `extract_vibe` use
//! structured output.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tangent_clients::{CompletionRequest, LlmClient};
use tangent_core::VibeProfile;
use tracing::warn;

const CONCEPT_SYSTEM_PROMPT: &str = r#"You are a tangential-concept extraction system for a serendipity engine.

Given text from a user's screen, first silently identify the MAIN SUBJECT (what the text is actually about). Then return 4-5 concepts that would EXPAND the user's understanding of that subject — NEVER the subject itself.

Favor:
- Historical influences or origins
- Peer systems, competitors, or adjacent fields
- Underlying theory or first principles
- Contrasting or critical perspectives

The main subject must NEVER appear, verbatim or paraphrased, in your output.

Return ONLY a JSON array of 4-5 concept strings, nothing else.
Example: ["positional play origins", "Cruyff tactical lineage", "gegenpressing counter-theory", "youth academy philosophy"]"#;

fn main_subject_schema() -> Value {
    json!({
        "name": "main_subject",
        "schema": {
            "type": "object",
            "properties": { "subject": { "type": "string" } },
            "required": ["subject"],
            "additionalProperties": false
        }
    })
}

fn vibe_schema() -> Value {
    json!({
        "name": "vibe_profile",
        "schema": {
            "type": "object",
            "properties": {
                "emotional_signatures": { "type": "array", "items": { "type": "string" } },
                "archetype": { "type": "string" },
                "cross_domain_interests": { "type": "array", "items": { "type": "string" } },
                "anti_patterns": { "type": "array", "items": { "type": "string" } },
                "source_domain": { "type": "string" }
            },
            "required": ["emotional_signatures", "archetype", "cross_domain_interests", "anti_patterns", "source_domain"],
            "additionalProperties": false
        }
    })
}

#[derive(Debug, Deserialize)]
struct VibePayload {
    #[serde(default)]
    emotional_signatures: Vec<String>,
    #[serde(default)]
    archetype: String,
    #[serde(default)]
    cross_domain_interests: Vec<String>,
    #[serde(default)]
    anti_patterns: Vec<String>,
    #[serde(default)]
    source_domain: String,
}

impl From<VibePayload> for VibeProfile {
    fn from(payload: VibePayload) -> Self {
        VibeProfile {
            emotional_signatures: payload.emotional_signatures,
            archetype: payload.archetype,
            cross_domain_interests: payload.cross_domain_interests,
            anti_patterns: payload.anti_patterns,
            source_domain: payload.source_domain,
        }
    }
}

pub struct ConceptExtractor {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl ConceptExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Returns 4-5 tangential concepts, never the main subject. Falls
    /// back to a whitespace-split keyword extraction on any LLM failure.
    pub async fn extract_concepts(&self, context: &str, app_name: &str) -> Vec<String> {
        let truncated: String = context.chars().take(4000).collect();
        let user_prompt = format!("App: {app_name}\n\nScreen Content:\n{truncated}");

        let request = CompletionRequest::single_turn(&self.model, CONCEPT_SYSTEM_PROMPT, user_prompt)
            .with_temperature(0.3)
            .with_max_tokens(200);

        match self.llm.complete(&request).await {
            Ok(response) => match parse_concept_array(&response.content) {
                Some(concepts) if !concepts.is_empty() => concepts,
                _ => {
                    warn!("concept extraction returned unparseable output, using fallback");
                    fallback_extraction(context)
                }
            },
            Err(err) => {
                warn!(error = %err, "concept extraction LLM call failed, using fallback");
                fallback_extraction(context)
            }
        }
    }

    /// A short (2-5 word), lowercased phrase naming the main subject —
    /// used downstream purely as a redundancy-filter key, never shown.
    pub async fn extract_main_subject(&self, context: &str) -> String {
        let truncated: String = context.chars().take(2000).collect();
        let request = CompletionRequest::single_turn(
            &self.model,
            "Identify the main subject of this text in 2-5 words. Return only the subject phrase, nothing else.",
            truncated,
        )
        .with_temperature(0.0)
        .with_max_tokens(20);

        let schema = main_subject_schema();
        match self.llm.complete_structured(&request, &schema).await {
            Ok(value) => value
                .get("subject")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "main subject extraction failed");
                String::new()
            }
        }
    }

    /// The aesthetic fingerprint of the content: who values it, what
    /// feelings it carries, what else that person likes, what it
    /// rejects. A higher-temperature call than concept extraction —
    /// this is meant to be evocative, not literal. Degrades to an empty
    /// profile on failure so the pipeline can keep going.
    pub async fn extract_vibe(&self, context: &str) -> VibeProfile {
        let truncated: String = context.chars().take(4000).collect();
        let system_prompt = "You analyze content to extract its aesthetic 'vibe' — not what it's about, but what KIND OF PERSON values it and why. Identify: emotional_signatures (3-5 short descriptors like 'melancholy', 'precise', 'chaotic'), archetype (one sentence describing the type of person who'd love this), cross_domain_interests (3-5 unrelated things this archetype would also enjoy), anti_patterns (2-3 things this aesthetic rejects), and source_domain (one or two words naming the content's domain, e.g. 'pottery').";

        let request = CompletionRequest::single_turn(&self.model, system_prompt, truncated)
            .with_temperature(0.8)
            .with_max_tokens(400);

        let schema = vibe_schema();
        match self.llm.complete_structured(&request, &schema).await {
            Ok(value) => serde_json::from_value::<VibePayload>(value)
                .map(VibeProfile::from)
                .unwrap_or_else(|err| {
                    warn!(error = %err, "vibe payload did not match expected shape");
                    VibeProfile::default()
                }),
            Err(err) => {
                warn!(error = %err, "vibe extraction LLM call failed");
                VibeProfile::default()
            }
        }
    }
}

/// Tolerant parse of a freeform LLM reply expected to contain a JSON
/// array, allowing for stray markdown code fences around it.
fn parse_concept_array(raw: &str) -> Option<Vec<String>> {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }
    serde_json::from_str::<Vec<String>>(text.trim()).ok()
}

fn fallback_extraction(context: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();

    for word in context.split_whitespace() {
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
        if trimmed.chars().count() <= 6 {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.insert(key) {
            unique.push(trimmed.to_string());
        }
        if unique.len() >= 5 {
            break;
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_array() {
        let parsed = parse_concept_array(r#"["a", "b", "c"]"#).unwrap();
        assert_eq!(parsed, vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_fenced_json_array() {
        let parsed = parse_concept_array("```json\n[\"a\", \"b\"]\n```").unwrap();
        assert_eq!(parsed, vec!["a", "b"]);
    }

    #[test]
    fn fallback_keeps_long_unique_words_in_order() {
        let concepts = fallback_extraction("the quick brown fox fox jumps gegenpressing gegenpressing over");
        assert!(concepts.iter().all(|c| c.chars().count() > 6));
        assert_eq!(concepts.len(), concepts.iter().collect::<std::collections::HashSet<_>>().len());
    }

    #[test]
    fn fallback_caps_at_five() {
        let context = "alphabetic bibliographic chronological demonstrative encyclopedic fundamentally geographical";
        let concepts = fallback_extraction(context);
        assert!(concepts.len() <= 5);
    }
}
