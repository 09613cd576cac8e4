//! Cognitive-state analyzer producing `StrategyWeights` (spec §4.2).
//!
//! Deterministic (temperature zero) structured-output call; on any
//! failure, a heuristic fallback keyed on application-name substrings
//! keeps the router from stalling.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tangent_clients::{CompletionRequest, LlmClient};
use tangent_core::StrategyWeights;
use tracing::warn;

const JUDGE_SYSTEM_PROMPT: &str = r#"You are the Cognitive State Analyzer for a serendipitous retrieval engine.
Determine the user's INTENT (Serendipity/Relevance) and required INFORMATION SOURCE (Web/Local).

SCORING GUIDE (0.0 to 1.0):

Serendipity (need for novelty/unexpected connections):
  0.1: Coding, debugging, financial analysis (zero distraction allowed)
  0.3: Focused writing, specific research task
  0.5: Reading an article, casual writing (open to related ideas)
  0.7: Exploring a topic, learning something new
  0.9: Doomscrolling, bored, "stuck" on blank page (needs radical inspiration)

Relevance (need for precision/accuracy):
  0.1: Browsing for fun, looking for novelty
  0.3: Casual exploration, entertainment
  0.5: General reading, moderate accuracy needed
  0.7: Work task, need accurate information
  0.9: Specific factual query, debugging, hunting for a document

Source Web (external/fresh world knowledge):
  0.1: Personal journaling, reading own notes
  0.3: Working on internal project docs
  0.5: Balanced need for external and internal
  0.7: Learning new topic, need external references
  0.9: "Latest news", API docs, restaurant reviews, current events

Source Local (user's own memories/notes/history):
  0.1: Exploring completely new topic
  0.3: General browsing, unlikely to have notes
  0.5: Might have relevant past notes
  0.7: Working in familiar domain, likely have notes
  0.9: "My journal", project roadmap, past research, email drafts

HEURISTICS BY CONTEXT:
- Social Media scrolling -> Serendipity: 0.8, Relevance: 0.2, Web: 0.7, Local: 0.3
- Coding/Debugging -> Serendipity: 0.1, Relevance: 0.9, Web: 0.8, Local: 0.4
- Writing a Memoir -> Serendipity: 0.3, Relevance: 0.7, Web: 0.2, Local: 0.9
- Blank page/stuck -> Serendipity: 0.9, Relevance: 0.3, Web: 0.4, Local: 0.8
- Reading Wikipedia -> Serendipity: 0.5, Relevance: 0.6, Web: 0.7, Local: 0.5
- Technical docs -> Serendipity: 0.2, Relevance: 0.8, Web: 0.9, Local: 0.3
- Personal notes -> Serendipity: 0.4, Relevance: 0.6, Web: 0.3, Local: 0.9

Provide precise float values (e.g., 0.75, not just 0.8).
Keep reasoning brief (1-2 sentences)."#;

fn weights_schema() -> Value {
    json!({
        "name": "strategy_weights",
        "schema": {
            "type": "object",
            "properties": {
                "serendipity": { "type": "number" },
                "relevance": { "type": "number" },
                "source_web": { "type": "number" },
                "source_local": { "type": "number" },
                "reasoning": { "type": "string" }
            },
            "required": ["serendipity", "relevance", "source_web", "source_local", "reasoning"],
            "additionalProperties": false
        }
    })
}

#[derive(Debug, Deserialize)]
struct WeightsPayload {
    serendipity: f32,
    relevance: f32,
    source_web: f32,
    source_local: f32,
    #[serde(default)]
    reasoning: String,
}

impl From<WeightsPayload> for StrategyWeights {
    fn from(payload: WeightsPayload) -> Self {
        StrategyWeights {
            serendipity: payload.serendipity,
            relevance: payload.relevance,
            source_web: payload.source_web,
            source_local: payload.source_local,
            reasoning: payload.reasoning,
        }
        .clamped()
    }
}

pub struct ContextJudge {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl ContextJudge {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Truncates context to ~1000 chars for latency, then asks for
    /// deterministic structured output. Falls back to a heuristic on any
    /// failure — the router must always get usable weights.
    pub async fn analyze(&self, context: &str, app_name: &str, window_title: &str) -> StrategyWeights {
        let context_summary: String = context.chars().take(1000).collect();
        let user_message = format!(
            "Analyze this user context:\n\nApp: {app_name}\nWindow: {window_title}\n\nScreen Content:\n{context_summary}\n\nDetermine the optimal retrieval strategy weights."
        );

        let request = CompletionRequest::single_turn(&self.model, JUDGE_SYSTEM_PROMPT, user_message)
            .with_temperature(0.0);

        let schema = weights_schema();
        match self.llm.complete_structured(&request, &schema).await {
            Ok(value) => match serde_json::from_value::<WeightsPayload>(value) {
                Ok(payload) => payload.into(),
                Err(err) => {
                    warn!(error = %err, "judge payload did not match expected shape, using heuristic fallback");
                    fallback_weights(app_name)
                }
            },
            Err(err) => {
                warn!(error = %err, "context judge LLM call failed, using heuristic fallback");
                fallback_weights(app_name)
            }
        }
    }
}

/// Heuristic weights keyed on application-name substrings, used when the
/// LLM call fails. Mirrors `context_judge.py::_fallback_weights`.
fn fallback_weights(app_name: &str) -> StrategyWeights {
    let app_lower = app_name.to_lowercase();

    if ["code", "xcode", "terminal", "iterm"].iter().any(|needle| app_lower.contains(needle)) {
        return StrategyWeights {
            serendipity: 0.15,
            relevance: 0.85,
            source_web: 0.75,
            source_local: 0.35,
            reasoning: "Fallback: detected coding environment".to_string(),
        };
    }

    if ["safari", "chrome", "firefox", "arc"].iter().any(|needle| app_lower.contains(needle)) {
        return StrategyWeights {
            serendipity: 0.45,
            relevance: 0.55,
            source_web: 0.65,
            source_local: 0.45,
            reasoning: "Fallback: detected browser".to_string(),
        };
    }

    if ["notes", "obsidian", "notion", "bear"].iter().any(|needle| app_lower.contains(needle)) {
        return StrategyWeights {
            serendipity: 0.35,
            relevance: 0.65,
            source_web: 0.25,
            source_local: 0.85,
            reasoning: "Fallback: detected note-taking app".to_string(),
        };
    }

    StrategyWeights::balanced("Fallback: default balanced weights")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_weights_stay_in_unit_interval() {
        for app in ["VS Code", "Safari", "Obsidian", "Finder"] {
            let weights = fallback_weights(app);
            for value in [weights.serendipity, weights.relevance, weights.source_web, weights.source_local] {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn code_editors_tilt_high_relevance_and_web() {
        let weights = fallback_weights("Visual Studio Code");
        assert!(weights.relevance > weights.serendipity);
        assert!(weights.source_web > weights.source_local);
    }

    #[test]
    fn note_apps_tilt_high_local() {
        let weights = fallback_weights("Obsidian");
        assert!(weights.source_local > weights.source_web);
    }

    #[test]
    fn unknown_app_is_balanced() {
        let weights = fallback_weights("SomeRandomApp");
        assert_eq!(weights.serendipity, 0.4);
        assert_eq!(weights.relevance, 0.6);
    }
}
