//! `AnalyzeController`: sequences the full pipeline for `/analyze` (spec
//! §4.8) — concept extraction, judge, weighted routing, scoring,
//! synthesis, and the decision-log write, in that order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tangent_clients::{LlmClient, WebSearchClient};
use tangent_concepts::ConceptExtractor;
use tangent_core::{Item, Source, Strategy, Suggestion, SuggestionSource};
use tangent_judge::ContextJudge;
use tangent_logger::DecisionLogger;
use tangent_router::CascadeRouter;
use tangent_scorer::Scorer;
use tracing::warn;

use crate::dto::AnalyzeResponse;

pub struct AnalyzeController {
    llm: Arc<dyn LlmClient>,
    web: Arc<dyn WebSearchClient>,
    concepts: Arc<ConceptExtractor>,
    judge: Arc<ContextJudge>,
    router: Arc<CascadeRouter>,
    scorer: Arc<Scorer>,
    logger: Arc<DecisionLogger>,
    model: String,
    max_suggestions: usize,
}

impl AnalyzeController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<dyn LlmClient>,
        web: Arc<dyn WebSearchClient>,
        concepts: Arc<ConceptExtractor>,
        judge: Arc<ContextJudge>,
        router: Arc<CascadeRouter>,
        scorer: Arc<Scorer>,
        logger: Arc<DecisionLogger>,
        model: impl Into<String>,
        max_suggestions: usize,
    ) -> Self {
        Self { llm, web, concepts, judge, router, scorer, logger, model: model.into(), max_suggestions }
    }

    /// Runs the full pipeline: URL resolution, concept extraction, the
    /// judge, weighted routing, doughnut scoring, synthesis, and the
    /// decision-log write, in that fixed order (spec §5's ordering
    /// guarantee). Returns an empty suggestion list with only timing if
    /// concept extraction comes back empty — a context the extractor
    /// found nothing tangential in has nothing worth routing for.
    pub async fn analyze(&self, context: &str, app_name: &str, window_title: &str) -> AnalyzeResponse {
        let start = Instant::now();
        let request_id = generate_request_id();

        let context = self.resolve_url_context(context).await;

        let concepts = self.concepts.extract_concepts(&context, app_name).await;
        if concepts.is_empty() {
            self.logger
                .log_decision(
                    &request_id,
                    app_name,
                    window_title,
                    &tangent_core::StrategyWeights::balanced("no tangential concepts extracted"),
                    Vec::new(),
                    context.chars().count(),
                    None,
                )
                .await;
            return AnalyzeResponse::empty(start.elapsed().as_millis() as u64);
        }

        let main_subject = self.concepts.extract_main_subject(&context).await;
        let query = concepts.iter().take(3).cloned().collect::<Vec<_>>().join(" ");

        let weights = self.judge.analyze(&context, app_name, window_title).await;

        let cascade = self.router.route_weighted(&query, &context, &weights).await;

        let provenance = build_provenance(&cascade);
        let scored = self.scorer.filter_and_rank(&cascade.items, self.max_suggestions);

        let mut suggestions = Vec::with_capacity(scored.len());
        for item in &scored {
            let source = provenance.get(item.item.fingerprint()).copied().unwrap_or_else(|| default_source(&item.item));
            let suggestion =
                tangent_synth::synthesize(self.llm.as_ref(), &self.model, &item.item, &context, item.relevance, item.novelty, source)
                    .await;
            suggestions.push(suggestion);
        }

        let should_offer_web = cascade.should_offer_web || tangent_synth::should_search_web(&main_subject, &concepts);

        let insight_ids: Vec<String> = suggestions.iter().map(|s| s.id.clone()).collect();
        self.logger
            .log_decision(
                &request_id,
                app_name,
                window_title,
                &weights,
                insight_ids,
                context.chars().count(),
                Some(cascade.path.as_str().to_string()),
            )
            .await;

        AnalyzeResponse {
            suggestions,
            processing_time_ms: start.elapsed().as_millis() as u64,
            retrieval_path: Some(cascade.path.as_str().to_string()),
            confidence: Some(cascade.confidence.as_str().to_string()),
            graph_insight: cascade.graph_insight,
            should_offer_web,
        }
    }

    /// Step 2: if the context carries a `CURRENT_URL:` marker that isn't
    /// a browser-internal scheme, replace the raw context with the
    /// fetched page content so extraction works against the actual page
    /// rather than whatever chrome extension metadata surrounded the URL.
    async fn resolve_url_context(&self, context: &str) -> String {
        let Some(url) = extract_current_url(context) else {
            return context.to_string();
        };
        if is_internal_scheme(&url) {
            return context.to_string();
        }

        match self.web.get_contents(&[url.clone()]).await {
            Ok(results) if !results.is_empty() => {
                let page = &results[0];
                let content: String = page.text.chars().take(8000).collect();
                format!("Page Title: {}\nURL: {}\n\nContent:\n{}", page.title, url, content)
            }
            Ok(_) => context.to_string(),
            Err(err) => {
                warn!(error = %err, url, "failed to fetch CURRENT_URL page content, using raw context");
                context.to_string()
            }
        }
    }
}

/// Pulls `CascadeResult::item_sources`/`item_strategies` (populated only
/// by `route_weighted`) into a fingerprint-keyed lookup, so provenance
/// survives the Scorer's re-sort of the item list.
fn build_provenance(cascade: &tangent_core::CascadeResult) -> HashMap<String, SuggestionSource> {
    if cascade.item_sources.len() != cascade.items.len() || cascade.item_strategies.len() != cascade.items.len() {
        return HashMap::new();
    }

    cascade
        .items
        .iter()
        .zip(cascade.item_sources.iter())
        .zip(cascade.item_strategies.iter())
        .map(|((item, source), strategy)| (item.fingerprint().to_string(), suggestion_source(*source, *strategy)))
        .collect()
}

fn suggestion_source(source: Source, strategy: Strategy) -> SuggestionSource {
    match (source, strategy) {
        (Source::Local, _) => SuggestionSource::Local,
        (Source::Web, Strategy::Vector) => SuggestionSource::Web,
        (Source::Web, _) => SuggestionSource::Orthogonal,
        (Source::Mixed, _) => SuggestionSource::Orthogonal,
    }
}

/// Used when provenance wasn't tracked (legacy cascade paths never run
/// by `/analyze`) — the item's own variant is the next best signal.
fn default_source(item: &Item) -> SuggestionSource {
    match item {
        Item::Memory(_) => SuggestionSource::Local,
        Item::Web(_) => SuggestionSource::Web,
    }
}

fn extract_current_url(context: &str) -> Option<String> {
    context.lines().find_map(|line| line.trim().strip_prefix("CURRENT_URL:").map(|rest| rest.trim().to_string()))
}

fn is_internal_scheme(url: &str) -> bool {
    url.starts_with("chrome://") || url.starts_with("about://")
}

fn generate_request_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_current_url_marker() {
        let context = "Some page\nCURRENT_URL: https://example.com/article\nmore text";
        assert_eq!(extract_current_url(context).as_deref(), Some("https://example.com/article"));
    }

    #[test]
    fn no_marker_returns_none() {
        assert_eq!(extract_current_url("just plain text"), None);
    }

    #[test]
    fn skips_chrome_and_about_schemes() {
        assert!(is_internal_scheme("chrome://settings"));
        assert!(is_internal_scheme("about://blank"));
        assert!(!is_internal_scheme("https://example.com"));
    }

    #[test]
    fn request_id_is_eight_lowercase_alphanumeric_chars() {
        let id = generate_request_id();
        assert_eq!(id.chars().count(), 8);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn suggestion_source_maps_local_to_local() {
        assert_eq!(suggestion_source(Source::Local, Strategy::Vector), SuggestionSource::Local);
    }

    #[test]
    fn suggestion_source_maps_web_vector_to_web_search() {
        assert_eq!(suggestion_source(Source::Web, Strategy::Vector), SuggestionSource::Web);
    }

    #[test]
    fn suggestion_source_maps_web_orthogonal_strategies_to_orthogonal() {
        for strategy in [Strategy::Orthogonal, Strategy::Pca, Strategy::Antonym, Strategy::Bridge] {
            assert_eq!(suggestion_source(Source::Web, strategy), SuggestionSource::Orthogonal);
        }
    }
}
