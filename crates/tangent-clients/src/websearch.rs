use async_trait::async_trait;
use serde::Deserialize;
use tangent_core::SearchResult;

use crate::error::ClientError;

/// Narrows a web search: domains to exclude outright, and a subject the
/// results should *not* be primarily about (the redundancy filter used
/// when the caller already knows what's on the user's screen).
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub exclude_domains: Vec<String>,
    pub exclude_text: Option<String>,
}

#[async_trait]
pub trait WebSearchClient: Send + Sync {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
        options: &SearchOptions,
    ) -> anyhow::Result<Vec<SearchResult>>;

    async fn find_similar(&self, url: &str, num_results: usize) -> anyhow::Result<Vec<SearchResult>>;

    async fn get_contents(&self, urls: &[String]) -> anyhow::Result<Vec<SearchResult>>;
}

#[derive(Debug, Deserialize)]
struct ExaItem {
    title: Option<String>,
    url: String,
    text: Option<String>,
    score: Option<f32>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    results: Vec<ExaItem>,
}

impl From<ExaItem> for SearchResult {
    fn from(item: ExaItem) -> Self {
        SearchResult {
            title: item.title.unwrap_or_default(),
            url: item.url,
            text: item.text.unwrap_or_default(),
            score: item.score.unwrap_or(0.8),
            published_date: item.published_date,
        }
    }
}

pub struct ExaWebSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ExaWebSearchClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> anyhow::Result<ExaResponse> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(ClientError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()).into())
    }
}

#[async_trait]
impl WebSearchClient for ExaWebSearchClient {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
        options: &SearchOptions,
    ) -> anyhow::Result<Vec<SearchResult>> {
        let mut body = serde_json::json!({
            "query": query,
            "type": "neural",
            "numResults": num_results + 3,
            "contents": {"text": {"maxCharacters": 2000}},
            "useAutoprompt": true,
        });

        if !options.exclude_domains.is_empty() {
            body["excludeDomains"] = serde_json::json!(options.exclude_domains);
        }

        let response = self.post("/search", body).await?;
        let mut results: Vec<SearchResult> = response.results.into_iter().map(Into::into).collect();

        if let Some(exclude_text) = &options.exclude_text {
            results = filter_redundant_results(results, exclude_text);
        }

        results.truncate(num_results);
        Ok(results)
    }

    async fn find_similar(&self, url: &str, num_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "url": url,
            "numResults": num_results,
            "contents": {"text": {"maxCharacters": 2000}},
            "excludeSourceDomain": true,
        });

        let response = self.post("/findSimilar", body).await?;
        Ok(response.results.into_iter().map(Into::into).collect())
    }

    async fn get_contents(&self, urls: &[String]) -> anyhow::Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "urls": urls,
            "text": {"maxCharacters": 8000},
        });

        let response = self.post("/contents", body).await?;
        Ok(response
            .results
            .into_iter()
            .map(|item| SearchResult { score: 1.0, ..item.into() })
            .collect())
    }
}

/// Filters out results that are primarily about the subject the user is
/// already looking at, so a redundancy-filtered web search doesn't just
/// hand back the same echo-chamber content under a different URL.
fn filter_redundant_results(results: Vec<SearchResult>, exclude_text: &str) -> Vec<SearchResult> {
    let exclude_lower = exclude_text.to_lowercase();
    let exclude_words: std::collections::HashSet<&str> = exclude_lower.split_whitespace().collect();

    results
        .into_iter()
        .filter(|result| {
            let title_lower = result.title.to_lowercase();
            let text_preview: String = result.text.chars().take(500).collect::<String>().to_lowercase();

            let title_match = title_lower.contains(&exclude_lower);

            let title_words: std::collections::HashSet<&str> = title_lower.split_whitespace().collect();
            let overlap = exclude_words.intersection(&title_words).count();
            let high_word_overlap = overlap >= 2.min(exclude_words.len().max(1));

            let text_starts_with = text_preview.starts_with(&exclude_lower);

            let is_redundant = title_match || (high_word_overlap && text_starts_with);
            !is_redundant
        })
        .collect()
}
