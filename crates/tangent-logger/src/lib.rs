//! Append-only JSON-lines decision log (spec §4.9).
//!
//! Two record kinds share one file: `decision` (context -> weights ->
//! what was returned) and `feedback` (user response to a suggestion).
//! Writes are best-effort — a logging failure must never fail the
//! primary request, so every write error is swallowed after a `warn!`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tangent_core::StrategyWeights;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

/// A routing decision: the context/app that triggered it, the weights
/// the judge assigned, and which suggestions were ultimately returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "type")]
    pub kind: DecisionKind,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub app_name: String,
    pub window_title: String,
    pub weights: StrategyWeights,
    pub insight_ids: Vec<String>,
    pub context_len: usize,
    pub retrieval_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Decision,
}

/// A feedback signal against a previously-returned suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub insight_id: String,
    pub signal: String,
    pub dwell_time_ms: Option<u64>,
    pub position: Option<usize>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Feedback,
}

/// Any record the log can contain, used for reading it back.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LogRecord {
    Decision(Decision),
    Feedback(Feedback),
}

/// Append-only JSONL logger. One logger is constructed at startup and
/// shared behind an `Arc`; the internal mutex only serializes individual
/// appends, it doesn't hold the file open across calls.
pub struct DecisionLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DecisionLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Logs a routing decision. Window title is truncated to 100 chars
    /// per spec §4.9; full context is never logged, only its length.
    pub async fn log_decision(
        &self,
        request_id: &str,
        app_name: &str,
        window_title: &str,
        weights: &StrategyWeights,
        insight_ids: Vec<String>,
        context_len: usize,
        retrieval_path: Option<String>,
    ) {
        let truncated_title: String = window_title.chars().take(100).collect();
        let entry = Decision {
            kind: DecisionKind::Decision,
            timestamp: Utc::now(),
            request_id: request_id.to_string(),
            app_name: app_name.to_string(),
            window_title: truncated_title,
            weights: weights.clone(),
            insight_ids,
            context_len,
            retrieval_path,
        };

        self.write_entry(&entry).await;
    }

    /// Logs a feedback signal against a previously-returned suggestion.
    pub async fn log_feedback(
        &self,
        request_id: &str,
        insight_id: &str,
        signal: &str,
        dwell_time_ms: Option<u64>,
        position: Option<usize>,
        metadata: Option<Value>,
    ) {
        let entry = Feedback {
            kind: FeedbackKind::Feedback,
            timestamp: Utc::now(),
            request_id: request_id.to_string(),
            insight_id: insight_id.to_string(),
            signal: signal.to_string(),
            dwell_time_ms,
            position,
            metadata: metadata.unwrap_or(Value::Null),
        };

        self.write_entry(&entry).await;
    }

    async fn write_entry<T: Serialize>(&self, entry: &T) {
        if let Err(err) = self.try_write_entry(entry).await {
            warn!(error = %err, path = %self.path.display(), "decision log write failed");
        }
    }

    async fn try_write_entry<T: Serialize>(&self, entry: &T) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let line = serde_json::to_string(entry)?;
        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    /// Reads every record in the log, in file order. Corrupt lines are
    /// skipped rather than aborting the read.
    async fn read_all(&self) -> anyhow::Result<Vec<LogRecord>> {
        read_all_from(&self.path).await
    }

    /// Joins decisions with their feedback by `request_id`, for offline
    /// training-data export. Not exposed over HTTP — no endpoint in
    /// spec §6 needs it.
    pub async fn read_pairs(&self) -> anyhow::Result<Vec<(Decision, Vec<Feedback>)>> {
        let records = self.read_all().await?;

        let mut decisions: Vec<Decision> = Vec::new();
        let mut feedback_by_request: std::collections::HashMap<String, Vec<Feedback>> =
            std::collections::HashMap::new();

        for record in records {
            match record {
                LogRecord::Decision(decision) => decisions.push(decision),
                LogRecord::Feedback(feedback) => {
                    feedback_by_request.entry(feedback.request_id.clone()).or_default().push(feedback);
                }
            }
        }

        Ok(decisions
            .into_iter()
            .map(|decision| {
                let fb = feedback_by_request.get(&decision.request_id).cloned().unwrap_or_default();
                (decision, fb)
            })
            .collect())
    }
}

async fn read_all_from(path: &Path) -> anyhow::Result<Vec<LogRecord>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let contents = tokio::fs::read_to_string(path).await?;
    let mut records = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => records.push(record),
            Err(err) => warn!(error = %err, "skipping unparseable decision log line"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> StrategyWeights {
        StrategyWeights { serendipity: 0.5, relevance: 0.5, source_web: 0.5, source_local: 0.5, reasoning: "test".to_string() }
    }

    #[tokio::test]
    async fn logs_and_reads_back_a_decision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let logger = DecisionLogger::new(&path);

        logger
            .log_decision("req1", "Safari", "Some Window Title", &weights(), vec!["s1".to_string()], 120, Some("weighted".to_string()))
            .await;

        let pairs = logger.read_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.request_id, "req1");
        assert!(pairs[0].1.is_empty());
    }

    #[tokio::test]
    async fn joins_decision_with_its_feedback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let logger = DecisionLogger::new(&path);

        logger
            .log_decision("req1", "Safari", "Title", &weights(), vec!["s1".to_string(), "s2".to_string()], 50, None)
            .await;
        logger.log_feedback("req1", "s1", "click", Some(1500), Some(0), None).await;
        logger.log_feedback("req1", "s2", "dismiss", None, Some(1), None).await;
        logger.log_decision("req2", "Safari", "Other", &weights(), vec![], 10, None).await;

        let pairs = logger.read_pairs().await.unwrap();
        assert_eq!(pairs.len(), 2);

        let req1 = pairs.iter().find(|(d, _)| d.request_id == "req1").unwrap();
        assert_eq!(req1.1.len(), 2);
        assert_eq!(req1.1[0].signal, "click");

        let req2 = pairs.iter().find(|(d, _)| d.request_id == "req2").unwrap();
        assert!(req2.1.is_empty());
    }

    #[tokio::test]
    async fn truncates_window_title_to_100_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let logger = DecisionLogger::new(&path);

        let long_title = "x".repeat(500);
        logger.log_decision("req1", "Safari", &long_title, &weights(), vec![], 0, None).await;

        let pairs = logger.read_pairs().await.unwrap();
        assert_eq!(pairs[0].0.window_title.chars().count(), 100);
    }

    #[tokio::test]
    async fn reading_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.jsonl");
        let logger = DecisionLogger::new(&path);

        let pairs = logger.read_pairs().await.unwrap();
        assert!(pairs.is_empty());
    }

    #[tokio::test]
    async fn skips_corrupt_lines_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        tokio::fs::write(&path, "{not json}\n").await.unwrap();

        let logger = DecisionLogger::new(&path);
        logger.log_decision("req1", "Safari", "Title", &weights(), vec![], 0, None).await;

        let pairs = logger.read_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
    }
}
