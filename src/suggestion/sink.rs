//! Outbound persistence boundary for accepted suggestions
//!
//! Only accepted candidates reach a sink. A sink failure is the one error
//! the coaching flow never swallows: it propagates to the caller as
//! `Error::Persistence`.

use super::candidate::SuggestionCandidate;
use crate::error::{Error, Result};
use crate::quality::QualityMetrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// An accepted suggestion ready for delivery and feedback collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedSuggestion {
    pub id: Uuid,
    pub relationship_id: String,
    pub recipient_id: String,
    /// Candidate with adjusted confidence and attached metrics
    pub candidate: SuggestionCandidate,
    pub metrics: QualityMetrics,
    /// Attempt (1-based) that passed the gate
    pub attempt: u32,
    /// Generator that produced the accepted candidate
    pub generator: String,
    pub accepted_at: DateTime<Utc>,
}

/// Destination for accepted suggestions.
#[async_trait]
pub trait SuggestionSink: Send + Sync {
    /// Persist one accepted suggestion.
    async fn persist(&self, suggestion: &AcceptedSuggestion) -> Result<()>;
}

/// Sink that keeps accepted suggestions in memory.
#[derive(Debug, Default)]
pub struct InMemorySuggestionSink {
    records: RwLock<Vec<AcceptedSuggestion>>,
}

impl InMemorySuggestionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AcceptedSuggestion> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SuggestionSink for InMemorySuggestionSink {
    async fn persist(&self, suggestion: &AcceptedSuggestion) -> Result<()> {
        self.records.write().await.push(suggestion.clone());
        Ok(())
    }
}

/// Sink that appends one JSON record per line to a file.
pub struct JsonlSuggestionSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSuggestionSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SuggestionSink for JsonlSuggestionSink {
    async fn persist(&self, suggestion: &AcceptedSuggestion) -> Result<()> {
        let mut line = serde_json::to_string(suggestion)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::Persistence(format!("Failed to open {}: {}", self.path.display(), e))
            })?;
        file.write_all(line.as_bytes()).await.map_err(|e| {
            Error::Persistence(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        file.flush().await.map_err(|e| {
            Error::Persistence(format!("Failed to flush {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            suggestion_id = %suggestion.id,
            path = %self.path.display(),
            "Persisted accepted suggestion"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::SuggestionCategory;

    fn accepted() -> AcceptedSuggestion {
        let metrics = QualityMetrics::from_scores(8.0, 8.0, 8.0, 8.0, 7.0);
        let mut candidate =
            SuggestionCandidate::new(SuggestionCategory::Gifts, "How about a small treat?", "");
        candidate.quality = Some(metrics);
        AcceptedSuggestion {
            id: Uuid::new_v4(),
            relationship_id: "rel-a".to_string(),
            recipient_id: "partner".to_string(),
            candidate,
            metrics,
            attempt: 1,
            generator: "scripted".to_string(),
            accepted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_sink() {
        let sink = InMemorySuggestionSink::new();
        assert!(sink.is_empty().await);
        let record = accepted();
        sink.persist(&record).await.unwrap();
        assert_eq!(sink.records().await, vec![record]);
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accepted.jsonl");
        let sink = JsonlSuggestionSink::new(&path);

        let first = accepted();
        let second = accepted();
        sink.persist(&first).await.unwrap();
        sink.persist(&second).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: AcceptedSuggestion = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.id, second.id);
        assert_eq!(parsed.candidate.quality, Some(second.metrics));
    }

    #[tokio::test]
    async fn test_jsonl_sink_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSuggestionSink::new(dir.path().join("missing").join("accepted.jsonl"));
        let err = sink.persist(&accepted()).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }
}
