//! Bounded regeneration loop around the generator and the quality gate
//!
//! ```text
//! attempt 1: generate ─→ validate ─(valid)──→ adjust confidence ─→ sink ─→ Accepted
//!                             │
//!                         (invalid)
//!                             ↓
//! attempt 2..=1+N: generate(with improvement notes) ─→ validate ─→ …
//!                             │
//!                    (still invalid) ─→ Rejected, nothing persisted
//! ```
//!
//! Attempts for one request run strictly in sequence. A primary generator
//! that is unavailable or times out is replaced by the fallback for that
//! attempt; malformed output consumes the attempt. Only a sink failure is
//! returned as an error.

use super::candidate::{FeedbackRecord, SuggestionCandidate};
use super::generator::{GenerationRequest, GeneratorError, SuggestionGenerator};
use super::sink::{AcceptedSuggestion, SuggestionSink};
use crate::config::RegenerationConfig;
use crate::error::Result;
use crate::quality::{QualityValidator, ValidationResult};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Sent with a regeneration when the rejected attempt produced no notes.
const GENERIC_NOTE: &str =
    "The previous suggestion fell below the quality threshold; propose a different, more specific idea.";

/// Sent with a regeneration after malformed generator output.
const MALFORMED_NOTE: &str =
    "The previous response was not a usable suggestion; return one short, concrete suggestion.";

/// Result of running one request through the quality gate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    /// A candidate passed and was persisted
    Accepted(AcceptedSuggestion),
    /// Every attempt failed; nothing was emitted
    Rejected {
        attempts: u32,
        /// Validation of the last scored attempt, if any attempt was scored
        last: Option<ValidationResult>,
    },
}

impl GateOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&AcceptedSuggestion> {
        match self {
            GateOutcome::Accepted(s) => Some(s),
            GateOutcome::Rejected { .. } => None,
        }
    }
}

/// Coordinates generator, validator and sink for one request at a time.
pub struct RegenerationController {
    primary: Arc<dyn SuggestionGenerator>,
    fallback: Option<Arc<dyn SuggestionGenerator>>,
    validator: QualityValidator,
    sink: Arc<dyn SuggestionSink>,
    config: RegenerationConfig,
}

impl RegenerationController {
    pub fn new(
        primary: Arc<dyn SuggestionGenerator>,
        validator: QualityValidator,
        sink: Arc<dyn SuggestionSink>,
        config: RegenerationConfig,
    ) -> Self {
        Self {
            primary,
            fallback: None,
            validator,
            sink,
            config,
        }
    }

    /// Use `fallback` whenever the primary generator is unavailable or
    /// times out.
    pub fn with_fallback(mut self, fallback: Arc<dyn SuggestionGenerator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn validator(&self) -> &QualityValidator {
        &self.validator
    }

    /// Total attempts allowed per request.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_regenerations.saturating_add(1)
    }

    /// Generate, validate and, if accepted, persist one suggestion.
    pub async fn run(
        &self,
        relationship_id: &str,
        request: &GenerationRequest,
        feedback: &[FeedbackRecord],
    ) -> Result<GateOutcome> {
        let max_attempts = self.max_attempts();
        let mut notes: Vec<String> = Vec::new();
        let mut last: Option<ValidationResult> = None;

        for attempt in 1..=max_attempts {
            let attempt_request = request.with_notes(notes.clone());

            let (candidate, generator) = match self.generate(&attempt_request).await {
                Ok(generated) => generated,
                Err(err) => {
                    tracing::warn!(
                        relationship_id,
                        attempt,
                        error = %err,
                        "No usable candidate for this attempt"
                    );
                    notes = vec![MALFORMED_NOTE.to_string()];
                    continue;
                }
            };

            let result = self.validator.validate(
                &candidate,
                &request.private_text,
                &request.recipient,
                feedback,
            );

            if result.is_valid {
                let accepted = self.accept(relationship_id, request, candidate, &result, attempt, generator);
                self.sink.persist(&accepted).await?;
                tracing::info!(
                    relationship_id,
                    attempt,
                    overall = result.metrics.overall,
                    confidence = accepted.candidate.confidence,
                    "Suggestion accepted"
                );
                return Ok(GateOutcome::Accepted(accepted));
            }

            tracing::info!(
                relationship_id,
                attempt,
                overall = result.metrics.overall,
                notes = result.improvement_notes.len(),
                "Suggestion rejected by quality gate"
            );
            notes = if result.improvement_notes.is_empty() {
                vec![GENERIC_NOTE.to_string()]
            } else {
                result.improvement_notes.clone()
            };
            last = Some(result);
        }

        tracing::warn!(
            relationship_id,
            attempts = max_attempts,
            "No candidate passed the quality gate, emitting nothing"
        );
        Ok(GateOutcome::Rejected {
            attempts: max_attempts,
            last,
        })
    }

    fn accept(
        &self,
        relationship_id: &str,
        request: &GenerationRequest,
        mut candidate: SuggestionCandidate,
        result: &ValidationResult,
        attempt: u32,
        generator: String,
    ) -> AcceptedSuggestion {
        candidate.adjust_confidence(result.confidence_adjustment);
        candidate.quality = Some(result.metrics);
        AcceptedSuggestion {
            id: Uuid::new_v4(),
            relationship_id: relationship_id.to_string(),
            recipient_id: request.recipient.recipient_id.clone(),
            candidate,
            metrics: result.metrics,
            attempt,
            generator,
            accepted_at: Utc::now(),
        }
    }

    /// One generation, with timeout and fallback applied.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<(SuggestionCandidate, String), GeneratorError> {
        let secs = self.config.generator_timeout_secs;
        let primary = match tokio::time::timeout(
            Duration::from_secs(secs),
            self.primary.generate(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GeneratorError::Timeout(secs)),
        };

        let (candidate, name) = match primary {
            Ok(candidate) => (candidate, self.primary.name()),
            Err(err @ GeneratorError::Malformed(_)) => return Err(err),
            Err(err) => {
                let Some(fallback) = self.fallback.as_ref() else {
                    return Err(err);
                };
                tracing::warn!(
                    generator = self.primary.name(),
                    fallback = fallback.name(),
                    error = %err,
                    "Primary generator failed, using fallback"
                );
                (fallback.generate(request).await?, fallback.name())
            }
        };

        candidate
            .check_well_formed()
            .map_err(GeneratorError::Malformed)?;
        Ok((candidate, name.to_string()))
    }
}
