//! Suggestion generator interface
//!
//! The generator is an external collaborator: given a context bundle, the
//! raw private text and the recipient's profile (plus improvement notes from
//! a rejected attempt), it produces one candidate suggestion or fails.
//!
//! ```text
//! RegenerationController → [primary generator] ──(unavailable/timeout)──→ [rule-based fallback]
//!                                   ↓                                            ↓
//!                              candidate ─────────────→ QualityValidator ←───── candidate
//! ```

use super::candidate::{RecipientProfile, SuggestionCandidate};
use crate::memory::RelationshipType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything a generator needs to produce one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub context_bundle: String,
    pub private_text: String,
    pub recipient: RecipientProfile,
    pub relationship_type: RelationshipType,
    /// Notes from the previous rejected attempt, empty on the first attempt
    #[serde(default)]
    pub improvement_notes: Vec<String>,
}

impl GenerationRequest {
    pub fn new(
        context_bundle: impl Into<String>,
        private_text: impl Into<String>,
        recipient: RecipientProfile,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            context_bundle: context_bundle.into(),
            private_text: private_text.into(),
            recipient,
            relationship_type,
            improvement_notes: Vec::new(),
        }
    }

    /// Copy of this request carrying notes from a rejected attempt.
    pub fn with_notes(&self, notes: Vec<String>) -> Self {
        Self {
            improvement_notes: notes,
            ..self.clone()
        }
    }

    pub fn is_regeneration(&self) -> bool {
        !self.improvement_notes.is_empty()
    }
}

/// Ways a generator call can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// Service could not be reached or refused the request
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// No response within the configured timeout
    #[error("generator timed out after {0}s")]
    Timeout(u64),

    /// Response could not be turned into a well-formed candidate
    #[error("malformed generator output: {0}")]
    Malformed(String),
}

/// Source of candidate suggestions.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    /// Produce one candidate for the request.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<SuggestionCandidate, GeneratorError>;

    /// Human-readable name used in logs.
    fn name(&self) -> &str;
}
