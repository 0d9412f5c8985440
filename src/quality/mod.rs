//! Suggestion quality scoring
//!
//! Five heuristic sub-scores (relevance, actionability, privacy,
//! naturalness, feedback integration) combined into a weighted overall
//! score and compared against the acceptance threshold.

mod markers;
mod metrics;
mod validator;

pub use markers::{MarkerSet, Markers, NeedFamily, PRIVATE_EMOTIONS};
pub use metrics::{QualityMetrics, ValidationResult, SCORE_CEILING, SCORE_FLOOR};
pub use validator::{overlap_ratio, QualityValidator};
