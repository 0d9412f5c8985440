//! Quality metrics and validation results

use serde::{Deserialize, Serialize};

/// Lower bound of every sub-score
pub const SCORE_FLOOR: f64 = 1.0;
/// Upper bound of every sub-score
pub const SCORE_CEILING: f64 = 10.0;

const RELEVANCE_WEIGHT: f64 = 30.0;
const ACTIONABILITY_WEIGHT: f64 = 25.0;
const PRIVACY_WEIGHT: f64 = 25.0;
const NATURALNESS_WEIGHT: f64 = 15.0;
const FEEDBACK_WEIGHT: f64 = 5.0;

/// Sub-scores below this get an improvement note
const NOTE_THRESHOLD: f64 = 6.0;

const RELEVANCE_NOTE: &str =
    "Tie the suggestion more closely to the need behind the reflection and to how the recipient likes to receive care.";
const ACTIONABILITY_NOTE: &str =
    "Make it one concrete action with a clear time window such as tonight, tomorrow or this weekend.";
const PRIVACY_NOTE: &str =
    "Rephrase so the suggestion does not echo words or emotions from the private reflection.";
const NATURALNESS_NOTE: &str =
    "Use gentle, inviting language (\"how about\", \"you could\") instead of demands.";
const FEEDBACK_NOTE: &str =
    "Suggestions of this kind have been rated poorly before; try a different approach.";

/// Five clamped sub-scores and their weighted overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub relevance: f64,
    pub actionability: f64,
    pub privacy: f64,
    pub naturalness: f64,
    pub feedback_integration: f64,
    pub overall: f64,
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(SCORE_FLOOR, SCORE_CEILING)
}

impl QualityMetrics {
    /// Clamp raw sub-scores to [1, 10] and compute the weighted overall.
    pub fn from_scores(
        relevance: f64,
        actionability: f64,
        privacy: f64,
        naturalness: f64,
        feedback_integration: f64,
    ) -> Self {
        let relevance = clamp_score(relevance);
        let actionability = clamp_score(actionability);
        let privacy = clamp_score(privacy);
        let naturalness = clamp_score(naturalness);
        let feedback_integration = clamp_score(feedback_integration);

        let overall = (relevance * RELEVANCE_WEIGHT
            + actionability * ACTIONABILITY_WEIGHT
            + privacy * PRIVACY_WEIGHT
            + naturalness * NATURALNESS_WEIGHT
            + feedback_integration * FEEDBACK_WEIGHT)
            / 100.0;

        Self {
            relevance,
            actionability,
            privacy,
            naturalness,
            feedback_integration,
            overall,
        }
    }

    /// Step function applied to the candidate's confidence after acceptance.
    pub fn confidence_adjustment(&self) -> i8 {
        match self.overall {
            o if o >= 9.0 => 2,
            o if o >= 8.0 => 1,
            o if o >= 7.0 => 0,
            o if o >= 6.0 => -1,
            o if o >= 5.0 => -2,
            _ => -3,
        }
    }

    /// One fixed note per sub-score below 6, in sub-score order.
    pub fn improvement_notes(&self) -> Vec<String> {
        [
            (self.relevance, RELEVANCE_NOTE),
            (self.actionability, ACTIONABILITY_NOTE),
            (self.privacy, PRIVACY_NOTE),
            (self.naturalness, NATURALNESS_NOTE),
            (self.feedback_integration, FEEDBACK_NOTE),
        ]
        .into_iter()
        .filter(|(score, _)| *score < NOTE_THRESHOLD)
        .map(|(_, note)| note.to_string())
        .collect()
    }
}

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub metrics: QualityMetrics,
    /// Overall score reached the acceptance threshold
    pub is_valid: bool,
    pub confidence_adjustment: i8,
    pub improvement_notes: Vec<String>,
    /// Fraction of source words echoed by the candidate
    pub overlap_ratio: f64,
}

impl ValidationResult {
    pub fn from_metrics(metrics: QualityMetrics, threshold: f64, overlap_ratio: f64) -> Self {
        Self {
            is_valid: metrics.overall >= threshold,
            confidence_adjustment: metrics.confidence_adjustment(),
            improvement_notes: metrics.improvement_notes(),
            overlap_ratio,
            metrics,
        }
    }
}
