//! Deterministic multi-metric quality validator
//!
//! Scores a suggestion candidate against the private text it was derived
//! from, the recipient's preference profile and the recipient's feedback
//! history. Every score is a fixed function of its inputs: the validator
//! holds only compiled marker sets and never keeps state between calls.
//!
//! | Metric | Start | Rules |
//! |---|---|---|
//! | relevance | 5.0 | +2.0 category answers a detected need, else +0.5 if any need word; +1.5 top preference |
//! | actionability | 5.0 | +2.0 action verb; -1.5 for ≥2 hedges; +1.0 time window; -1.0 length outside 30..=200 |
//! | privacy | 8.0 | -4.0 overlap > 0.30, else -2.0 overlap > 0.15; -1.5 echoed private emotion |
//! | naturalness | 6.0 | -1.5 per demand; +1.0 gentle hedge; +2.0 natural phrase; +1.0 recipient perspective |
//! | feedback_integration | 5.0 (7.0 without history) | -2.0 for ≥3 ratings ≤2; +1.5 for ≥3 ratings ≥4 |

use super::markers::{Markers, PRIVATE_EMOTIONS};
use super::metrics::{QualityMetrics, ValidationResult};
use crate::config::QualityConfig;
use crate::error::Result;
use crate::suggestion::{FeedbackRecord, RecipientProfile, SuggestionCandidate};
use std::collections::BTreeSet;

const RELEVANCE_BASE: f64 = 5.0;
const ACTIONABILITY_BASE: f64 = 5.0;
const PRIVACY_BASE: f64 = 8.0;
const NATURALNESS_BASE: f64 = 6.0;
const FEEDBACK_BASE: f64 = 5.0;
const FEEDBACK_NO_HISTORY: f64 = 7.0;

const MIN_TEXT_CHARS: usize = 30;
const MAX_TEXT_CHARS: usize = 200;

/// Source words must be longer than this to count towards overlap
const OVERLAP_MIN_WORD_CHARS: usize = 3;
const OVERLAP_HIGH: f64 = 0.30;
const OVERLAP_MODERATE: f64 = 0.15;

/// Ratings needed in one direction before history moves the score
const FEEDBACK_MIN_RATINGS: usize = 3;

/// Pure scorer and accept/reject gate for suggestion candidates.
#[derive(Debug, Clone)]
pub struct QualityValidator {
    markers: Markers,
    threshold: f64,
}

impl QualityValidator {
    /// Create a validator with the configured acceptance threshold
    pub fn new(config: &QualityConfig) -> Result<Self> {
        Ok(Self {
            markers: Markers::compile()?,
            threshold: config.acceptance_threshold,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score a candidate and decide whether it passes the quality gate.
    ///
    /// Empty source text leaves the source-dependent scores at their
    /// starting values.
    pub fn validate(
        &self,
        candidate: &SuggestionCandidate,
        source_private_text: &str,
        recipient: &RecipientProfile,
        feedback: &[FeedbackRecord],
    ) -> ValidationResult {
        let source = source_private_text.trim();
        let overlap = overlap_ratio(source, &candidate.text);

        let metrics = QualityMetrics::from_scores(
            self.relevance(candidate, source, recipient),
            self.actionability(candidate),
            self.privacy(candidate, source, overlap),
            self.naturalness(candidate),
            feedback_integration(candidate, feedback),
        );

        let result = ValidationResult::from_metrics(metrics, self.threshold, overlap);
        tracing::debug!(
            category = %candidate.category,
            overall = result.metrics.overall,
            is_valid = result.is_valid,
            "Validated suggestion candidate"
        );
        result
    }

    fn relevance(
        &self,
        candidate: &SuggestionCandidate,
        source: &str,
        recipient: &RecipientProfile,
    ) -> f64 {
        let mut score = RELEVANCE_BASE;

        let families = self.markers.need_families(source);
        if families.iter().any(|f| f.answers(candidate.category)) {
            score += 2.0;
        } else if !families.is_empty() {
            score += 0.5;
        }

        if recipient.top_preference() == Some(candidate.category) {
            score += 1.5;
        }
        score
    }

    fn actionability(&self, candidate: &SuggestionCandidate) -> f64 {
        let text = &candidate.text;
        let mut score = ACTIONABILITY_BASE;

        if self.markers.action_verbs.any(text) {
            score += 2.0;
        }
        if self.markers.vague_hedges.count(text) >= 2 {
            score -= 1.5;
        }
        if self.markers.time_windows.any(text) {
            score += 1.0;
        }
        let len = text.chars().count();
        if !(MIN_TEXT_CHARS..=MAX_TEXT_CHARS).contains(&len) {
            score -= 1.0;
        }
        score
    }

    fn privacy(&self, candidate: &SuggestionCandidate, source: &str, overlap: f64) -> f64 {
        let mut score = PRIVACY_BASE;

        if overlap > OVERLAP_HIGH {
            score -= 4.0;
        } else if overlap > OVERLAP_MODERATE {
            score -= 2.0;
        }

        let source_words: BTreeSet<String> = tokenize(source).collect();
        let shown_words: BTreeSet<String> = tokenize(&candidate.text)
            .chain(tokenize(&candidate.anonymized_context))
            .collect();
        let echoes_emotion = PRIVATE_EMOTIONS
            .iter()
            .any(|w| source_words.contains(*w) && shown_words.contains(*w));
        if echoes_emotion {
            score -= 1.5;
        }
        score
    }

    fn naturalness(&self, candidate: &SuggestionCandidate) -> f64 {
        let text = &candidate.text;
        let mut score = NATURALNESS_BASE;

        score -= 1.5 * self.markers.demanding.count(text) as f64;
        if self.markers.gentle_hedges.any(text) {
            score += 1.0;
        }
        if self.markers.natural_phrases.any(text) {
            score += 2.0;
        }
        if self.markers.recipient_perspective.any(text) {
            score += 1.0;
        }
        score
    }
}

fn feedback_integration(candidate: &SuggestionCandidate, feedback: &[FeedbackRecord]) -> f64 {
    if feedback.is_empty() {
        return FEEDBACK_NO_HISTORY;
    }

    let ratings: Vec<u8> = feedback
        .iter()
        .filter(|f| f.category == candidate.category)
        .map(|f| f.rating)
        .collect();
    let poor = ratings.iter().filter(|r| **r <= 2).count();
    let good = ratings.iter().filter(|r| **r >= 4).count();

    let mut score = FEEDBACK_BASE;
    if poor >= FEEDBACK_MIN_RATINGS {
        score -= 2.0;
    }
    if good >= FEEDBACK_MIN_RATINGS {
        score += 1.5;
    }
    score
}

/// Lowercased words with surrounding punctuation removed.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '’').to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Fraction of distinct source words (longer than three characters) that
/// reappear in the candidate, either verbatim inside its text or as a
/// source word containing one of the candidate's longer words.
pub fn overlap_ratio(source: &str, candidate: &str) -> f64 {
    let source_words: BTreeSet<String> = tokenize(source)
        .filter(|w| w.chars().count() > OVERLAP_MIN_WORD_CHARS)
        .collect();
    if source_words.is_empty() {
        return 0.0;
    }

    let candidate_lower = candidate.to_lowercase();
    let candidate_words: BTreeSet<String> = tokenize(candidate)
        .filter(|w| w.chars().count() > OVERLAP_MIN_WORD_CHARS)
        .collect();

    let shared = source_words
        .iter()
        .filter(|w| {
            candidate_lower.contains(w.as_str())
                || candidate_words.iter().any(|cw| w.contains(cw.as_str()))
        })
        .count();

    shared as f64 / source_words.len() as f64
}
