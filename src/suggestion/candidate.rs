//! Suggestion candidate, recipient profile and feedback types

use crate::error::{Error, Result};
use crate::quality::QualityMetrics;
use serde::{Deserialize, Serialize};

/// Lowest priority/confidence value
pub const SCORE_MIN: u8 = 1;
/// Highest priority/confidence value
pub const SCORE_MAX: u8 = 10;

/// Category of a partner suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    EmotionalSupport,
    QualityTime,
    ActsOfService,
    WordsOfAffirmation,
    PhysicalTouch,
    Gifts,
    Communication,
    Other,
}

impl std::fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SuggestionCategory::EmotionalSupport => "emotional_support",
            SuggestionCategory::QualityTime => "quality_time",
            SuggestionCategory::ActsOfService => "acts_of_service",
            SuggestionCategory::WordsOfAffirmation => "words_of_affirmation",
            SuggestionCategory::PhysicalTouch => "physical_touch",
            SuggestionCategory::Gifts => "gifts",
            SuggestionCategory::Communication => "communication",
            SuggestionCategory::Other => "other",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SuggestionCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "emotional_support" => Ok(SuggestionCategory::EmotionalSupport),
            "quality_time" => Ok(SuggestionCategory::QualityTime),
            "acts_of_service" => Ok(SuggestionCategory::ActsOfService),
            "words_of_affirmation" => Ok(SuggestionCategory::WordsOfAffirmation),
            "physical_touch" => Ok(SuggestionCategory::PhysicalTouch),
            "gifts" => Ok(SuggestionCategory::Gifts),
            "communication" => Ok(SuggestionCategory::Communication),
            "other" => Ok(SuggestionCategory::Other),
            other => Err(Error::Validation(format!("unknown suggestion category: {}", other))),
        }
    }
}

/// A generated suggestion for the recipient.
///
/// `confidence` is only changed by the post-validation adjustment, and
/// `quality` is attached once the candidate has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    pub category: SuggestionCategory,
    pub text: String,
    /// Context shown alongside the suggestion, stripped of private details
    pub anonymized_context: String,
    pub priority: u8,
    pub confidence: u8,
    /// Metrics from the validation that accepted this candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
}

impl SuggestionCandidate {
    /// Create a candidate with mid-range priority and confidence.
    pub fn new(
        category: SuggestionCategory,
        text: impl Into<String>,
        anonymized_context: impl Into<String>,
    ) -> Self {
        Self {
            category,
            text: text.into(),
            anonymized_context: anonymized_context.into(),
            priority: 5,
            confidence: 5,
            quality: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(SCORE_MIN, SCORE_MAX);
        self
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.clamp(SCORE_MIN, SCORE_MAX);
        self
    }

    /// Shift confidence by `delta`, clamped to [1, 10].
    pub fn adjust_confidence(&mut self, delta: i8) {
        let adjusted = (self.confidence as i16 + delta as i16)
            .clamp(SCORE_MIN as i16, SCORE_MAX as i16);
        self.confidence = adjusted as u8;
    }

    /// Structural checks applied to generator output.
    pub fn check_well_formed(&self) -> std::result::Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("suggestion text is empty".to_string());
        }
        if !(SCORE_MIN..=SCORE_MAX).contains(&self.priority) {
            return Err(format!("priority {} outside [1, 10]", self.priority));
        }
        if !(SCORE_MIN..=SCORE_MAX).contains(&self.confidence) {
            return Err(format!("confidence {} outside [1, 10]", self.confidence));
        }
        Ok(())
    }
}

/// What is known about how the recipient likes to receive care.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientProfile {
    pub recipient_id: String,
    /// Preferred categories, most preferred first
    #[serde(default)]
    pub preferred_categories: Vec<SuggestionCategory>,
}

impl RecipientProfile {
    pub fn new(recipient_id: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            preferred_categories: Vec::new(),
        }
    }

    pub fn prefer(mut self, category: SuggestionCategory) -> Self {
        if !self.preferred_categories.contains(&category) {
            self.preferred_categories.push(category);
        }
        self
    }

    /// The top-ranked preference, if any.
    pub fn top_preference(&self) -> Option<SuggestionCategory> {
        self.preferred_categories.first().copied()
    }
}

/// One historical rating of a delivered suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub category: SuggestionCategory,
    /// Rating from 1 (poor) to 5 (great)
    pub rating: u8,
}

impl FeedbackRecord {
    pub fn new(category: SuggestionCategory, rating: u8) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation(format!("rating {} outside [1, 5]", rating)));
        }
        Ok(Self { category, rating })
    }
}
