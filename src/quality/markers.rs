//! Fixed keyword families and language markers
//!
//! Every heuristic in the quality validator and the fact extractor is
//! driven by the fixed word lists below. Matching is case-insensitive and
//! anchored on word boundaries; multi-word markers tolerate any whitespace
//! between words.

use crate::error::{Error, Result};
use crate::suggestion::SuggestionCategory;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stress / overload language, answered with emotional support
const STRESS_WORDS: &[&str] = &[
    "stress", "stressed", "stressful", "overwhelmed", "exhausted", "tired",
    "anxious", "pressure", "burnout", "burned out", "worn out", "drained",
];

/// Distance / togetherness language, answered with quality time
const CONNECTION_WORDS: &[&str] = &[
    "miss", "missed", "missing", "lonely", "distant", "disconnected",
    "together", "quality time", "date night", "connect", "connection",
];

/// Overload with tasks, answered with support or acts of service
const HELP_WORDS: &[&str] = &[
    "help", "busy", "chores", "errands", "overloaded", "support",
    "juggling", "swamped", "too much on",
];

/// Concrete action verbs; matched as stems so "planning" and "offered" count
const ACTION_STEMS: &[&str] = &[
    "plan", "offer", "suggest", "schedule", "ask", "propose", "organiz",
    "organis", "prepar",
];

const VAGUE_HEDGES: &[&str] = &["maybe", "perhaps", "might", "could", "consider", "try to"];

const TIME_WINDOWS: &[&str] = &["tonight", "tomorrow", "this weekend"];

const DEMANDING: &[&str] = &["should", "must", "need to", "have to", "required"];

const GENTLE_HEDGES: &[&str] = &["might", "could", "consider", "perhaps", "maybe"];

const NATURAL_PHRASES: &[&str] = &["how about", "what if", "you could", "it might be nice"];

const RECIPIENT_PERSPECTIVE: &[&str] = &["your partner", "they might"];

/// Emotions that must not be echoed from private text into a suggestion
pub const PRIVATE_EMOTIONS: &[&str] = &[
    "angry", "frustrated", "sad", "disappointed", "hurt", "confused",
];

/// A need family detected in private text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedFamily {
    Stress,
    Connection,
    Help,
}

impl NeedFamily {
    pub const ALL: [NeedFamily; 3] = [NeedFamily::Stress, NeedFamily::Connection, NeedFamily::Help];

    /// Suggestion categories that answer this need.
    pub fn categories(self) -> &'static [SuggestionCategory] {
        match self {
            NeedFamily::Stress => &[SuggestionCategory::EmotionalSupport],
            NeedFamily::Connection => &[SuggestionCategory::QualityTime],
            NeedFamily::Help => &[
                SuggestionCategory::EmotionalSupport,
                SuggestionCategory::ActsOfService,
            ],
        }
    }

    /// Whether a suggestion of `category` answers this need.
    pub fn answers(self, category: SuggestionCategory) -> bool {
        self.categories().contains(&category)
    }

    /// Category the rule-based generator proposes for this need. Help is
    /// answered with a concrete offer rather than a supportive message.
    pub fn proposed_category(self) -> SuggestionCategory {
        match self {
            NeedFamily::Stress => SuggestionCategory::EmotionalSupport,
            NeedFamily::Connection => SuggestionCategory::QualityTime,
            NeedFamily::Help => SuggestionCategory::ActsOfService,
        }
    }

    fn words(self) -> &'static [&'static str] {
        match self {
            NeedFamily::Stress => STRESS_WORDS,
            NeedFamily::Connection => CONNECTION_WORDS,
            NeedFamily::Help => HELP_WORDS,
        }
    }

    /// Tag used on memory entries
    pub fn as_tag(self) -> &'static str {
        match self {
            NeedFamily::Stress => "stress",
            NeedFamily::Connection => "connection",
            NeedFamily::Help => "help",
        }
    }
}

/// A compiled, case-insensitive set of markers.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    name: &'static str,
    pattern: Regex,
}

impl MarkerSet {
    /// Markers that must match as whole words or phrases.
    pub fn words(name: &'static str, words: &[&str]) -> Result<Self> {
        Self::compile(name, words, r"\b")
    }

    /// Markers that match at a word start, with any suffix.
    pub fn stems(name: &'static str, stems: &[&str]) -> Result<Self> {
        Self::compile(name, stems, r"\w*")
    }

    fn compile(name: &'static str, markers: &[&str], tail: &str) -> Result<Self> {
        let alternation = markers
            .iter()
            .map(|m| {
                m.split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{}){}", alternation, tail)).map_err(|e| {
            Error::Validation(format!("Invalid marker set '{}': {}", name, e))
        })?;
        Ok(Self { name, pattern })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Total number of marker occurrences in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }

    /// Whether any marker occurs in `text`.
    pub fn any(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Every marker set used by the heuristics, compiled once.
#[derive(Debug, Clone)]
pub struct Markers {
    pub stress: MarkerSet,
    pub connection: MarkerSet,
    pub help: MarkerSet,
    pub action_verbs: MarkerSet,
    pub vague_hedges: MarkerSet,
    pub time_windows: MarkerSet,
    pub demanding: MarkerSet,
    pub gentle_hedges: MarkerSet,
    pub natural_phrases: MarkerSet,
    pub recipient_perspective: MarkerSet,
}

impl Markers {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            stress: MarkerSet::words("stress", NeedFamily::Stress.words())?,
            connection: MarkerSet::words("connection", NeedFamily::Connection.words())?,
            help: MarkerSet::words("help", NeedFamily::Help.words())?,
            action_verbs: MarkerSet::stems("action_verbs", ACTION_STEMS)?,
            vague_hedges: MarkerSet::words("vague_hedges", VAGUE_HEDGES)?,
            time_windows: MarkerSet::words("time_windows", TIME_WINDOWS)?,
            demanding: MarkerSet::words("demanding", DEMANDING)?,
            gentle_hedges: MarkerSet::words("gentle_hedges", GENTLE_HEDGES)?,
            natural_phrases: MarkerSet::words("natural_phrases", NATURAL_PHRASES)?,
            recipient_perspective: MarkerSet::words("recipient_perspective", RECIPIENT_PERSPECTIVE)?,
        })
    }

    fn family(&self, family: NeedFamily) -> &MarkerSet {
        match family {
            NeedFamily::Stress => &self.stress,
            NeedFamily::Connection => &self.connection,
            NeedFamily::Help => &self.help,
        }
    }

    /// Need families present in `text`, in fixed family order.
    pub fn need_families(&self, text: &str) -> Vec<NeedFamily> {
        NeedFamily::ALL
            .into_iter()
            .filter(|f| self.family(*f).any(text))
            .collect()
    }
}
