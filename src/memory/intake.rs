//! Fact intake: raw private text → stored memory entries
//!
//! Every inbound private input passes through intake, which always records
//! one `interaction` entry for the input as a whole and then extracts
//! durable facts sentence by sentence. Extraction rules are deterministic
//! (no model calls):
//!
//! 1. A sentence with boundary language becomes a `boundary` fact: an
//!    imperative "don't" or "never", "please don't", a negated
//!    intrusive verb ("don't call", "never bring up"), "not comfortable"
//!    or "hate it when". Plain negation ("I don't know") is not a boundary.
//! 2. Otherwise a sentence naming a life event (anniversary, birthday,
//!    promotion, …) becomes a `milestone` fact.
//! 3. Otherwise "I love / like / prefer …" becomes a `preference` fact.
//! 4. Otherwise habitual language ("always", "every time", "usually")
//!    becomes a `pattern` fact.
//!
//! Each fact is tagged with the need families detected in it.

use super::entry::{
    EmotionalTone, Importance, InteractionSource, MemoryDetails, MemoryDraft, MemoryEntry,
    MemoryEntryBuilder, RelationshipType,
};
use super::store::MemoryStore;
use crate::error::{Error, Result};
use crate::quality::{MarkerSet, Markers};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const POSITIVE_WORDS: &[&str] = &[
    "happy", "grateful", "thankful", "love", "loved", "great", "wonderful",
    "appreciated", "fun", "excited", "glad", "enjoyed", "proud",
];

const NEGATIVE_WORDS: &[&str] = &[
    "angry", "frustrated", "sad", "disappointed", "hurt", "upset", "annoyed",
    "stressed", "exhausted", "lonely", "argued", "fight", "ignored",
];

const BOUNDARY_PATTERN: &str = concat!(
    r"(?i)(?:",
    r"^\s*(?:please\s+)?(?:don['’]t|do\s+not|never)\b",
    r"|\bplease\s+(?:don['’]t|do\s+not|never)\b",
    r"|\b(?:don['’]t|do\s+not|never)\s+(?:ever\s+)?",
    r"(?:call|text|message|bring\s+up|mention|touch|tease|joke\s+about|surprise|",
    r"schedule|comment\s+on|talk\s+about|show\s+up|ask\s+about|post|raise)\b",
    r"|\b(?:don['’]t|do\s+not)\s+like\s+it\s+when\b",
    r"|\b(?:not|never)\s+comfortable\b",
    r"|\buncomfortable\s+when\b",
    r"|\bhate\s+it\s+when\b",
    r")"
);
const STRICT_BOUNDARY_PATTERN: &str = r"(?i)\bnever\b";
const MILESTONE_PATTERN: &str = r"(?i)\b(?:anniversary|birthday|engaged|engagement|promotion|promoted|moved\s+in|wedding|graduat\w*)\b";
const PREFERENCE_PATTERN: &str =
    r"(?i)\b(?:i|we|they|she|he)\s+(?:really\s+)?(?:love|like|prefer|enjoy|appreciate)s?\b\s*(.*)";
const PATTERN_PATTERN: &str = r"(?i)\b(?:always|every\s+time|usually|keeps|tends?\s+to|whenever)\b";
const TRIGGER_PATTERN: &str = r"(?i)\b(?:every\s+time|whenever|when)\s+(.+)";
const DATE_PATTERN: &str = r"\b(\d{4}-\d{2}-\d{2})\b";

/// Inbound private input for one relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeInput {
    pub owner_user_id: String,
    pub relationship_id: String,
    pub relationship_type: RelationshipType,
    /// Raw private text (journal entry, check-in answer, …)
    pub text: String,
    pub source: InteractionSource,
}

/// Rule-based extractor that turns private text into memory drafts.
#[derive(Debug, Clone)]
pub struct FactExtractor {
    boundary: Regex,
    strict_boundary: Regex,
    milestone: Regex,
    preference: Regex,
    pattern: Regex,
    trigger: Regex,
    date: Regex,
    positive: MarkerSet,
    negative: MarkerSet,
    markers: Markers,
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Memory(format!("Invalid {} rule: {}", name, e)))
}

impl FactExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            boundary: compile("boundary", BOUNDARY_PATTERN)?,
            strict_boundary: compile("strict boundary", STRICT_BOUNDARY_PATTERN)?,
            milestone: compile("milestone", MILESTONE_PATTERN)?,
            preference: compile("preference", PREFERENCE_PATTERN)?,
            pattern: compile("pattern", PATTERN_PATTERN)?,
            trigger: compile("trigger", TRIGGER_PATTERN)?,
            date: compile("date", DATE_PATTERN)?,
            positive: MarkerSet::words("positive", POSITIVE_WORDS)?,
            negative: MarkerSet::words("negative", NEGATIVE_WORDS)?,
            markers: Markers::compile()?,
        })
    }

    /// Emotional tone of a piece of text.
    pub fn tone(&self, text: &str) -> EmotionalTone {
        match (self.positive.any(text), self.negative.any(text)) {
            (true, true) => EmotionalTone::Mixed,
            (true, false) => EmotionalTone::Positive,
            (false, true) => EmotionalTone::Negative,
            (false, false) => EmotionalTone::Neutral,
        }
    }

    /// Classify one sentence into a fact payload, if it states one.
    pub fn classify(&self, sentence: &str) -> Option<MemoryDetails> {
        if self.boundary.is_match(sentence) {
            return Some(MemoryDetails::Boundary {
                strict: self.strict_boundary.is_match(sentence),
            });
        }
        if self.milestone.is_match(sentence) {
            let occurred_on = self
                .date
                .captures(sentence)
                .and_then(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok());
            return Some(MemoryDetails::Milestone { occurred_on });
        }
        if let Some(caps) = self.preference.captures(sentence) {
            let subject = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
            return Some(MemoryDetails::Preference { subject });
        }
        if self.pattern.is_match(sentence) {
            let trigger = self
                .trigger
                .captures(sentence)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty());
            return Some(MemoryDetails::Pattern { trigger });
        }
        None
    }

    /// Extract drafts from an input: one interaction plus one draft per
    /// fact-bearing sentence.
    pub fn extract(
        &self,
        input: &IntakeInput,
        interaction_ttl_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MemoryDraft>> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(Error::Memory("intake text is empty".to_string()));
        }

        let tone = self.tone(text);
        let importance = match tone {
            EmotionalTone::Negative => Importance::Medium,
            _ => Importance::Low,
        };
        let mut interaction = MemoryEntryBuilder::interaction(input.source)
            .owner_user_id(&input.owner_user_id)
            .relationship(&input.relationship_id, input.relationship_type)
            .content(text)
            .importance(importance)
            .emotional_tone(tone)
            .tags(self.need_tags(text));
        if let Some(days) = interaction_ttl_days {
            interaction = interaction.expires_at(now + Duration::days(i64::from(days)));
        }

        let mut drafts = vec![interaction.build()?];

        for sentence in text.split(['.', '!', '?', '\n']).map(str::trim) {
            if sentence.is_empty() {
                continue;
            }
            let Some(details) = self.classify(sentence) else {
                continue;
            };
            // Only strict boundaries are protected from the kind cap
            let importance = match details {
                MemoryDetails::Boundary { strict: true } | MemoryDetails::Milestone { .. } => {
                    Importance::High
                }
                _ => Importance::Medium,
            };
            let draft = MemoryEntryBuilder::new(details)
                .owner_user_id(&input.owner_user_id)
                .relationship(&input.relationship_id, input.relationship_type)
                .content(sentence)
                .importance(importance)
                .emotional_tone(self.tone(sentence))
                .tags(self.need_tags(sentence))
                .build()?;
            drafts.push(draft);
        }

        Ok(drafts)
    }

    fn need_tags(&self, text: &str) -> Vec<String> {
        self.markers
            .need_families(text)
            .into_iter()
            .map(|f| f.as_tag().to_string())
            .collect()
    }
}

/// Inbound boundary: extracts facts from private text and stores them.
pub struct MemoryIntake {
    extractor: FactExtractor,
    store: Arc<MemoryStore>,
}

impl MemoryIntake {
    pub fn new(store: Arc<MemoryStore>) -> Result<Self> {
        Ok(Self {
            extractor: FactExtractor::new()?,
            store,
        })
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Extract and store facts from one input, returning the stored entries.
    pub async fn ingest(&self, input: &IntakeInput) -> Result<Vec<MemoryEntry>> {
        self.ingest_at(input, Utc::now()).await
    }

    pub async fn ingest_at(
        &self,
        input: &IntakeInput,
        now: DateTime<Utc>,
    ) -> Result<Vec<MemoryEntry>> {
        let ttl = self.store.config().interaction_ttl_days;
        let drafts = self.extractor.extract(input, ttl, now)?;

        let mut stored = Vec::with_capacity(drafts.len());
        for draft in drafts {
            stored.push(self.store.store_at(draft, now).await);
        }

        tracing::info!(
            relationship_id = %input.relationship_id,
            entries = stored.len(),
            "Ingested private input"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContextConfig, MemoryConfig};
    use crate::context::ContextAssembler;
    use crate::memory::{MemoryKind, MemoryQuery};

    fn input(text: &str) -> IntakeInput {
        IntakeInput {
            owner_user_id: "user-1".to_string(),
            relationship_id: "rel-a".to_string(),
            relationship_type: RelationshipType::Romantic,
            text: text.to_string(),
            source: InteractionSource::Journal,
        }
    }

    fn extractor() -> FactExtractor {
        FactExtractor::new().unwrap()
    }

    #[test]
    fn test_classify_priority() {
        let e = extractor();
        assert_eq!(
            e.classify("I don't like it when plans change last minute"),
            Some(MemoryDetails::Boundary { strict: false })
        );
        assert_eq!(
            e.classify("Never bring up my ex at dinner"),
            Some(MemoryDetails::Boundary { strict: true })
        );
        assert_eq!(
            e.classify("Our anniversary is on 2024-06-14"),
            Some(MemoryDetails::Milestone {
                occurred_on: NaiveDate::from_ymd_opt(2024, 6, 14)
            })
        );
        assert_eq!(
            e.classify("She loves handwritten notes"),
            Some(MemoryDetails::Preference {
                subject: Some("handwritten notes".to_string())
            })
        );
        assert_eq!(
            e.classify("He always goes quiet when work piles up"),
            Some(MemoryDetails::Pattern {
                trigger: Some("work piles up".to_string())
            })
        );
        assert_eq!(e.classify("The weather was fine"), None);
    }

    #[test]
    fn test_tone() {
        let e = extractor();
        assert_eq!(e.tone("I was so happy today"), EmotionalTone::Positive);
        assert_eq!(e.tone("I felt ignored and upset"), EmotionalTone::Negative);
        assert_eq!(e.tone("Happy but exhausted"), EmotionalTone::Mixed);
        assert_eq!(e.tone("We had pasta"), EmotionalTone::Neutral);
    }

    #[test]
    fn test_extract_always_records_interaction() {
        let e = extractor();
        let drafts = e.extract(&input("We had pasta"), None, Utc::now()).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind(), MemoryKind::Interaction);
        assert_eq!(drafts[0].importance, Importance::Low);
        assert!(drafts[0].expires_at.is_none());
    }

    #[test]
    fn test_extract_facts_and_tags() {
        let e = extractor();
        let text = "I've been exhausted from work. I love it when we cook together! Please don't call me during meetings.";
        let drafts = e.extract(&input(text), Some(30), Utc::now()).unwrap();

        let kinds: Vec<MemoryKind> = drafts.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![MemoryKind::Interaction, MemoryKind::Preference, MemoryKind::Boundary]
        );

        let interaction = &drafts[0];
        assert_eq!(interaction.emotional_tone, EmotionalTone::Mixed);
        assert!(interaction.tags.contains("stress"));
        assert!(interaction.tags.contains("connection"));
        assert!(interaction.expires_at.is_some());

        assert_eq!(drafts[1].importance, Importance::Medium);
        assert!(drafts[1].tags.contains("connection"));
        assert!(drafts[1].expires_at.is_none());
        assert_eq!(drafts[2].importance, Importance::Medium);
    }

    #[test]
    fn test_plain_negation_is_not_a_boundary() {
        let e = extractor();
        assert_eq!(e.classify("I don't know what to do"), None);
        assert_eq!(e.classify("We never found the time"), None);
        assert_eq!(e.classify("He doesn't eat breakfast"), None);
        assert_eq!(
            e.classify("Please do not text me after ten"),
            Some(MemoryDetails::Boundary { strict: false })
        );
        assert_eq!(
            e.classify("I'm not comfortable with surprise visits"),
            Some(MemoryDetails::Boundary { strict: false })
        );
        assert_eq!(
            e.classify("She asked me to never mention the layoffs"),
            Some(MemoryDetails::Boundary { strict: true })
        );
    }

    #[test]
    fn test_strict_boundary_is_high() {
        let e = extractor();
        let drafts = e
            .extract(&input("Never joke about my weight."), None, Utc::now())
            .unwrap();
        assert_eq!(drafts[1].kind(), MemoryKind::Boundary);
        assert_eq!(drafts[1].importance, Importance::High);
    }

    #[tokio::test]
    async fn test_negated_chatter_leaves_room_in_context() {
        let store = Arc::new(MemoryStore::new(MemoryConfig::default()));
        let intake = MemoryIntake::new(store.clone()).unwrap();
        let t0 = Utc::now() - Duration::hours(1);

        for i in 0..16 {
            let text = format!("We had dinner {}. I don't know what to think {}.", i, i);
            intake
                .ingest_at(&input(&text), t0 + Duration::seconds(i))
                .await
                .unwrap();
        }
        for i in 0..8 {
            let text = format!("Please don't call me during meeting {}.", i);
            intake
                .ingest_at(&input(&text), t0 + Duration::seconds(100 + i))
                .await
                .unwrap();
        }

        let context = store.relationship_context("rel-a").await.unwrap();
        assert_eq!(context.buffer(MemoryKind::Boundary).len(), 5);
        assert_eq!(context.buffer(MemoryKind::Interaction).len(), 10);

        let assembler = ContextAssembler::new(store.clone(), ContextConfig::default());
        let bundle = assembler
            .assemble("rel-a", RelationshipType::Romantic, "Suggest one caring action.")
            .await;
        assert!(bundle.contains("Boundaries (always respect):"));
        assert!(bundle.contains("Recent interactions:"));
    }

    #[test]
    fn test_negative_interaction_is_medium() {
        let e = extractor();
        let drafts = e
            .extract(&input("We argued about money"), None, Utc::now())
            .unwrap();
        assert_eq!(drafts[0].importance, Importance::Medium);
        assert_eq!(drafts[0].emotional_tone, EmotionalTone::Negative);
    }

    #[test]
    fn test_empty_text_rejected() {
        let e = extractor();
        let err = e.extract(&input("   "), None, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Memory(_)));
    }

    #[tokio::test]
    async fn test_ingest_stores_entries() {
        let store = Arc::new(MemoryStore::new(MemoryConfig::default()));
        let intake = MemoryIntake::new(store.clone()).unwrap();

        let stored = intake
            .ingest(&input("Her birthday is next week. She prefers quiet evenings."))
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);

        let found = store.retrieve(&MemoryQuery::for_relationship("rel-a")).await;
        assert_eq!(found.len(), 3);
        // milestone is high importance, so it sorts first
        assert_eq!(found[0].kind, MemoryKind::Milestone);
    }
}
