//! Memory entry data types
//!
//! A `MemoryEntry` is a single durable fact about one relationship. Entries
//! are immutable once stored, apart from the reference bookkeeping updated by
//! `MemoryStore::retrieve`. The `relationship_id` is the partition key that
//! isolates one relationship's facts from every other relationship.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use zeroize::Zeroize;

/// Type of a tracked relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Romantic,
    Work,
    Family,
    Friend,
    Other,
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipType::Romantic => write!(f, "romantic"),
            RelationshipType::Work => write!(f, "work"),
            RelationshipType::Family => write!(f, "family"),
            RelationshipType::Friend => write!(f, "friend"),
            RelationshipType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "romantic" => Ok(RelationshipType::Romantic),
            "work" => Ok(RelationshipType::Work),
            "family" => Ok(RelationshipType::Family),
            "friend" => Ok(RelationshipType::Friend),
            "other" => Ok(RelationshipType::Other),
            other => Err(Error::Memory(format!("unknown relationship type: {}", other))),
        }
    }
}

/// Kind of fact held by a memory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Interaction,
    Pattern,
    Preference,
    Boundary,
    Milestone,
}

impl MemoryKind {
    /// All kinds, in declaration order.
    pub const ALL: [MemoryKind; 5] = [
        MemoryKind::Interaction,
        MemoryKind::Pattern,
        MemoryKind::Preference,
        MemoryKind::Boundary,
        MemoryKind::Milestone,
    ];
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryKind::Interaction => write!(f, "interaction"),
            MemoryKind::Pattern => write!(f, "pattern"),
            MemoryKind::Preference => write!(f, "preference"),
            MemoryKind::Boundary => write!(f, "boundary"),
            MemoryKind::Milestone => write!(f, "milestone"),
        }
    }
}

/// Importance of a fact. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

impl Importance {
    /// High and critical facts are never evicted by capacity pressure.
    pub fn is_protected(self) -> bool {
        matches!(self, Importance::High | Importance::Critical)
    }
}

/// Emotional tone of a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

/// Where an interaction fact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSource {
    Journal,
    CheckIn,
    Conversation,
    Other,
}

/// Structured per-kind payload of a memory entry.
///
/// The variant determines the entry's `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryDetails {
    Interaction {
        source: InteractionSource,
    },
    Pattern {
        /// What tends to set the pattern off, if known
        trigger: Option<String>,
    },
    Preference {
        /// What the preference is about, if known
        subject: Option<String>,
    },
    Boundary {
        /// A strict boundary must never be crossed by a suggestion
        strict: bool,
    },
    Milestone {
        occurred_on: Option<NaiveDate>,
    },
}

impl MemoryDetails {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> MemoryKind {
        match self {
            MemoryDetails::Interaction { .. } => MemoryKind::Interaction,
            MemoryDetails::Pattern { .. } => MemoryKind::Pattern,
            MemoryDetails::Preference { .. } => MemoryKind::Preference,
            MemoryDetails::Boundary { .. } => MemoryKind::Boundary,
            MemoryDetails::Milestone { .. } => MemoryKind::Milestone,
        }
    }
}

impl Zeroize for MemoryDetails {
    fn zeroize(&mut self) {
        match self {
            MemoryDetails::Pattern { trigger: Some(t) } => t.zeroize(),
            MemoryDetails::Preference { subject: Some(s) } => s.zeroize(),
            _ => {}
        }
    }
}

/// A stored fact about one relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// User who owns this fact
    pub owner_user_id: String,
    /// Relationship this fact belongs to (partition key)
    pub relationship_id: String,
    /// Type of the relationship
    pub relationship_type: RelationshipType,
    /// Kind of fact, always equal to `context.kind()`
    pub kind: MemoryKind,
    /// Free-text fact
    pub content: String,
    /// Structured per-kind payload
    pub context: MemoryDetails,
    pub importance: Importance,
    pub emotional_tone: EmotionalTone,
    /// Searchable tags
    pub tags: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last time this entry was returned by a retrieval
    pub last_referenced_at: Option<DateTime<Utc>>,
    /// Number of retrievals that returned this entry
    pub reference_count: u32,
    /// Entry is removed by cleanup once this passes
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    /// Materialize a draft into a stored entry.
    pub(crate) fn from_draft(draft: MemoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_user_id: draft.owner_user_id,
            relationship_id: draft.relationship_id,
            relationship_type: draft.relationship_type,
            kind: draft.context.kind(),
            content: draft.content,
            context: draft.context,
            importance: draft.importance,
            emotional_tone: draft.emotional_tone,
            tags: draft.tags,
            created_at: now,
            last_referenced_at: None,
            reference_count: 0,
            expires_at: draft.expires_at,
        }
    }

    /// Record a retrieval, incrementing the counter and updating the timestamp.
    pub fn record_reference(&mut self, now: DateTime<Utc>) {
        self.reference_count += 1;
        self.last_referenced_at = Some(now);
    }

    /// Whether the entry's expiry lies in the past.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at < now).unwrap_or(false)
    }
}

/// A validated, not yet stored memory entry.
#[derive(Debug, Clone)]
pub struct MemoryDraft {
    pub owner_user_id: String,
    pub relationship_id: String,
    pub relationship_type: RelationshipType,
    pub content: String,
    pub context: MemoryDetails,
    pub importance: Importance,
    pub emotional_tone: EmotionalTone,
    pub tags: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryDraft {
    pub fn kind(&self) -> MemoryKind {
        self.context.kind()
    }
}

/// Builder for constructing `MemoryDraft` instances
pub struct MemoryEntryBuilder {
    owner_user_id: Option<String>,
    relationship: Option<(String, RelationshipType)>,
    content: Option<String>,
    context: MemoryDetails,
    importance: Importance,
    emotional_tone: EmotionalTone,
    tags: BTreeSet<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntryBuilder {
    /// Create a new builder; the payload fixes the entry's kind.
    pub fn new(context: MemoryDetails) -> Self {
        Self {
            owner_user_id: None,
            relationship: None,
            content: None,
            context,
            importance: Importance::Medium,
            emotional_tone: EmotionalTone::Neutral,
            tags: BTreeSet::new(),
            expires_at: None,
        }
    }

    /// Shortcut for an interaction fact from the given source.
    pub fn interaction(source: InteractionSource) -> Self {
        Self::new(MemoryDetails::Interaction { source })
    }

    /// Set owning user ID
    pub fn owner_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.owner_user_id = Some(user_id.into());
        self
    }

    /// Set the relationship this fact belongs to
    pub fn relationship(
        mut self,
        relationship_id: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        self.relationship = Some((relationship_id.into(), relationship_type));
        self
    }

    /// Set the fact text
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn emotional_tone(mut self, tone: EmotionalTone) -> Self {
        self.emotional_tone = tone;
        self
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add tags from an iterator
    pub fn tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Set an expiry timestamp
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Build the draft, returning an error if required fields are missing
    pub fn build(self) -> Result<MemoryDraft> {
        let owner_user_id = self
            .owner_user_id
            .ok_or_else(|| Error::Memory("owner_user_id is required".to_string()))?;
        let (relationship_id, relationship_type) = self
            .relationship
            .ok_or_else(|| Error::Memory("relationship is required".to_string()))?;
        if relationship_id.trim().is_empty() {
            return Err(Error::Memory("relationship_id must not be empty".to_string()));
        }
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Memory("content is required".to_string()))?;

        Ok(MemoryDraft {
            owner_user_id,
            relationship_id,
            relationship_type,
            content,
            context: self.context,
            importance: self.importance,
            emotional_tone: self.emotional_tone,
            tags: self.tags,
            expires_at: self.expires_at,
        })
    }
}
