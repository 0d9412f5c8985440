//! Retrieval filters for the memory store

use super::entry::{Importance, MemoryEntry, MemoryKind, RelationshipType};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Optional filters applied by `MemoryStore::retrieve`.
///
/// Every filter that is set must match. An empty query matches everything.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    pub relationship_id: Option<String>,
    pub relationship_type: Option<RelationshipType>,
    pub kinds: Option<HashSet<MemoryKind>>,
    /// Matches entries sharing at least one tag
    pub tags: Option<HashSet<String>>,
    /// Inclusive start of the creation window
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive end of the creation window
    pub created_before: Option<DateTime<Utc>>,
    pub importance: Option<HashSet<Importance>>,
    pub limit: Option<usize>,
}

impl MemoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query scoped to one relationship
    pub fn for_relationship(relationship_id: impl Into<String>) -> Self {
        Self::new().relationship_id(relationship_id)
    }

    pub fn relationship_id(mut self, relationship_id: impl Into<String>) -> Self {
        self.relationship_id = Some(relationship_id.into());
        self
    }

    pub fn relationship_type(mut self, relationship_type: RelationshipType) -> Self {
        self.relationship_type = Some(relationship_type);
        self
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = MemoryKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn created_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.created_after = Some(start);
        self.created_before = Some(end);
        self
    }

    pub fn importance(mut self, levels: impl IntoIterator<Item = Importance>) -> Self {
        self.importance = Some(levels.into_iter().collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether an entry passes every filter of this query.
    pub fn matches(&self, entry: &MemoryEntry) -> bool {
        if let Some(ref id) = self.relationship_id {
            if entry.relationship_id != *id {
                return false;
            }
        }
        if let Some(rt) = self.relationship_type {
            if entry.relationship_type != rt {
                return false;
            }
        }
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&entry.kind) {
                return false;
            }
        }
        if let Some(ref tags) = self.tags {
            if !entry.tags.iter().any(|t| tags.contains(t)) {
                return false;
            }
        }
        if let Some(start) = self.created_after {
            if entry.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.created_before {
            if entry.created_at > end {
                return false;
            }
        }
        if let Some(ref levels) = self.importance {
            if !levels.contains(&entry.importance) {
                return false;
            }
        }
        true
    }
}
