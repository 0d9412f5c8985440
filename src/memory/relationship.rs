//! Per-relationship context aggregate
//!
//! A `RelationshipContext` is derived state: the bounded lists of the most
//! recent entry IDs of each kind for one relationship. It is updated
//! incrementally every time an entry is stored for the relationship and is
//! never persisted on its own.

use super::bounded::KindBuffer;
use super::entry::{MemoryEntry, MemoryKind, RelationshipType};
use crate::config::KindCaps;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bounded per-kind view of one relationship's memory.
#[derive(Debug, Clone)]
pub struct RelationshipContext {
    pub relationship_id: String,
    pub relationship_type: RelationshipType,
    interactions: KindBuffer,
    patterns: KindBuffer,
    preferences: KindBuffer,
    boundaries: KindBuffer,
    milestones: KindBuffer,
    pub last_updated: DateTime<Utc>,
}

impl RelationshipContext {
    /// Create an empty context using the configured caps.
    pub fn new(
        relationship_id: impl Into<String>,
        relationship_type: RelationshipType,
        caps: &KindCaps,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            relationship_id: relationship_id.into(),
            relationship_type,
            interactions: KindBuffer::new(caps.cap_for(MemoryKind::Interaction)),
            patterns: KindBuffer::new(caps.cap_for(MemoryKind::Pattern)),
            preferences: KindBuffer::new(caps.cap_for(MemoryKind::Preference)),
            boundaries: KindBuffer::new(caps.cap_for(MemoryKind::Boundary)),
            milestones: KindBuffer::new(caps.cap_for(MemoryKind::Milestone)),
            last_updated: now,
        }
    }

    /// The buffer holding entries of one kind.
    pub fn buffer(&self, kind: MemoryKind) -> &KindBuffer {
        match kind {
            MemoryKind::Interaction => &self.interactions,
            MemoryKind::Pattern => &self.patterns,
            MemoryKind::Preference => &self.preferences,
            MemoryKind::Boundary => &self.boundaries,
            MemoryKind::Milestone => &self.milestones,
        }
    }

    fn buffer_mut(&mut self, kind: MemoryKind) -> &mut KindBuffer {
        match kind {
            MemoryKind::Interaction => &mut self.interactions,
            MemoryKind::Pattern => &mut self.patterns,
            MemoryKind::Preference => &mut self.preferences,
            MemoryKind::Boundary => &mut self.boundaries,
            MemoryKind::Milestone => &mut self.milestones,
        }
    }

    /// Record a newly stored entry. Returns the ID evicted to respect the
    /// kind's cap, if any.
    pub fn record(&mut self, entry: &MemoryEntry, now: DateTime<Utc>) -> Option<Uuid> {
        self.last_updated = now;
        self.buffer_mut(entry.kind).push(entry.id, entry.importance)
    }

    /// Drop an entry from its kind list.
    pub fn forget(&mut self, kind: MemoryKind, id: &Uuid) -> bool {
        self.buffer_mut(kind).remove(id)
    }

    /// Drop every entry, keeping caps and identity.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        for kind in MemoryKind::ALL {
            let cap = self.buffer(kind).cap();
            *self.buffer_mut(kind) = KindBuffer::new(cap);
        }
        self.last_updated = now;
    }

    /// Total number of entries across all kinds.
    pub fn len(&self) -> usize {
        MemoryKind::ALL.iter().map(|k| self.buffer(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::entry::{Importance, MemoryDetails, MemoryEntryBuilder};

    fn entry(details: MemoryDetails, importance: Importance) -> MemoryEntry {
        let draft = MemoryEntryBuilder::new(details)
            .owner_user_id("user-1")
            .relationship("rel-1", RelationshipType::Family)
            .content("fact")
            .importance(importance)
            .build()
            .unwrap();
        MemoryEntry::from_draft(draft, Utc::now())
    }

    #[test]
    fn test_record_routes_by_kind() {
        let now = Utc::now();
        let mut ctx = RelationshipContext::new("rel-1", RelationshipType::Family, &KindCaps::default(), now);

        let boundary = entry(MemoryDetails::Boundary { strict: false }, Importance::High);
        let pattern = entry(MemoryDetails::Pattern { trigger: None }, Importance::Medium);
        ctx.record(&boundary, now);
        ctx.record(&pattern, now);

        assert!(ctx.buffer(MemoryKind::Boundary).contains(&boundary.id));
        assert!(ctx.buffer(MemoryKind::Pattern).contains(&pattern.id));
        assert!(ctx.buffer(MemoryKind::Interaction).is_empty());
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_pattern_cap_evicts() {
        let now = Utc::now();
        let mut ctx = RelationshipContext::new("rel-1", RelationshipType::Family, &KindCaps::default(), now);

        let first = entry(MemoryDetails::Pattern { trigger: None }, Importance::Low);
        assert!(ctx.record(&first, now).is_none());
        for _ in 0..4 {
            ctx.record(&entry(MemoryDetails::Pattern { trigger: None }, Importance::Low), now);
        }
        let evicted = ctx.record(&entry(MemoryDetails::Pattern { trigger: None }, Importance::Low), now);

        assert_eq!(evicted, Some(first.id));
        assert_eq!(ctx.buffer(MemoryKind::Pattern).len(), 5);
    }

    #[test]
    fn test_milestones_unbounded() {
        let now = Utc::now();
        let mut ctx = RelationshipContext::new("rel-1", RelationshipType::Family, &KindCaps::default(), now);
        for _ in 0..20 {
            let e = entry(MemoryDetails::Milestone { occurred_on: None }, Importance::Low);
            assert!(ctx.record(&e, now).is_none());
        }
        assert_eq!(ctx.buffer(MemoryKind::Milestone).len(), 20);
    }

    #[test]
    fn test_clear_keeps_caps() {
        let now = Utc::now();
        let mut ctx = RelationshipContext::new("rel-1", RelationshipType::Family, &KindCaps::default(), now);
        ctx.record(&entry(MemoryDetails::Boundary { strict: true }, Importance::High), now);
        ctx.clear(now);
        assert!(ctx.is_empty());
        assert_eq!(ctx.buffer(MemoryKind::Boundary).cap(), Some(5));
    }
}
