//! Relationship memory: partitioned, typed fact storage
//!
//! Facts are partitioned by `relationship_id`. Each relationship keeps a
//! bounded per-kind context whose eviction never drops high or critical
//! facts; only explicit expiry removes those.

pub mod bounded;
pub mod entry;
pub mod intake;
pub mod query;
pub mod relationship;
pub mod store;

pub use bounded::{Erasable, KindBuffer};
pub use entry::{
    EmotionalTone, Importance, InteractionSource, MemoryDetails, MemoryDraft, MemoryEntry,
    MemoryEntryBuilder, MemoryKind, RelationshipType,
};
pub use intake::{FactExtractor, IntakeInput, MemoryIntake};
pub use query::MemoryQuery;
pub use relationship::RelationshipContext;
pub use store::{spawn_cleanup_task, CleanupReport, MemoryStats, MemoryStore};
