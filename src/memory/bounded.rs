//! Bounded per-kind buffers with importance-aware eviction
//!
//! Each relationship keeps one `KindBuffer` per memory kind, holding entry
//! IDs in insertion order (front = oldest). When a push takes the buffer
//! over its cap, the oldest entry whose importance is not protected
//! (high/critical) is evicted. If every older entry is protected the buffer
//! is allowed to grow past its cap instead of dropping a protected fact.
//! The entry just pushed is never its own eviction victim.
//!
//! Evicted entries have their sensitive fields zeroized before being dropped.

use std::collections::VecDeque;
use uuid::Uuid;
use zeroize::Zeroize;

use super::entry::{Importance, MemoryEntry};

/// Trait for types that can securely erase their sensitive fields.
pub trait Erasable {
    /// Zeroize sensitive fields before the value is dropped.
    fn erase(&mut self);
}

impl Erasable for MemoryEntry {
    fn erase(&mut self) {
        self.content.zeroize();
        self.context.zeroize();
        for mut tag in std::mem::take(&mut self.tags) {
            tag.zeroize();
        }
    }
}

/// Insertion-ordered list of entry IDs for one kind in one relationship.
#[derive(Debug, Clone)]
pub struct KindBuffer {
    /// front = oldest, back = newest
    order: VecDeque<(Uuid, Importance)>,
    cap: Option<usize>,
}

impl KindBuffer {
    /// Create a buffer with the given cap (`None` = unbounded).
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            order: VecDeque::with_capacity(cap.unwrap_or(8).min(1024)),
            cap,
        }
    }

    /// Append an entry, returning the ID evicted to make room, if any.
    pub fn push(&mut self, id: Uuid, importance: Importance) -> Option<Uuid> {
        self.order.push_back((id, importance));

        let cap = self.cap?;
        if self.order.len() <= cap {
            return None;
        }

        // Skip the entry just pushed (last position).
        let candidates = self.order.len() - 1;
        let victim = self
            .order
            .iter()
            .take(candidates)
            .position(|(_, importance)| !importance.is_protected())?;

        self.order.remove(victim).map(|(id, _)| id)
    }

    /// Remove an entry by ID. Returns whether it was present.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let before = self.order.len();
        self.order.retain(|(k, _)| k != id);
        self.order.len() != before
    }

    /// Whether an entry is held by this buffer.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.order.iter().any(|(k, _)| k == id)
    }

    /// IDs in insertion order, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.order.iter().map(|(id, _)| *id)
    }

    /// Up to `n` IDs, newest first.
    pub fn most_recent(&self, n: usize) -> Vec<Uuid> {
        self.order.iter().rev().take(n).map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    /// Whether protected entries have pushed the buffer past its cap.
    pub fn is_over_capacity(&self) -> bool {
        self.cap.map(|cap| self.order.len() > cap).unwrap_or(false)
    }
}
