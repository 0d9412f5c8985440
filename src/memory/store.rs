//! Partitioned in-memory store for relationship facts
//!
//! Entries are partitioned by `relationship_id`. Each partition sits behind
//! its own `tokio::sync::Mutex`, so writes to one relationship are
//! serialized while other relationships proceed in parallel. The partition
//! map itself is only locked long enough to look up or insert a partition.
//!
//! `cleanup` snapshots the partition list and then locks one partition at a
//! time, so concurrent `store` calls on other relationships are never
//! blocked for the duration of a sweep.
//!
//! Partitions left empty by `cleanup` or `forget_relationship` are dropped
//! from the map. A dropped partition is marked retired under its own lock;
//! a writer that raced the removal sees the mark and re-resolves the
//! relationship. The map lock is always taken before a partition lock.

use super::bounded::Erasable;
use super::entry::{Importance, MemoryDraft, MemoryEntry, RelationshipType};
use super::query::MemoryQuery;
use super::relationship::RelationshipContext;
use crate::config::MemoryConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A stored entry plus its store-wide insertion sequence number.
#[derive(Debug)]
struct Stored {
    seq: u64,
    entry: MemoryEntry,
}

/// All state for one relationship.
#[derive(Debug)]
struct Partition {
    entries: HashMap<Uuid, Stored>,
    context: RelationshipContext,
    retired: bool,
}

impl Partition {
    /// Remove an entry from both the entry set and the context lists,
    /// erasing it.
    fn remove(&mut self, id: &Uuid) -> bool {
        match self.entries.remove(id) {
            Some(mut stored) => {
                self.context.forget(stored.entry.kind, id);
                stored.entry.erase();
                true
            }
            None => false,
        }
    }

    fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<Uuid> = self
            .entries
            .values()
            .filter(|s| s.entry.is_expired(now))
            .map(|s| s.entry.id)
            .collect();
        for id in &expired {
            self.remove(id);
        }
        expired.len()
    }

    /// Bring every relationship+type group down to `limit` entries by
    /// dropping its oldest low/medium entries. High and critical entries
    /// are left alone even if the group stays over the limit.
    fn prune(&mut self, limit: usize) -> usize {
        let mut groups: HashMap<RelationshipType, Vec<(DateTime<Utc>, u64, Uuid, Importance)>> =
            HashMap::new();
        for stored in self.entries.values() {
            let e = &stored.entry;
            groups
                .entry(e.relationship_type)
                .or_default()
                .push((e.created_at, stored.seq, e.id, e.importance));
        }

        let mut pruned = 0;
        for (_, mut group) in groups {
            if group.len() <= limit {
                continue;
            }
            let excess = group.len() - limit;
            group.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
            let victims: Vec<Uuid> = group
                .iter()
                .filter(|(_, _, _, importance)| !importance.is_protected())
                .take(excess)
                .map(|(_, _, id, _)| *id)
                .collect();
            for id in &victims {
                self.remove(id);
            }
            pruned += victims.len();
        }
        pruned
    }
}

/// Outcome of one cleanup sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Entries removed because their expiry passed
    pub expired: usize,
    /// Low/medium entries removed to respect the partition limit
    pub pruned: usize,
}

impl CleanupReport {
    pub fn removed(&self) -> usize {
        self.expired + self.pruned
    }
}

/// Store-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub relationships: usize,
    pub entries: usize,
}

/// Process-wide memory store, shared via `Arc`.
pub struct MemoryStore {
    partitions: RwLock<HashMap<String, Arc<Mutex<Partition>>>>,
    next_seq: AtomicU64,
    config: MemoryConfig,
}

impl MemoryStore {
    /// Create an empty store with the given configuration
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    async fn partition(&self, relationship_id: &str) -> Option<Arc<Mutex<Partition>>> {
        self.partitions.read().await.get(relationship_id).cloned()
    }

    async fn partition_or_create(
        &self,
        relationship_id: &str,
        relationship_type: RelationshipType,
        now: DateTime<Utc>,
    ) -> Arc<Mutex<Partition>> {
        if let Some(partition) = self.partition(relationship_id).await {
            return partition;
        }
        let mut map = self.partitions.write().await;
        map.entry(relationship_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Partition {
                    entries: HashMap::new(),
                    context: RelationshipContext::new(
                        relationship_id,
                        relationship_type,
                        &self.config.caps,
                        now,
                    ),
                    retired: false,
                }))
            })
            .clone()
    }

    /// Partitions relevant to a query, sorted by relationship ID.
    async fn partitions_for(&self, query: &MemoryQuery) -> Vec<Arc<Mutex<Partition>>> {
        let map = self.partitions.read().await;
        match query.relationship_id {
            Some(ref id) => map.get(id).cloned().into_iter().collect(),
            None => {
                let mut all: Vec<(&String, &Arc<Mutex<Partition>>)> = map.iter().collect();
                all.sort_by(|a, b| a.0.cmp(b.0));
                all.into_iter().map(|(_, p)| p.clone()).collect()
            }
        }
    }

    /// Store a drafted fact, returning the stored entry.
    pub async fn store(&self, draft: MemoryDraft) -> MemoryEntry {
        self.store_at(draft, Utc::now()).await
    }

    /// Store a drafted fact with an explicit creation time.
    pub async fn store_at(&self, draft: MemoryDraft, now: DateTime<Utc>) -> MemoryEntry {
        let mut partition = loop {
            let partition = self
                .partition_or_create(&draft.relationship_id, draft.relationship_type, now)
                .await;
            let guard = partition.lock_owned().await;
            if !guard.retired {
                break guard;
            }
        };

        let entry = MemoryEntry::from_draft(draft, now);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        if let Some(evicted) = partition.context.record(&entry, now) {
            partition.remove(&evicted);
            tracing::debug!(
                relationship_id = %entry.relationship_id,
                kind = %entry.kind,
                "Evicted oldest memory entry over kind cap"
            );
        } else if partition.context.buffer(entry.kind).is_over_capacity() {
            tracing::debug!(
                relationship_id = %entry.relationship_id,
                kind = %entry.kind,
                "Kind list over cap; all older entries are high/critical"
            );
        }

        partition.entries.insert(
            entry.id,
            Stored {
                seq,
                entry: entry.clone(),
            },
        );
        entry
    }

    /// Retrieve entries matching a query.
    ///
    /// Results are ordered by importance (critical first), then by creation
    /// time, newest first. Every returned entry has its reference count
    /// incremented and `last_referenced_at` set, once per call.
    pub async fn retrieve(&self, query: &MemoryQuery) -> Vec<MemoryEntry> {
        self.retrieve_at(query, Utc::now()).await
    }

    /// Retrieve with an explicit reference timestamp.
    pub async fn retrieve_at(&self, query: &MemoryQuery, now: DateTime<Utc>) -> Vec<MemoryEntry> {
        let partitions = self.partitions_for(query).await;

        // Partitions are locked in relationship ID order and held until the
        // reference counts are updated.
        let mut guards = Vec::with_capacity(partitions.len());
        for partition in &partitions {
            guards.push(partition.lock().await);
        }

        let mut hits: Vec<(usize, Importance, DateTime<Utc>, u64, Uuid)> = Vec::new();
        for (index, guard) in guards.iter().enumerate() {
            for stored in guard.entries.values() {
                if query.matches(&stored.entry) {
                    let e = &stored.entry;
                    hits.push((index, e.importance, e.created_at, stored.seq, e.id));
                }
            }
        }

        hits.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(b.3.cmp(&a.3)));
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }

        let mut results = Vec::with_capacity(hits.len());
        for (index, _, _, _, id) in hits {
            if let Some(stored) = guards[index].entries.get_mut(&id) {
                stored.entry.record_reference(now);
                results.push(stored.entry.clone());
            }
        }
        results
    }

    /// Remove expired entries and prune oversized partitions.
    pub async fn cleanup(&self) -> CleanupReport {
        self.cleanup_at(Utc::now()).await
    }

    /// Cleanup against an explicit clock.
    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> CleanupReport {
        let partitions: Vec<(String, Arc<Mutex<Partition>>)> = self
            .partitions
            .read()
            .await
            .iter()
            .map(|(id, p)| (id.clone(), p.clone()))
            .collect();

        let mut report = CleanupReport::default();
        let mut emptied = Vec::new();
        for (relationship_id, partition) in partitions {
            let mut partition = partition.lock().await;
            let expired = partition.remove_expired(now);
            let pruned = partition.prune(self.config.partition_limit);
            if expired + pruned > 0 {
                tracing::debug!(
                    relationship_id = %relationship_id,
                    expired,
                    pruned,
                    "Cleaned relationship memory"
                );
            }
            report.expired += expired;
            report.pruned += pruned;
            if partition.entries.is_empty() {
                emptied.push(relationship_id);
            }
        }

        if !emptied.is_empty() {
            let mut map = self.partitions.write().await;
            for relationship_id in &emptied {
                let Some(partition) = map.get(relationship_id).cloned() else {
                    continue;
                };
                let mut partition = partition.lock().await;
                // A store may have landed since the sweep
                if partition.entries.is_empty() {
                    partition.retired = true;
                    map.remove(relationship_id);
                }
            }
        }

        if report.removed() > 0 {
            tracing::info!(
                expired = report.expired,
                pruned = report.pruned,
                "Memory cleanup removed {} entries",
                report.removed()
            );
        }
        report
    }

    /// Erase every entry of one relationship. Returns the number removed.
    pub async fn forget_relationship(&self, relationship_id: &str) -> usize {
        let mut map = self.partitions.write().await;
        let Some(partition) = map.get(relationship_id).cloned() else {
            return 0;
        };
        let mut partition = partition.lock().await;
        let removed = partition.entries.len();
        for (_, mut stored) in partition.entries.drain() {
            stored.entry.erase();
        }
        partition.context.clear(Utc::now());
        partition.retired = true;
        map.remove(relationship_id);
        tracing::info!(relationship_id = %relationship_id, removed, "Forgot relationship memory");
        removed
    }

    /// Snapshot of one relationship's bounded per-kind context.
    pub async fn relationship_context(&self, relationship_id: &str) -> Option<RelationshipContext> {
        let partition = self.partition(relationship_id).await?;
        let partition = partition.lock().await;
        Some(partition.context.clone())
    }

    /// Store-wide counters.
    pub async fn stats(&self) -> MemoryStats {
        let partitions: Vec<Arc<Mutex<Partition>>> =
            self.partitions.read().await.values().cloned().collect();
        let mut stats = MemoryStats::default();
        for partition in partitions {
            let partition = partition.lock().await;
            if !partition.entries.is_empty() {
                stats.relationships += 1;
            }
            stats.entries += partition.entries.len();
        }
        stats
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

/// Spawn a background task that periodically runs `cleanup`.
///
/// Returns `None` when automatic cleanup is disabled. Abort the returned
/// handle on teardown.
pub fn spawn_cleanup_task(store: Arc<MemoryStore>) -> Option<JoinHandle<()>> {
    if !store.config().auto_cleanup {
        tracing::debug!("Memory auto-cleanup disabled, skipping background task");
        return None;
    }

    let interval = Duration::from_secs(store.config().cleanup_interval_secs.max(1));
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            store.cleanup().await;
        }
    }))
}
