//! Context bundle assembly
//!
//! Turns one relationship's stored facts into the bounded text bundle handed
//! to the suggestion generator. Sections are emitted in a fixed order
//! (preferences, boundaries, patterns, milestones, recent interactions),
//! followed by the guidance for the relationship type. Every entry is
//! re-checked against the requested `relationship_id` before rendering.

use super::guidance::guidance_for;
use crate::config::ContextConfig;
use crate::memory::{MemoryEntry, MemoryKind, MemoryQuery, MemoryStore, RelationshipType};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Human-readable age of an entry relative to `now`.
pub fn recency_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created_at);
    let hours = age.num_hours();
    let days = age.num_days();

    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if hours < 48 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{} days ago", days)
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

/// Builds relationship-scoped context bundles from the memory store.
pub struct ContextAssembler {
    store: Arc<MemoryStore>,
    config: ContextConfig,
}

impl ContextAssembler {
    pub fn new(store: Arc<MemoryStore>, config: ContextConfig) -> Self {
        Self { store, config }
    }

    /// Assemble the context bundle for one relationship.
    ///
    /// Returns `base_instruction` unchanged when the relationship has no
    /// stored facts.
    pub async fn assemble(
        &self,
        relationship_id: &str,
        relationship_type: RelationshipType,
        base_instruction: &str,
    ) -> String {
        self.assemble_at(relationship_id, relationship_type, base_instruction, Utc::now())
            .await
    }

    pub async fn assemble_at(
        &self,
        relationship_id: &str,
        relationship_type: RelationshipType,
        base_instruction: &str,
        now: DateTime<Utc>,
    ) -> String {
        let scoped = MemoryQuery::for_relationship(relationship_id).relationship_type(relationship_type);

        let mut entries = self
            .store
            .retrieve_at(
                &scoped
                    .clone()
                    .kinds([
                        MemoryKind::Interaction,
                        MemoryKind::Pattern,
                        MemoryKind::Preference,
                        MemoryKind::Boundary,
                    ])
                    .limit(self.config.max_entries),
                now,
            )
            .await;
        let mut milestones = self
            .store
            .retrieve_at(
                &scoped
                    .kinds([MemoryKind::Milestone])
                    .limit(self.config.max_milestones),
                now,
            )
            .await;

        entries.retain(|e| e.relationship_id == relationship_id);
        milestones.retain(|e| e.relationship_id == relationship_id);

        if entries.is_empty() && milestones.is_empty() {
            tracing::debug!(relationship_id, "No stored facts, using base instruction");
            return base_instruction.to_string();
        }

        let of_kind = |kind: MemoryKind| -> Vec<&MemoryEntry> {
            entries.iter().filter(|e| e.kind == kind).collect()
        };

        let mut bundle = base_instruction.to_string();
        push_section(&mut bundle, "Preferences", &of_kind(MemoryKind::Preference));
        push_section(
            &mut bundle,
            "Boundaries (always respect)",
            &of_kind(MemoryKind::Boundary),
        );
        push_section(&mut bundle, "Patterns", &of_kind(MemoryKind::Pattern));
        push_section(&mut bundle, "Milestones", &milestones.iter().collect::<Vec<_>>());

        let mut interactions = of_kind(MemoryKind::Interaction);
        interactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        interactions.truncate(self.config.max_recent_interactions);
        if !interactions.is_empty() {
            bundle.push_str("\n\nRecent interactions:");
            for entry in interactions {
                bundle.push_str(&format!(
                    "\n- [{}] {}",
                    recency_label(entry.created_at, now),
                    entry.content
                ));
            }
        }

        bundle.push_str("\n\n");
        bundle.push_str(guidance_for(relationship_type));

        tracing::debug!(
            relationship_id,
            entries = entries.len(),
            milestones = milestones.len(),
            "Assembled context bundle"
        );
        bundle
    }
}

fn push_section(bundle: &mut String, title: &str, entries: &[&MemoryEntry]) {
    if entries.is_empty() {
        return;
    }
    bundle.push_str(&format!("\n\n{}:", title));
    for entry in entries {
        bundle.push_str(&format!("\n- {}", entry.content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::memory::{Importance, InteractionSource, MemoryDetails, MemoryEntryBuilder};
    use chrono::{Duration, TimeZone};

    const BASE: &str = "Suggest one caring action.";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, ContextAssembler) {
        let store = Arc::new(MemoryStore::new(MemoryConfig::default()));
        let assembler = ContextAssembler::new(store.clone(), ContextConfig::default());
        (store, assembler)
    }

    async fn put(
        store: &MemoryStore,
        rel: &str,
        details: MemoryDetails,
        content: &str,
        at: DateTime<Utc>,
    ) {
        let draft = MemoryEntryBuilder::new(details)
            .owner_user_id("user-1")
            .relationship(rel, RelationshipType::Romantic)
            .content(content)
            .importance(Importance::Medium)
            .build()
            .unwrap();
        store.store_at(draft, at).await;
    }

    #[test]
    fn test_recency_labels() {
        let n = now();
        assert_eq!(recency_label(n - Duration::minutes(10), n), "Just now");
        assert_eq!(recency_label(n + Duration::minutes(10), n), "Just now");
        assert_eq!(recency_label(n - Duration::hours(5), n), "5h ago");
        assert_eq!(recency_label(n - Duration::hours(30), n), "Yesterday");
        assert_eq!(recency_label(n - Duration::days(3), n), "3 days ago");
        assert_eq!(recency_label(n - Duration::days(10), n), "2025-02-28");
    }

    #[tokio::test]
    async fn test_empty_returns_base_unchanged() {
        let (_, assembler) = setup();
        let bundle = assembler
            .assemble_at("rel-a", RelationshipType::Romantic, BASE, now())
            .await;
        assert_eq!(bundle, BASE);
    }

    #[tokio::test]
    async fn test_section_order_and_guidance() {
        let (store, assembler) = setup();
        let t = now() - Duration::hours(2);
        put(&store, "rel-a", MemoryDetails::Interaction { source: InteractionSource::Journal }, "walked the dog", t).await;
        put(&store, "rel-a", MemoryDetails::Pattern { trigger: None }, "goes quiet after work", t).await;
        put(&store, "rel-a", MemoryDetails::Boundary { strict: true }, "no surprise parties", t).await;
        put(&store, "rel-a", MemoryDetails::Preference { subject: None }, "loves handwritten notes", t).await;
        put(&store, "rel-a", MemoryDetails::Milestone { occurred_on: None }, "anniversary in June", t).await;

        let bundle = assembler
            .assemble_at("rel-a", RelationshipType::Romantic, BASE, now())
            .await;

        assert!(bundle.starts_with(BASE));
        let pos = |needle: &str| bundle.find(needle).unwrap();
        assert!(pos("Preferences:") < pos("Boundaries (always respect):"));
        assert!(pos("Boundaries (always respect):") < pos("Patterns:"));
        assert!(pos("Patterns:") < pos("Milestones:"));
        assert!(pos("Milestones:") < pos("Recent interactions:"));
        assert!(bundle.contains("- [2h ago] walked the dog"));
        assert!(bundle.ends_with(guidance_for(RelationshipType::Romantic)));
    }

    #[tokio::test]
    async fn test_no_empty_headers() {
        let (store, assembler) = setup();
        put(&store, "rel-a", MemoryDetails::Preference { subject: None }, "likes tea", now()).await;
        let bundle = assembler
            .assemble_at("rel-a", RelationshipType::Romantic, BASE, now())
            .await;
        assert!(bundle.contains("Preferences:"));
        assert!(!bundle.contains("Boundaries"));
        assert!(!bundle.contains("Recent interactions:"));
    }

    #[tokio::test]
    async fn test_excludes_other_relationships() {
        let (store, assembler) = setup();
        put(&store, "rel-a", MemoryDetails::Preference { subject: None }, "alpha likes tea", now()).await;
        put(&store, "rel-b", MemoryDetails::Preference { subject: None }, "bravo likes coffee", now()).await;

        let bundle = assembler
            .assemble_at("rel-a", RelationshipType::Romantic, BASE, now())
            .await;
        assert!(bundle.contains("alpha likes tea"));
        assert!(!bundle.contains("bravo"));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_excluded() {
        let (store, assembler) = setup();
        put(&store, "rel-a", MemoryDetails::Preference { subject: None }, "likes tea", now()).await;
        let bundle = assembler
            .assemble_at("rel-a", RelationshipType::Work, BASE, now())
            .await;
        assert_eq!(bundle, BASE);
    }

    #[tokio::test]
    async fn test_limits() {
        let (store, assembler) = setup();
        for i in 0..8 {
            let at = now() - Duration::days(i);
            put(&store, "rel-a", MemoryDetails::Milestone { occurred_on: None }, &format!("milestone {}", i), at).await;
            put(&store, "rel-a", MemoryDetails::Interaction { source: InteractionSource::CheckIn }, &format!("interaction {}", i), at).await;
        }

        let bundle = assembler
            .assemble_at("rel-a", RelationshipType::Romantic, BASE, now())
            .await;
        assert_eq!(bundle.matches("- milestone").count(), 5);
        assert_eq!(bundle.matches("] interaction").count(), 5);
        // newest interactions are kept
        assert!(bundle.contains("[Just now] interaction 0"));
        assert!(!bundle.contains("interaction 7"));
    }
}
