use rapport::config::RapportConfig;
use rapport::memory::{
    spawn_cleanup_task, InteractionSource, IntakeInput, MemoryKind, MemoryQuery, MemoryStore,
    RelationshipType,
};
use rapport::suggestion::{JsonlSuggestionSink, RecipientProfile, SuggestionCategory};
use rapport::{CoachingPipelineBuilder, CoachingRequest};
use std::sync::Arc;

fn coaching(relationship_id: &str, relationship_type: RelationshipType, text: &str) -> CoachingRequest {
    CoachingRequest {
        input: IntakeInput {
            owner_user_id: "user-1".to_string(),
            relationship_id: relationship_id.to_string(),
            relationship_type,
            text: text.to_string(),
            source: InteractionSource::Journal,
        },
        recipient: RecipientProfile::new("recipient-1").prefer(SuggestionCategory::QualityTime),
        feedback: Vec::new(),
        base_instruction: None,
    }
}

#[tokio::test]
async fn coaching_flow_persists_accepted_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accepted.jsonl");

    let pipeline = CoachingPipelineBuilder::new()
        .sink(Arc::new(JsonlSuggestionSink::new(&path)))
        .build()
        .unwrap();

    let report = pipeline
        .process(&coaching(
            "partner",
            RelationshipType::Romantic,
            "I miss our evenings together. Never plan anything on Sunday mornings.",
        ))
        .await
        .unwrap();

    // interaction + boundary
    assert_eq!(report.stored_entries, 2);
    let accepted = report.outcome.accepted().unwrap();
    assert_eq!(accepted.candidate.category, SuggestionCategory::QualityTime);
    assert!(accepted.candidate.quality.is_some());

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 1);
    assert!(written.contains(&accepted.id.to_string()));

    let boundaries = pipeline
        .store()
        .retrieve(&MemoryQuery::for_relationship("partner").kinds([MemoryKind::Boundary]))
        .await;
    assert_eq!(boundaries.len(), 1);
}

#[tokio::test]
async fn concurrent_requests_stay_in_their_relationship() {
    let store = Arc::new(MemoryStore::new(RapportConfig::default().memory));
    let pipeline = CoachingPipelineBuilder::new()
        .store(store.clone())
        .build()
        .unwrap();

    let requests: Vec<CoachingRequest> = (0..6)
        .map(|i| {
            let relationship_type = if i % 2 == 0 {
                RelationshipType::Romantic
            } else {
                RelationshipType::Work
            };
            coaching(
                &format!("rel-{}", i),
                relationship_type,
                &format!("Secret number {} came up during a busy week", i),
            )
        })
        .collect();

    let reports = pipeline.process_many(&requests).await;
    assert!(reports.iter().all(|r| r.is_ok()));

    for i in 0..6 {
        let id = format!("rel-{}", i);
        let entries = store.retrieve(&MemoryQuery::for_relationship(id.as_str())).await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].content.contains(&format!("Secret number {} ", i)));
    }
    assert_eq!(store.stats().await.relationships, 6);
}

#[tokio::test]
async fn cleanup_task_can_be_aborted() {
    let store = Arc::new(MemoryStore::new(RapportConfig::default().memory));
    let handle = spawn_cleanup_task(store).unwrap();
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}
