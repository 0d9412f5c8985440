use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rapport::config::{MemoryConfig, QualityConfig, RegenerationConfig};
use rapport::memory::{
    Importance, InteractionSource, MemoryEntryBuilder, MemoryKind, MemoryQuery, MemoryStore,
    RelationshipType,
};
use rapport::quality::{QualityMetrics, QualityValidator, ValidationResult};
use rapport::suggestion::{
    GateOutcome, GenerationRequest, GeneratorError, InMemorySuggestionSink, RecipientProfile,
    RegenerationController, SuggestionCandidate, SuggestionCategory, SuggestionGenerator,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const SOURCE: &str = "I've been exhausted from work and miss our weekend hikes";
const ECHOING: &str =
    "Your partner could use a break from an exhausting work week — plan a weekend hike!";
const GOOD: &str =
    "How about you plan a quiet dinner at home tonight? Your partner might enjoy the slower pace.";

fn interaction(relationship_id: &str, content: &str, importance: Importance) -> MemoryEntryBuilder {
    MemoryEntryBuilder::interaction(InteractionSource::CheckIn)
        .owner_user_id("same-user")
        .relationship(relationship_id, RelationshipType::Romantic)
        .content(content)
        .importance(importance)
}

struct ScriptedGenerator {
    responses: Mutex<VecDeque<SuggestionCandidate>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                texts
                    .iter()
                    .map(|t| {
                        SuggestionCandidate::new(SuggestionCategory::QualityTime, *t, "A busy week")
                    })
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<SuggestionCandidate, GeneratorError> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GeneratorError::Unavailable("no more scripted responses".into()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn controller(generator: Arc<ScriptedGenerator>, sink: Arc<InMemorySuggestionSink>) -> RegenerationController {
    let validator = QualityValidator::new(&QualityConfig::default()).unwrap();
    RegenerationController::new(generator, validator, sink, RegenerationConfig::default())
}

fn request() -> GenerationRequest {
    GenerationRequest::new(
        "Suggest one caring action.",
        SOURCE,
        RecipientProfile::new("partner-1"),
        RelationshipType::Romantic,
    )
}

#[tokio::test]
async fn retrieve_never_crosses_relationships() {
    let store = MemoryStore::new(MemoryConfig::default());
    for i in 0..5 {
        store
            .store(interaction("rel-a", &format!("a {}", i), Importance::Medium).build().unwrap())
            .await;
        store
            .store(interaction("rel-b", &format!("b {}", i), Importance::Critical).build().unwrap())
            .await;
    }

    let a = store.retrieve(&MemoryQuery::for_relationship("rel-a")).await;
    assert_eq!(a.len(), 5);
    assert!(a.iter().all(|e| e.relationship_id == "rel-a"));

    let by_tag_and_kind = store
        .retrieve(
            &MemoryQuery::for_relationship("rel-a")
                .kinds([MemoryKind::Interaction])
                .importance([Importance::Critical]),
        )
        .await;
    assert!(by_tag_and_kind.is_empty());
}

#[tokio::test]
async fn eleventh_interaction_evicts_the_oldest() {
    let store = MemoryStore::new(MemoryConfig::default());
    let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();

    let mut ids = Vec::new();
    for i in 0..11 {
        let draft = interaction("rel-a", &format!("interaction {}", i), Importance::Medium)
            .build()
            .unwrap();
        ids.push(store.store_at(draft, t0 + Duration::minutes(i)).await.id);
    }

    let remaining = store.retrieve(&MemoryQuery::for_relationship("rel-a")).await;
    assert_eq!(remaining.len(), 10);
    let remaining_ids: Vec<_> = remaining.iter().map(|e| e.id).collect();
    assert!(!remaining_ids.contains(&ids[0]));
    for id in &ids[1..] {
        assert!(remaining_ids.contains(id));
    }

    let context = store.relationship_context("rel-a").await.unwrap();
    assert_eq!(context.buffer(MemoryKind::Interaction).len(), 10);
}

#[tokio::test]
async fn critical_entry_survives_eviction_until_expiry() {
    let store = MemoryStore::new(MemoryConfig::default());
    let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();

    let critical = store
        .store_at(
            interaction("rel-a", "safety concern", Importance::Critical)
                .expires_at(t0 + Duration::days(1))
                .build()
                .unwrap(),
            t0,
        )
        .await;
    for i in 1..=12 {
        let draft = interaction("rel-a", &format!("routine {}", i), Importance::Medium)
            .build()
            .unwrap();
        store.store_at(draft, t0 + Duration::minutes(i)).await;
    }

    let all = store.retrieve(&MemoryQuery::for_relationship("rel-a")).await;
    assert_eq!(all.len(), 10);
    assert_eq!(all[0].id, critical.id);

    let report = store.cleanup_at(t0 + Duration::days(2)).await;
    assert_eq!(report.expired, 1);
    let after = store.retrieve(&MemoryQuery::for_relationship("rel-a")).await;
    assert!(after.iter().all(|e| e.id != critical.id));
}

#[tokio::test]
async fn tagged_entry_round_trips_through_tag_queries() {
    let store = MemoryStore::new(MemoryConfig::default());
    let tagged = store
        .store(interaction("rel-a", "tagged", Importance::Low).tag("x").build().unwrap())
        .await;
    store
        .store(interaction("rel-a", "other", Importance::Low).tag("y").build().unwrap())
        .await;

    let with_x = store.retrieve(&MemoryQuery::new().tags(["x"])).await;
    assert_eq!(with_x.len(), 1);
    assert_eq!(with_x[0].id, tagged.id);
    assert!(with_x[0].tags.contains("x"));

    let without_x = store.retrieve(&MemoryQuery::new().tags(["y", "z"])).await;
    assert!(without_x.iter().all(|e| e.id != tagged.id));
}

#[test]
fn validation_is_deterministic() {
    let validator = QualityValidator::new(&QualityConfig::default()).unwrap();
    let candidate = SuggestionCandidate::new(SuggestionCategory::QualityTime, ECHOING, "");
    let profile = RecipientProfile::new("p").prefer(SuggestionCategory::QualityTime);

    let first = validator.validate(&candidate, SOURCE, &profile, &[]);
    let second = validator.validate(&candidate, SOURCE, &profile, &[]);
    for (a, b) in [
        (first.metrics.relevance, second.metrics.relevance),
        (first.metrics.actionability, second.metrics.actionability),
        (first.metrics.privacy, second.metrics.privacy),
        (first.metrics.naturalness, second.metrics.naturalness),
        (first.metrics.feedback_integration, second.metrics.feedback_integration),
        (first.metrics.overall, second.metrics.overall),
    ] {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn threshold_example() {
    let metrics = QualityMetrics::from_scores(8.0, 7.0, 4.0, 6.0, 7.0);
    assert!((metrics.overall - 6.4).abs() < 1e-9);

    let result = ValidationResult::from_metrics(metrics, 7.0, 0.0);
    assert!(!result.is_valid);
    assert_eq!(result.confidence_adjustment, -1);
}

#[tokio::test]
async fn privacy_penalty_triggers_exactly_one_regeneration() {
    let validator = QualityValidator::new(&QualityConfig::default()).unwrap();
    let echoing = SuggestionCandidate::new(SuggestionCategory::QualityTime, ECHOING, "");
    let scored = validator.validate(&echoing, SOURCE, &RecipientProfile::default(), &[]);
    assert!(scored.overlap_ratio > 0.30);
    assert!(scored.metrics.privacy <= 4.0);
    assert!(scored.metrics.overall < 7.0);

    let generator = ScriptedGenerator::new(&[ECHOING, GOOD]);
    let sink = Arc::new(InMemorySuggestionSink::new());
    let outcome = controller(generator.clone(), sink.clone())
        .run("rel-a", &request(), &[])
        .await
        .unwrap();

    assert!(outcome.is_accepted());
    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[1].improvement_notes.is_empty());
    assert_eq!(sink.len().await, 1);
}

#[tokio::test]
async fn fails_closed_when_both_attempts_are_rejected() {
    let generator = ScriptedGenerator::new(&[ECHOING, ECHOING, GOOD]);
    let sink = Arc::new(InMemorySuggestionSink::new());
    let outcome = controller(generator.clone(), sink.clone())
        .run("rel-a", &request(), &[])
        .await
        .unwrap();

    assert!(matches!(outcome, GateOutcome::Rejected { attempts: 2, .. }));
    assert!(outcome.accepted().is_none());
    assert_eq!(generator.calls().len(), 2);
    assert!(sink.is_empty().await);
}
