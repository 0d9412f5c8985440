//! End-to-end coaching flow
//!
//! private input → intake (facts stored) → context bundle → generator →
//! quality gate (bounded regeneration) → sink, or nothing.

use crate::config::RapportConfig;
use crate::context::ContextAssembler;
use crate::error::Result;
use crate::memory::{IntakeInput, MemoryIntake, MemoryStore};
use crate::quality::QualityValidator;
use crate::suggestion::{
    FeedbackRecord, GateOutcome, GenerationRequest, HttpGenerator, InMemorySuggestionSink,
    RecipientProfile, RegenerationController, RuleBasedGenerator, SuggestionGenerator,
    SuggestionSink,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Instruction the context bundle is built on when the caller supplies none.
pub const DEFAULT_INSTRUCTION: &str =
    "Suggest one kind, concrete action the recipient could take for this person.";

/// One private input plus what is known about the recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingRequest {
    pub input: IntakeInput,
    pub recipient: RecipientProfile,
    #[serde(default)]
    pub feedback: Vec<FeedbackRecord>,
    #[serde(default)]
    pub base_instruction: Option<String>,
}

/// What happened to one request.
#[derive(Debug, Clone, Serialize)]
pub struct CoachingReport {
    pub relationship_id: String,
    /// Memory entries stored from the private input
    pub stored_entries: usize,
    pub outcome: GateOutcome,
}

/// Wires intake, context assembly and the regeneration controller together.
pub struct CoachingPipeline {
    store: Arc<MemoryStore>,
    intake: MemoryIntake,
    assembler: ContextAssembler,
    controller: RegenerationController,
}

impl CoachingPipeline {
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn controller(&self) -> &RegenerationController {
        &self.controller
    }

    /// Run one private input through the full flow.
    pub async fn process(&self, request: &CoachingRequest) -> Result<CoachingReport> {
        let input = &request.input;
        let stored = self.intake.ingest(input).await?;

        let base = request
            .base_instruction
            .as_deref()
            .unwrap_or(DEFAULT_INSTRUCTION);
        let bundle = self
            .assembler
            .assemble(&input.relationship_id, input.relationship_type, base)
            .await;

        let generation = GenerationRequest::new(
            bundle,
            input.text.as_str(),
            request.recipient.clone(),
            input.relationship_type,
        );
        let outcome = self
            .controller
            .run(&input.relationship_id, &generation, &request.feedback)
            .await?;

        Ok(CoachingReport {
            relationship_id: input.relationship_id.clone(),
            stored_entries: stored.len(),
            outcome,
        })
    }

    /// Run independent inputs concurrently. Results keep the input order.
    pub async fn process_many(&self, requests: &[CoachingRequest]) -> Vec<Result<CoachingReport>> {
        futures::future::join_all(requests.iter().map(|r| self.process(r))).await
    }
}

/// Builder for `CoachingPipeline`
pub struct CoachingPipelineBuilder {
    config: RapportConfig,
    store: Option<Arc<MemoryStore>>,
    generator: Option<Arc<dyn SuggestionGenerator>>,
    sink: Option<Arc<dyn SuggestionSink>>,
}

impl CoachingPipelineBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: RapportConfig::default(),
            store: None,
            generator: None,
            sink: None,
        }
    }

    pub fn config(mut self, config: RapportConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing memory store instead of creating one
    pub fn store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Primary generator; defaults to the configured HTTP service, or the
    /// rule-based generator when no endpoint is configured
    pub fn generator(mut self, generator: Arc<dyn SuggestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Outbound sink; defaults to an in-memory sink
    pub fn sink(mut self, sink: Arc<dyn SuggestionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<CoachingPipeline> {
        let config = self.config;
        config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new(config.memory.clone())));
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(InMemorySuggestionSink::new()));
        let fallback: Arc<dyn SuggestionGenerator> = Arc::new(RuleBasedGenerator::new()?);

        let primary: Option<Arc<dyn SuggestionGenerator>> = match self.generator {
            Some(generator) => Some(generator),
            None => HttpGenerator::from_config(&config.generator)?
                .map(|g| Arc::new(g) as Arc<dyn SuggestionGenerator>),
        };

        let validator = QualityValidator::new(&config.quality)?;
        let controller = match primary {
            Some(primary) => {
                RegenerationController::new(primary, validator, sink, config.regeneration.clone())
                    .with_fallback(fallback)
            }
            None => RegenerationController::new(fallback, validator, sink, config.regeneration.clone()),
        };

        Ok(CoachingPipeline {
            intake: MemoryIntake::new(store.clone())?,
            assembler: ContextAssembler::new(store.clone(), config.context.clone()),
            store,
            controller,
        })
    }
}

impl Default for CoachingPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
