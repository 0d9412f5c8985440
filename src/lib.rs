//! Rapport - relationship memory and suggestion quality gating
//!
//! Rapport is the core of a relationship-coaching service. It keeps a
//! per-relationship memory of interaction facts, preferences, boundaries,
//! patterns and milestones, and gates generated partner suggestions through
//! a deterministic quality validator before anything is shown to anyone.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        CoachingPipeline                           │
//! │                                                                   │
//! │  private text ──► MemoryIntake ──► MemoryStore (per relationship) │
//! │                                          │                        │
//! │                                          ▼                        │
//! │                                  ContextAssembler                 │
//! │                                          │ context bundle         │
//! │                                          ▼                        │
//! │  ┌────────────────────── RegenerationController ───────────────┐ │
//! │  │  SuggestionGenerator ──► QualityValidator ──► accept/reject │ │
//! │  │  (HTTP or rule-based)        ▲                    │         │ │
//! │  │        └───── improvement notes (≤ N retries) ────┘         │ │
//! │  └─────────────────────────────────────────┬───────────────────┘ │
//! │                                            ▼                      │
//! │                                     SuggestionSink                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - A read for one `relationship_id` never returns another relationship's
//!   facts, even for the same owning user.
//! - Per-kind context lists are bounded; high and critical facts are never
//!   evicted by capacity pressure.
//! - Scoring is a pure function of its inputs.
//! - When no candidate passes within the retry bound, nothing is emitted.
//!
//! ## Modules
//!
//! - [`memory`]: fact storage, retrieval, cleanup and intake
//! - [`context`]: relationship-scoped context bundles
//! - [`quality`]: heuristic scoring and the quality gate
//! - [`suggestion`]: generators, regeneration controller and sinks
//! - [`pipeline`]: end-to-end coaching flow
//! - [`config`]: configuration management

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod quality;
pub mod suggestion;

pub use config::RapportConfig;
pub use error::{Error, Result};
pub use pipeline::{CoachingPipeline, CoachingPipelineBuilder, CoachingReport, CoachingRequest};
