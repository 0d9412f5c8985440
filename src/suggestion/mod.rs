//! Suggestion generation, gating and persistence
//!
//! Generators produce candidates, the `RegenerationController` runs them
//! through the quality gate with a bounded number of retries, and accepted
//! candidates are handed to a `SuggestionSink`.

pub mod candidate;
pub mod controller;
pub mod fallback;
pub mod generator;
pub mod remote;
pub mod sink;

pub use candidate::{
    FeedbackRecord, RecipientProfile, SuggestionCandidate, SuggestionCategory, SCORE_MAX,
    SCORE_MIN,
};
pub use controller::{GateOutcome, RegenerationController};
pub use fallback::RuleBasedGenerator;
pub use generator::{GenerationRequest, GeneratorError, SuggestionGenerator};
pub use remote::HttpGenerator;
pub use sink::{AcceptedSuggestion, InMemorySuggestionSink, JsonlSuggestionSink, SuggestionSink};
