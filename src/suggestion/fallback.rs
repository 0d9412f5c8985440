//! Rule-based local fallback generator
//!
//! Used when the external generator is unavailable or times out. Picks a
//! category from the need families detected in the private text (falling
//! back to the recipient's top preference, then to communication) and fills
//! a fixed template worded for the relationship type. Output still goes
//! through the full quality validator.

use super::candidate::{SuggestionCandidate, SuggestionCategory};
use super::generator::{GenerationRequest, GeneratorError, SuggestionGenerator};
use crate::error::Result;
use crate::memory::RelationshipType;
use crate::quality::Markers;
use async_trait::async_trait;

const ANONYMIZED_CONTEXT: &str = "Suggested from recent reflections on this relationship";

/// Primary and alternate wording per category; `{who}` names the recipient.
fn templates(category: SuggestionCategory) -> [&'static str; 2] {
    match category {
        SuggestionCategory::EmotionalSupport => [
            "How about you offer {who} a quiet evening to unwind tonight? They might appreciate having space to recharge.",
            "How about you ask {who} tonight what would feel restful, then make room for it? They might welcome the gesture.",
        ],
        SuggestionCategory::QualityTime => [
            "How about you plan a short walk with {who} this weekend? They might enjoy some unhurried moments with you.",
            "How about you suggest a simple breakfast out with {who} this weekend? They might like the slower start.",
        ],
        SuggestionCategory::ActsOfService => [
            "How about you offer to take one small task off the list for {who} tomorrow? They might feel lighter for it.",
            "How about you prepare something practical for {who} tonight, like a packed lunch? They might notice the care.",
        ],
        SuggestionCategory::WordsOfAffirmation => [
            "How about you prepare a short note for {who} tonight naming one thing you admire? They might treasure reading it.",
            "How about you ask {who} over coffee tomorrow about a recent win and cheer it on? They might feel seen.",
        ],
        SuggestionCategory::PhysicalTouch => [
            "How about you offer {who} a long, unhurried hug tonight? They might find it grounding.",
            "How about you suggest a slow evening on the couch with {who} tonight? They might enjoy being close.",
        ],
        SuggestionCategory::Gifts => [
            "How about you plan a small, thoughtful treat for {who} this weekend? They might enjoy the surprise.",
            "How about you organize a little care package for {who} tomorrow? They might smile at the thought.",
        ],
        SuggestionCategory::Communication | SuggestionCategory::Other => [
            "How about you ask {who} tomorrow how their week is going, and simply listen? They might value the chance to share.",
            "How about you schedule a relaxed check-in with {who} this weekend? They might open up when there is no rush.",
        ],
    }
}

fn recipient_phrase(relationship_type: RelationshipType) -> &'static str {
    match relationship_type {
        RelationshipType::Romantic => "your partner",
        RelationshipType::Work => "your colleague",
        RelationshipType::Family => "your family member",
        RelationshipType::Friend => "your friend",
        RelationshipType::Other => "them",
    }
}

/// Fixed keyword→template generator that never fails.
pub struct RuleBasedGenerator {
    markers: Markers,
}

impl RuleBasedGenerator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            markers: Markers::compile()?,
        })
    }

    /// Category chosen for a request.
    pub fn choose_category(&self, request: &GenerationRequest) -> SuggestionCategory {
        let category = self
            .markers
            .need_families(&request.private_text)
            .first()
            .map(|family| family.proposed_category())
            .or_else(|| request.recipient.top_preference())
            .unwrap_or(SuggestionCategory::Communication);

        match (category, request.relationship_type) {
            (SuggestionCategory::PhysicalTouch, t) if t != RelationshipType::Romantic => {
                SuggestionCategory::Communication
            }
            (category, _) => category,
        }
    }
}

#[async_trait]
impl SuggestionGenerator for RuleBasedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<SuggestionCandidate, GeneratorError> {
        let category = self.choose_category(request);
        let [primary, alternate] = templates(category);
        let template = if request.is_regeneration() {
            alternate
        } else {
            primary
        };
        let text = template.replace("{who}", recipient_phrase(request.relationship_type));

        Ok(SuggestionCandidate::new(category, text, ANONYMIZED_CONTEXT).with_confidence(6))
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}
