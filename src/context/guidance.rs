//! Fixed per-relationship-type guidance appended to every context bundle

use crate::memory::RelationshipType;

const ROMANTIC: &str = "Relationship guidance: this is a romantic partner. Warm, affectionate \
and intimate language is appropriate. Respect every boundary listed above.";

const WORK: &str = "Relationship guidance: this is a work relationship. Keep every suggestion \
professional and frame it around collaboration and workplace norms. Never use intimate, \
romantic or affectionate language.";

const FAMILY: &str = "Relationship guidance: this is a family relationship. Be diplomatic and \
mindful of family roles and hierarchy. Do not use romantic or intimate language.";

const FRIEND: &str = "Relationship guidance: this is a friendship. A casual, friendly tone is \
welcome. Do not use romantic or intimate language.";

const OTHER: &str = "Relationship guidance: keep a respectful, neutral tone. Do not use romantic \
or intimate language.";

/// Boundary rules for suggestions in a relationship of this type.
pub fn guidance_for(relationship_type: RelationshipType) -> &'static str {
    match relationship_type {
        RelationshipType::Romantic => ROMANTIC,
        RelationshipType::Work => WORK,
        RelationshipType::Family => FAMILY,
        RelationshipType::Friend => FRIEND,
        RelationshipType::Other => OTHER,
    }
}
