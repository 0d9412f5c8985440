//! Relationship-scoped context bundles for the suggestion generator

mod assembler;
mod guidance;

pub use assembler::{recency_label, ContextAssembler};
pub use guidance::guidance_for;
