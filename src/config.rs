//! Rapport configuration management

use crate::error::{Error, Result};
use crate::memory::MemoryKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main Rapport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RapportConfig {
    /// Memory store configuration
    pub memory: MemoryConfig,

    /// Context assembly configuration
    pub context: ContextConfig,

    /// Quality gate configuration
    pub quality: QualityConfig,

    /// Regeneration loop configuration
    pub regeneration: RegenerationConfig,

    /// External suggestion generator configuration
    pub generator: GeneratorConfig,
}

impl RapportConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break the store or the quality gate.
    pub fn validate(&self) -> Result<()> {
        let caps = &self.memory.caps;
        for (kind, cap) in [
            (MemoryKind::Interaction, Some(caps.interaction)),
            (MemoryKind::Pattern, Some(caps.pattern)),
            (MemoryKind::Preference, Some(caps.preference)),
            (MemoryKind::Boundary, Some(caps.boundary)),
            (MemoryKind::Milestone, caps.milestone),
        ] {
            if cap == Some(0) {
                return Err(Error::Config(format!("memory cap for {} must be > 0", kind)));
            }
        }
        if self.memory.partition_limit == 0 {
            return Err(Error::Config("memory.partition_limit must be > 0".to_string()));
        }
        if !(1.0..=10.0).contains(&self.quality.acceptance_threshold) {
            return Err(Error::Config(format!(
                "quality.acceptance_threshold must be within [1, 10], got {}",
                self.quality.acceptance_threshold
            )));
        }
        if self.regeneration.generator_timeout_secs == 0 {
            return Err(Error::Config(
                "regeneration.generator_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Per-kind caps for each relationship's context lists
    pub caps: KindCaps,

    /// Maximum entries per relationship+type partition kept by cleanup
    pub partition_limit: usize,

    /// Background cleanup interval in seconds
    pub cleanup_interval_secs: u64,

    /// Run cleanup on a background schedule
    pub auto_cleanup: bool,

    /// Expiry for raw interaction facts created by intake (None = never)
    pub interaction_ttl_days: Option<u32>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            caps: KindCaps::default(),
            partition_limit: 100,
            cleanup_interval_secs: 3600,
            auto_cleanup: true,
            interaction_ttl_days: None,
        }
    }
}

/// Per-kind caps. Milestones are unbounded at storage time unless set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindCaps {
    pub interaction: usize,
    pub pattern: usize,
    pub preference: usize,
    pub boundary: usize,
    pub milestone: Option<usize>,
}

impl KindCaps {
    /// Cap for a kind, `None` meaning unbounded.
    pub fn cap_for(&self, kind: MemoryKind) -> Option<usize> {
        match kind {
            MemoryKind::Interaction => Some(self.interaction),
            MemoryKind::Pattern => Some(self.pattern),
            MemoryKind::Preference => Some(self.preference),
            MemoryKind::Boundary => Some(self.boundary),
            MemoryKind::Milestone => self.milestone,
        }
    }
}

impl Default for KindCaps {
    fn default() -> Self {
        Self {
            interaction: 10,
            pattern: 5,
            preference: 10,
            boundary: 5,
            milestone: None,
        }
    }
}

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Entries fetched across interaction/pattern/preference/boundary
    pub max_entries: usize,

    /// Milestones fetched separately
    pub max_milestones: usize,

    /// Recent interactions rendered with recency labels
    pub max_recent_interactions: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_entries: 15,
            max_milestones: 5,
            max_recent_interactions: 5,
        }
    }
}

/// Quality gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum overall score for a candidate to be accepted
    pub acceptance_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 7.0,
        }
    }
}

/// Regeneration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenerationConfig {
    /// Regenerations allowed after the first attempt
    pub max_regenerations: u32,

    /// Timeout for a single generator call in seconds
    pub generator_timeout_secs: u64,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            max_regenerations: 1,
            generator_timeout_secs: 20,
        }
    }
}

/// External suggestion generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Endpoint of the natural-language generation service (None = rule-based only)
    pub endpoint: Option<String>,

    /// Environment variable holding the service bearer token
    pub api_key_env: String,

    /// Model name forwarded to the service
    pub model: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: "RAPPORT_GENERATOR_API_KEY".to_string(),
            model: "default".to_string(),
        }
    }
}
