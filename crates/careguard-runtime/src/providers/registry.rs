//! Provider registry: the table of generation backends.
//!
//! Each backend is one [`ProviderProfile`] row. Adding a backend that speaks
//! an existing envelope family is one more row; a new wire shape is one more
//! [`EnvelopeFamily`] variant.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::builtin();
//! let profile = registry.get("nova_micro").unwrap();
//! assert_eq!(profile.family, EnvelopeFamily::StructuredConfig);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EnvelopeFamily;

/// Default completion budget per call.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Pricing tier, reported with the profile listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Economy,
    Standard,
    Premium,
}

/// One generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Stable identifier used as the comparison result key
    pub id: String,

    /// Human-readable name
    pub label: String,

    /// Backend model identifier passed to the transport
    pub model_id: String,

    pub family: EnvelopeFamily,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    pub cost_tier: CostTier,
}

impl ProviderProfile {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        model_id: impl Into<String>,
        family: EnvelopeFamily,
        cost_tier: CostTier,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            model_id: model_id.into(),
            family,
            max_tokens: DEFAULT_MAX_TOKENS,
            cost_tier,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate provider id: '{0}'")]
    Duplicate(String),

    #[error("Invalid provider profile '{id}': {reason}")]
    Invalid { id: String, reason: String },
}

/// Ordered, id-indexed set of provider profiles.
///
/// Registration order is preserved for listings and comparison fan-out.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    profiles: Vec<ProviderProfile>,
    index: BTreeMap<String, usize>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five built-in backends.
    pub fn builtin() -> Self {
        use CostTier::*;
        use EnvelopeFamily::*;

        let rows = [
            (
                "claude_4_5_sonnet",
                "Claude 4.5 Sonnet",
                "us.anthropic.claude-sonnet-4-5-20250929-v1:0",
                ChatStyle,
                Premium,
            ),
            (
                "claude_3_7_sonnet",
                "Claude 3.7 Sonnet",
                "us.anthropic.claude-3-7-sonnet-20250219-v1:0",
                ChatStyle,
                Standard,
            ),
            (
                "claude_3_5_sonnet",
                "Claude 3.5 Sonnet",
                "anthropic.claude-3-5-sonnet-20241022-v2:0",
                ChatStyle,
                Standard,
            ),
            (
                "claude_3_sonnet",
                "Claude 3 Sonnet",
                "anthropic.claude-3-sonnet-20240229-v1:0",
                ChatStyle,
                Standard,
            ),
            (
                "nova_micro",
                "Amazon Nova Micro",
                "amazon.nova-micro-v1:0",
                StructuredConfig,
                Economy,
            ),
        ];

        let profiles: Vec<ProviderProfile> = rows
            .into_iter()
            .map(|(id, label, model_id, family, tier)| {
                ProviderProfile::new(id, label, model_id, family, tier)
            })
            .collect();
        let index = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        Self { profiles, index }
    }

    /// Build a registry from a profile list, rejecting duplicates.
    pub fn from_profiles(
        profiles: impl IntoIterator<Item = ProviderProfile>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// Register a profile.
    ///
    /// Unlike a map insert, an existing id is an error rather than a
    /// replacement.
    pub fn register(&mut self, profile: ProviderProfile) -> Result<(), RegistryError> {
        validate_profile(&profile)?;
        if self.index.contains_key(&profile.id) {
            return Err(RegistryError::Duplicate(profile.id));
        }
        self.index.insert(profile.id.clone(), self.profiles.len());
        self.profiles.push(profile);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ProviderProfile> {
        self.index.get(id).map(|&i| &self.profiles[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Profiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderProfile> {
        self.profiles.iter()
    }

    /// Ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn validate_profile(profile: &ProviderProfile) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::Invalid {
        id: profile.id.clone(),
        reason: reason.to_string(),
    };
    if profile.id.trim().is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if profile.model_id.trim().is_empty() {
        return Err(invalid("model_id must not be empty"));
    }
    if profile.max_tokens == 0 {
        return Err(invalid("max_tokens must be at least 1"));
    }
    Ok(())
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
