//! Runtime configuration.
//!
//! Loaded from YAML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```yaml
//! provider_timeout: 15s
//! default_provider: claude_4_5_sonnet
//! inference:
//!   temperature: 0.3
//!   top_p: 0.9
//! retry:
//!   max_retries: 0
//! endpoint: https://bedrock-runtime.us-east-1.amazonaws.com
//! api_key_env: CAREGUARD_API_KEY
//! rule_tables: rules/site.yaml
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use careguard_core::{RuleTableError, RuleTables};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::{
    ApiCredential, CredentialError, InferenceParams, ProviderProfile, ProviderRegistry,
    RegistryError,
};
use crate::resilience::RetryPolicy;

pub const DEFAULT_ENDPOINT: &str = "https://bedrock-runtime.us-east-1.amazonaws.com";
pub const DEFAULT_API_KEY_ENV: &str = "CAREGUARD_API_KEY";
pub const DEFAULT_PROVIDER: &str = "claude_4_5_sonnet";

/// Errors loading or validating runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid provider list: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid rule tables: {0}")]
    RuleTables(#[from] RuleTableError),
}

fn default_provider_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Runtime configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Deadline for one provider call, including retries
    #[serde(default = "default_provider_timeout", with = "humantime_serde")]
    pub provider_timeout: Duration,

    /// Provider used by single generation when none is named
    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default)]
    pub inference: InferenceParams,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Base URL of the model invoke endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Replaces the built-in provider table when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<ProviderProfile>>,

    /// Alternate rule tables; relative paths resolve against the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_tables: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider_timeout: default_provider_timeout(),
            default_provider: default_provider(),
            inference: InferenceParams::default(),
            retry: RetryPolicy::default(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            api_key: None,
            providers: None,
            rule_tables: None,
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("provider_timeout", &self.provider_timeout)
            .field("default_provider", &self.default_provider)
            .field("inference", &self.inference)
            .field("retry", &self.retry)
            .field("endpoint", &self.endpoint)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("providers", &self.providers.as_ref().map(Vec::len))
            .field("rule_tables", &self.rule_tables)
            .finish()
    }
}

impl RuntimeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = if yaml.trim().is_empty() {
            RuntimeConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A relative `rule_tables` path is resolved against
    /// the file's directory.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;

        if let (Some(tables), Some(dir)) = (config.rule_tables.as_ref(), path.parent()) {
            if tables.is_relative() {
                config.rule_tables = Some(dir.join(tables));
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "provider_timeout must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.inference.temperature) {
            return Err(ConfigError::Invalid(format!(
                "inference.temperature must be within 0..=1, got {}",
                self.inference.temperature
            )));
        }
        if !(self.inference.top_p > 0.0 && self.inference.top_p <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "inference.top_p must be within (0, 1], got {}",
                self.inference.top_p
            )));
        }
        self.retry.validate().map_err(ConfigError::Invalid)?;

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "endpoint must start with http:// or https://".to_string(),
            ));
        }

        let registry = self.registry()?;
        if registry.is_empty() {
            return Err(ConfigError::Invalid("provider list is empty".to_string()));
        }
        if !registry.contains(&self.default_provider) {
            return Err(ConfigError::Invalid(format!(
                "default_provider '{}' is not registered. Available: {:?}",
                self.default_provider,
                registry.ids()
            )));
        }
        Ok(())
    }

    /// Provider table: the configured list, or the built-ins.
    pub fn registry(&self) -> Result<ProviderRegistry, ConfigError> {
        match &self.providers {
            Some(profiles) => Ok(ProviderRegistry::from_profiles(profiles.iter().cloned())?),
            None => Ok(ProviderRegistry::builtin()),
        }
    }

    /// Rule tables: the configured file, or the built-ins.
    pub fn rule_tables(&self) -> Result<Arc<RuleTables>, ConfigError> {
        match &self.rule_tables {
            Some(path) => Ok(Arc::new(RuleTables::from_yaml_file(path)?)),
            None => Ok(RuleTables::builtin()),
        }
    }

    /// API key from the inline value or the configured environment variable.
    pub fn credential(&self) -> Result<ApiCredential, CredentialError> {
        ApiCredential::from_config_or_env(
            self.api_key.as_deref(),
            &self.api_key_env,
            "Model endpoint API key",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::EnvelopeFamily;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RuntimeConfig::from_yaml_str("").unwrap();
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
        assert_eq!(config.default_provider, "claude_4_5_sonnet");
        assert_eq!(config.inference, InferenceParams::default());
        assert!(!config.retry.is_enabled());
        assert_eq!(config.registry().unwrap().len(), 5);
    }

    #[test]
    fn test_parse_full_config() {
        let config = RuntimeConfig::from_yaml_str(
            r#"
provider_timeout: 30s
default_provider: local
inference:
  temperature: 0.1
retry:
  max_retries: 2
  min_delay: 100ms
endpoint: http://localhost:8080
api_key_env: LOCAL_KEY
providers:
  - id: local
    label: Local model
    model_id: local-7b
    family: chat_style
    cost_tier: economy
"#,
        )
        .unwrap();

        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert_eq!(config.inference.temperature, 0.1);
        assert_eq!(config.inference.top_p, 0.9);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.min_delay, Duration::from_millis(100));

        let registry = config.registry().unwrap();
        assert_eq!(registry.ids(), vec!["local"]);
        assert_eq!(registry.get("local").unwrap().family, EnvelopeFamily::ChatStyle);
    }

    #[test]
    fn test_unknown_default_provider() {
        let err = RuntimeConfig::from_yaml_str("default_provider: gpt_99").unwrap_err();
        assert!(err.to_string().contains("gpt_99"));
    }

    #[test]
    fn test_duplicate_provider_ids() {
        let err = RuntimeConfig::from_yaml_str(
            r#"
default_provider: a
providers:
  - {id: a, label: A, model_id: m1, family: chat_style, cost_tier: standard}
  - {id: a, label: A2, model_id: m2, family: chat_style, cost_tier: standard}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Registry(RegistryError::Duplicate(_))));
    }

    #[test]
    fn test_invalid_values() {
        assert!(RuntimeConfig::from_yaml_str("provider_timeout: 0s").is_err());
        assert!(RuntimeConfig::from_yaml_str("inference: {temperature: 1.5}").is_err());
        assert!(RuntimeConfig::from_yaml_str("endpoint: ftp://example").is_err());
        assert!(RuntimeConfig::from_yaml_str("unknown_key: 1").is_err());
        assert!(RuntimeConfig::from_yaml_str("provider_timeout: soon").is_err());
    }

    #[test]
    fn test_debug_redacts_inline_key() {
        let config = RuntimeConfig::from_yaml_str("api_key: sk-inline-secret").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-inline-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(config.credential().unwrap().expose(), "sk-inline-secret");

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-inline-secret"));
    }

    #[test]
    fn test_rule_tables_resolved_relative_to_file() {
        let dir = std::env::temp_dir().join(format!("careguard-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("tables.yaml"),
            "version: \"site-1\"\npolypharmacy_threshold: 3\n",
        )
        .unwrap();
        std::fs::write(dir.join("careguard.yaml"), "rule_tables: tables.yaml\n").unwrap();

        let config = RuntimeConfig::from_yaml_file(dir.join("careguard.yaml")).unwrap();
        let tables = config.rule_tables().unwrap();
        assert_eq!(tables.version, "site-1");
        assert_eq!(tables.polypharmacy_threshold, 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
