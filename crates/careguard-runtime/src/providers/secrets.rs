//! Credential handling for generation backends.
//!
//! An [`ApiCredential`] never shows its value through `Debug` or `Display`,
//! is zeroed on drop, and must be read with an explicit `.expose()` at the
//! point of use.
//!
//! ```ignore
//! let cred = ApiCredential::from_config_or_env(
//!     config.api_key.as_deref(),
//!     &config.api_key_env,
//!     "Backend API key",
//! )?;
//! request.bearer_auth(cred.expose());
//! ```

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Credential lookup failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{name} not set: configure '{env_var}' environment variable")]
    MissingEnv { name: &'static str, env_var: String },

    #[error("{name} required: set 'api_key' in config or {env_var} environment variable")]
    Missing { name: &'static str, env_var: String },

    #[error("{name} is empty")]
    Empty { name: &'static str },
}

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Config,
    Environment,
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from an environment variable. An empty value counts as unset.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, CredentialError> {
        match std::env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(Self::new(v, CredentialSource::Environment, name)),
            _ => Err(CredentialError::MissingEnv {
                name,
                env_var: env_var.to_string(),
            }),
        }
    }

    /// Use the configured value when present, else the environment variable.
    pub fn from_config_or_env(
        configured: Option<&str>,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, CredentialError> {
        if let Some(value) = configured {
            if value.trim().is_empty() {
                return Err(CredentialError::Empty { name });
            }
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        Self::from_env(env_var, name).map_err(|_| CredentialError::Missing {
            name,
            env_var: env_var.to_string(),
        })
    }

    /// Check if a credential is available without loading it.
    pub fn is_available(configured: Option<&str>, env_var: &str) -> bool {
        configured.is_some_and(|v| !v.trim().is_empty())
            || std::env::var(env_var).is_ok_and(|v| !v.trim().is_empty())
    }

    /// Expose the value. Call only where the credential is sent.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
