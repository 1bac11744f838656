use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_SAGA_NAME: &str = "saga";
pub const DEFAULT_ANONYMOUS_STEP_NAME: &str = "anonymous";

/// Settings shared by every coordinator front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaConfig {
    name: String,
    anonymous_step_name: String,
    audit: bool,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            name: String::from(DEFAULT_SAGA_NAME),
            anonymous_step_name: String::from(DEFAULT_ANONYMOUS_STEP_NAME),
            audit: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct SagaConfigValue {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    anonymous_step_name: Option<String>,
    #[serde(default)]
    audit: Option<bool>,
}

impl From<SagaConfigValue> for SagaConfig {
    fn from(value: SagaConfigValue) -> Self {
        let defaults = Self::default();
        Self {
            name: value.name.unwrap_or(defaults.name),
            anonymous_step_name: value
                .anonymous_step_name
                .unwrap_or(defaults.anonymous_step_name),
            audit: value.audit.unwrap_or(defaults.audit),
        }
    }
}

impl SagaConfig {
    /// Parse a configuration table such as:
    ///
    /// ```toml
    /// name = "checkout"
    /// anonymous-step-name = "unnamed"
    /// audit = false
    /// ```
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the input is not valid TOML or contains
    /// unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let value: SagaConfigValue = toml::from_str(input)?;
        Ok(value.into())
    }

    /// Label attached to every log event of the saga.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name recorded for steps whose action has no usable name.
    #[must_use]
    pub fn anonymous_step_name(&self) -> &str {
        &self.anonymous_step_name
    }

    /// Whether runs populate the audit log.
    #[must_use]
    pub fn audit(&self) -> bool {
        self.audit
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_anonymous_step_name(mut self, name: impl Into<String>) -> Self {
        self.anonymous_step_name = name.into();
        self
    }

    #[must_use]
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }
}
