//! Processor configuration.
//!
//! The host hands the processor a flat string map. [`ProcessorConfig::parse`] validates it against
//! the [`crate::specification`] parameter schema and produces a typed config; compiling the
//! expression is a separate step ([`ProcessorConfig::compile`]) so that a config can be checked and
//! carried around (for example to parallel workers) independently of any compiled matcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::query::{self, CompiledQuery, QueryLanguage};
use crate::specification::{PARAM_QUERY, PARAM_TYPE, Parameter, specification};

/// Raw configuration as supplied by the host: option name to string value.
pub type ConfigMap = BTreeMap<String, String>;

/// Validated processor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Query language used to compile `expression`.
    #[serde(rename = "type")]
    pub backend: QueryLanguage,
    /// Query expression evaluated against every record payload.
    #[serde(rename = "query")]
    pub expression: String,
}

impl ProcessorConfig {
    /// Create a config directly.
    pub fn new(backend: QueryLanguage, expression: impl Into<String>) -> Self {
        Self {
            backend,
            expression: expression.into(),
        }
    }

    /// Validate a host configuration map and build a typed config.
    ///
    /// Rejects unknown keys, missing or empty required keys, and a `type` outside the declared
    /// set. The expression is *not* compiled here; see [`Self::compile`].
    pub fn parse(raw: &ConfigMap) -> ConfigResult<Self> {
        let spec = specification();

        if let Some(unknown) = raw.keys().find(|k| !spec.parameters.contains_key(k.as_str())) {
            return Err(ConfigError::UnrecognizedParameter(unknown.clone()));
        }
        for (name, param) in &spec.parameters {
            validate_parameter(name, param, raw.get(name))?;
        }

        let backend = required(raw, PARAM_TYPE)?.parse::<QueryLanguage>()?;
        let expression = required(raw, PARAM_QUERY)?.to_string();
        Ok(Self { backend, expression })
    }

    /// Check field-level invariants of a config built without [`Self::parse`]
    /// (for example one deserialized from a file).
    pub fn validate(&self) -> ConfigResult<()> {
        if self.expression.trim().is_empty() {
            return Err(ConfigError::EmptyParameter(PARAM_QUERY.to_string()));
        }
        Ok(())
    }

    /// Compile the expression for the configured backend.
    pub fn compile(&self) -> ConfigResult<Box<dyn CompiledQuery>> {
        self.validate()?;
        query::compile(self.backend, &self.expression)
    }
}

impl TryFrom<&ConfigMap> for ProcessorConfig {
    type Error = ConfigError;

    fn try_from(raw: &ConfigMap) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

fn validate_parameter(name: &str, param: &Parameter, value: Option<&String>) -> ConfigResult<()> {
    match value {
        None if param.is_required() => Err(ConfigError::MissingParameter(name.to_string())),
        None => Ok(()),
        Some(v) if param.is_required() && v.trim().is_empty() => {
            Err(ConfigError::EmptyParameter(name.to_string()))
        }
        Some(v) => match param.allowed_values() {
            Some(allowed) if !allowed.iter().any(|a| a == v) => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: v.clone(),
                allowed: allowed.to_vec(),
            }),
            _ => Ok(()),
        },
    }
}

fn required<'a>(raw: &'a ConfigMap, name: &str) -> ConfigResult<&'a str> {
    raw.get(name)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingParameter(name.to_string()))
}
