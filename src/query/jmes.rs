//! JMESPath backend.

use std::fmt;

use serde_json::Value;

use super::{CompiledQuery, QueryLanguage};
use crate::error::{ConfigError, EvaluationError};

/// A compiled JMESPath expression.
pub struct JmesPathQuery {
    expression: String,
    compiled: ::jmespath::Expression<'static>,
}

impl fmt::Debug for JmesPathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JmesPathQuery")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

impl JmesPathQuery {
    /// Compile a JMESPath expression against the default function runtime.
    pub fn compile(expression: &str) -> Result<Self, ConfigError> {
        let compiled = ::jmespath::compile(expression).map_err(|e| ConfigError::InvalidExpression {
            language: QueryLanguage::JmesPath,
            message: e.to_string(),
        })?;
        Ok(Self {
            expression: expression.to_string(),
            compiled,
        })
    }

    fn failed(message: impl fmt::Display) -> EvaluationError {
        EvaluationError::Failed {
            language: QueryLanguage::JmesPath,
            message: message.to_string(),
        }
    }
}

impl CompiledQuery for JmesPathQuery {
    fn language(&self) -> QueryLanguage {
        QueryLanguage::JmesPath
    }

    fn expression(&self) -> &str {
        &self.expression
    }

    fn evaluate(&self, input: Value) -> Result<Value, EvaluationError> {
        let result = self.compiled.search(input).map_err(Self::failed)?;
        serde_json::to_value(&*result).map_err(Self::failed)
    }
}
