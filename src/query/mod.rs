//! Query backends.
//!
//! Each supported query language compiles an expression once into a [`CompiledQuery`], which is
//! then evaluated against the canonical JSON tree of every record:
//!
//! - [`QueryLanguage::JmesPath`]: path-expression style, one deterministic result. A path that
//!   matches nothing evaluates to `null`.
//! - [`QueryLanguage::Jq`]: filter pipelines that produce a lazy stream of outputs. Only the first
//!   output is pulled; an empty stream or an error as first output fails the record.
//!
//! Adding a language means adding an implementation of [`CompiledQuery`] and a variant here; the
//! batch pipeline never branches on the language.
//!
//! ```rust
//! use json_query_processor::query::{compile, QueryLanguage};
//! use serde_json::json;
//!
//! let query = compile(QueryLanguage::Jq, ".items | map(.price) | add").unwrap();
//! let out = query
//!     .evaluate(json!({"items": [{"price": 1.5}, {"price": 0.75}, {"price": 2.0}]}))
//!     .unwrap();
//! assert_eq!(out, json!(4.25));
//! ```

mod jmes;
mod jq;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, EvaluationError};

pub use jmes::JmesPathQuery;
pub use jq::JqQuery;

/// Supported query languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    /// JMESPath expressions (`user.name`, `items[?price > \`1\`]`).
    JmesPath,
    /// jq filters (`.items | map(.price) | add`).
    Jq,
}

impl QueryLanguage {
    /// All languages, in declaration order.
    pub const ALL: [QueryLanguage; 2] = [QueryLanguage::JmesPath, QueryLanguage::Jq];

    /// Identifier used in configuration (`type` parameter).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JmesPath => "jmespath",
            Self::Jq => "jq",
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::JmesPath => "JMESPath",
            Self::Jq => "jq",
        }
    }
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for QueryLanguage {
    type Err = ConfigError;

    /// Parse a configuration identifier. Matching is exact (`"jq"`, not `"JQ"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "type".to_string(),
                value: s.to_string(),
                allowed: Self::ALL.iter().map(|l| l.as_str().to_string()).collect(),
            })
    }
}

/// A query compiled for one backend.
///
/// Compiled queries are immutable; evaluating one never changes it, so a single instance serves
/// every record of every batch.
pub trait CompiledQuery: fmt::Debug {
    /// Language this query was compiled for.
    fn language(&self) -> QueryLanguage;

    /// Source expression.
    fn expression(&self) -> &str;

    /// Evaluate against one input tree and return exactly one result value.
    fn evaluate(&self, input: Value) -> Result<Value, EvaluationError>;
}

/// Compile `expression` for `language`.
///
/// Syntax errors (and, for jq, references to undefined filters) are reported here as
/// [`ConfigError::InvalidExpression`].
pub fn compile(language: QueryLanguage, expression: &str) -> Result<Box<dyn CompiledQuery>, ConfigError> {
    let query: Box<dyn CompiledQuery> = match language {
        QueryLanguage::JmesPath => Box::new(JmesPathQuery::compile(expression)?),
        QueryLanguage::Jq => Box::new(JqQuery::compile(expression)?),
    };
    Ok(query)
}
