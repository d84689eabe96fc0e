//! `json-query-processor` is a per-record JSON transformation stage for streaming pipelines.
//!
//! It is configured once with a query expression in one of two languages, then evaluates that
//! query against the payload of every record in every batch it is handed and replaces the payload
//! with the query result.
//!
//! ## Query languages
//!
//! - **JMESPath** (`type = "jmespath"`): `user.name`, `items[*].price`, `{id: id, who: user.name}`.
//!   A path that matches nothing yields `null`.
//! - **jq** (`type = "jq"`): `.items | map(.price) | add`. Only the first output of the filter is
//!   used; a filter with no output fails the record.
//!
//! ## Payloads and results
//!
//! A record's payload is either structured (an already-parsed map) or raw bytes holding JSON. Both
//! are normalized into a [`serde_json::Value`] before evaluation. The result is stored back by
//! shape:
//!
//! - object → structured payload, as is
//! - array → structured payload `{"result": [...]}`
//! - string / number / bool / null → raw payload with the JSON text (`"John Doe"`, `4.25`)
//!
//! ## Failures
//!
//! Configuration problems (missing `type`/`query`, unknown `type`, a query that does not compile)
//! are returned from [`Processor::configure`]. Everything that goes wrong with a single record
//! (missing or invalid payload, evaluation failure) is logged through `tracing` with the record's
//! position, and that record is dropped from the output batch. A batch never fails as a whole.
//!
//! ## Quick example
//!
//! ```rust
//! use json_query_processor::{JsonQueryProcessor, Processor, ProcessorConfig, QueryLanguage};
//! use json_query_processor::types::{Payload, Record};
//!
//! let p = JsonQueryProcessor::from_config(ProcessorConfig::new(
//!     QueryLanguage::Jq,
//!     ".items | map(.price) | add",
//! ))
//! .unwrap();
//!
//! let out = p.process(vec![
//!     Record::new("1", Payload::raw(r#"{"items":[{"price":1.5},{"price":0.75},{"price":2.0}]}"#)),
//!     Record::new("2", Payload::raw("invalid json")),
//! ]);
//!
//! assert_eq!(out.len(), 1);
//! assert_eq!(out[0].after(), Some(&Payload::raw("4.25")));
//! ```
//!
//! ## Modules
//!
//! - [`processor`]: the [`Processor`] lifecycle trait and [`JsonQueryProcessor`]
//! - [`processing`]: normalize / evaluate / encode stages and sequential batch orchestration
//! - [`query`]: the two query backends behind [`query::CompiledQuery`]
//! - [`execution`]: optional rayon-backed parallel batch execution
//! - [`config`], [`specification`]: configuration intake and the declared parameter schema
//! - [`types`]: records and payloads
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod processing;
pub mod processor;
pub mod query;
pub mod specification;
pub mod types;

pub use config::{ConfigMap, ProcessorConfig};
pub use error::{ConfigError, EvaluationError, PayloadError, ProcessorError, RecordError};
pub use processor::{JsonQueryProcessor, Processor};
pub use query::QueryLanguage;
