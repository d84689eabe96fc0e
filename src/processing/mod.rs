//! The record transformation pipeline.
//!
//! Each record goes through three stages:
//!
//! - [`normalize()`]: payload (structured map or raw JSON bytes) → canonical [`serde_json::Value`]
//! - [`evaluate()`]: compiled query applied to that value
//! - [`encode()`]: result → payload, chosen by the result's shape
//!
//! [`process_batch`] drives the stages over a batch and drops (and logs) every record that fails
//! any stage, so one bad record never sinks the batch.
//!
//! ## Example
//!
//! ```rust
//! use json_query_processor::processing::process_batch;
//! use json_query_processor::query::{compile, QueryLanguage};
//! use json_query_processor::types::{Payload, Record};
//!
//! let query = compile(QueryLanguage::JmesPath, "status").unwrap();
//! let batch = vec![
//!     Record::new("a", Payload::raw(r#"{"status":"active","count":42}"#)),
//!     Record::new("b", Payload::raw("invalid json")),
//! ];
//!
//! let out = process_batch(query.as_ref(), batch);
//! assert_eq!(out.len(), 1);
//! assert_eq!(out[0].after(), Some(&Payload::raw("\"active\"")));
//! ```

pub mod batch;
pub mod encode;
pub mod evaluate;
pub mod normalize;

pub use batch::{process_batch, process_record};
pub use encode::{encode, LIST_RESULT_KEY};
pub use evaluate::evaluate;
pub use normalize::normalize;
