//! The `json.query` processor and the lifecycle hooks the pipeline host drives.
//!
//! The host calls, in order: [`Processor::configure`] (validates and compiles; may fail),
//! [`Processor::open`], [`Processor::process`] once per batch, and [`Processor::teardown`].
//! Configuration happens exactly once before any batch; the compiled query is then read-only for
//! the rest of the processor's life.

use tracing::{error, info};

use crate::config::{ConfigMap, ProcessorConfig};
use crate::error::{ConfigError, ProcessorError};
use crate::execution::ExecutionEngine;
use crate::processing::process_batch;
use crate::query::CompiledQuery;
use crate::specification::{Specification, specification};
use crate::types::{ProcessedRecord, Record};

/// Lifecycle interface implemented by record processors.
pub trait Processor {
    /// Static metadata and parameter schema.
    fn specification(&self) -> Specification;

    /// Validate the host configuration and prepare for processing.
    fn configure(&mut self, config: &ConfigMap) -> Result<(), ProcessorError>;

    /// Signal readiness. Fails if the processor was never configured successfully.
    fn open(&mut self) -> Result<(), ProcessorError>;

    /// Transform one batch. Never fails as a whole; failed records are dropped.
    fn process(&self, records: Vec<Record>) -> Vec<ProcessedRecord>;

    /// Release resources.
    fn teardown(&mut self) -> Result<(), ProcessorError>;
}

/// Compiled state established by a successful `configure`.
#[derive(Debug)]
struct Prepared {
    config: ProcessorConfig,
    query: Box<dyn CompiledQuery>,
}

/// Evaluates a JMESPath or jq query against every record payload and replaces the payload with
/// the result.
///
/// ```rust
/// use json_query_processor::{JsonQueryProcessor, Processor};
/// use json_query_processor::config::ConfigMap;
/// use json_query_processor::types::{Payload, Record};
///
/// let mut p = JsonQueryProcessor::new();
/// let config: ConfigMap = [("type", "jmespath"), ("query", "user.name")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
/// p.configure(&config).unwrap();
/// p.open().unwrap();
///
/// let out = p.process(vec![Record::new(
///     "pos-1",
///     Payload::raw(r#"{"user":{"name":"John Doe","email":"john@example.com"}}"#),
/// )]);
/// assert_eq!(out[0].after(), Some(&Payload::raw("\"John Doe\"")));
/// ```
#[derive(Debug, Default)]
pub struct JsonQueryProcessor {
    prepared: Option<Prepared>,
    engine: Option<ExecutionEngine>,
}

impl JsonQueryProcessor {
    /// Create an unconfigured processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configured processor from a typed config.
    pub fn from_config(config: ProcessorConfig) -> Result<Self, ConfigError> {
        let mut p = Self::new();
        p.apply(config)?;
        Ok(p)
    }

    /// Process large batches on `engine` instead of the caller's thread.
    pub fn with_execution(mut self, engine: ExecutionEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// The active configuration, if configured.
    pub fn config(&self) -> Option<&ProcessorConfig> {
        self.prepared.as_ref().map(|p| &p.config)
    }

    /// Returns true once `configure` has succeeded.
    pub fn is_configured(&self) -> bool {
        self.prepared.is_some()
    }

    fn apply(&mut self, config: ProcessorConfig) -> Result<(), ConfigError> {
        self.prepared = None;
        let query = config.compile()?;
        info!(
            query_type = config.backend.as_str(),
            query = %config.expression,
            "Compiled {} query",
            config.backend
        );
        self.prepared = Some(Prepared { config, query });
        Ok(())
    }
}

impl Processor for JsonQueryProcessor {
    fn specification(&self) -> Specification {
        specification()
    }

    fn configure(&mut self, config: &ConfigMap) -> Result<(), ProcessorError> {
        info!("Configuring json.query processor");
        self.prepared = None;
        let config = ProcessorConfig::parse(config)?;
        self.apply(config)?;
        Ok(())
    }

    fn open(&mut self) -> Result<(), ProcessorError> {
        if !self.is_configured() {
            return Err(ProcessorError::NotConfigured);
        }
        info!("json.query processor opened");
        Ok(())
    }

    fn process(&self, records: Vec<Record>) -> Vec<ProcessedRecord> {
        let Some(prepared) = &self.prepared else {
            error!(dropped = records.len(), "Processor is not configured; dropping batch");
            return Vec::new();
        };

        match &self.engine {
            Some(engine) if engine.should_parallelize(records.len()) => {
                engine.process(&prepared.config, records)
            }
            _ => process_batch(prepared.query.as_ref(), records),
        }
    }

    fn teardown(&mut self) -> Result<(), ProcessorError> {
        info!("json.query processor teardown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionOptions;
    use crate::query::QueryLanguage;
    use crate::types::Payload;

    fn config(kind: &str, query: &str) -> ConfigMap {
        ConfigMap::from([
            ("type".to_string(), kind.to_string()),
            ("query".to_string(), query.to_string()),
        ])
    }

    #[test]
    fn failed_configure_leaves_processor_unconfigured() {
        let mut p = JsonQueryProcessor::new();
        p.configure(&config("jq", ".name")).unwrap();
        assert!(p.is_configured());

        let err = p.configure(&config("jq", ".[invalid")).unwrap_err();
        assert!(matches!(err, ProcessorError::Config(ConfigError::InvalidExpression { .. })));
        assert!(!p.is_configured());
        assert!(matches!(p.open().unwrap_err(), ProcessorError::NotConfigured));
    }

    #[test]
    fn unconfigured_process_drops_everything() {
        let p = JsonQueryProcessor::new();
        let out = p.process(vec![Record::new("1", Payload::raw("{}"))]);
        assert!(out.is_empty());
    }

    #[test]
    fn from_config_and_accessors() {
        let p = JsonQueryProcessor::from_config(ProcessorConfig::new(QueryLanguage::Jq, ".a")).unwrap();
        assert_eq!(p.config().map(|c| c.backend), Some(QueryLanguage::Jq));
        assert_eq!(p.specification().name, "json.query");
        assert!(JsonQueryProcessor::from_config(ProcessorConfig::new(QueryLanguage::Jq, "")).is_err());
    }

    #[test]
    fn large_batches_use_the_engine() {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(2),
            chunk_size: 2,
            parallel_threshold: 4,
        })
        .unwrap();
        let mut p = JsonQueryProcessor::new().with_execution(engine);
        p.configure(&config("jmespath", "n")).unwrap();

        let batch: Vec<Record> = (0..8)
            .map(|i| Record::new(i.to_string().as_str(), Payload::raw(format!(r#"{{"n":{i}}}"#).as_str())))
            .collect();
        let out = p.process(batch);
        let values: Vec<String> = out
            .iter()
            .filter_map(|r| r.after().and_then(Payload::as_raw))
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect();
        assert_eq!(values, ["0", "1", "2", "3", "4", "5", "6", "7"]);
        p.teardown().unwrap();
    }
}
