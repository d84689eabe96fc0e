use thiserror::Error;

use crate::query::QueryLanguage;
use crate::types::Position;

/// Convenience result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error returned when the processor configuration is rejected.
///
/// All of these surface from `configure`; none are ever deferred to record processing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required parameter is absent.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// A required parameter is present but empty.
    #[error("parameter '{0}' must not be empty")]
    EmptyParameter(String),

    /// The configuration contains a key the specification does not declare.
    #[error("unrecognized parameter '{0}'")]
    UnrecognizedParameter(String),

    /// A parameter value is outside its allowed set.
    #[error("invalid value '{value}' for parameter '{name}' (expected one of: {})", .allowed.join(", "))]
    InvalidValue {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    /// The query expression failed to compile for the selected language.
    #[error("invalid {language} expression: {message}")]
    InvalidExpression {
        language: QueryLanguage,
        message: String,
    },
}

/// Why a record's payload could not be turned into a JSON value tree.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The record carries no usable payload.
    #[error("no data in record payload")]
    Missing,

    /// Raw payload bytes are not valid JSON.
    #[error("invalid JSON payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A structured payload holds a float with no JSON representation (NaN or infinity).
    #[error("non-finite number at '{path}' cannot be represented as JSON")]
    NonFiniteNumber { path: String },
}

/// Coarse classification of a [`PayloadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadErrorKind {
    /// No payload.
    Missing,
    /// Payload present but undecodable.
    Malformed,
}

impl PayloadError {
    /// Classify this error.
    pub fn kind(&self) -> PayloadErrorKind {
        match self {
            Self::Missing => PayloadErrorKind::Missing,
            Self::Malformed(_) | Self::NonFiniteNumber { .. } => PayloadErrorKind::Malformed,
        }
    }
}

/// Query evaluation failure for a single record.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The query produced an empty result sequence.
    #[error("{language} query produced no results")]
    NoResults { language: QueryLanguage },

    /// The backend reported a failure while evaluating.
    #[error("{language} query failed: {message}")]
    Failed {
        language: QueryLanguage,
        message: String,
    },

    /// The backend produced a value that has no payload encoding.
    #[error(transparent)]
    Unrepresentable(#[from] EncodingError),
}

/// The query result could not be re-encoded as a payload.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Serializing the result failed.
    #[error("failed to encode result: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The result holds a float with no JSON representation (NaN or infinity).
    #[error("result has a non-finite number at '{path}' which cannot be represented as JSON")]
    NonFiniteNumber { path: String },
}

/// The stage of the per-record pipeline that failed.
#[derive(Debug, Error)]
pub enum StageError {
    /// Normalization failed.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Evaluation failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Encoding failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A per-record failure, attributed to the record's position.
///
/// These are logged and the record is dropped; they never fail a batch.
#[derive(Debug, Error)]
#[error("record at position '{position}': {source}")]
pub struct RecordError {
    /// Position of the failed record.
    pub position: Position,
    /// What went wrong.
    #[source]
    pub source: StageError,
}

impl RecordError {
    /// Attach a record position to a stage failure.
    pub fn new(position: Position, source: impl Into<StageError>) -> Self {
        Self {
            position,
            source: source.into(),
        }
    }
}

/// Lifecycle errors returned by the processor hooks.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Configuration was rejected.
    #[error("failed to parse config: {0}")]
    Config(#[from] ConfigError),

    /// A hook that requires a configured processor was called before `configure` succeeded.
    #[error("processor is not configured")]
    NotConfigured,
}

/// Failure to set up the parallel execution engine.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Invalid execution options.
    #[error("invalid execution options: {0}")]
    InvalidOptions(String),

    /// The rayon thread pool could not be built.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
