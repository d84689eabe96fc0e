//! Query evaluation for a single record.

use serde_json::Value;

use crate::error::{EvaluationError, RecordError, StageError};
use crate::query::CompiledQuery;
use crate::types::Position;

/// Evaluate `query` against a normalized payload.
///
/// This is pure dispatch to the compiled backend; failures are attributed to `position`. A result
/// the backend could not represent as JSON is reported as an encoding failure.
pub fn evaluate(query: &dyn CompiledQuery, position: &Position, input: Value) -> Result<Value, RecordError> {
    query.evaluate(input).map_err(|e| {
        let stage = match e {
            EvaluationError::Unrepresentable(e) => StageError::Encoding(e),
            other => StageError::Evaluation(other),
        };
        RecordError::new(position.clone(), stage)
    })
}
