//! Per-record pipeline and sequential batch orchestration.

use tracing::{debug, error};

use crate::error::RecordError;
use crate::query::CompiledQuery;
use crate::types::{ProcessedRecord, Record};

use super::{encode, evaluate, normalize};

/// Run one record through normalize → evaluate → encode.
///
/// On success the record comes back with `payload.after` replaced; all other fields are untouched.
pub fn process_record(query: &dyn CompiledQuery, mut record: Record) -> Result<Record, RecordError> {
    let input = normalize(record.after()).map_err(|e| RecordError::new(record.position.clone(), e))?;
    let result = evaluate(query, &record.position, input)?;
    let payload = encode(result).map_err(|e| RecordError::new(record.position.clone(), e))?;

    debug!(
        position = %record.position,
        query_type = query.language().as_str(),
        "Successfully processed record"
    );

    record.payload.after = Some(payload);
    Ok(record)
}

/// Keep successes, log and drop failures.
pub(crate) fn keep_ok(outcome: Result<Record, RecordError>) -> Option<Record> {
    match outcome {
        Ok(record) => Some(record),
        Err(err) => {
            error!(position = %err.position, error = %err.source, "Failed to process record");
            None
        }
    }
}

/// Process a batch sequentially, in input order.
///
/// Failed records are logged with their position and left out of the output. The batch itself
/// never fails.
pub fn process_batch(query: &dyn CompiledQuery, records: Vec<Record>) -> Vec<ProcessedRecord> {
    let received = records.len();
    let out: Vec<ProcessedRecord> = records
        .into_iter()
        .map(|record| process_record(query, record))
        .filter_map(keep_ok)
        .collect();

    debug!(
        received,
        emitted = out.len(),
        dropped = received - out.len(),
        "Processed batch"
    );
    out
}
