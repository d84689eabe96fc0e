//! jq backend (via `jaq`).
//!
//! Filters are parsed and compiled once with the jaq core natives and standard library
//! definitions loaded (`map`, `select`, `add`, ...). Evaluation pulls a single value from the
//! lazy output stream; the rest of the stream is never computed.

use std::fmt;

use jaq_interpret::{Ctx, Filter, FilterT, ParseCtx, RcIter, Val};
use serde_json::Value;

use super::{CompiledQuery, QueryLanguage};
use crate::error::{ConfigError, EncodingError, EvaluationError};

/// A compiled jq filter.
pub struct JqQuery {
    expression: String,
    filter: Filter,
}

impl fmt::Debug for JqQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JqQuery")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

impl JqQuery {
    /// Parse and compile a jq filter.
    pub fn compile(expression: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidExpression {
            language: QueryLanguage::Jq,
            message,
        };

        let mut defs = ParseCtx::new(Vec::new());
        defs.insert_natives(jaq_core::core());
        defs.insert_defs(jaq_std::std());

        let (main, errs) = jaq_parse::parse(expression, jaq_parse::main());
        if !errs.is_empty() {
            let message = errs.iter().map(describe_parse_error).collect::<Vec<_>>().join("; ");
            return Err(invalid(message));
        }
        let main = main.ok_or_else(|| invalid("empty filter".to_string()))?;

        let filter = defs.compile(main);
        if !defs.errs.is_empty() {
            let message = defs
                .errs
                .iter()
                .map(|(err, span)| match expression.get(span.clone()) {
                    Some(text) => format!("{err} `{text}`"),
                    None => err.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(invalid(message));
        }

        Ok(Self {
            expression: expression.to_string(),
            filter,
        })
    }
}

impl CompiledQuery for JqQuery {
    fn language(&self) -> QueryLanguage {
        QueryLanguage::Jq
    }

    fn expression(&self) -> &str {
        &self.expression
    }

    fn evaluate(&self, input: Value) -> Result<Value, EvaluationError> {
        let inputs = RcIter::new(core::iter::empty());
        let mut outputs = self.filter.run((Ctx::new([], &inputs), Val::from(input)));

        match outputs.next() {
            None => Err(EvaluationError::NoResults {
                language: QueryLanguage::Jq,
            }),
            Some(Err(err)) => Err(EvaluationError::Failed {
                language: QueryLanguage::Jq,
                message: err.to_string(),
            }),
            Some(Ok(val)) => match non_finite_path(&val) {
                Some(path) => Err(EncodingError::NonFiniteNumber {
                    path: if path.is_empty() { ".".to_string() } else { path },
                }
                .into()),
                None => Ok(Value::from(val)),
            },
        }
    }
}

/// `Val -> Value` maps NaN and infinity to `null`, so they are caught before conversion.
/// Returns the jq-style path of the first non-finite float, relative to `val`.
fn non_finite_path(val: &Val) -> Option<String> {
    match val {
        Val::Float(f) if !f.is_finite() => Some(String::new()),
        Val::Arr(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| non_finite_path(item).map(|rest| format!("[{i}]{rest}"))),
        Val::Obj(map) => map
            .iter()
            .find_map(|(key, item)| non_finite_path(item).map(|rest| format!(".{key}{rest}"))),
        _ => None,
    }
}

fn describe_parse_error(err: &jaq_parse::Error) -> String {
    let span = err.span();
    let found = match err.found() {
        Some(token) => format!("unexpected `{token}`"),
        None => "unexpected end of input".to_string(),
    };
    let mut expected: Vec<String> = err
        .expected()
        .map(|token| match token {
            Some(token) => format!("`{token}`"),
            None => "end of input".to_string(),
        })
        .collect();
    expected.sort();
    expected.dedup();

    let mut message = format!("Parse error: {found} (column {})", span.start);
    if !expected.is_empty() {
        message.push_str(&format!(", expected one of: {}", expected.join(", ")));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pipeline_sums_floats() {
        let q = JqQuery::compile(".items | map(.price) | add").unwrap();
        let out = q
            .evaluate(json!({"items": [
                {"name": "apple", "price": 1.5},
                {"name": "banana", "price": 0.75},
                {"name": "orange", "price": 2.0}
            ]}))
            .unwrap();
        assert_eq!(out.as_f64(), Some(4.25));
    }

    #[test]
    fn only_first_output_is_taken() {
        let q = JqQuery::compile(".items[]").unwrap();
        let out = q.evaluate(json!({"items": [1, 2, 3]})).unwrap();
        assert_eq!(out, json!(1));
    }

    #[test]
    fn empty_stream_is_no_results() {
        let q = JqQuery::compile(".items[]").unwrap();
        let err = q.evaluate(json!({"items": []})).unwrap_err();
        assert!(matches!(err, EvaluationError::NoResults { .. }));
        assert_eq!(err.to_string(), "jq query produced no results");
    }

    #[test]
    fn error_as_first_output_fails() {
        let q = JqQuery::compile(".name.first").unwrap();
        let err = q.evaluate(json!({"name": "Ada"})).unwrap_err();
        assert!(matches!(err, EvaluationError::Failed { .. }));
        assert!(err.to_string().starts_with("jq query failed: "));
    }

    #[test]
    fn object_construction() {
        let q = JqQuery::compile("{name: .user.name, total: (.orders | map(.amount) | add)}").unwrap();
        let out = q
            .evaluate(json!({
                "user": {"name": "Ada"},
                "orders": [{"amount": 10.25}, {"amount": 4.5}]
            }))
            .unwrap();
        assert_eq!(out["name"], json!("Ada"));
        assert_eq!(out["total"].as_f64(), Some(14.75));
    }

    #[test]
    fn syntax_errors_name_position_and_token() {
        let message = JqQuery::compile(".[invalid").unwrap_err().to_string();
        assert!(message.starts_with("invalid jq expression: Parse error: "), "{message}");
        assert!(message.contains("(column "), "{message}");
        assert!(!message.contains("Simple {"), "{message}");
    }

    #[test]
    fn undefined_filter_error_names_the_filter() {
        let message = JqQuery::compile("no_such_filter(1)").unwrap_err().to_string();
        assert!(message.starts_with("invalid jq expression"), "{message}");
        assert!(message.contains("no_such_filter"), "{message}");
    }

    #[test]
    fn non_finite_results_are_not_turned_into_null() {
        for expr in ["1/0", "infinite", "nan", ".a / .b"] {
            let q = JqQuery::compile(expr).unwrap();
            let err = q.evaluate(json!({"a": 1, "b": 0})).unwrap_err();
            match err {
                EvaluationError::Unrepresentable(EncodingError::NonFiniteNumber { path }) => {
                    assert_eq!(path, ".", "{expr}")
                }
                other => panic!("{expr}: unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn non_finite_inside_a_result_reports_its_path() {
        let q = JqQuery::compile("{total: .a, parts: [1, (.a / .b)]}").unwrap();
        let err = q.evaluate(json!({"a": 1, "b": 0})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "result has a non-finite number at '.parts[1]' which cannot be represented as JSON"
        );
    }
}
