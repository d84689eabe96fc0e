//! Static processor description registered with the pipeline host.
//!
//! The parameter schema here is also what [`crate::config::ProcessorConfig::parse`] validates
//! against, so the declared and enforced configuration cannot drift apart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::query::QueryLanguage;

/// Name the processor is registered under.
pub const PROCESSOR_NAME: &str = "json.query";

/// Configuration key selecting the query language.
pub const PARAM_TYPE: &str = "type";

/// Configuration key holding the query expression.
pub const PARAM_QUERY: &str = "query";

/// Value type of a configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// Free-form string.
    String,
}

/// A validation rule attached to a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Validation {
    /// The parameter must be present and non-empty.
    Required,
    /// The parameter value must be one of the listed strings.
    Inclusion(Vec<String>),
}

/// Declaration of one configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub default: String,
    pub validations: Vec<Validation>,
}

impl Parameter {
    /// Returns true if a [`Validation::Required`] rule is attached.
    pub fn is_required(&self) -> bool {
        self.validations.iter().any(|v| matches!(v, Validation::Required))
    }

    /// Allowed values, if an inclusion rule is attached.
    pub fn allowed_values(&self) -> Option<&[String]> {
        self.validations.iter().find_map(|v| match v {
            Validation::Inclusion(list) => Some(list.as_slice()),
            Validation::Required => None,
        })
    }
}

/// Processor metadata and parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specification {
    pub name: String,
    pub summary: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub parameters: BTreeMap<String, Parameter>,
}

/// The `json.query` processor specification.
pub fn specification() -> Specification {
    let languages = QueryLanguage::ALL
        .iter()
        .map(|l| l.as_str().to_string())
        .collect::<Vec<_>>();

    let mut parameters = BTreeMap::new();
    parameters.insert(
        PARAM_TYPE.to_string(),
        Parameter {
            description: "Query engine type: 'jmespath' or 'jq'".to_string(),
            kind: ParameterType::String,
            default: String::new(),
            validations: vec![Validation::Required, Validation::Inclusion(languages)],
        },
    );
    parameters.insert(
        PARAM_QUERY.to_string(),
        Parameter {
            description: "Query expression to evaluate against JSON payloads".to_string(),
            kind: ParameterType::String,
            default: String::new(),
            validations: vec![Validation::Required],
        },
    );

    Specification {
        name: PROCESSOR_NAME.to_string(),
        summary: "Query and transform JSON payloads using JMESPath or jq expressions".to_string(),
        description: "Evaluates the configured JMESPath or jq query against each record's JSON \
                      payload and replaces the payload with the query result. Object results are \
                      stored as structured data, array results are wrapped under a 'result' key, \
                      and scalar results are stored as raw JSON text. Records that fail are \
                      logged and dropped."
            .to_string(),
        version: concat!("v", env!("CARGO_PKG_VERSION")).to_string(),
        author: "json-query-processor contributors".to_string(),
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_both_parameters_as_required() {
        let spec = specification();
        assert_eq!(spec.name, "json.query");
        assert_eq!(spec.parameters.len(), 2);
        assert!(spec.parameters[PARAM_TYPE].is_required());
        assert!(spec.parameters[PARAM_QUERY].is_required());
        assert_eq!(
            spec.parameters[PARAM_TYPE].allowed_values(),
            Some(&["jmespath".to_string(), "jq".to_string()][..])
        );
        assert_eq!(spec.parameters[PARAM_QUERY].allowed_values(), None);
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(specification()).unwrap();
        assert_eq!(json["parameters"]["type"]["type"], "string");
        assert_eq!(
            json["parameters"]["type"]["validations"][1],
            serde_json::json!({"type": "inclusion", "value": ["jmespath", "jq"]})
        );
        assert_eq!(json["parameters"]["query"]["validations"][0], serde_json::json!({"type": "required"}));
    }
}
