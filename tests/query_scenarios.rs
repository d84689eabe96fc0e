use json_query_processor::config::ConfigMap;
use json_query_processor::processing::normalize;
use json_query_processor::types::{FieldValue, Payload, Record, StructuredData};
use json_query_processor::{JsonQueryProcessor, Processor};
use serde_json::json;

fn processor(kind: &str, query: &str) -> JsonQueryProcessor {
    let mut p = JsonQueryProcessor::new();
    let config = ConfigMap::from([
        ("type".to_string(), kind.to_string()),
        ("query".to_string(), query.to_string()),
    ]);
    p.configure(&config).unwrap();
    p.open().unwrap();
    p
}

fn raw_text(record: &Record) -> String {
    let raw = record.after().and_then(Payload::as_raw).expect("raw payload");
    String::from_utf8(raw.to_vec()).unwrap()
}

#[test]
fn jmespath_nested_field_from_structured_payload() {
    let p = processor("jmespath", "user.name");
    let input = StructuredData::new().with(
        "user",
        StructuredData::new()
            .with("name", "John Doe")
            .with("email", "john@example.com"),
    );

    let out = p.process(vec![Record::new("test-pos-1", Payload::Structured(input))]);
    assert_eq!(out.len(), 1);
    assert_eq!(raw_text(&out[0]), r#""John Doe""#);
}

#[test]
fn jq_sum_of_prices() {
    let p = processor("jq", ".items | map(.price) | add");
    let item = |name: &str, price: f64| {
        FieldValue::Map(StructuredData::new().with("name", name).with("price", price))
    };
    let input = StructuredData::new().with(
        "items",
        vec![item("apple", 1.5), item("banana", 0.75), item("orange", 2.0)],
    );

    let out = p.process(vec![Record::new("test-pos-2", Payload::Structured(input))]);
    assert_eq!(out.len(), 1);
    assert_eq!(raw_text(&out[0]), "4.25");
}

#[test]
fn jmespath_over_raw_bytes() {
    let p = processor("jmespath", "status");
    let out = p.process(vec![Record::new(
        "test-pos-3",
        Payload::raw(r#"{"status":"active","count":42}"#),
    )]);
    assert_eq!(out.len(), 1);
    assert_eq!(raw_text(&out[0]), r#""active""#);
}

#[test]
fn invalid_raw_json_is_dropped() {
    let p = processor("jmespath", "status");
    let out = p.process(vec![Record::new("test-pos-4", Payload::raw("invalid json"))]);
    assert!(out.is_empty());
}

#[test]
fn jq_object_construction_is_structured() {
    let p = processor("jq", "{name: .user.name, total: (.orders | map(.amount) | add)}");
    let out = p.process(vec![Record::new(
        "test-pos-5",
        Payload::raw(
            r#"{"user":{"name":"Ada","email":"ada@example.com"},
                "orders":[{"amount":19.99},{"amount":5.01},{"amount":0.1}]}"#,
        ),
    )]);
    assert_eq!(out.len(), 1);

    let data = out[0].after().and_then(Payload::as_structured).expect("structured payload");
    assert_eq!(data.len(), 2);
    assert_eq!(data.get("name"), Some(&FieldValue::from("Ada")));
    match data.get("total") {
        Some(FieldValue::Float64(total)) => assert!((total - 25.1).abs() < 1e-9),
        other => panic!("unexpected total: {other:?}"),
    }
}

#[test]
fn list_results_are_wrapped_under_result_key() {
    let p = processor("jmespath", "items[*].id");
    let out = p.process(vec![Record::new(
        "list",
        Payload::raw(r#"{"items":[{"id":1},{"id":2}]}"#),
    )]);
    let value = normalize(out[0].after()).unwrap();
    assert_eq!(value, json!({"result": [1, 2]}));
}

#[test]
fn map_results_pass_through_unwrapped() {
    let p = processor("jq", ".user");
    let out = p.process(vec![Record::new(
        "map",
        Payload::raw(r#"{"user":{"name":"Ada","tags":["x"]}}"#),
    )]);
    let value = normalize(out[0].after()).unwrap();
    assert_eq!(value, json!({"name": "Ada", "tags": ["x"]}));
}

#[test]
fn missing_path_in_jmespath_emits_null() {
    let p = processor("jmespath", "user.phone");
    let out = p.process(vec![Record::new("null", Payload::raw(r#"{"user":{}}"#))]);
    assert_eq!(out.len(), 1);
    assert_eq!(raw_text(&out[0]), "null");
}

#[test]
fn numbers_and_booleans_are_raw_json() {
    let p = processor("jq", ".count");
    let out = p.process(vec![
        Record::new("int", Payload::raw(r#"{"count":42}"#)),
        Record::new("bool", Payload::raw(r#"{"count":true}"#)),
    ]);
    assert_eq!(raw_text(&out[0]), "42");
    assert_eq!(raw_text(&out[1]), "true");
}
