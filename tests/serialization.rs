use chrono::{TimeZone, Utc};
use gantry::convert::{FaultPolicy, SerializeLimits, SerializeOptions, Serializer};
use gantry::error::{AccessError, AccessResult, ExtractError};
use gantry::value::{
    ArrayValue, CompositeValue, FaultInfo, ManagedObject, MgmtValue, ObjectRef, TabularValue,
    TypeSignature,
};
use std::path::PathBuf;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;

fn text(value: &str) -> MgmtValue {
    MgmtValue::Text(value.to_string())
}

fn map(entries: Vec<(&str, MgmtValue)>) -> MgmtValue {
    MgmtValue::Map(
        entries
            .into_iter()
            .map(|(key, value)| (text(key), value))
            .collect(),
    )
}

fn segments(path: &str) -> Vec<String> {
    gantry::convert::split(path).unwrap()
}

fn options() -> SerializeOptions {
    SerializeOptions::default()
}

#[test]
fn null_short_circuits_regardless_of_path() {
    let serializer = Serializer::new();
    let result = serializer
        .serialize(&MgmtValue::Null, &segments("a/b/c"), &options())
        .unwrap();
    assert_eq!(result, serde_json::Value::Null);
}

#[test]
fn deep_path_consumes_all_segments() {
    let serializer = Serializer::new();
    let graph = map(vec![(
        "a",
        map(vec![("b", map(vec![("c", MgmtValue::Int(1))]))]),
    )]);

    let result = serializer
        .serialize(&graph, &segments("a/b/c"), &options())
        .unwrap();
    assert_eq!(result, json!(1));
}

#[test]
fn missing_member_is_attribute_not_found() {
    let serializer = Serializer::new();
    let graph = map(vec![("a", MgmtValue::Int(1))]);

    let err = serializer
        .serialize(&graph, &segments("b"), &options())
        .unwrap_err();
    assert!(matches!(err, ExtractError::AttributeNotFound { .. }));
}

#[test]
fn empty_segment_is_a_literal_empty_key() {
    let serializer = Serializer::new();
    let graph = map(vec![("", MgmtValue::Int(5)), ("a", MgmtValue::Int(1))]);

    // "a//b"-style empty segments address the empty-string key on maps.
    let path = vec![String::new()];
    assert_eq!(
        serializer.serialize(&graph, &path, &options()).unwrap(),
        json!(5)
    );

    let seq = MgmtValue::Seq(vec![MgmtValue::Int(1)]);
    let err = serializer.serialize(&seq, &path, &options()).unwrap_err();
    assert!(matches!(err, ExtractError::NotAnIndex { .. }));
}

#[test]
fn numbers_keep_their_precision_class() {
    let serializer = Serializer::new();

    let int = serializer
        .serialize(&MgmtValue::Int(10), &[], &options())
        .unwrap();
    assert!(int.is_i64());
    assert_eq!(int, json!(10));

    let double = serializer
        .serialize(&MgmtValue::Double(10.5), &[], &options())
        .unwrap();
    assert!(double.is_f64());
}

#[test]
fn collection_truncates_at_the_limit_without_error() {
    let serializer = Serializer::new();
    let items: Vec<MgmtValue> = (0..10).map(MgmtValue::Int).collect();
    let seq = MgmtValue::Seq(items);

    let opts = SerializeOptions {
        limits: SerializeLimits {
            max_collection_size: 3,
            ..SerializeLimits::default()
        },
        fault: FaultPolicy::Propagate,
    };

    let result = serializer.serialize(&seq, &[], &opts).unwrap();
    let array = result.as_array().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array[0], json!(0));
}

#[test]
fn depth_limit_degrades_to_display_strings() {
    let serializer = Serializer::new();
    let graph = map(vec![(
        "a",
        map(vec![("b", map(vec![("c", MgmtValue::Int(1))]))]),
    )]);

    let opts = SerializeOptions {
        limits: SerializeLimits {
            max_depth: 2,
            ..SerializeLimits::default()
        },
        fault: FaultPolicy::Propagate,
    };

    let result = serializer.serialize(&graph, &[], &opts).unwrap();
    assert_eq!(result["a"]["b"], json!("map[1]"));

    // Navigation is free: an explicit path recovers content the depth
    // limit truncated, because counting starts at the addressed value.
    let narrowed = serializer
        .serialize(&graph, &segments("a/b"), &opts)
        .unwrap();
    assert_eq!(narrowed["c"], json!(1));
}

#[test]
fn object_budget_degrades_to_markers() {
    let serializer = Serializer::new();
    let graph = map(vec![
        ("a", MgmtValue::Int(1)),
        ("b", MgmtValue::Int(2)),
        ("c", MgmtValue::Int(3)),
    ]);

    let opts = SerializeOptions {
        limits: SerializeLimits {
            max_objects: 2,
            ..SerializeLimits::default()
        },
        fault: FaultPolicy::Propagate,
    };

    let result = serializer.serialize(&graph, &[], &opts).unwrap();
    assert_eq!(result["a"], json!(1));
    assert_eq!(result["c"], json!("[object budget exceeded]"));
}

#[test]
fn wildcard_fans_out_and_filters_misses() {
    let serializer = Serializer::new();
    let seq = MgmtValue::Seq(vec![
        map(vec![("x", MgmtValue::Int(1))]),
        map(vec![("y", MgmtValue::Int(2))]),
        map(vec![("x", MgmtValue::Int(3))]),
    ]);

    let result = serializer
        .serialize(&seq, &segments("*/x"), &options())
        .unwrap();
    assert_eq!(result, json!([1, 3]));
}

#[test]
fn wildcard_with_no_survivors_yields_an_empty_collection() {
    let serializer = Serializer::new();
    let seq = MgmtValue::Seq(vec![
        map(vec![("y", MgmtValue::Int(2))]),
        map(vec![("z", MgmtValue::Int(4))]),
    ]);

    let result = serializer
        .serialize(&seq, &segments("*/x"), &options())
        .unwrap();
    assert_eq!(result, json!([]));
}

#[test]
fn array_serializes_elements_and_navigates_by_index() {
    let serializer = Serializer::new();
    let array = MgmtValue::Array(ArrayValue {
        elem: TypeSignature::Int,
        items: vec![MgmtValue::Int(10), MgmtValue::Int(20), MgmtValue::Int(30)],
    });

    assert_eq!(
        serializer.serialize(&array, &[], &options()).unwrap(),
        json!([10, 20, 30])
    );
    assert_eq!(
        serializer
            .serialize(&array, &segments("1"), &options())
            .unwrap(),
        json!(20)
    );

    let err = serializer
        .serialize(&array, &segments("9"), &options())
        .unwrap_err();
    assert!(matches!(err, ExtractError::IndexOutOfBounds { .. }));
}

#[test]
fn tabular_values_nest_by_key_fields() {
    let serializer = Serializer::new();
    let mut table = TabularValue::new("props", vec!["name".to_string()]);
    table
        .push_row(CompositeValue::new(
            "prop",
            vec![
                ("name".to_string(), text("alpha")),
                ("value".to_string(), MgmtValue::Int(1)),
            ],
        ))
        .unwrap();
    table
        .push_row(CompositeValue::new(
            "prop",
            vec![
                ("name".to_string(), text("beta")),
                ("value".to_string(), MgmtValue::Int(2)),
            ],
        ))
        .unwrap();
    let table = MgmtValue::Tabular(table);

    let full = serializer.serialize(&table, &[], &options()).unwrap();
    assert_eq!(full["alpha"]["value"], json!(1));
    assert_eq!(full["beta"]["name"], json!("beta"));

    let one = serializer
        .serialize(&table, &segments("alpha/value"), &options())
        .unwrap();
    assert_eq!(one, json!(1));

    let fanned = serializer
        .serialize(&table, &segments("*/value"), &options())
        .unwrap();
    assert_eq!(fanned, json!({"alpha": 1, "beta": 2}));
}

#[test]
fn timestamp_simplifier_exposes_a_fixed_surface() {
    let serializer = Serializer::new();
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let value = MgmtValue::Timestamp(ts);

    let full = serializer.serialize(&value, &[], &options()).unwrap();
    assert_eq!(full, json!("2024-05-01T12:00:00.000Z"));

    let millis = serializer
        .serialize(&value, &segments("epoch_millis"), &options())
        .unwrap();
    assert_eq!(millis, json!(ts.timestamp_millis()));
}

#[test]
fn fault_simplifier_reduces_to_class_and_message() {
    let serializer = Serializer::new();
    let value = MgmtValue::Fault(FaultInfo {
        class: "io.HostUnreachable".to_string(),
        message: "connection refused".to_string(),
    });

    let full = serializer.serialize(&value, &[], &options()).unwrap();
    assert_eq!(
        full,
        json!({"error_class": "io.HostUnreachable", "message": "connection refused"})
    );

    let message = serializer
        .serialize(&value, &segments("message"), &options())
        .unwrap();
    assert_eq!(message, json!("connection refused"));
}

#[test]
fn file_simplifier_reduces_to_path_and_name() {
    let serializer = Serializer::new();
    let value = MgmtValue::FileRef(PathBuf::from("/var/log/bridge.log"));

    let full = serializer.serialize(&value, &[], &options()).unwrap();
    assert_eq!(full["name"], json!("bridge.log"));
    assert_eq!(full["path"], json!("/var/log/bridge.log"));

    let err = serializer
        .serialize(&value, &segments("owner"), &options())
        .unwrap_err();
    assert!(matches!(err, ExtractError::AttributeNotFound { .. }));
}

struct CyclicNode {
    label: String,
    next: RwLock<Option<ObjectRef>>,
}

impl ManagedObject for CyclicNode {
    fn type_name(&self) -> &str {
        "cyclic-node"
    }

    fn attribute_names(&self) -> Vec<String> {
        vec!["label".to_string(), "next".to_string()]
    }

    fn attribute(&self, name: &str) -> AccessResult<MgmtValue> {
        match name {
            "label" => Ok(MgmtValue::Text(self.label.clone())),
            "next" => Ok(match self.next.read().clone() {
                Some(next) => MgmtValue::Object(next),
                None => MgmtValue::Null,
            }),
            other => Err(AccessError::NotFound(other.to_string())),
        }
    }
}

#[test]
fn self_referencing_graphs_terminate_with_a_reference_marker() {
    let serializer = Serializer::new();

    let node = Arc::new(CyclicNode {
        label: "loop".to_string(),
        next: RwLock::new(None),
    });
    *node.next.write() = Some(node.clone());

    let result = serializer
        .serialize(&MgmtValue::Object(node), &[], &options())
        .unwrap();

    assert_eq!(result["label"], json!("loop"));
    assert_eq!(result["next"], json!("[reference to cyclic-node]"));
}

#[test]
fn diamond_shaped_graphs_serialize_both_branches() {
    let serializer = Serializer::new();

    let shared = Arc::new(CyclicNode {
        label: "shared".to_string(),
        next: RwLock::new(None),
    });
    let graph = map(vec![
        ("left", MgmtValue::Object(shared.clone())),
        ("right", MgmtValue::Object(shared.clone())),
    ]);

    let result = serializer.serialize(&graph, &[], &options()).unwrap();
    assert_eq!(result["left"]["label"], json!("shared"));
    assert_eq!(result["right"]["label"], json!("shared"));
}

#[test]
fn raw_extraction_passes_values_through_unconverted() {
    let serializer = Serializer::new();
    let graph = map(vec![("a", map(vec![("b", MgmtValue::Int(7))]))]);

    let raw = serializer.extract_raw(&graph, &segments("a/b")).unwrap();
    assert_eq!(raw, MgmtValue::Int(7));

    let whole = serializer.extract_raw(&graph, &[]).unwrap();
    assert_eq!(whole, graph);
}

#[test]
fn set_inner_replaces_a_slot_and_returns_the_previous_value() {
    let serializer = Serializer::new();
    let mut graph = map(vec![(
        "a",
        MgmtValue::Seq(vec![MgmtValue::Int(1), MgmtValue::Int(2)]),
    )]);

    let previous = serializer
        .set_inner(&mut graph, &segments("a/1"), MgmtValue::Int(9))
        .unwrap();
    assert_eq!(previous, MgmtValue::Int(2));

    let updated = serializer.extract_raw(&graph, &segments("a/1")).unwrap();
    assert_eq!(updated, MgmtValue::Int(9));
}

#[test]
fn composite_values_are_not_writable() {
    let serializer = Serializer::new();
    let mut composite = MgmtValue::Composite(CompositeValue::new(
        "mem",
        vec![("used".to_string(), MgmtValue::Int(10))],
    ));

    let err = serializer
        .set_inner(&mut composite, &segments("used"), MgmtValue::Int(1))
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotWritable(_)));
}
