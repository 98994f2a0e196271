use gantry::service::Service;
use gantry::{Bridge, BridgeConfig};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

struct SharedWriter(Rc<RefCell<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_session(lines: Vec<String>) -> Vec<Value> {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();

    let sink = Rc::new(RefCell::new(Vec::<u8>::new()));
    let writer = SharedWriter(sink.clone());
    let mut service = Service::new(bridge, writer);

    let reader = Cursor::new(format!("{}\n", lines.join("\n")));
    service.run(reader).unwrap();

    let output = sink.borrow();
    output
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice::<Value>(line).unwrap())
        .collect()
}

fn encode(requests: Vec<Value>) -> Vec<String> {
    requests
        .into_iter()
        .map(|request| serde_json::to_string(&request).unwrap())
        .collect()
}

fn handshake(id: u64) -> Value {
    json!({"id": id, "command": "handshake", "params": {
        "client": "test",
        "protocol_version": gantry::PROTOCOL_VERSION,
    }})
}

#[test]
fn service_handles_basic_commands() {
    let requests = vec![
        json!({"id": 1, "command": "version", "params": {}}),
        json!({"id": 2, "command": "handshake", "params": {"client": "test", "protocol_version": "0.0.1"}}),
        handshake(3),
        json!({"id": 4, "command": "version", "params": {}}),
        json!({"id": 5, "command": "read", "params": {"object": "gantry:type=Config", "attribute": "max_depth"}}),
        json!({"id": 6, "command": "write", "params": {"object": "gantry:type=Config", "attribute": "max_depth", "value": "5"}}),
        json!({"id": 7, "command": "read", "params": {"object": "gantry:type=Config", "attribute": "max_depth"}}),
        json!({"id": 8, "command": "exec", "params": {"object": "gantry:type=Version", "operation": "ping"}}),
        json!({"id": 9, "command": "exec", "params": {"object": "gantry:type=Version", "operation": "echo", "arguments": ["hello"]}}),
        json!({"id": 10, "command": "list", "params": {"path": "gantry:type=Config/attributes/debug"}}),
        json!({"id": 11, "command": "noop", "params": {}}),
    ];

    let lines = run_session(encode(requests));
    assert_eq!(lines.len(), 11);

    assert_eq!(lines[0]["error"]["code"], "protocol_error");
    assert_eq!(lines[1]["error"]["code"], "protocol_error");
    assert!(lines[2]["result"].is_object());
    assert_eq!(
        lines[3]["result"]["value"]["protocol"],
        json!(gantry::PROTOCOL_VERSION)
    );
    assert_eq!(lines[4]["result"]["value"], json!(16));
    assert_eq!(lines[5]["result"]["value"], json!(16));
    assert_eq!(lines[6]["result"]["value"], json!(5));
    assert_eq!(lines[7]["result"]["value"], json!("pong"));
    assert_eq!(lines[8]["result"]["value"], json!("hello"));
    assert_eq!(lines[9]["result"]["value"], json!("bool"));
    assert_eq!(lines[10]["error"]["code"], "unsupported_command");
}

#[test]
fn errors_carry_stable_codes() {
    let requests = vec![
        handshake(1),
        json!({"id": 2, "command": "read", "params": {"object": "gantry:type=Version", "attribute": "version", "path": "broken\\"}}),
        json!({"id": 3, "command": "read", "params": {"object": "gantry:type=Missing", "attribute": "x"}}),
        json!({"id": 4, "command": "read", "params": {}}),
        json!({"id": 5, "command": "write", "params": {"object": "gantry:type=Config", "attribute": "max_depth", "value": "nope"}}),
        json!({"id": 6, "command": "read", "params": {"object": "gantry:type=Version", "attribute": "features", "path": "9"}}),
    ];

    let lines = run_session(encode(requests));
    assert_eq!(lines.len(), 6);

    assert!(lines[0]["result"].is_object());
    assert_eq!(lines[1]["error"]["code"], "malformed_path");
    assert_eq!(lines[2]["error"]["code"], "not_found");
    assert_eq!(lines[3]["error"]["code"], "invalid_params");
    assert_eq!(lines[4]["error"]["code"], "type_conversion");
    assert_eq!(lines[5]["error"]["code"], "attribute_not_found");
}

#[test]
fn unparseable_lines_produce_parse_errors() {
    let lines = run_session(vec!["this is not json".to_string()]);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["error"]["code"], "parse_error");
    assert_eq!(lines[0]["id"], Value::Null);
}

#[test]
fn request_params_override_serialization_limits() {
    let requests = vec![
        handshake(1),
        json!({"id": 2, "command": "read", "params": {
            "object": "gantry:type=Version",
            "attribute": "features",
            "max_collection_size": 2,
        }}),
    ];

    let lines = run_session(encode(requests));
    let features = lines[1]["result"]["value"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0], json!("version"));
}

#[test]
fn blank_lines_are_ignored() {
    let lines = run_session(vec![
        String::new(),
        serde_json::to_string(&handshake(1)).unwrap(),
        "   ".to_string(),
    ]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0]["result"].is_object());
}
