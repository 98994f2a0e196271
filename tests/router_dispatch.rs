use gantry::bridge::introspect::{CONFIG_OBJECT, IntrospectAccess, VERSION_OBJECT};
use gantry::bridge::router::{
    HandlerCatalog, HandlerContext, HandlerOutcome, RequestHandler, Router, RouterOutcome,
};
use gantry::bridge::{
    Bridge, BridgeConfig, DispatchResult, MgmtRequest, ObjectCoordinates, OperationKind,
};
use gantry::convert::{Serializer, ValueParser};
use gantry::error::{BridgeError, Result};
use gantry::schema::SchemaCatalog;
use serde_json::{Value, json};
use std::sync::Arc;

fn read_request(object: &str, attribute: &str) -> MgmtRequest {
    MgmtRequest::new(
        OperationKind::Read,
        ObjectCoordinates::member(object, attribute),
    )
}

fn dispatch_value(bridge: &Bridge, request: &MgmtRequest) -> Value {
    match bridge.dispatch(request).unwrap() {
        DispatchResult::Value(value) => value,
        DispatchResult::NotChanged => panic!("unexpected not-changed result"),
    }
}

#[test]
fn read_serves_attributes_through_the_access_layer() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let value = dispatch_value(&bridge, &read_request(VERSION_OBJECT, "version"));
    assert_eq!(value, json!(gantry::VERSION));
}

#[test]
fn read_of_a_whole_object_serializes_every_attribute() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let request = MgmtRequest::new(
        OperationKind::Read,
        ObjectCoordinates::object(VERSION_OBJECT),
    );
    let value = dispatch_value(&bridge, &request);
    assert_eq!(value["protocol"], json!(gantry::PROTOCOL_VERSION));
    assert!(value["features"].as_array().unwrap().contains(&json!("read")));
}

#[test]
fn read_with_a_path_narrows_the_result() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let request =
        read_request(VERSION_OBJECT, "features").with_path(gantry::convert::split("0").unwrap());
    assert_eq!(dispatch_value(&bridge, &request), json!("version"));
}

#[test]
fn write_parses_against_the_declared_signature_and_returns_previous() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let coords = ObjectCoordinates::member(CONFIG_OBJECT, "max_depth");

    let write = MgmtRequest::new(OperationKind::Write, coords.clone()).with_value(json!("5"));
    let previous = dispatch_value(&bridge, &write);
    assert_eq!(previous, json!(16));

    let read_back = dispatch_value(&bridge, &MgmtRequest::new(OperationKind::Read, coords));
    assert_eq!(read_back, json!(5));
}

#[test]
fn write_of_the_wrong_shape_is_a_conversion_error() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let write = MgmtRequest::new(
        OperationKind::Write,
        ObjectCoordinates::member(CONFIG_OBJECT, "max_depth"),
    )
    .with_value(json!("not-a-number"));

    let err = bridge.dispatch(&write).unwrap_err();
    assert!(matches!(err, BridgeError::Conversion(_)));
}

#[test]
fn exec_parses_arguments_and_serializes_the_result() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();

    let ping = MgmtRequest::new(
        OperationKind::Exec,
        ObjectCoordinates::member(VERSION_OBJECT, "ping"),
    );
    assert_eq!(dispatch_value(&bridge, &ping), json!("pong"));

    let echo = MgmtRequest::new(
        OperationKind::Exec,
        ObjectCoordinates::member(VERSION_OBJECT, "echo"),
    )
    .with_arguments(vec![json!("hello")]);
    assert_eq!(dispatch_value(&bridge, &echo), json!("hello"));
}

#[test]
fn exec_with_the_wrong_arity_is_a_routing_error() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let echo = MgmtRequest::new(
        OperationKind::Exec,
        ObjectCoordinates::member(VERSION_OBJECT, "echo"),
    );
    let err = bridge.dispatch(&echo).unwrap_err();
    assert!(matches!(err, BridgeError::Routing(_)));
}

#[test]
fn list_is_path_navigable() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let request = MgmtRequest::new(OperationKind::List, ObjectCoordinates::object(""))
        .with_path(gantry::convert::split("gantry:type=Config/attributes/max_depth").unwrap());
    assert_eq!(dispatch_value(&bridge, &request), json!("long"));
}

#[test]
fn version_reports_protocol_and_limits() {
    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let request = MgmtRequest::new(OperationKind::Version, ObjectCoordinates::object(""));
    let value = dispatch_value(&bridge, &request);
    assert_eq!(value["protocol"], json!(gantry::PROTOCOL_VERSION));
    assert_eq!(value["bridge"]["limits"]["max_depth"], json!(16));
}

struct TaggedHandler {
    tag: &'static str,
    rank: i32,
    outcome: fn() -> HandlerOutcome,
}

impl RequestHandler for TaggedHandler {
    fn name(&self) -> &'static str {
        self.tag
    }

    fn order(&self) -> i32 {
        self.rank
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::Read
    }

    fn handle(
        &self,
        _ctx: &HandlerContext<'_>,
        _request: &MgmtRequest,
        _previous: Option<&Value>,
    ) -> Result<HandlerOutcome> {
        Ok((self.outcome)())
    }
}

fn test_context<'a>(
    access: &'a IntrospectAccess,
    serializer: &'a Serializer,
    parser: &'a ValueParser,
    config: &'a BridgeConfig,
) -> HandlerContext<'a> {
    HandlerContext {
        access,
        serializer,
        parser,
        config,
    }
}

#[test]
fn first_matching_handler_wins_in_ascending_order() {
    let router = Router::new(vec![
        Arc::new(TaggedHandler {
            tag: "late",
            rank: 50,
            outcome: || HandlerOutcome::Value(json!("late")),
        }),
        Arc::new(TaggedHandler {
            tag: "early",
            rank: 5,
            outcome: || HandlerOutcome::Value(json!("early")),
        }),
    ]);

    let access = IntrospectAccess::new(BridgeConfig::default());
    let serializer = Serializer::new();
    let parser = ValueParser::new(SchemaCatalog::global().snapshot());
    let config = BridgeConfig::default();
    let ctx = test_context(&access, &serializer, &parser, &config);

    let outcome = router
        .dispatch(&ctx, &read_request(VERSION_OBJECT, "version"), None)
        .unwrap();
    let RouterOutcome::Value(value) = outcome else {
        panic!("expected a value outcome");
    };
    assert_eq!(value, json!("early"));
}

#[test]
fn not_changed_is_distinguished_from_a_null_value() {
    let access = IntrospectAccess::new(BridgeConfig::default());
    let serializer = Serializer::new();
    let parser = ValueParser::new(SchemaCatalog::global().snapshot());
    let config = BridgeConfig::default();
    let ctx = test_context(&access, &serializer, &parser, &config);
    let request = read_request(VERSION_OBJECT, "version");

    let not_changed = Router::new(vec![Arc::new(TaggedHandler {
        tag: "cached",
        rank: 1,
        outcome: || HandlerOutcome::NotChanged,
    })]);
    assert!(matches!(
        not_changed.dispatch(&ctx, &request, None).unwrap(),
        RouterOutcome::NotChanged
    ));

    let null_value = Router::new(vec![Arc::new(TaggedHandler {
        tag: "nullish",
        rank: 1,
        outcome: || HandlerOutcome::Value(Value::Null),
    })]);
    assert!(matches!(
        null_value.dispatch(&ctx, &request, None).unwrap(),
        RouterOutcome::Value(Value::Null)
    ));
}

#[test]
fn unmatched_requests_report_unhandled() {
    let access = IntrospectAccess::new(BridgeConfig::default());
    let serializer = Serializer::new();
    let parser = ValueParser::new(SchemaCatalog::global().snapshot());
    let config = BridgeConfig::default();
    let ctx = test_context(&access, &serializer, &parser, &config);

    let router = Router::new(vec![]);
    let outcome = router
        .dispatch(&ctx, &read_request(VERSION_OBJECT, "version"), None)
        .unwrap();
    assert!(matches!(outcome, RouterOutcome::Unhandled));
}

struct CatalogProbe;

impl RequestHandler for CatalogProbe {
    fn name(&self) -> &'static str {
        "catalog-probe"
    }

    fn order(&self) -> i32 {
        1
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.coordinates.object == "test:type=CatalogProbe"
    }

    fn handle(
        &self,
        _ctx: &HandlerContext<'_>,
        _request: &MgmtRequest,
        _previous: Option<&Value>,
    ) -> Result<HandlerOutcome> {
        Ok(HandlerOutcome::Value(json!("from-catalog")))
    }
}

#[test]
fn catalog_handlers_join_bridges_constructed_afterwards() {
    HandlerCatalog::global().register(Arc::new(CatalogProbe));

    let bridge = Bridge::with_introspection(BridgeConfig::default()).unwrap();
    let request = read_request("test:type=CatalogProbe", "anything");
    assert_eq!(dispatch_value(&bridge, &request), json!("from-catalog"));
}

struct PreviousEcho;

impl RequestHandler for PreviousEcho {
    fn name(&self) -> &'static str {
        "previous-echo"
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::Read
    }

    fn uses_path_filtered_value(&self) -> bool {
        true
    }

    fn handle(
        &self,
        _ctx: &HandlerContext<'_>,
        _request: &MgmtRequest,
        previous: Option<&Value>,
    ) -> Result<HandlerOutcome> {
        Ok(HandlerOutcome::Value(
            previous.cloned().unwrap_or(Value::Null),
        ))
    }
}

#[test]
fn previous_results_are_filtered_through_the_request_path() {
    let access = IntrospectAccess::new(BridgeConfig::default());
    let serializer = Serializer::new();
    let parser = ValueParser::new(SchemaCatalog::global().snapshot());
    let config = BridgeConfig::default();
    let ctx = test_context(&access, &serializer, &parser, &config);

    let router = Router::new(vec![Arc::new(PreviousEcho)]);
    let request =
        read_request(VERSION_OBJECT, "version").with_path(gantry::convert::split("a/b").unwrap());
    let previous = json!({"a": {"b": 42}});

    let outcome = router.dispatch(&ctx, &request, Some(&previous)).unwrap();
    let RouterOutcome::Value(value) = outcome else {
        panic!("expected a value outcome");
    };
    assert_eq!(value, json!(42));
}
