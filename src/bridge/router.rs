//! Request routing over pluggable handlers
//!
//! Handlers self-declare whether they can serve a request; the router
//! iterates them in ascending configured order and the first match wins,
//! with no merging of results. A matched handler may report `NotChanged`,
//! a distinguished signal telling the client to keep a cached value; it
//! is never collapsed into null.
//!
//! Handlers register in a global catalog prior to bridge construction
//! (the built-in operation handlers are always present); each bridge
//! clones an immutable snapshot for deterministic dispatch.

use parking_lot::RwLock;
use serde_json::{Value as Json, json};
use std::sync::{Arc, OnceLock};

use super::BridgeConfig;
use super::access::ObjectAccess;
use super::request::{MgmtRequest, OperationKind};
use crate::convert::{Serializer, ValueParser};
use crate::error::{BridgeError, ConversionError, Result};
use crate::value::{MgmtValue, TypeSignature};

/// What a matched handler produced.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// A serialized result value
    Value(Json),
    /// The client should keep its cached value
    NotChanged,
}

/// What the router produced for a request.
#[derive(Debug)]
pub enum RouterOutcome {
    /// A serialized result value
    Value(Json),
    /// The matched handler reported "not changed"
    NotChanged,
    /// No handler declared itself able to serve the request
    Unhandled,
}

/// Collaborators a handler may use while serving a request.
pub struct HandlerContext<'a> {
    /// The management-object access layer
    pub access: &'a dyn ObjectAccess,
    /// The object-to-JSON converter
    pub serializer: &'a Serializer,
    /// The string/JSON-to-value parser
    pub parser: &'a ValueParser,
    /// Bridge configuration in effect
    pub config: &'a BridgeConfig,
}

/// A pluggable request handler.
pub trait RequestHandler: Send + Sync {
    /// Stable handler name for diagnostics.
    fn name(&self) -> &'static str;

    /// Dispatch rank; lower runs earlier. Built-ins occupy 10–50.
    fn order(&self) -> i32 {
        100
    }

    /// Whether this handler serves the given request.
    fn can_handle(&self, request: &MgmtRequest) -> bool;

    /// When true, the router pre-filters the previous result through the
    /// serializer restricted to the request path before calling `handle`.
    fn uses_path_filtered_value(&self) -> bool {
        false
    }

    /// Serve the request.
    fn handle(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        previous: Option<&Json>,
    ) -> Result<HandlerOutcome>;
}

/// Global catalog of custom request handlers.
pub struct HandlerCatalog {
    handlers: RwLock<Vec<Arc<dyn RequestHandler>>>,
}

static CATALOG: OnceLock<HandlerCatalog> = OnceLock::new();

impl HandlerCatalog {
    /// Access the global catalog singleton.
    pub fn global() -> &'static Self {
        CATALOG.get_or_init(|| HandlerCatalog {
            handlers: RwLock::new(Vec::new()),
        })
    }

    /// Register a handler for all bridges constructed afterwards.
    pub fn register(&self, handler: Arc<dyn RequestHandler>) {
        self.handlers.write().push(handler);
    }

    /// Produce an immutable snapshot for a bridge instance.
    pub fn snapshot(&self) -> Vec<Arc<dyn RequestHandler>> {
        self.handlers.read().clone()
    }
}

/// Ordered, immutable handler set dispatching requests first-match-wins.
pub struct Router {
    handlers: Vec<Arc<dyn RequestHandler>>,
}

impl Router {
    /// Build a router over the given handlers, sorted by ascending order.
    pub fn new(mut handlers: Vec<Arc<dyn RequestHandler>>) -> Self {
        handlers.sort_by_key(|handler| handler.order());
        Self { handlers }
    }

    /// Dispatch a request to the first handler that can serve it.
    pub fn dispatch(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        previous: Option<&Json>,
    ) -> Result<RouterOutcome> {
        for handler in &self.handlers {
            if !handler.can_handle(request) {
                continue;
            }
            tracing::debug!(
                handler = handler.name(),
                operation = request.operation.label(),
                target = %request.coordinates,
                "dispatching request"
            );

            let filtered;
            let prev = match previous {
                Some(json) if handler.uses_path_filtered_value() && !request.path.is_empty() => {
                    let imported = MgmtValue::from_json(json);
                    filtered =
                        ctx.serializer
                            .serialize(&imported, &request.path, &request.options)?;
                    Some(&filtered)
                }
                other => other,
            };

            return match handler.handle(ctx, request, prev)? {
                HandlerOutcome::Value(value) => Ok(RouterOutcome::Value(value)),
                HandlerOutcome::NotChanged => Ok(RouterOutcome::NotChanged),
            };
        }

        tracing::debug!(
            operation = request.operation.label(),
            target = %request.coordinates,
            "no handler matched"
        );
        Ok(RouterOutcome::Unhandled)
    }
}

/// The built-in handlers covering the core operation set.
pub fn builtin_handlers() -> Vec<Arc<dyn RequestHandler>> {
    vec![
        Arc::new(VersionHandler),
        Arc::new(ReadHandler),
        Arc::new(WriteHandler),
        Arc::new(ExecHandler),
        Arc::new(ListHandler),
    ]
}

/// Serves `version` requests from the crate's own constants.
struct VersionHandler;

impl RequestHandler for VersionHandler {
    fn name(&self) -> &'static str {
        "version"
    }

    fn order(&self) -> i32 {
        10
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::Version
    }

    fn handle(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        _previous: Option<&Json>,
    ) -> Result<HandlerOutcome> {
        let info = json!({
            "protocol": crate::PROTOCOL_VERSION,
            "bridge": {
                "version": crate::VERSION,
                "limits": {
                    "max_depth": ctx.config.max_depth,
                    "max_collection_size": ctx.config.max_collection_size,
                    "max_objects": ctx.config.max_objects,
                },
            },
        });
        let value = MgmtValue::from_json(&info);
        let filtered = ctx
            .serializer
            .serialize(&value, &request.path, &request.options)?;
        Ok(HandlerOutcome::Value(filtered))
    }
}

/// Serves `read` requests: fetch, then serialize through the path.
struct ReadHandler;

impl RequestHandler for ReadHandler {
    fn name(&self) -> &'static str {
        "read"
    }

    fn order(&self) -> i32 {
        20
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::Read
    }

    fn handle(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        _previous: Option<&Json>,
    ) -> Result<HandlerOutcome> {
        let value = ctx.access.query(&request.coordinates)?;
        let json = ctx
            .serializer
            .serialize(&value, &request.path, &request.options)?;
        Ok(HandlerOutcome::Value(json))
    }
}

/// Serves `write` requests: parse the raw value against the declared
/// signature, apply (optionally at an inner path), return the previous
/// value serialized.
struct WriteHandler;

impl RequestHandler for WriteHandler {
    fn name(&self) -> &'static str {
        "write"
    }

    fn order(&self) -> i32 {
        30
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::Write
    }

    fn handle(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        _previous: Option<&Json>,
    ) -> Result<HandlerOutcome> {
        let raw = request
            .value
            .as_ref()
            .ok_or_else(|| BridgeError::Routing("write request carries no value".to_string()))?;

        let previous = if request.path.is_empty() {
            let signature = ctx.access.attribute_signature(&request.coordinates)?;
            let typed = ctx.parser.parse_json(&signature, raw)?;
            ctx.access.apply(&request.coordinates, typed)?
        } else {
            // Inner-path write: the raw input converts against the type of
            // the slot being replaced.
            let mut root = ctx.access.query(&request.coordinates)?;
            let current = ctx.serializer.extract_raw(&root, &request.path)?;
            let signature = TypeSignature::of(&current).ok_or_else(|| {
                ConversionError::UnsupportedTarget(current.kind().label().to_string())
            })?;
            let typed = ctx.parser.parse_json(&signature, raw)?;
            let previous = ctx.serializer.set_inner(&mut root, &request.path, typed)?;
            ctx.access.apply(&request.coordinates, root)?;
            previous
        };

        let json = ctx
            .serializer
            .serialize(&previous, &[], &request.options)?;
        Ok(HandlerOutcome::Value(json))
    }
}

/// Serves `exec` requests: parse each argument against the operation's
/// declared signature, invoke, serialize the return value through the path.
struct ExecHandler;

impl RequestHandler for ExecHandler {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn order(&self) -> i32 {
        40
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::Exec
    }

    fn handle(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        _previous: Option<&Json>,
    ) -> Result<HandlerOutcome> {
        let signatures = ctx.access.operation_signature(&request.coordinates)?;
        if signatures.len() != request.arguments.len() {
            return Err(BridgeError::Routing(format!(
                "operation {} expects {} arguments, got {}",
                request.coordinates,
                signatures.len(),
                request.arguments.len()
            )));
        }

        let args = signatures
            .iter()
            .zip(&request.arguments)
            .map(|(signature, raw)| ctx.parser.parse_json(signature, raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let result = ctx.access.invoke(&request.coordinates, args)?;
        let json = ctx
            .serializer
            .serialize(&result, &request.path, &request.options)?;
        Ok(HandlerOutcome::Value(json))
    }
}

/// Serves `list` requests from the access layer's metadata directory.
struct ListHandler;

impl RequestHandler for ListHandler {
    fn name(&self) -> &'static str {
        "list"
    }

    fn order(&self) -> i32 {
        50
    }

    fn can_handle(&self, request: &MgmtRequest) -> bool {
        request.operation == OperationKind::List
    }

    fn handle(
        &self,
        ctx: &HandlerContext<'_>,
        request: &MgmtRequest,
        _previous: Option<&Json>,
    ) -> Result<HandlerOutcome> {
        let directory = ctx.access.describe()?;
        let json = ctx
            .serializer
            .serialize(&directory, &request.path, &request.options)?;
        Ok(HandlerOutcome::Value(json))
    }
}
