//! Bridge orchestrator and public API
//!
//! This module provides the main `Bridge` struct that wires the conversion
//! engine, schema and handler registries, and the access layer into one
//! request-dispatching facade.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::path::Path;
use std::sync::Arc;

// Submodules
pub mod access;
pub mod introspect;
pub mod request;
pub mod router;

use crate::convert::{FaultPolicy, SerializeLimits, SerializeOptions, Serializer, ValueParser};
use crate::error::{BridgeError, Result};
use crate::schema::SchemaCatalog;

use introspect::IntrospectAccess;
use router::{HandlerCatalog, HandlerContext, Router, RouterOutcome, builtin_handlers};

/// Configuration for a Gantry bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Maximum serialization recursion depth (0 = unlimited)
    pub max_depth: usize,

    /// Maximum members emitted per collection (0 = unlimited)
    pub max_collection_size: usize,

    /// Maximum nodes serialized per request (0 = unlimited)
    pub max_objects: usize,

    /// Enable debug tracing
    pub debug: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let limits = SerializeLimits::default();
        Self {
            max_depth: limits.max_depth,
            max_collection_size: limits.max_collection_size,
            max_objects: limits.max_objects,
            debug: false,
        }
    }
}

impl BridgeConfig {
    /// The serialization limits this config describes.
    pub fn limits(&self) -> SerializeLimits {
        SerializeLimits {
            max_depth: self.max_depth,
            max_collection_size: self.max_collection_size,
            max_objects: self.max_objects,
        }
    }

    /// Default per-request serialization options.
    pub fn options(&self) -> SerializeOptions {
        SerializeOptions {
            limits: self.limits(),
            fault: FaultPolicy::Propagate,
        }
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|err| BridgeError::Config(format!("{}: {}", path.display(), err)))?;
        serde_json::from_slice(&data)
            .map_err(|err| BridgeError::Config(format!("{}: {}", path.display(), err)))
    }

    /// Save this config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)
            .map_err(|err| BridgeError::Config(err.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| BridgeError::Config(format!("{}: {}", path.display(), err)))?;
        }
        std::fs::write(path, data)
            .map_err(|err| BridgeError::Config(format!("{}: {}", path.display(), err)))
    }
}

/// Outcome of one dispatched request.
///
/// `NotChanged` is a distinguished signal telling the client to keep its
/// cached value. It is never collapsed into a null result.
#[derive(Debug)]
pub enum DispatchResult {
    /// A serialized result value (possibly JSON null)
    Value(Json),
    /// The matched handler reported "not changed"
    NotChanged,
}

/// The main bridge facade
///
/// Wires the serializer, parser, schema snapshot, handler registry, and
/// the access layer. One instance serves concurrent requests: all shared
/// state is immutable after construction.
pub struct Bridge {
    config: BridgeConfig,
    access: Arc<dyn ObjectAccess>,
    serializer: Serializer,
    parser: ValueParser,
    router: Router,
}

impl Bridge {
    /// Create a bridge over the given access layer.
    ///
    /// Snapshots the global schema and handler catalogs; handlers
    /// registered afterwards do not affect this instance.
    pub fn new(config: BridgeConfig, access: Arc<dyn ObjectAccess>) -> anyhow::Result<Self> {
        let schemas = SchemaCatalog::global().snapshot();
        let parser = ValueParser::new(schemas);
        let serializer = Serializer::new();

        let mut handlers = builtin_handlers();
        handlers.extend(HandlerCatalog::global().snapshot());
        let router = Router::new(handlers);

        tracing::info!(
            max_depth = config.max_depth,
            max_collection_size = config.max_collection_size,
            max_objects = config.max_objects,
            "bridge initialized"
        );

        Ok(Self {
            config,
            access,
            serializer,
            parser,
            router,
        })
    }

    /// Create a bridge serving only its own introspection objects.
    pub fn with_introspection(config: BridgeConfig) -> anyhow::Result<Self> {
        let access = Arc::new(IntrospectAccess::new(config.clone()));
        Self::new(config, access)
    }

    /// Create a bridge from a JSON config file.
    pub fn from_config_file(path: &Path, access: Arc<dyn ObjectAccess>) -> anyhow::Result<Self> {
        let config = BridgeConfig::load(path)?;
        Self::new(config, access)
    }

    /// The configuration in effect.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The object-to-JSON converter.
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// The string/JSON-to-value parser.
    pub fn parser(&self) -> &ValueParser {
        &self.parser
    }

    /// Dispatch a parsed request through the handler chain.
    ///
    /// Core operations are required: a request no handler claims is a
    /// routing error. Embedders wanting optional pass-through semantics
    /// drive [`router::Router::dispatch`] directly.
    pub fn dispatch(&self, request: &MgmtRequest) -> Result<DispatchResult> {
        let ctx = HandlerContext {
            access: self.access.as_ref(),
            serializer: &self.serializer,
            parser: &self.parser,
            config: &self.config,
        };
        match self.router.dispatch(&ctx, request, None)? {
            RouterOutcome::Value(value) => Ok(DispatchResult::Value(value)),
            RouterOutcome::NotChanged => Ok(DispatchResult::NotChanged),
            RouterOutcome::Unhandled => Err(BridgeError::Routing(format!(
                "no handler for operation '{}'",
                request.operation.label()
            ))),
        }
    }
}

// Re-export commonly used types
pub use access::{ObjectAccess, ObjectCoordinates};
pub use request::{MgmtRequest, OperationKind};
