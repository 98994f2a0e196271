//! Request descriptors
//!
//! A parsed, transport-independent description of one management request.
//! The transport (or the NDJSON service front) builds these; the router
//! dispatches them.

use serde_json::Value as Json;

use super::access::ObjectCoordinates;
use crate::convert::SerializeOptions;

/// The operation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Protocol and bridge version information
    Version,
    /// Read an attribute (or all attributes) of an object
    Read,
    /// Write an attribute, optionally at an inner path
    Write,
    /// Invoke an operation with typed arguments
    Exec,
    /// Metadata directory of the reachable objects
    List,
}

impl OperationKind {
    /// Parse the wire token for an operation.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "version" => Some(OperationKind::Version),
            "read" => Some(OperationKind::Read),
            "write" => Some(OperationKind::Write),
            "exec" => Some(OperationKind::Exec),
            "list" => Some(OperationKind::List),
            _ => None,
        }
    }

    /// Wire token for this operation.
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Version => "version",
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Exec => "exec",
            OperationKind::List => "list",
        }
    }
}

/// A parsed management request.
#[derive(Debug, Clone)]
pub struct MgmtRequest {
    /// Requested operation
    pub operation: OperationKind,

    /// Target coordinates; version/list requests leave the object empty
    pub coordinates: ObjectCoordinates,

    /// Parsed path segments narrowing the result
    pub path: Vec<String>,

    /// Raw value for write requests (string or JSON literal)
    pub value: Option<Json>,

    /// Raw arguments for exec requests
    pub arguments: Vec<Json>,

    /// Serialization options for this request
    pub options: SerializeOptions,
}

impl MgmtRequest {
    /// A request with no path, value, arguments, and default options.
    pub fn new(operation: OperationKind, coordinates: ObjectCoordinates) -> Self {
        Self {
            operation,
            coordinates,
            path: Vec::new(),
            value: None,
            arguments: Vec::new(),
            options: SerializeOptions::default(),
        }
    }

    /// Replace the path segments.
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    /// Attach a raw write value.
    pub fn with_value(mut self, value: Json) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach raw exec arguments.
    pub fn with_arguments(mut self, arguments: Vec<Json>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Replace the serialization options.
    pub fn with_options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }
}
