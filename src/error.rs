//! Error types for the Gantry bridge
//!
//! Domain errors use thiserror; conversions to wire-level error envelopes
//! happen at the service boundary. Soft serialization limits (depth, object
//! budget, collection size) never raise; breaching them degrades to
//! truncated output instead.

use std::io;
use thiserror::Error;

/// Top-level bridge error
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Path expression grammar violations
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Value extraction / traversal errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// String/JSON-to-value conversion errors
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Errors surfaced unchanged from the management-object access layer
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    /// Request routing errors
    #[error("Routing error: {0}")]
    Routing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Path expression errors
#[derive(Debug, Error)]
pub enum PathError {
    /// A trailing unescaped backslash leaves the escape sequence open
    #[error("Malformed path '{0}': trailing escape character")]
    TrailingEscape(String),
}

/// Convenience result alias for path parsing
pub type PathResult<T> = std::result::Result<T, PathError>;

/// Errors raised while traversing a value graph
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A path segment addresses a member that does not exist
    #[error("Attribute '{segment}' not found on {container}")]
    AttributeNotFound {
        /// The path segment that missed
        segment: String,
        /// Short description of the container that was searched
        container: String,
    },

    /// A numeric path segment is outside the container's bounds
    #[error("Index {index} out of bounds for {container} of length {len}")]
    IndexOutOfBounds {
        /// The index that was requested
        index: usize,
        /// Short description of the indexed container
        container: String,
        /// Number of members actually present
        len: usize,
    },

    /// A path segment addressed an indexed container with a non-numeric key
    #[error("Expected a numeric index for {container}, got '{segment}'")]
    NotAnIndex {
        /// The offending segment
        segment: String,
        /// Short description of the indexed container
        container: String,
    },

    /// Attempted to mutate a read-only value
    #[error("Value of kind {0} is not writable")]
    NotWritable(&'static str),

    /// Internal signal: the fault policy excluded this branch.
    ///
    /// Never surfaced to callers. The serializer converts it into branch
    /// exclusion, and top-level occurrences are rewritten to
    /// `AttributeNotFound` before returning.
    #[error("branch filtered")]
    Filtered,

    /// Access-layer fault encountered mid-traversal, passed through
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl ExtractError {
    /// Build an attribute-miss error for the given segment and container kind.
    pub fn not_found(segment: impl Into<String>, container: impl Into<String>) -> Self {
        ExtractError::AttributeNotFound {
            segment: segment.into(),
            container: container.into(),
        }
    }
}

/// Convenience result alias for extraction
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Errors raised while parsing strings or JSON literals into typed values
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The literal does not parse under the target type's grammar
    #[error("Cannot parse '{literal}' as {target}")]
    UnparseableLiteral {
        /// The offending literal
        literal: String,
        /// Textual form of the target type
        target: String,
    },

    /// The type token itself is not part of the signature grammar
    #[error("Unknown type token '{0}'")]
    UnknownTypeToken(String),

    /// A sentinel was applied to a target that does not accept it
    #[error("Sentinel '{sentinel}' is not valid for target {target}")]
    SentinelMismatch {
        /// The sentinel literal
        sentinel: String,
        /// Textual form of the target type
        target: String,
    },

    /// The target type cannot be constructed from raw input at all
    #[error("Cannot construct values of type {0} from raw input")]
    UnsupportedTarget(String),

    /// No schema registered under the referenced name
    #[error("No schema registered under '{0}'")]
    UnknownSchema(String),

    /// The input shape does not match the registered schema
    #[error("Value does not match schema '{schema}': {detail}")]
    SchemaMismatch {
        /// Schema name
        schema: String,
        /// What went wrong
        detail: String,
    },
}

/// Convenience result alias for value conversion
pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

/// Errors surfaced by the management-object access layer.
///
/// These pass through the bridge core unchanged: no wrapping, no retries.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The addressed object or member does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller may not touch the addressed object or member
    #[error("Access denied: {0}")]
    Denied(String),

    /// I/O failure while talking to the management host
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience result alias for access-layer calls
pub type AccessResult<T> = std::result::Result<T, AccessError>;

/// Result type using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;
