//! Gantry – a path-addressable JSON bridge for runtime management objects
//!
//! This crate implements the serving core of a management-protocol bridge:
//! - Bounded serialization of arbitrarily-shaped (cyclic, deep, large)
//!   management value graphs into JSON documents
//! - A `/`-delimited, escape-aware path mini-language for addressing values
//!   deep inside a graph, including a `*` wildcard with miss filtering
//! - Typed parsing of string/JSON literals for write and exec requests
//! - First-match routing of request descriptors over an ordered set of
//!   pluggable handlers
//! - An NDJSON control-plane service front for embedding or testing
//!
//! Transport, authentication, and the management-object host itself are
//! external collaborators consumed through narrow interfaces.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Bridge orchestrator, request routing, and the access-layer seam
pub mod bridge;
/// Serialization engine: path expressions, extractors, value parsing
pub mod convert;
/// Error taxonomy shared across the crate
pub mod error;
/// Composite and tabular schema registry
pub mod schema;
/// NDJSON control-plane service front
pub mod service;
/// The management value model
pub mod value;

// Re-export key types for convenience
pub use bridge::{Bridge, BridgeConfig};

/// Current version of the Gantry bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version for control plane communication
pub const PROTOCOL_VERSION: &str = "1.0.0";
