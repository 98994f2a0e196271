//! The conversion engine
//!
//! Outbound: [`Serializer`] turns management value graphs into bounded
//! JSON, navigating path expressions and degrading gracefully at the
//! configured limits. Inbound: [`ValueParser`] turns string/JSON literals
//! into typed values for write and exec requests.
//!
//! The extractor registry is built once per serializer and immutable
//! afterwards; every top-level call owns its own traversal state, so one
//! engine serves concurrent requests without locking.

pub mod extract;
pub mod fault;
pub mod parse;
pub mod path;
pub mod serializer;
pub mod simplify;
pub mod structured;

pub use extract::{Extracted, Extractor, ExtractorRegistry};
pub use fault::FaultPolicy;
pub use parse::{EMPTY_TEXT_SENTINEL, NULL_SENTINEL, ValueParser};
pub use path::{PathCursor, WILDCARD, join, split};
pub use serializer::{SerializeLimits, SerializeOptions, Serializer};
