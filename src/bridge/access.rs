//! The management-object access layer seam
//!
//! The bridge core never talks to a management host directly; it calls
//! this trait and treats every call as fallible. Access errors pass
//! through the core unchanged (no wrapping, no retries) since retry
//! policy belongs to the access layer itself.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AccessResult;
use crate::value::{MgmtValue, TypeSignature};

/// Address of a managed object, optionally narrowed to one member
/// (an attribute for read/write, an operation for exec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCoordinates {
    /// Object name, e.g. `gantry:type=Config`
    pub object: String,

    /// Attribute or operation name; absent addresses the whole object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl ObjectCoordinates {
    /// Coordinates addressing a whole object.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            object: name.into(),
            member: None,
        }
    }

    /// Coordinates addressing one member of an object.
    pub fn member(object: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            member: Some(member.into()),
        }
    }
}

impl fmt::Display for ObjectCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}#{}", self.object, member),
            None => write!(f, "{}", self.object),
        }
    }
}

/// Narrow interface to the management-object host.
///
/// Implementations may fan out over one or many management servers; the
/// bridge neither knows nor cares. Every method may fail with not-found,
/// access-denied, or I/O conditions, which the core surfaces immediately.
pub trait ObjectAccess: Send + Sync {
    /// Fetch the value addressed by the coordinates.
    fn query(&self, coords: &ObjectCoordinates) -> AccessResult<MgmtValue>;

    /// Replace the value addressed by the coordinates, returning the
    /// previous value.
    fn apply(&self, coords: &ObjectCoordinates, value: MgmtValue) -> AccessResult<MgmtValue>;

    /// Invoke the operation addressed by the coordinates.
    fn invoke(&self, coords: &ObjectCoordinates, args: Vec<MgmtValue>) -> AccessResult<MgmtValue>;

    /// Metadata directory of the reachable objects: names, attribute
    /// signatures, operation signatures. Backs the `list` operation and is
    /// path-navigable like any other value.
    fn describe(&self) -> AccessResult<MgmtValue>;

    /// Declared signature of an attribute, for parsing write input.
    fn attribute_signature(&self, coords: &ObjectCoordinates) -> AccessResult<TypeSignature>;

    /// Declared argument signatures of an operation, for parsing exec input.
    fn operation_signature(&self, coords: &ObjectCoordinates) -> AccessResult<Vec<TypeSignature>>;
}
