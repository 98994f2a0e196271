//! Capability trait for generic managed objects
//!
//! Without runtime reflection, producers of arbitrary management values
//! implement a small attribute-access capability instead. The bridge only
//! ever sees objects through this trait, and uses the `Arc` pointer as the
//! stable identity for cycle detection.

use std::sync::Arc;

use super::MgmtValue;
use crate::error::{AccessError, AccessResult};

/// Attribute-access capability implemented by managed-object producers.
///
/// Implementations must be safe for unsynchronized concurrent reads; writable
/// attributes need interior mutability (the built-in objects use
/// `parking_lot::RwLock`).
pub trait ManagedObject: Send + Sync {
    /// Stable type label used in diagnostics and truncation markers.
    fn type_name(&self) -> &str;

    /// Names of the readable attributes, in presentation order.
    fn attribute_names(&self) -> Vec<String>;

    /// Read a single attribute by name.
    fn attribute(&self, name: &str) -> AccessResult<MgmtValue>;

    /// Replace an attribute value, returning the previous value.
    ///
    /// The default refuses: objects are read-only unless they opt in.
    fn set_attribute(&self, name: &str, value: MgmtValue) -> AccessResult<MgmtValue> {
        let _ = value;
        Err(AccessError::Denied(format!(
            "attribute '{}' of {} is read-only",
            name,
            self.type_name()
        )))
    }
}

/// Shared handle to a managed object.
pub type ObjectRef = Arc<dyn ManagedObject>;

/// Identity of a managed object for cycle detection.
///
/// Two handles share an identity exactly when they point at the same
/// allocation, which is the only way a value graph can alias itself.
pub fn object_identity(object: &ObjectRef) -> usize {
    Arc::as_ptr(object) as *const () as usize
}
