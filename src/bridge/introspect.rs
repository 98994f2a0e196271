//! Built-in introspection objects
//!
//! An [`ObjectAccess`] implementation exposing the bridge's own version and
//! configuration as managed objects, so the crate is exercisable end-to-end
//! without an external management host. The config object's attributes are
//! writable and govern the values it reports back; the serving bridge's own
//! limits are fixed at construction.

use parking_lot::RwLock;
use std::sync::Arc;

use super::BridgeConfig;
use super::access::{ObjectAccess, ObjectCoordinates};
use crate::error::{AccessError, AccessResult};
use crate::value::{ArrayValue, ManagedObject, MgmtValue, ObjectRef, TypeSignature};

/// Name of the built-in version object.
pub const VERSION_OBJECT: &str = "gantry:type=Version";

/// Name of the built-in config object.
pub const CONFIG_OBJECT: &str = "gantry:type=Config";

struct VersionObject;

impl ManagedObject for VersionObject {
    fn type_name(&self) -> &str {
        "gantry.Version"
    }

    fn attribute_names(&self) -> Vec<String> {
        ["version", "protocol", "features"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn attribute(&self, name: &str) -> AccessResult<MgmtValue> {
        match name {
            "version" => Ok(MgmtValue::Text(crate::VERSION.to_string())),
            "protocol" => Ok(MgmtValue::Text(crate::PROTOCOL_VERSION.to_string())),
            "features" => Ok(MgmtValue::Array(ArrayValue {
                elem: TypeSignature::Text,
                items: ["version", "read", "write", "exec", "list"]
                    .iter()
                    .map(|feature| MgmtValue::Text(feature.to_string()))
                    .collect(),
            })),
            other => Err(AccessError::NotFound(format!(
                "attribute '{}' on {}",
                other, VERSION_OBJECT
            ))),
        }
    }
}

struct ConfigObject {
    state: RwLock<BridgeConfig>,
}

impl ConfigObject {
    fn read_limit(&self, name: &str) -> AccessResult<MgmtValue> {
        let state = self.state.read();
        let value = match name {
            "max_depth" => state.max_depth,
            "max_collection_size" => state.max_collection_size,
            "max_objects" => state.max_objects,
            _ => {
                return Err(AccessError::NotFound(format!(
                    "attribute '{}' on {}",
                    name, CONFIG_OBJECT
                )));
            }
        };
        Ok(MgmtValue::Int(value as i64))
    }
}

impl ManagedObject for ConfigObject {
    fn type_name(&self) -> &str {
        "gantry.Config"
    }

    fn attribute_names(&self) -> Vec<String> {
        ["max_depth", "max_collection_size", "max_objects", "debug"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn attribute(&self, name: &str) -> AccessResult<MgmtValue> {
        match name {
            "debug" => Ok(MgmtValue::Bool(self.state.read().debug)),
            other => self.read_limit(other),
        }
    }

    fn set_attribute(&self, name: &str, value: MgmtValue) -> AccessResult<MgmtValue> {
        let mut state = self.state.write();
        match (name, value) {
            ("debug", MgmtValue::Bool(flag)) => {
                let previous = state.debug;
                state.debug = flag;
                Ok(MgmtValue::Bool(previous))
            }
            ("max_depth", MgmtValue::Int(num)) if num >= 0 => {
                let previous = state.max_depth;
                state.max_depth = num as usize;
                Ok(MgmtValue::Int(previous as i64))
            }
            ("max_collection_size", MgmtValue::Int(num)) if num >= 0 => {
                let previous = state.max_collection_size;
                state.max_collection_size = num as usize;
                Ok(MgmtValue::Int(previous as i64))
            }
            ("max_objects", MgmtValue::Int(num)) if num >= 0 => {
                let previous = state.max_objects;
                state.max_objects = num as usize;
                Ok(MgmtValue::Int(previous as i64))
            }
            ("debug" | "max_depth" | "max_collection_size" | "max_objects", other) => {
                Err(AccessError::Denied(format!(
                    "attribute '{}' rejects values of kind {}",
                    name,
                    other.kind().label()
                )))
            }
            (other, _) => Err(AccessError::NotFound(format!(
                "attribute '{}' on {}",
                other, CONFIG_OBJECT
            ))),
        }
    }
}

/// Access layer over the bridge's own management objects.
pub struct IntrospectAccess {
    version: ObjectRef,
    config: ObjectRef,
}

impl IntrospectAccess {
    /// Build the introspection surface seeded from the given config.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            version: Arc::new(VersionObject),
            config: Arc::new(ConfigObject {
                state: RwLock::new(config),
            }),
        }
    }

    fn object(&self, name: &str) -> AccessResult<&ObjectRef> {
        match name {
            VERSION_OBJECT => Ok(&self.version),
            CONFIG_OBJECT => Ok(&self.config),
            other => Err(AccessError::NotFound(format!("object '{}'", other))),
        }
    }
}

impl ObjectAccess for IntrospectAccess {
    fn query(&self, coords: &ObjectCoordinates) -> AccessResult<MgmtValue> {
        let object = self.object(&coords.object)?;
        match &coords.member {
            None => Ok(MgmtValue::Object(object.clone())),
            Some(attribute) => object.attribute(attribute),
        }
    }

    fn apply(&self, coords: &ObjectCoordinates, value: MgmtValue) -> AccessResult<MgmtValue> {
        let object = self.object(&coords.object)?;
        match &coords.member {
            None => Err(AccessError::Denied(
                "whole-object writes are not supported".to_string(),
            )),
            Some(attribute) => object.set_attribute(attribute, value),
        }
    }

    fn invoke(&self, coords: &ObjectCoordinates, args: Vec<MgmtValue>) -> AccessResult<MgmtValue> {
        if coords.object != VERSION_OBJECT {
            return Err(AccessError::NotFound(format!(
                "no operations on object '{}'",
                coords.object
            )));
        }
        match coords.member.as_deref() {
            Some("ping") => Ok(MgmtValue::Text("pong".to_string())),
            Some("echo") => args
                .into_iter()
                .next()
                .ok_or_else(|| AccessError::NotFound("echo expects one argument".to_string())),
            other => Err(AccessError::NotFound(format!(
                "operation '{}' on {}",
                other.unwrap_or(""),
                VERSION_OBJECT
            ))),
        }
    }

    fn describe(&self) -> AccessResult<MgmtValue> {
        let directory = vec![
            (
                MgmtValue::Text(VERSION_OBJECT.to_string()),
                object_entry(
                    &[
                        ("version", TypeSignature::Text),
                        ("protocol", TypeSignature::Text),
                        (
                            "features",
                            TypeSignature::Array(Box::new(TypeSignature::Text)),
                        ),
                    ],
                    &[("ping", vec![]), ("echo", vec![TypeSignature::Text])],
                ),
            ),
            (
                MgmtValue::Text(CONFIG_OBJECT.to_string()),
                object_entry(
                    &[
                        ("max_depth", TypeSignature::Long),
                        ("max_collection_size", TypeSignature::Long),
                        ("max_objects", TypeSignature::Long),
                        ("debug", TypeSignature::Bool),
                    ],
                    &[],
                ),
            ),
        ];
        Ok(MgmtValue::Map(directory))
    }

    fn attribute_signature(&self, coords: &ObjectCoordinates) -> AccessResult<TypeSignature> {
        let attribute = coords.member.as_deref().ok_or_else(|| {
            AccessError::NotFound(format!("no attribute named in {}", coords))
        })?;
        match (coords.object.as_str(), attribute) {
            (VERSION_OBJECT, "version" | "protocol") => Ok(TypeSignature::Text),
            (VERSION_OBJECT, "features") => {
                Ok(TypeSignature::Array(Box::new(TypeSignature::Text)))
            }
            (CONFIG_OBJECT, "max_depth" | "max_collection_size" | "max_objects") => {
                Ok(TypeSignature::Long)
            }
            (CONFIG_OBJECT, "debug") => Ok(TypeSignature::Bool),
            _ => Err(AccessError::NotFound(format!("attribute {}", coords))),
        }
    }

    fn operation_signature(&self, coords: &ObjectCoordinates) -> AccessResult<Vec<TypeSignature>> {
        match (coords.object.as_str(), coords.member.as_deref()) {
            (VERSION_OBJECT, Some("ping")) => Ok(vec![]),
            (VERSION_OBJECT, Some("echo")) => Ok(vec![TypeSignature::Text]),
            _ => Err(AccessError::NotFound(format!("operation {}", coords))),
        }
    }
}

/// Directory entry for one object: attribute and operation signatures.
fn object_entry(
    attributes: &[(&str, TypeSignature)],
    operations: &[(&str, Vec<TypeSignature>)],
) -> MgmtValue {
    let attributes = attributes
        .iter()
        .map(|(name, signature)| {
            (
                MgmtValue::Text(name.to_string()),
                MgmtValue::Text(signature.to_string()),
            )
        })
        .collect();
    let operations = operations
        .iter()
        .map(|(name, signatures)| {
            (
                MgmtValue::Text(name.to_string()),
                MgmtValue::Seq(
                    signatures
                        .iter()
                        .map(|signature| MgmtValue::Text(signature.to_string()))
                        .collect(),
                ),
            )
        })
        .collect();
    MgmtValue::Map(vec![
        (
            MgmtValue::Text("attributes".to_string()),
            MgmtValue::Map(attributes),
        ),
        (
            MgmtValue::Text("operations".to_string()),
            MgmtValue::Map(operations),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_attributes_round_trip() {
        let access = IntrospectAccess::new(BridgeConfig::default());
        let coords = ObjectCoordinates::member(CONFIG_OBJECT, "max_depth");

        let before = access.query(&coords).unwrap();
        let previous = access.apply(&coords, MgmtValue::Int(5)).unwrap();
        assert_eq!(before, previous);
        assert_eq!(access.query(&coords).unwrap(), MgmtValue::Int(5));
    }

    #[test]
    fn unknown_object_is_not_found() {
        let access = IntrospectAccess::new(BridgeConfig::default());
        let coords = ObjectCoordinates::object("gantry:type=Missing");
        assert!(matches!(
            access.query(&coords),
            Err(AccessError::NotFound(_))
        ));
    }

    #[test]
    fn echo_returns_its_argument() {
        let access = IntrospectAccess::new(BridgeConfig::default());
        let coords = ObjectCoordinates::member(VERSION_OBJECT, "echo");
        let result = access
            .invoke(&coords, vec![MgmtValue::Text("hello".to_string())])
            .unwrap();
        assert_eq!(result, MgmtValue::Text("hello".to_string()));
    }
}
