//! The management value model
//!
//! `MgmtValue` is the closed set of shapes the bridge can receive from the
//! access layer: primitives, a handful of "complex but common" native types
//! (timestamps, file references, captured faults), containers, structured
//! composite/tabular records, and the open-ended managed-object case behind
//! the [`ManagedObject`] capability trait.
//!
//! Values are plain owned trees except for `Object`, which is `Arc`-shared
//! and is therefore the only shape that can introduce aliasing or cycles.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::path::PathBuf;

mod object;
mod signature;

pub use object::{ManagedObject, ObjectRef, object_identity};
pub use signature::TypeSignature;

/// A runtime management value handed to the bridge by the access layer.
#[derive(Clone)]
pub enum MgmtValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer (JSON integer precision class)
    Int(i64),
    /// Floating point (JSON decimal precision class)
    Double(f64),
    /// Single character
    Chr(char),
    /// UTF-8 string
    Text(String),
    /// Point in time
    Timestamp(DateTime<Utc>),
    /// Filesystem reference
    FileRef(PathBuf),
    /// Captured fault from the host runtime
    Fault(FaultInfo),
    /// Fixed-size array with a declared element type
    Array(ArrayValue),
    /// Heterogeneous sequence
    Seq(Vec<MgmtValue>),
    /// Key/value map; keys need not be strings
    Map(Vec<(MgmtValue, MgmtValue)>),
    /// Named, fixed-schema record
    Composite(CompositeValue),
    /// Indexed collection of composite rows
    Tabular(TabularValue),
    /// Generic managed object behind the attribute-access capability
    Object(ObjectRef),
}

/// A fault captured from the host runtime, reduced to its stable surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultInfo {
    /// Host-side classification of the fault
    pub class: String,
    /// Human-readable message
    pub message: String,
}

/// Fixed-size array with a declared element signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    /// Declared element type
    pub elem: TypeSignature,
    /// Element values
    pub items: Vec<MgmtValue>,
}

/// A named record of typed fields, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeValue {
    schema: String,
    fields: Vec<(String, MgmtValue)>,
}

impl CompositeValue {
    /// Build a composite from a schema name and ordered fields.
    pub fn new(schema: impl Into<String>, fields: Vec<(String, MgmtValue)>) -> Self {
        Self {
            schema: schema.into(),
            fields,
        }
    }

    /// Name of the schema this record instantiates.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Ordered field name/value pairs.
    pub fn fields(&self) -> &[(String, MgmtValue)] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&MgmtValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// An indexed collection of composite rows keyed by one or more fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularValue {
    schema: String,
    key_fields: Vec<String>,
    rows: Vec<CompositeValue>,
}

impl TabularValue {
    /// Build a tabular value from its row schema name and key fields.
    pub fn new(schema: impl Into<String>, key_fields: Vec<String>) -> Self {
        Self {
            schema: schema.into(),
            key_fields,
            rows: Vec::new(),
        }
    }

    /// Name of the row schema.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Names of the key fields, outermost first.
    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// The rows in insertion order.
    pub fn rows(&self) -> &[CompositeValue] {
        &self.rows
    }

    /// Append a row. Rows missing a key field are rejected.
    pub fn push_row(&mut self, row: CompositeValue) -> Result<(), String> {
        for key in &self.key_fields {
            if row.get(key).is_none() {
                return Err(format!("row is missing key field '{}'", key));
            }
        }
        self.rows.push(row);
        Ok(())
    }
}

impl MgmtValue {
    /// Discriminant used for extractor resolution and diagnostics.
    pub fn kind(&self) -> ValueKind {
        match self {
            MgmtValue::Null => ValueKind::Null,
            MgmtValue::Bool(_) => ValueKind::Bool,
            MgmtValue::Int(_) => ValueKind::Int,
            MgmtValue::Double(_) => ValueKind::Double,
            MgmtValue::Chr(_) => ValueKind::Chr,
            MgmtValue::Text(_) => ValueKind::Text,
            MgmtValue::Timestamp(_) => ValueKind::Timestamp,
            MgmtValue::FileRef(_) => ValueKind::FileRef,
            MgmtValue::Fault(_) => ValueKind::Fault,
            MgmtValue::Array(_) => ValueKind::Array,
            MgmtValue::Seq(_) => ValueKind::Seq,
            MgmtValue::Map(_) => ValueKind::Map,
            MgmtValue::Composite(_) => ValueKind::Composite,
            MgmtValue::Tabular(_) => ValueKind::Tabular,
            MgmtValue::Object(_) => ValueKind::Object,
        }
    }

    /// Convenience accessor for string-ish values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MgmtValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convenience accessor for integer values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MgmtValue::Int(num) => Some(*num),
            _ => None,
        }
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, MgmtValue::Null)
    }

    /// The string a map key serializes under. JSON objects are string-keyed,
    /// so non-string keys collapse to their display form.
    pub fn key_string(&self) -> String {
        match self {
            MgmtValue::Text(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Structural conversion from a JSON tree: arrays become sequences,
    /// objects become string-keyed maps, numbers keep their precision
    /// class. Schema-driven parsing lives in the conversion engine; this
    /// is the generic shape-preserving import.
    pub fn from_json(json: &serde_json::Value) -> MgmtValue {
        match json {
            serde_json::Value::Null => MgmtValue::Null,
            serde_json::Value::Bool(flag) => MgmtValue::Bool(*flag),
            serde_json::Value::Number(num) => match num.as_i64() {
                Some(int) => MgmtValue::Int(int),
                None => MgmtValue::Double(num.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(text) => MgmtValue::Text(text.clone()),
            serde_json::Value::Array(items) => {
                MgmtValue::Seq(items.iter().map(MgmtValue::from_json).collect())
            }
            serde_json::Value::Object(fields) => MgmtValue::Map(
                fields
                    .iter()
                    .map(|(key, value)| {
                        (MgmtValue::Text(key.clone()), MgmtValue::from_json(value))
                    })
                    .collect(),
            ),
        }
    }
}

/// Category of a management value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Absent value
    Null,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Floating point
    Double,
    /// Character
    Chr,
    /// String
    Text,
    /// Point in time
    Timestamp,
    /// Filesystem reference
    FileRef,
    /// Captured fault
    Fault,
    /// Typed array
    Array,
    /// Sequence
    Seq,
    /// Map
    Map,
    /// Composite record
    Composite,
    /// Tabular value
    Tabular,
    /// Managed object
    Object,
}

impl ValueKind {
    /// Stable label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::Chr => "char",
            ValueKind::Text => "string",
            ValueKind::Timestamp => "timestamp",
            ValueKind::FileRef => "file",
            ValueKind::Fault => "fault",
            ValueKind::Array => "array",
            ValueKind::Seq => "seq",
            ValueKind::Map => "map",
            ValueKind::Composite => "composite",
            ValueKind::Tabular => "tabular",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for MgmtValue {
    /// Compact textual form, used as the depth-truncation leaf.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MgmtValue::Null => write!(f, "null"),
            MgmtValue::Bool(flag) => write!(f, "{}", flag),
            MgmtValue::Int(num) => write!(f, "{}", num),
            MgmtValue::Double(num) => write!(f, "{}", num),
            MgmtValue::Chr(ch) => write!(f, "{}", ch),
            MgmtValue::Text(text) => write!(f, "{}", text),
            MgmtValue::Timestamp(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            MgmtValue::FileRef(path) => write!(f, "{}", path.display()),
            MgmtValue::Fault(fault) => write!(f, "{}: {}", fault.class, fault.message),
            MgmtValue::Array(array) => write!(f, "{}[{}]", array.elem, array.items.len()),
            MgmtValue::Seq(items) => write!(f, "seq[{}]", items.len()),
            MgmtValue::Map(entries) => write!(f, "map[{}]", entries.len()),
            MgmtValue::Composite(composite) => write!(f, "composite<{}>", composite.schema()),
            MgmtValue::Tabular(tabular) => {
                write!(f, "tabular<{}>[{}]", tabular.schema(), tabular.rows().len())
            }
            MgmtValue::Object(object) => write!(f, "{}", object.type_name()),
        }
    }
}

impl fmt::Debug for MgmtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MgmtValue::Object(object) => write!(f, "Object({})", object.type_name()),
            MgmtValue::Null => write!(f, "Null"),
            MgmtValue::Bool(flag) => write!(f, "Bool({})", flag),
            MgmtValue::Int(num) => write!(f, "Int({})", num),
            MgmtValue::Double(num) => write!(f, "Double({})", num),
            MgmtValue::Chr(ch) => write!(f, "Chr({:?})", ch),
            MgmtValue::Text(text) => write!(f, "Text({:?})", text),
            MgmtValue::Timestamp(ts) => write!(f, "Timestamp({})", ts.to_rfc3339()),
            MgmtValue::FileRef(path) => write!(f, "FileRef({:?})", path),
            MgmtValue::Fault(fault) => write!(f, "Fault({:?})", fault),
            MgmtValue::Array(array) => write!(f, "Array({:?})", array),
            MgmtValue::Seq(items) => write!(f, "Seq({:?})", items),
            MgmtValue::Map(entries) => write!(f, "Map({:?})", entries),
            MgmtValue::Composite(composite) => write!(f, "Composite({:?})", composite),
            MgmtValue::Tabular(tabular) => write!(f, "Tabular({:?})", tabular),
        }
    }
}

impl PartialEq for MgmtValue {
    fn eq(&self, other: &Self) -> bool {
        use MgmtValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Chr(a), Chr(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (FileRef(a), FileRef(b)) => a == b,
            (Fault(a), Fault(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Seq(a), Seq(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Composite(a), Composite(b)) => a == b,
            (Tabular(a), Tabular(b)) => a == b,
            (Object(a), Object(b)) => std::sync::Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for MgmtValue {
    fn from(flag: bool) -> Self {
        MgmtValue::Bool(flag)
    }
}

impl From<i64> for MgmtValue {
    fn from(num: i64) -> Self {
        MgmtValue::Int(num)
    }
}

impl From<f64> for MgmtValue {
    fn from(num: f64) -> Self {
        MgmtValue::Double(num)
    }
}

impl From<&str> for MgmtValue {
    fn from(text: &str) -> Self {
        MgmtValue::Text(text.to_string())
    }
}

impl From<String> for MgmtValue {
    fn from(text: String) -> Self {
        MgmtValue::Text(text)
    }
}
