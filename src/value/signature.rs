//! Type signatures for management values
//!
//! A signature names the declared type of an attribute, operation argument,
//! or array element, and drives the string/JSON-to-value parser. The textual
//! grammar is deliberately small: primitive keywords, a `[]` suffix for
//! arrays, and `composite<name>` / `tabular<name>` references into the
//! schema registry.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::MgmtValue;
use crate::error::{ConversionError, ConversionResult};

/// Declared type of a management value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSignature {
    /// Boolean target
    Bool,
    /// 32-bit integer target (range-checked on parse, stored as `Int`)
    Int,
    /// 64-bit integer target
    Long,
    /// 32-bit float target (stored as `Double`)
    Float,
    /// 64-bit float target
    Double,
    /// Single character target
    Chr,
    /// UTF-8 string target
    Text,
    /// RFC3339 timestamp target
    Timestamp,
    /// Filesystem path target
    File,
    /// Fixed-size array with a declared element type
    Array(Box<TypeSignature>),
    /// Composite record registered under the named schema
    Composite(String),
    /// Tabular value registered under the named schema
    Tabular(String),
}

impl TypeSignature {
    /// Parse a signature from its textual token form.
    ///
    /// `"int"`, `"long[]"`, `"composite<thread-info>"` and so on. Unknown
    /// tokens are a conversion error naming the token.
    pub fn parse(token: &str) -> ConversionResult<TypeSignature> {
        let token = token.trim();
        if let Some(elem) = token.strip_suffix("[]") {
            return Ok(TypeSignature::Array(Box::new(TypeSignature::parse(elem)?)));
        }
        if let Some(name) = strip_reference(token, "composite") {
            return Ok(TypeSignature::Composite(name.to_string()));
        }
        if let Some(name) = strip_reference(token, "tabular") {
            return Ok(TypeSignature::Tabular(name.to_string()));
        }

        match token {
            "bool" => Ok(TypeSignature::Bool),
            "int" => Ok(TypeSignature::Int),
            "long" => Ok(TypeSignature::Long),
            "float" => Ok(TypeSignature::Float),
            "double" => Ok(TypeSignature::Double),
            "char" => Ok(TypeSignature::Chr),
            "string" => Ok(TypeSignature::Text),
            "timestamp" => Ok(TypeSignature::Timestamp),
            "file" => Ok(TypeSignature::File),
            other => Err(ConversionError::UnknownTypeToken(other.to_string())),
        }
    }

    /// Infer the signature of an existing value, when one exists.
    ///
    /// Used by inner-path writes to convert raw input against the type of
    /// the slot being replaced. Nulls, faults, and open-ended containers
    /// have no declared signature.
    pub fn of(value: &MgmtValue) -> Option<TypeSignature> {
        match value {
            MgmtValue::Bool(_) => Some(TypeSignature::Bool),
            MgmtValue::Int(_) => Some(TypeSignature::Long),
            MgmtValue::Double(_) => Some(TypeSignature::Double),
            MgmtValue::Chr(_) => Some(TypeSignature::Chr),
            MgmtValue::Text(_) => Some(TypeSignature::Text),
            MgmtValue::Timestamp(_) => Some(TypeSignature::Timestamp),
            MgmtValue::FileRef(_) => Some(TypeSignature::File),
            MgmtValue::Array(array) => Some(TypeSignature::Array(Box::new(array.elem.clone()))),
            MgmtValue::Composite(composite) => {
                Some(TypeSignature::Composite(composite.schema().to_string()))
            }
            MgmtValue::Tabular(tabular) => {
                Some(TypeSignature::Tabular(tabular.schema().to_string()))
            }
            _ => None,
        }
    }
}

fn strip_reference<'a>(token: &'a str, keyword: &str) -> Option<&'a str> {
    token
        .strip_prefix(keyword)?
        .strip_prefix('<')?
        .strip_suffix('>')
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Bool => write!(f, "bool"),
            TypeSignature::Int => write!(f, "int"),
            TypeSignature::Long => write!(f, "long"),
            TypeSignature::Float => write!(f, "float"),
            TypeSignature::Double => write!(f, "double"),
            TypeSignature::Chr => write!(f, "char"),
            TypeSignature::Text => write!(f, "string"),
            TypeSignature::Timestamp => write!(f, "timestamp"),
            TypeSignature::File => write!(f, "file"),
            TypeSignature::Array(elem) => write!(f, "{}[]", elem),
            TypeSignature::Composite(name) => write!(f, "composite<{}>", name),
            TypeSignature::Tabular(name) => write!(f, "tabular<{}>", name),
        }
    }
}
