//! String/JSON-to-value parsing for write and exec requests
//!
//! The inverse of serialization: given a declared [`TypeSignature`] and a
//! raw string or JSON literal, construct the typed value. Purely
//! functional over its inputs and safe for concurrent use.
//!
//! Two sentinels are recognized in raw input only: `[null]` denotes the
//! null value for any target, and the quoted-empty literal `""` denotes a
//! genuinely empty string. The latter is accepted for string targets
//! alone, since the transport may otherwise swallow empty parameters.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use std::path::PathBuf;

use crate::error::{ConversionError, ConversionResult};
use crate::schema::SchemaSnapshot;
use crate::value::{ArrayValue, CompositeValue, MgmtValue, TabularValue, TypeSignature};

/// Literal recognized as "no value" for any target type.
pub const NULL_SENTINEL: &str = "[null]";

/// Literal recognized as the empty string, for string targets only.
pub const EMPTY_TEXT_SENTINEL: &str = "\"\"";

/// Delimiter splitting raw array input into element literals.
const ARRAY_DELIMITER: char = ',';

/// Typed-value parser bound to a schema snapshot for structured targets.
pub struct ValueParser {
    schemas: SchemaSnapshot,
}

impl ValueParser {
    /// Build a parser over the given schema snapshot.
    pub fn new(schemas: SchemaSnapshot) -> Self {
        Self { schemas }
    }

    /// Parse a raw string literal against the target signature.
    pub fn parse_string(&self, target: &TypeSignature, raw: &str) -> ConversionResult<MgmtValue> {
        if raw == NULL_SENTINEL {
            return Ok(MgmtValue::Null);
        }
        if raw == EMPTY_TEXT_SENTINEL {
            return match target {
                TypeSignature::Text => Ok(MgmtValue::Text(String::new())),
                other => Err(ConversionError::SentinelMismatch {
                    sentinel: EMPTY_TEXT_SENTINEL.to_string(),
                    target: other.to_string(),
                }),
            };
        }

        match target {
            TypeSignature::Bool => raw
                .parse::<bool>()
                .map(MgmtValue::Bool)
                .map_err(|_| unparseable(raw, target)),
            TypeSignature::Int => raw
                .parse::<i32>()
                .map(|num| MgmtValue::Int(i64::from(num)))
                .map_err(|_| unparseable(raw, target)),
            TypeSignature::Long => raw
                .parse::<i64>()
                .map(MgmtValue::Int)
                .map_err(|_| unparseable(raw, target)),
            TypeSignature::Float => raw
                .parse::<f32>()
                .map(|num| MgmtValue::Double(f64::from(num)))
                .map_err(|_| unparseable(raw, target)),
            TypeSignature::Double => raw
                .parse::<f64>()
                .map(MgmtValue::Double)
                .map_err(|_| unparseable(raw, target)),
            TypeSignature::Chr => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(MgmtValue::Chr(ch)),
                    _ => Err(unparseable(raw, target)),
                }
            }
            TypeSignature::Text => Ok(MgmtValue::Text(raw.to_string())),
            TypeSignature::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|ts| MgmtValue::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|_| unparseable(raw, target)),
            TypeSignature::File => Ok(MgmtValue::FileRef(PathBuf::from(raw))),
            TypeSignature::Array(elem) => {
                let items = raw
                    .split(ARRAY_DELIMITER)
                    .map(|part| self.parse_string(elem, part.trim()))
                    .collect::<ConversionResult<Vec<_>>>()?;
                Ok(MgmtValue::Array(ArrayValue {
                    elem: (**elem).clone(),
                    items,
                }))
            }
            TypeSignature::Composite(_) | TypeSignature::Tabular(_) => {
                let parsed: Json =
                    serde_json::from_str(raw).map_err(|_| unparseable(raw, target))?;
                self.parse_json(target, &parsed)
            }
        }
    }

    /// Parse a JSON literal against the target signature.
    ///
    /// JSON strings route through [`ValueParser::parse_string`], so the
    /// sentinels apply there too.
    pub fn parse_json(&self, target: &TypeSignature, value: &Json) -> ConversionResult<MgmtValue> {
        match value {
            Json::Null => Ok(MgmtValue::Null),
            Json::String(text) => self.parse_string(target, text),
            Json::Bool(flag) => match target {
                TypeSignature::Bool => Ok(MgmtValue::Bool(*flag)),
                other => Err(unparseable(&value.to_string(), other)),
            },
            Json::Number(num) => self.parse_number(target, num, value),
            Json::Array(items) => match target {
                TypeSignature::Array(elem) => {
                    let parsed = items
                        .iter()
                        .map(|item| self.parse_json(elem, item))
                        .collect::<ConversionResult<Vec<_>>>()?;
                    Ok(MgmtValue::Array(ArrayValue {
                        elem: (**elem).clone(),
                        items: parsed,
                    }))
                }
                TypeSignature::Tabular(name) => self.parse_rows(name, items),
                other => Err(unparseable(&value.to_string(), other)),
            },
            Json::Object(fields) => match target {
                TypeSignature::Composite(name) => self.parse_composite(name, fields),
                other => Err(unparseable(&value.to_string(), other)),
            },
        }
    }

    fn parse_number(
        &self,
        target: &TypeSignature,
        num: &serde_json::Number,
        original: &Json,
    ) -> ConversionResult<MgmtValue> {
        match target {
            TypeSignature::Int => num
                .as_i64()
                .filter(|n| i32::try_from(*n).is_ok())
                .map(MgmtValue::Int)
                .ok_or_else(|| unparseable(&original.to_string(), target)),
            TypeSignature::Long => num
                .as_i64()
                .map(MgmtValue::Int)
                .ok_or_else(|| unparseable(&original.to_string(), target)),
            TypeSignature::Float | TypeSignature::Double => num
                .as_f64()
                .map(MgmtValue::Double)
                .ok_or_else(|| unparseable(&original.to_string(), target)),
            other => Err(unparseable(&original.to_string(), other)),
        }
    }

    fn parse_composite(
        &self,
        name: &str,
        fields: &serde_json::Map<String, Json>,
    ) -> ConversionResult<MgmtValue> {
        let schema = self
            .schemas
            .composite(name)
            .ok_or_else(|| ConversionError::UnknownSchema(name.to_string()))?;

        for key in fields.keys() {
            if schema.field(key).is_none() {
                return Err(ConversionError::SchemaMismatch {
                    schema: name.to_string(),
                    detail: format!("unexpected field '{}'", key),
                });
            }
        }

        let mut parsed = Vec::with_capacity(schema.fields.len());
        for (field, signature) in &schema.fields {
            let supplied = fields
                .get(field)
                .ok_or_else(|| ConversionError::SchemaMismatch {
                    schema: name.to_string(),
                    detail: format!("missing field '{}'", field),
                })?;
            parsed.push((field.clone(), self.parse_json(signature, supplied)?));
        }
        Ok(MgmtValue::Composite(CompositeValue::new(name, parsed)))
    }

    fn parse_rows(&self, name: &str, items: &[Json]) -> ConversionResult<MgmtValue> {
        let schema = self
            .schemas
            .tabular(name)
            .ok_or_else(|| ConversionError::UnknownSchema(name.to_string()))?;
        let row_target = TypeSignature::Composite(schema.row_schema.clone());

        let mut table = TabularValue::new(name, schema.key_fields.clone());
        for item in items {
            let MgmtValue::Composite(row) = self.parse_json(&row_target, item)? else {
                return Err(ConversionError::SchemaMismatch {
                    schema: name.to_string(),
                    detail: "row is not a composite value".to_string(),
                });
            };
            table
                .push_row(row)
                .map_err(|detail| ConversionError::SchemaMismatch {
                    schema: name.to_string(),
                    detail,
                })?;
        }
        Ok(MgmtValue::Tabular(table))
    }
}

fn unparseable(literal: &str, target: &TypeSignature) -> ConversionError {
    ConversionError::UnparseableLiteral {
        literal: literal.to_string(),
        target: target.to_string(),
    }
}
