//! Simplifier extractors and the managed-object fallback
//!
//! A simplifier reduces a complex-but-common native type to a small,
//! hand-picked attribute surface instead of full structural traversal.
//! The managed-object extractor is the generic fallback: it reads whatever
//! attribute surface the producer declared through the capability trait.

use chrono::SecondsFormat;
use serde_json::Value as Json;

use super::extract::{Extracted, Extractor, fan_entries};
use super::path::{PathCursor, WILDCARD};
use super::serializer::{ExtractContext, Serializer};
use crate::error::{ExtractError, ExtractResult};
use crate::value::MgmtValue;

/// Serialize a fixed attribute surface, or navigate into one attribute.
fn extract_surface(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    category: &'static str,
    surface: Vec<(String, MgmtValue)>,
    cursor: PathCursor<'_>,
    full: impl FnOnce() -> Json,
) -> ExtractResult<Extracted> {
    match cursor.next() {
        None => {
            if ctx.serializing() {
                Ok(Extracted::Json(full()))
            } else {
                // Raw mode with an empty cursor is handled by the
                // serializer before dispatch; this arm is unreachable in
                // practice but keeps the contract total.
                Ok(Extracted::Raw(MgmtValue::Map(
                    surface
                        .into_iter()
                        .map(|(name, value)| (MgmtValue::Text(name), value))
                        .collect(),
                )))
            }
        }
        Some((segment, rest)) if segment == WILDCARD => fan_entries(
            serializer,
            ctx,
            surface.iter().map(|(name, value)| (name.clone(), value)),
            rest,
            true,
        ),
        Some((segment, rest)) => match surface.iter().find(|(name, _)| name == segment) {
            Some((_, value)) => serializer.child(ctx, value, rest),
            None => Err(ctx.fault().member_miss(segment, category)),
        },
    }
}

fn surface_json(surface: &[(String, MgmtValue)]) -> Json {
    let mut out = serde_json::Map::new();
    for (name, value) in surface {
        out.insert(name.clone(), super::extract::scalar_json(value));
    }
    Json::Object(out)
}

/// Simplifier for timestamps: serializes as an RFC3339 string, with
/// `iso8601` and `epoch_millis` addressable by path.
pub struct TimestampSimplifier;

impl Extractor for TimestampSimplifier {
    fn category(&self) -> &'static str {
        "timestamp"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Timestamp(ts) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };
        let iso = ts.to_rfc3339_opts(SecondsFormat::Millis, true);
        let surface = vec![
            ("iso8601".to_string(), MgmtValue::Text(iso.clone())),
            ("epoch_millis".to_string(), MgmtValue::Int(ts.timestamp_millis())),
        ];
        extract_surface(serializer, ctx, self.category(), surface, cursor, || {
            Json::String(iso)
        })
    }
}

/// Simplifier for filesystem references: `path` and `name`.
pub struct FileSimplifier;

impl Extractor for FileSimplifier {
    fn category(&self) -> &'static str {
        "file"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::FileRef(path) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let surface = vec![
            ("path".to_string(), MgmtValue::Text(path.display().to_string())),
            ("name".to_string(), MgmtValue::Text(name)),
        ];
        let full = surface_json(&surface);
        extract_surface(serializer, ctx, self.category(), surface, cursor, || full)
    }
}

/// Simplifier for captured faults: `error_class` and `message`.
pub struct FaultSimplifier;

impl Extractor for FaultSimplifier {
    fn category(&self) -> &'static str {
        "fault"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Fault(fault) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };
        let surface = vec![
            ("error_class".to_string(), MgmtValue::Text(fault.class.clone())),
            ("message".to_string(), MgmtValue::Text(fault.message.clone())),
        ];
        let full = surface_json(&surface);
        extract_surface(serializer, ctx, self.category(), surface, cursor, || full)
    }
}

/// Generic fallback over the managed-object capability trait.
pub struct ObjectExtractor;

impl Extractor for ObjectExtractor {
    fn category(&self) -> &'static str {
        "object"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Object(object) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };

        match cursor.next() {
            None => fan_attributes(serializer, ctx, object.as_ref(), cursor, false),
            Some((segment, rest)) if segment == WILDCARD => {
                fan_attributes(serializer, ctx, object.as_ref(), rest, true)
            }
            Some((segment, rest)) => match object.attribute(segment) {
                Ok(attribute) => serializer.child(ctx, &attribute, rest),
                Err(fault) => Err(ctx.fault().access_fault(fault)),
            },
        }
    }

    fn can_set(&self) -> bool {
        true
    }

    fn set(
        &self,
        target: &mut MgmtValue,
        segment: &str,
        value: MgmtValue,
    ) -> ExtractResult<MgmtValue> {
        let MgmtValue::Object(object) = target else {
            return Err(ExtractError::NotWritable(self.category()));
        };
        object
            .set_attribute(segment, value)
            .map_err(ExtractError::Access)
    }
}

/// Read every attribute and apply the remaining path, excluding filtered
/// branches. Attribute reads route through the fault policy, so an
/// attribute that legitimately does not apply is skipped under filtering
/// and propagates otherwise.
fn fan_attributes(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    object: &dyn crate::value::ManagedObject,
    rest: PathCursor<'_>,
    filtering: bool,
) -> ExtractResult<Extracted> {
    let previous = ctx.fault();
    if filtering {
        ctx.set_fault_filtering();
    }

    let mut json_out = serde_json::Map::new();
    let mut raw_out = Vec::new();
    let mut outcome = Ok(());

    for name in object.attribute_names() {
        let attribute = match object.attribute(&name) {
            Ok(attribute) => attribute,
            Err(fault) => match ctx.fault().access_fault(fault) {
                ExtractError::Filtered => continue,
                err => {
                    outcome = Err(err);
                    break;
                }
            },
        };
        match serializer.child(ctx, &attribute, rest) {
            Ok(Extracted::Json(fragment)) => {
                json_out.insert(name, fragment);
            }
            Ok(Extracted::Raw(raw)) => raw_out.push((MgmtValue::Text(name), raw)),
            Err(ExtractError::Filtered) => continue,
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }

    ctx.restore_fault(previous);
    outcome?;

    if ctx.serializing() {
        Ok(Extracted::Json(Json::Object(json_out)))
    } else {
        Ok(Extracted::Raw(MgmtValue::Map(raw_out)))
    }
}
