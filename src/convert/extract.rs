//! Type extractors and their resolution registry
//!
//! An extractor is the type-specific serializer/navigator for one category
//! of management value. The registry is built once per bridge and is
//! immutable afterwards; resolution walks the registered order (exact-type
//! simplifiers first, structural categories next) and falls back to the
//! managed-object extractor, so it never fails.

use serde_json::{Value as Json, json};

use super::path::{PathCursor, WILDCARD};
use super::serializer::{ExtractContext, Serializer};
use super::simplify::{FaultSimplifier, FileSimplifier, ObjectExtractor, TimestampSimplifier};
use super::structured::{CompositeExtractor, TabularExtractor};
use crate::error::{ExtractError, ExtractResult};
use crate::value::{MgmtValue, ValueKind};

/// Result of one extraction step: a JSON fragment, or the raw value when
/// the caller asked for pass-through navigation.
#[derive(Debug)]
pub enum Extracted {
    /// Serialized JSON fragment
    Json(Json),
    /// Raw value pass-through (serialization disabled)
    Raw(MgmtValue),
}

impl Extracted {
    /// Collapse into JSON. Raw fragments render as their display string;
    /// they cannot occur when the context was created in serialize mode.
    pub fn into_json(self) -> Json {
        match self {
            Extracted::Json(value) => value,
            Extracted::Raw(raw) => Json::String(raw.to_string()),
        }
    }

    /// Collapse into a raw value. JSON fragments (truncation markers are
    /// the only ones reachable in raw mode) become text values.
    pub fn into_raw(self) -> MgmtValue {
        match self {
            Extracted::Raw(raw) => raw,
            Extracted::Json(Json::String(text)) => MgmtValue::Text(text),
            Extracted::Json(other) => MgmtValue::Text(other.to_string()),
        }
    }
}

/// A type-specific serializer/navigator unit.
pub trait Extractor: Send + Sync {
    /// Label of the value category this extractor serves.
    fn category(&self) -> &'static str;

    /// Serialize or navigate `value` under the remaining path cursor.
    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted>;

    /// Whether values of this category support member mutation.
    fn can_set(&self) -> bool {
        false
    }

    /// Replace the member addressed by `segment`, returning the previous
    /// value. Only meaningful when [`Extractor::can_set`] is true.
    fn set(
        &self,
        target: &mut MgmtValue,
        segment: &str,
        value: MgmtValue,
    ) -> ExtractResult<MgmtValue> {
        let _ = (segment, value);
        Err(ExtractError::NotWritable(self.category()))
    }
}

/// Dispatch table from value category to extractor.
///
/// Built once at converter initialization; read-only afterwards and safe
/// for unsynchronized concurrent use.
pub struct ExtractorRegistry {
    entries: Vec<(ValueKind, Box<dyn Extractor>)>,
    fallback: Box<dyn Extractor>,
}

impl ExtractorRegistry {
    /// Build the registry with the standard resolution order: simplifiers
    /// first, structural categories next, scalars last. Managed objects
    /// resolve through the fallback.
    pub fn new() -> Self {
        let entries: Vec<(ValueKind, Box<dyn Extractor>)> = vec![
            // Exact-type simplifiers
            (ValueKind::Timestamp, Box::new(TimestampSimplifier)),
            (ValueKind::FileRef, Box::new(FileSimplifier)),
            (ValueKind::Fault, Box::new(FaultSimplifier)),
            // Structural categories
            (ValueKind::Array, Box::new(ArrayExtractor)),
            (ValueKind::Tabular, Box::new(TabularExtractor)),
            (ValueKind::Composite, Box::new(CompositeExtractor)),
            (ValueKind::Seq, Box::new(SeqExtractor)),
            (ValueKind::Map, Box::new(MapExtractor)),
            // Simple values
            (ValueKind::Null, Box::new(ScalarExtractor)),
            (ValueKind::Bool, Box::new(ScalarExtractor)),
            (ValueKind::Int, Box::new(ScalarExtractor)),
            (ValueKind::Double, Box::new(ScalarExtractor)),
            (ValueKind::Chr, Box::new(ScalarExtractor)),
            (ValueKind::Text, Box::new(ScalarExtractor)),
        ];
        Self {
            entries,
            fallback: Box::new(ObjectExtractor),
        }
    }

    /// Resolve the extractor for a value. First registered match wins;
    /// unregistered categories resolve to the managed-object fallback.
    pub fn resolve(&self, value: &MgmtValue) -> &dyn Extractor {
        let kind = value.kind();
        self.entries
            .iter()
            .find(|(registered, _)| *registered == kind)
            .map(|(_, extractor)| extractor.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Extractor for null and simple values.
pub struct ScalarExtractor;

impl Extractor for ScalarExtractor {
    fn category(&self) -> &'static str {
        "scalar"
    }

    fn extract(
        &self,
        _serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        if let Some((segment, _)) = cursor.next() {
            return Err(ctx.fault().member_miss(segment, value.kind().label()));
        }
        Ok(Extracted::Json(scalar_json(value)))
    }
}

/// JSON form of a simple value; numbers keep their precision class.
pub(crate) fn scalar_json(value: &MgmtValue) -> Json {
    match value {
        MgmtValue::Null => Json::Null,
        MgmtValue::Bool(flag) => json!(flag),
        MgmtValue::Int(num) => json!(num),
        MgmtValue::Double(num) => json!(num),
        MgmtValue::Chr(ch) => Json::String(ch.to_string()),
        MgmtValue::Text(text) => Json::String(text.clone()),
        other => Json::String(other.to_string()),
    }
}

/// Extractor for heterogeneous sequences.
pub struct SeqExtractor;

impl Extractor for SeqExtractor {
    fn category(&self) -> &'static str {
        "seq"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Seq(items) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };
        extract_indexed(serializer, ctx, items, cursor, self.category())
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
        let MgmtValue::Seq(items) = target else {
            return Err(ExtractError::NotWritable(self.category()));
        };
        set_indexed(items, segment, value, self.category())
    }
}

/// Extractor for fixed-size typed arrays.
pub struct ArrayExtractor;

impl Extractor for ArrayExtractor {
    fn category(&self) -> &'static str {
        "array"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Array(array) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };
        extract_indexed(serializer, ctx, &array.items, cursor, self.category())
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
        let MgmtValue::Array(array) = target else {
            return Err(ExtractError::NotWritable(self.category()));
        };
        set_indexed(&mut array.items, segment, value, self.category())
    }
}

/// Extractor for key/value maps; non-string keys collapse to their
/// display form in JSON output.
pub struct MapExtractor;

impl Extractor for MapExtractor {
    fn category(&self) -> &'static str {
        "map"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Map(entries) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };

        match cursor.next() {
            None => {
                let clipped = ctx.clip_collection(entries.len(), self.category());
                fan_entries(
                    serializer,
                    ctx,
                    entries
                        .iter()
                        .take(clipped)
                        .map(|(key, entry)| (key.key_string(), entry)),
                    cursor,
                    false,
                )
            }
            Some((segment, rest)) if segment == WILDCARD => {
                let clipped = ctx.clip_collection(entries.len(), self.category());
                fan_entries(
                    serializer,
                    ctx,
                    entries
                        .iter()
                        .take(clipped)
                        .map(|(key, entry)| (key.key_string(), entry)),
                    rest,
                    true,
                )
            }
            Some((segment, rest)) => {
                let found = entries
                    .iter()
                    .find(|(key, _)| key.key_string() == segment)
                    .map(|(_, entry)| entry);
                match found {
                    Some(entry) => serializer.child(ctx, entry, rest),
                    None => Err(ctx.fault().member_miss(segment, self.category())),
                }
            }
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
        let MgmtValue::Map(entries) = target else {
            return Err(ExtractError::NotWritable(self.category()));
        };
        for (key, entry) in entries.iter_mut() {
            if key.key_string() == segment {
                return Ok(std::mem::replace(entry, value));
            }
        }
        entries.push((MgmtValue::Text(segment.to_string()), value));
        Ok(MgmtValue::Null)
    }
}

/// Full-surface or path navigation over an indexed container.
pub(crate) fn extract_indexed(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    items: &[MgmtValue],
    cursor: PathCursor<'_>,
    category: &'static str,
) -> ExtractResult<Extracted> {
    match cursor.next() {
        None => {
            let clipped = ctx.clip_collection(items.len(), category);
            fan_items(serializer, ctx, &items[..clipped], cursor, false)
        }
        Some((segment, rest)) if segment == WILDCARD => {
            let clipped = ctx.clip_collection(items.len(), category);
            fan_items(serializer, ctx, &items[..clipped], rest, true)
        }
        Some((segment, rest)) => {
            let index: usize = match segment.parse() {
                Ok(index) => index,
                Err(_) => {
                    return Err(ctx.fault().miss(ExtractError::NotAnIndex {
                        segment: segment.to_string(),
                        container: category.to_string(),
                    }));
                }
            };
            match items.get(index) {
                Some(item) => serializer.child(ctx, item, rest),
                None => Err(ctx.fault().miss(ExtractError::IndexOutOfBounds {
                    index,
                    container: category.to_string(),
                    len: items.len(),
                })),
            }
        }
    }
}

/// Replace the element addressed by a numeric segment.
fn set_indexed(
    items: &mut [MgmtValue],
    segment: &str,
    value: MgmtValue,
    category: &'static str,
) -> ExtractResult<MgmtValue> {
    let index: usize = segment.parse().map_err(|_| ExtractError::NotAnIndex {
        segment: segment.to_string(),
        container: category.to_string(),
    })?;
    let len = items.len();
    match items.get_mut(index) {
        Some(slot) => Ok(std::mem::replace(slot, value)),
        None => Err(ExtractError::IndexOutOfBounds {
            index,
            container: category.to_string(),
            len,
        }),
    }
}

/// Apply the remaining path to every element of a list-shaped container,
/// excluding filtered branches. `filtering` switches the fault policy for
/// the fan-out, which is how wildcard misses degrade to exclusion.
pub(crate) fn fan_items(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    items: &[MgmtValue],
    rest: PathCursor<'_>,
    filtering: bool,
) -> ExtractResult<Extracted> {
    let previous = ctx.fault();
    if filtering {
        ctx.set_fault_filtering();
    }

    let mut json_out = Vec::new();
    let mut raw_out = Vec::new();
    let mut outcome = Ok(());

    for item in items {
        match serializer.child(ctx, item, rest) {
            Ok(Extracted::Json(fragment)) => json_out.push(fragment),
            Ok(Extracted::Raw(raw)) => raw_out.push(raw),
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
        Ok(Extracted::Json(Json::Array(json_out)))
    } else {
        Ok(Extracted::Raw(MgmtValue::Seq(raw_out)))
    }
}

/// Apply the remaining path to every named member of an object-shaped
/// container, excluding filtered branches.
pub(crate) fn fan_entries<'v>(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    entries: impl Iterator<Item = (String, &'v MgmtValue)>,
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

    for (name, member) in entries {
        match serializer.child(ctx, member, rest) {
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
