//! Extractors for structured composite and tabular values
//!
//! Composite records serialize as JSON objects over their declared fields.
//! Tabular values serialize as nested JSON objects, one nesting level per
//! key field, which keeps multi-key lookup and wildcard fan-out symmetric
//! with path navigation: a path supplies one segment per key field before
//! descending into the row itself.

use serde_json::Value as Json;

use super::extract::{Extracted, Extractor, extract_indexed, fan_entries};
use super::path::{PathCursor, WILDCARD};
use super::serializer::{ExtractContext, Serializer};
use crate::error::{ExtractError, ExtractResult};
use crate::value::{CompositeValue, MgmtValue, TabularValue};

/// Extractor for named, fixed-schema records.
pub struct CompositeExtractor;

impl Extractor for CompositeExtractor {
    fn category(&self) -> &'static str {
        "composite"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Composite(composite) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };

        match cursor.next() {
            None => fan_entries(
                serializer,
                ctx,
                composite
                    .fields()
                    .iter()
                    .map(|(name, field)| (name.clone(), field)),
                cursor,
                false,
            ),
            Some((segment, rest)) if segment == WILDCARD => fan_entries(
                serializer,
                ctx,
                composite
                    .fields()
                    .iter()
                    .map(|(name, field)| (name.clone(), field)),
                rest,
                true,
            ),
            Some((segment, rest)) => match composite.get(segment) {
                Some(field) => serializer.child(ctx, field, rest),
                None => Err(ctx
                    .fault()
                    .member_miss(segment, format!("composite<{}>", composite.schema()))),
            },
        }
    }
}

/// Extractor for indexed collections of composite rows.
pub struct TabularExtractor;

impl Extractor for TabularExtractor {
    fn category(&self) -> &'static str {
        "tabular"
    }

    fn extract(
        &self,
        serializer: &Serializer,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let MgmtValue::Tabular(table) = value else {
            return Err(ExtractError::not_found("", self.category()));
        };

        let clipped = ctx.clip_collection(table.rows().len(), self.category());
        let rows: Vec<&CompositeValue> = table.rows()[..clipped].iter().collect();

        // A table without key fields degrades to a plain indexed collection.
        if table.key_fields().is_empty() {
            let composites: Vec<MgmtValue> = rows
                .into_iter()
                .map(|row| MgmtValue::Composite(row.clone()))
                .collect();
            return extract_indexed(serializer, ctx, &composites, cursor, self.category());
        }

        extract_level(serializer, ctx, table, &rows, 0, cursor)
    }
}

/// Navigate or serialize one key level of a tabular value.
fn extract_level(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    table: &TabularValue,
    rows: &[&CompositeValue],
    level: usize,
    cursor: PathCursor<'_>,
) -> ExtractResult<Extracted> {
    if level == table.key_fields().len() {
        // All key segments consumed: descend into the row itself.
        // Duplicate full keys collapse to the last row inserted.
        let Some(row) = rows.last() else {
            return Err(ctx.fault().member_miss("", format!("tabular<{}>", table.schema())));
        };
        let row = MgmtValue::Composite((*row).clone());
        return serializer.child(ctx, &row, cursor);
    }

    let key = table.key_fields()[level].as_str();
    match cursor.next() {
        None => fan_key_groups(serializer, ctx, table, rows, level, key, cursor, false),
        Some((segment, rest)) if segment == WILDCARD => {
            fan_key_groups(serializer, ctx, table, rows, level, key, rest, true)
        }
        Some((segment, rest)) => {
            let group: Vec<&CompositeValue> = rows
                .iter()
                .copied()
                .filter(|row| {
                    row.get(key).map(|value| value.key_string()).as_deref() == Some(segment)
                })
                .collect();
            if group.is_empty() {
                Err(ctx.fault().member_miss(
                    segment,
                    format!("tabular<{}> key '{}'", table.schema(), key),
                ))
            } else {
                extract_level(serializer, ctx, table, &group, level + 1, rest)
            }
        }
    }
}

/// Group rows by one key field and apply the remaining path to each group.
#[allow(clippy::too_many_arguments)]
fn fan_key_groups(
    serializer: &Serializer,
    ctx: &mut ExtractContext,
    table: &TabularValue,
    rows: &[&CompositeValue],
    level: usize,
    key: &str,
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

    for (group_key, group) in group_rows(rows, key) {
        match extract_level(serializer, ctx, table, &group, level + 1, rest) {
            Ok(Extracted::Json(fragment)) => {
                json_out.insert(group_key, fragment);
            }
            Ok(Extracted::Raw(raw)) => raw_out.push((MgmtValue::Text(group_key), raw)),
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

/// Partition rows by the display form of one key field, preserving
/// first-seen group order. Rows missing the key field are skipped.
fn group_rows<'r>(
    rows: &[&'r CompositeValue],
    key: &str,
) -> Vec<(String, Vec<&'r CompositeValue>)> {
    let mut groups: Vec<(String, Vec<&'r CompositeValue>)> = Vec::new();
    for row in rows.iter().copied() {
        let Some(group_key) = row.get(key).map(|value| value.key_string()) else {
            continue;
        };
        match groups.iter_mut().find(|(existing, _)| *existing == group_key) {
            Some((_, members)) => members.push(row),
            None => groups.push((group_key, vec![row])),
        }
    }
    groups
}
