//! Object-to-JSON serialization: the central traversal algorithm
//!
//! A depth-first, path-consuming recursive descent with three terminal
//! conditions (null, cycle, depth limit) and one branching condition
//! (path empty vs non-empty) at every non-terminal node. Limit breaches
//! degrade to truncated output; they never raise.
//!
//! Every top-level call owns its own [`ExtractContext`] (visited set,
//! counters), so concurrent serializations share nothing but the immutable
//! extractor registry.

use serde_json::Value as Json;
use std::collections::HashSet;

use super::extract::{Extracted, ExtractorRegistry};
use super::fault::FaultPolicy;
use super::path::{self, PathCursor};
use crate::error::{ExtractError, ExtractResult};
use crate::value::{MgmtValue, object_identity};

/// Soft limits bounding one serialization call. Zero disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeLimits {
    /// Maximum recursion depth before values collapse to display strings
    pub max_depth: usize,
    /// Maximum members emitted per collection
    pub max_collection_size: usize,
    /// Maximum total nodes serialized per call
    pub max_objects: usize,
}

impl Default for SerializeLimits {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_collection_size: 1000,
            max_objects: 10000,
        }
    }
}

/// Per-call serialization options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Soft limits for this call
    pub limits: SerializeLimits,
    /// Fault policy for member lookup failures
    pub fault: FaultPolicy,
}

/// Mutable state owned by one top-level extraction call.
pub struct ExtractContext {
    serialize: bool,
    fault: FaultPolicy,
    limits: SerializeLimits,
    // Depth and object budgets count serialized nodes only: path
    // navigation is free, so a deeper path can always recover content a
    // shallower query saw truncated.
    started: bool,
    depth: usize,
    objects_seen: usize,
    visited: HashSet<usize>,
}

impl ExtractContext {
    fn new(serialize: bool, options: &SerializeOptions) -> Self {
        Self {
            serialize,
            fault: options.fault,
            limits: options.limits,
            started: false,
            depth: 0,
            objects_seen: 0,
            visited: HashSet::new(),
        }
    }

    /// Fault policy currently in effect.
    pub fn fault(&self) -> FaultPolicy {
        self.fault
    }

    /// Whether this call produces JSON (as opposed to raw pass-through).
    pub fn serializing(&self) -> bool {
        self.serialize
    }

    /// Number of members a collection may emit, with truncation logged.
    pub fn clip_collection(&self, len: usize, category: &str) -> usize {
        let limit = self.limits.max_collection_size;
        if limit > 0 && len > limit {
            tracing::debug!(category, len, limit, "collection truncated");
            limit
        } else {
            len
        }
    }

    pub(crate) fn set_fault_filtering(&mut self) {
        self.fault = FaultPolicy::Filter;
    }

    pub(crate) fn restore_fault(&mut self, policy: FaultPolicy) {
        self.fault = policy;
    }

    fn depth_exceeded(&self) -> bool {
        self.limits.max_depth > 0 && self.depth >= self.limits.max_depth
    }

    fn count_node(&mut self) -> bool {
        self.objects_seen += 1;
        self.limits.max_objects > 0 && self.objects_seen > self.limits.max_objects
    }
}

/// The object-to-JSON converter.
///
/// Holds the immutable extractor registry; one instance serves any number
/// of concurrent calls.
pub struct Serializer {
    registry: ExtractorRegistry,
}

impl Serializer {
    /// Build a serializer with the standard extractor registry.
    pub fn new() -> Self {
        Self {
            registry: ExtractorRegistry::new(),
        }
    }

    /// Serialize a value into JSON, navigating the path first.
    ///
    /// Returns `AttributeNotFound` when the path addresses a member that
    /// does not exist (under the propagate policy). The internal filtered
    /// signal never escapes: a fully filtered extraction also reports
    /// `AttributeNotFound`.
    pub fn serialize(
        &self,
        value: &MgmtValue,
        path: &[String],
        options: &SerializeOptions,
    ) -> ExtractResult<Json> {
        let mut ctx = ExtractContext::new(true, options);
        match self.descend(&mut ctx, value, PathCursor::new(path)) {
            Ok(extracted) => Ok(extracted.into_json()),
            Err(ExtractError::Filtered) => {
                Err(ExtractError::not_found(path::join(path), value.kind().label()))
            }
            Err(err) => Err(err),
        }
    }

    /// Navigate the path and return the addressed value unconverted.
    ///
    /// Soft limits do not apply: recursion is bounded by the path length,
    /// and write operations need the true value at the slot.
    pub fn extract_raw(&self, value: &MgmtValue, path: &[String]) -> ExtractResult<MgmtValue> {
        let options = SerializeOptions::default();
        let mut ctx = ExtractContext::new(false, &options);
        match self.descend(&mut ctx, value, PathCursor::new(path)) {
            Ok(extracted) => Ok(extracted.into_raw()),
            Err(ExtractError::Filtered) => {
                Err(ExtractError::not_found(path::join(path), value.kind().label()))
            }
            Err(err) => Err(err),
        }
    }

    /// Recurse into a child value, tracking depth once serialization of
    /// the addressed value has begun.
    pub(crate) fn child(
        &self,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        let counted = ctx.started;
        if counted {
            ctx.depth += 1;
        }
        let out = self.descend(ctx, value, cursor);
        if counted {
            ctx.depth -= 1;
        }
        // Siblings still being navigated must not inherit a subtree's
        // started flag, or fan-out members would count uneven depths.
        ctx.started = counted;
        out
    }

    /// One node of the traversal: terminal checks, then extractor dispatch.
    pub(crate) fn descend(
        &self,
        ctx: &mut ExtractContext,
        value: &MgmtValue,
        cursor: PathCursor<'_>,
    ) -> ExtractResult<Extracted> {
        // Terminal: null wins over path and limits alike.
        if value.is_null() {
            return Ok(if ctx.serialize {
                Extracted::Json(Json::Null)
            } else {
                Extracted::Raw(MgmtValue::Null)
            });
        }

        // Raw pass-through once the path is fully consumed.
        if !ctx.serialize && cursor.is_empty() {
            return Ok(Extracted::Raw(value.clone()));
        }

        // Terminal: a true cycle collapses to a bounded reference marker.
        let object_id = match value {
            MgmtValue::Object(object) => {
                let id = object_identity(object);
                if ctx.visited.contains(&id) {
                    return Ok(marker(ctx, format!("[reference to {}]", object.type_name())));
                }
                Some(id)
            }
            _ => None,
        };

        if ctx.serialize {
            if cursor.is_empty() {
                ctx.started = true;
            }
            if ctx.started {
                // Terminal: depth limit collapses the branch to its display form.
                if ctx.depth_exceeded() {
                    tracing::debug!(depth = ctx.depth, "depth limit reached, emitting string leaf");
                    return Ok(marker(ctx, value.to_string()));
                }
                if ctx.count_node() {
                    tracing::debug!(
                        limit = ctx.limits.max_objects,
                        "object budget exhausted, truncating branch"
                    );
                    return Ok(marker(ctx, "[object budget exceeded]".to_string()));
                }
            }
        }

        if let Some(id) = object_id {
            ctx.visited.insert(id);
        }
        let out = self.registry.resolve(value).extract(self, ctx, value, cursor);
        if let Some(id) = object_id {
            // Removed on exit so diamond-shaped graphs may revisit siblings.
            ctx.visited.remove(&id);
        }
        out
    }

    /// Replace the member addressed by `path` inside `root`, returning the
    /// previous value. Navigation through a managed object reads the
    /// attribute, mutates the copy, and writes it back.
    pub fn set_inner(
        &self,
        root: &mut MgmtValue,
        path: &[String],
        value: MgmtValue,
    ) -> ExtractResult<MgmtValue> {
        let Some((first, rest)) = path.split_first() else {
            return Err(ExtractError::NotWritable(root.kind().label()));
        };

        if rest.is_empty() {
            let extractor = self.registry.resolve(root);
            if !extractor.can_set() {
                return Err(ExtractError::NotWritable(root.kind().label()));
            }
            return extractor.set(root, first, value);
        }

        match root {
            MgmtValue::Seq(items) => {
                let len = items.len();
                let slot = indexed_slot(items, first, "seq", len)?;
                self.set_inner(slot, rest, value)
            }
            MgmtValue::Array(array) => {
                let len = array.items.len();
                let slot = indexed_slot(&mut array.items, first, "array", len)?;
                self.set_inner(slot, rest, value)
            }
            MgmtValue::Map(entries) => {
                for (key, slot) in entries.iter_mut() {
                    if key.key_string() == *first {
                        return self.set_inner(slot, rest, value);
                    }
                }
                Err(ExtractError::not_found(first.clone(), "map"))
            }
            MgmtValue::Object(object) => {
                let mut inner = object.attribute(first)?;
                let previous = self.set_inner(&mut inner, rest, value)?;
                object.set_attribute(first, inner)?;
                Ok(previous)
            }
            MgmtValue::Composite(_) | MgmtValue::Tabular(_) => {
                Err(ExtractError::NotWritable(root.kind().label()))
            }
            other => Err(ExtractError::not_found(first.clone(), other.kind().label())),
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

fn marker(ctx: &ExtractContext, text: String) -> Extracted {
    if ctx.serialize {
        Extracted::Json(Json::String(text))
    } else {
        Extracted::Raw(MgmtValue::Text(text))
    }
}

fn indexed_slot<'v>(
    items: &'v mut [MgmtValue],
    segment: &str,
    category: &'static str,
    len: usize,
) -> ExtractResult<&'v mut MgmtValue> {
    let index: usize = segment.parse().map_err(|_| ExtractError::NotAnIndex {
        segment: segment.to_string(),
        container: category.to_string(),
    })?;
    items.get_mut(index).ok_or(ExtractError::IndexOutOfBounds {
        index,
        container: category.to_string(),
        len,
    })
}
