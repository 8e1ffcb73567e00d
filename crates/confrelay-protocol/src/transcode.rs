//! Whole-message transcoding.
//!
//! Requests: the leaves addressed by an RPC's path specs are replaced with
//! their wire form. Responses: wire values are found by shape and turned
//! back into plain JSON.

use serde_json::Value;

use crate::diagnostics::{Diagnostics, child_location};
use crate::error::PathError;
use crate::path::{MissingPath, PathSpec, resolve_all};
use crate::value::{from_wire_json_at, is_wire_value, to_wire_at};

/// Rewrites every leaf addressed by `specs` into its wire form.
///
/// Returns the number of leaves rewritten.
pub fn encode_values(
    payload: &mut Value,
    specs: &[PathSpec],
    missing: MissingPath,
    diagnostics: &mut Diagnostics,
) -> Result<usize, PathError> {
    let mut value_diagnostics = Diagnostics::new();
    let count = resolve_all(payload, specs, missing, diagnostics, &mut |leaf: Value, location: &str| {
        to_wire_at(&leaf, location, &mut value_diagnostics).to_json()
    })?;
    diagnostics.extend(value_diagnostics);
    Ok(count)
}

/// Layout of a decoded response, selected by RPC method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A top-level object whose array field holds the records.
    List,
    /// A single record.
    Record,
    /// Returned as decoded.
    Passthrough,
}

impl ResponseShape {
    /// Selects the shape for a method name (`list`, `get`, `create`,
    /// `update`, `delete`), ignoring ASCII case.
    pub fn for_method(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "list" => Self::List,
            "get" | "create" | "update" | "delete" => Self::Record,
            _ => Self::Passthrough,
        }
    }
}

/// Replaces wire values in a decoded response with plain JSON.
///
/// Returns the number of wire values reversed.
pub fn decode_values(payload: &mut Value, shape: ResponseShape, diagnostics: &mut Diagnostics) -> usize {
    match shape {
        ResponseShape::List => decode_list(payload, diagnostics),
        ResponseShape::Record => scan_children(payload, "", diagnostics),
        ResponseShape::Passthrough => 0,
    }
}

/// Scans every element of the first array-valued field. Elements may be wire
/// values themselves. Other fields are left as decoded.
fn decode_list(payload: &mut Value, diagnostics: &mut Diagnostics) -> usize {
    let Some(obj) = payload.as_object_mut() else {
        return 0;
    };
    let Some((key, items)) = obj.iter_mut().find(|(_, v)| v.is_array()) else {
        return 0;
    };
    let Some(items) = items.as_array_mut() else {
        return 0;
    };

    let mut count = 0;
    for (i, item) in items.iter_mut().enumerate() {
        let location = child_location(key, &i.to_string());
        count += scan(item, &location, diagnostics);
    }
    count
}

/// Reverses `node` if it is a wire value, otherwise scans its children.
fn scan(node: &mut Value, location: &str, diagnostics: &mut Diagnostics) -> usize {
    if is_wire_value(node) {
        *node = from_wire_json_at(node, location, diagnostics);
        return 1;
    }
    scan_children(node, location, diagnostics)
}

/// Reversed output is plain JSON and is not scanned again.
fn scan_children(node: &mut Value, location: &str, diagnostics: &mut Diagnostics) -> usize {
    match node {
        Value::Object(obj) => obj
            .iter_mut()
            .map(|(key, child)| scan(child, &child_location(location, key), diagnostics))
            .sum(),
        Value::Array(items) => items
            .iter_mut()
            .enumerate()
            .map(|(i, child)| scan(child, &child_location(location, &i.to_string()), diagnostics))
            .sum(),
        _ => 0,
    }
}
