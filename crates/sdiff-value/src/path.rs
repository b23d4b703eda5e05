//! Field-path construction.
//!
//! A field path starts at the root label (the declared type name, or
//! [`ROOT_MARKER`] for anonymous types) and grows one segment per descent:
//!
//! - record field: `.name`
//! - sequence or array element: `[3]`
//! - map entry: `[key]`
//!
//! Two corresponding positions in the compared values always produce the
//! same path string.

use crate::node::{Inspect, Node};

/// Root label for anonymous types.
pub const ROOT_MARKER: &str = "$";

/// Suffix appended to a path whose length differs between the two sides.
pub const LENGTH_SUFFIX: &str = "[Length]";

/// Suffix appended to a path handled by a custom comparator.
pub const CUSTOMIZED_SUFFIX: &str = ".$[customized]";

/// Rendering of an absent value in a presence mismatch.
pub const NIL: &str = "<nil>";

/// Rendering of a present value in a presence mismatch.
pub const NOT_NIL: &str = "<not nil>";

/// Reduce a full type name to its short declared name.
///
/// `my_app::model::Person` becomes `Person`; generic, tuple, array, slice,
/// reference and pointer types are anonymous and yield `None`.
pub fn short_type_name(full: &str) -> Option<&str> {
    const ANONYMOUS: &[char] = &['<', '>', '[', ']', '(', ')', '&', '*', ' ', ';'];
    if full.is_empty() || full.contains(ANONYMOUS) {
        return None;
    }
    full.rsplit("::").next().filter(|name| !name.is_empty())
}

/// Root path for a comparison starting at `value`.
///
/// Nullable wrappers report the label of their referent type, even when the
/// reference is absent.
pub fn root_path(value: &dyn Inspect) -> String {
    let label = match value.inspect() {
        Node::Nullable(Some(inner)) => inner.type_label().or_else(|| value.type_label()),
        _ => value.type_label(),
    };
    label.unwrap_or(ROOT_MARKER).to_string()
}

pub fn field_path(parent: &str, field: &str) -> String {
    format!("{parent}.{field}")
}

pub fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

pub fn key_path(parent: &str, key: &str) -> String {
    format!("{parent}[{key}]")
}

pub fn length_path(parent: &str) -> String {
    format!("{parent}{LENGTH_SUFFIX}")
}

pub fn customized_path(parent: &str) -> String {
    format!("{parent}{CUSTOMIZED_SUFFIX}")
}
