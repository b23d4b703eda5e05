//! Difference records and the path-filtered sink that collects them.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::config::{fill_template, DEFAULT_TEMPLATE};
use crate::filter::PathFilter;

/// One disagreement between A and B.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// Field path of the disagreeing position.
    pub path: String,
    /// Rendering of A's value at `path`.
    pub a: String,
    /// Rendering of B's value at `path`.
    pub b: String,
}

impl Difference {
    pub fn new(path: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            a: a.into(),
            b: b.into(),
        }
    }

    /// Render with a template holding three `{}` slots (path, A, B).
    pub fn render(&self, template: &str) -> String {
        fill_template(template, &self.path, &self.a, &self.b)
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_TEMPLATE))
    }
}

// ---------------------------------------------------------------------------
// DiffSet
// ---------------------------------------------------------------------------

/// Insertion-ordered set of differences keyed by path.
///
/// Inserting at an existing path replaces the earlier record in place
/// (last write wins, first position kept).
#[derive(Clone, Debug, Default)]
pub struct DiffSet {
    records: Vec<Difference>,
    index: HashMap<String, usize>,
}

impl DiffSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns the record it replaced, if any.
    pub fn insert(&mut self, diff: Difference) -> Option<Difference> {
        match self.index.get(&diff.path) {
            Some(&slot) => Some(std::mem::replace(&mut self.records[slot], diff)),
            None => {
                self.index.insert(diff.path.clone(), self.records.len());
                self.records.push(diff);
                None
            }
        }
    }

    /// Insert every record of `other`, in its order.
    pub fn extend(&mut self, other: DiffSet) {
        for diff in other.records {
            self.insert(diff);
        }
    }

    pub fn get(&self, path: &str) -> Option<&Difference> {
        self.index.get(path).map(|&slot| &self.records[slot])
    }

    /// Records whose path matches `pattern`, in insertion order.
    pub fn matching(&self, pattern: &Regex) -> Vec<&Difference> {
        self.records
            .iter()
            .filter(|d| pattern.is_match(&d.path))
            .collect()
    }

    pub fn as_slice(&self) -> &[Difference] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Difference> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One rendered line per record, each terminated by a newline.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::new();
        for diff in &self.records {
            out.push_str(&diff.render(template));
            out.push('\n');
        }
        out
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }
}

impl<'a> IntoIterator for &'a DiffSet {
    type Item = &'a Difference;
    type IntoIter = std::slice::Iter<'a, Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// DiffSink
// ---------------------------------------------------------------------------

/// Collects the differences of a single comparison, applying the session's
/// path filter at insertion time.
///
/// The sink is threaded explicitly through the traversal; its contents only
/// reach the session once the whole comparison has succeeded.
pub struct DiffSink<'f> {
    filter: &'f PathFilter,
    found: DiffSet,
}

impl<'f> DiffSink<'f> {
    pub fn new(filter: &'f PathFilter) -> Self {
        Self {
            filter,
            found: DiffSet::new(),
        }
    }

    /// Record a difference unless the filter excludes its path.
    pub fn record(&mut self, path: &str, a: impl Into<String>, b: impl Into<String>) {
        if !self.filter.admits(path) {
            trace!(path, mode = ?self.filter.mode(), "difference filtered out");
            return;
        }
        let diff = Difference::new(path, a, b);
        trace!(path, a = %diff.a, b = %diff.b, "difference recorded");
        if let Some(previous) = self.found.insert(diff) {
            trace!(path, replaced = %previous.a, "duplicate path overwritten");
        }
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn into_set(self) -> DiffSet {
        self.found
    }
}
