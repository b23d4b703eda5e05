//! Per-path overrides: custom comparators, sorters, and trim rules.
//!
//! Every rule is keyed by a path pattern. Rules of the same kind are tried in
//! the order they were added; the first one whose pattern matches wins.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use regex::Regex;
use sdiff_value::{type_name_of, Inspect};

use crate::error::{DiffError, DiffResult};
use crate::filter::compile;

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// Result of a custom comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The values agree; nothing is recorded.
    NoDiff,
    /// The values differ in length; the engine records both lengths.
    Length,
    /// One value is absent; the engine records the presence of each side.
    Presence,
    /// The values differ; the comparator supplies both renderings.
    Element { a: String, b: String },
}

impl Outcome {
    pub fn element(a: impl fmt::Display, b: impl fmt::Display) -> Self {
        Self::Element {
            a: a.to_string(),
            b: b.to_string(),
        }
    }
}

/// Replaces structural descent for the paths it matches.
pub trait Comparator: Send + Sync {
    /// Whether this comparator handles `path`.
    fn matches(&self, path: &str) -> bool;

    /// Compare the raw values at a matched path.
    ///
    /// Returning an error aborts the comparison.
    fn compare(&self, a: &dyn Any, b: &dyn Any) -> DiffResult<Outcome>;
}

/// A [`Comparator`] built from a path pattern and a typed closure.
pub struct FnComparator<T, F> {
    pattern: Regex,
    compare: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> FnComparator<T, F>
where
    T: Any,
    F: Fn(&T, &T) -> Outcome + Send + Sync,
{
    pub fn new(pattern: &str, compare: F) -> DiffResult<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            compare,
            _marker: PhantomData,
        })
    }
}

impl<T, F> Comparator for FnComparator<T, F>
where
    T: Any,
    F: Fn(&T, &T) -> Outcome + Send + Sync,
{
    fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    fn compare(&self, a: &dyn Any, b: &dyn Any) -> DiffResult<Outcome> {
        match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
            (Some(a), Some(b)) => Ok((self.compare)(a, b)),
            _ => Err(DiffError::protocol(
                self.pattern.as_str(),
                format!(
                    "comparator expects {} but the matched value has another type",
                    std::any::type_name::<T>()
                ),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Sorters
// ---------------------------------------------------------------------------

/// Reorders both sides of a matched sequence before element-wise comparison.
pub trait Sorter: Send + Sync {
    /// Whether this sorter handles `path`.
    fn matches(&self, path: &str) -> bool;

    /// Stable-sort a working list of element references in place.
    fn sort<'a>(&self, items: &mut [&'a dyn Inspect]) -> DiffResult<()>;
}

/// A [`Sorter`] built from a path pattern and a typed ordering.
pub struct FnSorter<T, F> {
    pattern: Regex,
    ordering: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> FnSorter<T, F>
where
    T: Any,
    F: Fn(&T, &T) -> Ordering + Send + Sync,
{
    pub fn new(pattern: &str, ordering: F) -> DiffResult<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            ordering,
            _marker: PhantomData,
        })
    }
}

impl<T, F> Sorter for FnSorter<T, F>
where
    T: Any,
    F: Fn(&T, &T) -> Ordering + Send + Sync,
{
    fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    fn sort<'a>(&self, items: &mut [&'a dyn Inspect]) -> DiffResult<()> {
        let mut keyed = Vec::with_capacity(items.len());
        for &item in items.iter() {
            let Some(typed) = item.as_any().downcast_ref::<T>() else {
                return Err(DiffError::protocol(
                    self.pattern.as_str(),
                    format!(
                        "sorter expects {} elements, found {}",
                        std::any::type_name::<T>(),
                        type_name_of(item)
                    ),
                ));
            };
            keyed.push((typed, item));
        }
        keyed.sort_by(|(x, _), (y, _)| (self.ordering)(*x, *y));
        for (slot, (_, item)) in items.iter_mut().zip(keyed) {
            *slot = item;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Trim rules
// ---------------------------------------------------------------------------

/// Strip any of `cutset`'s characters from both ends of matched text leaves.
#[derive(Clone, Debug)]
pub struct TrimRule {
    pattern: Regex,
    cutset: String,
}

impl TrimRule {
    pub fn new(pattern: &str, cutset: impl Into<String>) -> DiffResult<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            cutset: cutset.into(),
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn trim<'s>(&self, s: &'s str) -> &'s str {
        s.trim_matches(|c: char| self.cutset.contains(c))
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// All per-path overrides of a session.
#[derive(Default)]
pub struct Rules {
    comparators: Vec<Box<dyn Comparator>>,
    sorters: Vec<Box<dyn Sorter>>,
    trims: Vec<TrimRule>,
    trim_spaces: Vec<Regex>,
}

impl Rules {
    pub fn add_comparator(&mut self, comparator: Box<dyn Comparator>) {
        self.comparators.push(comparator);
    }

    pub fn add_sorter(&mut self, sorter: Box<dyn Sorter>) {
        self.sorters.push(sorter);
    }

    pub fn add_trim(&mut self, rule: TrimRule) {
        self.trims.push(rule);
    }

    pub fn add_trim_spaces(&mut self, patterns: Vec<Regex>) {
        self.trim_spaces.extend(patterns);
    }

    pub fn comparator_for(&self, path: &str) -> Option<&dyn Comparator> {
        self.comparators
            .iter()
            .find(|c| c.matches(path))
            .map(|c| c.as_ref())
    }

    pub fn sorter_for(&self, path: &str) -> Option<&dyn Sorter> {
        self.sorters
            .iter()
            .find(|s| s.matches(path))
            .map(|s| s.as_ref())
    }

    /// Normalize a text leaf: the first matching cutset rule, otherwise
    /// whitespace trimming when a trim-space pattern matches.
    ///
    /// Returns `None` when no rule applies.
    pub fn normalize<'s>(&self, path: &str, s: &'s str) -> Option<&'s str> {
        if let Some(rule) = self.trims.iter().find(|r| r.matches(path)) {
            return Some(rule.trim(s));
        }
        if self.trim_spaces.iter().any(|r| r.is_match(path)) {
            return Some(s.trim());
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
            && self.sorters.is_empty()
            && self.trims.is_empty()
            && self.trim_spaces.is_empty()
    }

    pub fn clear(&mut self) {
        self.comparators.clear();
        self.sorters.clear();
        self.trims.clear();
        self.trim_spaces.clear();
    }
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rules")
            .field("comparators", &self.comparators.len())
            .field("sorters", &self.sorters.len())
            .field("trims", &self.trims)
            .field("trim_spaces", &self.trim_spaces)
            .finish()
    }
}
