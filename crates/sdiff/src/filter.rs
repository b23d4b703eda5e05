//! Include/exclude filtering of difference paths.
//!
//! The filter mode is derived from what is configured, never stored:
//!
//! - any include patterns: only matching paths are recorded
//! - otherwise any exclude patterns: matching paths are dropped
//! - otherwise every path is recorded
//!
//! Once include patterns exist, exclude patterns are inert for the rest of
//! the session.

use regex::Regex;

use crate::error::{DiffError, DiffResult};

/// Compile a path pattern.
pub(crate) fn compile(pattern: &str) -> DiffResult<Regex> {
    Regex::new(pattern).map_err(|source| DiffError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compile a list of path patterns, failing on the first invalid one.
pub(crate) fn compile_all<I, S>(patterns: I) -> DiffResult<Vec<Regex>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns.into_iter().map(|p| compile(p.as_ref())).collect()
}

/// How the active filter treats recorded paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
    All,
}

/// Include/exclude patterns for one session.
#[derive(Clone, Debug, Default)]
pub struct PathFilter {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl PathFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> FilterMode {
        if !self.includes.is_empty() {
            FilterMode::Include
        } else if !self.excludes.is_empty() {
            FilterMode::Exclude
        } else {
            FilterMode::All
        }
    }

    /// Replace the include patterns.
    pub fn set_includes(&mut self, patterns: Vec<Regex>) {
        self.includes = patterns;
    }

    /// Replace the exclude patterns. No-op while include patterns exist.
    ///
    /// Returns `false` when the patterns were ignored.
    pub fn set_excludes(&mut self, patterns: Vec<Regex>) -> bool {
        if !self.includes.is_empty() {
            return false;
        }
        self.excludes = patterns;
        true
    }

    /// Whether a difference at `path` should be recorded.
    pub fn admits(&self, path: &str) -> bool {
        match self.mode() {
            FilterMode::Include => self.includes.iter().any(|r| r.is_match(path)),
            FilterMode::Exclude => !self.excludes.iter().any(|r| r.is_match(path)),
            FilterMode::All => true,
        }
    }

    pub fn clear(&mut self) {
        self.includes.clear();
        self.excludes.clear();
    }
}
