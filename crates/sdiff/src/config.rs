use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Default traversal depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 30;

/// Default rendering template: path, A value, B value.
pub const DEFAULT_TEMPLATE: &str = "{}: A = {}, B = {}";

const SLOT: &str = "{}";

/// Session settings that survive [`Differ::reset`](crate::Differ::reset).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
    /// Maximum traversal depth. Comparisons going deeper fail with
    /// [`DiffError::DepthExceeded`].
    pub max_depth: usize,
    /// Line template for rendering differences. Must contain exactly three
    /// `{}` slots, filled with the path, the A value and the B value.
    pub template: String,
}

impl Default for DifferConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl DifferConfig {
    /// Check that the template has exactly three slots.
    pub fn validate(&self) -> DiffResult<()> {
        validate_template(&self.template)
    }
}

pub(crate) fn validate_template(template: &str) -> DiffResult<()> {
    if template.matches(SLOT).count() != 3 {
        return Err(DiffError::InvalidTemplate(template.to_string()));
    }
    Ok(())
}

/// Fill the three slots of a validated template.
pub(crate) fn fill_template(template: &str, path: &str, a: &str, b: &str) -> String {
    let mut out = String::with_capacity(template.len() + path.len() + a.len() + b.len());
    let mut values = [path, a, b].into_iter();
    let mut rest = template;
    while let Some(pos) = rest.find(SLOT) {
        out.push_str(&rest[..pos]);
        out.push_str(values.next().unwrap_or_default());
        rest = &rest[pos + SLOT.len()..];
    }
    out.push_str(rest);
    out
}
