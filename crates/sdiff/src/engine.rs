//! The traversal engine: walks two values of the same type in lockstep and
//! records every leaf position where they disagree.
//!
//! At each position the engine checks, in order: the depth limit, type
//! identity, custom comparators, and finally the structural kind of the
//! values. Guard violations abort the whole walk with an error.

use sdiff_value::{
    address_of, customized_path, field_path, index_path, key_path, length_path, type_id_of,
    type_name_of, Dynamic, Inspect, MapAccess, Node, Record, Resolved, Seq, NIL, NOT_NIL,
};
use tracing::trace;

use crate::error::{DiffError, DiffResult};
use crate::rules::{Comparator, Outcome, Rules};
use crate::sink::DiffSink;

fn presence(is_nil: bool) -> &'static str {
    if is_nil {
        NIL
    } else {
        NOT_NIL
    }
}

/// Re-home a rule's contract violation onto the path where it happened.
fn at_path(err: DiffError, path: &str) -> DiffError {
    match err {
        DiffError::ProtocolViolation { reason, .. } => DiffError::protocol(path, reason),
        other => other,
    }
}

/// One comparison's traversal state: the session rules and the depth limit.
pub(crate) struct Walker<'r> {
    rules: &'r Rules,
    max_depth: usize,
}

impl<'r> Walker<'r> {
    pub(crate) fn new(rules: &'r Rules, max_depth: usize) -> Self {
        Self { rules, max_depth }
    }

    pub(crate) fn walk(
        &self,
        a: &dyn Inspect,
        b: &dyn Inspect,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        if depth > self.max_depth {
            return Err(DiffError::DepthExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }

        if type_id_of(a) != type_id_of(b) {
            return Err(DiffError::type_mismatch(
                path,
                type_name_of(a),
                type_name_of(b),
            ));
        }

        if let Some(comparator) = self.rules.comparator_for(path) {
            return self.apply_comparator(comparator, a, b, path, sink);
        }

        match (a.inspect(), b.inspect()) {
            (Node::FixedArray(xs), Node::FixedArray(ys)) => {
                self.walk_elements(&xs, &ys, path, depth, sink)
            }
            (Node::Sequence(xs), Node::Sequence(ys)) => {
                self.walk_sequence(xs, ys, path, depth, sink)
            }
            (Node::Dynamic(x), Node::Dynamic(y)) => self.walk_dynamic(x, y, path, depth, sink),
            (Node::Nullable(x), Node::Nullable(y)) => self.walk_nullable(x, y, path, depth, sink),
            (Node::Record(x), Node::Record(y)) => self.walk_record(&x, &y, path, depth, sink),
            (Node::Map(x), Node::Map(y)) => self.walk_map(x, y, path, depth, sink),
            (Node::Text(x), Node::Text(y)) => {
                self.compare_text(x, y, path, sink);
                Ok(())
            }
            (Node::Scalar(x), Node::Scalar(y)) => {
                if !x.same(y) {
                    sink.record(path, x.render(), y.render());
                }
                Ok(())
            }
            (x, y) => Err(DiffError::type_mismatch(
                path,
                format!("{} ({})", type_name_of(a), x.kind()),
                format!("{} ({})", type_name_of(b), y.kind()),
            )),
        }
    }

    fn apply_comparator(
        &self,
        comparator: &dyn Comparator,
        a: &dyn Inspect,
        b: &dyn Inspect,
        path: &str,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        let path = customized_path(path);
        trace!(path = %path, "custom comparator applied");
        let outcome = comparator
            .compare(a.as_any(), b.as_any())
            .map_err(|e| at_path(e, &path))?;

        match outcome {
            Outcome::NoDiff => {}
            Outcome::Length => {
                let (x, y) = (a.inspect(), b.inspect());
                let (Some(len_a), Some(len_b)) = (x.len(), y.len()) else {
                    return Err(DiffError::protocol(
                        &path,
                        format!("length difference reported for a {} value", x.kind()),
                    ));
                };
                sink.record(&length_path(&path), len_a.to_string(), len_b.to_string());
            }
            Outcome::Presence => {
                let (x, y) = (a.inspect(), b.inspect());
                let (Some(nil_a), Some(nil_b)) = (x.is_nil(), y.is_nil()) else {
                    return Err(DiffError::protocol(
                        &path,
                        format!("presence difference reported for a {} value", x.kind()),
                    ));
                };
                sink.record(&path, presence(nil_a), presence(nil_b));
            }
            Outcome::Element { a: shown_a, b: shown_b } => sink.record(&path, shown_a, shown_b),
        }
        Ok(())
    }

    /// Pairwise descent over the common prefix of two element lists.
    fn walk_elements(
        &self,
        xs: &Seq<'_>,
        ys: &Seq<'_>,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        for (i, (&x, &y)) in xs.items().iter().zip(ys.items()).enumerate() {
            self.walk(x, y, &index_path(path, i), depth, sink)?;
        }
        Ok(())
    }

    fn walk_sequence(
        &self,
        xs: Option<Seq<'_>>,
        ys: Option<Seq<'_>>,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        let (mut xs, mut ys) = match (xs, ys) {
            (Some(xs), Some(ys)) => (xs, ys),
            (None, None) => return Ok(()),
            (xs, ys) => {
                sink.record(path, presence(xs.is_none()), presence(ys.is_none()));
                return Ok(());
            }
        };

        if xs.len() != ys.len() {
            sink.record(&length_path(path), xs.len().to_string(), ys.len().to_string());
        }

        if xs.same_storage(&ys) {
            return Ok(());
        }

        if let Some(sorter) = self.rules.sorter_for(path) {
            trace!(path, "sorting both sequences before comparison");
            sorter.sort(xs.items_mut()).map_err(|e| at_path(e, path))?;
            sorter.sort(ys.items_mut()).map_err(|e| at_path(e, path))?;
        }

        self.walk_elements(&xs, &ys, path, depth, sink)
    }

    fn walk_dynamic(
        &self,
        x: &dyn Dynamic,
        y: &dyn Dynamic,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        let (rx, ry) = (x.resolve(), y.resolve());
        let (nil_x, nil_y) = (
            matches!(rx, Resolved::Null),
            matches!(ry, Resolved::Null),
        );
        if nil_x != nil_y {
            sink.record(path, presence(nil_x), presence(nil_y));
            return Ok(());
        }
        if nil_x {
            return Ok(());
        }

        let unsupported = |r: &Resolved<'_>| DiffError::UnsupportedValue {
            path: path.to_string(),
            type_name: r.kind().to_string(),
        };
        let px = rx.payload().ok_or_else(|| unsupported(&rx))?;
        let py = ry.payload().ok_or_else(|| unsupported(&ry))?;

        // Maps of dynamic values cost one extra level.
        let depth = match rx {
            Resolved::Map(_) => depth + 1,
            _ => depth,
        };
        self.walk(px, py, path, depth, sink)
    }

    fn walk_nullable(
        &self,
        x: Option<&dyn Inspect>,
        y: Option<&dyn Inspect>,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        match (x, y) {
            (Some(x), Some(y)) => {
                if address_of(x) == address_of(y) {
                    return Ok(());
                }
                self.walk(x, y, path, depth, sink)
            }
            (None, None) => Ok(()),
            (x, y) => {
                sink.record(path, presence(x.is_none()), presence(y.is_none()));
                Ok(())
            }
        }
    }

    fn walk_record(
        &self,
        x: &Record<'_>,
        y: &Record<'_>,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        if !x.same_shape(y) {
            return Err(DiffError::type_mismatch(path, x.name(), y.name()));
        }
        for (&(name, fx), &(_, fy)) in x.fields().iter().zip(y.fields()) {
            self.walk(fx, fy, &field_path(path, name), depth + 1, sink)?;
        }
        Ok(())
    }

    fn walk_map(
        &self,
        x: Option<&dyn MapAccess>,
        y: Option<&dyn MapAccess>,
        path: &str,
        depth: usize,
        sink: &mut DiffSink<'_>,
    ) -> DiffResult<()> {
        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x, y),
            (None, None) => return Ok(()),
            (x, y) => {
                sink.record(path, presence(x.is_none()), presence(y.is_none()));
                return Ok(());
            }
        };

        if x.len() != y.len() {
            sink.record(&length_path(path), x.len().to_string(), y.len().to_string());
        }

        for entry in x.entries() {
            let entry_path = key_path(path, &entry.rendered);
            match y.get(entry.key) {
                Some(value) => self.walk(entry.value, value, &entry_path, depth, sink)?,
                None => {
                    let zero = y.zero().ok_or_else(|| DiffError::InvalidValue {
                        path: entry_path.clone(),
                        type_name: type_name_of(entry.value).to_string(),
                    })?;
                    self.walk(entry.value, &*zero, &entry_path, depth, sink)?;
                }
            }
        }
        Ok(())
    }

    /// Text leaves honor trim rules; the untrimmed originals are recorded.
    fn compare_text(&self, x: &str, y: &str, path: &str, sink: &mut DiffSink<'_>) {
        let equal = match (self.rules.normalize(path, x), self.rules.normalize(path, y)) {
            (Some(tx), Some(ty)) => tx == ty,
            _ => x == y,
        };
        if !equal {
            sink.record(path, x, y);
        }
    }
}
