//! [`Inspect`] adapters for decoded JSON (`serde_json`).
//!
//! A [`Value`] is a dynamic node: its concrete kind (text, number, bool,
//! array, object) is resolved at comparison time. Numbers compare by numeric
//! value, so `1` and `1.0` are equal. Two integers are compared exactly, so
//! precision above 2^53 is never lost.

use std::any::Any;

use serde_json::{Map, Number, Value};

use crate::node::{Dynamic, Inspect, Leaf, MapAccess, MapEntry, Node, Resolved};

impl Dynamic for Value {
    fn resolve(&self) -> Resolved<'_> {
        match self {
            Value::Null => Resolved::Null,
            Value::String(s) => Resolved::Text(s),
            Value::Number(n) => Resolved::Number(n),
            Value::Bool(b) => Resolved::Bool(b),
            Value::Array(items) => Resolved::Array(items),
            Value::Object(map) => Resolved::Map(map),
        }
    }
}

impl Inspect for Value {
    fn inspect(&self) -> Node<'_> {
        Node::Dynamic(self)
    }
}

impl Leaf for Number {
    fn same(&self, other: &dyn Leaf) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Number>() else {
            return false;
        };
        if self == other {
            return true;
        }
        // Integers keep full precision; only a float on either side widens.
        if !(self.is_f64() || other.is_f64()) {
            return false;
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl Inspect for Number {
    fn inspect(&self) -> Node<'_> {
        Node::Scalar(self)
    }
}

impl MapAccess for Map<String, Value> {
    fn len(&self) -> usize {
        Map::len(self)
    }

    fn entries(&self) -> Vec<MapEntry<'_>> {
        let mut entries: Vec<MapEntry<'_>> = self
            .iter()
            .map(|(k, v)| MapEntry {
                key: k as &dyn Any,
                rendered: k.clone(),
                value: v as &dyn Inspect,
            })
            .collect();
        entries.sort_by(|x, y| x.rendered.cmp(&y.rendered));
        entries
    }

    fn get(&self, key: &dyn Any) -> Option<&dyn Inspect> {
        let key = key.downcast_ref::<String>()?;
        Map::get(self, key).map(|v| v as &dyn Inspect)
    }

    fn zero(&self) -> Option<Box<dyn Inspect>> {
        Some(Box::new(Value::Null))
    }
}

impl Inspect for Map<String, Value> {
    fn inspect(&self) -> Node<'_> {
        Node::Map(Some(self))
    }
}
