//! [`Inspect`] adapters for standard library types.
//!
//! `HashMap<K, V>` and `BTreeMap<K, V>` require `K: MapKey` and
//! `V: Default`. A key of A that is missing from B is compared against
//! `V::default()`. Maps whose values have no `Default` (records, for
//! example) need a wrapper that implements [`MapAccess`] directly and
//! returns `None` from `zero`; the engine then reports a missing key as an
//! invalid value instead of comparing it.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use crate::node::{Inspect, Leaf, MapAccess, MapEntry, Node, Record, Seq};
use crate::path::short_type_name;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! display_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Leaf for $ty {
                fn same(&self, other: &dyn Leaf) -> bool {
                    other.as_any().downcast_ref::<$ty>().is_some_and(|o| self == o)
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }

            impl Inspect for $ty {
                fn inspect(&self) -> Node<'_> {
                    Node::Scalar(self)
                }
            }
        )*
    };
}

display_leaf!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

impl Leaf for () {
    fn same(&self, other: &dyn Leaf) -> bool {
        other.as_any().is::<()>()
    }

    fn render(&self) -> String {
        "()".to_string()
    }
}

impl Inspect for () {
    fn inspect(&self) -> Node<'_> {
        Node::Scalar(self)
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

impl Inspect for String {
    fn inspect(&self) -> Node<'_> {
        Node::Text(self)
    }
}

impl Inspect for &'static str {
    fn inspect(&self) -> Node<'_> {
        Node::Text(self)
    }

    fn type_label(&self) -> Option<&'static str> {
        Some("str")
    }
}

impl Inspect for Box<str> {
    fn inspect(&self) -> Node<'_> {
        Node::Text(self)
    }
}

// ---------------------------------------------------------------------------
// Sequences and arrays
// ---------------------------------------------------------------------------

impl<T: Inspect> Inspect for Vec<T> {
    fn inspect(&self) -> Node<'_> {
        Node::Sequence(Some(Seq::from_slice(self)))
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn inspect(&self) -> Node<'_> {
        let owner = self as *const Self as *const ();
        Node::Sequence(Some(Seq::from_refs(owner, self.iter())))
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn inspect(&self) -> Node<'_> {
        Node::FixedArray(Seq::from_slice(self))
    }
}

// ---------------------------------------------------------------------------
// Tuples: records with positional field names
// ---------------------------------------------------------------------------

macro_rules! tuple_record {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            fn inspect(&self) -> Node<'_> {
                Node::Record(Record::new(
                    "",
                    vec![$((stringify!($idx), &self.$idx as &dyn Inspect)),+],
                ))
            }
        }
    };
}

tuple_record!(A: 0);
tuple_record!(A: 0, B: 1);
tuple_record!(A: 0, B: 1, C: 2);
tuple_record!(A: 0, B: 1, C: 2, D: 3);

// ---------------------------------------------------------------------------
// Nullable references
// ---------------------------------------------------------------------------

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self) -> Node<'_> {
        Node::Nullable(self.as_ref().map(|v| v as &dyn Inspect))
    }

    fn type_label(&self) -> Option<&'static str> {
        short_type_name(std::any::type_name::<T>())
    }
}

macro_rules! pointer_nullable {
    ($($ptr:ident),*) => {
        $(
            impl<T: Inspect> Inspect for $ptr<T> {
                fn inspect(&self) -> Node<'_> {
                    Node::Nullable(Some(&**self as &dyn Inspect))
                }

                fn type_label(&self) -> Option<&'static str> {
                    short_type_name(std::any::type_name::<T>())
                }
            }
        )*
    };
}

pointer_nullable!(Box, Rc, Arc);

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

/// A map key that can be rendered into a path segment.
///
/// The std map adapters also need `V: Default` on the value type; see the
/// module docs for maps whose values cannot provide one.
pub trait MapKey: Any {
    fn render_key(&self) -> String;
}

macro_rules! display_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty {
                fn render_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_key!(
    String, &'static str, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize,
);

fn sorted_entries<'a, K, V, I>(iter: I) -> Vec<MapEntry<'a>>
where
    K: MapKey,
    V: Inspect,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut entries: Vec<MapEntry<'a>> = iter
        .map(|(k, v)| MapEntry {
            key: k as &dyn Any,
            rendered: k.render_key(),
            value: v as &dyn Inspect,
        })
        .collect();
    entries.sort_by(|x, y| x.rendered.cmp(&y.rendered));
    entries
}

impl<K, V, S> MapAccess for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Inspect + Default,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Vec<MapEntry<'_>> {
        sorted_entries(self.iter())
    }

    fn get(&self, key: &dyn Any) -> Option<&dyn Inspect> {
        let key = key.downcast_ref::<K>()?;
        HashMap::get(self, key).map(|v| v as &dyn Inspect)
    }

    fn zero(&self) -> Option<Box<dyn Inspect>> {
        Some(Box::new(V::default()))
    }
}

impl<K, V, S> Inspect for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Inspect + Default,
    S: BuildHasher + 'static,
{
    fn inspect(&self) -> Node<'_> {
        Node::Map(Some(self))
    }
}

impl<K, V> MapAccess for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Inspect + Default,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Vec<MapEntry<'_>> {
        sorted_entries(self.iter())
    }

    fn get(&self, key: &dyn Any) -> Option<&dyn Inspect> {
        let key = key.downcast_ref::<K>()?;
        BTreeMap::get(self, key).map(|v| v as &dyn Inspect)
    }

    fn zero(&self) -> Option<Box<dyn Inspect>> {
        Some(Box::new(V::default()))
    }
}

impl<K, V> Inspect for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Inspect + Default,
{
    fn inspect(&self) -> Node<'_> {
        Node::Map(Some(self))
    }
}
