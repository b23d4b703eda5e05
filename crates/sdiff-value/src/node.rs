//! The structural view of a value: the [`Inspect`] trait and the [`Node`]
//! tagged union it produces.

use std::any::{Any, TypeId};
use std::fmt;

use crate::path::short_type_name;

// ---------------------------------------------------------------------------
// AsAny
// ---------------------------------------------------------------------------

/// Access to the concrete type behind a trait object.
///
/// Implemented for every `'static` type. Call it on a `&dyn Inspect` (not on
/// a `&&dyn Inspect`), otherwise the blanket impl answers for the reference
/// type instead of the value.
pub trait AsAny: Any {
    /// The value as `&dyn Any`, for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Full declared type name, as reported by [`std::any::type_name`].
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// ---------------------------------------------------------------------------
// Inspect
// ---------------------------------------------------------------------------

/// A value the diff engine can walk.
///
/// Two values are comparable when they have the same concrete type. The
/// engine calls [`Inspect::inspect`] on both and pattern-matches the two
/// [`Node`]s it gets back.
pub trait Inspect: AsAny {
    /// Classify this value into exactly one structural kind.
    ///
    /// `Option<T>` has an inherent `inspect` method that shadows this one in
    /// method-call syntax. Call it as `Inspect::inspect(&opt)` on options.
    fn inspect(&self) -> Node<'_>;

    /// Short declared name used as the root of the field path.
    ///
    /// Returns `None` for anonymous types (generics, tuples, slices, arrays).
    /// Wrappers such as `Option<T>` report the label of `T`.
    fn type_label(&self) -> Option<&'static str> {
        short_type_name(self.type_name())
    }
}

/// The concrete type identity of a comparison value.
pub fn type_id_of(value: &dyn Inspect) -> TypeId {
    value.as_any().type_id()
}

/// The concrete type name of a comparison value.
pub fn type_name_of(value: &dyn Inspect) -> &'static str {
    value.type_name()
}

/// Address of a value, used for reference-identity short-circuits.
pub fn address_of(value: &dyn Inspect) -> *const () {
    value as *const dyn Inspect as *const ()
}

// ---------------------------------------------------------------------------
// Leaf
// ---------------------------------------------------------------------------

/// A scalar leaf: compared by deep equality, never descended into.
pub trait Leaf: AsAny {
    /// Deep equality against another leaf of (presumably) the same type.
    ///
    /// Returns `false` when `other` has a different concrete type.
    fn same(&self, other: &dyn Leaf) -> bool;

    /// Human-readable rendering used in difference records.
    fn render(&self) -> String;
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Structural kind of one comparison value.
pub enum Node<'a> {
    /// Textual leaf. Subject to trim rules.
    Text(&'a str),
    /// Any other leaf-comparable primitive.
    Scalar(&'a dyn Leaf),
    /// A reference that may be absent. `Some` carries the referent.
    Nullable(Option<&'a dyn Inspect>),
    /// Variable-length sequence. `None` is an absent (nil) sequence.
    Sequence(Option<Seq<'a>>),
    /// Constant-length array.
    FixedArray(Seq<'a>),
    /// Named fields in declaration order.
    Record(Record<'a>),
    /// Associative map. `None` is an absent (nil) map.
    Map(Option<&'a dyn MapAccess>),
    /// Loosely-typed value whose kind is only known after resolution.
    Dynamic(&'a dyn Dynamic),
}

impl Node<'_> {
    /// Short name of the kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Text(_) => "text",
            Node::Scalar(_) => "scalar",
            Node::Nullable(_) => "nullable",
            Node::Sequence(_) => "sequence",
            Node::FixedArray(_) => "fixed array",
            Node::Record(_) => "record",
            Node::Map(_) => "map",
            Node::Dynamic(_) => "dynamic",
        }
    }

    /// Number of elements, for kinds that have a length.
    ///
    /// Text length is measured in bytes.
    pub fn len(&self) -> Option<usize> {
        match self {
            Node::Text(s) => Some(s.len()),
            Node::Sequence(seq) => Some(seq.as_ref().map_or(0, Seq::len)),
            Node::FixedArray(seq) => Some(seq.len()),
            Node::Map(map) => Some(map.map_or(0, |m| m.len())),
            Node::Dynamic(d) => match d.resolve() {
                Resolved::Null => Some(0),
                Resolved::Text(v) | Resolved::Array(v) | Resolved::Map(v) => v.inspect().len(),
                _ => None,
            },
            Node::Scalar(_) | Node::Nullable(_) | Node::Record(_) => None,
        }
    }

    /// Whether the value is absent, for kinds that can be absent.
    pub fn is_nil(&self) -> Option<bool> {
        match self {
            Node::Nullable(r) => Some(r.is_none()),
            Node::Sequence(seq) => Some(seq.is_none()),
            Node::Map(map) => Some(map.is_none()),
            Node::Dynamic(d) => Some(matches!(d.resolve(), Resolved::Null)),
            _ => None,
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Node::Scalar(l) => f.debug_tuple("Scalar").field(&l.render()).finish(),
            Node::Record(r) => f.debug_tuple("Record").field(&r.name()).finish(),
            other => match other.len() {
                Some(len) => write!(f, "{}(len={len})", other.kind()),
                None => write!(f, "{}", other.kind()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Seq
// ---------------------------------------------------------------------------

/// Borrowed elements of a sequence or fixed array.
///
/// `origin` identifies the backing storage: two `Seq`s with the same origin
/// and length view the same elements.
#[derive(Clone)]
pub struct Seq<'a> {
    items: Vec<&'a dyn Inspect>,
    origin: *const (),
}

impl<'a> Seq<'a> {
    /// Build from explicit element references and a storage origin.
    pub fn new(items: Vec<&'a dyn Inspect>, origin: *const ()) -> Self {
        Self { items, origin }
    }

    /// Build from a contiguous slice; the slice's data pointer is the origin.
    pub fn from_slice<T: Inspect>(slice: &'a [T]) -> Self {
        Self {
            items: slice.iter().map(|item| item as &dyn Inspect).collect(),
            origin: slice.as_ptr() as *const (),
        }
    }

    /// Build from any iterator of elements. The origin is the address of the
    /// collection that owns them.
    pub fn from_refs<T, I>(owner: *const (), iter: I) -> Self
    where
        T: Inspect,
        I: IntoIterator<Item = &'a T>,
    {
        Self {
            items: iter.into_iter().map(|item| item as &dyn Inspect).collect(),
            origin: owner,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a dyn Inspect> {
        self.items.get(index).copied()
    }

    pub fn items(&self) -> &[&'a dyn Inspect] {
        &self.items
    }

    /// Mutable access to the working list of element references.
    ///
    /// Reordering this list never touches the underlying collection.
    pub fn items_mut(&mut self) -> &mut [&'a dyn Inspect] {
        &mut self.items
    }

    /// Returns `true` when both views are backed by the same storage.
    pub fn same_storage(&self, other: &Seq<'_>) -> bool {
        std::ptr::eq(self.origin, other.origin)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A record: declared name plus named fields in declaration order.
pub struct Record<'a> {
    name: &'static str,
    fields: Vec<(&'static str, &'a dyn Inspect)>,
}

impl<'a> Record<'a> {
    pub fn new(name: &'static str, fields: Vec<(&'static str, &'a dyn Inspect)>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[(&'static str, &'a dyn Inspect)] {
        &self.fields
    }

    /// Two records have the same shape when name and field names agree.
    pub fn same_shape(&self, other: &Record<'_>) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|((a, _), (b, _))| a == b)
    }
}

// ---------------------------------------------------------------------------
// MapAccess
// ---------------------------------------------------------------------------

/// One entry of a map: the key (for lookups on the other side), its path
/// rendering, and the value.
pub struct MapEntry<'a> {
    pub key: &'a dyn Any,
    pub rendered: String,
    pub value: &'a dyn Inspect,
}

/// Read access to an associative map.
pub trait MapAccess {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries ordered by rendered key.
    fn entries(&self) -> Vec<MapEntry<'_>>;

    /// Look up a key taken from the other side's entries.
    fn get(&self, key: &dyn Any) -> Option<&dyn Inspect>;

    /// The zero value compared against when a key is absent.
    ///
    /// `None` means the value type has no zero value; the engine then treats
    /// the absent side as an invalid value.
    fn zero(&self) -> Option<Box<dyn Inspect>>;
}

// ---------------------------------------------------------------------------
// Dynamic
// ---------------------------------------------------------------------------

/// A loosely-typed value (e.g. decoded JSON) whose concrete kind is only known
/// at runtime.
pub trait Dynamic {
    fn resolve(&self) -> Resolved<'_>;
}

/// Concrete kind of a [`Dynamic`] value, with the payload to re-enter the
/// comparison with.
#[derive(Clone, Copy)]
pub enum Resolved<'a> {
    Null,
    Text(&'a dyn Inspect),
    Number(&'a dyn Inspect),
    Bool(&'a dyn Inspect),
    Array(&'a dyn Inspect),
    Map(&'a dyn Inspect),
    /// A payload the engine cannot compare; carries its type name.
    Unsupported(&'static str),
}

impl<'a> Resolved<'a> {
    /// The payload, if the kind is comparable and present.
    pub fn payload(&self) -> Option<&'a dyn Inspect> {
        match *self {
            Resolved::Text(v)
            | Resolved::Number(v)
            | Resolved::Bool(v)
            | Resolved::Array(v)
            | Resolved::Map(v) => Some(v),
            Resolved::Null | Resolved::Unsupported(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Resolved::Null => "null",
            Resolved::Text(_) => "text",
            Resolved::Number(_) => "number",
            Resolved::Bool(_) => "bool",
            Resolved::Array(_) => "array",
            Resolved::Map(_) => "map",
            Resolved::Unsupported(name) => *name,
        }
    }
}
