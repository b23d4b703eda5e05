//! Value model for the sdiff structural difference engine.
//!
//! Rust has no runtime reflection, so every comparable type describes its own
//! shape through the [`Inspect`] trait. `inspect()` classifies a value into
//! exactly one [`Node`] kind, and the engine walks two values by matching
//! their nodes pairwise.
//!
//! # Key Types
//!
//! - [`Inspect`] -- implemented by every comparable type
//! - [`Node`] -- closed tagged union: text, scalar, nullable, sequence, fixed
//!   array, record, map, dynamic
//! - [`Leaf`] -- deep equality and rendering for scalar leaves
//! - [`Seq`] / [`Record`] / [`MapAccess`] / [`Dynamic`] -- kind-specific access
//!
//! Adapters are provided for primitives, `String`, `Vec`, arrays, tuples,
//! `Option`, smart pointers, `HashMap`, `BTreeMap`, and `serde_json::Value`.
//! User types opt in with [`inspect_record!`] and [`inspect_leaf!`].

#[macro_use]
mod macros;

pub mod impls;
pub mod json;
pub mod node;
pub mod path;

pub use impls::MapKey;
pub use node::{
    address_of, type_id_of, type_name_of, AsAny, Dynamic, Inspect, Leaf, MapAccess, MapEntry,
    Node, Record, Resolved, Seq,
};
pub use path::{
    customized_path, field_path, index_path, key_path, length_path, root_path, short_type_name,
    CUSTOMIZED_SUFFIX, LENGTH_SUFFIX, NIL, NOT_NIL, ROOT_MARKER,
};
