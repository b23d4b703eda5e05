//! Structural difference engine.
//!
//! Deep-compares two values of the same type and reports every leaf position
//! where they disagree, addressed by a field path such as `Order.items[2].sku`
//! or `$[config][timeout]`.
//!
//! # Key Types
//!
//! - [`Differ`] -- a diff session: configuration, rules, and accumulated results
//! - [`Difference`] -- one `(path, a, b)` record
//! - [`Comparator`] / [`FnComparator`] / [`Outcome`] -- per-path custom comparison
//! - [`Sorter`] / [`FnSorter`] -- order-insensitive sequence comparison
//! - [`DifferConfig`] -- depth limit and rendering template
//! - [`DiffError`] -- fatal comparison and configuration errors
//!
//! # Example
//!
//! ```
//! use sdiff::{inspect_record, Differ};
//!
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! inspect_record!(Person { name, age });
//!
//! let a = Person { name: "Alice".into(), age: 30 };
//! let b = Person { name: "Bob".into(), age: 30 };
//!
//! let mut differ = Differ::new();
//! differ.compare(&a, &b)?;
//! assert_eq!(differ.render(), "Person.name: A = Alice, B = Bob\n");
//! # Ok::<(), sdiff::DiffError>(())
//! ```

pub mod config;
pub mod differ;
mod engine;
pub mod error;
pub mod filter;
pub mod rules;
pub mod sink;

pub use config::{DifferConfig, DEFAULT_MAX_DEPTH, DEFAULT_TEMPLATE};
pub use differ::Differ;
pub use error::{DiffError, DiffResult};
pub use filter::FilterMode;
pub use rules::{Comparator, FnComparator, FnSorter, Outcome, Sorter, TrimRule};
pub use sink::{DiffSet, Difference};

pub use sdiff_value::{inspect_leaf, inspect_record, Inspect, Leaf, Node};
