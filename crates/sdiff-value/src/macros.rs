//! Declarative macros for implementing [`Inspect`](crate::Inspect) on user
//! types.

/// Implement [`Inspect`](crate::Inspect) for a struct as a record.
///
/// Fields are listed in declaration order; only listed fields are compared.
/// Every listed field type must itself implement `Inspect`.
///
/// ```
/// use sdiff_value::{inspect_record, Inspect, Node};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// inspect_record!(Person { name, age });
///
/// let p = Person { name: "Ada".into(), age: 36 };
/// assert!(matches!(p.inspect(), Node::Record(_)));
/// ```
#[macro_export]
macro_rules! inspect_record {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Inspect for $ty {
            fn inspect(&self) -> $crate::Node<'_> {
                $crate::Node::Record($crate::Record::new(
                    stringify!($ty),
                    vec![$((stringify!($field), &self.$field as &dyn $crate::Inspect)),*],
                ))
            }
        }
    };
}

/// Implement [`Inspect`](crate::Inspect) and [`Leaf`](crate::Leaf) for types
/// compared as a whole with `PartialEq` and rendered with `Debug`.
///
/// Useful for enums and newtypes that have no inner structure worth walking.
///
/// ```
/// use sdiff_value::{inspect_leaf, Leaf};
///
/// #[derive(Debug, PartialEq)]
/// enum Color {
///     Red,
///     Blue,
/// }
///
/// inspect_leaf!(Color);
///
/// assert!(Color::Red.same(&Color::Red));
/// assert!(!Color::Red.same(&Color::Blue));
/// assert_eq!(Color::Blue.render(), "Blue");
/// ```
#[macro_export]
macro_rules! inspect_leaf {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Leaf for $ty {
                fn same(&self, other: &dyn $crate::Leaf) -> bool {
                    $crate::AsAny::as_any(other)
                        .downcast_ref::<$ty>()
                        .is_some_and(|o| self == o)
                }

                fn render(&self) -> String {
                    format!("{:?}", self)
                }
            }

            impl $crate::Inspect for $ty {
                fn inspect(&self) -> $crate::Node<'_> {
                    $crate::Node::Scalar(self)
                }
            }
        )+
    };
}
