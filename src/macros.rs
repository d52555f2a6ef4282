//! # Shape Declaration Macro
//!
//! `shape!` declares a row struct and implements [`Record`](crate::Record) and
//! [`Shape`](crate::Shape) for it.
//!
//! ### Usage
//!
//! ```ignore
//! sqlrange::shape! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Audit {
//!         #[column = "created_by"] pub created_by: String,
//!     }
//! }
//!
//! sqlrange::shape! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Person {
//!         #[column = "age"] pub age: i64,
//!         #[column = "name"] pub name: String,
//!         #[embed] pub audit: Audit,   // flattened, no annotation needed
//!         pub nickname: String,        // unannotated: never mapped
//!         #[column = "secret"] secret: String, // unexported: never mapped
//!     }
//! }
//! ```
//!
//! Annotated and embedded field types must implement `rusqlite::ToSql` and
//! `rusqlite::types::FromSql`, or `Shape` respectively.

/// Declares a row struct and derives its shape description.
#[macro_export]
macro_rules! shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($body:tt)*
        }
    ) => {
        $crate::shape!(@fields [$(#[$meta])*] [$vis] $name [] $($body)* ,);
    };

    // Field munching: each field is normalized to
    // `{ [vis] field : Type => (kind) exported }`.
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*] , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name [$($done)*] $($rest)*);
    };
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*]
        #[column = $column:literal] pub $field:ident : $ty:ty , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name
            [$($done)* { [pub] $field : $ty => (column $column) true }] $($rest)*);
    };
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*]
        #[column = $column:literal] $field:ident : $ty:ty , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name
            [$($done)* { [] $field : $ty => (column $column) false }] $($rest)*);
    };
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*]
        #[embed] pub $field:ident : $ty:ty , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name
            [$($done)* { [pub] $field : $ty => (embed) true }] $($rest)*);
    };
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*]
        #[embed] $field:ident : $ty:ty , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name
            [$($done)* { [] $field : $ty => (embed) false }] $($rest)*);
    };
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*]
        pub $field:ident : $ty:ty , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name
            [$($done)* { [pub] $field : $ty => (plain) true }] $($rest)*);
    };
    (@fields $meta:tt $vis:tt $name:ident [$($done:tt)*]
        $field:ident : $ty:ty , $($rest:tt)*) => {
        $crate::shape!(@fields $meta $vis $name
            [$($done)* { [] $field : $ty => (plain) false }] $($rest)*);
    };
    (@fields [$(#[$meta:meta])*] [$vis:vis] $name:ident [$($done:tt)*]) => {
        $crate::shape!(@emit [$(#[$meta])*] [$vis] $name $($done)*);
    };

    (@emit [$(#[$meta:meta])*] [$vis:vis] $name:ident
        $({ [$($fvis:tt)*] $field:ident : $ty:ty => $kind:tt $exported:tt })*) => {
        $(#[$meta])*
        $vis struct $name {
            $($($fvis)* $field : $ty,)*
        }

        impl $crate::Record for $name {
            #[allow(unused_assignments, unused_variables, unused_mut)]
            fn attr(&self, index: usize) -> ::std::option::Option<$crate::Attr<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::shape!(@ref $kind self.$field);
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }

            #[allow(unused_assignments, unused_variables, unused_mut)]
            fn attr_mut(&mut self, index: usize) -> ::std::option::Option<$crate::AttrMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::shape!(@mut $kind self.$field);
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::Shape for $name {
            fn attributes() -> ::std::vec::Vec<$crate::Attribute> {
                ::std::vec![
                    $($crate::shape!(@attr $kind $exported $field $ty),)*
                ]
            }
        }
    };

    (@ref (column $column:literal) $value:expr) => {
        ::std::option::Option::Some($crate::Attr::Value(&$value))
    };
    (@ref (embed) $value:expr) => {
        ::std::option::Option::Some($crate::Attr::Embedded(&$value))
    };
    (@ref (plain) $value:expr) => {
        ::std::option::Option::None
    };

    (@mut (column $column:literal) $value:expr) => {
        ::std::option::Option::Some($crate::AttrMut::Value(&mut $value))
    };
    (@mut (embed) $value:expr) => {
        ::std::option::Option::Some($crate::AttrMut::Embedded(&mut $value))
    };
    (@mut (plain) $value:expr) => {
        ::std::option::Option::None
    };

    (@attr (column $column:literal) $exported:tt $field:ident $ty:ty) => {
        $crate::Attribute::column(::std::stringify!($field), $column, $exported)
    };
    (@attr (embed) $exported:tt $field:ident $ty:ty) => {
        $crate::Attribute::embedded::<$ty>(::std::stringify!($field), $exported)
    };
    (@attr (plain) $exported:tt $field:ident $ty:ty) => {
        $crate::Attribute::plain(::std::stringify!($field), $exported)
    };
}
