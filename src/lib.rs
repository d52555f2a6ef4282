//! Stream typed rows in and out of SQLite.
//!
//! Rows are plain structs declared with [`shape!`], whose annotated fields
//! map to store columns. [`query`] decodes a result set into a lazy sequence
//! of rows; [`exec`] runs one command per row of an input sequence. Both
//! sequences are single-pass, stop at the first error, and release their
//! store resources as soon as the consumer stops pulling.
//!
//! ```ignore
//! sqlrange::shape! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Person {
//!         #[column = "age"] pub age: i64,
//!         #[column = "name"] pub name: String,
//!     }
//! }
//!
//! let ctx = Context::background();
//! for person in query::<Person, _>(&ctx, &conn, "SELECT age, name FROM people", &[]) {
//!     println!("{:?}", person?);
//! }
//! ```

// Core infrastructure modules
pub mod core;
mod macros;

// Feature-specific modules
pub mod config;

#[cfg(test)]
mod test_utils;

pub use crate::config::{load_config, Config, ExecConfig, SqliteConfig};
pub use crate::core::context::{CancelHandle, Context};
pub use crate::core::db::{
    exec, exec_arg_capacity, exec_args, exec_args_fields, exec_background, exec_query, exec_with,
    open_connection, query, query_background, scan, ArgsFn, Cursor, Exec, ExecOption, ExecOptions,
    ExecResult, Executable, Query, QueryFn, Queryable, Scan, SqliteCursor,
};
pub use crate::core::mapping::{
    compute_field_map, field_map, fields, FieldCache, FieldEntry, FieldMap, FieldPath,
};
pub use crate::core::shape::{Attr, AttrMut, Attribute, Record, ScanTarget, Shape, ToValue};
pub use crate::core::{Result, SqlRangeError};
pub use rusqlite::types::{Value, ValueRef};
