/// Core Module for sqlrange
///
/// This module contains the components that stream typed rows between an
/// application and SQLite: shape declarations, field mapping, the
/// cancellation context, and the query and command pipelines.

pub mod context;
pub mod db;
pub mod error;
pub mod mapping;
pub mod shape;

// Re-export commonly used types for convenience
pub use error::{Result, SqlRangeError};
