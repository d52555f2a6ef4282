/// Mapping Module
///
/// Discovers which attributes of a shape correspond to which store columns:
/// - **Mapper** (`mapper.rs`): pure computation of a shape's field map
/// - **Cache** (`cache.rs`): process-wide, lock-free memoization of field maps
pub mod cache;
pub mod mapper;

pub use cache::{field_map, fields, FieldCache};
pub use mapper::{compute_field_map, FieldEntry, FieldMap, FieldPath};
