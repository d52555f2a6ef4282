/// Database Module
///
/// The row-streaming engine, organized into focused submodules:
/// - **Store Contracts** (`store.rs`): the cursor and store-handle traits pipelines consume
/// - **SQLite** (`sqlite.rs`): `rusqlite` implementations of those contracts
/// - **Query Streaming** (`query.rs`): decoding cursors into lazy row sequences
/// - **Command Execution** (`exec.rs`): driving one command per input row
///
/// ## Error Handling
///
/// Every failure is delivered as the `Err` item of the sequence it belongs to,
/// using the shared `SqlRangeError` type; the sequence ends right after it.
pub mod exec;
pub mod query;
pub mod sqlite;
pub mod store;

pub use exec::*;
pub use query::*;
pub use sqlite::*;
pub use store::*;
