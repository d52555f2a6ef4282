/// Store Contracts Module
///
/// The narrow interfaces through which pipelines reach a data store. The
/// driver, pooling and transactions stay on the other side of these traits.
use crate::core::context::Context;
use crate::core::{Result, SqlRangeError};
use rusqlite::types::{Value, ValueRef};

/// A live, exclusively owned result stream of one query.
pub trait Cursor {
    /// Ordered names of the result columns.
    fn columns(&mut self) -> Result<Vec<String>>;

    /// Moves to the next row. Returns false once the stream is exhausted or
    /// failed; [`Cursor::take_err`] tells the two apart.
    fn advance(&mut self) -> bool;

    /// Passes every column value of the current row to `sink`, in column order.
    ///
    /// Stops at, and returns, the first error the sink reports.
    fn decode_row(&mut self, sink: &mut dyn FnMut(usize, ValueRef<'_>) -> Result<()>) -> Result<()>;

    /// Final status of the stream once [`Cursor::advance`] returned false.
    fn take_err(&mut self) -> Option<SqlRangeError>;

    /// Releases the stream, aborting it if it was not exhausted.
    ///
    /// Only the first call does any work.
    fn close(&mut self) -> Result<()>;
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn columns(&mut self) -> Result<Vec<String>> {
        (**self).columns()
    }

    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn decode_row(&mut self, sink: &mut dyn FnMut(usize, ValueRef<'_>) -> Result<()>) -> Result<()> {
        (**self).decode_row(sink)
    }

    fn take_err(&mut self) -> Option<SqlRangeError> {
        (**self).take_err()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A store handle that can run read queries.
pub trait Queryable {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Submits `text` with `args` and returns the cursor over its results.
    fn submit_query<'a>(&'a self, ctx: &Context, text: &str, args: &[Value]) -> Result<Self::Cursor<'a>>;
}

/// A store handle that can run commands.
pub trait Executable {
    fn submit_command(&self, ctx: &Context, text: &str, args: &[Value]) -> Result<ExecResult>;
}

/// Outcome of one executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        ExecResult {
            rows_affected,
            last_insert_id,
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Identifier generated by the command, when the store reports one.
    pub fn last_insert_id(&self) -> Result<i64> {
        self.last_insert_id.ok_or(SqlRangeError::NoInsertId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_result_accessors() {
        let res = ExecResult::new(3, Some(42));
        assert_eq!(res.rows_affected(), 3);
        assert_eq!(res.last_insert_id().unwrap(), 42);

        let res = ExecResult::new(1, None);
        assert!(matches!(res.last_insert_id(), Err(SqlRangeError::NoInsertId)));
    }
}
