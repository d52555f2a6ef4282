/// SQLite Store Module
///
/// Implements the store contracts on top of `rusqlite`, and opens
/// connections from configuration.
use super::store::{Cursor, ExecResult, Executable, Queryable};
use crate::config::SqliteConfig;
use crate::core::context::Context;
use crate::core::{Result, SqlRangeError};
use fallible_streaming_iterator::FallibleStreamingIterator;
use ouroboros::self_referencing;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Rows, Statement, Transaction};
use std::time::Duration;
use tracing::debug;

#[self_referencing]
struct RowsCell<'conn> {
    statement: Statement<'conn>,
    #[borrows(mut statement)]
    #[not_covariant]
    rows: Rows<'this>,
}

/// Opens a connection and applies the configured pragmas.
pub fn open_connection(config: &SqliteConfig) -> Result<Connection> {
    let conn = match config.path.as_deref() {
        None | Some(":memory:") => Connection::open_in_memory()?,
        Some(path) => Connection::open(path)?,
    };

    for pragma in &config.pragmas {
        conn.execute_batch(&format!("PRAGMA {};", pragma))
            .map_err(|e| SqlRangeError::Config(format!("PRAGMA {} failed: {}", pragma, e)))?;
    }
    if let Some(ms) = config.busy_timeout_ms {
        conn.busy_timeout(Duration::from_millis(ms))?;
    }
    if let Some(capacity) = config.statement_cache_capacity {
        conn.set_prepared_statement_cache_capacity(capacity);
    }

    debug!(path = ?config.path, pragmas = config.pragmas.len(), "opened sqlite connection");
    Ok(conn)
}

/// Cursor over a prepared SQLite statement.
///
/// Rows are stepped one at a time and decoded straight from the statement,
/// so column values are only copied by the targets that read them. Dropping
/// the cursor resets the statement.
pub struct SqliteCursor<'conn> {
    cell: Option<RowsCell<'conn>>,
    columns: Vec<String>,
    ctx: Context,
    err: Option<SqlRangeError>,
}

impl<'conn> SqliteCursor<'conn> {
    fn new(ctx: &Context, stmt: Statement<'conn>) -> Self {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        SqliteCursor {
            cell: Some(RowsCell::new(stmt, |stmt| stmt.raw_query())),
            columns,
            ctx: ctx.clone(),
            err: None,
        }
    }
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&mut self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn advance(&mut self) -> bool {
        let Some(cell) = self.cell.as_mut() else {
            return false;
        };
        if self.err.is_some() {
            return false;
        }
        if let Err(e) = self.ctx.check() {
            self.err = Some(e);
            return false;
        }

        match cell.with_rows_mut(|rows| rows.next().map(|row| row.is_some())) {
            Ok(has_row) => has_row,
            Err(e) => {
                self.err = Some(SqlRangeError::Finalize(e.to_string()));
                false
            }
        }
    }

    fn decode_row(&mut self, sink: &mut dyn FnMut(usize, ValueRef<'_>) -> Result<()>) -> Result<()> {
        let width = self.columns.len();
        let Some(cell) = self.cell.as_ref() else {
            return Ok(());
        };
        cell.with_rows(|rows| -> Result<()> {
            let Some(row) = rows.get() else {
                return Ok(());
            };
            for index in 0..width {
                sink(index, row.get_ref(index)?)?;
            }
            Ok(())
        })
    }

    fn take_err(&mut self) -> Option<SqlRangeError> {
        self.err.take()
    }

    fn close(&mut self) -> Result<()> {
        match self.cell.take() {
            Some(cell) => cell
                .into_heads()
                .statement
                .finalize()
                .map_err(|e| SqlRangeError::Close(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Queryable for Connection {
    type Cursor<'a> = SqliteCursor<'a> where Self: 'a;

    fn submit_query<'a>(&'a self, ctx: &Context, text: &str, args: &[Value]) -> Result<SqliteCursor<'a>> {
        ctx.check()?;
        debug!(sql = text, args = args.len(), "submitting query");

        let mut stmt = self.prepare(text)?;
        let expected = stmt.parameter_count();
        if expected != args.len() {
            return Err(rusqlite::Error::InvalidParameterCount(args.len(), expected).into());
        }
        for (index, arg) in args.iter().enumerate() {
            stmt.raw_bind_parameter(index + 1, arg)?;
        }
        Ok(SqliteCursor::new(ctx, stmt))
    }
}

impl Executable for Connection {
    fn submit_command(&self, ctx: &Context, text: &str, args: &[Value]) -> Result<ExecResult> {
        ctx.check()?;
        let mut stmt = self.prepare_cached(text)?;
        let affected = stmt.execute(params_from_iter(args.iter()))?;
        // SQLite keeps the rowid of the connection's latest INSERT; it only
        // belongs to this command when the command changed rows.
        let last_insert_id = (affected > 0).then(|| self.last_insert_rowid());
        Ok(ExecResult::new(affected as u64, last_insert_id))
    }
}

impl Queryable for Transaction<'_> {
    type Cursor<'a> = SqliteCursor<'a> where Self: 'a;

    fn submit_query<'a>(&'a self, ctx: &Context, text: &str, args: &[Value]) -> Result<SqliteCursor<'a>> {
        let conn: &'a Connection = self;
        conn.submit_query(ctx, text, args)
    }
}

impl Executable for Transaction<'_> {
    fn submit_command(&self, ctx: &Context, text: &str, args: &[Value]) -> Result<ExecResult> {
        let conn: &Connection = self;
        conn.submit_command(ctx, text, args)
    }
}
