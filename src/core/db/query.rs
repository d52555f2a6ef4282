/// Query Streaming Module
///
/// Turns a cursor into a lazy, single-pass sequence of decoded rows, and
/// wires a submitted query into that sequence.
///
/// Every item is a `Result<R>`. The first `Err` ends the sequence, and the
/// cursor is closed on every exit path: exhaustion, error, or the consumer
/// dropping the sequence early.
use super::store::{Cursor, Queryable};
use crate::core::context::Context;
use crate::core::mapping::{field_map, FieldMap};
use crate::core::shape::{target_at, Shape};
use crate::core::{Result, SqlRangeError};
use rusqlite::types::Value;
use std::any::type_name;
use std::iter::FusedIterator;
use std::mem;
use std::sync::Arc;
use tracing::{debug, warn};

enum ScanState {
    /// Columns not yet resolved against the field map.
    Pending,
    Streaming {
        columns: Vec<String>,
        /// Field map entry bound to each result column, if any.
        bindings: Vec<Option<usize>>,
    },
    Closed,
}

/// Lazy sequence of rows decoded from a cursor.
///
/// The row buffer is moved out on every successful step and replaced by
/// `R::default()`, so a row that a later decode only partially overwrites
/// never carries stale values.
pub struct Scan<R: Shape, C: Cursor> {
    cursor: C,
    map: Arc<FieldMap>,
    state: ScanState,
    row: R,
}

/// Returns the rows of `cursor` as a lazy sequence of `R`.
///
/// Result columns are matched by name against the columns `R` declares.
/// A result column that `R` does not map fails the first row with
/// [`SqlRangeError::UnscannableTarget`].
pub fn scan<R: Shape, C: Cursor>(cursor: C) -> Scan<R, C> {
    Scan {
        cursor,
        map: field_map::<R>(),
        state: ScanState::Pending,
        row: R::default(),
    }
}

impl<R: Shape, C: Cursor> Scan<R, C> {
    fn bind(&self, columns: &[String]) -> Vec<Option<usize>> {
        columns
            .iter()
            .map(|column| {
                self.map
                    .entries()
                    .iter()
                    .rposition(|entry| entry.column == column.as_str())
            })
            .collect()
    }

    /// Decodes the cursor's current row into the row buffer.
    fn decode_current(&mut self) -> Result<()> {
        let Scan {
            cursor,
            map,
            state,
            row,
        } = self;
        let ScanState::Streaming { columns, bindings } = state else {
            return Ok(());
        };

        cursor.decode_row(&mut |index, value| {
            let column = columns.get(index).map(String::as_str).unwrap_or("");
            let unscannable = || SqlRangeError::UnscannableTarget {
                column: column.to_string(),
                index,
            };
            let entry = bindings.get(index).copied().flatten().ok_or_else(unscannable)?;
            let target = target_at(&mut *row, &map.entries()[entry].path).ok_or_else(unscannable)?;
            target
                .scan(value)
                .map_err(|e| SqlRangeError::decode(column, e))
        })
    }

    /// Closes the cursor and marks the sequence finished.
    fn close(&mut self) -> Result<()> {
        if matches!(self.state, ScanState::Closed) {
            return Ok(());
        }
        self.state = ScanState::Closed;
        self.row = R::default();
        debug!(shape = type_name::<R>(), "closing cursor");
        self.cursor.close()
    }

    /// Closes the cursor after an error was already reported to the consumer.
    fn close_quietly(&mut self) {
        if let Err(e) = self.close() {
            warn!(shape = type_name::<R>(), error = %e, "cursor close failed after error");
        }
    }

    fn fail(&mut self, err: SqlRangeError) -> Option<Result<R>> {
        self.close_quietly();
        Some(Err(err))
    }
}

impl<R: Shape, C: Cursor> Iterator for Scan<R, C> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Result<R>> {
        if let ScanState::Pending = self.state {
            let columns = match self.cursor.columns() {
                Ok(columns) => columns,
                Err(e) => return self.fail(e),
            };
            let bindings = self.bind(&columns);
            self.state = ScanState::Streaming { columns, bindings };
        }
        if let ScanState::Closed = self.state {
            return None;
        }

        if !self.cursor.advance() {
            if let Some(e) = self.cursor.take_err() {
                return self.fail(e);
            }
            return match self.close() {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            };
        }

        match self.decode_current() {
            Ok(()) => Some(Ok(mem::take(&mut self.row))),
            Err(e) => self.fail(e),
        }
    }
}

impl<R: Shape, C: Cursor> FusedIterator for Scan<R, C> {}

impl<R: Shape, C: Cursor> Drop for Scan<R, C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(shape = type_name::<R>(), error = %e, "cursor close failed on early stop");
        }
    }
}

enum QueryState<R: Shape, C: Cursor> {
    Failed(Option<SqlRangeError>),
    Scanning(Scan<R, C>),
}

/// Lazy sequence of rows returned by [`query`].
pub struct Query<'q, R: Shape, Q: Queryable + 'q> {
    state: QueryState<R, Q::Cursor<'q>>,
}

/// Submits `text` to `q` immediately and streams its results as `R` rows.
///
/// A failed submission yields exactly one `Err` and the sequence ends
/// without a cursor ever being opened.
///
/// A typical use of query is:
///
/// ```ignore
/// for person in query::<Person, _>(&ctx, &conn, "SELECT age, name FROM people", &[]) {
///     let person = person?;
///     ...
/// }
/// ```
pub fn query<'q, R, Q>(ctx: &Context, q: &'q Q, text: &str, args: &[Value]) -> Query<'q, R, Q>
where
    R: Shape,
    Q: Queryable + 'q,
{
    let state = match q.submit_query(ctx, text, args) {
        Ok(cursor) => QueryState::Scanning(scan(cursor)),
        Err(e) => {
            debug!(sql = text, error = %e, "query submission failed");
            QueryState::Failed(Some(e))
        }
    };
    Query { state }
}

/// Like [`query`] with [`Context::background`].
pub fn query_background<'q, R, Q>(q: &'q Q, text: &str, args: &[Value]) -> Query<'q, R, Q>
where
    R: Shape,
    Q: Queryable + 'q,
{
    query(&Context::background(), q, text, args)
}

impl<'q, R: Shape, Q: Queryable + 'q> Iterator for Query<'q, R, Q> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Result<R>> {
        match &mut self.state {
            QueryState::Failed(err) => err.take().map(Err),
            QueryState::Scanning(rows) => rows.next(),
        }
    }
}

impl<'q, R: Shape, Q: Queryable + 'q> FusedIterator for Query<'q, R, Q> {}
