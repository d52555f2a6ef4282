/// # Test Utilities Module
///
/// Shared fixtures for the streaming tests:
/// - In-memory SQLite databases with a `people` table
/// - The `Person` row shape used across tests
/// - A scripted cursor that records how it is driven
/// - An executor that records the commands it receives
use crate::config::SqliteConfig;
use crate::core::context::Context;
use crate::core::db::{open_connection, Cursor, ExecResult, Executable};
use crate::core::{Result, SqlRangeError};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

crate::shape! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        #[column = "age"] pub age: i64,
        #[column = "name"] pub name: String,
    }
}

impl Person {
    pub fn new(age: i64, name: &str) -> Self {
        Person {
            age,
            name: name.to_string(),
        }
    }
}

/// Routes `tracing` output to the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Creates an isolated in-memory database with an empty `people` table.
pub fn empty_people_db() -> Connection {
    let config = SqliteConfig {
        path: None,
        pragmas: vec!["foreign_keys = ON".to_string(), "journal_mode = MEMORY".to_string()],
        statement_cache_capacity: Some(16),
        busy_timeout_ms: None,
    };
    let conn = open_connection(&config).expect("open in-memory database");
    conn.execute_batch(
        "
        CREATE TABLE people (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            age INTEGER NOT NULL,
            name TEXT NOT NULL,
            bdate TEXT
        );
    ",
    )
    .expect("create people table");
    conn
}

/// Creates an in-memory database seeded with Alice, Bob and Chris.
pub fn people_db() -> Connection {
    let conn = empty_people_db();
    for (age, name) in [(1, "Alice"), (2, "Bob"), (3, "Chris")] {
        conn.execute(
            "INSERT INTO people (age, name) VALUES (?1, ?2)",
            rusqlite::params![age, name],
        )
        .expect("seed people");
    }
    conn
}

/// Cursor replaying a fixed result set.
pub struct ScriptedCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    columns_error: Option<String>,
    trailing_error: Option<SqlRangeError>,
    close_error: Option<String>,
    closed: bool,
    closes: Arc<AtomicUsize>,
    advances: Arc<AtomicUsize>,
}

impl ScriptedCursor {
    pub fn new(columns: &[&str]) -> Self {
        ScriptedCursor {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: VecDeque::new(),
            current: None,
            columns_error: None,
            trailing_error: None,
            close_error: None,
            closed: false,
            closes: Arc::new(AtomicUsize::new(0)),
            advances: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push_back(values);
        self
    }

    pub fn columns_error(mut self, message: &str) -> Self {
        self.columns_error = Some(message.to_string());
        self
    }

    pub fn trailing_error(mut self, err: SqlRangeError) -> Self {
        self.trailing_error = Some(err);
        self
    }

    pub fn close_error(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    /// Number of times `close` released the cursor.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    /// Number of times `advance` was called while open.
    pub fn advance_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.advances)
    }
}

impl Cursor for ScriptedCursor {
    fn columns(&mut self) -> Result<Vec<String>> {
        match &self.columns_error {
            Some(message) => Err(SqlRangeError::Columns(message.clone())),
            None => Ok(self.columns.clone()),
        }
    }

    fn advance(&mut self) -> bool {
        assert!(!self.closed, "advance on a closed cursor");
        self.advances.fetch_add(1, Ordering::SeqCst);
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn decode_row(&mut self, sink: &mut dyn FnMut(usize, ValueRef<'_>) -> Result<()>) -> Result<()> {
        let row = self.current.as_ref().expect("decode without a current row");
        for (index, value) in row.iter().enumerate() {
            sink(index, ValueRef::from(value))?;
        }
        Ok(())
    }

    fn take_err(&mut self) -> Option<SqlRangeError> {
        self.trailing_error.take()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_error.take() {
            Some(message) => Err(SqlRangeError::Close(message)),
            None => Ok(()),
        }
    }
}

/// Executor recording every command it receives.
pub struct CountingExecutor {
    calls: RefCell<Vec<(String, Vec<Value>)>>,
    fail_at: Option<usize>,
}

impl CountingExecutor {
    pub fn new() -> Self {
        CountingExecutor {
            calls: RefCell::new(Vec::new()),
            fail_at: None,
        }
    }

    /// Fails the `call`-th command (1-based); earlier commands succeed.
    pub fn failing_at(call: usize) -> Self {
        CountingExecutor {
            fail_at: Some(call),
            ..CountingExecutor::new()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.borrow().clone()
    }
}

impl Executable for CountingExecutor {
    fn submit_command(&self, ctx: &Context, text: &str, args: &[Value]) -> Result<ExecResult> {
        ctx.check()?;
        let mut calls = self.calls.borrow_mut();
        calls.push((text.to_string(), args.to_vec()));
        if self.fail_at == Some(calls.len()) {
            return Err(SqlRangeError::Database(rusqlite::Error::ExecuteReturnedResults));
        }
        Ok(ExecResult::new(1, Some(calls.len() as i64)))
    }
}

/// Error testing utilities
pub mod error_testing {
    /// Verify error message quality (non-empty, descriptive, names the failing operation)
    pub fn verify_error_message_quality<T, E>(result: &std::result::Result<T, E>, context: &str)
    where
        T: std::fmt::Debug,
        E: std::fmt::Display,
    {
        match result {
            Ok(value) => panic!("Expected error but got Ok({:?}) in {}", value, context),
            Err(error) => {
                let error_str = error.to_string();
                assert!(!error_str.is_empty(), "Error message should not be empty in {}", context);
                assert!(error_str.len() > 10, "Error message should be descriptive in {}", context);

                let lower = error_str.to_lowercase();
                let has_operation_context = lower.contains("failed")
                    || lower.contains("error")
                    || lower.contains("cancelled")
                    || lower.contains("exceeded")
                    || lower.contains("not found")
                    || lower.contains("unscannable");
                assert!(
                    has_operation_context,
                    "Error should indicate what operation failed: '{}' in {}",
                    error_str, context
                );
            }
        }
    }
}
