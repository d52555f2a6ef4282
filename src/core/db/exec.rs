/// Command Execution Module
///
/// Drives one store command per element of an input sequence and yields the
/// outcome of each execution lazily. Nothing runs until the consumer pulls.
use super::store::{ExecResult, Executable};
use crate::config::ExecConfig;
use crate::core::context::Context;
use crate::core::mapping::field_map;
use crate::core::shape::{extract_value, Shape};
use crate::core::{Result, SqlRangeError};
use rusqlite::types::Value;
use std::any::type_name;
use std::iter::FusedIterator;
use tracing::{debug, trace};

/// Appends the arguments of one command for a row to the buffer.
pub type ArgsFn<R> = Box<dyn FnMut(&mut Vec<Value>, &R) -> Result<()>>;

/// Produces the command text for a row from the base text.
pub type QueryFn<R> = Box<dyn FnMut(&str, &R) -> String>;

/// A functional option applied to [`ExecOptions`] before the pipeline starts.
pub type ExecOption<R> = Box<dyn FnOnce(&mut ExecOptions<R>)>;

/// Configuration of a write pipeline.
///
/// Without an argument builder, [`exec`] derives one from the row shape's
/// field map. Without a query function, the base text is used unchanged.
pub struct ExecOptions<R> {
    args: Option<ArgsFn<R>>,
    query: Option<QueryFn<R>>,
    arg_capacity: usize,
}

impl<R> Default for ExecOptions<R> {
    fn default() -> Self {
        ExecOptions {
            args: None,
            query: None,
            arg_capacity: 0,
        }
    }
}

impl<R> ExecOptions<R> {
    pub fn new() -> Self {
        ExecOptions::default()
    }

    pub fn from_config(config: &ExecConfig) -> Self {
        ExecOptions {
            arg_capacity: config.arg_capacity.unwrap_or(0),
            ..ExecOptions::default()
        }
    }

    pub fn args(mut self, args: impl FnMut(&mut Vec<Value>, &R) -> Result<()> + 'static) -> Self {
        self.args = Some(Box::new(args));
        self
    }

    pub fn query(mut self, query: impl FnMut(&str, &R) -> String + 'static) -> Self {
        self.query = Some(Box::new(query));
        self
    }

    pub fn arg_capacity(mut self, capacity: usize) -> Self {
        self.arg_capacity = capacity;
        self
    }

    /// Applies `options` in order; a later option overrides an earlier one.
    pub fn apply(mut self, options: impl IntoIterator<Item = ExecOption<R>>) -> Self {
        for option in options {
            option(&mut self);
        }
        self
    }
}

/// Option setting the argument builder.
///
/// The builder must append to the buffer it receives; the buffer is emptied
/// before every call.
pub fn exec_args<R: 'static>(args: impl FnMut(&mut Vec<Value>, &R) -> Result<()> + 'static) -> ExecOption<R> {
    let args: ArgsFn<R> = Box::new(args);
    Box::new(move |options: &mut ExecOptions<R>| options.args = Some(args))
}

/// Option setting the function that derives each command's text from the
/// base text and the row, e.g. to add placeholders for a batch insert.
pub fn exec_query<R: 'static>(query: impl FnMut(&str, &R) -> String + 'static) -> ExecOption<R> {
    let query: QueryFn<R> = Box::new(query);
    Box::new(move |options: &mut ExecOptions<R>| options.query = Some(query))
}

/// Option setting the initial capacity of the argument buffer.
pub fn exec_arg_capacity<R: 'static>(capacity: usize) -> ExecOption<R> {
    Box::new(move |options: &mut ExecOptions<R>| options.arg_capacity = capacity)
}

/// Option taking the arguments from the attributes mapped to `columns`, in
/// the order given.
///
/// Fails with [`SqlRangeError::ColumnNotFound`] if a column is not mapped by `R`.
pub fn exec_args_fields<R: Shape>(columns: &[&str]) -> Result<ExecOption<R>> {
    let map = field_map::<R>();
    let paths = columns
        .iter()
        .map(|column| {
            map.path(column)
                .cloned()
                .ok_or_else(|| SqlRangeError::ColumnNotFound(column.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(exec_args(move |args: &mut Vec<Value>, row: &R| {
        for path in &paths {
            args.push(extract_value(row, path)?);
        }
        Ok(())
    }))
}

fn shape_args<R: Shape>() -> ArgsFn<R> {
    let map = field_map::<R>();
    Box::new(move |args: &mut Vec<Value>, row: &R| {
        for (_, path) in map.iter() {
            args.push(extract_value(row, path)?);
        }
        Ok(())
    })
}

/// Lazy sequence of command outcomes returned by [`exec`] and [`exec_with`].
pub struct Exec<'e, R, E: ?Sized, I> {
    ctx: Context,
    executable: &'e E,
    text: String,
    input: I,
    args_fn: Option<ArgsFn<R>>,
    query_fn: Option<QueryFn<R>>,
    args: Vec<Value>,
    done: bool,
}

/// Executes `text` once for each row of `input`.
///
/// Options are applied in order over the defaults, which take the arguments
/// from every mapped attribute of `R` in field map order. To run the commands
/// atomically, pass a transaction as the executable:
///
/// ```ignore
/// let tx = conn.transaction()?;
/// for res in exec(&ctx, &tx, "INSERT INTO people (age, name) VALUES (?, ?)", rows, []) {
///     res?;
/// }
/// tx.commit()?;
/// ```
pub fn exec<'e, R, E, I>(
    ctx: &Context,
    executable: &'e E,
    text: &str,
    input: I,
    options: impl IntoIterator<Item = ExecOption<R>>,
) -> Exec<'e, R, E, I::IntoIter>
where
    R: Shape,
    E: Executable + ?Sized,
    I: IntoIterator<Item = Result<R>>,
{
    let mut options = ExecOptions::new().apply(options);
    if options.args.is_none() {
        options.args = Some(shape_args::<R>());
    }
    exec_with(ctx, executable, text, input, options)
}

/// Like [`exec`] with [`Context::background`].
pub fn exec_background<'e, R, E, I>(
    executable: &'e E,
    text: &str,
    input: I,
    options: impl IntoIterator<Item = ExecOption<R>>,
) -> Exec<'e, R, E, I::IntoIter>
where
    R: Shape,
    E: Executable + ?Sized,
    I: IntoIterator<Item = Result<R>>,
{
    exec(&Context::background(), executable, text, input, options)
}

/// Executes `text` once for each element of `input` using fully built options.
///
/// Elements need not be shapes, which allows batching: with `Vec<Row>`
/// elements, an argument builder appending every row's values and a query
/// function adding one placeholder group per row insert a whole batch per
/// command. Without an argument builder the first step fails with
/// [`SqlRangeError::Config`].
pub fn exec_with<'e, R, E, I>(
    ctx: &Context,
    executable: &'e E,
    text: &str,
    input: I,
    options: ExecOptions<R>,
) -> Exec<'e, R, E, I::IntoIter>
where
    E: Executable + ?Sized,
    I: IntoIterator<Item = Result<R>>,
{
    Exec {
        ctx: ctx.clone(),
        executable,
        text: text.to_string(),
        input: input.into_iter(),
        args_fn: options.args,
        query_fn: options.query,
        args: Vec::with_capacity(options.arg_capacity),
        done: false,
    }
}

impl<'e, R, E, I> Exec<'e, R, E, I>
where
    E: Executable + ?Sized,
    I: Iterator<Item = Result<R>>,
{
    fn step(&mut self, row: R) -> Result<ExecResult> {
        let args_fn = self
            .args_fn
            .as_mut()
            .ok_or_else(|| SqlRangeError::Config("no argument builder configured".to_string()))?;

        self.args.clear();
        args_fn(&mut self.args, &row)?;

        let result = match self.query_fn.as_mut() {
            Some(query_fn) => {
                let text = query_fn(&self.text, &row);
                trace!(sql = %text, args = self.args.len(), "executing command");
                self.executable.submit_command(&self.ctx, &text, &self.args)
            }
            None => {
                trace!(sql = %self.text, args = self.args.len(), "executing command");
                self.executable.submit_command(&self.ctx, &self.text, &self.args)
            }
        };
        if let Err(e) = &result {
            debug!(row = type_name::<R>(), error = %e, "command failed");
        }
        result
    }
}

impl<'e, R, E, I> Iterator for Exec<'e, R, E, I>
where
    E: Executable + ?Sized,
    I: Iterator<Item = Result<R>>,
{
    type Item = Result<ExecResult>;

    fn next(&mut self) -> Option<Result<ExecResult>> {
        if self.done {
            return None;
        }
        let row = match self.input.next() {
            None => {
                self.done = true;
                return None;
            }
            Some(Err(e)) => {
                self.done = true;
                return Some(Err(e));
            }
            Some(Ok(row)) => row,
        };

        let result = self.step(row);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl<'e, R, E, I> FusedIterator for Exec<'e, R, E, I>
where
    E: Executable + ?Sized,
    I: Iterator<Item = Result<R>>,
{
}
