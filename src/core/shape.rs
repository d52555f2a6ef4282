/// Shape Declaration Module
///
/// A *shape* is the structural type of one row. Rust has no runtime struct
/// reflection, so a shape describes itself: [`Shape::attributes`] lists its
/// attributes in declaration order, and [`Record`] gives positional access to
/// the attribute values of one instance. The [`shape!`](crate::shape) macro
/// writes both impls from an ordinary struct declaration.
use crate::core::{Result, SqlRangeError};
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;

/// A value that can be appended to a command's argument list.
pub trait ToValue {
    fn to_value(&self) -> std::result::Result<Value, String>;
}

impl<T: ToSql> ToValue for T {
    fn to_value(&self) -> std::result::Result<Value, String> {
        match self.to_sql().map_err(|e| e.to_string())? {
            ToSqlOutput::Owned(value) => Ok(value),
            ToSqlOutput::Borrowed(value) => Ok(value.into()),
            _ => Err("unsupported SQL output kind".to_string()),
        }
    }
}

/// A value that a cursor can decode a column into, in place.
pub trait ScanTarget {
    fn scan(&mut self, value: ValueRef<'_>) -> FromSqlResult<()>;
}

impl<T: FromSql> ScanTarget for T {
    fn scan(&mut self, value: ValueRef<'_>) -> FromSqlResult<()> {
        *self = T::column_result(value)?;
        Ok(())
    }
}

/// Read access to one attribute of a record.
pub enum Attr<'a> {
    Value(&'a dyn ToValue),
    Embedded(&'a dyn Record),
}

/// Write access to one attribute of a record.
pub enum AttrMut<'a> {
    Value(&'a mut dyn ScanTarget),
    Embedded(&'a mut dyn Record),
}

/// Positional access to the attributes of a row value.
///
/// `index` is the attribute's position in [`Shape::attributes`]. Attributes
/// that can never be mapped (unannotated, unexported) may return `None`.
pub trait Record {
    fn attr(&self, index: usize) -> Option<Attr<'_>>;
    fn attr_mut(&mut self, index: usize) -> Option<AttrMut<'_>>;
}

/// The structural type of one row.
///
/// `Default` is the shape's zero value: every error item carries it, and the
/// scanner resets its row buffer to it between rows.
pub trait Shape: Record + Default + 'static {
    fn attributes() -> Vec<Attribute>;
}

/// Declaration of one attribute of a shape.
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    pub name: &'static str,
    /// Explicit column annotation, if any.
    pub column: Option<&'static str>,
    pub exported: bool,
    /// Set for an anonymous embedded sub-shape.
    pub embedded: Option<fn() -> Vec<Attribute>>,
}

impl Attribute {
    /// An attribute annotated with a store column name.
    pub const fn column(name: &'static str, column: &'static str, exported: bool) -> Self {
        Attribute {
            name,
            column: Some(column),
            exported,
            embedded: None,
        }
    }

    /// An attribute without a column annotation.
    pub const fn plain(name: &'static str, exported: bool) -> Self {
        Attribute {
            name,
            column: None,
            exported,
            embedded: None,
        }
    }

    /// An anonymous embedded sub-shape whose attributes are flattened into the parent.
    pub fn embedded<S: Shape>(name: &'static str, exported: bool) -> Self {
        Attribute {
            name,
            column: None,
            exported,
            embedded: Some(S::attributes),
        }
    }
}

/// Resolves `path` to the readable value it addresses inside `record`.
pub fn value_at<'r>(record: &'r dyn Record, path: &[usize]) -> Option<&'r dyn ToValue> {
    let (&first, rest) = path.split_first()?;
    match record.attr(first)? {
        Attr::Value(value) if rest.is_empty() => Some(value),
        Attr::Embedded(inner) if !rest.is_empty() => value_at(inner, rest),
        _ => None,
    }
}

/// Resolves `path` to the scan target it addresses inside `record`.
pub fn target_at<'r>(record: &'r mut dyn Record, path: &[usize]) -> Option<&'r mut dyn ScanTarget> {
    let (&first, rest) = path.split_first()?;
    match record.attr_mut(first)? {
        AttrMut::Value(target) if rest.is_empty() => Some(target),
        AttrMut::Embedded(inner) if !rest.is_empty() => target_at(inner, rest),
        _ => None,
    }
}

/// Converts the attribute at `path` into an owned store value.
pub(crate) fn extract_value(record: &dyn Record, path: &[usize]) -> Result<Value> {
    let value = value_at(record, path).ok_or_else(|| SqlRangeError::Value {
        path: path.to_vec(),
        message: "path does not address a value attribute".to_string(),
    })?;
    value.to_value().map_err(|message| SqlRangeError::Value {
        path: path.to_vec(),
        message,
    })
}
