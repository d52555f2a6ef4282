/// Field Mapping Module
///
/// Computes, for a shape, the ordered list of `(column, path)` pairs that tie
/// store columns to attributes. Mapping is a pure function of the shape's
/// attribute declarations.
use crate::core::shape::{Attribute, Shape};
use std::fmt;
use std::ops::Deref;

/// Location of one attribute inside a possibly nested shape.
///
/// Each index selects an attribute of the record at that depth; every index
/// but the last selects an embedded sub-shape.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(Vec<usize>);

impl FieldPath {
    pub fn new(indices: Vec<usize>) -> Self {
        FieldPath(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for FieldPath {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    pub column: &'static str,
    pub path: FieldPath,
}

/// Ordered column-to-attribute mapping for one shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMap {
    entries: Vec<FieldEntry>,
}

impl FieldMap {
    /// Computes the field map of `S` without consulting the cache.
    pub fn of<S: Shape>() -> Self {
        compute_field_map(&S::attributes())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in depth-first declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldPath)> + '_ {
        self.entries.iter().map(|e| (e.column, &e.path))
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.column).collect()
    }

    /// Path of the attribute mapped to `column`.
    ///
    /// When several attributes declare the same column, the last declared one wins.
    pub fn path(&self, column: &str) -> Option<&FieldPath> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.column == column)
            .map(|e| &e.path)
    }
}

/// Computes the field map described by `attributes`.
///
/// Unexported attributes are skipped. Exported anonymous sub-shapes are
/// flattened recursively; their attributes need no annotation on the parent.
/// Any other attribute is included only if it carries a non-empty column
/// annotation.
pub fn compute_field_map(attributes: &[Attribute]) -> FieldMap {
    let mut entries = Vec::new();
    let mut prefix = Vec::new();
    append_fields(&mut entries, &mut prefix, attributes);
    FieldMap { entries }
}

fn append_fields(entries: &mut Vec<FieldEntry>, prefix: &mut Vec<usize>, attributes: &[Attribute]) {
    for (index, attribute) in attributes.iter().enumerate() {
        if !attribute.exported {
            continue;
        }
        prefix.push(index);
        if let Some(nested) = attribute.embedded {
            append_fields(entries, prefix, &nested());
        } else if let Some(column) = attribute.column.filter(|c| !c.is_empty()) {
            entries.push(FieldEntry {
                column,
                path: FieldPath::new(prefix.clone()),
            });
        }
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::shape! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Timestamps {
            #[column = "created_at"] pub created_at: i64,
            #[column = "updated_at"] pub updated_at: i64,
        }
    }

    crate::shape! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Owner {
            #[column = "owner_id"] pub owner_id: i64,
            #[embed] pub stamps: Timestamps,
        }
    }

    crate::shape! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Document {
            #[column = "id"] pub id: i64,
            pub title_cache: String,
            #[embed] pub owner: Owner,
            #[column = "hidden"] hidden: i64,
            #[embed] private_stamps: Timestamps,
            #[column = "body"] pub body: String,
        }
    }

    #[test]
    fn test_flat_shape() {
        let map = FieldMap::of::<Timestamps>();
        assert_eq!(map.columns(), vec!["created_at", "updated_at"]);
        assert_eq!(map.path("updated_at").unwrap().as_slice(), &[1]);
    }

    #[test]
    fn test_nested_embedding_depth_first() {
        let map = FieldMap::of::<Document>();
        let pairs: Vec<(&str, Vec<usize>)> = map
            .iter()
            .map(|(column, path)| (column, path.to_vec()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("id", vec![0]),
                ("owner_id", vec![2, 0]),
                ("created_at", vec![2, 1, 0]),
                ("updated_at", vec![2, 1, 1]),
                ("body", vec![5]),
            ]
        );
    }

    #[test]
    fn test_excludes_unexported_and_unannotated() {
        let map = FieldMap::of::<Document>();
        assert!(map.path("hidden").is_none());
        assert_eq!(map.len(), 5);
        assert!(!map.columns().contains(&"title_cache"));
    }

    #[test]
    fn test_empty_annotation_is_ignored() {
        let attrs = [
            Attribute::column("a", "", true),
            Attribute::column("b", "b", true),
        ];
        let map = compute_field_map(&attrs);
        assert_eq!(map.columns(), vec!["b"]);
        assert_eq!(map.path("b").unwrap().as_slice(), &[1]);
    }

    #[test]
    fn test_duplicate_column_last_declared_wins() {
        let attrs = [
            Attribute::column("first", "dup", true),
            Attribute::column("second", "dup", true),
        ];
        let map = compute_field_map(&attrs);
        assert_eq!(map.len(), 2);
        assert_eq!(map.path("dup").unwrap().as_slice(), &[1]);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        assert_eq!(FieldMap::of::<Document>(), FieldMap::of::<Document>());
    }
}
