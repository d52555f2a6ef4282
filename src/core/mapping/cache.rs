/// Field Cache Module
///
/// Process-wide memoization of field maps keyed by shape type. The cache is
/// an immutable snapshot behind an atomically swapped pointer: lookups never
/// take a lock, and a miss publishes a whole new snapshot.
use super::mapper::{compute_field_map, FieldMap, FieldPath};
use crate::core::shape::Shape;
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type Snapshot = HashMap<TypeId, Arc<FieldMap>>;

static GLOBAL: Lazy<FieldCache> = Lazy::new(FieldCache::new);

/// Copy-on-write cache of field maps.
pub struct FieldCache {
    snapshot: ArcSwap<Snapshot>,
}

impl FieldCache {
    pub fn new() -> Self {
        FieldCache {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// The cache shared by every pipeline in the process.
    pub fn global() -> &'static FieldCache {
        &GLOBAL
    }

    /// Returns the field map of `S`, computing and publishing it on first use.
    ///
    /// Concurrent first lookups may each compute the map; all of them return
    /// value-equal results and the snapshot keeps exactly one entry.
    pub fn get<S: Shape>(&self) -> Arc<FieldMap> {
        let key = TypeId::of::<S>();
        if let Some(map) = self.snapshot.load().get(&key) {
            return Arc::clone(map);
        }

        let computed = Arc::new(compute_field_map(&S::attributes()));
        debug!(
            shape = type_name::<S>(),
            columns = computed.len(),
            "computed field map"
        );

        self.snapshot.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.entry(key).or_insert_with(|| Arc::clone(&computed));
            next
        });

        self.snapshot
            .load()
            .get(&key)
            .map(Arc::clone)
            .unwrap_or(computed)
    }

    /// Number of shapes currently cached.
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }
}

impl Default for FieldCache {
    fn default() -> Self {
        FieldCache::new()
    }
}

/// Returns the field map of `S` from the process-wide cache.
pub fn field_map<S: Shape>() -> Arc<FieldMap> {
    FieldCache::global().get::<S>()
}

/// Returns the mapped `(column, path)` pairs of `S` in declaration order.
pub fn fields<S: Shape>() -> Vec<(&'static str, FieldPath)> {
    field_map::<S>()
        .iter()
        .map(|(column, path)| (column, path.clone()))
        .collect()
}
