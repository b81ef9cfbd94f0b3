use ahash::AHashMap;

use crate::registry::TypeId;
use crate::value::Value;

/// Explicit store for the per-type singletons.
///
/// One map from `(type, optional name)` to the cached instance: the unnamed
/// singleton of a type lives under `None`, named singletons under their key.
/// Entries are never evicted during normal operation; [`SingletonStore::reset`]
/// exists so tests can start from a clean table.
#[derive(Default)]
pub(crate) struct SingletonStore {
    entries: AHashMap<(TypeId, Option<String>), Value>,
}

impl SingletonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ty: TypeId, name: Option<&str>) -> Option<Value> {
        self.entries.get(&(ty, name.map(str::to_string))).cloned()
    }

    pub fn insert(&mut self, ty: TypeId, name: Option<String>, value: Value) {
        self.entries.insert((ty, name), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
