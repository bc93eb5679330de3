//! Per-Rust-type [`TypeInfo`] registry
//!
//! Guarantees that every Rust type (and every instantiation of a generic
//! Rust type) is described by exactly one published `TypeInfo`, so that
//! type identity is stable for the life of the process.

use crate::object::TypeInfo;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::Arc;

static GLOBAL: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

/// Registry of published type descriptions keyed by Rust [`TypeId`]
#[derive(Debug, Default)]
pub struct TypeRegistry {
    infos: DashMap<TypeId, Arc<TypeInfo>>,
}

impl TypeRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            infos: DashMap::new(),
        }
    }

    /// Process-wide registry
    #[inline]
    #[must_use]
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Published description of `T`, building it with `init` on first use
    ///
    /// `init` runs outside any registry lock so it may itself consult the
    /// registry (e.g. to inherit from a base type). Under a race `init` may
    /// run more than once; only the first published result is ever returned.
    pub fn get_or_register<T: Any>(&self, init: impl FnOnce() -> TypeInfo) -> Arc<TypeInfo> {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = self.infos.get(&type_id) {
            return Arc::clone(existing.value());
        }

        let built = Arc::new(init());
        Arc::clone(self.infos.entry(type_id).or_insert(built).value())
    }

    /// Published description of `T`, if any
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<Arc<TypeInfo>> {
        self.infos
            .get(&TypeId::of::<T>())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of published descriptions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// True if nothing has been published
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}
