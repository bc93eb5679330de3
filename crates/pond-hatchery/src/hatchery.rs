//! Adapter cache
//!
//! The [`Hatchery`] owns every synthesized adapter type, keyed by
//! (candidate type identity, contract content). A contract is identified
//! by its whole descriptor, so two descriptors sharing a name but not
//! their operations never share an adapter. Per key the lifecycle is
//! `absent -> resolving -> ready`; a failed attempt leaves the key absent
//! so every later call re-runs the match and reports its own error. Ready
//! entries are never evicted.

use crate::config::HatcheryConfig;
use crate::duck::Duck;
use crate::error::HatcheryError;
use crate::flatten::flatten;
use crate::matcher::resolve;
use crate::synthesis::{synthesize, AdapterType, DispatchMaterializer, Materializer};
use moka::sync::Cache;
use pond_model::{ContractDescriptor, Introspect, Receiver, TypeInfo, TypeKey};
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key: one adapter type per pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    candidate: TypeKey,
    contract: ContractDescriptor,
}

impl CacheKey {
    fn new(candidate: &TypeInfo, contract: &ContractDescriptor) -> Self {
        Self {
            candidate: candidate.key().clone(),
            contract: contract.clone(),
        }
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HatcheryStats {
    /// Adapter types currently published
    pub adapter_types: u64,
    /// Adapter types synthesized
    pub syntheses: u64,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that had to resolve
    pub misses: u64,
}

/// Adapter factory and cache
pub struct Hatchery {
    config: HatcheryConfig,
    materializer: Arc<dyn Materializer>,
    types: Cache<CacheKey, Arc<AdapterType>>,
    syntheses: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Hatchery {
    /// Create hatchery with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HatcheryConfig::default())
    }

    /// Create hatchery with the dispatch-table backend
    #[must_use]
    pub fn with_config(config: HatcheryConfig) -> Self {
        let materializer = Arc::new(DispatchMaterializer::new(&config.module_name));
        Self::with_materializer(config, materializer)
    }

    /// Create hatchery with a custom materialization backend
    #[must_use]
    pub fn with_materializer(config: HatcheryConfig, materializer: Arc<dyn Materializer>) -> Self {
        Self {
            config,
            materializer,
            // No capacity bound, no expiry: ready entries live for the process.
            types: Cache::builder().build(),
            syntheses: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HatcheryConfig {
        &self.config
    }

    /// Adapt `instance` to `contract`
    ///
    /// # Errors
    /// - [`HatcheryError::InvalidArgument`] if `contract` is not a
    ///   capability contract
    /// - [`HatcheryError::Adaptation`] if the instance's type does not
    ///   structurally satisfy it
    /// - [`HatcheryError::Materialization`] if the backend fails
    pub fn adapt<T: Introspect>(
        &self,
        instance: Arc<T>,
        contract: &ContractDescriptor,
    ) -> Result<Duck, HatcheryError> {
        let info = instance.type_info();
        self.adapt_dyn(instance, &info, contract)
    }

    /// Adapt a type-erased instance described by `info`
    ///
    /// # Errors
    /// See [`Hatchery::adapt`]; also [`HatcheryError::WrappedTypeMismatch`]
    /// if `instance` is not of the type `info` describes.
    pub fn adapt_dyn(
        &self,
        instance: Arc<Receiver>,
        info: &TypeInfo,
        contract: &ContractDescriptor,
    ) -> Result<Duck, HatcheryError> {
        let adapter = self.adapter_type_for(info, contract)?;
        adapter.instantiate(instance, info)
    }

    /// Resolve or synthesize the adapter type without instantiating it
    ///
    /// # Errors
    /// See [`Hatchery::adapt`].
    pub fn adapter_type_for(
        &self,
        candidate: &TypeInfo,
        contract: &ContractDescriptor,
    ) -> Result<Arc<AdapterType>, HatcheryError> {
        let key = CacheKey::new(candidate, contract);

        if let Some(adapter) = self.types.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(adapter);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            "Adapter cache miss: {} as {}",
            candidate.name(),
            contract.id()
        );

        // Racing callers for one key wait on a single init; a failed
        // init is not stored.
        self.types
            .try_get_with(key, || self.build(candidate, contract))
            .map_err(|e| (*e).clone())
    }

    fn build(
        &self,
        candidate: &TypeInfo,
        contract: &ContractDescriptor,
    ) -> Result<Arc<AdapterType>, HatcheryError> {
        let flat = flatten(contract, self.config.max_extends_depth)?;

        let map = match resolve(candidate, &flat) {
            Ok(map) => map,
            Err(e) => {
                tracing::debug!("Adaptation rejected: {}", e);
                return Err(e.into());
            }
        };

        tracing::debug!(
            "Synthesizing adapter for {} as {} ({} operations)",
            candidate.name(),
            flat.id(),
            map.len()
        );

        let adapter = synthesize(self.materializer.as_ref(), candidate, &flat, map).map_err(|e| {
            if !e.is_recoverable() {
                tracing::error!("Adapter synthesis failed: {}", e);
            }
            e
        })?;

        self.syntheses.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "Published adapter type {} in {}",
            adapter.name(),
            adapter.module()
        );

        Ok(Arc::new(adapter))
    }

    /// Check whether `instance` can be adapted to `contract`
    ///
    /// Never fails and never synthesizes.
    #[must_use]
    pub fn can_adapt<T: Introspect>(&self, instance: &T, contract: &ContractDescriptor) -> bool {
        self.can_adapt_type(&instance.type_info(), contract)
    }

    /// Check whether instances of `candidate` can be adapted to `contract`
    #[must_use]
    pub fn can_adapt_type(&self, candidate: &TypeInfo, contract: &ContractDescriptor) -> bool {
        let key = CacheKey::new(candidate, contract);
        if self.types.contains_key(&key) {
            return true;
        }

        flatten(contract, self.config.max_extends_depth)
            .ok()
            .is_some_and(|flat| resolve(candidate, &flat).is_ok())
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> HatcheryStats {
        self.types.run_pending_tasks();
        HatcheryStats {
            adapter_types: self.types.entry_count(),
            syntheses: self.syntheses.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for Hatchery {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Hatchery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hatchery")
            .field("config", &self.config)
            .field("materializer", &self.materializer)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaterializeError;
    use crate::synthesis::AdapterTypeBuilder;
    use pond_model::{ContractId, Signature, TypeRef, Value};

    struct Answer;

    impl Introspect for Answer {
        fn type_info(&self) -> Arc<TypeInfo> {
            pond_model::TypeRegistry::global().get_or_register::<Self>(|| {
                TypeInfo::builder::<Self>("Answer")
                    .method(Signature::new("Get").returns(TypeRef::int()), |_, _| {
                        Ok(Value::Int(42))
                    })
                    .build()
                    .unwrap()
            })
        }
    }

    fn contract() -> Arc<ContractDescriptor> {
        ContractDescriptor::builder("IGet")
            .operation(Signature::new("Get").returns(TypeRef::int()))
            .build()
            .unwrap()
    }

    #[derive(Debug)]
    struct Broken;

    impl Materializer for Broken {
        fn define_type(
            &self,
            _name: &str,
            _base: &str,
            _contracts: &[ContractId],
        ) -> Result<Box<dyn AdapterTypeBuilder>, MaterializeError> {
            Err(MaterializeError::Backend("no code space".into()))
        }
    }

    #[test]
    fn second_lookup_hits_cache() {
        let hatchery = Hatchery::new();
        let contract = contract();

        let a = hatchery.adapt(Arc::new(Answer), &contract).unwrap();
        let b = hatchery.adapt(Arc::new(Answer), &contract).unwrap();

        assert!(Arc::ptr_eq(a.adapter_type(), b.adapter_type()));
        let stats = hatchery.stats();
        assert_eq!(stats.syntheses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.adapter_types, 1);
    }

    #[test]
    fn adapter_module_follows_config() {
        let hatchery = Hatchery::with_config(HatcheryConfig::new().with_module_name("ponds"));
        let adapter = hatchery
            .adapter_type_for(&Answer.type_info(), &contract())
            .unwrap();
        assert_eq!(adapter.module(), "ponds");
        assert_eq!(adapter.name(), "Answer_as_IGet");
    }

    #[test]
    fn backend_failure_is_fatal_and_not_cached() {
        let hatchery = Hatchery::with_materializer(HatcheryConfig::new(), Arc::new(Broken));
        let contract = contract();

        for _ in 0..2 {
            let err = hatchery.adapt(Arc::new(Answer), &contract).unwrap_err();
            assert!(!err.is_recoverable());
        }
        let stats = hatchery.stats();
        assert_eq!(stats.adapter_types, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.syntheses, 0);
    }

    #[test]
    fn can_adapt_does_not_synthesize() {
        let hatchery = Hatchery::new();
        assert!(hatchery.can_adapt(&Answer, &contract()));
        assert_eq!(hatchery.stats().syntheses, 0);

        let wider = ContractDescriptor::builder("IGetSet")
            .operation(Signature::new("Get").returns(TypeRef::int()))
            .operation(Signature::new("Set").param(TypeRef::int()))
            .build()
            .unwrap();
        assert!(!hatchery.can_adapt(&Answer, &wider));
    }

    #[test]
    fn extends_depth_follows_config() {
        let hatchery = Hatchery::with_config(HatcheryConfig::new().with_max_extends_depth(0));
        let derived = ContractDescriptor::builder("IDerived")
            .extends(contract())
            .build()
            .unwrap();

        let err = hatchery.adapt(Arc::new(Answer), &derived).unwrap_err();
        assert!(matches!(err, HatcheryError::InvalidArgument(_)));
        assert!(!hatchery.can_adapt(&Answer, &derived));
    }
}
