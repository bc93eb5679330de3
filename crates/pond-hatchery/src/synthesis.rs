//! Adapter synthesizer
//!
//! Turns a complete [`SignatureMap`] into a new adapter type through a
//! [`Materializer`], the code-materialization backend. The default backend,
//! [`DispatchMaterializer`], materializes the adapter as a dispatch table:
//! one forwarding entry per required signature, bound to the matched
//! operation of the wrapped type.
//!
//! # Construction contract
//! - exactly one storage field holding the wrapped instance
//! - nominal implementation of the contract and everything it extends
//! - one forwarding operation per required signature, returning the
//!   delegated result verbatim

use crate::duck::Duck;
use crate::error::{AdaptationError, HatcheryError, InvalidContractError, MaterializeError};
use crate::flatten::FlattenedContract;
use crate::matcher::SignatureMap;
use indexmap::IndexMap;
use pond_model::{
    CallFrame, ContractId, InvokeError, Invoker, Operation, Receiver, Signature, TypeInfo, TypeKey,
};
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Base type every adapter derives from
pub const ADAPTER_BASE: &str = "DuckPond.Base";

/// Name of the storage field holding the wrapped instance
pub const WRAPPED_FIELD: &str = "_wrapped";

/// Code-materialization backend
pub trait Materializer: Send + Sync + Debug {
    /// Begin a new adapter type
    ///
    /// # Errors
    /// [`MaterializeError`] if the backend cannot define the type.
    fn define_type(
        &self,
        name: &str,
        base: &str,
        contracts: &[ContractId],
    ) -> Result<Box<dyn AdapterTypeBuilder>, MaterializeError>;
}

/// Type under construction by a [`Materializer`]
pub trait AdapterTypeBuilder: Send {
    /// Define the storage field for the wrapped instance
    ///
    /// # Errors
    /// [`MaterializeError`] if the backend rejects the field.
    fn define_field(&mut self, name: &str, ty: &TypeKey) -> Result<(), MaterializeError>;

    /// Define a forwarding operation for `signature` that calls `target`
    ///
    /// # Errors
    /// [`MaterializeError`] if the backend rejects the operation.
    fn define_operation(&mut self, signature: Signature, target: Operation)
        -> Result<(), MaterializeError>;

    /// Complete the type
    ///
    /// # Errors
    /// [`MaterializeError`] if the type is incomplete or cannot be loaded.
    fn finalize(self: Box<Self>) -> Result<AdapterType, MaterializeError>;
}

/// Materializes adapters as in-memory dispatch tables
#[derive(Debug, Clone)]
pub struct DispatchMaterializer {
    module: Arc<str>,
}

impl DispatchMaterializer {
    /// Create backend owning adapters in `module`
    #[inline]
    #[must_use]
    pub fn new(module: &str) -> Self {
        Self {
            module: Arc::from(module),
        }
    }

    /// Module that owns the synthesized types
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

impl Materializer for DispatchMaterializer {
    fn define_type(
        &self,
        name: &str,
        base: &str,
        contracts: &[ContractId],
    ) -> Result<Box<dyn AdapterTypeBuilder>, MaterializeError> {
        let Some(primary) = contracts.first() else {
            return Err(MaterializeError::Backend(format!(
                "{name} implements no contract"
            )));
        };

        Ok(Box::new(DispatchTypeBuilder {
            key: TypeKey::new(name),
            module: Arc::clone(&self.module),
            base: base.to_string(),
            contract: primary.clone(),
            lineage: contracts.to_vec(),
            field: None,
            table: IndexMap::new(),
        }))
    }
}

struct DispatchTypeBuilder {
    key: TypeKey,
    module: Arc<str>,
    base: String,
    contract: ContractId,
    lineage: Vec<ContractId>,
    field: Option<(String, TypeKey)>,
    table: IndexMap<Signature, Operation>,
}

impl AdapterTypeBuilder for DispatchTypeBuilder {
    fn define_field(&mut self, name: &str, ty: &TypeKey) -> Result<(), MaterializeError> {
        if self.field.is_some() {
            return Err(MaterializeError::DuplicateField(name.to_string()));
        }
        self.field = Some((name.to_string(), ty.clone()));
        Ok(())
    }

    fn define_operation(
        &mut self,
        signature: Signature,
        target: Operation,
    ) -> Result<(), MaterializeError> {
        if self.table.contains_key(&signature) {
            return Err(MaterializeError::DuplicateOperation(signature.to_string()));
        }
        self.table.insert(signature, target);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<AdapterType, MaterializeError> {
        let Self {
            key,
            module,
            base,
            contract,
            lineage,
            field,
            table,
        } = *self;

        let (field_name, wrapped) =
            field.ok_or_else(|| MaterializeError::MissingField(key.name().to_string()))?;

        let forwarders = table
            .keys()
            .map(|signature| forwarding_operation(&key, signature))
            .collect();

        let info =
            TypeInfo::from_parts(key, TypeId::of::<Duck>(), forwarders, lineage.clone())
                .map_err(|e| MaterializeError::Backend(e.to_string()))?;

        Ok(AdapterType {
            info: Arc::new(info),
            module,
            base,
            field_name,
            wrapped,
            contract,
            lineage: lineage.into_iter().collect(),
            table,
        })
    }
}

// Reflection-facing entry point: lets an adapter be called (and adapted)
// through its own TypeInfo like any host type.
fn forwarding_operation(adapter: &TypeKey, signature: &Signature) -> Operation {
    let expected = adapter.clone();
    let sig = signature.clone();
    let invoker: Invoker = Arc::new(move |receiver: &Receiver, frame: &mut CallFrame<'_>| {
        let duck = receiver
            .downcast_ref::<Duck>()
            .filter(|duck| duck.adapter_type().key() == &expected)
            .ok_or_else(|| InvokeError::ReceiverMismatch {
                expected: expected.name().to_string(),
            })?;
        let (type_args, args) = frame.parts();
        duck.invoke_generic(&sig, type_args, args)
    });
    Operation::new(signature.clone(), adapter.name(), invoker)
}

/// Synthesized adapter type
///
/// Created once per (candidate type, contract) pair and owned by the
/// hatchery's cache for the life of the process.
pub struct AdapterType {
    info: Arc<TypeInfo>,
    module: Arc<str>,
    base: String,
    field_name: String,
    wrapped: TypeKey,
    contract: ContractId,
    lineage: HashSet<ContractId>,
    table: IndexMap<Signature, Operation>,
}

impl AdapterType {
    /// Adapter type identity
    #[inline]
    #[must_use]
    pub fn key(&self) -> &TypeKey {
        self.info.key()
    }

    /// Adapter type name, `{Candidate}_as_{Contract}`
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// Module owning this type
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Base type name
    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Name of the storage field
    #[inline]
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Type of the wrapped instance
    #[inline]
    #[must_use]
    pub fn wrapped_type(&self) -> &TypeKey {
        &self.wrapped
    }

    /// Contract this adapter was synthesized for
    #[inline]
    #[must_use]
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// True if the adapter nominally implements `contract`
    #[inline]
    #[must_use]
    pub fn implements(&self, contract: &ContractId) -> bool {
        self.lineage.contains(contract)
    }

    /// Required signatures this adapter forwards
    pub fn operations(&self) -> impl Iterator<Item = &Signature> {
        self.table.keys()
    }

    /// Matched implementation forwarded to for `signature`
    #[inline]
    #[must_use]
    pub fn target(&self, signature: &Signature) -> Option<&Operation> {
        self.table.get(signature)
    }

    /// Reflection view of the adapter type itself
    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Arc<TypeInfo> {
        Arc::clone(&self.info)
    }

    /// Construct an adapter instance around `wrapped`
    ///
    /// # Errors
    /// [`HatcheryError::WrappedTypeMismatch`] if `wrapped_type` is not the
    /// type this adapter was synthesized for, or `wrapped` is not an
    /// instance of it.
    pub fn instantiate(
        self: &Arc<Self>,
        wrapped: Arc<Receiver>,
        wrapped_type: &TypeInfo,
    ) -> Result<Duck, HatcheryError> {
        if wrapped_type.key() != &self.wrapped {
            return Err(HatcheryError::WrappedTypeMismatch {
                expected: self.wrapped.name().to_string(),
                actual: wrapped_type.name().to_string(),
            });
        }
        if !wrapped_type.describes(&*wrapped) {
            return Err(HatcheryError::WrappedTypeMismatch {
                expected: self.wrapped.name().to_string(),
                actual: String::from("instance of another Rust type"),
            });
        }
        Ok(Duck::new(Arc::clone(self), wrapped))
    }
}

impl Debug for AdapterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterType")
            .field("name", &self.name())
            .field("module", &self.module)
            .field("wrapped", &self.wrapped.name())
            .field("contract", &self.contract)
            .field("operations", &self.table.len())
            .finish()
    }
}

/// Synthesize the adapter type for `candidate` and `contract`
///
/// # Errors
/// - [`HatcheryError::Adaptation`] if `map` does not cover every required
///   signature of `contract`; nothing is synthesized in that case
/// - [`HatcheryError::InvalidArgument`] if `map` forwards a signature
///   `contract` does not require
/// - [`HatcheryError::Materialization`] if the backend fails
pub fn synthesize(
    materializer: &dyn Materializer,
    candidate: &TypeInfo,
    contract: &FlattenedContract,
    map: SignatureMap,
) -> Result<AdapterType, HatcheryError> {
    let covered: HashSet<&Signature> = map.entries().iter().map(|m| &m.required).collect();
    let unmatched: Vec<Signature> = contract
        .signatures()
        .filter(|sig| !covered.contains(sig))
        .cloned()
        .collect();
    if !unmatched.is_empty() {
        return Err(AdaptationError {
            contract: contract.id().clone(),
            candidate: candidate.name().to_string(),
            unmatched,
        }
        .into());
    }
    if let Some(extra) = map
        .entries()
        .iter()
        .find(|m| contract.declared_by(&m.required).is_none())
    {
        return Err(InvalidContractError::new(
            contract.id().clone(),
            format!("signature map forwards {}, which is not required", extra.required),
        )
        .into());
    }

    let type_name = format!("{}_as_{}", candidate.name(), contract.id());
    let materialization = |source: MaterializeError| HatcheryError::Materialization {
        type_name: type_name.clone(),
        source,
    };

    let mut builder = materializer
        .define_type(&type_name, ADAPTER_BASE, &contract.lineage())
        .map_err(materialization)?;
    builder
        .define_field(WRAPPED_FIELD, candidate.key())
        .map_err(materialization)?;
    for entry in map {
        builder
            .define_operation(entry.required, entry.implementation)
            .map_err(materialization)?;
    }
    builder.finalize().map_err(materialization)
}
