//! Adapter instances
//!
//! A [`Duck`] wraps one host object and exposes it through a synthesized
//! [`AdapterType`]. Every call performs exactly one delegated call on the
//! wrapped object and returns its result unchanged; by-reference and output
//! arguments are written back into the caller's argument slice.

use crate::synthesis::AdapterType;
use pond_model::{
    ContractId, Introspect, InvokeError, Receiver, Signature, TypeInfo, TypeRef, Value,
    GETTER_PREFIX, INDEXER_NAME, SETTER_PREFIX,
};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Host object viewed through a contract
#[derive(Clone)]
pub struct Duck {
    adapter: Arc<AdapterType>,
    wrapped: Arc<Receiver>,
}

impl Duck {
    pub(crate) fn new(adapter: Arc<AdapterType>, wrapped: Arc<Receiver>) -> Self {
        Self { adapter, wrapped }
    }

    /// Adapter type of this instance
    #[inline]
    #[must_use]
    pub fn adapter_type(&self) -> &Arc<AdapterType> {
        &self.adapter
    }

    /// Contract this duck was adapted to
    #[inline]
    #[must_use]
    pub fn contract(&self) -> &ContractId {
        self.adapter.contract()
    }

    /// True if the adapter nominally implements `contract`
    ///
    /// Holds for the target contract and everything it extends.
    #[inline]
    #[must_use]
    pub fn implements(&self, contract: &ContractId) -> bool {
        self.adapter.implements(contract)
    }

    /// Borrow the wrapped object as `T`
    #[must_use]
    pub fn wrapped<T: Any>(&self) -> Option<&T> {
        self.wrapped.downcast_ref::<T>()
    }

    /// Shared handle to the wrapped object
    #[inline]
    #[must_use]
    pub fn wrapped_object(&self) -> &Arc<Receiver> {
        &self.wrapped
    }

    /// Call the contract operation with `signature`
    ///
    /// # Errors
    /// [`InvokeError::UnknownOperation`] if the contract does not require
    /// `signature`, otherwise whatever the wrapped implementation reports.
    pub fn invoke(&self, signature: &Signature, args: &mut [Value]) -> Result<Value, InvokeError> {
        self.invoke_generic(signature, &[], args)
    }

    /// Call a generic contract operation with explicit type arguments
    ///
    /// # Errors
    /// See [`Duck::invoke`]; also [`InvokeError::GenericArity`] when
    /// `type_args` does not match the signature.
    pub fn invoke_generic(
        &self,
        signature: &Signature,
        type_args: &[TypeRef],
        args: &mut [Value],
    ) -> Result<Value, InvokeError> {
        self.adapter
            .target(signature)
            .ok_or_else(|| InvokeError::UnknownOperation(signature.to_string()))?
            .invoke(&*self.wrapped, type_args, args)
    }

    /// Call the only contract operation named `name`
    ///
    /// # Errors
    /// [`InvokeError::UnknownOperation`] if no operation has that name,
    /// [`InvokeError::AmbiguousName`] if it is overloaded.
    pub fn call(&self, name: &str, args: &mut [Value]) -> Result<Value, InvokeError> {
        let mut named = self.adapter.operations().filter(|sig| sig.name() == name);
        let signature = named
            .next()
            .ok_or_else(|| InvokeError::UnknownOperation(name.to_string()))?
            .clone();

        let others = named.count();
        if others > 0 {
            return Err(InvokeError::AmbiguousName {
                name: name.to_string(),
                count: others + 1,
            });
        }
        self.invoke(&signature, args)
    }

    /// Read property `property`
    ///
    /// # Errors
    /// See [`Duck::call`].
    pub fn get(&self, property: &str) -> Result<Value, InvokeError> {
        self.call(&format!("{GETTER_PREFIX}{property}"), &mut [])
    }

    /// Write property `property`
    ///
    /// # Errors
    /// See [`Duck::call`].
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<(), InvokeError> {
        self.call(&format!("{SETTER_PREFIX}{property}"), &mut [value.into()])?;
        Ok(())
    }

    /// Read through the indexer
    ///
    /// # Errors
    /// See [`Duck::call`].
    pub fn index_get(&self, keys: &[Value]) -> Result<Value, InvokeError> {
        let mut args = keys.to_vec();
        self.call(&format!("{GETTER_PREFIX}{INDEXER_NAME}"), &mut args)
    }

    /// Write through the indexer
    ///
    /// # Errors
    /// See [`Duck::call`].
    pub fn index_set(&self, keys: &[Value], value: impl Into<Value>) -> Result<(), InvokeError> {
        let mut args = keys.to_vec();
        args.push(value.into());
        self.call(&format!("{SETTER_PREFIX}{INDEXER_NAME}"), &mut args)?;
        Ok(())
    }
}

impl Introspect for Duck {
    fn type_info(&self) -> Arc<TypeInfo> {
        self.adapter.type_info()
    }
}

impl Debug for Duck {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duck")
            .field("adapter", &self.adapter.name())
            .field("wrapped", &self.adapter.wrapped_type().name())
            .finish()
    }
}
