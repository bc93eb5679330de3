//! Contract descriptors
//!
//! A [`ContractDescriptor`] names a set of required operations and the
//! contracts it extends. Descriptors are supplied by the caller and are
//! immutable once built; they are shared as `Arc<ContractDescriptor>`.

use crate::error::{ContractParseError, SignatureError};
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Identity of a contract (its qualified name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    /// Create from a qualified name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Qualified name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    /// Capability contract (interface); the only adaptable kind
    #[default]
    Contract,

    /// Concrete or data type; rejected as an adaptation target
    Concrete,
}

/// Named set of required operations
///
/// Equality and hashing cover the full content: name, kind, operations in
/// declaration order, and every extended descriptor. Two descriptors that
/// share a name but not their operations are different contracts.
///
/// # Example
/// ```
/// use pond_model::{ContractDescriptor, Signature, TypeRef};
///
/// let contract = ContractDescriptor::builder("IReturnOnly")
///     .operation(Signature::new("ReturnOnlyInt").returns(TypeRef::int()))
///     .build()
///     .unwrap();
///
/// assert_eq!(contract.id().as_str(), "IReturnOnly");
/// assert_eq!(contract.operations().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractDescriptor {
    name: ContractId,

    #[serde(default)]
    kind: DescriptorKind,

    #[serde(default)]
    operations: Vec<Signature>,

    #[serde(default)]
    extends: Vec<Arc<ContractDescriptor>>,
}

impl ContractDescriptor {
    /// Start building a capability contract
    #[inline]
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            descriptor: Self {
                name: ContractId::new(name),
                kind: DescriptorKind::Contract,
                operations: Vec::new(),
                extends: Vec::new(),
            },
        }
    }

    /// Load a descriptor (and its nested bases) from JSON
    ///
    /// # Errors
    /// Returns [`ContractParseError`] for malformed JSON or signatures.
    pub fn from_json(json: &str) -> Result<Arc<Self>, ContractParseError> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate_tree()?;
        Ok(Arc::new(descriptor))
    }

    fn validate_tree(&self) -> Result<(), ContractParseError> {
        for sig in &self.operations {
            sig.validate().map_err(|source| ContractParseError::Signature {
                contract: self.name.to_string(),
                source,
            })?;
        }
        self.extends.iter().try_for_each(|base| base.validate_tree())
    }

    /// Contract identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ContractId {
        &self.name
    }

    /// Descriptor kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// True if this descriptor is a capability contract
    #[inline]
    #[must_use]
    pub fn is_contract(&self) -> bool {
        self.kind == DescriptorKind::Contract
    }

    /// Operations declared directly on this descriptor
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[Signature] {
        &self.operations
    }

    /// Directly extended contracts
    #[inline]
    #[must_use]
    pub fn extends(&self) -> &[Arc<ContractDescriptor>] {
        &self.extends
    }
}

impl Display for ContractDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for [`ContractDescriptor`]
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    descriptor: ContractDescriptor,
}

impl ContractBuilder {
    /// Declare a required operation
    #[inline]
    #[must_use]
    pub fn operation(mut self, signature: Signature) -> Self {
        self.descriptor.operations.push(signature);
        self
    }

    /// Extend another contract
    #[inline]
    #[must_use]
    pub fn extends(mut self, base: Arc<ContractDescriptor>) -> Self {
        self.descriptor.extends.push(base);
        self
    }

    /// Mark the descriptor as a concrete type rather than a contract
    #[inline]
    #[must_use]
    pub fn concrete(mut self) -> Self {
        self.descriptor.kind = DescriptorKind::Concrete;
        self
    }

    /// Finish building
    ///
    /// # Errors
    /// Returns the first malformed declared signature.
    pub fn build(self) -> Result<Arc<ContractDescriptor>, SignatureError> {
        for sig in &self.descriptor.operations {
            sig.validate()?;
        }
        Ok(Arc::new(self.descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRef;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_collects_operations_and_bases() {
        let base = ContractDescriptor::builder("IBase")
            .operation(Signature::new("A"))
            .build()
            .unwrap();
        let derived = ContractDescriptor::builder("IDerived")
            .extends(base.clone())
            .operation(Signature::new("B").returns(TypeRef::int()))
            .build()
            .unwrap();

        assert!(derived.is_contract());
        assert_eq!(derived.operations().len(), 1);
        assert_eq!(derived.extends()[0].id(), base.id());
    }

    #[test]
    fn builder_rejects_malformed_signature() {
        let result = ContractDescriptor::builder("IBad")
            .operation(Signature::new("Echo").param(TypeRef::generic(0)))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn concrete_kind() {
        let data = ContractDescriptor::builder("Swan").concrete().build().unwrap();
        assert_eq!(data.kind(), DescriptorKind::Concrete);
        assert!(!data.is_contract());
    }

    #[test]
    fn from_json_with_nested_base() {
        let json = r#"{
            "name": "IFlyingSwan",
            "operations": [
                { "name": "ReturnOnlyInt", "returns": { "named": "int" } },
                { "name": "OutArgs", "params": [ { "ty": { "named": "int" }, "mode": "out" } ] }
            ],
            "extends": [
                { "name": "IFlyer", "operations": [ { "name": "Fly", "returns": { "named": "string" } } ] }
            ]
        }"#;

        let contract = ContractDescriptor::from_json(json).unwrap();
        assert_eq!(contract.id().as_str(), "IFlyingSwan");
        assert_eq!(
            contract.operations()[1],
            Signature::new("OutArgs").out(TypeRef::int())
        );
        assert_eq!(contract.extends()[0].operations()[0].to_string(), "string Fly()");
    }

    #[test]
    fn from_json_rejects_bad_signature_in_base() {
        let json = r#"{
            "name": "I",
            "extends": [ { "name": "IBase", "operations": [ { "name": "" } ] } ]
        }"#;
        assert!(matches!(
            ContractDescriptor::from_json(json),
            Err(ContractParseError::Signature { .. })
        ));
    }

    #[test]
    fn identity_covers_content_not_just_name() {
        let narrow = ContractDescriptor::builder("IShape")
            .operation(Signature::new("A"))
            .build()
            .unwrap();
        let wide = ContractDescriptor::builder("IShape")
            .operation(Signature::new("A"))
            .operation(Signature::new("B"))
            .build()
            .unwrap();
        assert_eq!(narrow.id(), wide.id());
        assert_ne!(narrow, wide);

        let json = r#"{ "name": "IShape", "operations": [ { "name": "A" } ] }"#;
        let first = ContractDescriptor::from_json(json).unwrap();
        let second = ContractDescriptor::from_json(json).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(*first, *narrow);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            ContractDescriptor::from_json("{ not json"),
            Err(ContractParseError::Json(_))
        ));
    }
}
