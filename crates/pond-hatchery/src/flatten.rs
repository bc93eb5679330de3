//! Contract flattener
//!
//! Expands a contract and everything it extends into one deduplicated set
//! of required signatures. Base contracts are visited before the contract
//! that extends them, so the most specific declaration of a signature is
//! the last one seen and is recorded as its declaring contract.

use crate::error::InvalidContractError;
use indexmap::{IndexMap, IndexSet};
use pond_model::{ContractDescriptor, ContractId, Signature};

/// Required operations of a contract, inherited ones included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedContract {
    id: ContractId,
    required: IndexMap<Signature, ContractId>,
    lineage: IndexSet<ContractId>,
}

impl FlattenedContract {
    /// Contract that was flattened
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ContractId {
        &self.id
    }

    /// Unique required signatures in first-declaration order
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.required.keys()
    }

    /// Number of unique required signatures
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.required.len()
    }

    /// True if nothing is required
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Most specific contract declaring `signature`
    #[must_use]
    pub fn declared_by(&self, signature: &Signature) -> Option<&ContractId> {
        self.required.get(signature)
    }

    /// The contract followed by every contract it transitively extends
    #[must_use]
    pub fn lineage(&self) -> Vec<ContractId> {
        self.lineage.iter().cloned().collect()
    }
}

/// Flatten `contract` into its full requirement set
///
/// # Errors
/// [`InvalidContractError`] if `contract` or any contract it extends is
/// not a capability contract, or if `extends` nests deeper than
/// `max_depth`.
pub fn flatten(
    contract: &ContractDescriptor,
    max_depth: usize,
) -> Result<FlattenedContract, InvalidContractError> {
    let mut flat = FlattenedContract {
        id: contract.id().clone(),
        required: IndexMap::new(),
        lineage: IndexSet::new(),
    };
    visit(contract, contract.id(), 0, max_depth, &mut flat)?;
    Ok(flat)
}

fn visit(
    descriptor: &ContractDescriptor,
    root: &ContractId,
    depth: usize,
    max_depth: usize,
    flat: &mut FlattenedContract,
) -> Result<(), InvalidContractError> {
    if !descriptor.is_contract() {
        let reason = if descriptor.id() == root {
            "descriptor is a concrete type, not a capability contract".to_string()
        } else {
            format!("extends concrete type {}", descriptor.id())
        };
        return Err(InvalidContractError::new(root.clone(), reason));
    }

    if depth > max_depth {
        return Err(InvalidContractError::new(
            root.clone(),
            format!("extends chain deeper than {max_depth}"),
        ));
    }

    // Diamond: a base reached twice contributes once.
    if !flat.lineage.insert(descriptor.id().clone()) {
        return Ok(());
    }

    for base in descriptor.extends() {
        visit(base, root, depth + 1, max_depth, flat)?;
    }

    for signature in descriptor.operations() {
        flat.required
            .insert(signature.clone(), descriptor.id().clone());
    }

    Ok(())
}
