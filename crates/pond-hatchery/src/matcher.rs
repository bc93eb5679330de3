//! Signature matcher
//!
//! Resolves each required signature of a flattened contract against the
//! operations of a candidate type. Matching is exact, with no coercion:
//!
//! - same operation name
//! - same parameter count, passing modes equal pairwise
//! - parameter types equal pairwise (generic placeholders by position and
//!   constraint)
//! - return type equal under the same rule
//! - generic arity equal
//!
//! Because the full signature takes part, overloads disambiguate
//! themselves. A requirement matched by more than one candidate operation
//! is a broken invariant and panics.

use crate::error::AdaptationError;
use crate::flatten::FlattenedContract;
use pond_model::{Operation, Param, Signature, TypeInfo};
use std::collections::HashMap;

/// One required signature paired with its implementation
#[derive(Debug, Clone)]
pub struct MethodMap {
    /// Signature required by the contract
    pub required: Signature,
    /// Candidate operation that satisfies it
    pub implementation: Operation,
}

/// Total association from required signatures to implementations
///
/// Only [`resolve`] constructs this type, and only when every required
/// signature matched; a partially populated map cannot exist.
#[derive(Debug, Clone)]
pub struct SignatureMap {
    entries: Vec<MethodMap>,
}

impl SignatureMap {
    /// Entries in contract order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[MethodMap] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for an empty contract
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for SignatureMap {
    type Item = MethodMap;
    type IntoIter = std::vec::IntoIter<MethodMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Check a candidate signature against a required one
#[must_use]
pub fn signatures_match(required: &Signature, candidate: &Signature) -> bool {
    required.name() == candidate.name()
        && required.arity() == candidate.arity()
        && required
            .params()
            .iter()
            .zip(candidate.params())
            .all(|(r, c)| params_match(r, c))
        && required.return_type() == candidate.return_type()
        && required.generic_arity() == candidate.generic_arity()
}

fn params_match(required: &Param, candidate: &Param) -> bool {
    required.is_by_ref() == candidate.is_by_ref()
        && required.is_output() == candidate.is_output()
        && required.ty == candidate.ty
}

/// Find the unique operation of `candidates` matching `required`
///
/// # Panics
/// If more than one candidate matches; signature comparison is exact, so
/// this only happens when a type description violates the one-operation-
/// per-signature invariant.
#[must_use]
pub fn find_implementation<'a>(
    required: &Signature,
    candidates: &[&'a Operation],
) -> Option<&'a Operation> {
    let mut matches = candidates
        .iter()
        .copied()
        .filter(|op| signatures_match(required, op.signature()));

    let found = matches.next()?;
    if let Some(second) = matches.next() {
        panic!(
            "ambiguous structural match for {required}: {} (declared by {}) and {} (declared by {})",
            found.signature(),
            found.declared_by(),
            second.signature(),
            second.declared_by(),
        );
    }
    Some(found)
}

/// Resolve every requirement of `contract` against `candidate`
///
/// # Errors
/// [`AdaptationError`] listing every unmatched required signature; no map
/// is produced unless all of them match.
pub fn resolve(
    candidate: &TypeInfo,
    contract: &FlattenedContract,
) -> Result<SignatureMap, AdaptationError> {
    let mut by_name: HashMap<&str, Vec<&Operation>> = HashMap::new();
    for op in candidate.operations() {
        by_name.entry(op.signature().name()).or_default().push(op);
    }

    let mut entries = Vec::with_capacity(contract.len());
    let mut unmatched = Vec::new();

    for required in contract.signatures() {
        let overloads = by_name.get(required.name()).map_or(&[][..], Vec::as_slice);
        match find_implementation(required, overloads) {
            Some(op) => entries.push(MethodMap {
                required: required.clone(),
                implementation: op.clone(),
            }),
            None => unmatched.push(required.clone()),
        }
    }

    if unmatched.is_empty() {
        Ok(SignatureMap { entries })
    } else {
        Err(AdaptationError {
            contract: contract.id().clone(),
            candidate: candidate.name().to_string(),
            unmatched,
        })
    }
}
