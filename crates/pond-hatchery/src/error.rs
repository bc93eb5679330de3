//! Error types for the hatchery
//!
//! Provides error handling for:
//! - Invalid adaptation targets (not a capability contract)
//! - Incomplete structural matches
//! - Failures of the code-materialization backend

use pond_model::{ContractId, Signature};

/// Target descriptor is not a usable capability contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{contract} is not a valid contract: {reason}")]
pub struct InvalidContractError {
    /// Offending descriptor
    pub contract: ContractId,
    /// What is wrong with it
    pub reason: String,
}

impl InvalidContractError {
    /// Create for `contract`
    pub fn new(contract: ContractId, reason: impl Into<String>) -> Self {
        Self {
            contract,
            reason: reason.into(),
        }
    }
}

/// Candidate type does not structurally satisfy the contract
///
/// Carries every unmatched required signature; the message names the first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{candidate} does not implement all members of {contract}: missing {}{}",
    first_unmatched(.unmatched),
    more_unmatched(.unmatched)
)]
pub struct AdaptationError {
    /// Contract requested
    pub contract: ContractId,
    /// Name of the candidate type
    pub candidate: String,
    /// Required signatures with no structural match, in contract order
    pub unmatched: Vec<Signature>,
}

fn first_unmatched(unmatched: &[Signature]) -> String {
    unmatched
        .first()
        .map_or_else(|| "<none>".to_string(), ToString::to_string)
}

fn more_unmatched(unmatched: &[Signature]) -> String {
    match unmatched.len() {
        0 | 1 => String::new(),
        n => format!(" (and {} more)", n - 1),
    }
}

impl AdaptationError {
    /// First unmatched required signature
    #[inline]
    #[must_use]
    pub fn first_unmatched(&self) -> Option<&Signature> {
        self.unmatched.first()
    }
}

/// Code-materialization backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    /// Operation defined twice on one adapter type
    #[error("operation already defined: {0}")]
    DuplicateOperation(String),

    /// Storage field defined twice
    #[error("storage field already defined: {0}")]
    DuplicateField(String),

    /// Type finalized without its storage field
    #[error("adapter type {0} has no storage field")]
    MissingField(String),

    /// Backend-specific failure
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Main hatchery error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum HatcheryError {
    /// Contract argument is not a capability descriptor
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidContractError),

    /// Structural match incomplete
    #[error("adaptation failed: {0}")]
    Adaptation(#[from] AdaptationError),

    /// Backend could not materialize the adapter type
    #[error("failed to materialize {type_name}: {source}")]
    Materialization {
        /// Adapter type being built
        type_name: String,
        /// Backend failure
        #[source]
        source: MaterializeError,
    },

    /// Adapter type constructed around an instance of the wrong type
    #[error("adapter expects an instance of {expected}, got {actual}")]
    WrappedTypeMismatch {
        /// Wrapped type the adapter was built for
        expected: String,
        /// Type actually supplied
        actual: String,
    },
}

impl HatcheryError {
    /// Check if a later call may succeed
    ///
    /// Contract and match failures depend on caller input and are worth
    /// reporting back. Backend failures indicate a broken environment.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Materialization { .. })
    }

    /// Unmatched signatures, if this is a match failure
    #[must_use]
    pub fn unmatched(&self) -> &[Signature] {
        match self {
            Self::Adaptation(e) => &e.unmatched,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pond_model::TypeRef;

    #[test]
    fn adaptation_error_names_first_unmatched() {
        let err = AdaptationError {
            contract: ContractId::new("IOverload"),
            candidate: "IntOnly".into(),
            unmatched: vec![
                Signature::new("Overload").param(TypeRef::string()),
                Signature::new("Other"),
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("void Overload(string)"), "{msg}");
        assert!(msg.contains("IOverload"));
        assert!(msg.contains("and 1 more"));
        assert_eq!(err.first_unmatched().unwrap().name(), "Overload");
    }

    #[test]
    fn materialization_is_not_recoverable() {
        let err = HatcheryError::Materialization {
            type_name: "Swan_as_IReturnOnly".into(),
            source: MaterializeError::Backend("out of memory".into()),
        };
        assert!(!err.is_recoverable());

        let err: HatcheryError = InvalidContractError::new(ContractId::new("Swan"), "concrete").into();
        assert!(err.is_recoverable());
        assert!(err.unmatched().is_empty());
    }
}
