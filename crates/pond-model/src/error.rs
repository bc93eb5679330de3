//! Error types for the host object model

/// Malformed signatures or operation tables
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Operation name is blank
    #[error("operation name cannot be empty")]
    EmptyName,

    /// Generic placeholder outside the declared arity
    #[error("{signature}: generic parameter T{position} is not bound (arity {arity})")]
    UnboundGenericParameter {
        /// Offending signature
        signature: String,
        /// Placeholder position
        position: usize,
        /// Declared generic arity
        arity: usize,
    },

    /// `void` used as a parameter type
    #[error("{signature}: void is not a valid parameter type")]
    VoidParameter {
        /// Offending signature
        signature: String,
    },

    /// Two operations with equal signatures on one type
    #[error("type {type_name} already declares {signature}")]
    DuplicateOperation {
        /// Type declaring the operations
        type_name: String,
        /// Repeated signature
        signature: String,
    },
}

/// Failures while invoking an operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvokeError {
    /// No operation with that signature or name
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Name lookup matched several overloads
    #[error("operation name '{name}' is overloaded {count} times; call by signature")]
    AmbiguousName {
        /// Requested name
        name: String,
        /// Overloads sharing it
        count: usize,
    },

    /// Wrong number of arguments
    #[error("{signature}: expected {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Called signature
        signature: String,
        /// Declared parameter count
        expected: usize,
        /// Arguments supplied
        actual: usize,
    },

    /// Wrong number of generic type arguments
    #[error("{signature}: expected {expected} type arguments, got {actual}")]
    GenericArity {
        /// Called signature
        signature: String,
        /// Declared generic arity
        expected: usize,
        /// Type arguments supplied
        actual: usize,
    },

    /// Argument value has the wrong shape for the host implementation
    #[error("argument {position}: expected {expected}, got {actual}")]
    ArgumentType {
        /// Argument position
        position: usize,
        /// Shape the implementation accepts
        expected: String,
        /// Shape supplied
        actual: String,
    },

    /// Receiver is not an instance of the declaring type
    #[error("receiver is not an instance of {expected}")]
    ReceiverMismatch {
        /// Declaring type
        expected: String,
    },

    /// Host implementation reported a failure
    #[error("invocation failed: {0}")]
    Failed(String),
}

/// Failures while loading contract descriptors
#[derive(Debug, thiserror::Error)]
pub enum ContractParseError {
    /// Descriptor JSON is malformed
    #[error("invalid contract descriptor: {0}")]
    Json(#[from] serde_json::Error),

    /// A declared signature is malformed
    #[error("contract {contract}: {source}")]
    Signature {
        /// Contract declaring the signature
        contract: String,
        /// Underlying signature error
        #[source]
        source: SignatureError,
    },
}
