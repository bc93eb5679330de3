//! DuckPond host object model
//!
//! The vocabulary shared by the structural-typing engine and the host
//! objects it adapts.
//!
//! # Overview
//!
//! - **TypeRef / Param**: types and passing modes as they appear in signatures
//! - **Signature**: canonical, comparable operation shape
//! - **ContractDescriptor**: named set of required operations, possibly
//!   extending other contracts
//! - **TypeInfo / Operation**: reflection view of a host type, with invokers
//! - **Introspect**: implemented by host objects to expose their `TypeInfo`
//! - **TypeRegistry**: one published `TypeInfo` per Rust type
//!
//! # Example
//!
//! ```rust
//! use pond_model::{ContractDescriptor, Signature, TypeRef};
//!
//! let contract = ContractDescriptor::builder("IOverload")
//!     .operation(Signature::new("Overload").param(TypeRef::int()))
//!     .operation(Signature::new("Overload").param(TypeRef::string()))
//!     .build()
//!     .unwrap();
//!
//! assert_ne!(contract.operations()[0], contract.operations()[1]);
//! ```

#![warn(missing_docs)]

pub mod contract;
pub mod error;
pub mod object;
pub mod registry;
pub mod signature;
pub mod types;
pub mod value;

// Re-exports
pub use contract::{ContractBuilder, ContractDescriptor, ContractId, DescriptorKind};
pub use error::{ContractParseError, InvokeError, SignatureError};
pub use object::{CallFrame, Introspect, Invoker, Operation, Receiver, TypeInfo, TypeInfoBuilder, TypeKey};
pub use registry::TypeRegistry;
pub use signature::{Signature, GETTER_PREFIX, INDEXER_NAME, SETTER_PREFIX};
pub use types::{Param, ParamMode, TypeRef};
pub use value::{FromValue, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for describing host types and contracts
    pub use crate::{
        CallFrame, ContractDescriptor, ContractId, Introspect, InvokeError, Signature, TypeInfo,
        TypeRef, TypeRegistry, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
