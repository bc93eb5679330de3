//! DuckPond hatchery
//!
//! Structural ("duck") typing for host objects: proves that an object's
//! type structurally satisfies a contract it never declared, then
//! synthesizes and caches a forwarding adapter that implements the
//! contract by delegating to the matched operations.
//!
//! # Overview
//!
//! - **flatten**: contract plus everything it extends, deduplicated
//! - **matcher**: exact signature matching, total [`SignatureMap`] or failure
//! - **synthesis**: [`Materializer`] seam and the adapter [`AdapterType`]
//! - **hatchery**: adapter type cache, one type per (candidate, contract)
//! - **global**: process-wide default hatchery and [`DuckExt`]
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pond_hatchery::{Hatchery, HatcheryError};
//! use pond_model::prelude::*;
//!
//! struct Swan;
//!
//! impl Introspect for Swan {
//!     fn type_info(&self) -> Arc<TypeInfo> {
//!         TypeRegistry::global().get_or_register::<Swan>(|| {
//!             TypeInfo::builder::<Swan>("Swan")
//!                 .method(Signature::new("ReturnOnlyInt").returns(TypeRef::int()), |_, _| {
//!                     Ok(Value::Int(42))
//!                 })
//!                 .build()
//!                 .unwrap()
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), HatcheryError> {
//! let contract = ContractDescriptor::builder("IReturnOnly")
//!     .operation(Signature::new("ReturnOnlyInt").returns(TypeRef::int()))
//!     .build()
//!     .unwrap();
//!
//! let hatchery = Hatchery::new();
//! let duck = hatchery.adapt(Arc::new(Swan), &contract)?;
//! assert_eq!(duck.call("ReturnOnlyInt", &mut []).unwrap(), Value::Int(42));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod duck;
pub mod error;
pub mod flatten;
pub mod global;
pub mod hatchery;
pub mod matcher;
pub mod synthesis;

// Re-exports
pub use config::{HatcheryConfig, DEFAULT_MAX_EXTENDS_DEPTH};
pub use duck::Duck;
pub use error::{AdaptationError, HatcheryError, InvalidContractError, MaterializeError};
pub use flatten::{flatten, FlattenedContract};
pub use global::{global, install_global, DuckExt};
pub use hatchery::{Hatchery, HatcheryStats};
pub use matcher::{resolve, signatures_match, MethodMap, SignatureMap};
pub use synthesis::{
    synthesize, AdapterType, AdapterTypeBuilder, DispatchMaterializer, Materializer, ADAPTER_BASE,
    WRAPPED_FIELD,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for adapting host objects
    pub use crate::{Duck, DuckExt, Hatchery, HatcheryConfig, HatcheryError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
