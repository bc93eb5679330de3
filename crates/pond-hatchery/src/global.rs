//! Process-wide default hatchery
//!
//! Initialized once, lazily on first use unless [`install_global`] injects
//! a configured instance first. Never torn down.

use crate::duck::Duck;
use crate::error::HatcheryError;
use crate::hatchery::Hatchery;
use once_cell::sync::OnceCell;
use pond_model::{ContractDescriptor, Introspect};
use std::sync::Arc;

static GLOBAL: OnceCell<Hatchery> = OnceCell::new();

/// The default hatchery
pub fn global() -> &'static Hatchery {
    GLOBAL.get_or_init(Hatchery::new)
}

/// Install `hatchery` as the default
///
/// # Errors
/// Returns `hatchery` back if the default was already initialized.
pub fn install_global(hatchery: Hatchery) -> Result<(), Hatchery> {
    GLOBAL.set(hatchery)
}

/// Duck typing for every introspectable type
pub trait DuckExt: Introspect + Sized {
    /// Adapt to `contract` through the default hatchery
    ///
    /// # Errors
    /// See [`Hatchery::adapt`].
    fn duck_as(self: Arc<Self>, contract: &ContractDescriptor) -> Result<Duck, HatcheryError> {
        global().adapt(self, contract)
    }

    /// Adapt to `contract` through `hatchery`
    ///
    /// # Errors
    /// See [`Hatchery::adapt`].
    fn duck_as_with(
        self: Arc<Self>,
        hatchery: &Hatchery,
        contract: &ContractDescriptor,
    ) -> Result<Duck, HatcheryError> {
        hatchery.adapt(self, contract)
    }

    /// True if this object structurally satisfies `contract`
    fn can_quack(&self, contract: &ContractDescriptor) -> bool {
        global().can_adapt(self, contract)
    }
}

impl<T: Introspect> DuckExt for T {}
