//! Signature descriptor
//!
//! Provides [`Signature`], the canonical and comparable shape of one
//! operation: name, ordered parameters with passing modes, return type and
//! generic arity. Property accessors and indexers are ordinary signatures
//! with synthesized names so one matching rule covers every member kind.

use crate::error::SignatureError;
use crate::types::{Param, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Prefix of synthesized property/indexer getter names
pub const GETTER_PREFIX: &str = "get_";

/// Prefix of synthesized property/indexer setter names
pub const SETTER_PREFIX: &str = "set_";

/// Member name used for indexers
pub const INDEXER_NAME: &str = "Item";

/// Canonical operation shape
///
/// Two signatures are equal iff name, parameters (type and mode, pairwise),
/// return type and generic arity are all equal. Generic placeholders
/// compare by position and constraint.
///
/// # Example
/// ```
/// use pond_model::{Signature, TypeRef};
///
/// let sig = Signature::new("OutArgs").out(TypeRef::int());
/// assert_eq!(sig.to_string(), "void OutArgs(out int)");
///
/// let echo = Signature::new("Echo")
///     .generic(1)
///     .param(TypeRef::generic(0))
///     .returns(TypeRef::generic(0));
/// assert_eq!(echo.to_string(), "T0 Echo<T0>(T0)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    name: String,

    #[serde(default)]
    params: Vec<Param>,

    #[serde(default = "void")]
    returns: TypeRef,

    #[serde(default)]
    generic_arity: usize,
}

fn void() -> TypeRef {
    TypeRef::Void
}

impl Signature {
    /// Parameterless, non-generic operation returning void
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: TypeRef::Void,
            generic_arity: 0,
        }
    }

    /// Append a by-value parameter
    #[inline]
    #[must_use]
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(Param::value(ty));
        self
    }

    /// Append a by-reference parameter
    #[inline]
    #[must_use]
    pub fn by_ref(mut self, ty: TypeRef) -> Self {
        self.params.push(Param::by_ref(ty));
        self
    }

    /// Append an output parameter
    #[inline]
    #[must_use]
    pub fn out(mut self, ty: TypeRef) -> Self {
        self.params.push(Param::out(ty));
        self
    }

    /// Set return type
    #[inline]
    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.returns = ty;
        self
    }

    /// Set generic arity
    #[inline]
    #[must_use]
    pub fn generic(mut self, arity: usize) -> Self {
        self.generic_arity = arity;
        self
    }

    /// Property getter: `get_{property}() -> ty`
    #[must_use]
    pub fn getter(property: &str, ty: TypeRef) -> Self {
        Self::new(format!("{GETTER_PREFIX}{property}")).returns(ty)
    }

    /// Property setter: `set_{property}(ty)`
    #[must_use]
    pub fn setter(property: &str, ty: TypeRef) -> Self {
        Self::new(format!("{SETTER_PREFIX}{property}")).param(ty)
    }

    /// Indexer getter: `get_Item(keys..) -> ty`
    #[must_use]
    pub fn index_getter(keys: Vec<TypeRef>, ty: TypeRef) -> Self {
        let mut sig = Self::new(format!("{GETTER_PREFIX}{INDEXER_NAME}")).returns(ty);
        sig.params = keys.into_iter().map(Param::value).collect();
        sig
    }

    /// Indexer setter: `set_Item(keys.., ty)`
    #[must_use]
    pub fn index_setter(keys: Vec<TypeRef>, ty: TypeRef) -> Self {
        let mut sig = Self::new(format!("{SETTER_PREFIX}{INDEXER_NAME}"));
        sig.params = keys.into_iter().map(Param::value).collect();
        sig.params.push(Param::value(ty));
        sig
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameters
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Return type
    #[inline]
    #[must_use]
    pub fn return_type(&self) -> &TypeRef {
        &self.returns
    }

    /// Number of generic parameters bound by this operation
    #[inline]
    #[must_use]
    pub fn generic_arity(&self) -> usize {
        self.generic_arity
    }

    /// True if the operation binds generic parameters
    #[inline]
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.generic_arity > 0
    }

    /// True if any parameter is `ref` or `out`
    #[inline]
    #[must_use]
    pub fn has_by_ref_params(&self) -> bool {
        self.params.iter().any(Param::is_by_ref)
    }

    /// Check the signature is well formed
    ///
    /// # Errors
    /// - [`SignatureError::EmptyName`] if the name is blank
    /// - [`SignatureError::UnboundGenericParameter`] if a placeholder refers
    ///   to a position outside the generic arity
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.name.trim().is_empty() {
            return Err(SignatureError::EmptyName);
        }

        let positions = self
            .params
            .iter()
            .map(|p| &p.ty)
            .chain(std::iter::once(&self.returns))
            .filter_map(TypeRef::max_generic_position);

        for position in positions {
            if position >= self.generic_arity {
                return Err(SignatureError::UnboundGenericParameter {
                    signature: self.to_string(),
                    position,
                    arity: self.generic_arity,
                });
            }
        }

        if self.params.iter().any(|p| p.ty.is_void()) {
            return Err(SignatureError::VoidParameter {
                signature: self.to_string(),
            });
        }

        Ok(())
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.returns, self.name)?;

        if self.generic_arity > 0 {
            f.write_str("<")?;
            for i in 0..self.generic_arity {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "T{i}")?;
            }
            f.write_str(">")?;
        }

        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}
