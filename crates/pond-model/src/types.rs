//! Type references and parameter shapes
//!
//! Provides [`TypeRef`] and [`Param`], the building blocks of a
//! [`Signature`](crate::Signature). Equality is structural: generic
//! placeholders compare by position and base constraint, never by name.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Reference to a host type as it appears in an operation signature
///
/// # Example
/// ```
/// use pond_model::TypeRef;
///
/// let list = TypeRef::constructed("List", vec![TypeRef::generic(0)]);
/// assert_eq!(list.to_string(), "List<T0>");
/// assert!(list.is_generic());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// No value (return position only)
    Void,

    /// Concrete host type, e.g. `int` or `string`
    Named(String),

    /// Generic placeholder bound by the operation
    Param {
        /// Index into the operation's generic parameter list
        position: usize,
        /// Base constraint, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<String>,
    },

    /// Generic host type instantiated with arguments, e.g. `List<T0>`
    Constructed {
        /// Generic type definition name
        name: String,
        /// Type arguments
        args: Vec<TypeRef>,
    },
}

impl TypeRef {
    /// Concrete named type
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Unconstrained generic placeholder at `position`
    #[inline]
    #[must_use]
    pub fn generic(position: usize) -> Self {
        Self::Param {
            position,
            constraint: None,
        }
    }

    /// Generic placeholder with a base constraint
    #[inline]
    #[must_use]
    pub fn constrained(position: usize, constraint: impl Into<String>) -> Self {
        Self::Param {
            position,
            constraint: Some(constraint.into()),
        }
    }

    /// Instantiated generic type
    #[inline]
    #[must_use]
    pub fn constructed(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Constructed {
            name: name.into(),
            args,
        }
    }

    /// `int`
    #[inline]
    #[must_use]
    pub fn int() -> Self {
        Self::named("int")
    }

    /// `string`
    #[inline]
    #[must_use]
    pub fn string() -> Self {
        Self::named("string")
    }

    /// `bool`
    #[inline]
    #[must_use]
    pub fn bool() -> Self {
        Self::named("bool")
    }

    /// `float`
    #[inline]
    #[must_use]
    pub fn float() -> Self {
        Self::named("float")
    }

    /// Returns true for [`TypeRef::Void`]
    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns true if a generic placeholder occurs anywhere in this type
    #[must_use]
    pub fn is_generic(&self) -> bool {
        match self {
            Self::Param { .. } => true,
            Self::Constructed { args, .. } => args.iter().any(TypeRef::is_generic),
            Self::Void | Self::Named(_) => false,
        }
    }

    /// Highest generic position referenced, if any
    #[must_use]
    pub fn max_generic_position(&self) -> Option<usize> {
        match self {
            Self::Param { position, .. } => Some(*position),
            Self::Constructed { args, .. } => {
                args.iter().filter_map(TypeRef::max_generic_position).max()
            }
            Self::Void | Self::Named(_) => None,
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Named(name) => f.write_str(name),
            Self::Param { position, .. } => write!(f, "T{position}"),
            Self::Constructed { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// How an argument is passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamMode {
    /// Passed by value
    #[default]
    Value,

    /// Passed by reference; callee may read and write
    Ref,

    /// Output parameter; callee writes, caller observes after return
    Out,
}

/// One parameter position of a signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Parameter type
    pub ty: TypeRef,

    /// Passing mode
    #[serde(default)]
    pub mode: ParamMode,
}

impl Param {
    /// By-value parameter
    #[inline]
    #[must_use]
    pub fn value(ty: TypeRef) -> Self {
        Self {
            ty,
            mode: ParamMode::Value,
        }
    }

    /// By-reference parameter
    #[inline]
    #[must_use]
    pub fn by_ref(ty: TypeRef) -> Self {
        Self {
            ty,
            mode: ParamMode::Ref,
        }
    }

    /// Output parameter
    #[inline]
    #[must_use]
    pub fn out(ty: TypeRef) -> Self {
        Self {
            ty,
            mode: ParamMode::Out,
        }
    }

    /// True for `ref` and `out` parameters
    #[inline]
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        matches!(self.mode, ParamMode::Ref | ParamMode::Out)
    }

    /// True for `out` parameters only
    #[inline]
    #[must_use]
    pub fn is_output(&self) -> bool {
        self.mode == ParamMode::Out
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParamMode::Value => write!(f, "{}", self.ty),
            ParamMode::Ref => write!(f, "ref {}", self.ty),
            ParamMode::Out => write!(f, "out {}", self.ty),
        }
    }
}
