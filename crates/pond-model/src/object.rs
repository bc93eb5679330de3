//! Type introspection
//!
//! [`TypeInfo`] is the reflection view of a host type: its identity and the
//! full set of operations it exposes, each paired with an invoker that
//! calls the host implementation. Host objects expose their `TypeInfo`
//! through [`Introspect`].
//!
//! # Example
//! ```
//! use pond_model::{Signature, TypeInfo, TypeRef, Value};
//!
//! struct Counter(i64);
//!
//! let info = TypeInfo::builder::<Counter>("Counter")
//!     .method(
//!         Signature::new("Get").returns(TypeRef::int()),
//!         |this: &Counter, _frame| Ok(Value::Int(this.0)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let counter = Counter(7);
//! let sig = Signature::new("Get").returns(TypeRef::int());
//! assert_eq!(info.invoke(&counter, &sig, &[], &mut []).unwrap(), Value::Int(7));
//! ```

use crate::contract::ContractId;
use crate::error::{InvokeError, SignatureError};
use crate::signature::Signature;
use crate::types::TypeRef;
use crate::value::{FromValue, Value};
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt::{self, Debug, Display, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Type-erased receiver of an operation call
pub type Receiver = dyn Any + Send + Sync;

/// Host implementation of one operation
pub type Invoker =
    Arc<dyn Fn(&Receiver, &mut CallFrame<'_>) -> Result<Value, InvokeError> + Send + Sync>;

/// Host objects that can describe their own type
pub trait Introspect: Any + Send + Sync {
    /// Reflection view of this object's runtime type
    fn type_info(&self) -> Arc<TypeInfo>;
}

/// Process-unique identity of a host type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: Uuid,
    name: Arc<str>,
}

impl TypeKey {
    /// Allocate a fresh identity
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: Arc::from(name),
        }
    }

    /// Unique id
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Arguments of a single call
///
/// By-reference and output arguments are written back into the argument
/// slice, where the caller observes them after the call returns.
#[derive(Debug)]
pub struct CallFrame<'a> {
    type_args: &'a [TypeRef],
    args: &'a mut [Value],
}

impl<'a> CallFrame<'a> {
    /// Create a frame over caller-owned arguments
    #[inline]
    #[must_use]
    pub fn new(type_args: &'a [TypeRef], args: &'a mut [Value]) -> Self {
        Self { type_args, args }
    }

    /// Generic type arguments bound for this call
    #[inline]
    #[must_use]
    pub fn type_args(&self) -> &[TypeRef] {
        self.type_args
    }

    /// Raw arguments
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &*self.args
    }

    /// Split into type arguments and mutable arguments
    #[inline]
    pub fn parts(&mut self) -> (&[TypeRef], &mut [Value]) {
        (self.type_args, &mut *self.args)
    }

    /// Typed argument at `position`
    ///
    /// # Errors
    /// [`InvokeError::ArgumentType`] on shape mismatch, or
    /// [`InvokeError::Failed`] if the position does not exist.
    pub fn arg<T: FromValue>(&self, position: usize) -> Result<T, InvokeError> {
        let value = self
            .args
            .get(position)
            .ok_or_else(|| InvokeError::Failed(format!("no argument at position {position}")))?;
        T::from_value(value, position)
    }

    /// Write back a by-reference or output argument
    ///
    /// # Errors
    /// [`InvokeError::Failed`] if the position does not exist.
    pub fn set(&mut self, position: usize, value: impl Into<Value>) -> Result<(), InvokeError> {
        let slot = self
            .args
            .get_mut(position)
            .ok_or_else(|| InvokeError::Failed(format!("no argument at position {position}")))?;
        *slot = value.into();
        Ok(())
    }
}

/// One operation exposed by a type
#[derive(Clone)]
pub struct Operation {
    signature: Signature,
    declared_by: Arc<str>,
    invoker: Invoker,
}

impl Operation {
    /// Pair a signature with its implementation
    #[must_use]
    pub fn new(signature: Signature, declared_by: &str, invoker: Invoker) -> Self {
        Self {
            signature,
            declared_by: Arc::from(declared_by),
            invoker,
        }
    }

    /// Operation signature
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Name of the type that declared the implementation
    #[inline]
    #[must_use]
    pub fn declared_by(&self) -> &str {
        &self.declared_by
    }

    /// Shared handle to the implementation
    #[inline]
    #[must_use]
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Invoke on `receiver`
    ///
    /// Checks argument count and generic arity, then performs exactly one
    /// call into the implementation.
    ///
    /// # Errors
    /// [`InvokeError`] from the checks or the implementation.
    pub fn invoke(
        &self,
        receiver: &Receiver,
        type_args: &[TypeRef],
        args: &mut [Value],
    ) -> Result<Value, InvokeError> {
        if args.len() != self.signature.arity() {
            return Err(InvokeError::ArgumentCount {
                signature: self.signature.to_string(),
                expected: self.signature.arity(),
                actual: args.len(),
            });
        }
        if type_args.len() != self.signature.generic_arity() {
            return Err(InvokeError::GenericArity {
                signature: self.signature.to_string(),
                expected: self.signature.generic_arity(),
                actual: type_args.len(),
            });
        }

        let mut frame = CallFrame::new(type_args, args);
        (self.invoker)(receiver, &mut frame)
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("signature", &self.signature.to_string())
            .field("declared_by", &self.declared_by)
            .finish_non_exhaustive()
    }
}

/// Reflection view of a host type
#[derive(Debug, Clone)]
pub struct TypeInfo {
    key: TypeKey,
    rust_type: TypeId,
    operations: Vec<Operation>,
    implements: Vec<ContractId>,
}

impl TypeInfo {
    /// Start describing the Rust type `T`
    #[inline]
    #[must_use]
    pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> TypeInfoBuilder<T> {
        TypeInfoBuilder {
            name: name.into(),
            declared: Vec::new(),
            inherited: Vec::new(),
            implements: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Assemble from already-built operations
    ///
    /// `rust_type` is the Rust type whose instances this describes.
    ///
    /// # Errors
    /// [`SignatureError::DuplicateOperation`] if two operations share a
    /// signature, or the first malformed signature.
    pub fn from_parts(
        key: TypeKey,
        rust_type: TypeId,
        operations: Vec<Operation>,
        implements: Vec<ContractId>,
    ) -> Result<Self, SignatureError> {
        let mut seen = HashSet::with_capacity(operations.len());
        for op in &operations {
            op.signature.validate()?;
            if !seen.insert(&op.signature) {
                return Err(SignatureError::DuplicateOperation {
                    type_name: key.name().to_string(),
                    signature: op.signature.to_string(),
                });
            }
        }

        Ok(Self {
            key,
            rust_type,
            operations,
            implements,
        })
    }

    /// Type identity
    #[inline]
    #[must_use]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Rust type of the described instances
    #[inline]
    #[must_use]
    pub fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    /// True if `instance` is of the Rust type this describes
    #[must_use]
    pub fn describes(&self, instance: &Receiver) -> bool {
        let instance: &dyn Any = instance;
        instance.type_id() == self.rust_type
    }

    /// Every operation, including inherited ones
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Operations with the given name (all overloads)
    pub fn operations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Operation> {
        self.operations
            .iter()
            .filter(move |op| op.signature.name() == name)
    }

    /// Operation with exactly this signature
    #[must_use]
    pub fn find(&self, signature: &Signature) -> Option<&Operation> {
        self.operations.iter().find(|op| &op.signature == signature)
    }

    /// Contracts this type declares nominally
    #[inline]
    #[must_use]
    pub fn implemented_contracts(&self) -> &[ContractId] {
        &self.implements
    }

    /// True if the type nominally declares `contract`
    #[inline]
    #[must_use]
    pub fn implements(&self, contract: &ContractId) -> bool {
        self.implements.contains(contract)
    }

    /// Call the operation with `signature` on `receiver`
    ///
    /// # Errors
    /// [`InvokeError::UnknownOperation`] if the type has no such operation,
    /// otherwise whatever [`Operation::invoke`] reports.
    pub fn invoke(
        &self,
        receiver: &Receiver,
        signature: &Signature,
        type_args: &[TypeRef],
        args: &mut [Value],
    ) -> Result<Value, InvokeError> {
        self.find(signature)
            .ok_or_else(|| InvokeError::UnknownOperation(signature.to_string()))?
            .invoke(receiver, type_args, args)
    }
}

/// Builder for [`TypeInfo`] describing the Rust type `T`
pub struct TypeInfoBuilder<T> {
    name: String,
    declared: Vec<Operation>,
    inherited: Vec<Operation>,
    implements: Vec<ContractId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeInfoBuilder<T> {
    /// Declare an operation
    #[must_use]
    pub fn method<F>(mut self, signature: Signature, f: F) -> Self
    where
        F: Fn(&T, &mut CallFrame<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let type_name: Arc<str> = Arc::from(self.name.as_str());
        let invoker: Invoker = Arc::new(move |receiver: &Receiver, frame: &mut CallFrame<'_>| {
            let this = downcast::<T>(receiver, &type_name)?;
            f(this, frame)
        });
        self.declared
            .push(Operation::new(signature, &self.name, invoker));
        self
    }

    /// Declare a property getter `get_{property}`
    #[must_use]
    pub fn getter<F>(self, property: &str, ty: TypeRef, f: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.method(Signature::getter(property, ty), move |this, _frame| Ok(f(this)))
    }

    /// Declare a property setter `set_{property}`
    #[must_use]
    pub fn setter<F>(self, property: &str, ty: TypeRef, f: F) -> Self
    where
        F: Fn(&T, Value) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        self.method(Signature::setter(property, ty), move |this, frame| {
            f(this, frame.arg::<Value>(0)?)?;
            Ok(Value::Unit)
        })
    }

    /// Declare an indexer getter `get_Item(keys..)`
    #[must_use]
    pub fn index_getter<F>(self, keys: Vec<TypeRef>, ty: TypeRef, f: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.method(Signature::index_getter(keys, ty), move |this, frame| {
            f(this, frame.args())
        })
    }

    /// Declare an indexer setter `set_Item(keys.., value)`
    #[must_use]
    pub fn index_setter<F>(self, keys: Vec<TypeRef>, ty: TypeRef, f: F) -> Self
    where
        F: Fn(&T, &[Value], Value) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        self.method(Signature::index_setter(keys, ty), move |this, frame| {
            let (value, keys) = frame
                .args()
                .split_last()
                .ok_or_else(|| InvokeError::Failed("indexer setter without value".into()))?;
            f(this, keys, value.clone())?;
            Ok(Value::Unit)
        })
    }

    /// Inherit every operation of `base`
    ///
    /// `project` borrows the embedded base part of a `T`. Operations later
    /// declared on `T` with an equal signature override inherited ones.
    #[must_use]
    pub fn inherit<B, P>(mut self, base: &TypeInfo, project: P) -> Self
    where
        B: Any + Send + Sync,
        P: Fn(&T) -> &B + Send + Sync + 'static,
    {
        let project = Arc::new(project);
        let type_name: Arc<str> = Arc::from(self.name.as_str());

        for op in base.operations() {
            let target = op.invoker.clone();
            let project = Arc::clone(&project);
            let type_name = Arc::clone(&type_name);
            let invoker: Invoker = Arc::new(move |receiver: &Receiver, frame: &mut CallFrame<'_>| {
                let this = downcast::<T>(receiver, &type_name)?;
                target(project(this) as &Receiver, frame)
            });
            self.inherited
                .push(Operation::new(op.signature.clone(), op.declared_by(), invoker));
        }
        self
    }

    /// Declare nominal implementation of a contract
    #[must_use]
    pub fn implements(mut self, contract: ContractId) -> Self {
        self.implements.push(contract);
        self
    }

    /// Finish building
    ///
    /// # Errors
    /// [`SignatureError`] for malformed or duplicate declarations.
    pub fn build(self) -> Result<TypeInfo, SignatureError> {
        let mut operations = self.declared;
        let overridden: HashSet<Signature> =
            operations.iter().map(|op| op.signature.clone()).collect();

        operations.extend(
            self.inherited
                .into_iter()
                .filter(|op| !overridden.contains(&op.signature)),
        );

        TypeInfo::from_parts(
            TypeKey::new(&self.name),
            TypeId::of::<T>(),
            operations,
            self.implements,
        )
    }
}

impl<T> Debug for TypeInfoBuilder<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfoBuilder")
            .field("name", &self.name)
            .field("declared", &self.declared.len())
            .field("inherited", &self.inherited.len())
            .finish()
    }
}

fn downcast<'r, T: Any>(receiver: &'r Receiver, type_name: &str) -> Result<&'r T, InvokeError> {
    receiver
        .downcast_ref::<T>()
        .ok_or_else(|| InvokeError::ReceiverMismatch {
            expected: type_name.to_string(),
        })
}
