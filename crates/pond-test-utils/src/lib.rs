//! Testing utilities for DuckPond workspace
//!
//! Host fixtures with observable state, and the contracts they are
//! adapted to in tests.

#![allow(missing_docs)]

use parking_lot::Mutex;
use pond_model::{
    ContractDescriptor, FromValue, Introspect, InvokeError, Signature, TypeInfo, TypeRef,
    TypeRegistry, Value,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Bird

#[derive(Debug, Default)]
pub struct Bird {
    pub flights: AtomicI64,
}

impl Bird {
    pub fn describe() -> TypeInfo {
        TypeInfo::builder::<Bird>("Bird")
            .method(Signature::new("Fly").returns(TypeRef::string()), |this, _| {
                this.flights.fetch_add(1, Ordering::SeqCst);
                Ok(Value::from("flap"))
            })
            .build()
            .expect("Bird describes")
    }
}

impl Introspect for Bird {
    fn type_info(&self) -> Arc<TypeInfo> {
        TypeRegistry::global().get_or_register::<Self>(Self::describe)
    }
}

// Swan

#[derive(Debug, Default)]
pub struct Swan {
    pub bird: Bird,
    pub side_effect_called: AtomicI64,
    pub overload_int_called: AtomicI64,
    pub overload_string_called: AtomicI64,
    pub indexer: Mutex<Option<String>>,
    pub property: Mutex<Option<String>>,
}

impl Swan {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn side_effects(&self) -> i64 {
        self.side_effect_called.load(Ordering::SeqCst)
    }

    pub fn overload_int_calls(&self) -> i64 {
        self.overload_int_called.load(Ordering::SeqCst)
    }

    pub fn overload_string_calls(&self) -> i64 {
        self.overload_string_called.load(Ordering::SeqCst)
    }

    fn describe() -> TypeInfo {
        TypeInfo::builder::<Swan>("Swan")
            .inherit(&Bird::describe(), |swan: &Swan| &swan.bird)
            .method(Signature::new("ReturnOnlyInt").returns(TypeRef::int()), |_, _| {
                Ok(Value::Int(42))
            })
            .method(Signature::new("ReturnOnlyString").returns(TypeRef::string()), |_, _| {
                Ok(Value::from("foo"))
            })
            .method(Signature::new("SideEffectOnly"), |this, _| {
                this.side_effect_called.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Unit)
            })
            .method(lots_of_args_signature(), |_, _| Ok(Value::Int(88)))
            .method(Signature::new("OutArgs").out(TypeRef::int()), |_, frame| {
                frame.set(0, 24_i64)?;
                Ok(Value::Unit)
            })
            .method(Signature::new("RefArgs").by_ref(TypeRef::int()), |_, frame| {
                frame.set(0, 5_i64)?;
                Ok(Value::Unit)
            })
            .method(Signature::new("Overload").param(TypeRef::int()), |this, frame| {
                frame.arg::<i64>(0)?;
                this.overload_int_called.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Unit)
            })
            .method(Signature::new("Overload").param(TypeRef::string()), |this, frame| {
                frame.arg::<String>(0)?;
                this.overload_string_called.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Unit)
            })
            .index_getter(vec![TypeRef::string()], TypeRef::string(), |_, keys| {
                Ok(Value::Str(String::from_value(&keys[0], 0)?))
            })
            .index_setter(vec![TypeRef::string()], TypeRef::string(), |this, keys, value| {
                let key = String::from_value(&keys[0], 0)?;
                let value = String::from_value(&value, 1)?;
                *this.indexer.lock() = Some(value + &key);
                Ok(())
            })
            .getter("Prop", TypeRef::string(), |this| Value::from(this.property.lock().clone()))
            .setter("Prop", TypeRef::string(), |this, value| {
                *this.property.lock() = Option::<String>::from_value(&value, 0)?;
                Ok(())
            })
            .method(echo_signature(), |_, frame| frame.arg::<Value>(0))
            .method(describe_signature(), |_, frame| {
                let ty = frame
                    .type_args()
                    .first()
                    .ok_or_else(|| InvokeError::Failed("missing type argument".into()))?;
                Ok(Value::Str(ty.to_string()))
            })
            .build()
            .expect("Swan describes")
    }
}

impl Introspect for Swan {
    fn type_info(&self) -> Arc<TypeInfo> {
        TypeRegistry::global().get_or_register::<Self>(Self::describe)
    }
}

pub fn lots_of_args_signature() -> Signature {
    (0..7)
        .fold(Signature::new("LotsOfArgs"), |sig, _| sig.param(TypeRef::int()))
        .returns(TypeRef::int())
}

pub fn echo_signature() -> Signature {
    Signature::new("Echo")
        .generic(1)
        .param(TypeRef::generic(0))
        .returns(TypeRef::generic(0))
}

pub fn describe_signature() -> Signature {
    Signature::new("Describe").generic(1).returns(TypeRef::string())
}

// GenericSwan<T>

/// Rust types usable as the `T` of [`GenericSwan`]
pub trait HostValue: FromValue + Into<Value> + Clone + Default + Send + Sync + 'static {
    fn type_ref() -> TypeRef;
}

impl HostValue for i64 {
    fn type_ref() -> TypeRef {
        TypeRef::int()
    }
}

impl HostValue for String {
    fn type_ref() -> TypeRef {
        TypeRef::string()
    }
}

#[derive(Debug, Default)]
pub struct GenericSwan<T> {
    pub value: Mutex<T>,
}

impl<T: HostValue> GenericSwan<T> {
    pub fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value),
        })
    }

    pub fn get(&self) -> T {
        self.value.lock().clone()
    }
}

impl<T: HostValue> Introspect for GenericSwan<T> {
    fn type_info(&self) -> Arc<TypeInfo> {
        TypeRegistry::global().get_or_register::<Self>(|| {
            TypeInfo::builder::<Self>(format!("GenericSwan<{}>", T::type_ref()))
                .method(Signature::new("GetValue").returns(T::type_ref()), |this, _| {
                    Ok(this.get().into())
                })
                .method(Signature::new("SetValue").param(T::type_ref()), |this, frame| {
                    *this.value.lock() = frame.arg::<T>(0)?;
                    Ok(Value::Unit)
                })
                .build()
                .expect("GenericSwan describes")
        })
    }
}

// Contracts

fn contract(name: &str, ops: impl IntoIterator<Item = Signature>) -> Arc<ContractDescriptor> {
    ops.into_iter()
        .fold(ContractDescriptor::builder(name), |b, op| b.operation(op))
        .build()
        .expect("fixture contract builds")
}

pub fn return_only() -> Arc<ContractDescriptor> {
    contract("IReturnOnly", [Signature::new("ReturnOnlyInt").returns(TypeRef::int())])
}

pub fn return_only_string() -> Arc<ContractDescriptor> {
    contract(
        "IReturnOnlyString",
        [Signature::new("ReturnOnlyString").returns(TypeRef::string())],
    )
}

pub fn side_effect() -> Arc<ContractDescriptor> {
    contract("ISideEffect", [Signature::new("SideEffectOnly")])
}

pub fn lots_of_args() -> Arc<ContractDescriptor> {
    contract("ILotsOfArgs", [lots_of_args_signature()])
}

pub fn out_args() -> Arc<ContractDescriptor> {
    contract("IOutArgs", [Signature::new("OutArgs").out(TypeRef::int())])
}

pub fn ref_args() -> Arc<ContractDescriptor> {
    contract("IRefArgs", [Signature::new("RefArgs").by_ref(TypeRef::int())])
}

pub fn overload_int() -> Arc<ContractDescriptor> {
    contract("IOverloadInt", [Signature::new("Overload").param(TypeRef::int())])
}

pub fn overload_string() -> Arc<ContractDescriptor> {
    contract("IOverloadString", [Signature::new("Overload").param(TypeRef::string())])
}

pub fn overload_both() -> Arc<ContractDescriptor> {
    contract(
        "IOverload",
        [
            Signature::new("Overload").param(TypeRef::int()),
            Signature::new("Overload").param(TypeRef::string()),
        ],
    )
}

pub fn indexer() -> Arc<ContractDescriptor> {
    contract(
        "IIndexer",
        [
            Signature::index_getter(vec![TypeRef::string()], TypeRef::string()),
            Signature::index_setter(vec![TypeRef::string()], TypeRef::string()),
        ],
    )
}

pub fn property() -> Arc<ContractDescriptor> {
    contract(
        "IProperty",
        [
            Signature::getter("Prop", TypeRef::string()),
            Signature::setter("Prop", TypeRef::string()),
        ],
    )
}

pub fn generic_value(ty: TypeRef) -> Arc<ContractDescriptor> {
    contract(
        &format!("IGenericValue<{ty}>"),
        [
            Signature::new("GetValue").returns(ty.clone()),
            Signature::new("SetValue").param(ty),
        ],
    )
}

pub fn generic_method() -> Arc<ContractDescriptor> {
    contract("IGenericMethod", [echo_signature(), describe_signature()])
}

pub fn flyer() -> Arc<ContractDescriptor> {
    contract("IFlyer", [Signature::new("Fly").returns(TypeRef::string())])
}

pub fn flying_swan() -> Arc<ContractDescriptor> {
    ContractDescriptor::builder("IFlyingSwan")
        .extends(flyer())
        .extends(return_only())
        .operation(Signature::new("SideEffectOnly"))
        .build()
        .expect("fixture contract builds")
}
