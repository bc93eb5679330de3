//! Quack Tests
//!
//! Adapting host fixtures to contracts they never declared, end to end
//! through the hatchery.
//!
use pond_hatchery::prelude::*;
use pond_model::prelude::*;
use pond_test_utils::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn hatchery() -> Hatchery {
    init_tracing();
    Hatchery::new()
}

struct IntOnly;

impl Introspect for IntOnly {
    fn type_info(&self) -> Arc<TypeInfo> {
        TypeRegistry::global().get_or_register::<Self>(|| {
            TypeInfo::builder::<Self>("IntOnly")
                .method(Signature::new("Overload").param(TypeRef::int()), |_, _| {
                    Ok(Value::Unit)
                })
                .build()
                .unwrap()
        })
    }
}

#[test]
fn test_can_proxy_return_only_method() {
    let hatchery = hatchery();
    let duck = hatchery.adapt(Swan::new(), &return_only()).unwrap();

    assert!(duck.implements(&ContractId::new("IReturnOnly")));
    assert_eq!(duck.call("ReturnOnlyInt", &mut []).unwrap(), Value::Int(42));
}

#[test]
fn test_can_proxy_return_only_string() {
    let hatchery = hatchery();
    let duck = hatchery.adapt(Swan::new(), &return_only_string()).unwrap();

    assert_eq!(duck.call("ReturnOnlyString", &mut []).unwrap(), Value::from("foo"));
}

#[test]
fn test_can_proxy_side_effect_only_method() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &side_effect()).unwrap();

    assert_eq!(duck.call("SideEffectOnly", &mut []).unwrap(), Value::Unit);
    duck.call("SideEffectOnly", &mut []).unwrap();
    assert_eq!(swan.side_effects(), 2);
}

#[test]
fn test_can_proxy_lots_of_args() {
    let hatchery = hatchery();
    let duck = hatchery.adapt(Swan::new(), &lots_of_args()).unwrap();

    let mut args: Vec<Value> = (1..=7).map(Value::Int).collect();
    assert_eq!(duck.call("LotsOfArgs", &mut args).unwrap(), Value::Int(88));

    let err = duck.call("LotsOfArgs", &mut [Value::Int(1)]).unwrap_err();
    assert!(matches!(err, InvokeError::ArgumentCount { expected: 7, actual: 1, .. }));
}

#[test]
fn test_can_proxy_out_args() {
    let hatchery = hatchery();
    let duck = hatchery.adapt(Swan::new(), &out_args()).unwrap();

    let mut args = [Value::Null];
    duck.call("OutArgs", &mut args).unwrap();
    assert_eq!(args[0], Value::Int(24));
}

#[test]
fn test_can_proxy_ref_args() {
    let hatchery = hatchery();
    let duck = hatchery.adapt(Swan::new(), &ref_args()).unwrap();

    let mut args = [Value::Int(1)];
    duck.call("RefArgs", &mut args).unwrap();
    assert_eq!(args[0], Value::Int(5));
}

#[test]
fn test_overload_dispatches_to_int_only() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &overload_int()).unwrap();

    duck.call("Overload", &mut [Value::Int(3)]).unwrap();
    assert_eq!(swan.overload_int_calls(), 1);
    assert_eq!(swan.overload_string_calls(), 0);
}

#[test]
fn test_overload_dispatches_to_string_only() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &overload_string()).unwrap();

    duck.call("Overload", &mut [Value::from("x")]).unwrap();
    assert_eq!(swan.overload_int_calls(), 0);
    assert_eq!(swan.overload_string_calls(), 1);
}

#[test]
fn test_both_overloads_dispatch_by_signature() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &overload_both()).unwrap();

    let by_int = Signature::new("Overload").param(TypeRef::int());
    let by_str = Signature::new("Overload").param(TypeRef::string());
    duck.invoke(&by_str, &mut [Value::from("a")]).unwrap();
    duck.invoke(&by_str, &mut [Value::from("b")]).unwrap();
    duck.invoke(&by_int, &mut [Value::Int(1)]).unwrap();

    assert_eq!(swan.overload_int_calls(), 1);
    assert_eq!(swan.overload_string_calls(), 2);
    assert!(matches!(
        duck.call("Overload", &mut [Value::Int(1)]),
        Err(InvokeError::AmbiguousName { count: 2, .. })
    ));
}

#[test]
fn test_missing_overload_fails_adaptation() {
    let hatchery = hatchery();
    let contract = overload_both();

    let err = hatchery.adapt(Arc::new(IntOnly), &contract).unwrap_err();
    match &err {
        HatcheryError::Adaptation(e) => {
            assert_eq!(e.candidate, "IntOnly");
            assert_eq!(e.contract, ContractId::new("IOverload"));
            assert_eq!(
                e.first_unmatched(),
                Some(&Signature::new("Overload").param(TypeRef::string()))
            );
        }
        other => panic!("expected adaptation failure, got {other}"),
    }
    assert!(err.to_string().contains("void Overload(string)"));
    assert!(err.is_recoverable());
    assert!(!hatchery.can_adapt(&IntOnly, &contract));
    assert_eq!(hatchery.stats().adapter_types, 0);
}

#[test]
fn test_can_proxy_indexer() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &indexer()).unwrap();

    assert_eq!(duck.index_get(&[Value::from("key")]).unwrap(), Value::from("key"));
    duck.index_set(&[Value::from("key")], "value").unwrap();
    assert_eq!(swan.indexer.lock().as_deref(), Some("valuekey"));
}

#[test]
fn test_can_proxy_property() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &property()).unwrap();

    assert_eq!(duck.get("Prop").unwrap(), Value::Null);
    duck.set("Prop", "quack").unwrap();
    assert_eq!(swan.property.lock().as_deref(), Some("quack"));
    assert_eq!(duck.get("Prop").unwrap(), Value::from("quack"));
}

#[test]
fn test_can_proxy_generic_type() {
    let hatchery = hatchery();
    let swan = GenericSwan::new(5_i64);
    let duck = hatchery.adapt(swan.clone(), &generic_value(TypeRef::int())).unwrap();

    assert_eq!(duck.call("GetValue", &mut []).unwrap(), Value::Int(5));
    duck.call("SetValue", &mut [Value::Int(9)]).unwrap();
    assert_eq!(swan.get(), 9);
}

#[test]
fn test_generic_instantiations_are_distinct_types() {
    let hatchery = hatchery();
    let ints = GenericSwan::new(1_i64);
    let strings = GenericSwan::new("a".to_string());

    assert!(hatchery.can_adapt(&*strings, &generic_value(TypeRef::string())));
    assert!(!hatchery.can_adapt(&*ints, &generic_value(TypeRef::string())));

    let duck = hatchery.adapt(strings, &generic_value(TypeRef::string())).unwrap();
    assert_eq!(duck.adapter_type().name(), "GenericSwan<string>_as_IGenericValue<string>");
}

#[test]
fn test_can_proxy_generic_method() {
    let hatchery = hatchery();
    let duck = hatchery.adapt(Swan::new(), &generic_method()).unwrap();

    let mut args = [Value::Int(7)];
    let echoed = duck
        .invoke_generic(&echo_signature(), &[TypeRef::int()], &mut args)
        .unwrap();
    assert_eq!(echoed, Value::Int(7));

    let described = duck
        .invoke_generic(&describe_signature(), &[TypeRef::string()], &mut [])
        .unwrap();
    assert_eq!(described, Value::from("string"));

    let err = duck.invoke(&describe_signature(), &mut []).unwrap_err();
    assert!(matches!(err, InvokeError::GenericArity { expected: 1, actual: 0, .. }));
}

#[test]
fn test_can_proxy_inherited_contract() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let duck = hatchery.adapt(swan.clone(), &flying_swan()).unwrap();

    assert_eq!(duck.call("Fly", &mut []).unwrap(), Value::from("flap"));
    assert_eq!(duck.call("ReturnOnlyInt", &mut []).unwrap(), Value::Int(42));
    duck.call("SideEffectOnly", &mut []).unwrap();

    assert_eq!(swan.bird.flights.load(std::sync::atomic::Ordering::SeqCst), 1);
    for contract in ["IFlyingSwan", "IFlyer", "IReturnOnly"] {
        assert!(duck.implements(&ContractId::new(contract)), "{contract}");
    }
    assert!(!duck.implements(&ContractId::new("ISideEffect")));
}

#[test]
fn test_concrete_descriptor_is_invalid_argument() {
    let hatchery = hatchery();
    let data = ContractDescriptor::builder("Swan").concrete().build().unwrap();

    let err = hatchery.adapt(Swan::new(), &data).unwrap_err();
    assert!(matches!(err, HatcheryError::InvalidArgument(_)));
    assert!(!hatchery.can_adapt(&*Swan::new(), &data));
}

#[test]
fn test_adapter_type_is_stable_per_pair() {
    let hatchery = hatchery();
    let contract = return_only();

    let first = hatchery.adapt(Swan::new(), &contract).unwrap();
    let second = hatchery.adapt(Swan::new(), &contract).unwrap();
    let other = hatchery.adapt(Swan::new(), &side_effect()).unwrap();

    assert!(Arc::ptr_eq(first.adapter_type(), second.adapter_type()));
    assert!(!Arc::ptr_eq(first.adapter_type(), other.adapter_type()));
    assert_eq!(first.adapter_type().name(), "Swan_as_IReturnOnly");
    assert_eq!(hatchery.stats().syntheses, 2);
}

#[test]
fn test_can_adapt_an_adapter() {
    let hatchery = hatchery();
    let swan = Swan::new();
    let inner = hatchery.adapt(swan.clone(), &flying_swan()).unwrap();

    let outer = hatchery.adapt(Arc::new(inner), &side_effect()).unwrap();
    outer.call("SideEffectOnly", &mut []).unwrap();

    assert_eq!(swan.side_effects(), 1);
    assert_eq!(outer.adapter_type().name(), "Swan_as_IFlyingSwan_as_ISideEffect");
    assert!(outer.wrapped::<Duck>().is_some());
}

#[test]
fn test_adapter_does_not_expose_wider_contract() {
    let hatchery = hatchery();
    let inner = hatchery.adapt(Swan::new(), &return_only()).unwrap();

    assert!(!hatchery.can_adapt(&inner, &side_effect()));
}

#[test]
fn test_contract_from_json() {
    let hatchery = hatchery();
    let contract = ContractDescriptor::from_json(
        r#"{
            "name": "IJsonSwan",
            "operations": [
                { "name": "RefArgs", "params": [ { "ty": { "named": "int" }, "mode": "ref" } ] }
            ],
            "extends": [
                { "name": "IJsonReturnOnly", "operations": [ { "name": "ReturnOnlyInt", "returns": { "named": "int" } } ] }
            ]
        }"#,
    )
    .unwrap();

    let duck = hatchery.adapt(Swan::new(), &contract).unwrap();
    let mut args = [Value::Int(0)];
    duck.call("RefArgs", &mut args).unwrap();

    assert_eq!(args[0], Value::Int(5));
    assert_eq!(duck.call("ReturnOnlyInt", &mut []).unwrap(), Value::Int(42));
    assert!(duck.implements(&ContractId::new("IJsonReturnOnly")));
}

#[test]
fn test_forwarding_matches_direct_call() {
    let hatchery = hatchery();
    let direct = Swan::new();
    let adapted = Swan::new();
    let duck = hatchery.adapt(adapted.clone(), &property()).unwrap();
    let info = direct.type_info();

    let setter = Signature::setter("Prop", TypeRef::string());
    let getter = Signature::getter("Prop", TypeRef::string());

    let direct_set = info.invoke(&*direct, &setter, &[], &mut [Value::from("x")]);
    let adapted_set = duck.invoke(&setter, &mut [Value::from("x")]);
    assert_eq!(direct_set, adapted_set);
    assert_eq!(
        info.invoke(&*direct, &getter, &[], &mut []),
        duck.invoke(&getter, &mut [])
    );

    let bad = [Value::Int(1)];
    let direct_err = info.invoke(&*direct, &setter, &[], &mut bad.clone());
    let adapted_err = duck.invoke(&setter, &mut bad.clone());
    assert!(direct_err.is_err());
    assert_eq!(direct_err, adapted_err);
}

#[test]
fn test_same_name_with_other_operations_is_another_contract() {
    let hatchery = hatchery();
    let narrow = ContractDescriptor::builder("IShape")
        .operation(Signature::new("ReturnOnlyInt").returns(TypeRef::int()))
        .build()
        .unwrap();
    let wide = ContractDescriptor::builder("IShape")
        .operation(Signature::new("ReturnOnlyInt").returns(TypeRef::int()))
        .operation(Signature::new("Missing"))
        .build()
        .unwrap();
    let other = ContractDescriptor::builder("IShape")
        .operation(Signature::new("ReturnOnlyString").returns(TypeRef::string()))
        .build()
        .unwrap();

    let duck = hatchery.adapt(Swan::new(), &narrow).unwrap();
    assert_eq!(duck.call("ReturnOnlyInt", &mut []).unwrap(), Value::Int(42));

    // The published IShape adapter must not answer for a wider IShape.
    assert!(!hatchery.can_adapt(&*Swan::new(), &wide));
    let err = hatchery.adapt(Swan::new(), &wide).unwrap_err();
    assert!(matches!(err, HatcheryError::Adaptation(_)));
    assert_eq!(err.unmatched().to_vec(), vec![Signature::new("Missing")]);

    let other_duck = hatchery.adapt(Swan::new(), &other).unwrap();
    assert!(!Arc::ptr_eq(duck.adapter_type(), other_duck.adapter_type()));
    assert_eq!(other_duck.call("ReturnOnlyString", &mut []).unwrap(), Value::from("foo"));
    assert!(other_duck.call("ReturnOnlyInt", &mut []).is_err());

    let again = hatchery.adapt(Swan::new(), &narrow).unwrap();
    assert!(Arc::ptr_eq(duck.adapter_type(), again.adapter_type()));
    assert_eq!(hatchery.stats().syntheses, 2);
}

#[test]
fn test_equal_descriptors_share_one_adapter_type() {
    let hatchery = hatchery();
    let json = r#"{
        "name": "IJsonShape",
        "operations": [ { "name": "ReturnOnlyInt", "returns": { "named": "int" } } ]
    }"#;
    let first = ContractDescriptor::from_json(json).unwrap();
    let second = ContractDescriptor::from_json(json).unwrap();
    let built = ContractDescriptor::builder("IJsonShape")
        .operation(Signature::new("ReturnOnlyInt").returns(TypeRef::int()))
        .build()
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let a = hatchery.adapt(Swan::new(), &first).unwrap();
    let b = hatchery.adapt(Swan::new(), &second).unwrap();
    let c = hatchery.adapt(Swan::new(), &built).unwrap();

    assert!(Arc::ptr_eq(a.adapter_type(), b.adapter_type()));
    assert!(Arc::ptr_eq(a.adapter_type(), c.adapter_type()));
    let stats = hatchery.stats();
    assert_eq!(stats.syntheses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.adapter_types, 1);
}

#[test]
fn test_adapt_dyn_rejects_instance_of_another_type() {
    let hatchery = hatchery();
    let swan_info = Swan::new().type_info();

    let err = hatchery
        .adapt_dyn(Arc::new(Bird::default()), &swan_info, &return_only())
        .unwrap_err();
    assert!(matches!(
        err,
        HatcheryError::WrappedTypeMismatch { ref expected, .. } if expected == "Swan"
    ));

    let duck = hatchery
        .adapt_dyn(Swan::new(), &swan_info, &return_only())
        .unwrap();
    assert_eq!(duck.call("ReturnOnlyInt", &mut []).unwrap(), Value::Int(42));
}
