use tyro::{
    CallableRef, ErrorKind, Instance, ObjectResult, Runtime, Target, TypeId, TypeSpec, Value,
};

fn shout(_rt: &mut Runtime, args: Vec<Value>) -> ObjectResult<Value> {
    let s = args.first().and_then(Value::as_str).unwrap_or_default();
    Ok(Value::from(s.to_uppercase()))
}

fn lucky_number(_rt: &mut Runtime, _args: Vec<Value>) -> ObjectResult<Value> {
    Ok(Value::Int(7))
}

fn adder_factory(_rt: &mut Runtime, ty: TypeId, args: Vec<Value>) -> ObjectResult<Value> {
    let base = args.first().and_then(Value::as_int).unwrap_or(0);
    Ok(Value::Instance(Instance::new(ty, Value::Int(base))))
}

/// `invoke` makes adder instances invokable values: sums the base with
/// every int argument.
fn adder_invoke(_rt: &mut Runtime, receiver: &tyro::InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    let base = receiver.payload().as_int().unwrap_or(0);
    let sum: i64 = args.iter().filter_map(Value::as_int).sum();
    Ok(Value::Int(base + sum))
}

fn runtime_with_adder() -> Runtime {
    let mut rt = Runtime::new();
    rt.register_type(TypeSpec::new("adder", adder_factory).with_method("invoke", adder_invoke))
        .unwrap();
    rt
}

// ---------------------------------------------------------------------
// construction shape validation
// ---------------------------------------------------------------------

#[test]
fn pair_with_three_items_is_invalid() {
    let err = CallableRef::from_pair(&[Value::from("a"), Value::from("b"), Value::from("c")])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn pair_with_one_item_is_invalid() {
    let err = CallableRef::from_pair(&[Value::from("a")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn pair_with_int_owner_is_invalid() {
    let err = CallableRef::from_pair(&[Value::Int(42), Value::from("method")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn pair_with_non_string_member_is_invalid() {
    let err = CallableRef::from_pair(&[Value::from("text"), Value::Int(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn list_value_is_treated_as_pair() {
    let pair = Value::List(vec![Value::from("text"), Value::from("factory")]);
    let reference = CallableRef::new(pair, None).unwrap();
    assert!(matches!(reference.resolve().unwrap(), Target::Static { .. }));
}

// ---------------------------------------------------------------------
// resolution forms
// ---------------------------------------------------------------------

#[test]
fn static_pair_resolves_to_qualified_form() {
    let reference =
        CallableRef::from_pair(&[Value::from("SomeClass"), Value::from("staticMethod")]).unwrap();
    match reference.resolve().unwrap() {
        Target::Static { type_name, method } => {
            assert_eq!(type_name, "SomeClass");
            assert_eq!(method, "staticMethod");
        }
        other => panic!("expected static target, got {other:?}"),
    }
    assert_eq!(reference.to_string(), "SomeClass::staticMethod");
}

#[test]
fn instance_pair_resolves_to_bound_form() {
    let mut rt = runtime_with_adder();
    let value = rt.create("adder", vec![Value::Int(1)]).unwrap();
    let inst = value.as_instance().unwrap();
    let reference =
        CallableRef::from_pair(&[Value::Instance(inst.clone()), Value::from("invoke")]).unwrap();
    match reference.resolve().unwrap() {
        Target::Method { method, .. } => assert_eq!(method, "invoke"),
        other => panic!("expected bound method target, got {other:?}"),
    }
}

#[test]
fn bare_string_resolves_to_free_function() {
    let reference = CallableRef::new(Value::from("shout"), None).unwrap();
    assert!(matches!(reference.resolve().unwrap(), Target::Function(name) if name == "shout"));
}

#[test]
fn empty_reference_does_not_resolve() {
    let mut reference = CallableRef::function("anything");
    reference.set_member(None);
    let err = reference.resolve().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
    assert_eq!(reference.to_string(), "<unresolved reference>");
}

// ---------------------------------------------------------------------
// invocability and invocation
// ---------------------------------------------------------------------

#[test]
fn missing_free_function_is_not_callable() {
    let rt = Runtime::new();
    let reference = CallableRef::new(Value::from("nonexistent_function"), None).unwrap();
    assert!(!reference.is_callable(&rt));
}

#[test]
fn apply_on_missing_function_fails_not_callable() {
    let mut rt = Runtime::new();
    let reference = CallableRef::new(Value::from("nonexistent_function"), None).unwrap();
    let err = reference.apply(&mut rt, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotCallable);
}

#[test]
fn registered_function_is_callable_and_invokes() {
    let mut rt = Runtime::new();
    rt.register_function("shout", shout);
    let reference = CallableRef::function("shout");
    assert!(reference.is_callable(&rt));
    let out = reference.call(&mut rt, vec![Value::from("hey")]).unwrap();
    assert_eq!(out.as_str(), Some("HEY"));
}

#[test]
fn apply_without_arguments_invokes_with_zero() {
    let mut rt = Runtime::new();
    rt.register_function("lucky_number", lucky_number);
    let reference = CallableRef::function("lucky_number");
    let out = reference.apply(&mut rt, None).unwrap();
    assert_eq!(out.as_int(), Some(7));
}

#[test]
fn bound_method_apply_forwards_arguments() {
    let mut rt = runtime_with_adder();
    let value = rt.create("adder", vec![Value::Int(10)]).unwrap();
    let inst = value.as_instance().unwrap().clone();
    let reference = CallableRef::from_pair(&[Value::Instance(inst), Value::from("invoke")]).unwrap();
    let out = reference
        .apply(&mut rt, Some(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        .unwrap();
    assert_eq!(out.as_int(), Some(16));
}

#[test]
fn invokable_instance_is_callable_by_itself() {
    let mut rt = runtime_with_adder();
    let value = rt.create("adder", vec![Value::Int(5)]).unwrap();
    let reference = CallableRef::new(value, None).unwrap();
    assert!(reference.is_callable(&rt));
    let out = reference.call(&mut rt, vec![Value::Int(4)]).unwrap();
    assert_eq!(out.as_int(), Some(9));
}

#[test]
fn plain_value_is_not_invokable() {
    let mut rt = Runtime::new();
    let reference = CallableRef::new(Value::Int(3), None).unwrap();
    assert!(!reference.is_callable(&rt));
    let err = reference.apply(&mut rt, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotCallable);
}

#[test]
fn static_factory_reference_constructs_instances() {
    let mut rt = runtime_with_adder();
    let reference = CallableRef::from_pair(&[Value::from("adder"), Value::from("factory")]).unwrap();
    assert!(reference.is_callable(&rt));
    let out = reference.apply(&mut rt, Some(vec![Value::Int(2)])).unwrap();
    let inst = out.as_instance().unwrap();
    assert_eq!(rt.type_name(inst.ty()), "adder");
    assert_eq!(inst.payload().as_int(), Some(2));
}

// ---------------------------------------------------------------------
// mutation through accessors
// ---------------------------------------------------------------------

#[test]
fn invocability_is_checked_fresh_after_mutation() {
    let mut rt = Runtime::new();
    let mut reference = CallableRef::function("missing");
    assert!(!reference.is_callable(&rt));

    rt.register_function("shout", shout);
    reference.set_member(Some("shout"));
    assert!(reference.is_callable(&rt));
    let out = reference.call(&mut rt, vec![Value::from("ok")]).unwrap();
    assert_eq!(out.as_str(), Some("OK"));
}

#[test]
fn setting_owner_switches_shape_to_static() {
    let rt = runtime_with_adder();
    let mut reference = CallableRef::function("factory");
    assert!(matches!(reference.resolve().unwrap(), Target::Function(_)));

    reference.set_owner(Some(Value::from("adder")));
    assert!(matches!(reference.resolve().unwrap(), Target::Static { .. }));
    assert!(reference.is_callable(&rt));
}

#[test]
fn accessors_round_trip() {
    let mut reference = CallableRef::from_pair(&[Value::from("adder"), Value::from("invoke")]).unwrap();
    assert_eq!(reference.owner().and_then(Value::as_str), Some("adder"));
    assert_eq!(reference.member(), Some("invoke"));

    reference.set_owner(None);
    assert!(reference.owner().is_none());
    assert!(matches!(reference.resolve().unwrap(), Target::Function(_)));
}

// ---------------------------------------------------------------------
// is_method
// ---------------------------------------------------------------------

#[test]
fn is_method_true_for_instance_method() {
    let mut rt = runtime_with_adder();
    let value = rt.create("adder", vec![]).unwrap();
    let inst = value.as_instance().unwrap();
    let reference = CallableRef::from_pair(&[Value::Instance(inst.clone()), Value::from("invoke")]).unwrap();
    assert!(reference.is_method(&rt));
}

#[test]
fn is_method_true_for_inherited_static() {
    let rt = runtime_with_adder();
    let reference = CallableRef::from_pair(&[Value::from("adder"), Value::from("factory")]).unwrap();
    assert!(reference.is_method(&rt));
}

#[test]
fn is_method_false_without_owner() {
    let mut rt = Runtime::new();
    rt.register_function("shout", shout);
    let reference = CallableRef::function("shout");
    assert!(!reference.is_method(&rt));
}

#[test]
fn is_method_false_for_unknown_member() {
    let mut rt = runtime_with_adder();
    let value = rt.create("adder", vec![]).unwrap();
    let inst = value.as_instance().unwrap();
    let reference = CallableRef::bound(inst, "no_such_method");
    assert!(!reference.is_method(&rt));
    assert!(!reference.is_callable(&rt));
}
