use criterion::{black_box, criterion_group, criterion_main, Bencher, Criterion};
use tyro::{CallableRef, ObjectResult, Runtime, Value};

fn pair_factory(_rt: &mut Runtime, ty: tyro::TypeId, args: Vec<Value>) -> ObjectResult<Value> {
    Ok(Value::Instance(tyro::Instance::new(ty, Value::List(args))))
}

fn sum(_rt: &mut Runtime, args: Vec<Value>) -> ObjectResult<Value> {
    let total: i64 = args.iter().filter_map(Value::as_int).sum();
    Ok(Value::Int(total))
}

fn runtime_with_pair() -> Runtime {
    let mut rt = Runtime::new();
    rt.register_type(tyro::TypeSpec::new("pair", pair_factory)).unwrap();
    rt.register_function("sum", sum);
    rt
}

/// Benchmarks the idempotent-cast fast path: the value already is an
/// instance of the target type, so the same handle comes back.
fn cast_identity(bench: &mut Bencher) {
    let mut rt = runtime_with_pair();
    let inst = rt.create("pair", vec![Value::Int(1), Value::Int(2)]).unwrap();

    let same = rt.cast("pair", inst.clone()).unwrap();
    assert!(same.is(&inst));

    bench.iter(|| {
        let same = rt.cast("pair", inst.clone()).unwrap();
        black_box(same);
    });
}

/// Benchmarks casting a raw value, which always runs the factory.
fn cast_construct(bench: &mut Bencher) {
    let mut rt = runtime_with_pair();

    bench.iter(|| {
        let inst = rt.cast("pair", Value::Int(7)).unwrap();
        black_box(inst);
    });
}

/// Benchmarks a named-singleton cache hit.
fn singleton_hit(bench: &mut Bencher) {
    let mut rt = runtime_with_pair();
    let first = rt.instance("pair", vec![Value::from("db")]).unwrap();

    let again = rt.instance("pair", vec![Value::from("db")]).unwrap();
    assert!(again.is(&first));

    bench.iter(|| {
        let cached = rt.instance("pair", vec![Value::from("db")]).unwrap();
        black_box(cached);
    });
}

/// Benchmarks resolving and applying a free-function reference, including
/// the per-call invocability check.
fn callable_apply(bench: &mut Bencher) {
    let mut rt = runtime_with_pair();
    let reference = CallableRef::function("sum");
    let args = vec![Value::Int(1), Value::Int(2), Value::Int(3)];

    let total = reference.apply(&mut rt, Some(args.clone())).unwrap();
    assert_eq!(total.as_int(), Some(6));

    bench.iter(|| {
        let total = reference.apply(&mut rt, Some(args.clone())).unwrap();
        black_box(total);
    });
}

/// Benchmarks a built-in method call through the dispatch tables.
fn method_dispatch(bench: &mut Bencher) {
    let mut rt = Runtime::new();
    let text = rt.cast("text", Value::from("Some Article: Title!")).unwrap();
    let receiver = text.as_instance().unwrap().clone();

    bench.iter(|| {
        let slug = rt.call_method(&receiver, "urlize", vec![]).unwrap();
        black_box(slug);
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cast");
    group.bench_function("identity", cast_identity);
    group.bench_function("construct", cast_construct);
    group.finish();

    let mut group = c.benchmark_group("singleton");
    group.bench_function("hit", singleton_hit);
    group.finish();

    let mut group = c.benchmark_group("callable");
    group.bench_function("apply", callable_apply);
    group.bench_function("method_dispatch", method_dispatch);
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
