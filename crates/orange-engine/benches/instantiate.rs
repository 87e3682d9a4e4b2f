use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orange_engine::{DefinitionList, MemberSpec, Runtime, Value};

fn point_spec() -> MemberSpec {
    MemberSpec::new()
        .member("x", 0)
        .member("y", 0)
        .member("protected scale", 1)
        .member("public readonly id", Value::Null)
        .constructor(|rt, this, args| {
            rt.set(this, "x", args.first().cloned().unwrap_or_default())?;
            rt.set(this, "y", args.get(1).cloned().unwrap_or_default())?;
            rt.set(this, "id", Value::from(1))?;
            Ok(Value::Undefined)
        })
        .method("public length", |rt, this, _| {
            let x = rt.get(this, "x")?.as_number().unwrap_or(0.0);
            let y = rt.get(this, "y")?.as_number().unwrap_or(0.0);
            let scale = rt.get(this, "scale")?.as_number().unwrap_or(1.0);
            Ok(Value::from((x * x + y * y).sqrt() * scale))
        })
}

fn bench_parse(c: &mut Criterion) {
    let spec = point_spec();

    c.bench_function("parse_definitions", |b| {
        b.iter(|| DefinitionList::parse(black_box(&spec), None).unwrap());
    });
}

fn bench_construct(c: &mut Criterion) {
    let rt = Runtime::new();
    let point = rt.class("Point", &point_spec()).unwrap();
    let args = [Value::from(3), Value::from(4)];

    c.bench_function("construct_point", |b| {
        b.iter(|| rt.construct(black_box(&point), &args).unwrap());
    });

    let instance = rt.construct(&point, &args).unwrap();
    c.bench_function("call_method", |b| {
        b.iter(|| rt.call(black_box(&instance), "length", &[]).unwrap());
    });
}

fn bench_construct_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct_depth");

    for depth in [1usize, 4, 8] {
        let rt = Runtime::new();
        let mut class = rt.class("Level0", &point_spec()).unwrap();
        for level in 1..depth {
            let spec = MemberSpec::new().member(&format!("protected level{}", level), level as f64);
            class = rt.extend(&class, &format!("Level{}", level), &spec).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(depth), &class, |b, class| {
            b.iter(|| rt.construct(black_box(class), &[]).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_construct, bench_construct_depth);
criterion_main!(benches);
