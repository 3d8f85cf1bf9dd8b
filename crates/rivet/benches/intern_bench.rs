//! Interning benchmarks
//!
//! - hit: content already in the intern table
//! - const: content resolved by the precompiled overlay
//! - miss: fresh content, including table growth
//! - long: long strings, never deduplicated

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rivet::{RivetVM, VmOption};

fn manual_vm() -> RivetVM {
    let option = VmOption {
        gc_auto: false,
        ..VmOption::default()
    };
    RivetVM::new(option).unwrap()
}

fn bench_intern_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("intern_hit");
    let mut vm = manual_vm();

    for text in ["id", "counter_value", "a_rather_long_identifier_name_40_bytes_x"] {
        vm.new_str(text).unwrap();
        group.bench_with_input(BenchmarkId::new("short", text.len()), &text, |b, text| {
            b.iter(|| black_box(vm.intern(black_box(text.as_bytes())).unwrap()));
        });
    }

    group.bench_function("const", |b| {
        b.iter(|| black_box(vm.intern(black_box(b"tostring")).unwrap()));
    });

    group.finish();
}

fn bench_intern_miss(c: &mut Criterion) {
    let keys: Vec<String> = (0..10_000).map(|i| format!("key_{i}")).collect();

    c.bench_function("intern_miss_10k", |b| {
        b.iter_with_setup(manual_vm, |mut vm| {
            for key in &keys {
                black_box(vm.new_str(key).unwrap());
            }
            vm
        });
    });
}

fn bench_long_string(c: &mut Criterion) {
    let text = vec![b'x'; 1024];
    c.bench_function("long_string_1k", |b| {
        b.iter_with_setup(manual_vm, |mut vm| {
            for _ in 0..100 {
                black_box(vm.intern(&text).unwrap());
            }
            vm
        });
    });
}

fn bench_sweep(c: &mut Criterion) {
    c.bench_function("sweep_10k", |b| {
        b.iter_with_setup(
            || {
                let mut vm = manual_vm();
                for i in 0..10_000 {
                    let s = vm.new_str(&format!("s{i}")).unwrap();
                    if i % 10 == 0 {
                        vm.mark(s);
                    }
                }
                vm
            },
            |mut vm| {
                black_box(vm.sweep());
                vm
            },
        );
    });
}

criterion_group!(
    benches,
    bench_intern_hit,
    bench_intern_miss,
    bench_long_string,
    bench_sweep
);
criterion_main!(benches);
