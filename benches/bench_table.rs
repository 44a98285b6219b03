use binggan::{BenchRunner, INSTRUMENTED_SYSTEM, PeakMemAlloc, black_box, plugins::*};
use densemap::{DenseMap, DenseMultiMap};
use rand::prelude::*;
use rustc_hash::FxHashMap;

#[global_allocator]
pub static GLOBAL: &PeakMemAlloc<std::alloc::System> = &INSTRUMENTED_SYSTEM;

fn numeric_keys(num_keys: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    (0..num_keys).map(|_| rng.gen_range(0..u64::MAX)).collect()
}

fn bench_insert() {
    let mut runner = BenchRunner::new();
    runner
        .add_plugin(CacheTrasher::default())
        .add_plugin(PeakMemAllocPlugin::new(GLOBAL));

    for &num_keys in &[10_000usize, 100_000] {
        let keys = numeric_keys(num_keys);
        let mut group = runner.new_group();
        group.set_name(format!("insert_{num_keys}"));
        group.set_input_size(num_keys * std::mem::size_of::<u64>());
        group.register_with_input("densemap", &keys, move |keys| {
            let mut map = DenseMap::new();
            for &k in keys.iter() {
                let _ = map.insert(k, k);
            }
            black_box(map.len() as u64)
        });
        group.register_with_input("fx_hashmap", &keys, move |keys| {
            let mut map = FxHashMap::default();
            for &k in keys.iter() {
                map.insert(k, k);
            }
            black_box(map.len() as u64)
        });
        group.run();
    }
}

fn bench_lookup() {
    let mut runner = BenchRunner::new();
    runner.add_plugin(CacheTrasher::default());

    let keys = numeric_keys(100_000);
    let mut dense = DenseMap::new();
    let mut fx = FxHashMap::default();
    for &k in &keys {
        let _ = dense.insert(k, k);
        fx.insert(k, k);
    }

    let mut group = runner.new_group();
    group.set_name("lookup_100000");
    group.set_input_size(keys.len() * std::mem::size_of::<u64>());
    group.register_with_input("densemap", &keys, move |keys| {
        let mut hits = 0u64;
        for k in keys.iter() {
            if dense.get(k).is_some() {
                hits += 1;
            }
        }
        black_box(hits)
    });
    group.register_with_input("fx_hashmap", &keys, move |keys| {
        let mut hits = 0u64;
        for k in keys.iter() {
            if fx.get(k).is_some() {
                hits += 1;
            }
        }
        black_box(hits)
    });
    group.run();
}

fn bench_churn() {
    let mut runner = BenchRunner::new();
    runner.add_plugin(PeakMemAllocPlugin::new(GLOBAL));

    let keys = numeric_keys(50_000);
    let mut group = runner.new_group();
    group.set_name("insert_then_erase_half");
    group.set_input_size(keys.len() * std::mem::size_of::<u64>());
    group.register_with_input("densemap", &keys, move |keys| {
        let mut map = DenseMap::new();
        for &k in keys.iter() {
            let _ = map.insert(k, k);
        }
        for &k in keys.iter().step_by(2) {
            map.remove(&k);
        }
        black_box(map.len() as u64)
    });
    group.register_with_input("multimap_dup_keys", &keys, move |keys| {
        let mut map = DenseMultiMap::new();
        for &k in keys.iter() {
            let _ = map.insert(k % 4096, k);
        }
        for k in (0..4096u64).step_by(2) {
            map.remove(&k);
        }
        black_box(map.len() as u64)
    });
    group.run();
}

fn main() {
    bench_insert();
    bench_lookup();
    bench_churn();
}
