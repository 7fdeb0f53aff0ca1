use std::collections::BTreeSet;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use menugate_auth::{merge, Capability, PermissionGrant};
use menugate_core::GroupId;

/// `groups` groups, each granting a rotating capability on every one of `menus` menus.
fn grants(groups: usize, menus: usize) -> Vec<PermissionGrant> {
    (0..groups)
        .flat_map(|g| {
            (0..menus).map(move |m| {
                PermissionGrant::new(format!("g{g}"), format!("m{m}")).with(Capability::ALL[(g + m) % 4])
            })
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for (groups, menus) in [(2usize, 100usize), (10, 500), (50, 1000)] {
        let rows = grants(groups, menus);
        let member_of: BTreeSet<GroupId> = (0..groups).step_by(2).map(|g| GroupId::new(format!("g{g}"))).collect();
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows.len()), &rows, |b, rows| {
            b.iter(|| merge(black_box(&member_of), black_box(rows)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
