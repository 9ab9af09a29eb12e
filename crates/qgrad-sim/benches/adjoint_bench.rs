//! Benchmarks for forward simulation and adjoint gradients
//!
//! Run with: cargo bench -p qgrad-sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use qgrad_ir::{Circuit, QubitId, SymbolTable};
use qgrad_sim::{
    AdjointEngine, BatchDriver, BatchEntry, GradientConfig, PauliSum, PauliTerm, Retention,
    simulate,
};

/// Hardware-efficient ansatz: `layers` of X^s/Z^s on every qubit followed by
/// a CZ ladder, one symbol per rotation.
fn ansatz(num_qubits: u32, layers: u32) -> (Circuit, SymbolTable) {
    let mut circuit = Circuit::with_size("ansatz", num_qubits);
    let mut names = Vec::new();
    for layer in 0..layers {
        for q in 0..num_qubits {
            let x = format!("x_{layer}_{q}");
            let z = format!("z_{layer}_{q}");
            circuit
                .x_pow(x.as_str(), QubitId(q))
                .unwrap()
                .z_pow(z.as_str(), QubitId(q))
                .unwrap();
            names.push(x);
            names.push(z);
        }
        for q in 0..num_qubits - 1 {
            circuit.cz(QubitId(q), QubitId(q + 1)).unwrap();
        }
    }
    (circuit, SymbolTable::new(names).unwrap())
}

fn values_for(table: &SymbolTable) -> Vec<f64> {
    (0..table.len()).map(|i| 0.1 + 0.01 * i as f64).collect()
}

fn magnetization(num_qubits: u32) -> PauliSum {
    (0..num_qubits).map(|q| PauliTerm::z(q, 1.0)).collect()
}

/// Benchmark the forward pass alone
fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");

    for num_qubits in &[4u32, 8, 12, 16] {
        let (circuit, table) = ansatz(*num_qubits, 4);
        let values = values_for(&table);
        group.bench_with_input(
            BenchmarkId::new("simulate", num_qubits),
            &circuit,
            |b, circuit| {
                let resolver = table.resolver(&values).unwrap();
                b.iter(|| black_box(simulate(circuit, &resolver).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark one adjoint gradient per retention strategy
fn bench_adjoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjoint");

    for num_qubits in &[4u32, 8, 12] {
        let (circuit, table) = ansatz(*num_qubits, 4);
        let values = values_for(&table);
        let observable = magnetization(*num_qubits);

        let strategies = [("recompute", Retention::Recompute), ("cache", Retention::Cache)];
        for (label, retention) in strategies {
            let engine = AdjointEngine::new(retention);
            group.bench_with_input(
                BenchmarkId::new(label, num_qubits),
                &circuit,
                |b, circuit| {
                    let resolver = table.resolver(&values).unwrap();
                    b.iter(|| {
                        black_box(engine.gradient(circuit, &resolver, &observable, 1.0).unwrap())
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the batch driver
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(20);

    let (circuit, table) = ansatz(10, 3);
    let values = values_for(&table);

    for batch in &[1usize, 8, 32] {
        let entries: Vec<BatchEntry> = (0..*batch)
            .map(|_| BatchEntry::new(circuit.clone(), vec![magnetization(10)]))
            .collect();
        let rows = Array2::from_shape_fn((*batch, table.len()), |(_, s)| values[s]);
        let upstream = Array2::from_elem((1, 1), 1.0);

        for parallel in [false, true] {
            let driver = BatchDriver::new(GradientConfig {
                parallel,
                ..GradientConfig::default()
            })
            .unwrap();
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, batch), &entries, |b, entries| {
                b.iter(|| {
                    black_box(
                        driver
                            .gradients(&table, entries, rows.view(), upstream.view())
                            .unwrap(),
                    )
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_forward, bench_adjoint, bench_batch);

criterion_main!(benches);
