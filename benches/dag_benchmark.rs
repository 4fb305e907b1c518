use assetflow::dag::DagEngine;
use assetflow::models::{TaskConfig, TaskKind};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn group_task(name: String, depends_on: Vec<String>) -> TaskConfig {
    TaskConfig {
        name,
        kind: TaskKind::Group,
        depends_on,
        config: None,
        timeout: Some(300),
    }
}

/// Create a linear chain of tasks: task0 -> task1 -> task2 -> ...
/// This represents the worst case for topological sort (maximum depth)
fn create_linear_chain(count: usize) -> Vec<TaskConfig> {
    let mut tasks = Vec::with_capacity(count);

    for i in 0..count {
        let depends_on = if i == 0 {
            vec![]
        } else {
            vec![format!("task{}", i - 1)]
        };

        tasks.push(group_task(format!("task{}", i), depends_on));
    }

    tasks
}

/// Create a wide fan-in: 1 root -> N parallel tasks -> 1 aggregate task
fn create_wide_fan_in(width: usize) -> Vec<TaskConfig> {
    let mut tasks = vec![group_task("root".to_string(), vec![])];

    for i in 0..width {
        tasks.push(group_task(
            format!("branch{}", i),
            vec!["root".to_string()],
        ));
    }

    let branch_deps: Vec<String> = (0..width).map(|i| format!("branch{}", i)).collect();
    tasks.push(group_task("aggregate".to_string(), branch_deps));

    tasks
}

/// Benchmark DAG building and topological sort with various sizes
fn bench_dag_build_and_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_build_and_sort");

    for size in [10, 50, 100, 250].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let tasks = create_linear_chain(size);
            b.iter(|| {
                let dag = DagEngine::build(black_box(&tasks)).unwrap();
                let _sorted = dag.topological_sort().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark cycle detection performance
fn bench_cycle_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_detection");

    for size in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("acyclic", size), size, |b, &size| {
            let tasks = create_linear_chain(size);
            b.iter(|| {
                let dag = DagEngine::build(black_box(&tasks)).unwrap();
                dag.validate_acyclic().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark per-task execution order computation for different shapes
fn bench_execution_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution_order");

    for size in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("linear", size), size, |b, &size| {
            let tasks = create_linear_chain(size);
            let dag = DagEngine::build(&tasks).unwrap();
            let last = format!("task{}", size - 1);
            b.iter(|| {
                let _order = dag.execution_order_for(black_box(&last)).unwrap();
            });
        });
    }

    for width in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("fan_in", width), width, |b, &width| {
            let tasks = create_wide_fan_in(width);
            let dag = DagEngine::build(&tasks).unwrap();
            b.iter(|| {
                let _order = dag.execution_order_for(black_box("aggregate")).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dag_build_and_sort,
    bench_cycle_detection,
    bench_execution_order
);
criterion_main!(benches);
