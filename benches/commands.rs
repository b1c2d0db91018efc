use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tabdb::{Catalog, Interpreter, parse_statement};
use tempfile::TempDir;

/// A workspace holding `users(name, age, active)` with `n` records.
///
/// Records are inserted through the storage layer and saved once, so
/// setup cost does not grow with one full rewrite per row.
fn setup_populated_db(n: usize) -> (TempDir, Interpreter) {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::new(dir.path());
    catalog.create_database("bench").unwrap();
    catalog.use_database("bench").unwrap();

    let db = catalog.database_mut().unwrap();
    let attributes = ["name", "age", "active"].map(String::from);
    db.create_table("users", &attributes).unwrap();

    let table = db.load_table("users").unwrap();
    for i in 0..n {
        let row = vec![
            format!("user{i}"),
            (i % 100).to_string(),
            if i % 2 == 0 { "TRUE" } else { "FALSE" }.to_string(),
        ];
        table.insert(row).unwrap();
    }
    catalog.save_database().unwrap();

    (dir, Interpreter::new(catalog))
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parse");
    group.bench_function("select_with_nested_condition", |b| {
        b.iter(|| {
            let statement = parse_statement(black_box(
                "SELECT name, age FROM users WHERE (age > 30 AND active == TRUE) OR name LIKE 'user1';",
            ))
            .unwrap();
            black_box(statement);
        });
    });
    group.finish();
}

fn bench_insert_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert_Pipeline");
    group.bench_function("insert_single_row", |b| {
        let (_dir, mut interpreter) = setup_populated_db(100);
        b.iter(|| {
            interpreter
                .execute(black_box("INSERT INTO users VALUES ('bench', 42, TRUE);"))
                .unwrap();
        });
    });
    group.finish();
}

fn bench_select_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let (_dir, mut interpreter) = setup_populated_db(n);
            b.iter(|| {
                let res = interpreter
                    .execute("SELECT * FROM users WHERE age == 42;")
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_update_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Update_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_batched(
                || setup_populated_db(n),
                |(dir, mut interpreter)| {
                    interpreter
                        .execute("UPDATE users SET age = 99 WHERE active == TRUE;")
                        .unwrap();
                    black_box((dir, interpreter));
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_delete_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delete_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_batched(
                || setup_populated_db(n),
                |(dir, mut interpreter)| {
                    interpreter
                        .execute("DELETE FROM users WHERE age > 90;")
                        .unwrap();
                    black_box((dir, interpreter));
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_insert_sql,
    bench_select_scaling,
    bench_update_performance,
    bench_delete_performance
);
criterion_main!(benches);
