use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use csvio::CsvioError;
use csvio::io::{CsvReader, ReadOptions};
use csvio::processing::{FieldProcessor, Pipeline, ProcessorRegistry, RowProcessor, convert};
use csvio::types::{DataType, Record, Value};

fn make_rows(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::from([
                ("Supplier", Value::from(format!("Supplier {i}"))),
                ("Fruit", Value::from("Apple")),
                ("Origin", Value::from("Spain")),
                ("Quantity", Value::from(i.to_string())),
            ])
        })
        .collect()
}

fn make_csv(n: usize) -> String {
    let mut out = String::from("Supplier,Fruit,Origin,Quantity\n");
    for i in 0..n {
        out.push_str(&format!("Supplier {i},Apple,Spain,{i}\n"));
    }
    out
}

fn make_pipeline() -> Pipeline {
    let registry = ProcessorRegistry::shared();

    let fp = FieldProcessor::new(registry.clone(), "bench_fields");
    fp.add_processors("Quantity", [convert::cast(DataType::Int64)])
        .expect("field handle");
    fp.add_processors("Fruit", [convert::upper()]).expect("field handle");

    let rp = RowProcessor::new(registry, "bench_rows");
    rp.add_processor(|mut row: Record| {
        let label = format!("{} ({})", row["Supplier"], row["Origin"]);
        row.insert("Supplier", label);
        Ok::<_, CsvioError>(row)
    })
    .expect("row handle");

    Pipeline::new().with(fp).with(rp)
}

fn bench_pipeline_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_process_rows");
    let pipeline = make_pipeline();

    for &n in &[100usize, 1_000, 10_000] {
        let rows = make_rows(n);
        group.bench_function(format!("rows_{n}"), |b| {
            b.iter(|| black_box(pipeline.process_rows(black_box(&rows)).expect("process")))
        });
    }

    group.finish();
}

fn bench_read_with_processors(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_read_with_processors");

    for &n in &[1_000usize, 10_000] {
        let input = make_csv(n);
        group.bench_function(format!("read_{n}"), |b| {
            b.iter_batched(
                || ReadOptions {
                    processors: make_pipeline(),
                    ..Default::default()
                },
                |opts| black_box(CsvReader::from_reader(input.as_bytes(), &opts).expect("read")),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline_rows, bench_read_with_processors);
criterion_main!(benches);
