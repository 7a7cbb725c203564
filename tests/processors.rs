use std::fs;

use csvio::io::{CsvReader, CsvWriter, ReadOptions, WriteOptions};
use csvio::processing::{
    convert, field_fn, FieldProcessor, Pipeline, Processor, ProcessorRegistry, RowProcessor,
};
use csvio::types::{DataType, Record, Value};
use csvio::{CsvioError, TransformError};

const FIXTURE: &str = "tests/fixtures/fruit_stock.csv";
const FIELDS: [&str; 4] = ["Supplier", "Fruit", "Origin", "Quantity"];

fn fruit(supplier: &str, fruit: &str, origin: &str, quantity: i64) -> Record {
    Record::from([
        ("Supplier", Value::from(supplier)),
        ("Fruit", Value::from(fruit)),
        ("Origin", Value::from(origin)),
        ("Quantity", Value::Int64(quantity)),
    ])
}

fn read_fixture(processors: Pipeline) -> CsvReader {
    CsvReader::open(
        FIXTURE,
        &ReadOptions {
            processors,
            ..Default::default()
        },
    )
    .unwrap()
}

/// Copy the fixture through a writer that runs `processors` before writing.
fn write_fixture(processors: Pipeline) -> CsvWriter {
    let dir = tempfile::tempdir().unwrap();
    let source = read_fixture(Pipeline::new());
    let mut writer = CsvWriter::new(
        dir.path().join("out.csv"),
        FIELDS,
        WriteOptions {
            processors,
            ..Default::default()
        },
    )
    .unwrap();
    writer.add_rows(source.rows().iter().cloned());
    writer.flush().unwrap();
    writer
}

fn add_one(v: Value) -> Result<Value, TransformError> {
    let n = v.as_i64().ok_or("not an integer")?;
    Ok(Value::Int64(n + 1))
}

fn field_processor_scenario() -> FieldProcessor {
    let proc1 = FieldProcessor::new(ProcessorRegistry::shared(), "proc1");
    proc1
        .add_processors("Quantity", [convert::cast(DataType::Int64), field_fn(add_one)])
        .unwrap();
    proc1
        .add_processors("Supplier", [convert::replace("Big", "Huge")])
        .unwrap();
    proc1.add_processors("Origin", [convert::upper()]).unwrap();
    proc1
        .add_processors("Supplier", [convert::replace("Strawberries", "Strawberry")])
        .unwrap();
    proc1
        .add_processors("Supplier", [convert::replace("Huge", "Enormous")])
        .unwrap();
    proc1
}

fn field_processor_result() -> Vec<Record> {
    vec![
        fruit("Enormous Apples", "Apple", "SPAIN", 2),
        fruit("Enormous Melons", "Melons", "ITALY", 3),
        fruit("Long Mangoes", "Mango", "INDIA", 4),
        fruit("Small Strawberry", "Strawberry", "FRANCE", 5),
        fruit("Short Mangoes", "Mango", "FRANCE", 6),
        fruit("Sweet Strawberry", "Strawberry", "SPAIN", 7),
        fruit("Square Apples", "Apple", "ITALY", 8),
        fruit("Small Melons", "Melons", "ITALY", 9),
        fruit("Dark Berries", "Strawberry", "AUSTRALIA", 10),
        fruit("Sweet Berries", "Blackcurrant", "AUSTRALIA", 11),
    ]
}

fn label_and_bump(mut row: Record) -> Result<Record, TransformError> {
    let label = format!("{} ({})", row["Supplier"], row["Origin"]);
    row.insert("Supplier", label);

    let quantity = match &row["Quantity"] {
        Value::Int64(n) => *n,
        other => other.to_string().parse::<i64>()?,
    };
    row.insert("Quantity", if quantity > 5 { quantity + 1 } else { quantity });
    Ok(row)
}

fn row_processor_result() -> Vec<Record> {
    vec![
        fruit("Big Apples (Spain)", "Apple", "Spain", 1),
        fruit("Big Melons (Italy)", "Melons", "Italy", 2),
        fruit("Long Mangoes (India)", "Mango", "India", 3),
        fruit("Small Strawberries (France)", "Strawberry", "France", 4),
        fruit("Short Mangoes (France)", "Mango", "France", 5),
        fruit("Sweet Strawberries (Spain)", "Strawberry", "Spain", 7),
        fruit("Square Apples (Italy)", "Apple", "Italy", 8),
        fruit("Small Melons (Italy)", "Melons", "Italy", 9),
        fruit("Dark Berries (Australia)", "Strawberry", "Australia", 10),
        fruit("Sweet Berries (Australia)", "Blackcurrant", "Australia", 11),
    ]
}

fn combined_pipeline() -> Pipeline {
    let registry = ProcessorRegistry::shared();

    let fp = FieldProcessor::new(registry.clone(), "fp1");
    fp.add_processors("Quantity", [convert::cast(DataType::Int64)])
        .unwrap();
    fp.add_processors("Fruit", [convert::upper()]).unwrap();

    let rp = RowProcessor::new(registry, "rp1");
    rp.add_processor(|row: Record| {
        let mut row = label_and_bump(row)?;
        let origin = row["Origin"].to_string().to_uppercase();
        row.insert("Origin", origin);
        Ok::<_, TransformError>(row)
    })
    .unwrap();

    Pipeline::new().with(fp).with(rp)
}

fn combined_result() -> Vec<Record> {
    row_processor_result()
        .into_iter()
        .map(|mut row| {
            for field in ["Fruit", "Origin"] {
                let upper = row[field].to_string().to_uppercase();
                row.insert(field, upper);
            }
            row
        })
        .collect()
}

#[test]
fn field_processor_applies_at_read_time() {
    let reader = read_fixture(Pipeline::new().with(field_processor_scenario()));
    assert_eq!(reader.rows(), field_processor_result().as_slice());
}

#[test]
fn field_processor_applies_at_write_time() {
    let writer = write_fixture(Pipeline::new().with(field_processor_scenario()));
    assert_eq!(writer.rows(), field_processor_result().as_slice());
}

#[test]
fn row_processor_standalone() {
    let reader = read_fixture(Pipeline::new());
    let rp = RowProcessor::new(ProcessorRegistry::shared(), "rp1");
    rp.add_processor(label_and_bump).unwrap();

    assert_eq!(rp.process_rows(reader.rows()).unwrap(), row_processor_result());
}

#[test]
fn row_processor_applies_at_read_and_write_time() {
    let rp = RowProcessor::new(ProcessorRegistry::shared(), "rp1");
    rp.add_processor(label_and_bump).unwrap();
    let pipeline = Pipeline::new().with(rp);

    let reader = read_fixture(pipeline.clone());
    assert_eq!(reader.rows(), row_processor_result().as_slice());

    let writer = write_fixture(pipeline);
    assert_eq!(writer.rows(), row_processor_result().as_slice());
}

#[test]
fn field_then_row_processor_at_read_and_write_time() {
    let reader = read_fixture(combined_pipeline());
    assert_eq!(reader.rows(), combined_result().as_slice());

    let writer = write_fixture(combined_pipeline());
    assert_eq!(writer.rows(), combined_result().as_slice());
}

#[test]
fn written_file_holds_processed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processed.csv");
    let source = read_fixture(Pipeline::new());

    let mut writer = CsvWriter::new(
        &path,
        FIELDS,
        WriteOptions {
            processors: combined_pipeline(),
            ..Default::default()
        },
    )
    .unwrap();
    writer.add_rows(source.rows().iter().take(2).cloned());
    writer.flush().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Supplier,Fruit,Origin,Quantity\n\
         Big Apples (Spain),APPLE,SPAIN,1\n\
         Big Melons (Italy),MELONS,ITALY,2\n"
    );
}

#[test]
fn handles_are_isolated_within_one_registry() {
    let registry = ProcessorRegistry::shared();
    let a = FieldProcessor::new(registry.clone(), "a");
    let b = FieldProcessor::new(registry.clone(), "b");
    a.add_processors("Fruit", [convert::upper()]).unwrap();
    b.add_processors("Fruit", [convert::lower()]).unwrap();

    let row = Record::from([("Fruit", "Apple")]);
    assert_eq!(a.process_row(&row).unwrap()["Fruit"], Value::from("APPLE"));
    assert_eq!(b.process_row(&row).unwrap()["Fruit"], Value::from("apple"));

    // A row handle with the same name lives in its own namespace.
    let r = RowProcessor::new(registry.clone(), "a");
    assert_eq!(r.process_row(&row).unwrap(), row);
    assert_eq!(a.process_row(&row).unwrap()["Fruit"], Value::from("APPLE"));
}

#[test]
fn separate_registries_do_not_share_handles() {
    let first = FieldProcessor::new(ProcessorRegistry::shared(), "proc1");
    first.add_processors("Fruit", [convert::upper()]).unwrap();

    let second = FieldProcessor::new(ProcessorRegistry::shared(), "proc1");
    let row = Record::from([("Fruit", "Apple")]);
    assert_eq!(second.process_row(&row).unwrap(), row);
    assert_eq!(first.process_row(&row).unwrap()["Fruit"], Value::from("APPLE"));
}

#[test]
fn failing_processor_aborts_the_read() {
    let fp = FieldProcessor::new(ProcessorRegistry::shared(), "strict");
    fp.add_processors("Origin", [convert::cast(DataType::Int64)])
        .unwrap();

    let err = CsvReader::open(
        FIXTURE,
        &ReadOptions {
            processors: Pipeline::new().with(fp),
            ..Default::default()
        },
    )
    .unwrap_err();

    match err {
        CsvioError::Transform { handle, field, .. } => {
            assert_eq!(handle, "strict");
            assert_eq!(field.as_deref(), Some("Origin"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
