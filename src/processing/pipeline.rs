//! Ordered application of heterogeneous processors.

use std::fmt;
use std::sync::Arc;

use crate::error::CsvioResult;
use crate::types::Record;

use super::Processor;

/// An ordered list of processors applied as a fold: `pn(...p2(p1(record)))`.
///
/// Field and row processors may be mixed freely. Each one applies the chains registered under
/// its own handle. An empty pipeline returns records unchanged.
#[derive(Clone, Default)]
pub struct Pipeline {
    processors: Vec<Arc<dyn Processor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Pipeline::push`].
    pub fn with(mut self, processor: impl Processor + 'static) -> Self {
        self.push(processor);
        self
    }

    /// Append a processor to the end of the pipeline.
    pub fn push(&mut self, processor: impl Processor + 'static) {
        self.processors.push(Arc::new(processor));
    }

    /// Append an already shared processor.
    pub fn push_shared(&mut self, processor: Arc<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn processors(&self) -> &[Arc<dyn Processor>] {
        &self.processors
    }

    /// Run every processor over `record`, in order.
    pub fn process_row(&self, record: &Record) -> CsvioResult<Record> {
        apply_processors(&self.processors, record)
    }

    /// Run the pipeline over every record, preserving order.
    pub fn process_rows(&self, rows: &[Record]) -> CsvioResult<Vec<Record>> {
        apply_processors_to_rows(&self.processors, rows)
    }
}

impl From<Vec<Arc<dyn Processor>>> for Pipeline {
    fn from(processors: Vec<Arc<dyn Processor>>) -> Self {
        Self { processors }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.processors
                    .iter()
                    .map(|p| format!("{}:{}", p.kind(), p.handle())),
            )
            .finish()
    }
}

/// Fold `processors` over `record`, each processor receiving the previous one's output.
pub fn apply_processors(processors: &[Arc<dyn Processor>], record: &Record) -> CsvioResult<Record> {
    let Some((first, rest)) = processors.split_first() else {
        return Ok(record.clone());
    };
    let mut current = first.process_row(record)?;
    for p in rest {
        current = p.process_row(&current)?;
    }
    Ok(current)
}

/// [`apply_processors`] over every record, returning a new list in the same order.
pub fn apply_processors_to_rows(
    processors: &[Arc<dyn Processor>],
    rows: &[Record],
) -> CsvioResult<Vec<Record>> {
    rows.iter()
        .map(|row| apply_processors(processors, row))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{apply_processors, apply_processors_to_rows, Pipeline};
    use crate::error::CsvioError;
    use crate::processing::{
        convert, FieldProcessor, Processor, ProcessorRegistry, RowProcessor,
    };
    use crate::types::{DataType, Record, Value};

    fn int_op(
        registry: &Arc<ProcessorRegistry>,
        handle: &str,
        op: fn(i64) -> i64,
    ) -> FieldProcessor {
        let p = FieldProcessor::new(registry.clone(), handle);
        p.add_processor("x", move |v: Value| match v {
            Value::Int64(n) => Ok(Value::Int64(op(n))),
            other => Err(format!("not an int: {other:?}")),
        })
        .unwrap();
        p
    }

    #[test]
    fn order_of_processors_decides_result() {
        let registry = ProcessorRegistry::shared();
        let cast = FieldProcessor::new(registry.clone(), "cast");
        cast.add_processors("x", [convert::cast(DataType::Int64)])
            .unwrap();
        let double = int_op(&registry, "double", |n| n * 2);
        let plus_one = int_op(&registry, "plus_one", |n| n + 1);

        let input = Record::from([("x", "5")]);

        let double_first = Pipeline::new()
            .with(cast.clone())
            .with(double.clone())
            .with(plus_one.clone());
        let plus_one_first = Pipeline::new()
            .with(cast.clone())
            .with(plus_one.clone())
            .with(double.clone());

        let a = double_first.process_row(&input).unwrap();
        let b = plus_one_first.process_row(&input).unwrap();
        assert_eq!(a["x"], Value::Int64(11));
        assert_eq!(b["x"], Value::Int64(12));

        // Same as folding by hand.
        let manual = plus_one
            .process_row(&double.process_row(&cast.process_row(&input).unwrap()).unwrap())
            .unwrap();
        assert_eq!(a, manual);
    }

    #[test]
    fn empty_pipeline_passes_records_through() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        let rows = vec![Record::from([("Fruit", "Apple")])];
        assert_eq!(pipeline.process_rows(&rows).unwrap(), rows);
        assert_eq!(apply_processors(&[], &rows[0]).unwrap(), rows[0]);
    }

    #[test]
    fn mixes_field_and_row_processors() {
        let registry = ProcessorRegistry::shared();
        let rows = RowProcessor::new(registry.clone(), "total");
        rows.add_processor(|mut r: Record| {
            let qty = r.get("Quantity").and_then(Value::as_i64).unwrap_or(0);
            let price = r.get("Price").and_then(Value::as_i64).unwrap_or(0);
            r.insert("Total", qty * price);
            Ok::<_, CsvioError>(r)
        })
        .unwrap();
        let fields = FieldProcessor::new(registry, "cast");
        fields
            .add_processors("Quantity", [convert::cast(DataType::Int64)])
            .unwrap();
        fields
            .add_processors("Price", [convert::cast(DataType::Int64)])
            .unwrap();

        let pipeline: Pipeline = vec![
            Arc::new(fields) as Arc<dyn Processor>,
            Arc::new(rows) as Arc<dyn Processor>,
        ]
        .into();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(format!("{pipeline:?}"), r#"["field:cast", "row:total"]"#);

        let out = pipeline
            .process_rows(&[
                Record::from([("Quantity", "3"), ("Price", "4")]),
                Record::from([("Quantity", "2"), ("Price", "5")]),
            ])
            .unwrap();
        assert_eq!(out[0]["Total"], Value::Int64(12));
        assert_eq!(out[1]["Total"], Value::Int64(10));
    }

    #[test]
    fn first_error_stops_the_batch() {
        let registry = ProcessorRegistry::shared();
        let cast = FieldProcessor::new(registry, "cast");
        cast.add_processors("x", [convert::cast(DataType::Int64)])
            .unwrap();
        let pipeline = Pipeline::new().with(cast);

        let rows = vec![
            Record::from([("x", "1")]),
            Record::from([("x", "one")]),
            Record::from([("x", "3")]),
        ];
        let err = pipeline.process_rows(&rows).unwrap_err();
        assert!(matches!(err, CsvioError::Transform { .. }));
        // Inputs are never modified.
        assert_eq!(rows[0]["x"], Value::from("1"));
    }

    #[test]
    fn shared_processor_sees_later_registrations() {
        let registry = ProcessorRegistry::shared();
        let upper = FieldProcessor::new(registry.clone(), "upper");
        let shared: Arc<dyn Processor> = Arc::new(upper.clone());

        let mut first = Pipeline::new();
        first.push_shared(shared.clone());
        let mut second = Pipeline::new().with(int_op(&registry, "double", |n| n * 2));
        second.push_shared(shared);
        assert_eq!(format!("{second:?}"), r#"["field:double", "field:upper"]"#);

        upper.add_processors("Fruit", [convert::upper()]).unwrap();

        let input = Record::from([("Fruit", Value::from("Apple")), ("x", Value::Int64(2))]);
        assert_eq!(first.process_row(&input).unwrap()["Fruit"], Value::from("APPLE"));
        let out = second.process_row(&input).unwrap();
        assert_eq!(out["Fruit"], Value::from("APPLE"));
        assert_eq!(out["x"], Value::Int64(4));
    }

    #[test]
    fn apply_processors_to_rows_matches_pipeline() {
        let registry = ProcessorRegistry::shared();
        let processors: Vec<Arc<dyn Processor>> = vec![
            Arc::new(int_op(&registry, "double", |n| n * 2)),
            Arc::new(int_op(&registry, "plus_one", |n| n + 1)),
        ];
        let rows = vec![
            Record::from([("x", Value::Int64(1))]),
            Record::from([("x", Value::Int64(5))]),
        ];

        let out = apply_processors_to_rows(&processors, &rows).unwrap();
        assert_eq!(
            out.iter().map(|r| r["x"].clone()).collect::<Vec<_>>(),
            [Value::Int64(3), Value::Int64(11)]
        );
        assert_eq!(out, Pipeline::from(processors.clone()).process_rows(&rows).unwrap());
        assert!(apply_processors_to_rows(&processors, &[]).unwrap().is_empty());

        let bad = [Record::from([("x", "1")])];
        assert!(matches!(
            apply_processors_to_rows(&processors, &bad),
            Err(CsvioError::Transform { .. })
        ));
    }
}
