//! Record transformations.
//!
//! Transformations are plain functions collected into named chains inside a shared
//! [`ProcessorRegistry`]. Two processor shapes read those chains:
//!
//! - [`FieldProcessor`]: per-field chains of `Value -> Value` functions
//! - [`RowProcessor`]: one chain of `Record -> Record` functions
//!
//! Both implement [`Processor`], so a [`Pipeline`] can mix them freely and apply them in order.
//! Readers and writers in [`crate::io`] run the same pipelines.
//!
//! Also available:
//!
//! - [`convert`]: ready-made field functions (casts, case changes, trimming)
//! - [`group`]: bucketing rows by column values
//!
//! ## Example: field processor then row processor
//!
//! ```rust
//! use csvio::processing::{convert, FieldProcessor, Pipeline, ProcessorRegistry, RowProcessor};
//! use csvio::types::{DataType, Record, Value};
//!
//! let registry = ProcessorRegistry::shared();
//!
//! let fields = FieldProcessor::new(registry.clone(), "fp1");
//! fields.add_processors("Quantity", [convert::cast(DataType::Int64)]).unwrap();
//! fields.add_processors("Fruit", [convert::upper()]).unwrap();
//!
//! let rows = RowProcessor::new(registry, "rp1");
//! rows.add_processor(|mut row: Record| {
//!     let label = format!("{} ({})", row["Fruit"], row["Origin"]);
//!     row.insert("Label", label);
//!     Ok::<_, csvio::CsvioError>(row)
//! })
//! .unwrap();
//!
//! let pipeline = Pipeline::new().with(fields).with(rows);
//! let out = pipeline
//!     .process_row(&Record::from([("Fruit", "Apple"), ("Origin", "Spain"), ("Quantity", "1")]))
//!     .unwrap();
//!
//! assert_eq!(out["Quantity"], Value::Int64(1));
//! assert_eq!(out["Label"], Value::from("APPLE (Spain)"));
//! ```

pub mod convert;
pub mod field;
pub mod group;
pub mod pipeline;
pub mod registry;
pub mod row;

use std::fmt;
use std::sync::Arc;

use crate::error::{CsvioResult, TransformError};
use crate::types::{Record, Value};

pub use field::FieldProcessor;
pub use group::{group_by_column, nest_by_columns, Grouped};
pub use pipeline::{apply_processors, apply_processors_to_rows, Pipeline};
pub use registry::{FieldChains, ProcessorRegistry};
pub use row::RowProcessor;

/// A single-value transformation function.
pub type FieldFn = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

/// A whole-record transformation function.
pub type RowFn = Arc<dyn Fn(Record) -> Result<Record, TransformError> + Send + Sync>;

/// Box a closure as a [`FieldFn`], converting its error type.
pub fn field_fn<F, E>(f: F) -> FieldFn
where
    F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
    E: Into<TransformError>,
{
    Arc::new(move |v| f(v).map_err(Into::into))
}

/// Box a closure as a [`RowFn`], converting its error type.
pub fn row_fn<F, E>(f: F) -> RowFn
where
    F: Fn(Record) -> Result<Record, E> + Send + Sync + 'static,
    E: Into<TransformError>,
{
    Arc::new(move |r| f(r).map_err(Into::into))
}

/// Which chain shape a processor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Field,
    Row,
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorKind::Field => f.write_str("field"),
            ProcessorKind::Row => f.write_str("row"),
        }
    }
}

/// Common interface of field and row processors.
///
/// Implementors apply the chain(s) registered under their own handle.
pub trait Processor: Send + Sync {
    /// The registry handle this processor reads.
    fn handle(&self) -> &str;

    fn kind(&self) -> ProcessorKind;

    /// Transform one record, returning a new record.
    fn process_row(&self, record: &Record) -> CsvioResult<Record>;

    /// Transform every record in order, returning a new list.
    ///
    /// Stops at the first failing record.
    fn process_rows(&self, rows: &[Record]) -> CsvioResult<Vec<Record>> {
        rows.iter().map(|row| self.process_row(row)).collect()
    }
}
