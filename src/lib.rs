//! `csvio` reads and writes CSV files as ordered records and transforms them with reusable,
//! named chains of functions.
//!
//! The pieces:
//!
//! - a [`processing::ProcessorRegistry`] maps handles to chains of transformation functions
//! - a [`processing::FieldProcessor`] transforms individual field values, one chain per field
//! - a [`processing::RowProcessor`] transforms whole records
//! - a [`processing::Pipeline`] applies any mix of the two, in order
//! - [`io::CsvReader`] / [`io::CsvWriter`] run pipelines while reading and before writing
//!
//! Records are [`types::Record`]s: field name to [`types::Value`], in column order. Values read
//! from a file start as [`types::Value::Utf8`]; cells missing from short rows are
//! [`types::Value::Null`]. Use [`processing::convert::cast`] to get typed values.
//!
//! ## Quick example: read with processors
//!
//! ```no_run
//! use csvio::io::{CsvReader, ReadOptions};
//! use csvio::processing::{convert, FieldProcessor, Pipeline, ProcessorRegistry};
//! use csvio::types::DataType;
//!
//! # fn main() -> Result<(), csvio::CsvioError> {
//! let registry = ProcessorRegistry::shared();
//! let fp = FieldProcessor::new(registry, "stock");
//! fp.add_processors("Quantity", [convert::cast(DataType::Int64)])?;
//!
//! let reader = CsvReader::open(
//!     "fruit_stock.csv",
//!     &ReadOptions {
//!         processors: Pipeline::new().with(fp),
//!         ..Default::default()
//!     },
//! )?;
//! println!("rows={}", reader.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Registry semantics
//!
//! Handles live in two namespaces, one for field processors and one for row processors.
//! Constructing a processor with `new` registers its handle, resetting any chains already stored
//! under it. `attach` shares an existing handle without resetting it. Processors only ever read
//! chains through the registry, so every processor bound to a handle sees functions added by any
//! other.
//!
//! ```rust
//! use csvio::processing::{FieldProcessor, Processor, ProcessorRegistry};
//! use csvio::types::{Record, Value};
//!
//! let registry = ProcessorRegistry::shared();
//! let a = FieldProcessor::new(registry.clone(), "shared");
//! let b = FieldProcessor::attach(registry, "shared").unwrap();
//!
//! a.add_processor("n", |v: Value| Ok::<_, csvio::CsvioError>(Value::Int64(v.as_i64().unwrap_or(0) + 1)))
//!     .unwrap();
//!
//! let out = b.process_row(&Record::from([("n", 1_i64)])).unwrap();
//! assert_eq!(out["n"], Value::Int64(2));
//! ```
//!
//! ## Modules
//!
//! - [`processing`]: registry, processors, pipelines, ready-made conversions and grouping
//! - [`io`]: CSV reader/writer, remote reader with retries, observers
//! - [`types`]: records, values and tables
//! - [`file`]: path helpers
//! - [`error`]: error types used across the crate

pub mod error;
pub mod file;
pub mod io;
pub mod processing;
pub mod types;

pub use error::{CsvioError, CsvioResult, TransformError};
