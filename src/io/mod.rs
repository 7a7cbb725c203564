//! Reading and writing CSV files.
//!
//! - [`CsvReader`]: read a whole file into a [`crate::types::Table`], running a
//!   [`crate::processing::Pipeline`] over every row
//! - [`CsvWriter`]: buffer rows and write them on [`CsvWriter::flush`], running a pipeline first
//! - [`RemoteReader`]: fetch a file through a [`RemoteSource`] with retries, then read it
//!
//! Every read and flush can report its outcome to an [`IoObserver`].
//!
//! ## Example: read, transform, write
//!
//! ```no_run
//! use csvio::io::{CsvReader, CsvWriter, ReadOptions, WriteOptions};
//! use csvio::processing::{convert, FieldProcessor, Pipeline, ProcessorRegistry};
//!
//! # fn main() -> Result<(), csvio::CsvioError> {
//! let registry = ProcessorRegistry::shared();
//! let fp = FieldProcessor::new(registry, "upper_fruit");
//! fp.add_processors("Fruit", [convert::upper()])?;
//!
//! let reader = CsvReader::open(
//!     "fruit_stock.csv",
//!     &ReadOptions {
//!         processors: Pipeline::new().with(fp),
//!         ..Default::default()
//!     },
//! )?;
//!
//! let mut writer = CsvWriter::new("fruit_upper.csv", reader.field_names().to_vec(), WriteOptions::default())?;
//! writer.add_rows(reader.rows().iter().cloned());
//! writer.flush()?;
//! # Ok(())
//! # }
//! ```

pub mod observability;
pub mod options;
pub mod reader;
pub mod remote;
pub mod writer;

pub use observability::{
    CompositeObserver, EventLogObserver, IoContext, IoObserver, IoOperation, IoSeverity, IoStats,
    LogObserver,
};
pub use options::{CsvFormat, ExtraFields, ReadOptions, Terminator, WriteMode, WriteOptions};
pub use reader::CsvReader;
pub use remote::{fetch_with_retry, FnSource, LocalFileSource, RemoteReader, RemoteSource, RetryPolicy};
pub use writer::CsvWriter;
