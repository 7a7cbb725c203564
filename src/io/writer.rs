//! Buffered CSV writing.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::debug;

use crate::error::{CsvioError, CsvioResult};
use crate::file::FileRef;
use crate::types::{Record, Table};

use super::observability::{report, IoContext, IoOperation};
use super::options::{ExtraFields, WriteMode, WriteOptions};

/// Collects rows in memory and writes them to a CSV file on [`CsvWriter::flush`].
///
/// ```no_run
/// use csvio::io::{CsvWriter, WriteOptions};
/// use csvio::types::Record;
///
/// # fn main() -> Result<(), csvio::CsvioError> {
/// let mut writer = CsvWriter::new(
///     "fruit_stock.csv",
///     ["Supplier", "Fruit", "Quantity"],
///     WriteOptions::default(),
/// )?;
/// writer.add_row(Record::from([("Supplier", "Big Apple"), ("Fruit", "Apple"), ("Quantity", "1")]));
/// assert_eq!(writer.pending_rows().len(), 1);
/// assert!(writer.rows().is_empty());
///
/// writer.flush()?;
/// assert!(writer.pending_rows().is_empty());
/// assert_eq!(writer.rows().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CsvWriter {
    file: FileRef,
    table: Table,
    pending: Vec<Record>,
    options: WriteOptions,
    header_written: bool,
}

impl CsvWriter {
    /// Create a writer for `path` with the given column order.
    ///
    /// Nothing touches the file system until [`CsvWriter::flush`] or [`CsvWriter::write_blank`].
    pub fn new<I, S>(path: impl AsRef<Path>, field_names: I, options: WriteOptions) -> CsvioResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file = FileRef::new(path);
        let field_names: Vec<String> = field_names.into_iter().map(Into::into).collect();
        if field_names.is_empty() {
            return Err(CsvioError::NoFieldNames {
                path: file.path().to_path_buf(),
            });
        }
        Ok(Self {
            file,
            table: Table::new(field_names, Vec::new()),
            pending: Vec::new(),
            options,
            header_written: false,
        })
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn field_names(&self) -> &[String] {
        &self.table.field_names
    }

    /// Rows added but not flushed yet.
    pub fn pending_rows(&self) -> &[Record] {
        &self.pending
    }

    /// Rows already written, after processing.
    pub fn rows(&self) -> &[Record] {
        &self.table.rows
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Queue one row for writing.
    pub fn add_row(&mut self, row: Record) {
        self.pending.push(row);
    }

    /// Queue rows for writing, in order.
    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = Record>) {
        self.pending.extend(rows);
    }

    /// Process and write every pending row.
    ///
    /// The header is written before the first rows. On success the written rows move into
    /// [`CsvWriter::rows`]; on failure the pending rows are kept. Does nothing when no rows are
    /// pending.
    pub fn flush(&mut self) -> CsvioResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let result = self.write_pending();
        report(
            self.options.observer.as_ref(),
            self.options.alert_at_or_above,
            self.context(),
            &result,
            Vec::len,
        );

        let written = result?;
        debug!("wrote {} row(s) to {}", written.len(), self.file.path().display());
        self.pending.clear();
        self.table.rows.extend(written);
        Ok(())
    }

    /// Write only the header row, replacing any existing file contents.
    ///
    /// Does nothing once the header has been written by this writer.
    pub fn write_blank(&mut self) -> CsvioResult<()> {
        if self.header_written {
            return Ok(());
        }
        let f = File::create(self.file.path())?;
        let mut wtr = self.options.format.writer_builder().from_writer(f);
        wtr.write_record(&self.table.field_names)?;
        wtr.flush()?;
        self.header_written = true;
        Ok(())
    }

    fn context(&self) -> IoContext {
        IoContext {
            path: self.file.path().to_path_buf(),
            operation: IoOperation::Write,
        }
    }

    fn write_pending(&mut self) -> CsvioResult<Vec<Record>> {
        let processed = if self.options.processors.is_empty() {
            self.pending.clone()
        } else {
            self.options.processors.process_rows(&self.pending)?
        };

        // Encode everything before opening the file so a bad row leaves it untouched.
        let lines = processed
            .iter()
            .map(|row| self.encode(row))
            .collect::<CsvioResult<Vec<_>>>()?;

        let truncate = self.options.mode == WriteMode::Overwrite && !self.header_written;
        let f = if truncate {
            File::create(self.file.path())?
        } else {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.file.path())?
        };
        let needs_header = !self.header_written && (truncate || f.metadata()?.len() == 0);

        let mut wtr = self.options.format.writer_builder().from_writer(f);
        if needs_header {
            wtr.write_record(&self.table.field_names)?;
        }
        for line in &lines {
            wtr.write_record(line)?;
        }
        wtr.flush()?;
        self.header_written = true;

        Ok(processed)
    }

    /// Render `row` in field-name order.
    fn encode(&self, row: &Record) -> CsvioResult<Vec<String>> {
        if self.options.extra_fields == ExtraFields::Raise {
            if let Some(field) = row.keys().find(|k| !self.table.field_names.iter().any(|f| f.as_str() == *k)) {
                return Err(CsvioError::UnknownField {
                    field: field.to_owned(),
                });
            }
        }
        Ok(self
            .table
            .field_names
            .iter()
            .map(|name| row.get(name).map(ToString::to_string).unwrap_or_default())
            .collect())
    }
}
