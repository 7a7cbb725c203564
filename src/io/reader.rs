//! CSV reading into a [`Table`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::{CsvioError, CsvioResult};
use crate::file::FileRef;
use crate::types::{Record, Table, Value};

use super::observability::{report, IoContext, IoOperation};
use super::options::ReadOptions;

/// A CSV file read fully into memory, with the configured processors already applied.
///
/// ```no_run
/// use csvio::io::{CsvReader, ReadOptions};
///
/// # fn main() -> Result<(), csvio::CsvioError> {
/// let reader = CsvReader::open("fruit_stock.csv", &ReadOptions::default())?;
/// assert_eq!(reader.field_names(), ["Supplier", "Fruit", "Quantity"]);
/// println!("rows={}", reader.row_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvReader {
    file: FileRef,
    table: Table,
}

impl CsvReader {
    /// Read the CSV file at `path`.
    ///
    /// Rules:
    ///
    /// - Column names come from [`ReadOptions::field_names`] or else from the header row.
    ///   Headerless input without field names fails with [`CsvioError::NoFieldNames`].
    /// - Each record holds exactly those columns; cells missing from a short row are
    ///   [`Value::Null`], extra cells are ignored.
    /// - Raw values are [`Value::Utf8`]; the configured processors run over every row in order.
    pub fn open(path: impl AsRef<Path>, options: &ReadOptions) -> CsvioResult<Self> {
        let file = FileRef::new(path);
        let result = File::open(file.path())
            .map_err(CsvioError::from)
            .and_then(|f| read_table(f, file.path(), options));

        report(
            options.observer.as_ref(),
            options.alert_at_or_above,
            IoContext {
                path: file.path().to_path_buf(),
                operation: IoOperation::Read,
            },
            &result,
            Table::row_count,
        );

        let table = result?;
        debug!(
            "read {} row(s) with {} field(s) from {}",
            table.row_count(),
            table.field_names.len(),
            file.path().display()
        );
        Ok(Self { file, table })
    }

    /// Read CSV data from any reader. [`CsvReader::file`] is empty for readers built this way.
    pub fn from_reader<R: Read>(rdr: R, options: &ReadOptions) -> CsvioResult<Self> {
        Ok(Self {
            file: FileRef::new(""),
            table: read_table(rdr, Path::new(""), options)?,
        })
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn field_names(&self) -> &[String] {
        &self.table.field_names
    }

    pub fn rows(&self) -> &[Record] {
        &self.table.rows
    }

    /// Number of rows, excluding the header.
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

fn read_table<R: Read>(rdr: R, path: &Path, options: &ReadOptions) -> CsvioResult<Table> {
    let mut rdr = options.format.reader_builder().from_reader(rdr);
    let mut records = rdr.records();

    let header = if options.format.has_headers {
        records.next().transpose()?
    } else {
        None
    };

    let field_names: Vec<String> = match (&options.field_names, header) {
        (Some(names), _) => names.clone(),
        (None, Some(header)) => header.iter().map(str::to_owned).collect(),
        (None, None) if options.format.has_headers => Vec::new(),
        (None, None) => {
            return Err(CsvioError::NoFieldNames {
                path: path.to_path_buf(),
            });
        }
    };

    let mut rows = Vec::new();
    for result in records {
        let raw = result?;
        let mut record = Record::with_capacity(field_names.len());
        for (idx, name) in field_names.iter().enumerate() {
            let value = raw.get(idx).map(Value::from).unwrap_or(Value::Null);
            record.insert(name.as_str(), value);
        }
        rows.push(record);
    }

    let rows = if options.processors.is_empty() {
        rows
    } else {
        options.processors.process_rows(&rows)?
    };

    Ok(Table::new(field_names, rows))
}
