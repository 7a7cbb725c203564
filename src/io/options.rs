//! Reader and writer configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::processing::Pipeline;

use super::observability::{IoObserver, IoSeverity};

/// Line terminator used when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Terminator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
}

/// Dialect of the delimited text.
///
/// Deserializable, so it can live in a caller's JSON configuration:
///
/// ```rust
/// let fmt: csvio::io::CsvFormat = serde_json::from_str(r#"{"delimiter": 59}"#).unwrap();
/// assert_eq!(fmt.delimiter, b';');
/// assert!(fmt.has_headers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Quote byte.
    pub quote: u8,
    /// Whether the first line is a header row.
    pub has_headers: bool,
    /// Accept rows with a different number of fields than the header.
    pub flexible: bool,
    pub terminator: Terminator,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_headers: true,
            flexible: true,
            terminator: Terminator::Lf,
        }
    }
}

impl CsvFormat {
    pub(crate) fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .flexible(self.flexible)
            // Header handling is done by the reader so that explicit field names can skip it.
            .has_headers(false);
        builder
    }

    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .flexible(self.flexible)
            .has_headers(false)
            .terminator(match self.terminator {
                Terminator::Lf => csv::Terminator::Any(b'\n'),
                Terminator::Crlf => csv::Terminator::CRLF,
            });
        builder
    }
}

/// Options controlling [`super::CsvReader`].
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ReadOptions {
    /// Column names to use instead of the file's header row.
    ///
    /// If the format also has headers, the header line is skipped.
    pub field_names: Option<Vec<String>>,
    pub format: CsvFormat,
    /// Processors applied to every row as it is read.
    pub processors: Pipeline,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IoObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IoSeverity,
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("field_names", &self.field_names)
            .field("format", &self.format)
            .field("processors", &self.processors)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            field_names: None,
            format: CsvFormat::default(),
            processors: Pipeline::new(),
            observer: None,
            alert_at_or_above: IoSeverity::Critical,
        }
    }
}

/// How a writer treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    /// Truncate on the first write, then append.
    #[default]
    Overwrite,
    /// Always append; the header is only written to an empty file.
    Append,
}

/// What to do with record fields that are not among the writer's field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtraFields {
    /// Fail the flush with [`crate::CsvioError::UnknownField`].
    #[default]
    Raise,
    /// Drop them silently.
    Ignore,
}

/// Options controlling [`super::CsvWriter`].
#[derive(Clone)]
pub struct WriteOptions {
    pub format: CsvFormat,
    pub mode: WriteMode,
    pub extra_fields: ExtraFields,
    /// Processors applied to pending rows when they are flushed.
    pub processors: Pipeline,
    pub observer: Option<Arc<dyn IoObserver>>,
    pub alert_at_or_above: IoSeverity,
}

impl fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOptions")
            .field("format", &self.format)
            .field("mode", &self.mode)
            .field("extra_fields", &self.extra_fields)
            .field("processors", &self.processors)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: CsvFormat::default(),
            mode: WriteMode::default(),
            extra_fields: ExtraFields::default(),
            processors: Pipeline::new(),
            observer: None,
            alert_at_or_above: IoSeverity::Critical,
        }
    }
}
