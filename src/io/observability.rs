use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info, warn};

use crate::error::CsvioError;
use crate::types::{Record, Value};

use super::options::{CsvFormat, WriteMode, WriteOptions};
use super::writer::CsvWriter;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IoSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl IoSeverity {
    /// Severity of a failed read or write.
    ///
    /// Failures of the underlying file system are `Critical`; everything else is `Error`.
    pub fn of(error: &CsvioError) -> Self {
        match error {
            CsvioError::Io(_) => IoSeverity::Critical,
            CsvioError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => IoSeverity::Critical,
                _ => IoSeverity::Error,
            },
            CsvioError::Remote { .. } | CsvioError::RetriesExhausted { .. } => IoSeverity::Critical,
            _ => IoSeverity::Error,
        }
    }
}

/// Which side of the file a reported event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Read,
    Write,
}

impl IoOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            IoOperation::Read => "read",
            IoOperation::Write => "write",
        }
    }
}

/// Context about a read or write attempt.
#[derive(Debug, Clone)]
pub struct IoContext {
    /// The file being read or written.
    pub path: PathBuf,
    pub operation: IoOperation,
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoStats {
    /// Rows read, or rows written by this flush.
    pub rows: usize,
}

/// Observer interface for read/write outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IoObserver: Send + Sync {
    fn on_success(&self, _ctx: &IoContext, _stats: IoStats) {}

    fn on_failure(&self, _ctx: &IoContext, _severity: IoSeverity, _error: &CsvioError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Report the outcome of one read or write to an optional observer.
pub(crate) fn report<T>(
    observer: Option<&Arc<dyn IoObserver>>,
    alert_at_or_above: IoSeverity,
    ctx: IoContext,
    result: &Result<T, CsvioError>,
    rows: impl FnOnce(&T) -> usize,
) {
    let Some(obs) = observer else {
        return;
    };
    match result {
        Ok(v) => obs.on_success(&ctx, IoStats { rows: rows(v) }),
        Err(e) => {
            let sev = IoSeverity::of(e);
            obs.on_failure(&ctx, sev, e);
            if sev >= alert_at_or_above {
                obs.on_alert(&ctx, sev, e);
            }
        }
    }
}

/// Sends every event to each observer in turn, in the order they were added.
///
/// ```
/// use std::sync::Arc;
/// use csvio::io::{CompositeObserver, IoObserver, LogObserver};
///
/// let observer: Arc<dyn IoObserver> = Arc::new(CompositeObserver::new().with(LogObserver));
/// # let _ = observer;
/// ```
#[derive(Clone, Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IoObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`CompositeObserver::push`].
    pub fn with(mut self, observer: impl IoObserver + 'static) -> Self {
        self.push(Arc::new(observer));
        self
    }

    /// Add an observer that may also be installed elsewhere.
    pub fn push(&mut self, observer: Arc<dyn IoObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl From<Vec<Arc<dyn IoObserver>>> for CompositeObserver {
    fn from(observers: Vec<Arc<dyn IoObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl IoObserver for CompositeObserver {
    fn on_success(&self, ctx: &IoContext, stats: IoStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        self.observers
            .iter()
            .for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        self.observers
            .iter()
            .for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Forwards events to the [`log`] facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IoObserver for LogObserver {
    fn on_success(&self, ctx: &IoContext, stats: IoStats) {
        info!(
            "[csvio][ok] op={:?} path={} rows={}",
            ctx.operation,
            ctx.path.display(),
            stats.rows
        );
    }

    fn on_failure(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        warn!(
            "[csvio][{:?}] op={:?} path={} err={}",
            severity,
            ctx.operation,
            ctx.path.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        error!(
            "[ALERT][csvio][{:?}] op={:?} path={} err={}",
            severity,
            ctx.operation,
            ctx.path.display(),
            error
        );
    }
}

/// Appends one CSV row per event to a log file, which [`super::CsvReader`] can read back.
///
/// The columns are [`EventLogObserver::FIELD_NAMES`]. `rows` is empty for failures, `severity`
/// and `error` are empty for successes. The header is written while the file is empty. A failed
/// append is logged with `warn!` and the event is dropped.
#[derive(Debug)]
pub struct EventLogObserver {
    path: PathBuf,
    format: CsvFormat,
    written: Mutex<usize>,
}

impl EventLogObserver {
    pub const FIELD_NAMES: [&'static str; 7] = [
        "timestamp",
        "event",
        "operation",
        "path",
        "rows",
        "severity",
        "error",
    ];

    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format: CsvFormat::default(),
            written: Mutex::new(0),
        }
    }

    /// Use a different delimiter, quote or terminator for the log.
    pub fn with_format(mut self, format: CsvFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of events appended by this observer.
    pub fn events_written(&self) -> usize {
        *self.written.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(
        &self,
        event: &str,
        ctx: &IoContext,
        rows: Option<usize>,
        failure: Option<(IoSeverity, &CsvioError)>,
    ) {
        let row = Record::from([
            ("timestamp", Value::from(unix_secs())),
            ("event", Value::from(event)),
            ("operation", Value::from(ctx.operation.as_str())),
            ("path", Value::from(ctx.path.display().to_string())),
            ("rows", Value::from(rows.map(|n| i64::try_from(n).unwrap_or(i64::MAX)))),
            ("severity", Value::from(failure.map(|(sev, _)| format!("{sev:?}")))),
            ("error", Value::from(failure.map(|(_, err)| err.to_string()))),
        ]);
        let options = WriteOptions {
            format: self.format.clone(),
            mode: WriteMode::Append,
            ..Default::default()
        };

        // Serialises appends from concurrent reads and writes.
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        let result = CsvWriter::new(&self.path, Self::FIELD_NAMES, options).and_then(|mut w| {
            w.add_row(row);
            w.flush()
        });
        match result {
            Ok(()) => *written += 1,
            Err(e) => warn!("cannot append to event log {}: {e}", self.path.display()),
        }
    }
}

impl IoObserver for EventLogObserver {
    fn on_success(&self, ctx: &IoContext, stats: IoStats) {
        self.append("ok", ctx, Some(stats.rows), None);
    }

    fn on_failure(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        self.append("failure", ctx, None, Some((severity, error)));
    }

    fn on_alert(&self, ctx: &IoContext, severity: IoSeverity, error: &CsvioError) {
        self.append("alert", ctx, None, Some((severity, error)));
    }
}

fn unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or_default()
}
