//! Reading CSV files that must be fetched first.
//!
//! A [`RemoteSource`] knows how to place a copy of its file at a local path. [`fetch_with_retry`]
//! drives it with a growing back-off, and [`RemoteReader`] reads the fetched copy from a temporary
//! file that lives as long as the reader.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CsvioError, CsvioResult};
use crate::types::{Record, Table};

use super::options::ReadOptions;
use super::reader::CsvReader;

/// Something that can download a CSV file to a local path.
pub trait RemoteSource: Send + Sync {
    /// Short name used in logs and errors, e.g. `ftp`.
    fn remote_type(&self) -> &str;

    /// Write the remote file to `dest`, replacing whatever is there.
    fn download(&self, dest: &Path) -> CsvioResult<()>;
}

/// A "remote" that is just another local file. Handy for mounted shares and tests.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RemoteSource for LocalFileSource {
    fn remote_type(&self) -> &str {
        "local"
    }

    fn download(&self, dest: &Path) -> CsvioResult<()> {
        fs::copy(&self.path, dest).map_err(|e| CsvioError::Remote {
            remote_type: self.remote_type().to_string(),
            message: format!("cannot copy {}: {e}", self.path.display()),
        })?;
        Ok(())
    }
}

type DownloadFn = Box<dyn Fn(&Path) -> CsvioResult<()> + Send + Sync>;

/// A source backed by a closure, for transports this crate does not ship.
pub struct FnSource {
    remote_type: String,
    download: DownloadFn,
}

impl FnSource {
    pub fn new<F>(remote_type: impl Into<String>, download: F) -> Self
    where
        F: Fn(&Path) -> CsvioResult<()> + Send + Sync + 'static,
    {
        Self {
            remote_type: remote_type.into(),
            download: Box::new(download),
        }
    }
}

impl fmt::Debug for FnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource")
            .field("remote_type", &self.remote_type)
            .finish_non_exhaustive()
    }
}

impl RemoteSource for FnSource {
    fn remote_type(&self) -> &str {
        &self.remote_type
    }

    fn download(&self, dest: &Path) -> CsvioResult<()> {
        (self.download)(dest)
    }
}

/// Back-off settings for [`fetch_with_retry`].
///
/// ```rust
/// use std::time::Duration;
/// use csvio::io::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries, 3);
/// assert_eq!(policy.timeout, Duration::from_secs(5));
/// assert_eq!(policy.increment_timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    pub max_retries: usize,
    /// Wait before the first retry.
    pub timeout: Duration,
    /// Added to the wait after every retry.
    pub increment_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(5),
            increment_timeout: Duration::from_secs(10),
        }
    }
}

/// Download `source` to `dest`, retrying failed attempts according to `policy`.
///
/// Returns `dest` once an attempt succeeds. After `max_retries` failed retries the last error is
/// logged and [`CsvioError::RetriesExhausted`] is returned.
pub fn fetch_with_retry(
    source: &dyn RemoteSource,
    policy: &RetryPolicy,
    dest: &Path,
) -> CsvioResult<PathBuf> {
    let mut wait = policy.timeout;
    let mut retries_left = policy.max_retries;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match source.download(dest) {
            Ok(()) => {
                debug!(
                    "{}: fetched {} after {attempts} attempt(s)",
                    source.remote_type(),
                    dest.display()
                );
                return Ok(dest.to_path_buf());
            }
            Err(e) if retries_left > 0 => {
                warn!(
                    "{}: {e}: retry retrieving remote file in {:?}, {retries_left} attempts left",
                    source.remote_type(),
                    wait
                );
                thread::sleep(wait);
                retries_left -= 1;
                wait = wait.saturating_add(policy.increment_timeout);
            }
            Err(e) => {
                warn!("{}: giving up: {e}", source.remote_type());
                return Err(CsvioError::RetriesExhausted {
                    remote_type: source.remote_type().to_string(),
                    attempts,
                    last: Box::new(e),
                });
            }
        }
    }
}

/// A [`CsvReader`] over a freshly downloaded copy of a remote file.
#[derive(Debug)]
pub struct RemoteReader {
    remote_type: String,
    // Deleted on drop.
    local: NamedTempFile,
    reader: CsvReader,
}

impl RemoteReader {
    /// Download `source` into a temporary `.csv` file and read it with `options`.
    pub fn open(
        source: &dyn RemoteSource,
        policy: &RetryPolicy,
        options: &ReadOptions,
    ) -> CsvioResult<Self> {
        let local = tempfile::Builder::new()
            .prefix("csvio-")
            .suffix(".csv")
            .tempfile()?;
        let path = fetch_with_retry(source, policy, local.path())?;
        let reader = CsvReader::open(&path, options)?;
        Ok(Self {
            remote_type: source.remote_type().to_string(),
            local,
            reader,
        })
    }

    pub fn remote_type(&self) -> &str {
        &self.remote_type
    }

    /// Where the downloaded copy lives until the reader is dropped.
    pub fn local_path(&self) -> &Path {
        self.local.path()
    }

    pub fn reader(&self) -> &CsvReader {
        &self.reader
    }

    pub fn field_names(&self) -> &[String] {
        self.reader.field_names()
    }

    pub fn rows(&self) -> &[Record] {
        self.reader.rows()
    }

    pub fn table(&self) -> &Table {
        self.reader.table()
    }
}
