//! Path decomposition and basic file operations.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CsvioResult;

/// A file location with convenience accessors for its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    path: PathBuf,
}

impl FileRef {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without the parent directory, e.g. `c.csv`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Parent directory, or `.` when the path has none.
    pub fn file_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Directory joined with the file name.
    ///
    /// A bare file name stays bare (`c.csv`, not `./c.csv`).
    pub fn file_path(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.join(self.file_name()),
            _ => PathBuf::from(self.file_name()),
        }
    }

    /// File name without its extension, e.g. `c`.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extension with its leading dot, e.g. `.csv`; empty when there is none.
    pub fn file_ext(&self) -> String {
        self.path
            .extension()
            .map(|s| format!(".{}", s.to_string_lossy()))
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create an empty file.
    ///
    /// Returns `Ok(false)` if the file already exists and `exist_ok` is `false`.
    pub fn touch(&self, exist_ok: bool) -> CsvioResult<bool> {
        let mut opts = OpenOptions::new();
        opts.write(true);
        if exist_ok {
            opts.create(true);
        } else {
            opts.create_new(true);
        }
        match opts.open(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the file.
    ///
    /// Returns `Ok(false)` if it does not exist and `missing_ok` is `false`.
    pub fn delete(&self, missing_ok: bool) -> CsvioResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(missing_ok),
            Err(e) => Err(e.into()),
        }
    }
}

impl AsRef<Path> for FileRef {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
