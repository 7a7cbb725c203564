//! Whole-record transformation chains.

use std::sync::Arc;

use crate::error::{CsvioError, CsvioResult, TransformError};
use crate::types::Record;

use super::registry::ProcessorRegistry;
use super::{row_fn, Processor, ProcessorKind, RowFn};

/// Applies an ordered chain of `Record -> Record` functions to whole records.
///
/// Unlike a [`super::FieldProcessor`], row functions may add, remove or rename fields, so the
/// output key set is whatever the last function returns.
#[derive(Debug, Clone)]
pub struct RowProcessor {
    registry: Arc<ProcessorRegistry>,
    handle: String,
}

impl RowProcessor {
    /// Create a processor for `handle`, registering the handle or resetting its chain to empty.
    ///
    /// As with [`super::FieldProcessor::new`], this discards functions already registered under
    /// the handle; use [`RowProcessor::attach`] to share one instead.
    pub fn new(registry: Arc<ProcessorRegistry>, handle: impl Into<String>) -> Self {
        let handle = handle.into();
        registry.register_row_handle(&handle);
        Self { registry, handle }
    }

    /// Create a processor that shares the existing chain of `handle` without resetting it.
    pub fn attach(registry: Arc<ProcessorRegistry>, handle: impl Into<String>) -> CsvioResult<Self> {
        let handle = handle.into();
        if !registry.has_row_handle(&handle) {
            return Err(CsvioError::HandleNotFound {
                kind: ProcessorKind::Row,
                handle,
            });
        }
        Ok(Self { registry, handle })
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    pub fn add_processor<F, E>(&self, f: F) -> CsvioResult<()>
    where
        F: Fn(Record) -> Result<Record, E> + Send + Sync + 'static,
        E: Into<TransformError>,
    {
        self.add_processors_to(&self.handle, [row_fn(f)])
    }

    pub fn add_processors(&self, fns: impl IntoIterator<Item = RowFn>) -> CsvioResult<()> {
        self.add_processors_to(&self.handle, fns)
    }

    pub fn add_processor_to<F, E>(&self, handle: &str, f: F) -> CsvioResult<()>
    where
        F: Fn(Record) -> Result<Record, E> + Send + Sync + 'static,
        E: Into<TransformError>,
    {
        self.add_processors_to(handle, [row_fn(f)])
    }

    /// Append `fns`, in order, to the end of the chain under `handle`.
    pub fn add_processors_to(
        &self,
        handle: &str,
        fns: impl IntoIterator<Item = RowFn>,
    ) -> CsvioResult<()> {
        self.registry.push_row_fns(handle, fns.into_iter().collect())
    }

    /// Thread a copy of `record` through every function registered under `handle`.
    pub fn process_row_with(&self, record: &Record, handle: &str) -> CsvioResult<Record> {
        let chain = self.registry.row_chain(handle)?;
        chain.iter().try_fold(record.clone(), |current, f| {
            f(current).map_err(|source| CsvioError::Transform {
                kind: ProcessorKind::Row,
                handle: handle.to_owned(),
                field: None,
                source,
            })
        })
    }

    pub fn process_rows_with(&self, rows: &[Record], handle: &str) -> CsvioResult<Vec<Record>> {
        rows.iter()
            .map(|row| self.process_row_with(row, handle))
            .collect()
    }
}

impl Processor for RowProcessor {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Row
    }

    fn process_row(&self, record: &Record) -> CsvioResult<Record> {
        self.process_row_with(record, &self.handle)
    }
}
