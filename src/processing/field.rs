//! Per-field transformation chains.

use std::sync::Arc;

use crate::error::{CsvioError, CsvioResult, TransformError};
use crate::types::{Record, Value};

use super::registry::ProcessorRegistry;
use super::{field_fn, FieldFn, Processor, ProcessorKind};

/// Applies ordered chains of `Value -> Value` functions to named fields of a record.
///
/// The chains live in a [`ProcessorRegistry`] under this processor's handle, so every
/// `FieldProcessor` built against the same registry and handle sees and extends the same chains.
///
/// ```rust
/// use csvio::processing::{FieldProcessor, Processor, ProcessorRegistry};
/// use csvio::types::{Record, Value};
///
/// let registry = ProcessorRegistry::shared();
/// let proc = FieldProcessor::new(registry, "quantities");
/// proc.add_processor("Quantity", |v: Value| {
///     v.to_string().trim().parse::<i64>().map(Value::Int64)
/// })
/// .unwrap();
/// proc.add_processor("Quantity", |v: Value| {
///     Ok::<_, std::convert::Infallible>(Value::Int64(v.as_i64().unwrap_or(0) + 1))
/// })
/// .unwrap();
///
/// let out = proc.process_row(&Record::from([("Quantity", "5")])).unwrap();
/// assert_eq!(out["Quantity"], Value::Int64(6));
/// ```
#[derive(Debug, Clone)]
pub struct FieldProcessor {
    registry: Arc<ProcessorRegistry>,
    handle: String,
}

impl FieldProcessor {
    /// Create a processor for `handle`, registering the handle or resetting its chains to empty.
    ///
    /// Constructing a second processor for a handle that is already in use discards every
    /// function registered under it so far. Build all processors for a handle from one place
    /// before using them, or use [`FieldProcessor::attach`] to share an existing handle.
    pub fn new(registry: Arc<ProcessorRegistry>, handle: impl Into<String>) -> Self {
        let handle = handle.into();
        registry.register_field_handle(&handle);
        Self { registry, handle }
    }

    /// Create a processor that shares the existing chains of `handle` without resetting them.
    pub fn attach(registry: Arc<ProcessorRegistry>, handle: impl Into<String>) -> CsvioResult<Self> {
        let handle = handle.into();
        if !registry.has_field_handle(&handle) {
            return Err(CsvioError::HandleNotFound {
                kind: ProcessorKind::Field,
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

    /// Append `f` to the chain for `field` under this processor's handle.
    pub fn add_processor<F, E>(&self, field: &str, f: F) -> CsvioResult<()>
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<TransformError>,
    {
        self.add_processors_to(&self.handle, field, [field_fn(f)])
    }

    /// Append `fns`, in order, to the chain for `field` under this processor's handle.
    pub fn add_processors(
        &self,
        field: &str,
        fns: impl IntoIterator<Item = FieldFn>,
    ) -> CsvioResult<()> {
        self.add_processors_to(&self.handle, field, fns)
    }

    /// Append `f` to the chain for `field` under an explicit `handle`.
    pub fn add_processor_to<F, E>(&self, handle: &str, field: &str, f: F) -> CsvioResult<()>
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<TransformError>,
    {
        self.add_processors_to(handle, field, [field_fn(f)])
    }

    /// Append `fns`, in order, to the chain for `field` under an explicit `handle`.
    pub fn add_processors_to(
        &self,
        handle: &str,
        field: &str,
        fns: impl IntoIterator<Item = FieldFn>,
    ) -> CsvioResult<()> {
        self.registry
            .push_field_fns(handle, field, fns.into_iter().collect())
    }

    /// Transform `record` using the chains registered under `handle`.
    ///
    /// Every field of the record that has a chain is threaded through the chain's functions in
    /// order; other fields pass through unchanged. Configured fields missing from the record are
    /// not added. Field order is preserved.
    pub fn process_row_with(&self, record: &Record, handle: &str) -> CsvioResult<Record> {
        let chains = self.registry.field_chains(handle)?;
        let mut out = Record::with_capacity(record.len());
        for (field, value) in record.iter() {
            let mut value = value.clone();
            for f in chains.chain(field) {
                value = f(value).map_err(|source| CsvioError::Transform {
                    kind: ProcessorKind::Field,
                    handle: handle.to_owned(),
                    field: Some(field.to_owned()),
                    source,
                })?;
            }
            out.insert(field, value);
        }
        Ok(out)
    }

    /// Transform every record with the chains under `handle`, preserving order.
    pub fn process_rows_with(&self, rows: &[Record], handle: &str) -> CsvioResult<Vec<Record>> {
        rows.iter()
            .map(|row| self.process_row_with(row, handle))
            .collect()
    }
}

impl Processor for FieldProcessor {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Field
    }

    fn process_row(&self, record: &Record) -> CsvioResult<Record> {
        self.process_row_with(record, &self.handle)
    }
}
