//! Shared store of named transformation chains.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::error::{CsvioError, CsvioResult};

use super::{FieldFn, ProcessorKind, RowFn};

/// Per-field chains registered under one field-processor handle.
///
/// Fields keep the order in which they were first configured.
#[derive(Clone, Default)]
pub struct FieldChains {
    chains: Vec<(String, Vec<FieldFn>)>,
}

impl FieldChains {
    /// The chain configured for `field`; empty when the field was never configured.
    pub fn chain(&self, field: &str) -> &[FieldFn] {
        self.chains
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, fns)| fns.as_slice())
            .unwrap_or(&[])
    }

    /// Configured field names, in first-configured order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|(f, _)| f.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    fn extend(&mut self, field: &str, fns: Vec<FieldFn>) {
        match self.chains.iter_mut().find(|(f, _)| f == field) {
            Some((_, chain)) => chain.extend(fns),
            None => self.chains.push((field.to_owned(), fns)),
        }
    }
}

impl fmt::Debug for FieldChains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.chains.iter().map(|(field, fns)| (field, fns.len())))
            .finish()
    }
}

/// Process-lifetime store of transformation chains addressed by handle.
///
/// Field-processor handles and row-processor handles live in separate namespaces, so a field
/// processor and a row processor may use the same handle string without interfering.
///
/// A registry is shared by wrapping it in an [`Arc`] and passing it to every processor
/// constructor. Entries are only ever created or reset, never removed; handles are expected to be
/// a small, caller-controlled set.
#[derive(Default)]
pub struct ProcessorRegistry {
    field_chains: RwLock<HashMap<String, FieldChains>>,
    row_chains: RwLock<HashMap<String, Vec<RowFn>>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry already wrapped for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Create or reset the field chains for `handle` to an empty mapping.
    pub fn register_field_handle(&self, handle: &str) {
        let previous = write(&self.field_chains).insert(handle.to_owned(), FieldChains::default());
        debug!(
            "field processor handle '{handle}' {}",
            if previous.is_some() { "reset" } else { "registered" }
        );
    }

    /// Create or reset the row chain for `handle` to an empty list.
    pub fn register_row_handle(&self, handle: &str) {
        let previous = write(&self.row_chains).insert(handle.to_owned(), Vec::new());
        debug!(
            "row processor handle '{handle}' {}",
            if previous.is_some() { "reset" } else { "registered" }
        );
    }

    pub fn has_field_handle(&self, handle: &str) -> bool {
        read(&self.field_chains).contains_key(handle)
    }

    pub fn has_row_handle(&self, handle: &str) -> bool {
        read(&self.row_chains).contains_key(handle)
    }

    /// Registered field-processor handles, sorted.
    pub fn field_handles(&self) -> Vec<String> {
        let mut handles: Vec<String> = read(&self.field_chains).keys().cloned().collect();
        handles.sort();
        handles
    }

    /// Registered row-processor handles, sorted.
    pub fn row_handles(&self) -> Vec<String> {
        let mut handles: Vec<String> = read(&self.row_chains).keys().cloned().collect();
        handles.sort();
        handles
    }

    /// Append `fns` to the chain for `field` under `handle`.
    pub fn push_field_fns(&self, handle: &str, field: &str, fns: Vec<FieldFn>) -> CsvioResult<()> {
        let mut guard = write(&self.field_chains);
        let chains = guard
            .get_mut(handle)
            .ok_or_else(|| not_found(ProcessorKind::Field, handle))?;
        debug!(
            "field processor '{handle}': appending {} function(s) to '{field}'",
            fns.len()
        );
        chains.extend(field, fns);
        Ok(())
    }

    /// Append `fns` to the row chain under `handle`.
    pub fn push_row_fns(&self, handle: &str, fns: Vec<RowFn>) -> CsvioResult<()> {
        let mut guard = write(&self.row_chains);
        let chain = guard
            .get_mut(handle)
            .ok_or_else(|| not_found(ProcessorKind::Row, handle))?;
        debug!("row processor '{handle}': appending {} function(s)", fns.len());
        chain.extend(fns);
        Ok(())
    }

    /// Snapshot of every field chain under `handle`.
    ///
    /// The returned chains hold [`Arc`] clones of the functions, so running them does not keep
    /// the registry locked.
    pub fn field_chains(&self, handle: &str) -> CsvioResult<FieldChains> {
        read(&self.field_chains)
            .get(handle)
            .cloned()
            .ok_or_else(|| not_found(ProcessorKind::Field, handle))
    }

    /// Snapshot of the chain for one `field` under `handle`.
    pub fn field_chain(&self, handle: &str, field: &str) -> CsvioResult<Vec<FieldFn>> {
        read(&self.field_chains)
            .get(handle)
            .map(|chains| chains.chain(field).to_vec())
            .ok_or_else(|| not_found(ProcessorKind::Field, handle))
    }

    /// Snapshot of the row chain under `handle`.
    pub fn row_chain(&self, handle: &str) -> CsvioResult<Vec<RowFn>> {
        read(&self.row_chains)
            .get(handle)
            .cloned()
            .ok_or_else(|| not_found(ProcessorKind::Row, handle))
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("field_handles", &self.field_handles())
            .field("row_handles", &self.row_handles())
            .finish()
    }
}

fn not_found(kind: ProcessorKind, handle: &str) -> CsvioError {
    CsvioError::HandleNotFound {
        kind,
        handle: handle.to_owned(),
    }
}

// Chains stay structurally valid even if a writer panicked, so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::ProcessorRegistry;
    use crate::error::CsvioError;
    use crate::processing::{field_fn, row_fn, ProcessorKind};
    use crate::types::Value;

    fn identity() -> crate::processing::FieldFn {
        field_fn(|v: Value| Ok::<_, CsvioError>(v))
    }

    #[test]
    fn lookup_of_unregistered_handle_fails() {
        let reg = ProcessorRegistry::new();
        let err = reg.field_chains("nope").unwrap_err();
        assert!(matches!(
            err,
            CsvioError::HandleNotFound { kind: ProcessorKind::Field, ref handle } if handle == "nope"
        ));
        assert!(matches!(
            reg.row_chain("nope"),
            Err(CsvioError::HandleNotFound { kind: ProcessorKind::Row, .. })
        ));
        assert!(reg.push_field_fns("nope", "f", vec![identity()]).is_err());
    }

    #[test]
    fn push_accumulates_and_register_resets() {
        let reg = ProcessorRegistry::new();
        reg.register_field_handle("h");
        reg.push_field_fns("h", "Quantity", vec![identity()]).unwrap();
        reg.push_field_fns("h", "Quantity", vec![identity(), identity()]).unwrap();
        reg.push_field_fns("h", "Fruit", vec![identity()]).unwrap();

        let chains = reg.field_chains("h").unwrap();
        assert_eq!(chains.chain("Quantity").len(), 3);
        assert_eq!(chains.chain("Fruit").len(), 1);
        assert!(chains.chain("Origin").is_empty());
        assert_eq!(chains.fields().collect::<Vec<_>>(), vec!["Quantity", "Fruit"]);

        reg.register_field_handle("h");
        assert!(reg.field_chains("h").unwrap().is_empty());
    }

    #[test]
    fn field_and_row_namespaces_are_separate() {
        let reg = ProcessorRegistry::new();
        reg.register_field_handle("shared");
        reg.register_row_handle("shared");
        reg.push_row_fns("shared", vec![row_fn(|r| Ok::<_, CsvioError>(r))])
            .unwrap();
        reg.register_field_handle("shared");

        assert_eq!(reg.row_chain("shared").unwrap().len(), 1);
        assert_eq!(reg.field_handles(), vec!["shared".to_string()]);
        assert_eq!(reg.row_handles(), vec!["shared".to_string()]);
    }
}
