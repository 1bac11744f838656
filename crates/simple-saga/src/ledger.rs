use std::fmt;

use crate::cloneable::CloneableAny;

/// Record of one successfully completed action.
pub struct ExecutionRecord {
    step_index: usize,
    name: String,
    result: Box<dyn CloneableAny>,
}

impl ExecutionRecord {
    pub(crate) fn new(step_index: usize, name: String, result: Box<dyn CloneableAny>) -> Self {
        Self {
            step_index,
            name,
            result,
        }
    }

    /// Index of the step that produced this record.
    #[must_use]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Diagnostic name of the action.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action's result, if it has type `T`.
    #[must_use]
    pub fn result<T: 'static>(&self) -> Option<&T> {
        self.result.as_any().downcast_ref::<T>()
    }

    pub(crate) fn clone_result(&self) -> Box<dyn CloneableAny> {
        self.result.clone_box()
    }
}

impl Clone for ExecutionRecord {
    fn clone(&self) -> Self {
        Self {
            step_index: self.step_index,
            name: self.name.clone(),
            result: self.clone_result(),
        }
    }
}

impl fmt::Debug for ExecutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRecord")
            .field("step_index", &self.step_index)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered log of the steps that completed during the current run.
///
/// Insertion order is execution order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLedger {
    records: Vec<ExecutionRecord>,
}

impl ExecutionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: ExecutionRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ExecutionRecord> {
        self.records.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&ExecutionRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExecutionLedger {
    type Item = &'a ExecutionRecord;
    type IntoIter = std::slice::Iter<'a, ExecutionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
