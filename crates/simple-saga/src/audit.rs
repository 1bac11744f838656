use std::time::Instant;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Action started or completed successfully.
    Executed,
    /// Action failed.
    Failed,
    /// Compensation succeeded.
    Compensated,
    /// Compensation returned an error.
    CompensationFailed,
}

/// Record of one step attempt in the saga.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Position the step had (or would have had) in execution order.
    pub index: usize,
    /// Diagnostic name of the step.
    pub name: String,
    /// Latest status of the attempt.
    pub status: StepStatus,
    /// When the action started executing.
    pub started_at: Instant,
    /// When the step last changed status (action or compensation finished).
    pub completed_at: Option<Instant>,
}

/// Audit log tracking every action attempt and compensation of a run.
///
/// Unlike the [`ExecutionLedger`](crate::ExecutionLedger), failed attempts
/// are kept too.
#[derive(Debug, Clone, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
}

impl SagaAuditLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Open a new attempt at position `index`.
    pub(crate) fn record_start(&mut self, index: usize, name: &str) {
        self.records.push(StepRecord {
            index,
            name: name.to_string(),
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
        });
    }

    /// Close the attempt in progress as failed.
    pub(crate) fn record_failure(&mut self) {
        if let Some(record) = self.records.last_mut() {
            record.status = StepStatus::Failed;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Close the attempt in progress as executed.
    pub(crate) fn record_success(&mut self) {
        if let Some(record) = self.records.last_mut() {
            record.status = StepStatus::Executed;
            record.completed_at = Some(Instant::now());
        }
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        self.mark_executed(index, StepStatus::Compensated);
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize) {
        self.mark_executed(index, StepStatus::CompensationFailed);
    }

    // A failed attempt may share its index with the step that later
    // succeeded at the same position, so only executed records match.
    fn mark_executed(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self
            .records
            .iter_mut()
            .rfind(|record| record.index == index && record.status == StepStatus::Executed)
        {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Records in attempt order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Records with the given status, in attempt order.
    pub fn with_status(&self, status: StepStatus) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(move |record| record.status == status)
    }

    /// One line per attempt: status symbol, 1-based position and name.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Executed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::CompensationFailed => "⚠",
            };
            lines.push(format!("{status} {}. {}", record.index + 1, record.name));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_audit_log_is_empty() {
        let log = SagaAuditLog::new();
        assert!(log.records().is_empty());
    }

    #[test]
    fn record_start_adds_step_with_executed_status() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "create_order");

        assert_eq!(log.records().len(), 1);
        assert_eq!(log.records()[0].name, "create_order");
        assert_eq!(log.records()[0].status, StepStatus::Executed);
        assert!(log.records()[0].completed_at.is_none());
    }

    #[test]
    fn record_failure_updates_last_step() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "step_1");
        log.record_failure();

        assert_eq!(log.records()[0].status, StepStatus::Failed);
        assert!(log.records()[0].completed_at.is_some());
    }

    #[test]
    fn record_success_sets_completion_time() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "step_1");
        log.record_success();

        assert_eq!(log.records()[0].status, StepStatus::Executed);
        assert!(log.records()[0].completed_at.is_some());
    }

    #[test]
    fn compensation_marks_step_by_index_even_with_duplicate_names() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "charge");
        log.record_success();
        log.record_start(1, "charge");
        log.record_success();
        log.record_compensated(1);

        assert_eq!(log.records()[0].status, StepStatus::Executed);
        assert_eq!(log.records()[1].status, StepStatus::Compensated);
    }

    #[test]
    fn compensation_skips_failed_attempt_at_same_index() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "flaky");
        log.record_failure();
        log.record_start(0, "fallback");
        log.record_success();
        log.record_compensation_failed(0);

        assert_eq!(log.records()[0].status, StepStatus::Failed);
        assert_eq!(log.records()[1].status, StepStatus::CompensationFailed);
    }

    #[test]
    fn with_status_filters_records() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "a");
        log.record_success();
        log.record_start(1, "b");
        log.record_failure();

        let failed: Vec<_> = log
            .with_status(StepStatus::Failed)
            .map(|record| record.name.as_str())
            .collect();
        assert_eq!(failed, ["b"]);
    }

    #[test]
    fn summary_formats_all_statuses() {
        let mut log = SagaAuditLog::new();
        log.record_start(0, "compensated_step");
        log.record_success();
        log.record_compensated(0);
        log.record_start(1, "comp_failed_step");
        log.record_success();
        log.record_compensation_failed(1);
        log.record_start(2, "failed_step");
        log.record_failure();

        assert_eq!(
            log.summary(),
            "↩ 1. compensated_step\n⚠ 2. comp_failed_step\n✗ 3. failed_step"
        );
    }
}
