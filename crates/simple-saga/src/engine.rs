use std::borrow::Cow;
use std::fmt::Debug;
use std::future::Future;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::audit::SagaAuditLog;
use crate::config::SagaConfig;
use crate::erased::{ErasedCompensation, ErasedResult, PendingStep};
use crate::error::CompensationError;
use crate::ledger::{ExecutionLedger, ExecutionRecord};
use crate::observer::SagaObserver;
use crate::step::StepInfo;

/// Lifecycle state of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SagaState {
    /// Never run, or explicitly reset.
    #[default]
    Idle,
    /// A run is in progress.
    Active,
    /// The last run finished without error.
    ClosedClean,
    /// The last run failed and its completed steps were compensated.
    ClosedCompensated,
}

struct FailedStep {
    name: String,
    // Debug rendering of the error the action returned.
    error: String,
}

struct RecordedStep<E> {
    info: StepInfo,
    // Taken when the compensation runs, so it runs at most once per run.
    compensation: Option<ErasedCompensation<E>>,
}

/// Step list, ledger and unwind logic shared by every front-end.
pub(crate) struct Engine<E> {
    config: SagaConfig,
    state: SagaState,
    steps: Vec<RecordedStep<E>>,
    ledger: ExecutionLedger,
    audit: SagaAuditLog,
    compensation_errors: Vec<CompensationError<E>>,
    failed_step: Option<FailedStep>,
    observer: Option<Box<dyn SagaObserver>>,
}

impl<E> Engine<E>
where
    E: Debug + Send + 'static,
{
    pub(crate) fn new(config: SagaConfig) -> Self {
        Self {
            config,
            state: SagaState::Idle,
            steps: Vec::new(),
            ledger: ExecutionLedger::new(),
            audit: SagaAuditLog::new(),
            compensation_errors: Vec::new(),
            failed_step: None,
            observer: None,
        }
    }

    pub(crate) fn set_observer(&mut self, observer: Box<dyn SagaObserver>) {
        self.observer = Some(observer);
    }

    pub(crate) fn config(&self) -> &SagaConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> SagaState {
        self.state
    }

    pub(crate) fn ledger(&self) -> &ExecutionLedger {
        &self.ledger
    }

    pub(crate) fn steps(&self) -> impl ExactSizeIterator<Item = &StepInfo> {
        self.steps.iter().map(|step| &step.info)
    }

    pub(crate) fn audit_log(&self) -> &SagaAuditLog {
        &self.audit
    }

    pub(crate) fn compensation_errors(&self) -> &[CompensationError<E>] {
        &self.compensation_errors
    }

    pub(crate) fn take_compensation_errors(&mut self) -> Vec<CompensationError<E>> {
        std::mem::take(&mut self.compensation_errors)
    }

    pub(crate) fn failed_step(&self) -> Option<&str> {
        self.failed_step.as_ref().map(|failed| failed.name.as_str())
    }

    /// Drop all state of the previous run.
    pub(crate) fn reset(&mut self) {
        self.steps.clear();
        self.ledger.clear();
        self.audit.clear();
        self.compensation_errors.clear();
        self.failed_step = None;
        self.state = SagaState::Idle;
        debug!(saga = self.config.name(), "saga context reset");
    }

    /// Enter a new run with empty step list and ledger.
    pub(crate) fn begin(&mut self) {
        self.reset();
        self.state = SagaState::Active;
        debug!(saga = self.config.name(), "entering saga");
    }

    /// Run one step's action and record it if it succeeds.
    ///
    /// A failed action leaves the step list and ledger untouched.
    pub(crate) async fn execute(&mut self, step: PendingStep<E>) -> Result<ErasedResult, E> {
        let PendingStep {
            name,
            binding,
            action,
            compensation,
        } = step;
        let index = self.ledger.len();
        let name = name.map_or_else(
            || self.config.anonymous_step_name().to_string(),
            Cow::into_owned,
        );
        self.failed_step = None;

        info!(
            saga = self.config.name(),
            step = index + 1,
            name = %name,
            "executing step"
        );
        if self.config.audit() {
            self.audit.record_start(index, &name);
        }
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.step_started(index, &name);
        }

        match action().await {
            Ok(result) => {
                self.ledger.push(ExecutionRecord::new(
                    index,
                    name.clone(),
                    result.clone_box(),
                ));
                if self.config.audit() {
                    self.audit.record_success();
                }
                if let Some(observer) = self.observer.as_deref_mut() {
                    observer.step_succeeded(index, &name);
                }
                info!(
                    saga = self.config.name(),
                    step = index + 1,
                    name = %name,
                    "step completed"
                );
                self.steps.push(RecordedStep {
                    info: StepInfo::new(index, name, binding),
                    compensation: Some(compensation),
                });
                Ok(result)
            }
            Err(err) => {
                if self.config.audit() {
                    self.audit.record_failure();
                }
                if let Some(observer) = self.observer.as_deref_mut() {
                    observer.step_failed(index, &name, &err);
                }
                debug!(
                    saga = self.config.name(),
                    step = index + 1,
                    name = %name,
                    error = ?err,
                    "step failed"
                );
                self.failed_step = Some(FailedStep {
                    name,
                    error: format!("{err:?}"),
                });
                Err(err)
            }
        }
    }

    /// Undo every recorded step, most recent first.
    ///
    /// Never fails: compensation errors are collected and returned, and the
    /// walk always reaches the first step.
    pub(crate) async fn compensate(&mut self) -> Vec<CompensationError<E>> {
        let recorded = self.ledger.len();
        info!(
            saga = self.config.name(),
            steps = recorded,
            "starting compensation"
        );
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.compensation_started(recorded);
        }

        let mut errors = Vec::new();
        for position in (0..recorded).rev() {
            let record = &self.ledger.records()[position];
            let index = record.step_index();
            let result = record.clone_result();

            let Some(step) = self.steps.get_mut(index) else {
                continue;
            };
            let Some(compensation) = step.compensation.take() else {
                continue;
            };
            let name = step.info.name().to_string();
            let binding = step.info.binding();

            info!(
                saga = self.config.name(),
                step = index + 1,
                name = %name,
                binding = ?binding,
                "compensating step"
            );

            match compensation(result).await {
                Ok(()) => {
                    if self.config.audit() {
                        self.audit.record_compensated(index);
                    }
                    if let Some(observer) = self.observer.as_deref_mut() {
                        observer.step_compensated(index, &name, Ok(()));
                    }
                    info!(
                        saga = self.config.name(),
                        step = index + 1,
                        name = %name,
                        "compensated step"
                    );
                }
                Err(err) => {
                    if self.config.audit() {
                        self.audit.record_compensation_failed(index);
                    }
                    if let Some(observer) = self.observer.as_deref_mut() {
                        observer.step_compensated(index, &name, Err(&err));
                    }
                    warn!(
                        saga = self.config.name(),
                        step = index + 1,
                        name = %name,
                        error = ?err,
                        "compensation failed"
                    );
                    errors.push(CompensationError {
                        step_index: index,
                        step: name,
                        error: err,
                    });
                }
            }
        }

        if !errors.is_empty() {
            warn!(
                saga = self.config.name(),
                failures = errors.len(),
                "compensation completed with errors"
            );
        }
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.compensation_finished(errors.len());
        }
        errors
    }

    /// Close the current run.
    ///
    /// A failed run is compensated before its original error is handed
    /// back; compensation errors stay on the engine. The failed step is kept
    /// only when `outcome` carries the error that step returned.
    pub(crate) async fn finish<R>(&mut self, outcome: Result<R, E>) -> Result<R, E> {
        match outcome {
            Ok(value) => {
                self.state = SagaState::ClosedClean;
                debug!(
                    saga = self.config.name(),
                    steps = self.ledger.len(),
                    "saga completed"
                );
                Ok(value)
            }
            Err(err) => {
                // A step error the body handled is not the cause of a later,
                // unrelated body error.
                if self
                    .failed_step
                    .as_ref()
                    .is_some_and(|failed| failed.error != format!("{err:?}"))
                {
                    self.failed_step = None;
                }
                error!(
                    saga = self.config.name(),
                    failed_step = self.failed_step(),
                    error = ?err,
                    "saga failed"
                );
                self.compensation_errors = self.compensate().await;
                self.state = SagaState::ClosedCompensated;
                Err(err)
            }
        }
    }
}

/// Drive a future made only of synchronous units.
///
/// Synchronous steps are adapted into ready futures, so a single poll always
/// completes them.
pub(crate) fn complete_now<F: Future>(future: F) -> F::Output {
    future
        .now_or_never()
        .expect("synchronous saga units complete without suspending")
}
