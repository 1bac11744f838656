use std::fmt::Debug;

use crate::audit::SagaAuditLog;
use crate::config::SagaConfig;
use crate::engine::{Engine, SagaState, complete_now};
use crate::erased::{PendingStep, downcast_result};
use crate::error::{CompensationError, SagaError};
use crate::ledger::ExecutionLedger;
use crate::observer::SagaObserver;
use crate::step::{AsyncStep, Step, StepInfo};

/// Saga coordinator for synchronous steps.
///
/// Behaves exactly like [`Saga`](crate::Saga) without suspension: each
/// action and compensation runs to completion on the calling thread.
///
/// ```
/// # use simple_saga::{Step, SyncSaga};
/// # #[derive(Debug)] struct Error;
/// # fn create_order(id: &str) -> Result<u32, Error> { Ok(1) }
/// # fn cancel_order(order: u32) -> Result<(), Error> { Ok(()) }
/// # fn reserve(order: u32) -> Result<&'static str, Error> { Ok("sku") }
/// # fn release(sku: &'static str, order: u32) -> Result<(), Error> { Ok(()) }
/// let mut saga: SyncSaga<Error> = SyncSaga::new();
/// let reservation = saga.run(|session| {
///     let order = session.step(Step::new(|| create_order("ORDER-123"), cancel_order))?;
///     session.step(Step::with_compensation_args(move || reserve(order), release, order))
/// })?;
/// # let _ = reservation;
/// # Ok::<(), Error>(())
/// ```
pub struct SyncSaga<E> {
    engine: Engine<E>,
}

impl<E> Default for SyncSaga<E>
where
    E: Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SyncSaga<E>
where
    E: Debug + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SagaConfig::default())
    }

    #[must_use]
    pub fn with_config(config: SagaConfig) -> Self {
        Self {
            engine: Engine::new(config),
        }
    }

    /// Install an observer notified at every lifecycle point.
    #[must_use]
    pub fn with_observer(mut self, observer: impl SagaObserver + 'static) -> Self {
        self.engine.set_observer(Box::new(observer));
        self
    }

    /// Run `body` as one saga.
    ///
    /// Step list and ledger are cleared first. If `body` fails, completed
    /// steps are compensated before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body`, unchanged.
    pub fn run<R, F>(&mut self, body: F) -> Result<R, E>
    where
        F: FnOnce(&mut SyncSagaSession<'_, E>) -> Result<R, E>,
    {
        self.engine.begin();
        let outcome = body(&mut SyncSagaSession {
            engine: &mut self.engine,
        });
        complete_now(self.engine.finish(outcome))
    }

    /// Like [`SyncSaga::run`], reporting the failed step and compensation
    /// errors alongside the original error.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if every compensation succeeded and
    /// `SagaError::CompensationFailed` otherwise.
    pub fn run_detailed<R, F>(&mut self, body: F) -> Result<R, SagaError<E>>
    where
        F: FnOnce(&mut SyncSagaSession<'_, E>) -> Result<R, E>,
    {
        self.run(body).map_err(|err| {
            SagaError::new(
                self.engine.failed_step().map(str::to_string),
                err,
                self.engine.take_compensation_errors(),
            )
        })
    }

    /// Clear step list, ledger and diagnostics as if newly constructed.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Settings this coordinator was built with.
    #[must_use]
    pub fn config(&self) -> &SagaConfig {
        self.engine.config()
    }

    /// Lifecycle state after the last run.
    #[must_use]
    pub fn state(&self) -> SagaState {
        self.engine.state()
    }

    /// Steps whose action completed in the last run, in execution order.
    #[must_use]
    pub fn ledger(&self) -> &ExecutionLedger {
        self.engine.ledger()
    }

    /// Recorded steps of the last run, in execution order.
    pub fn steps(&self) -> impl ExactSizeIterator<Item = &StepInfo> {
        self.engine.steps()
    }

    /// Every action attempt and compensation of the last run.
    #[must_use]
    pub fn audit_log(&self) -> &SagaAuditLog {
        self.engine.audit_log()
    }

    /// Compensation failures of the last run, in unwind order.
    #[must_use]
    pub fn compensation_errors(&self) -> &[CompensationError<E>] {
        self.engine.compensation_errors()
    }

    /// Name of the step whose action error ended the last run, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        self.engine.failed_step()
    }
}

/// Handle for recording and running steps inside [`SyncSaga::run`].
pub struct SyncSagaSession<'a, E> {
    engine: &'a mut Engine<E>,
}

impl<E> SyncSagaSession<'_, E>
where
    E: Debug + Send + 'static,
{
    /// Run the step's action now and record it for compensation.
    ///
    /// # Errors
    ///
    /// Returns the action's error unchanged; nothing is recorded for the
    /// failed step.
    pub fn step<T>(&mut self, step: Step<T, E>) -> Result<T, E>
    where
        T: Clone + Send + 'static,
    {
        let step: AsyncStep<T, E> = step.into();
        let result = complete_now(self.engine.execute(PendingStep::from(step)))?;
        Ok(downcast_result(result))
    }

    /// Steps completed so far in this run.
    #[must_use]
    pub fn ledger(&self) -> &ExecutionLedger {
        self.engine.ledger()
    }
}
