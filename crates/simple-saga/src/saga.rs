use std::fmt::Debug;

use crate::audit::SagaAuditLog;
use crate::config::SagaConfig;
use crate::engine::{Engine, SagaState};
use crate::erased::{PendingStep, downcast_result};
use crate::error::{CompensationError, SagaError};
use crate::ledger::ExecutionLedger;
use crate::observer::SagaObserver;
use crate::step::{AsyncStep, StepInfo};

/// Saga coordinator whose steps may suspend.
///
/// Steps run strictly one after another: each action is awaited to
/// completion before the next one starts, and compensations are awaited one
/// at a time in reverse order. Synchronous [`Step`](crate::Step)s are
/// accepted as well.
///
/// ```
/// # use simple_saga::{AsyncStep, Saga};
/// # #[derive(Debug)] struct Error;
/// # async fn create_order(id: &str) -> Result<String, Error> { Ok(id.to_string()) }
/// # async fn cancel_order(order: String) -> Result<(), Error> { Ok(()) }
/// # async fn charge(order: &str) -> Result<u64, Error> { Ok(1) }
/// # async fn refund(payment: u64) -> Result<(), Error> { Ok(()) }
/// # async fn checkout() -> Result<(), Error> {
/// let mut saga: Saga<Error> = Saga::new();
/// let payment = saga
///     .run(async |session| {
///         let order = session
///             .step(AsyncStep::new(|| create_order("ORDER-123"), cancel_order))
///             .await?;
///         session
///             .step(AsyncStep::new(move || async move { charge(&order).await }, refund))
///             .await
///     })
///     .await?;
/// # let _ = payment;
/// # Ok(())
/// # }
/// ```
///
/// If the body returns an error, every step that already completed is
/// compensated, most recent first, and the body's error is returned
/// unchanged. Panics are not intercepted and skip compensation.
///
/// Dropping the future returned by [`Saga::run`] before it completes
/// abandons the run: steps that already completed are left uncompensated
/// and are discarded by the next run. To have a timeout or cancellation
/// unwind the saga, turn it into an error inside the step, for example by
/// mapping the `Elapsed` of `tokio::time::timeout` to `Err`:
///
/// ```
/// # use std::time::Duration;
/// # use simple_saga::{AsyncStep, Saga};
/// # #[derive(Debug)] enum Error { Timeout }
/// # async fn charge() -> Result<u64, Error> { Ok(1) }
/// # async fn refund(payment: u64) -> Result<(), Error> { Ok(()) }
/// # async fn checkout() -> Result<u64, Error> {
/// let mut saga: Saga<Error> = Saga::new();
/// let payment = saga
///     .run(async |session| {
///         session
///             .step(AsyncStep::new(
///                 || async {
///                     tokio::time::timeout(Duration::from_secs(5), charge())
///                         .await
///                         .map_err(|_| Error::Timeout)?
///                 },
///                 refund,
///             ))
///             .await
///     })
///     .await?;
/// # Ok(payment)
/// # }
/// ```
///
/// One instance supports one run at a time; use separate instances for
/// concurrent sagas.
pub struct Saga<E> {
    engine: Engine<E>,
}

impl<E> Default for Saga<E>
where
    E: Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Saga<E>
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
        self.set_observer(Box::new(observer));
        self
    }

    pub(crate) fn set_observer(&mut self, observer: Box<dyn SagaObserver>) {
        self.engine.set_observer(observer);
    }

    /// Run `body` as one saga.
    ///
    /// Step list and ledger are cleared first. If `body` fails, completed
    /// steps are compensated before the error is returned. Compensation
    /// errors are available from [`Saga::compensation_errors`] afterwards.
    ///
    /// Compensation happens only when this future is driven to completion.
    /// Dropping it early leaves completed steps uncompensated and the
    /// coordinator in [`SagaState::Active`].
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body`, unchanged.
    pub async fn run<R, F>(&mut self, body: F) -> Result<R, E>
    where
        F: AsyncFnOnce(&mut SagaSession<'_, E>) -> Result<R, E>,
    {
        self.engine.begin();
        let outcome = {
            let mut session = SagaSession {
                engine: &mut self.engine,
            };
            body(&mut session).await
        };
        self.engine.finish(outcome).await
    }

    /// Like [`Saga::run`], reporting the failed step and compensation
    /// errors alongside the original error.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if every compensation succeeded and
    /// `SagaError::CompensationFailed` otherwise. Compensation errors are
    /// moved into the returned error.
    pub async fn run_detailed<R, F>(&mut self, body: F) -> Result<R, SagaError<E>>
    where
        F: AsyncFnOnce(&mut SagaSession<'_, E>) -> Result<R, E>,
    {
        match self.run(body).await {
            Ok(value) => Ok(value),
            Err(err) => Err(SagaError::new(
                self.engine.failed_step().map(str::to_string),
                err,
                self.engine.take_compensation_errors(),
            )),
        }
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

/// Handle for recording and running steps inside [`Saga::run`].
pub struct SagaSession<'a, E> {
    engine: &'a mut Engine<E>,
}

impl<E> SagaSession<'_, E>
where
    E: Debug + Send + 'static,
{
    /// Run the step's action now and record it for compensation.
    ///
    /// Returns the action's result so later steps can use it.
    ///
    /// # Errors
    ///
    /// Returns the action's error unchanged; nothing is recorded for the
    /// failed step.
    pub async fn step<T, S>(&mut self, step: S) -> Result<T, E>
    where
        S: Into<AsyncStep<T, E>>,
        T: Clone + Send + 'static,
    {
        let step: AsyncStep<T, E> = step.into();
        let result = self.engine.execute(PendingStep::from(step)).await?;
        Ok(downcast_result(result))
    }

    pub(crate) async fn execute_pending(&mut self, step: PendingStep<E>) -> Result<(), E> {
        self.engine.execute(step).await.map(drop)
    }

    /// Steps completed so far in this run.
    #[must_use]
    pub fn ledger(&self) -> &ExecutionLedger {
        self.engine.ledger()
    }
}
