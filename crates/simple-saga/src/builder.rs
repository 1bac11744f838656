use std::fmt::Debug;

use crate::audit::SagaAuditLog;
use crate::config::SagaConfig;
use crate::engine::SagaState;
use crate::erased::PendingStep;
use crate::error::{CompensationError, SagaError};
use crate::ledger::ExecutionLedger;
use crate::observer::SagaObserver;
use crate::saga::Saga;
use crate::step::AsyncStep;

type StepFactory<E> = Box<dyn Fn() -> PendingStep<E> + Send + Sync>;

/// Builder for a saga whose steps are all registered before it runs.
///
/// Steps are registered as factories, so the resulting [`SagaPlan`] can be
/// executed any number of times, each execution starting from fresh steps
/// and an empty ledger.
///
/// ```
/// # use simple_saga::{SagaBuilder, Step};
/// # #[derive(Debug)] struct Error;
/// # fn create_order() -> Result<u32, Error> { Ok(1) }
/// # fn cancel_order(order: u32) -> Result<(), Error> { Ok(()) }
/// # async fn run() -> Result<(), Error> {
/// let mut plan = SagaBuilder::<Error>::new()
///     .add_step(|| Step::new(create_order, cancel_order))
///     .build();
/// let ledger = plan.execute().await?;
/// assert_eq!(ledger.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SagaBuilder<E> {
    config: SagaConfig,
    observer: Option<Box<dyn SagaObserver>>,
    factories: Vec<StepFactory<E>>,
}

impl<E> Default for SagaBuilder<E>
where
    E: Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SagaBuilder<E>
where
    E: Debug + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SagaConfig::default(),
            observer: None,
            factories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SagaConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl SagaObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Append a step. `factory` is called once per execution to produce the
    /// step, synchronous or suspending.
    #[must_use]
    pub fn add_step<T, S, F>(mut self, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Into<AsyncStep<T, E>>,
        T: Clone + Send + 'static,
    {
        self.factories.push(Box::new(move || {
            let step: AsyncStep<T, E> = factory().into();
            PendingStep::from(step)
        }));
        self
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    #[must_use]
    pub fn build(self) -> SagaPlan<E> {
        let mut saga = Saga::with_config(self.config);
        if let Some(observer) = self.observer {
            saga.set_observer(observer);
        }
        SagaPlan {
            saga,
            factories: self.factories,
        }
    }
}

/// A saga with a fixed list of steps, built by [`SagaBuilder`].
pub struct SagaPlan<E> {
    saga: Saga<E>,
    factories: Vec<StepFactory<E>>,
}

impl<E> SagaPlan<E>
where
    E: Debug + Send + 'static,
{
    /// Run every step in order and return the ledger of their results.
    ///
    /// If a step fails, the steps before it are compensated in reverse
    /// order and the step's error is returned.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, unchanged.
    pub async fn execute(&mut self) -> Result<&ExecutionLedger, E> {
        self.execute_detailed().await.map_err(SagaError::into_source)
    }

    /// Like [`SagaPlan::execute`], reporting the failed step and
    /// compensation errors alongside the original error.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if every compensation succeeded and
    /// `SagaError::CompensationFailed` otherwise.
    pub async fn execute_detailed(&mut self) -> Result<&ExecutionLedger, SagaError<E>> {
        let Self { saga, factories } = self;
        saga.run_detailed(async |session| {
            for factory in factories.iter() {
                session.execute_pending(factory()).await?;
            }
            Ok(())
        })
        .await?;
        Ok(saga.ledger())
    }

    /// Clear the ledger of the last execution.
    pub fn reset(&mut self) {
        self.saga.reset();
    }

    /// Number of steps in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> SagaState {
        self.saga.state()
    }

    /// Ledger of the last execution.
    #[must_use]
    pub fn ledger(&self) -> &ExecutionLedger {
        self.saga.ledger()
    }

    #[must_use]
    pub fn audit_log(&self) -> &SagaAuditLog {
        self.saga.audit_log()
    }

    #[must_use]
    pub fn compensation_errors(&self) -> &[CompensationError<E>] {
        self.saga.compensation_errors()
    }
}
