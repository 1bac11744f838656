//! Saga coordinator for multi-step operations with automatic rollback.
//!
//! Each step pairs an action with a compensation that undoes it. Steps run
//! one at a time in order; when the saga fails, every step that already
//! completed is compensated in reverse order and the original error is
//! returned unchanged. Compensation failures never replace that error: they
//! are logged, collected and exposed for diagnostics.
//!
//! Three front-ends share one engine:
//!
//! - [`SyncSaga`] runs synchronous [`Step`]s inside a scoped closure.
//! - [`Saga`] runs suspending [`AsyncStep`]s (and synchronous ones) inside a
//!   scoped async closure.
//! - [`SagaBuilder`] registers every step up front and produces a reusable
//!   [`SagaPlan`].

mod audit;
mod builder;
mod cloneable;
mod config;
mod engine;
mod erased;
mod error;
mod ledger;
mod observer;
mod saga;
mod step;
mod sync_saga;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use builder::{SagaBuilder, SagaPlan};
pub use config::{DEFAULT_ANONYMOUS_STEP_NAME, DEFAULT_SAGA_NAME, SagaConfig};
pub use engine::SagaState;
pub use error::{CompensationError, ConfigError, SagaError};
pub use ledger::{ExecutionLedger, ExecutionRecord};
pub use observer::SagaObserver;
pub use saga::{Saga, SagaSession};
pub use step::{AsyncStep, CompensationBinding, Step, StepInfo};
pub use sync_saga::{SyncSaga, SyncSagaSession};
