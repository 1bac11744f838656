use std::borrow::Cow;

use futures::future::BoxFuture;
use futures::{FutureExt, TryFutureExt};

use crate::cloneable::CloneableAny;
use crate::step::{AsyncStep, CompensationBinding};

pub(crate) type ErasedResult = Box<dyn CloneableAny>;

pub(crate) type ErasedAction<E> =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<ErasedResult, E>> + Send>;

pub(crate) type ErasedCompensation<E> =
    Box<dyn FnOnce(ErasedResult) -> BoxFuture<'static, Result<(), E>> + Send>;

/// A step with its result type erased, so steps producing different types
/// can share one step list and one ledger.
pub(crate) struct PendingStep<E> {
    pub(crate) name: Option<Cow<'static, str>>,
    pub(crate) binding: CompensationBinding,
    pub(crate) action: ErasedAction<E>,
    pub(crate) compensation: ErasedCompensation<E>,
}

impl<T, E> From<AsyncStep<T, E>> for PendingStep<E>
where
    T: Clone + Send + 'static,
    E: Send + 'static,
{
    fn from(step: AsyncStep<T, E>) -> Self {
        let AsyncStep {
            name,
            action,
            compensation,
            binding,
        } = step;
        Self {
            name,
            binding,
            action: Box::new(move || {
                action()
                    .map_ok(|result| Box::new(result) as ErasedResult)
                    .boxed()
            }),
            compensation: Box::new(move |result: ErasedResult| {
                let typed = result
                    .into_any()
                    .downcast::<T>()
                    .expect("ledger entries keep the type their action produced");
                compensation(*typed)
            }),
        }
    }
}

/// Recover the typed result handed back by the engine.
pub(crate) fn downcast_result<T: 'static>(result: ErasedResult) -> T {
    *result
        .into_any()
        .downcast::<T>()
        .expect("engine returns the result produced by the step's own action")
}
