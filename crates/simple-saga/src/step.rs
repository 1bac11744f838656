use std::any::type_name;
use std::borrow::Cow;
use std::future::{self, Future};

use futures::FutureExt;
use futures::future::BoxFuture;

/// How a compensation receives its arguments during unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompensationBinding {
    /// The action's result is passed first, followed by any extra arguments
    /// supplied when the step was recorded.
    #[default]
    ResultFirst,
    /// Only the arguments supplied when the step was recorded are passed;
    /// the action's result is not.
    Override,
}

pub(crate) type BoxedAction<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

pub(crate) type BoxedCompensation<T, E> =
    Box<dyn FnOnce(T) -> BoxFuture<'static, Result<(), E>> + Send>;

/// A synchronous saga step: an action paired with the compensation that
/// undoes it.
///
/// Inputs of the action are captured by the action closure. Inputs of the
/// compensation beyond the action's result are bound here, when the step is
/// recorded, and the choice of constructor fixes the
/// [`CompensationBinding`]:
///
/// - [`Step::new`]: `compensation(result)`
/// - [`Step::with_compensation_args`]: `compensation(result, extra)`
/// - [`Step::with_compensation_override`]: `compensation(args)`
///
/// Use a tuple for several positional extras and a struct for named ones.
pub struct Step<T, E> {
    name: Option<Cow<'static, str>>,
    action: Box<dyn FnOnce() -> Result<T, E> + Send>,
    compensation: Box<dyn FnOnce(T) -> Result<(), E> + Send>,
    binding: CompensationBinding,
}

impl<T, E> Step<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A step whose compensation receives the action's result.
    #[must_use]
    pub fn new<A, C>(action: A, compensation: C) -> Self
    where
        A: FnOnce() -> Result<T, E> + Send + 'static,
        C: FnOnce(T) -> Result<(), E> + Send + 'static,
    {
        Self {
            name: callable_name::<A>().map(Cow::Borrowed),
            action: Box::new(action),
            compensation: Box::new(compensation),
            binding: CompensationBinding::ResultFirst,
        }
    }

    /// A step whose compensation receives the action's result followed by
    /// `extra`.
    #[must_use]
    pub fn with_compensation_args<A, C, X>(action: A, compensation: C, extra: X) -> Self
    where
        A: FnOnce() -> Result<T, E> + Send + 'static,
        C: FnOnce(T, X) -> Result<(), E> + Send + 'static,
        X: Send + 'static,
    {
        Self {
            name: callable_name::<A>().map(Cow::Borrowed),
            action: Box::new(action),
            compensation: Box::new(move |result| compensation(result, extra)),
            binding: CompensationBinding::ResultFirst,
        }
    }

    /// A step whose compensation receives `args` in place of the action's
    /// result.
    #[must_use]
    pub fn with_compensation_override<A, C, X>(action: A, compensation: C, args: X) -> Self
    where
        A: FnOnce() -> Result<T, E> + Send + 'static,
        C: FnOnce(X) -> Result<(), E> + Send + 'static,
        X: Send + 'static,
    {
        Self {
            name: callable_name::<A>().map(Cow::Borrowed),
            action: Box::new(action),
            compensation: Box::new(move |_result: T| compensation(args)),
            binding: CompensationBinding::Override,
        }
    }

    /// Set the diagnostic name of the step.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Explicit or derived name; `None` means the configured anonymous
    /// sentinel is recorded.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// How the compensation receives its arguments.
    #[must_use]
    pub fn binding(&self) -> CompensationBinding {
        self.binding
    }
}

/// A suspending saga step. Both the action and the compensation return
/// futures, awaited to completion by the coordinator.
///
/// Every synchronous [`Step`] converts into an `AsyncStep`, so the
/// suspending coordinator accepts both kinds of unit through the same entry
/// point.
pub struct AsyncStep<T, E> {
    pub(crate) name: Option<Cow<'static, str>>,
    pub(crate) action: BoxedAction<T, E>,
    pub(crate) compensation: BoxedCompensation<T, E>,
    pub(crate) binding: CompensationBinding,
}

impl<T, E> AsyncStep<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A step whose compensation receives the action's result.
    #[must_use]
    pub fn new<A, AF, C, CF>(action: A, compensation: C) -> Self
    where
        A: FnOnce() -> AF + Send + 'static,
        AF: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(T) -> CF + Send + 'static,
        CF: Future<Output = Result<(), E>> + Send + 'static,
    {
        Self {
            name: callable_name::<A>().map(Cow::Borrowed),
            action: Box::new(move || action().boxed()),
            compensation: Box::new(move |result| compensation(result).boxed()),
            binding: CompensationBinding::ResultFirst,
        }
    }

    /// A step whose compensation receives the action's result followed by
    /// `extra`.
    #[must_use]
    pub fn with_compensation_args<A, AF, C, CF, X>(action: A, compensation: C, extra: X) -> Self
    where
        A: FnOnce() -> AF + Send + 'static,
        AF: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(T, X) -> CF + Send + 'static,
        CF: Future<Output = Result<(), E>> + Send + 'static,
        X: Send + 'static,
    {
        Self {
            name: callable_name::<A>().map(Cow::Borrowed),
            action: Box::new(move || action().boxed()),
            compensation: Box::new(move |result| compensation(result, extra).boxed()),
            binding: CompensationBinding::ResultFirst,
        }
    }

    /// A step whose compensation receives `args` in place of the action's
    /// result.
    #[must_use]
    pub fn with_compensation_override<A, AF, C, CF, X>(action: A, compensation: C, args: X) -> Self
    where
        A: FnOnce() -> AF + Send + 'static,
        AF: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(X) -> CF + Send + 'static,
        CF: Future<Output = Result<(), E>> + Send + 'static,
        X: Send + 'static,
    {
        Self {
            name: callable_name::<A>().map(Cow::Borrowed),
            action: Box::new(move || action().boxed()),
            compensation: Box::new(move |_result: T| compensation(args).boxed()),
            binding: CompensationBinding::Override,
        }
    }

    /// Set the diagnostic name of the step.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Explicit or derived name; `None` means the configured anonymous
    /// sentinel is recorded.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// How the compensation receives its arguments.
    #[must_use]
    pub fn binding(&self) -> CompensationBinding {
        self.binding
    }
}

impl<T, E> From<Step<T, E>> for AsyncStep<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn from(step: Step<T, E>) -> Self {
        let Step {
            name,
            action,
            compensation,
            binding,
        } = step;
        Self {
            name,
            action: Box::new(move || future::ready(action()).boxed()),
            compensation: Box::new(move |result| future::ready(compensation(result)).boxed()),
            binding,
        }
    }
}

/// Read-only description of a step that completed its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
    index: usize,
    name: String,
    binding: CompensationBinding,
}

impl StepInfo {
    pub(crate) fn new(index: usize, name: String, binding: CompensationBinding) -> Self {
        Self {
            index,
            name,
            binding,
        }
    }

    /// Zero-based position in execution order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name recorded for the step.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binding its compensation was recorded with.
    #[must_use]
    pub fn binding(&self) -> CompensationBinding {
        self.binding
    }
}

/// Name of a plain `fn` item, `None` for closures and other unnameable types.
pub(crate) fn callable_name<F>() -> Option<&'static str> {
    let full = type_name::<F>();
    if full.contains(['{', '<', '(', ' ', '&']) {
        return None;
    }
    full.rsplit("::").next().filter(|name| !name.is_empty())
}
