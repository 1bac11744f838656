use std::fmt::Debug;

/// Hooks invoked at the lifecycle points of a saga run.
///
/// All methods default to no-ops. Install an observer with
/// `with_observer` on any coordinator front-end. Logging through `tracing`
/// happens regardless of the installed observer.
pub trait SagaObserver: Send {
    /// An action is about to run.
    fn step_started(&mut self, index: usize, name: &str) {
        let _ = (index, name);
    }

    /// An action completed and its step was recorded.
    fn step_succeeded(&mut self, index: usize, name: &str) {
        let _ = (index, name);
    }

    /// An action failed; nothing was recorded for it.
    fn step_failed(&mut self, index: usize, name: &str, error: &dyn Debug) {
        let _ = (index, name, error);
    }

    /// Unwind is starting for `steps` recorded steps.
    fn compensation_started(&mut self, steps: usize) {
        let _ = steps;
    }

    /// One compensation finished.
    fn step_compensated(&mut self, index: usize, name: &str, outcome: Result<(), &dyn Debug>) {
        let _ = (index, name, outcome);
    }

    /// Unwind finished; `failures` compensations returned an error.
    fn compensation_finished(&mut self, failures: usize) {
        let _ = failures;
    }
}
