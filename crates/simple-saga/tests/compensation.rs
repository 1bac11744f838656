//! Integration tests for compensation order and argument binding.

use std::sync::{Arc, Mutex};

use simple_saga::{AsyncStep, CompensationBinding, Saga, SagaState, Step, SyncSaga};

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

type Log<T> = Arc<Mutex<Vec<T>>>;

fn entries<T: Clone>(log: &Log<T>) -> Vec<T> {
    log.lock().expect("log lock").clone()
}

fn tracked(log: &Log<i32>, value: i32) -> Step<i32, TestError> {
    let log = Arc::clone(log);
    Step::new(
        move || Ok(value),
        move |result| {
            log.lock().expect("log lock").push(result);
            Ok(())
        },
    )
}

fn failing<T: Clone + Send + 'static>(message: &str) -> Step<T, TestError> {
    let message = message.to_string();
    Step::new(move || Err(TestError(message)), |_| Ok(()))
}

#[test]
fn full_success_never_compensates() -> anyhow::Result<()> {
    let log = Log::default();
    let mut saga = SyncSaga::new();

    saga.run(|session| {
        for value in 1..=3 {
            session.step(tracked(&log, value))?;
        }
        Ok(())
    })?;

    assert!(entries(&log).is_empty());
    assert_eq!(saga.ledger().len(), 3);
    assert_eq!(saga.state(), SagaState::ClosedClean);
    Ok(())
}

#[test]
fn compensation_happens_in_reverse_order() {
    let log = Log::default();
    let mut saga = SyncSaga::new();

    let result = saga.run(|session| {
        for value in 1..=3 {
            session.step(tracked(&log, value))?;
        }
        session.step(failing::<i32>("step 4 failed"))
    });

    assert_eq!(result, Err(TestError("step 4 failed".to_string())));
    assert_eq!(entries(&log), [3, 2, 1]);
    assert_eq!(saga.state(), SagaState::ClosedCompensated);
}

#[tokio::test]
async fn async_compensation_happens_in_reverse_order() {
    let log = Log::default();
    let mut saga = Saga::new();

    let result = saga
        .run(async |session| {
            for value in 1..=3 {
                let log = Arc::clone(&log);
                session
                    .step(AsyncStep::<i32, TestError>::new(
                        move || async move { Ok(value) },
                        move |result| async move {
                            tokio::task::yield_now().await;
                            log.lock().expect("log lock").push(result);
                            Ok(())
                        },
                    ))
                    .await?;
            }
            session.step(failing::<()>("async step 4 failed")).await
        })
        .await;

    assert_eq!(result, Err(TestError("async step 4 failed".to_string())));
    assert_eq!(entries(&log), [3, 2, 1]);
}

#[test]
fn first_step_failure_triggers_no_compensation() {
    let log = Log::default();
    let mut saga = SyncSaga::new();

    let result = saga.run(|session| {
        session.step(failing::<i32>("immediate failure"))?;
        session.step(tracked(&log, 1))
    });

    assert!(result.is_err());
    assert!(entries(&log).is_empty());
    assert!(saga.ledger().is_empty());
}

#[test]
fn compensation_receives_action_result_then_extra_args() {
    let log: Log<(i32, &'static str)> = Log::default();
    let sink = Arc::clone(&log);
    let mut saga = SyncSaga::new();

    let result = saga.run(|session| {
        session.step(Step::with_compensation_args(
            || Ok(100),
            move |result, extra| {
                sink.lock().expect("log lock").push((result, extra));
                Ok(())
            },
            "X",
        ))?;
        session.step(failing::<()>("next step failed"))
    });

    assert!(result.is_err());
    assert_eq!(entries(&log), [(100, "X")]);
    assert_eq!(
        saga.steps().map(|step| step.binding()).collect::<Vec<_>>(),
        [CompensationBinding::ResultFirst]
    );
}

#[derive(Debug, Clone, PartialEq)]
struct Release {
    warehouse: &'static str,
    quantity: u32,
}

#[test]
fn named_extra_args_are_passed_as_a_struct() {
    let log: Log<(String, Release)> = Log::default();
    let sink = Arc::clone(&log);
    let mut saga = SyncSaga::new();

    let result = saga.run(|session| {
        session.step(Step::with_compensation_args(
            || Ok("reservation-7".to_string()),
            move |reservation, release: Release| {
                sink.lock().expect("log lock").push((reservation, release));
                Ok(())
            },
            Release {
                warehouse: "east",
                quantity: 2,
            },
        ))?;
        session.step(failing::<()>("payment declined"))
    });

    assert!(result.is_err());
    assert_eq!(
        entries(&log),
        [(
            "reservation-7".to_string(),
            Release {
                warehouse: "east",
                quantity: 2
            }
        )]
    );
}

#[test]
fn explicit_override_replaces_action_result() {
    let log: Log<(&'static str, u32)> = Log::default();
    let sink = Arc::clone(&log);
    let mut saga = SyncSaga::new();

    let result = saga.run(|session| {
        session.step(Step::with_compensation_override(
            || Ok(100),
            move |args| {
                sink.lock().expect("log lock").push(args);
                Ok(())
            },
            ("order-1", 5),
        ))?;
        session.step(failing::<()>("boom"))
    });

    assert!(result.is_err());
    assert_eq!(entries(&log), [("order-1", 5)]);
    assert_eq!(
        saga.steps().next().map(|step| step.binding()),
        Some(CompensationBinding::Override)
    );
}

#[tokio::test]
async fn async_override_and_result_binding_mix_in_one_run() {
    let log: Log<String> = Log::default();
    let mut saga = Saga::new();

    let by_result = Arc::clone(&log);
    let by_override = Arc::clone(&log);
    let result = saga
        .run(async move |session| {
            session
                .step(AsyncStep::<i32, TestError>::with_compensation_args(
                    || async { Ok(7) },
                    move |result, extra: &'static str| async move {
                        by_result
                            .lock()
                            .expect("log lock")
                            .push(format!("result {result} {extra}"));
                        Ok(())
                    },
                    "extra",
                ))
                .await?;
            session
                .step(AsyncStep::<i32, TestError>::with_compensation_override(
                    || async { Ok(8) },
                    move |args: &'static str| async move {
                        by_override
                            .lock()
                            .expect("log lock")
                            .push(format!("override {args}"));
                        Ok(())
                    },
                    "explicit",
                ))
                .await?;
            session.step(failing::<()>("stop")).await
        })
        .await;

    assert!(result.is_err());
    assert_eq!(entries(&log), ["override explicit", "result 7 extra"]);
}

#[test]
fn unit_results_are_passed_to_compensation() {
    let log: Log<&'static str> = Log::default();
    let sink = Arc::clone(&log);
    let mut saga = SyncSaga::new();

    let result = saga.run(|session| {
        session.step(Step::new(
            || Ok(()),
            move |()| {
                sink.lock().expect("log lock").push("undo side effect");
                Ok(())
            },
        ))?;
        session.step(failing::<()>("fail"))
    });

    assert!(result.is_err());
    assert_eq!(entries(&log), ["undo side effect"]);
}
