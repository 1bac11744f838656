use std::fmt::Debug;

use thiserror::Error;

/// Error from a failed compensation, captured during unwind.
#[derive(Debug, thiserror::Error)]
#[error("compensation failed for step {step_index} '{step}'")]
pub struct CompensationError<E> {
    /// Position of the step in execution order.
    pub step_index: usize,
    /// Name of the step whose compensation failed.
    pub step: String,
    /// The underlying error.
    #[source]
    pub error: E,
}

/// Detailed outcome of a failed saga run.
///
/// The original error is always kept intact; compensation errors are
/// attached for diagnostics only.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E: Debug> {
    /// The run failed and every compensation succeeded.
    #[error("{}", failure_message(failed_step.as_deref()))]
    StepFailed {
        /// Name of the step whose action failed, if a step raised the error.
        failed_step: Option<String>,
        /// The error that aborted the run.
        #[source]
        source: E,
    },

    /// The run failed and some compensations also failed.
    #[error(
        "{}, and {} compensation(s) also failed",
        failure_message(failed_step.as_deref()),
        compensation_errors.len()
    )]
    CompensationFailed {
        /// Name of the step whose action failed, if a step raised the error.
        failed_step: Option<String>,
        /// The error that aborted the run.
        #[source]
        source: E,
        /// Errors from failed compensations, in unwind order.
        compensation_errors: Vec<CompensationError<E>>,
    },
}

fn failure_message(failed_step: Option<&str>) -> String {
    match failed_step {
        Some(step) => format!("step '{step}' failed"),
        None => "saga body failed".to_string(),
    }
}

impl<E: Debug> SagaError<E> {
    pub(crate) fn new(
        failed_step: Option<String>,
        source: E,
        compensation_errors: Vec<CompensationError<E>>,
    ) -> Self {
        if compensation_errors.is_empty() {
            Self::StepFailed {
                failed_step,
                source,
            }
        } else {
            Self::CompensationFailed {
                failed_step,
                source,
                compensation_errors,
            }
        }
    }

    /// The error that aborted the run.
    #[must_use]
    pub fn source_error(&self) -> &E {
        match self {
            Self::StepFailed { source, .. } | Self::CompensationFailed { source, .. } => source,
        }
    }

    /// Name of the step whose action failed, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { failed_step, .. } | Self::CompensationFailed { failed_step, .. } => {
                failed_step.as_deref()
            }
        }
    }

    /// Compensation failures collected during unwind.
    #[must_use]
    pub fn compensation_errors(&self) -> &[CompensationError<E>] {
        match self {
            Self::StepFailed { .. } => &[],
            Self::CompensationFailed {
                compensation_errors,
                ..
            } => compensation_errors,
        }
    }

    /// Discard the diagnostics and recover the original error.
    pub fn into_source(self) -> E {
        match self {
            Self::StepFailed { source, .. } | Self::CompensationFailed { source, .. } => source,
        }
    }
}

/// Error from loading a [`SagaConfig`](crate::SagaConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid TOML or has unexpected keys.
    #[error("invalid saga configuration")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct TestError(&'static str);

    #[test]
    fn without_compensation_errors_builds_step_failed() {
        let err = SagaError::new(Some("charge".to_string()), TestError("declined"), Vec::new());

        assert!(matches!(err, SagaError::StepFailed { .. }));
        assert_eq!(err.to_string(), "step 'charge' failed");
        assert_eq!(err.failed_step(), Some("charge"));
        assert!(err.compensation_errors().is_empty());
        assert_eq!(err.into_source(), TestError("declined"));
    }

    #[test]
    fn with_compensation_errors_builds_compensation_failed() {
        let err = SagaError::new(
            None,
            TestError("boom"),
            vec![CompensationError {
                step_index: 1,
                step: "reserve".to_string(),
                error: TestError("release failed"),
            }],
        );

        assert_eq!(
            err.to_string(),
            "saga body failed, and 1 compensation(s) also failed"
        );
        assert_eq!(err.source_error(), &TestError("boom"));
        assert_eq!(err.compensation_errors()[0].step, "reserve");
    }

    #[test]
    fn source_chain_points_at_original_error() {
        let err = SagaError::new(Some("a".to_string()), TestError("root cause"), Vec::new());

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("root cause"));
    }

    #[test]
    fn compensation_error_display_names_step() {
        let err = CompensationError {
            step_index: 2,
            step: "ship".to_string(),
            error: TestError("carrier down"),
        };
        assert_eq!(err.to_string(), "compensation failed for step 2 'ship'");
    }
}
