//! Result of a single extraction or injection step.

/// Outcome of one extractor/injector call.
///
/// A failure never carries data; a success always does.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome<T> {
    Success(T),
    Failure { message: String },
}

impl<T> OperationOutcome<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        OperationOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            OperationOutcome::Success(data) => Some(data),
            OperationOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            OperationOutcome::Success(_) => None,
            OperationOutcome::Failure { message } => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationOutcome<U> {
        match self {
            OperationOutcome::Success(data) => OperationOutcome::Success(f(data)),
            OperationOutcome::Failure { message } => OperationOutcome::Failure { message },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            OperationOutcome::Success(data) => Ok(data),
            OperationOutcome::Failure { message } => Err(message),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for OperationOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => OperationOutcome::Success(data),
            Err(e) => OperationOutcome::failure(e.to_string()),
        }
    }
}
