use crate::{AppError, AppResult};

/// Collects validation failures so callers see every problem in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one failure message.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Records every message of a nested accumulator, prefixing each one.
    pub fn extend_with_prefix(&mut self, prefix: &str, other: ValidationErrors) {
        self.messages.extend(
            other
                .messages
                .into_iter()
                .map(|message| format!("{prefix}: {message}")),
        );
    }

    /// Returns true when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Records a failed check; validation messages are kept verbatim.
    pub fn push_error(&mut self, error: AppError) {
        match error {
            AppError::Validation(message) => self.messages.push(message),
            other => self.messages.push(other.to_string()),
        }
    }

    /// Converts the accumulator into `Ok(())` or one aggregated validation error.
    pub fn into_result(self) -> AppResult<()> {
        match self.messages.len() {
            0 => Ok(()),
            1 => Err(AppError::Validation(
                self.messages.into_iter().next().unwrap_or_default(),
            )),
            count => Err(AppError::Validation(format!(
                "{count} errors occurred: {}",
                self.messages.join("; ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::AppError;

    use super::ValidationErrors;

    #[test]
    fn empty_accumulator_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn single_failure_keeps_message_verbatim() {
        let mut errors = ValidationErrors::new();
        errors.push("role name is empty");

        match errors.into_result() {
            Err(AppError::Validation(message)) => assert_eq!(message, "role name is empty"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn multiple_failures_are_reported_together() {
        let mut nested = ValidationErrors::new();
        nested.push("operation 'hello' is not allowed");
        nested.push("operation 'world' is not allowed");

        let mut errors = ValidationErrors::new();
        errors.push("role id is empty");
        errors.extend_with_prefix("permission_targets[0]", nested);

        match errors.into_result() {
            Err(AppError::Validation(message)) => {
                assert!(message.starts_with("3 errors occurred"));
                assert!(message.contains("role id is empty"));
                assert!(
                    message.contains("permission_targets[0]: operation 'hello' is not allowed")
                );
                assert!(
                    message.contains("permission_targets[0]: operation 'world' is not allowed")
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn pushed_validation_errors_keep_their_message() {
        let mut errors = ValidationErrors::new();
        errors.push_error(AppError::Validation("operation 'x' is not allowed".to_owned()));
        errors.push_error(AppError::Internal("boom".to_owned()));

        match errors.into_result() {
            Err(AppError::Validation(message)) => assert_eq!(
                message,
                "2 errors occurred: operation 'x' is not allowed; internal error: boom"
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
