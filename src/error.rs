use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    StoreError(String),
    UpdaterError(String),
    TaskError(String),
    ExecutionError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::StoreError(msg) => write!(f, "Store error: {msg}"),
            CoreError::UpdaterError(msg) => write!(f, "Updater error: {msg}"),
            CoreError::TaskError(msg) => write!(f, "Task error: {msg}"),
            CoreError::ExecutionError(msg) => write!(f, "Execution error: {msg}"),
            CoreError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            CoreError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<crate::store::StoreError> for CoreError {
    fn from(err: crate::store::StoreError) -> Self {
        CoreError::StoreError(err.to_string())
    }
}

impl From<crate::updater::UpdaterError> for CoreError {
    fn from(err: crate::updater::UpdaterError) -> Self {
        CoreError::UpdaterError(err.to_string())
    }
}

impl From<crate::orchestration::TaskFailure> for CoreError {
    fn from(err: crate::orchestration::TaskFailure) -> Self {
        CoreError::TaskError(err.to_string())
    }
}
