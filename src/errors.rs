use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid options file {path}: {reason}")]
    InvalidConfigFile { path: String, reason: String },

    #[error("Couldn't find build file at path '{path}'")]
    FileNotFound { path: String },

    #[error("You can't use '{first}' and '{second}' options in one run")]
    ConflictingOptions { first: String, second: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Unexpected response from pgyer (HTTP {status}): {reason}")]
    Protocol { status: u16, reason: String },

    #[error("PGYER Plugin Error: {message}")]
    Service { code: i64, message: String },
}

/// Broad failure category, independent of the concrete cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Protocol,
    Service,
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::FileNotFound {
            path: path.to_string(),
        }
    }

    pub fn conflicting_options(first: &str, second: &str) -> Self {
        Self::ConflictingOptions {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn invalid_config_file(path: &str, reason: impl ToString) -> Self {
        Self::InvalidConfigFile {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn protocol(status: u16, reason: impl ToString) -> Self {
        Self::Protocol {
            status,
            reason: reason.to_string(),
        }
    }

    pub fn service(code: i64, message: &str) -> Self {
        Self::Service {
            code,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            // Reading the artifact is the only local IO, so it is an input problem.
            AppError::Io(_)
            | AppError::InvalidConfigFile { .. }
            | AppError::FileNotFound { .. }
            | AppError::ConflictingOptions { .. }
            | AppError::Validation { .. } => ErrorKind::Validation,
            AppError::Network(_) => ErrorKind::Network,
            AppError::Protocol { .. } => ErrorKind::Protocol,
            AppError::Service { .. } => ErrorKind::Service,
        }
    }

    /// Message reported by the service, if the failure came from it
    pub fn service_message(&self) -> Option<&str> {
        match self {
            AppError::Service { message, .. } => Some(message),
            _ => None,
        }
    }
}
