use thiserror::Error;
use tokio::task::JoinError;

/// A required field was absent or carried the wrong JSON type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{path}' missing or not {expected}")]
pub struct FieldError {
    pub path: String,
    pub expected: &'static str,
}

impl FieldError {
    pub fn new<S: Into<String>>(path: S, expected: &'static str) -> Self {
        FieldError {
            path: path.into(),
            expected,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("HTTP request failed for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("Response from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },
    #[error("Unexpected upstream shape: {0}")]
    Field(#[from] FieldError),
    #[error("Filesystem I/O error: {0}")]
    Io(String),
    #[error("JSON serialization error: {0}")]
    SerdeSerialize(String),
    #[error("Invalid argument provided: {0}")]
    Argument(String),
    #[error("Tokio task join error: {0}")]
    JoinError(String),
    #[error("Semaphore acquisition error: {0}")]
    SemaphoreAcquire(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        let url = e
            .url()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unknown>".to_string());
        AppError::Transport {
            url,
            message: e.to_string(),
        }
    }
}
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::SerdeSerialize(e.to_string())
    }
}
impl From<JoinError> for AppError {
    fn from(e: JoinError) -> Self {
        AppError::JoinError(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn transport<S: Into<String>>(url: &str, message: S) -> AppError {
        AppError::Transport {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn decode<S: Into<String>>(url: &str, message: S) -> AppError {
        AppError::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Errors that only drop one unit of work; everything else ends the run.
    pub fn is_unit_local(&self) -> bool {
        matches!(
            self,
            AppError::Transport { .. } | AppError::Decode { .. } | AppError::Field(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_renders_path_and_type() {
        let e = FieldError::new("models[0].skus[1].price", "number");
        assert_eq!(
            e.to_string(),
            "field 'models[0].skus[1].price' missing or not number"
        );
    }

    #[test]
    fn only_crawl_errors_are_unit_local() {
        assert!(AppError::transport("http://x", "boom").is_unit_local());
        assert!(AppError::decode("http://x", "not json").is_unit_local());
        assert!(AppError::from(FieldError::new("care", "string")).is_unit_local());
        assert!(!AppError::Io("disk full".into()).is_unit_local());
        assert!(!AppError::SerdeSerialize("bad".into()).is_unit_local());
    }
}
