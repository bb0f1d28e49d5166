use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by an embedding or completion provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider rate limit exceeded: {body}")]
    RateLimited { body: String },

    #[error("provider unavailable (status {status}): {body}")]
    Unavailable { status: u16, body: String },

    #[error("provider call timed out")]
    Timeout,

    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited { body },
            500..=599 => Self::Unavailable { status, body },
            _ => Self::Status { status, body },
        }
    }

    /// Rate limits and transient failures. The core never retries; callers may.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Unavailable { .. } | Self::Timeout | Self::Transport(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl Clone for PersistenceError {
    fn clone(&self) -> Self {
        match self {
            Self::Io { path, source } => Self::Io {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::Corrupt { path, reason } => Self::Corrupt {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::Storage(reason) => Self::Storage(reason.clone()),
        }
    }
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Everything that can fail at the request boundary.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
