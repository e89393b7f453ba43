use thiserror::Error;

/// Pool statistics client error types
#[derive(Error, Debug)]
pub enum PoolStatsError {
    #[error("request timed out")]
    Timeout,

    #[error("pool API unreachable: {0}")]
    Unreachable(String),

    #[error("pool API returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("startup health probe failed: {0}")]
    SetupProbeFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PoolStatsError {
    /// Copyable tag for this error, used in coordinator failure records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Timeout,
            Self::Unreachable(_) => ErrorKind::Unreachable,
            Self::HttpStatus(_) => ErrorKind::HttpStatus,
            Self::MalformedBody(_) => ErrorKind::MalformedBody,
            Self::SetupProbeFailed(_) => ErrorKind::SetupProbeFailed,
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
        }
    }
}

/// Error category without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Unreachable,
    HttpStatus,
    MalformedBody,
    SetupProbeFailed,
    InvalidConfiguration,
}

pub type Result<T> = std::result::Result<T, PoolStatsError>;
