/*!
 * Error types for the inscriptor pipeline.
 *
 * Provider-level failures are recovered by the fallback chain and only logged.
 * Everything else (missing records, exhausted chains, store failures) is
 * surfaced to the caller as a `StageFailure` naming the stage that failed.
 */

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::Stage;
use crate::providers::Capability;

/// Classification of a single provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Credential rejected or missing on the provider side
    Unauthorized,
    /// Provider asked us to slow down
    RateLimited,
    /// Call exceeded its time bound
    Timeout,
    /// Provider answered but the payload could not be used
    MalformedResponse,
    /// Provider unreachable or failing (5xx, connection refused, ...)
    Unavailable,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::Timeout => "timeout",
            Self::MalformedResponse => "malformed response",
            Self::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

/// Error returned by a provider client for one call
#[derive(Error, Debug, Clone)]
#[error("{provider}: {kind}: {message}")]
pub struct ProviderError {
    /// Name of the provider that failed
    pub provider: String,
    /// Failure classification used by the fallback chain
    pub kind: ProviderErrorKind,
    /// Diagnostic detail, only ever logged
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Unauthorized, message)
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::RateLimited, message)
    }

    pub fn timeout(provider: impl Into<String>, after: Duration) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::MalformedResponse, message)
    }

    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Unavailable, message)
    }
}

/// Errors produced by the fallback chain executor
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    /// Every configured provider failed (or none was configured) and the
    /// capability has no offline generator
    #[error("No provider available for {capability} ({} attempt(s) failed)", .failures.len())]
    NoProviderAvailable {
        capability: Capability,
        failures: Vec<ProviderError>,
    },
}

/// Errors from the record store or the binary object store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Writing or reading a binary object failed
    #[error("Object store error: {0}")]
    Object(String),

    /// The relational record store failed
    #[error("Record store error: {0}")]
    Record(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(error: anyhow::Error) -> Self {
        Self::Record(format!("{:#}", error))
    }
}

/// Flat classification of pipeline errors, for callers that only branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    InvalidInput,
    NotFound,
    NoProviderAvailable,
    StorageError,
}

/// Errors surfaced by a pipeline invocation
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Missing or blank caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request rejected before any stage ran
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced upload or translation does not exist for this caller
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A capability's chain was exhausted
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Store read/write failure; nothing partial was committed
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Chain(ChainError::NoProviderAvailable { .. }) => ErrorKind::NoProviderAvailable,
            Self::Storage(_) => ErrorKind::StorageError,
        }
    }
}

/// Terminal failure of one pipeline invocation
#[derive(Error, Debug, Clone)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    /// Stage the invocation was in when it failed
    pub stage: Stage,
    /// Underlying cause
    #[source]
    pub error: PipelineError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Main application error type used by the CLI
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pipeline invocation failed
    #[error(transparent)]
    Pipeline(#[from] StageFailure),

    /// A request outside the two pipeline flows was rejected
    #[error(transparent)]
    Request(#[from] PipelineError),

    /// A store operation outside the pipeline failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
