//! Error types for the brigade library.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Comprehensive error type for all brigade operations.
#[derive(Error, Debug)]
pub enum KitchenError {
    /// No session is stored under the given ID
    #[error("Session '{id}' not found")]
    SessionNotFound { id: String },
    /// The chef is not part of the session
    #[error("Chef '{chef}' not found")]
    ChefNotFound { chef: String },
    /// No instruction (or no chef task) references the given index
    #[error("Instruction {index} not found")]
    InstructionNotFound { index: usize },
    /// Operation is not valid given the current task or lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Attempted to create a session under an ID that is already taken
    #[error("Session '{id}' already exists")]
    Conflict { id: String },
    /// The scheduler proved there is no schedule below the upper bound
    #[error("No feasible schedule with a horizon below {upper_bound} minutes")]
    Infeasible { upper_bound: u32 },
    /// Every probe that could have succeeded ran out of time
    #[error("Scheduler timed out after {}ms per probe without finding a schedule", .per_probe.as_millis())]
    Timeout { per_probe: Duration },
    /// Malformed machine specification or scheduling inputs
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Coarse classification of [`KitchenError`] used by transports to pick a
/// failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Validation,
    Conflict,
    Infeasible,
    Timeout,
    Configuration,
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code for this kind of failure.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidState | ErrorKind::Validation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Infeasible => 422,
            ErrorKind::Timeout => 504,
            ErrorKind::Configuration | ErrorKind::Internal => 500,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> KitchenError {
        KitchenError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl KitchenError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        KitchenError::InvalidState {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        KitchenError::Configuration {
            message: message.into(),
        }
    }

    /// Classifies the error for transport-level reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KitchenError::SessionNotFound { .. }
            | KitchenError::ChefNotFound { .. }
            | KitchenError::InstructionNotFound { .. } => ErrorKind::NotFound,
            KitchenError::InvalidState { .. } => ErrorKind::InvalidState,
            KitchenError::InvalidInput { .. } | KitchenError::Serialization { .. } => {
                ErrorKind::Validation
            }
            KitchenError::Conflict { .. } => ErrorKind::Conflict,
            KitchenError::Infeasible { .. } => ErrorKind::Infeasible,
            KitchenError::Timeout { .. } => ErrorKind::Timeout,
            KitchenError::Configuration { .. } => ErrorKind::Configuration,
            KitchenError::FileSystem { .. } => ErrorKind::Internal,
        }
    }
}

/// Extension trait for Result to provide concise error mapping with
/// anyhow-style context.
pub trait ResultExt<T, E> {
    /// Add context to any error type, converting to KitchenError.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| KitchenError::Configuration {
            message: format!("{}: {}", context, e),
        })
    }
}

/// Result type alias for brigade operations
pub type Result<T> = std::result::Result<T, KitchenError>;
