/*!
 * Error types for the textpipe application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: transport-level failures reported by a provider client
 * - `GenerationError`: the classified failure of a single generation call
 * - `PipelineError`: failures that abort a whole pipeline run
 * - `AppError`: top-level wrapper for code embedding the library
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::ApiError {
                status_code: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Classified failure of one generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No response within the service's own limits
    #[error("Timeout: the service took too long to respond ({0})")]
    Timeout(String),

    /// The service could not be reached
    #[error("Connection failure: cannot reach the generation service ({0})")]
    ConnectionFailure(String),

    /// The service answered with an application-level failure (e.g. unknown model)
    #[error("Service error: {0}")]
    ServiceError(String),

    /// The service answered, but the payload could not be interpreted
    #[error("Unexpected response shape: {0}")]
    ResponseShapeError(String),

    /// Anything that fits no other class
    #[error("Unknown failure: {0}")]
    UnknownFailure(String),
}

impl GenerationError {
    /// Tag used in the placeholder text that replaces a failed chunk
    pub fn placeholder_tag(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "TIMEOUT ERROR",
            Self::ConnectionFailure(_) => "CONNECTION ERROR",
            Self::ServiceError(_) => "PROCESSING FAILED",
            Self::ResponseShapeError(_) => "INVALID RESPONSE",
            Self::UnknownFailure(_) => "ERROR",
        }
    }
}

impl From<ProviderError> for GenerationError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Timeout(msg) => Self::Timeout(msg),
            ProviderError::ConnectionError(msg) => Self::ConnectionFailure(msg),
            ProviderError::ApiError { status_code, message } => {
                Self::ServiceError(format!("{} - {}", status_code, message))
            }
            ProviderError::ParseError(msg) => Self::ResponseShapeError(msg),
            ProviderError::RequestFailed(msg) => Self::UnknownFailure(msg),
        }
    }
}

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A run is already active on this orchestrator
    #[error("A process is already running")]
    AlreadyRunning,

    /// The capability probe failed before any stage ran
    #[error("Cannot connect to the generation service: {0}")]
    Connection(GenerationError),

    /// The source document could not be read
    #[error("File reading error ({path}): {message}")]
    FileRead {
        /// Path of the source document
        path: PathBuf,
        /// Underlying I/O message
        message: String,
    },

    /// The final output could not be written
    #[error("File writing error ({path}): {message}")]
    FileWrite {
        /// Path of the output file
        path: PathBuf,
        /// Underlying I/O message
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a single generation call
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Error from a pipeline run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
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
