/*!
 * Error types for the srtgen application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the transcription backend API
#[derive(Error, Debug)]
pub enum BackendError {
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

    /// Error related to rate limiting / throttling
    #[error("Request throttled: {0}")]
    Throttled(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl BackendError {
    /// Whether a poll that failed with this error may be retried.
    ///
    /// Network blips, throttling and server-side errors are transient;
    /// authentication and client-side API errors are configuration problems
    /// and retrying them would only hide the root cause.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::Throttled(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur over the lifetime of a transcription job
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The backend rejected the job submission. Submission failures indicate a
    /// configuration or permission problem and are never retried.
    #[error("Job submission rejected: {0}")]
    Submission(#[source] BackendError),

    /// The backend reported the job as failed, reason passed through verbatim
    #[error("Transcription job {job_id} failed: {reason}")]
    JobFailed {
        /// Identifier of the failed job
        job_id: String,
        /// Failure reason as reported by the backend
        reason: String,
    },

    /// The local wait exceeded its budget. The job may still complete
    /// server-side; the caller decides whether to poll again or abandon.
    #[error("Timed out waiting for job {job_id} after {elapsed:?}")]
    Timeout {
        /// Identifier of the job that was being awaited
        job_id: String,
        /// Wall-clock time spent waiting, measured from submission
        elapsed: Duration,
    },

    /// Consecutive transient poll failures exhausted the retry budget
    #[error("Polling job {job_id} failed after {attempts} attempts: {source}")]
    PollRetriesExhausted {
        /// Identifier of the job that was being polled
        job_id: String,
        /// Number of consecutive failed attempts
        attempts: u32,
        /// The last transient error observed
        source: BackendError,
    },

    /// The transcript payload could not be parsed into a word sequence,
    /// which indicates a backend contract change
    #[error("Malformed transcript payload: {0}")]
    MalformedTranscript(String),
}

/// Errors that can occur during cue segmentation.
///
/// Only raised for programmer-error configuration; messy timing data in the
/// input is clamped rather than rejected.
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// A segmentation limit was zero or negative
    #[error("Invalid segmentation config: {0}")]
    InvalidConfig(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the backend client
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Error from the transcription job lifecycle
    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Error from cue segmentation
    #[error("Segmentation error: {0}")]
    Segmentation(#[from] SegmentationError),

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
