/*!
 * Backend implementations for transcription services.
 *
 * This module contains client implementations for speech-to-text backends:
 * - TranscribeHttp: REST client for an AWS-Transcribe-shaped service
 * - Mock: scripted backend for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::BackendError;
use crate::transcript::Word;

/// Status of a transcription job as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// The job is queued and has not started processing
    Queued,
    /// The backend is actively transcribing
    InProgress,
    /// Transcription finished; the transcript payload can be fetched
    /// from the contained locator
    Completed {
        /// Locator (URL) of the transcript payload
        transcript_uri: String,
    },
    /// The backend gave up on the job
    Failed {
        /// Failure reason as reported by the backend
        reason: String,
    },
}

/// Parameters for starting a transcription job
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Unique job name, generated by the orchestrator
    pub job_id: String,

    /// Storage locator of the already-uploaded audio object
    pub media_uri: String,

    /// Output language hint, e.g. "en-US"
    pub language_code: String,

    /// Container format of the uploaded audio, e.g. "mp3"
    pub media_format: String,
}

/// Common trait for all transcription backends
///
/// This trait is the seam between the job orchestrator and the managed
/// speech-to-text service: the rest of the crate depends only on it and on
/// the parsed `Word` sequence, never on the backend's wire schema.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync + Debug {
    /// Start a transcription job referencing an already-uploaded audio object
    ///
    /// # Arguments
    /// * `request` - Job name, media locator and format hints
    ///
    /// # Returns
    /// * `Result<(), BackendError>` - Ok once the backend accepted the job
    async fn start_job(&self, request: &JobRequest) -> Result<(), BackendError>;

    /// Fetch the current status of a previously started job
    async fn get_job_status(&self, job_id: &str) -> Result<JobStatus, BackendError>;

    /// Download the raw transcript payload from its locator
    ///
    /// The payload is backend-specific text; parsing it into words is the
    /// concern of the concrete adapter (see `parse_transcript_payload`).
    async fn fetch_transcript(&self, transcript_uri: &str) -> Result<String, BackendError>;

    /// Parse a raw transcript payload into the word sequence.
    ///
    /// The default implementation understands the Transcribe JSON schema;
    /// a backend with a different wire format overrides this so callers only
    /// ever see `Word`s.
    fn parse_transcript_payload(&self, payload: &str) -> Result<Vec<Word>, BackendError> {
        transcribe_http::parse_transcript(payload)
    }
}

pub mod mock;
pub mod transcribe_http;
