use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::Rng;
use uuid::Uuid;

use crate::errors::{BackendError, TranscriptionError};
use crate::providers::{JobRequest, JobStatus, TranscriptionBackend};
use crate::transcript::Transcript;

// @module: Transcription job lifecycle management

/// Local state of a transcription job.
///
/// `Pending` and `InProgress` are the only states from which polling
/// continues; `Completed` and `Failed` are terminal and never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Submitted, not yet picked up by the backend
    Pending,
    /// The backend is actively transcribing
    InProgress,
    /// Terminal: transcript available
    Completed,
    /// Terminal: the backend gave up
    Failed,
}

impl JobState {
    /// Whether the job has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One submitted transcription request, tracked through to completion or
/// failure. Owned exclusively by the orchestrator; state transitions happen
/// only in response to polling results.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique job identifier, generated at submission
    pub id: String,

    /// Current lifecycle state
    pub state: JobState,

    /// Storage locator of the audio object being transcribed
    pub source_uri: String,

    /// Submission time; the wall-clock timeout budget is measured from here,
    /// not from the start of the current process
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Apply a backend-reported status to the local state machine.
    ///
    /// Terminal states are sticky and a Queued report never moves an
    /// InProgress job backwards.
    fn observe(&mut self, status: &JobStatus) {
        if self.state.is_terminal() {
            return;
        }
        match status {
            JobStatus::Queued => {}
            JobStatus::InProgress => self.state = JobState::InProgress,
            JobStatus::Completed { .. } => self.state = JobState::Completed,
            JobStatus::Failed { .. } => self.state = JobState::Failed,
        }
    }
}

/// Clock abstraction so polling is testable without wall-clock delays.
///
/// The system implementation suspends via tokio's timer, releasing the task
/// between polls instead of occupying a worker thread.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by tokio's timer
#[derive(Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clock that advances instantly on every sleep
#[derive(Debug)]
pub struct MockClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl MockClock {
    /// Create a mock clock starting at the current time
    pub fn new() -> Self {
        Self {
            now: std::sync::Mutex::new(Utc::now()),
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
    }
}

/// Polling behavior knobs
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed interval between status polls
    pub poll_interval: Duration,

    /// Overall wall-clock budget, measured from submission
    pub timeout: Duration,

    /// Consecutive transient poll failures tolerated before giving up
    pub max_transient_retries: u32,

    /// Base delay for exponential backoff after a transient failure
    pub backoff_base: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
            max_transient_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Owns the transcription job lifecycle: submission, polling with backoff,
/// timeout handling and transcript retrieval.
///
/// Cancellation note: dropping the `await_completion` future stops polling
/// immediately but makes no attempt to cancel the job at the backend — the
/// remote job is left to finish or fail on its own.
pub struct JobOrchestrator {
    backend: Arc<dyn TranscriptionBackend>,
    clock: Arc<dyn Clock>,
    config: PollConfig,
    language_code: String,
}

impl JobOrchestrator {
    /// Create an orchestrator over the given backend with the system clock
    pub fn new(backend: Arc<dyn TranscriptionBackend>, config: PollConfig, language_code: impl Into<String>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock), config, language_code)
    }

    /// Create an orchestrator with an explicit clock (used by tests)
    pub fn with_clock(
        backend: Arc<dyn TranscriptionBackend>,
        clock: Arc<dyn Clock>,
        config: PollConfig,
        language_code: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            clock,
            config,
            language_code: language_code.into(),
        }
    }

    /// Generate a practically unique job id.
    ///
    /// Timestamp plus a random suffix, never a plain counter, so concurrent
    /// submissions within the same millisecond cannot collide at the backend.
    pub fn generate_job_id() -> String {
        format!(
            "srtgen-{}-{}",
            Utc::now().timestamp(),
            Uuid::new_v4().simple()
        )
    }

    /// Submit a new transcription job for an already-uploaded audio object.
    ///
    /// Backend rejections (bad permissions, malformed reference, quota) are
    /// surfaced as `TranscriptionError::Submission` and never retried, since
    /// they indicate a non-transient configuration problem.
    pub async fn submit(&self, audio_uri: &str, media_format: &str) -> Result<Job, TranscriptionError> {
        let job_id = Self::generate_job_id();
        let request = JobRequest {
            job_id: job_id.clone(),
            media_uri: audio_uri.to_string(),
            language_code: self.language_code.clone(),
            media_format: media_format.to_string(),
        };

        info!("Submitting transcription job {}", job_id);
        self.backend
            .start_job(&request)
            .await
            .map_err(TranscriptionError::Submission)?;

        Ok(Job {
            id: job_id,
            state: JobState::Pending,
            source_uri: audio_uri.to_string(),
            created_at: self.clock.now(),
        })
    }

    /// Poll the backend until the job reaches a terminal state, then return
    /// the parsed transcript or the failure.
    ///
    /// Transient poll errors are retried with exponential backoff up to the
    /// configured budget; a successful poll resets the budget. The overall
    /// timeout is wall-clock from `job.created_at`.
    pub async fn await_completion(&self, job: &mut Job) -> Result<Transcript, TranscriptionError> {
        if job.state == JobState::Failed {
            return Err(TranscriptionError::JobFailed {
                job_id: job.id.clone(),
                reason: "job already observed as failed".to_string(),
            });
        }

        let mut transient_failures: u32 = 0;

        loop {
            let elapsed = self.elapsed_since(job.created_at);
            if elapsed >= self.config.timeout {
                warn!(
                    "Job {} still {:?} after {:?}, giving up locally (the job may yet complete server-side)",
                    job.id, job.state, elapsed
                );
                return Err(TranscriptionError::Timeout {
                    job_id: job.id.clone(),
                    elapsed,
                });
            }

            match self.backend.get_job_status(&job.id).await {
                Ok(status) => {
                    transient_failures = 0;
                    job.observe(&status);
                    match status {
                        JobStatus::Queued | JobStatus::InProgress => {
                            debug!("Job {} is {:?}, polling again in {:?}", job.id, job.state, self.config.poll_interval);
                            self.clock.sleep(self.config.poll_interval).await;
                        }
                        JobStatus::Completed { transcript_uri } => {
                            info!("Job {} completed after {:?}", job.id, elapsed);
                            return self.retrieve_transcript(job, &transcript_uri).await;
                        }
                        JobStatus::Failed { reason } => {
                            return Err(TranscriptionError::JobFailed {
                                job_id: job.id.clone(),
                                reason,
                            });
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    transient_failures += 1;
                    if transient_failures > self.config.max_transient_retries {
                        return Err(TranscriptionError::PollRetriesExhausted {
                            job_id: job.id.clone(),
                            attempts: transient_failures,
                            source: e,
                        });
                    }
                    let delay = self.backoff_delay(transient_failures);
                    warn!(
                        "Transient error polling job {} (attempt {}/{}), retrying in {:?}: {}",
                        job.id, transient_failures, self.config.max_transient_retries, delay, e
                    );
                    self.clock.sleep(delay).await;
                }
                Err(e) => {
                    return Err(TranscriptionError::PollRetriesExhausted {
                        job_id: job.id.clone(),
                        attempts: transient_failures + 1,
                        source: e,
                    });
                }
            }
        }
    }

    /// Convenience wrapper: submit and wait in one call
    pub async fn transcribe(&self, audio_uri: &str, media_format: &str) -> Result<Transcript, TranscriptionError> {
        let mut job = self.submit(audio_uri, media_format).await?;
        self.await_completion(&mut job).await
    }

    /// Download and parse the transcript payload, retrying transient fetch
    /// failures under the same bounded backoff as status polls
    async fn retrieve_transcript(
        &self,
        job: &Job,
        transcript_uri: &str,
    ) -> Result<Transcript, TranscriptionError> {
        let mut attempts: u32 = 0;
        let payload = loop {
            match self.backend.fetch_transcript(transcript_uri).await {
                Ok(payload) => break payload,
                Err(e) if e.is_transient() && attempts < self.config.max_transient_retries => {
                    attempts += 1;
                    let delay = self.backoff_delay(attempts);
                    warn!(
                        "Transient error fetching transcript for job {} (attempt {}/{}), retrying in {:?}: {}",
                        job.id, attempts, self.config.max_transient_retries, delay, e
                    );
                    self.clock.sleep(delay).await;
                }
                Err(e) => {
                    return Err(TranscriptionError::PollRetriesExhausted {
                        job_id: job.id.clone(),
                        attempts: attempts + 1,
                        source: e,
                    });
                }
            }
        };

        let words = self
            .backend
            .parse_transcript_payload(&payload)
            .map_err(|e| match e {
                BackendError::ParseError(msg) => TranscriptionError::MalformedTranscript(msg),
                other => TranscriptionError::MalformedTranscript(other.to_string()),
            })?;

        debug!("Parsed {} words for job {}", words.len(), job.id);
        Ok(Transcript::new(words))
    }

    fn elapsed_since(&self, created_at: DateTime<Utc>) -> Duration {
        (self.clock.now() - created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Exponential backoff with jitter, capped at 30 seconds
    fn backoff_delay(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(8);
        let base = self.config.backoff_base.saturating_mul(1 << exp);
        let capped = base.min(Duration::from_secs(30));
        let jitter_ms = rand::rng().random_range(0..250);
        capped + Duration::from_millis(jitter_ms)
    }
}
