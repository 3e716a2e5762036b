/*!
 * Mock backend implementation for testing.
 *
 * This module provides a scripted backend that replays a fixed sequence of
 * poll outcomes, so the job lifecycle can be exercised without a network or
 * real wall-clock delays:
 * - `MockBackend::completing_after(n, payload)` - reports InProgress n times, then Completed
 * - `MockBackend::failing_with(reason)` - reports a terminal job failure
 * - `MockBackend::rejecting_submission()` - rejects the start call outright
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::BackendError;
use crate::providers::{JobRequest, JobStatus, TranscriptionBackend};

/// One scripted answer to a status poll
#[derive(Debug)]
pub enum PollOutcome {
    /// Report this status
    Status(JobStatus),
    /// Fail the poll with this error
    Error(BackendError),
}

/// Scripted transcription backend for testing job lifecycle behavior
#[derive(Debug)]
pub struct MockBackend {
    /// Whether start_job should be rejected
    reject_submission: bool,
    /// Scripted poll outcomes, consumed front to back; the last one repeats
    poll_script: Mutex<VecDeque<PollOutcome>>,
    /// Transcript payload served for any locator
    transcript_payload: String,
    /// Number of start_job calls observed
    submissions: AtomicUsize,
    /// Number of status polls observed
    polls: AtomicUsize,
    /// Job ids passed to start_job
    submitted_ids: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Create a mock that replays the given poll outcomes
    pub fn with_script(script: Vec<PollOutcome>, transcript_payload: impl Into<String>) -> Self {
        Self {
            reject_submission: false,
            poll_script: Mutex::new(script.into()),
            transcript_payload: transcript_payload.into(),
            submissions: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            submitted_ids: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that stays in progress for `polls` status calls and then
    /// completes with the given transcript payload
    pub fn completing_after(polls: usize, transcript_payload: impl Into<String>) -> Self {
        let mut script: Vec<PollOutcome> = vec![PollOutcome::Status(JobStatus::Queued)];
        script.extend((0..polls).map(|_| PollOutcome::Status(JobStatus::InProgress)));
        script.push(PollOutcome::Status(JobStatus::Completed {
            transcript_uri: "mock://transcript".to_string(),
        }));
        Self::with_script(script, transcript_payload)
    }

    /// Create a mock whose job terminates in failure with the given reason
    pub fn failing_with(reason: impl Into<String>) -> Self {
        Self::with_script(
            vec![
                PollOutcome::Status(JobStatus::InProgress),
                PollOutcome::Status(JobStatus::Failed {
                    reason: reason.into(),
                }),
            ],
            "",
        )
    }

    /// Create a mock that reports InProgress forever
    pub fn never_completing() -> Self {
        Self::with_script(vec![PollOutcome::Status(JobStatus::InProgress)], "")
    }

    /// Create a mock that rejects job submission
    pub fn rejecting_submission() -> Self {
        let mut mock = Self::with_script(Vec::new(), "");
        mock.reject_submission = true;
        mock
    }

    /// Number of status polls the mock has answered
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Number of submissions the mock has accepted or rejected
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Job ids seen by start_job, in submission order
    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptionBackend for MockBackend {
    async fn start_job(&self, request: &JobRequest) -> Result<(), BackendError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.submitted_ids
            .lock()
            .unwrap()
            .push(request.job_id.clone());

        if self.reject_submission {
            return Err(BackendError::ApiError {
                status_code: 403,
                message: "insufficient permissions for transcription".to_string(),
            });
        }
        Ok(())
    }

    async fn get_job_status(&self, _job_id: &str) -> Result<JobStatus, BackendError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        let mut script = self.poll_script.lock().unwrap();
        let outcome = if script.len() > 1 {
            script.pop_front().unwrap()
        } else if let Some(last) = script.front() {
            // Keep replaying the final outcome so timeout tests can poll freely
            match last {
                PollOutcome::Status(status) => PollOutcome::Status(status.clone()),
                PollOutcome::Error(e) => PollOutcome::Error(clone_error(e)),
            }
        } else {
            PollOutcome::Error(BackendError::RequestFailed(
                "mock poll script is empty".to_string(),
            ))
        };

        match outcome {
            PollOutcome::Status(status) => Ok(status),
            PollOutcome::Error(e) => Err(e),
        }
    }

    async fn fetch_transcript(&self, _transcript_uri: &str) -> Result<String, BackendError> {
        Ok(self.transcript_payload.clone())
    }
}

fn clone_error(error: &BackendError) -> BackendError {
    match error {
        BackendError::RequestFailed(m) => BackendError::RequestFailed(m.clone()),
        BackendError::ParseError(m) => BackendError::ParseError(m.clone()),
        BackendError::ApiError {
            status_code,
            message,
        } => BackendError::ApiError {
            status_code: *status_code,
            message: message.clone(),
        },
        BackendError::ConnectionError(m) => BackendError::ConnectionError(m.clone()),
        BackendError::Throttled(m) => BackendError::Throttled(m.clone()),
        BackendError::AuthenticationError(m) => BackendError::AuthenticationError(m.clone()),
    }
}
