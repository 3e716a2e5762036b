/*!
 * Tests for the transcription job lifecycle
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use srtgen::errors::{BackendError, TranscriptionError};
use srtgen::job_orchestrator::{Clock, JobOrchestrator, JobState, MockClock, PollConfig};
use srtgen::providers::mock::{MockBackend, PollOutcome};
use srtgen::providers::JobStatus;
use crate::common;

fn orchestrator(backend: MockBackend, config: PollConfig) -> JobOrchestrator {
    JobOrchestrator::with_clock(
        Arc::new(backend),
        Arc::new(MockClock::new()),
        config,
        "en-US",
    )
}

fn fast_config() -> PollConfig {
    PollConfig {
        poll_interval: Duration::from_secs(5),
        timeout: Duration::from_secs(600),
        max_transient_retries: 3,
        backoff_base: Duration::from_millis(1),
    }
}

/// A job that goes Pending, InProgress, InProgress, Completed yields the
/// parsed transcript
#[tokio::test]
async fn test_await_completion_withEventualSuccess_shouldReturnTranscript() {
    let payload = common::transcript_payload(&[("Hello", 0.0, 0.4), ("world", 0.5, 0.9)]);
    let backend = MockBackend::completing_after(2, payload);
    let orchestrator = orchestrator(backend, fast_config());

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.source_uri, "s3://bucket/audio.mp3");

    let transcript = orchestrator.await_completion(&mut job).await.unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.words()[0].text, "Hello");
    assert_eq!(transcript.words()[1].end_time, 0.9);
}

/// A backend-reported failure surfaces the reason verbatim
#[tokio::test]
async fn test_await_completion_withBackendFailure_shouldCarryReason() {
    let backend = MockBackend::failing_with("BadAudio");
    let orchestrator = orchestrator(backend, fast_config());

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let error = orchestrator.await_completion(&mut job).await.unwrap_err();

    assert_eq!(job.state, JobState::Failed);
    match error {
        TranscriptionError::JobFailed { reason, job_id } => {
            assert_eq!(reason, "BadAudio");
            assert_eq!(job_id, job.id);
        }
        other => panic!("expected JobFailed, got {:?}", other),
    }
}

/// A job stuck InProgress past the wall-clock budget yields a timeout that
/// names the job and the elapsed time
#[tokio::test]
async fn test_await_completion_withStuckJob_shouldTimeOut() {
    let backend = MockBackend::never_completing();
    let config = PollConfig {
        timeout: Duration::from_secs(12),
        ..fast_config()
    };
    let orchestrator = orchestrator(backend, config);

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let error = orchestrator.await_completion(&mut job).await.unwrap_err();

    match error {
        TranscriptionError::Timeout { job_id, elapsed } => {
            assert_eq!(job_id, job.id);
            assert!(elapsed >= Duration::from_secs(12));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
    // Timing out locally does not mark the job failed
    assert_eq!(job.state, JobState::InProgress);
}

/// Transient poll errors are retried and do not fail the wait once the
/// backend recovers
#[tokio::test]
async fn test_await_completion_withTransientBlips_shouldRecover() {
    let payload = common::transcript_payload(&[("ok", 0.0, 0.5)]);
    let backend = MockBackend::with_script(
        vec![
            PollOutcome::Error(BackendError::ConnectionError("reset".to_string())),
            PollOutcome::Error(BackendError::Throttled("slow down".to_string())),
            PollOutcome::Status(JobStatus::InProgress),
            PollOutcome::Status(JobStatus::Completed {
                transcript_uri: "mock://transcript".to_string(),
            }),
        ],
        payload,
    );
    let orchestrator = orchestrator(backend, fast_config());

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let transcript = orchestrator.await_completion(&mut job).await.unwrap();
    assert_eq!(transcript.len(), 1);
}

/// More consecutive transient failures than the budget allows escalate to a
/// hard failure
#[tokio::test]
async fn test_await_completion_withPersistentBlips_shouldExhaustRetries() {
    let backend = MockBackend::with_script(
        vec![PollOutcome::Error(BackendError::ConnectionError(
            "down".to_string(),
        ))],
        "",
    );
    let orchestrator = orchestrator(backend, fast_config());

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let error = orchestrator.await_completion(&mut job).await.unwrap_err();

    match error {
        TranscriptionError::PollRetriesExhausted { attempts, .. } => {
            assert_eq!(attempts, 4);
        }
        other => panic!("expected PollRetriesExhausted, got {:?}", other),
    }
}

/// A non-transient poll error is not retried
#[tokio::test]
async fn test_await_completion_withAuthError_shouldFailImmediately() {
    let backend = MockBackend::with_script(
        vec![PollOutcome::Error(BackendError::AuthenticationError(
            "bad key".to_string(),
        ))],
        "",
    );
    let orchestrator = orchestrator(backend, fast_config());

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let error = orchestrator.await_completion(&mut job).await.unwrap_err();

    match error {
        TranscriptionError::PollRetriesExhausted { attempts, .. } => assert_eq!(attempts, 1),
        other => panic!("expected immediate escalation, got {:?}", other),
    }
}

/// A rejected submission is surfaced as a Submission error and never retried
#[tokio::test]
async fn test_submit_withRejectingBackend_shouldNotRetry() {
    let backend = Arc::new(MockBackend::rejecting_submission());
    let orchestrator = JobOrchestrator::with_clock(
        Arc::clone(&backend) as Arc<dyn srtgen::providers::TranscriptionBackend>,
        Arc::new(MockClock::new()),
        fast_config(),
        "en-US",
    );

    let error = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap_err();
    assert!(matches!(error, TranscriptionError::Submission(_)));
    assert_eq!(backend.submission_count(), 1);
}

/// Completed transcript payloads that fail to parse are a contract violation
#[tokio::test]
async fn test_await_completion_withGarbagePayload_shouldReportMalformedTranscript() {
    let backend = MockBackend::completing_after(0, "not json at all");
    let orchestrator = orchestrator(backend, fast_config());

    let mut job = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let error = orchestrator.await_completion(&mut job).await.unwrap_err();

    assert!(matches!(error, TranscriptionError::MalformedTranscript(_)));
}

/// Submitting the same audio twice yields distinct job ids even within the
/// same instant
#[tokio::test]
async fn test_submit_withSameAudioTwice_shouldGenerateDistinctIds() {
    let payload = common::transcript_payload(&[("x", 0.0, 0.1)]);
    let backend = Arc::new(MockBackend::completing_after(0, payload));
    let orchestrator = JobOrchestrator::with_clock(
        Arc::clone(&backend) as Arc<dyn srtgen::providers::TranscriptionBackend>,
        Arc::new(MockClock::new()),
        fast_config(),
        "en-US",
    );

    let first = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();
    let second = orchestrator.submit("s3://bucket/audio.mp3", "mp3").await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(backend.submitted_ids().len(), 2);
}

/// Id generation is collision-free across a burst of calls
#[test]
fn test_generate_job_id_withBurst_shouldNeverCollide() {
    let ids: HashSet<String> = (0..1000).map(|_| JobOrchestrator::generate_job_id()).collect();
    assert_eq!(ids.len(), 1000);
}

/// The mock clock advances its reading instantly on sleep instead of waiting
#[test]
fn test_mock_clock_withSleep_shouldAdvanceWithoutWaiting() {
    let clock = MockClock::new();
    let before = clock.now();

    tokio_test::block_on(clock.sleep(Duration::from_secs(42)));

    let advanced = (clock.now() - before).to_std().unwrap();
    assert!(advanced >= Duration::from_secs(42));
}
