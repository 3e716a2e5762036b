use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::BackendError;
use crate::providers::{JobRequest, JobStatus, TranscriptionBackend};
use crate::transcript::Word;

/// HTTP client for an AWS-Transcribe-shaped REST service.
///
/// The service exposes job submission and status endpoints; completed jobs
/// hand back a transcript locator from which the JSON payload is downloaded.
#[derive(Debug)]
pub struct TranscribeHttp {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (optional, sent as bearer token when set)
    api_key: String,
    /// Service endpoint URL
    endpoint: String,
}

/// Job submission request body
#[derive(Debug, Serialize)]
struct StartJobBody<'a> {
    /// Unique job name chosen by the caller
    job_name: &'a str,

    /// Storage locator of the uploaded audio object
    media_uri: &'a str,

    /// Output language hint
    language_code: &'a str,

    /// Container format of the audio object
    media_format: &'a str,
}

/// Job status response body
#[derive(Debug, Deserialize)]
struct JobStatusBody {
    /// One of QUEUED, IN_PROGRESS, COMPLETED, FAILED
    status: String,

    /// Locator of the transcript payload, present once COMPLETED
    #[serde(default)]
    transcript_file_uri: Option<String>,

    /// Failure reason, present once FAILED
    #[serde(default)]
    failure_reason: Option<String>,
}

/// Transcript payload wire schema (AWS Transcribe JSON)
#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    items: Vec<TranscriptItem>,
}

/// One recognized item: a timed pronunciation or an untimed punctuation mark
#[derive(Debug, Deserialize)]
struct TranscriptItem {
    #[serde(rename = "type")]
    item_type: String,

    #[serde(default)]
    start_time: Option<String>,

    #[serde(default)]
    end_time: Option<String>,

    alternatives: Vec<TranscriptAlternative>,
}

#[derive(Debug, Deserialize)]
struct TranscriptAlternative {
    content: String,

    #[serde(default)]
    confidence: Option<String>,
}

impl TranscribeHttp {
    /// Create a new client for the given endpoint
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.endpoint.trim_end_matches('/'))
    }

    fn job_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{}", self.endpoint.trim_end_matches('/'), job_id)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }

    /// Map a non-success HTTP response to a backend error
    async fn error_from_response(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("Transcription API error ({}): {}", status, message);
        match status.as_u16() {
            401 | 403 => BackendError::AuthenticationError(message),
            429 => BackendError::Throttled(message),
            code => BackendError::ApiError {
                status_code: code,
                message,
            },
        }
    }
}

#[async_trait]
impl TranscriptionBackend for TranscribeHttp {
    async fn start_job(&self, request: &JobRequest) -> Result<(), BackendError> {
        let body = StartJobBody {
            job_name: &request.job_id,
            media_uri: &request.media_uri,
            language_code: &request.language_code,
            media_format: &request.media_format,
        };

        debug!("Submitting transcription job {} for {}", request.job_id, request.media_uri);

        let response = self
            .authorize(self.client.post(self.jobs_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| connection_or_request_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }

    async fn get_job_status(&self, job_id: &str) -> Result<JobStatus, BackendError> {
        let response = self
            .authorize(self.client.get(self.job_url(job_id)))
            .send()
            .await
            .map_err(|e| connection_or_request_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response
            .json::<JobStatusBody>()
            .await
            .map_err(|e| BackendError::ParseError(format!("job status response: {}", e)))?;

        match body.status.as_str() {
            "QUEUED" => Ok(JobStatus::Queued),
            "IN_PROGRESS" => Ok(JobStatus::InProgress),
            "COMPLETED" => {
                let transcript_uri = body.transcript_file_uri.ok_or_else(|| {
                    BackendError::ParseError(
                        "COMPLETED status without a transcript locator".to_string(),
                    )
                })?;
                Ok(JobStatus::Completed { transcript_uri })
            }
            "FAILED" => Ok(JobStatus::Failed {
                reason: body
                    .failure_reason
                    .unwrap_or_else(|| "no failure reason reported".to_string()),
            }),
            other => Err(BackendError::ParseError(format!(
                "unknown job status: {}",
                other
            ))),
        }
    }

    async fn fetch_transcript(&self, transcript_uri: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .get(transcript_uri)
            .send()
            .await
            .map_err(|e| connection_or_request_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .text()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("reading transcript body: {}", e)))
    }
}

fn connection_or_request_error(error: &reqwest::Error) -> BackendError {
    if error.is_connect() || error.is_timeout() {
        BackendError::ConnectionError(error.to_string())
    } else {
        BackendError::RequestFailed(error.to_string())
    }
}

/// Parse a transcript payload into the word sequence.
///
/// The payload follows the Transcribe JSON schema: `results.items` is a flat
/// list of `pronunciation` items (timed, with confidence) interleaved with
/// `punctuation` items (untimed). Punctuation is appended to the text of the
/// preceding word so cues never start with a stray comma or period; a leading
/// punctuation item with no preceding word is dropped.
pub fn parse_transcript(payload: &str) -> Result<Vec<Word>, BackendError> {
    let parsed: TranscriptPayload = serde_json::from_str(payload)
        .map_err(|e| BackendError::ParseError(format!("transcript payload: {}", e)))?;

    let mut words: Vec<Word> = Vec::with_capacity(parsed.results.items.len());

    for (i, item) in parsed.results.items.iter().enumerate() {
        let alternative = item
            .alternatives
            .first()
            .ok_or_else(|| BackendError::ParseError(format!("item {} has no alternatives", i)))?;

        match item.item_type.as_str() {
            "pronunciation" => {
                let start_time = parse_seconds(item.start_time.as_deref(), i, "start_time")?;
                let end_time = parse_seconds(item.end_time.as_deref(), i, "end_time")?;
                let confidence = alternative
                    .confidence
                    .as_deref()
                    .map(|c| {
                        c.parse::<f64>().map_err(|_| {
                            BackendError::ParseError(format!(
                                "item {} has non-numeric confidence: {}",
                                i, c
                            ))
                        })
                    })
                    .transpose()?
                    .unwrap_or(0.0);

                words.push(Word::new(
                    alternative.content.clone(),
                    start_time,
                    end_time,
                    confidence,
                ));
            }
            "punctuation" => {
                if let Some(last) = words.last_mut() {
                    last.text.push_str(&alternative.content);
                } else {
                    debug!("Dropping leading punctuation item: {}", alternative.content);
                }
            }
            other => {
                return Err(BackendError::ParseError(format!(
                    "item {} has unknown type: {}",
                    i, other
                )));
            }
        }
    }

    Ok(words)
}

fn parse_seconds(value: Option<&str>, index: usize, field: &str) -> Result<f64, BackendError> {
    let raw = value.ok_or_else(|| {
        BackendError::ParseError(format!("pronunciation item {} missing {}", index, field))
    })?;
    raw.parse::<f64>().map_err(|_| {
        BackendError::ParseError(format!(
            "pronunciation item {} has non-numeric {}: {}",
            index, field, raw
        ))
    })
}
