/*!
 * # srtGen - Automatic Subtitle Generation
 *
 * A Rust library for turning video/audio files into SubRip (.srt) subtitle files
 * using a managed speech-to-text backend.
 *
 * ## Features
 *
 * - Extract a mono audio track from video files via ffmpeg
 * - Upload audio through a presigned-URL storage service
 * - Submit and track transcription jobs with polling, backoff and timeouts
 * - Group word-level recognition output into readable, correctly timed cues
 * - Render and parse the .srt subtitle format
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `transcript`: Word-level transcript data model
 * - `job_orchestrator`: Transcription job lifecycle (submit, poll, timeout)
 * - `segment_builder`: Word-to-cue segmentation under size/duration limits
 * - `srt_formatter`: SRT document model, rendering and parsing
 * - `audio_extractor`: ffmpeg subprocess wrapper
 * - `storage`: Audio object upload collaborator
 * - `app_controller`: Pipeline composition root
 * - `providers`: Transcription backend clients:
 *   - `providers::transcribe_http`: REST client for the transcription service
 *   - `providers::mock`: Scripted backend for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio_extractor;
pub mod errors;
pub mod file_utils;
pub mod job_orchestrator;
pub mod providers;
pub mod segment_builder;
pub mod srt_formatter;
pub mod storage;
pub mod transcript;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, BackendError, SegmentationError, TranscriptionError};
pub use job_orchestrator::{Job, JobOrchestrator, JobState};
pub use segment_builder::{SegmentBuilder, SegmentConfig};
pub use srt_formatter::{Cue, SubtitleDocument};
pub use transcript::{Transcript, Word};
