use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::audio_extractor::AudioExtractor;
use crate::file_utils::FileManager;
use crate::job_orchestrator::{Clock, JobOrchestrator, PollConfig, SystemClock};
use crate::providers::TranscriptionBackend;
use crate::providers::transcribe_http::TranscribeHttp;
use crate::segment_builder::SegmentBuilder;
use crate::srt_formatter::SubtitleDocument;
use crate::storage::{ObjectStore, PresignedUrlStore};

// @module: Application controller, the pipeline composition root

/// Main application controller for subtitle generation.
///
/// Sequences the pipeline: audio extraction, upload, transcription job
/// lifecycle, segmentation, SRT rendering, and the final all-or-nothing
/// write. Each invocation is one independent unit of work; running several
/// controllers concurrently is safe because every job gets a distinct id.
pub struct Controller {
    // @field: App configuration
    config: Config,
    backend: Arc<dyn TranscriptionBackend>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let backend: Arc<dyn TranscriptionBackend> = Arc::new(TranscribeHttp::new(
            config.backend.endpoint.clone(),
            config.backend.api_key.clone(),
        ));
        let store: Arc<dyn ObjectStore> =
            Arc::new(PresignedUrlStore::new(config.storage.endpoint.clone()));
        Self::with_components(config, backend, store, Arc::new(SystemClock))
    }

    /// Create a controller with explicit collaborators (used by tests and by
    /// the already-uploaded-audio mode)
    pub fn with_components(
        config: Config,
        backend: Arc<dyn TranscriptionBackend>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            backend,
            store,
            clock,
        })
    }

    /// Run the full pipeline for a local video/audio file.
    ///
    /// `output_path` of `None` writes the rendered SRT to stdout. When
    /// `audio_output` is not given, the extracted mp3 lives in a temporary
    /// directory removed on completion.
    pub async fn run(
        &self,
        input_file: &Path,
        output_path: Option<&Path>,
        force_overwrite: bool,
        audio_output: Option<&Path>,
    ) -> Result<()> {
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        if let Some(output) = output_path {
            if FileManager::file_exists(output) && !force_overwrite {
                warn!(
                    "Output file already exists: {:?}. Use -f to force overwrite.",
                    output
                );
                return Ok(());
            }
        }

        let document = self.generate_document(input_file, audio_output).await?;
        self.write_document(&document, output_path)
    }

    /// Run the pipeline for audio that is already uploaded to object storage,
    /// skipping extraction and upload
    pub async fn run_remote(
        &self,
        media_uri: &str,
        media_format: &str,
        output_path: Option<&Path>,
        force_overwrite: bool,
    ) -> Result<()> {
        if let Some(output) = output_path {
            if FileManager::file_exists(output) && !force_overwrite {
                warn!(
                    "Output file already exists: {:?}. Use -f to force overwrite.",
                    output
                );
                return Ok(());
            }
        }

        let document = self.transcribe_and_segment(media_uri, media_format).await?;
        self.write_document(&document, output_path)
    }

    /// Extract, upload and transcribe a local file into a subtitle document
    async fn generate_document(
        &self,
        input_file: &Path,
        audio_output: Option<&Path>,
    ) -> Result<SubtitleDocument> {
        let start_time = std::time::Instant::now();

        // Extract into the requested path, or a tempdir cleaned up on drop
        let temp_dir;
        let audio_path = match audio_output {
            Some(path) => path.to_path_buf(),
            None => {
                temp_dir = tempfile::TempDir::new().context("Failed to create temp directory")?;
                let stem = input_file
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "audio".to_string());
                temp_dir
                    .path()
                    .join(format!("{}_{}.mp3", stem, chrono::Utc::now().timestamp()))
            }
        };

        let extractor = AudioExtractor::new(
            self.config.audio.ffmpeg_path.clone(),
            self.config.audio.bitrate,
        );
        extractor.extract(input_file, &audio_path).await?;

        let media_uri = self
            .store
            .upload(&audio_path)
            .await
            .context("Failed to upload extracted audio")?;
        info!(
            "Audio uploaded as {} ({} bps mono)",
            media_uri, self.config.audio.bitrate
        );

        let document = self.transcribe_and_segment(&media_uri, "mp3").await?;

        info!(
            "Generated {} cues in {:.1}s",
            document.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(document)
    }

    /// Transcribe an uploaded audio object and segment the words into cues
    async fn transcribe_and_segment(
        &self,
        media_uri: &str,
        media_format: &str,
    ) -> Result<SubtitleDocument> {
        let orchestrator = JobOrchestrator::with_clock(
            Arc::clone(&self.backend),
            Arc::clone(&self.clock),
            self.poll_config(),
            self.config.language_code.clone(),
        );

        let transcript = orchestrator.transcribe(media_uri, media_format).await?;
        if transcript.is_empty() {
            warn!("Transcription produced no words; the subtitle file will be empty");
        }

        let segmenter = SegmentBuilder::new(self.config.segmentation.clone())?;
        let cues = segmenter.build(transcript.words());
        Ok(SubtitleDocument::new(cues))
    }

    /// Render and write the document. Rendering happens fully before any
    /// byte is written, so a failure never leaves a partial subtitle file.
    fn write_document(&self, document: &SubtitleDocument, output_path: Option<&Path>) -> Result<()> {
        let rendered = document.render();

        match output_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        FileManager::ensure_dir(parent)?;
                    }
                }
                std::fs::write(path, rendered)
                    .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
                info!("Wrote {} cues to {:?}", document.len(), path);
            }
            None => {
                let mut stdout = std::io::stdout();
                stdout
                    .write_all(rendered.as_bytes())
                    .context("Failed to write subtitles to stdout")?;
            }
        }

        Ok(())
    }

    fn poll_config(&self) -> PollConfig {
        PollConfig {
            poll_interval: std::time::Duration::from_secs(self.config.backend.poll_interval_secs),
            timeout: std::time::Duration::from_secs(self.config.backend.timeout_secs),
            max_transient_retries: self.config.backend.max_transient_retries,
            ..PollConfig::default()
        }
    }
}
