use std::path::Path;
use anyhow::{Result, anyhow};
use log::{debug, error, info};
use tokio::process::Command;

// @module: Audio track extraction via ffmpeg

/// Extracts a mono mp3 audio track from a video or audio source.
///
/// This is a thin subprocess wrapper: ffmpeg does all the work, invoked with
/// a fixed codec and the configured bitrate. The binary path is configurable
/// for systems where ffmpeg is not on PATH.
pub struct AudioExtractor {
    ffmpeg_path: String,
    bitrate: u32,
}

impl AudioExtractor {
    /// Create an extractor using the given ffmpeg binary and bitrate in bps
    pub fn new(ffmpeg_path: impl Into<String>, bitrate: u32) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            bitrate,
        }
    }

    /// Extract the audio track of `input` to `output` as mono mp3.
    ///
    /// The ffmpeg invocation is bounded by a timeout so a wedged process on a
    /// damaged container cannot hang the pipeline.
    pub async fn extract<P: AsRef<Path>>(&self, input: P, output: P) -> Result<()> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }

        info!(
            "Extracting {} kbps mono audio from {:?}",
            self.bitrate / 1000,
            input
        );
        debug!("Using ffmpeg binary at: {}", self.ffmpeg_path);

        let bitrate = self.bitrate.to_string();
        let ffmpeg_future = Command::new(&self.ffmpeg_path)
            .args([
                "-y",
                "-loglevel",
                "error",
                "-i",
                input.to_str().unwrap_or_default(),
                "-f",
                "mp3",
                "-ab",
                &bitrate,
                "-ac",
                "1", // mono, transcription backends expect a single channel
                "-vn",
                output.to_str().unwrap_or_default(),
            ])
            .output();

        let timeout_duration = std::time::Duration::from_secs(600);
        let result = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| anyhow!("Failed to execute ffmpeg for audio extraction: {}", e))?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(anyhow!("ffmpeg audio extraction timed out after 10 minutes"));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("Audio extraction failed: {}", filtered);
            return Err(anyhow!("ffmpeg extraction failed: {}", filtered));
        }

        let file_size = std::fs::metadata(output)?.len();
        if file_size == 0 {
            return Err(anyhow!("Extracted audio file is empty: {:?}", output));
        }

        debug!("Wrote {} bytes of audio to {:?}", file_size, output);
        Ok(())
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let dominated_prefixes = [
        "ffmpeg version",
        "  built with",
        "  configuration:",
        "  lib",
        "Input #",
        "  Metadata:",
        "  Duration:",
        "  Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim_end();
            if trimmed.trim().is_empty() {
                return false;
            }
            !dominated_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
