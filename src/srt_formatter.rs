use std::fmt;
use anyhow::{Result, anyhow};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

// @module: SRT document model and rendering

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2,}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

/// One subtitle display unit: a time range plus one or more lines of text
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// 1-based position in the final document
    pub index: usize,

    /// Display start in seconds
    pub start_time: f64,

    /// Display end in seconds
    pub end_time: f64,

    /// Wrapped text lines, top to bottom
    pub lines: Vec<String>,
}

impl Cue {
    /// Display duration in seconds
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// The cue text with lines joined by newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            format_timestamp(self.start_time),
            format_timestamp(self.end_time)
        )?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// An ordered sequence of cues ready to be rendered as an .srt file.
///
/// Contract: indices are 1-based and contiguous, start times strictly
/// increase cue-to-cue, and no two cues overlap in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDocument {
    cues: Vec<Cue>,
}

impl SubtitleDocument {
    /// Create a document, renumbering the cues 1-based in the given order
    pub fn new(mut cues: Vec<Cue>) -> Self {
        for (i, cue) in cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }
        SubtitleDocument { cues }
    }

    /// The cues in display order
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues in the document
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the document has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Render the document as SRT text.
    ///
    /// Each block is the cue index, the timestamp line, and the text lines.
    /// Exactly one blank line separates consecutive blocks; none trails the
    /// last one. An empty document renders as an empty string.
    pub fn render(&self) -> String {
        let blocks: Vec<String> = self
            .cues
            .iter()
            .map(|cue| {
                let mut block = format!(
                    "{}\n{} --> {}",
                    cue.index,
                    format_timestamp(cue.start_time),
                    format_timestamp(cue.end_time)
                );
                for line in &cue.lines {
                    block.push('\n');
                    block.push_str(line);
                }
                block
            })
            .collect();

        if blocks.is_empty() {
            String::new()
        } else {
            format!("{}\n", blocks.join("\n\n"))
        }
    }

    /// Parse SRT text back into a document.
    ///
    /// A conforming render round-trips: indices, millisecond timestamps and
    /// line text are all reconstructed exactly. Malformed blocks are skipped
    /// with a warning rather than aborting the whole parse.
    pub fn parse(content: &str) -> Result<Self> {
        let mut cues: Vec<Cue> = Vec::new();

        let mut current_index: Option<usize> = None;
        let mut current_times: Option<(f64, f64)> = None;
        let mut current_lines: Vec<String> = Vec::new();

        let mut flush = |index: &mut Option<usize>,
                         times: &mut Option<(f64, f64)>,
                         lines: &mut Vec<String>,
                         cues: &mut Vec<Cue>| {
            if let (Some(idx), Some((start, end))) = (index.take(), times.take()) {
                if lines.is_empty() {
                    warn!("Skipping cue {} with no text lines", idx);
                } else {
                    cues.push(Cue {
                        index: idx,
                        start_time: start,
                        end_time: end,
                        lines: std::mem::take(lines),
                    });
                }
            }
            lines.clear();
        };

        for line in content.lines() {
            let trimmed = line.trim_end_matches('\r');

            if trimmed.trim().is_empty() {
                flush(&mut current_index, &mut current_times, &mut current_lines, &mut cues);
                continue;
            }

            if current_index.is_none() && current_lines.is_empty() {
                if let Ok(num) = trimmed.trim().parse::<usize>() {
                    current_index = Some(num);
                    continue;
                }
            }

            if current_index.is_some() && current_times.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    let start = timestamp_ms(&caps, 1)? as f64 / 1000.0;
                    let end = timestamp_ms(&caps, 5)? as f64 / 1000.0;
                    current_times = Some((start, end));
                    continue;
                }
                return Err(anyhow!("Expected timestamp line, found: {}", trimmed));
            }

            if current_times.is_some() {
                current_lines.push(trimmed.to_string());
            } else {
                warn!("Ignoring text before any cue header: {}", trimmed);
            }
        }

        flush(&mut current_index, &mut current_times, &mut current_lines, &mut cues);

        Ok(SubtitleDocument { cues })
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Format seconds as an SRT timestamp `HH:MM:SS,mmm`.
///
/// Milliseconds are truncated, not rounded, so a rendered end time never
/// appears to exceed the source duration. The tiny epsilon only absorbs
/// binary float noise from values that are exact in milliseconds.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = ((seconds.max(0.0) * 1000.0) + 1e-6).floor() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an SRT timestamp to seconds
pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
    let parts: Vec<&str> = timestamp.split(&[':', ','][..]).collect();
    if parts.len() != 4 {
        return Err(anyhow!("Invalid timestamp format: {}", timestamp));
    }

    let hours: u64 = parts[0].parse()?;
    let minutes: u64 = parts[1].parse()?;
    let seconds: u64 = parts[2].parse()?;
    let millis: u64 = parts[3].parse()?;

    if minutes >= 60 || seconds >= 60 {
        return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
    }

    Ok((hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis) as f64 / 1000.0)
}

fn timestamp_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64> {
    let field = |i: usize| -> Result<u64> {
        caps.get(start_idx + i)
            .ok_or_else(|| anyhow!("Missing timestamp component"))?
            .as_str()
            .parse::<u64>()
            .map_err(|e| anyhow!("Invalid timestamp component: {}", e))
    };
    Ok(field(0)? * 3_600_000 + field(1)? * 60_000 + field(2)? * 1_000 + field(3)?)
}
