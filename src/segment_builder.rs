use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::SegmentationError;
use crate::srt_formatter::Cue;
use crate::transcript::Word;

// @module: Word-to-cue segmentation

/// Tunable thresholds for grouping words into subtitle cues.
///
/// The defaults are reasonable reading-speed heuristics, not hard constants;
/// every field can be overridden through the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentConfig {
    /// Maximum characters on one rendered line
    #[serde(default = "default_max_chars_per_line")]
    pub max_chars_per_line: usize,

    /// Maximum rendered lines in one cue
    #[serde(default = "default_max_lines_per_cue")]
    pub max_lines_per_cue: usize,

    /// Maximum span of one cue in seconds
    #[serde(default = "default_max_cue_duration")]
    pub max_cue_duration: f64,

    /// Minimum display time in seconds; short cues are extended up to this
    /// as long as they do not overlap the next cue
    #[serde(default = "default_min_cue_duration")]
    pub min_cue_duration: f64,

    /// Words separated by less than this many seconds stay in the same cue
    /// if the size limits allow
    #[serde(default = "default_max_gap_to_merge")]
    pub max_gap_to_merge: f64,
}

fn default_max_chars_per_line() -> usize {
    42
}

fn default_max_lines_per_cue() -> usize {
    2
}

fn default_max_cue_duration() -> f64 {
    7.0
}

fn default_min_cue_duration() -> f64 {
    1.0
}

fn default_max_gap_to_merge() -> f64 {
    0.75
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chars_per_line: default_max_chars_per_line(),
            max_lines_per_cue: default_max_lines_per_cue(),
            max_cue_duration: default_max_cue_duration(),
            min_cue_duration: default_min_cue_duration(),
            max_gap_to_merge: default_max_gap_to_merge(),
        }
    }
}

impl SegmentConfig {
    /// Reject configurations no input data could satisfy.
    ///
    /// This is the only error segmentation ever raises; messy timing in the
    /// words themselves is clamped, never rejected.
    pub fn validate(&self) -> Result<(), SegmentationError> {
        if self.max_chars_per_line == 0 {
            return Err(SegmentationError::InvalidConfig(
                "max_chars_per_line must be at least 1".to_string(),
            ));
        }
        if self.max_lines_per_cue == 0 {
            return Err(SegmentationError::InvalidConfig(
                "max_lines_per_cue must be at least 1".to_string(),
            ));
        }
        if !self.max_cue_duration.is_finite() || self.max_cue_duration <= 0.0 {
            return Err(SegmentationError::InvalidConfig(format!(
                "max_cue_duration must be positive, got {}",
                self.max_cue_duration
            )));
        }
        if !self.min_cue_duration.is_finite() || self.min_cue_duration < 0.0 {
            return Err(SegmentationError::InvalidConfig(format!(
                "min_cue_duration must not be negative, got {}",
                self.min_cue_duration
            )));
        }
        if !self.max_gap_to_merge.is_finite() || self.max_gap_to_merge < 0.0 {
            return Err(SegmentationError::InvalidConfig(format!(
                "max_gap_to_merge must not be negative, got {}",
                self.max_gap_to_merge
            )));
        }
        Ok(())
    }
}

/// Groups a flat word sequence into subtitle-sized cues under the configured
/// length and duration constraints
pub struct SegmentBuilder {
    config: SegmentConfig,
}

impl SegmentBuilder {
    /// Create a builder after validating the configuration
    pub fn new(config: SegmentConfig) -> Result<Self, SegmentationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Group words into cues.
    ///
    /// Greedy accumulation: a cue is closed when the gap to the next word
    /// exceeds `max_gap_to_merge`, when adding the word would need more
    /// wrapped lines than `max_lines_per_cue`, or when it would stretch the
    /// cue past `max_cue_duration`. Words are never split. Zero words yield
    /// zero cues. Indices are assigned 1-based after all boundaries and the
    /// minimum-duration pass are final.
    pub fn build(&self, words: &[Word]) -> Vec<Cue> {
        if words.is_empty() {
            return Vec::new();
        }

        let mut cues: Vec<Cue> = Vec::new();
        let mut current: Vec<Word> = Vec::new();
        let mut cue_start = 0.0_f64;
        let mut cue_end = 0.0_f64;

        for word in words {
            // Clamp inverted timings to zero length rather than failing
            let mut word = word.clone();
            if word.end_time < word.start_time {
                warn!(
                    "Word '{}' has end {} before start {}, clamping to zero length",
                    word.text, word.end_time, word.start_time
                );
                word.end_time = word.start_time;
            }

            if word.text.is_empty() {
                continue;
            }

            if current.is_empty() {
                cue_start = word.start_time;
                cue_end = word.end_time;
                current.push(word);
                continue;
            }

            let gap = (word.start_time - cue_end).max(0.0);
            let span = word.end_time.max(cue_end) - cue_start;

            let fits = gap <= self.config.max_gap_to_merge
                && span <= self.config.max_cue_duration
                && self.fits_in_lines(&current, &word);

            if fits {
                cue_end = cue_end.max(word.end_time);
                current.push(word);
            } else {
                cues.push(self.close_cue(&current, cue_start, cue_end));
                cue_start = word.start_time;
                cue_end = word.end_time;
                current = vec![word];
            }
        }

        if !current.is_empty() {
            cues.push(self.close_cue(&current, cue_start, cue_end));
        }

        self.normalize_timing(&mut cues);

        for (i, cue) in cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }

        debug!("Segmented {} words into {} cues", words.len(), cues.len());
        cues
    }

    /// Whether the current words plus one more still wrap into the allowed
    /// number of lines
    fn fits_in_lines(&self, current: &[Word], next: &Word) -> bool {
        let mut texts: Vec<&str> = current.iter().map(|w| w.text.as_str()).collect();
        texts.push(next.text.as_str());
        wrap_words(&texts, self.config.max_chars_per_line).len() <= self.config.max_lines_per_cue
    }

    fn close_cue(&self, words: &[Word], start: f64, end: f64) -> Cue {
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        Cue {
            index: 0,
            start_time: start,
            end_time: end.max(start),
            lines: wrap_words(&texts, self.config.max_chars_per_line),
        }
    }

    /// Final timing pass: forbid overlap between consecutive cues, then
    /// extend cues shorter than `min_cue_duration` as far as the next cue's
    /// start allows. A cue left short rather than overlapping is correct.
    fn normalize_timing(&self, cues: &mut [Cue]) {
        for i in 1..cues.len() {
            let prev_start = cues[i - 1].start_time;
            let prev_end = cues[i - 1].end_time;
            let cue = &mut cues[i];
            if cue.start_time < prev_end {
                cue.start_time = prev_end;
            }
            // Starts must strictly increase even for degenerate zero-length runs
            if cue.start_time <= prev_start {
                cue.start_time = prev_start + 0.001;
            }
            if cue.end_time < cue.start_time {
                cue.end_time = cue.start_time;
            }
        }

        for i in 0..cues.len() {
            let duration = cues[i].end_time - cues[i].start_time;
            if duration >= self.config.min_cue_duration {
                continue;
            }
            let desired_end = cues[i].start_time + self.config.min_cue_duration;
            let limit = cues
                .get(i + 1)
                .map(|next| next.start_time)
                .unwrap_or(f64::INFINITY);
            let extended = desired_end.min(limit);
            if extended > cues[i].end_time {
                cues[i].end_time = extended;
            }
        }
    }
}

/// Pack words into lines left-to-right, each at most `max_chars` characters.
///
/// Never splits inside a word: a single word longer than `max_chars` occupies
/// its own line unsplit, not truncated or hyphenated.
pub fn wrap_words(words: &[&str], max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in words {
        if line.is_empty() {
            line.push_str(word);
        } else if line.chars().count() + 1 + word.chars().count() <= max_chars {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}
