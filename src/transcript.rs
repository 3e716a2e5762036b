use std::fmt;

// @module: Word-level transcript data model

/// A single recognized word with its timing and confidence.
///
/// Times are in seconds from the start of the audio source. The backend
/// guarantees `start_time <= end_time` and non-decreasing starts across a
/// transcript, but consumers must tolerate violations defensively: the
/// segmenter clamps a word whose end precedes its start to zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// The recognized text, including any trailing punctuation
    pub text: String,

    /// Start of the word in seconds
    pub start_time: f64,

    /// End of the word in seconds
    pub end_time: f64,

    /// Recognition confidence in [0, 1]
    pub confidence: f64,
}

impl Word {
    /// Create a new word
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64, confidence: f64) -> Self {
        Word {
            text: text.into(),
            start_time,
            end_time,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Duration of the word in seconds, clamped to zero for inverted timings
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// The full ordered set of recognized words for one audio source.
///
/// Produced once per successful transcription job and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Transcript {
    words: Vec<Word>,
}

impl Transcript {
    /// Create a transcript from an ordered word sequence
    pub fn new(words: Vec<Word>) -> Self {
        Transcript { words }
    }

    /// The recognized words in source order
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Number of recognized words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the audio produced no recognized words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// End time of the last word, or zero for an empty transcript
    pub fn duration(&self) -> f64 {
        self.words.last().map_or(0.0, |w| w.end_time.max(w.start_time))
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Transcript")?;
        writeln!(f, "Words: {}", self.words.len())?;
        writeln!(f, "Duration: {:.3}s", self.duration())?;
        Ok(())
    }
}
