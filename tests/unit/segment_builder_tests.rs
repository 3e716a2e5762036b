/*!
 * Tests for word-to-cue segmentation
 */

use srtgen::segment_builder::{SegmentBuilder, SegmentConfig, wrap_words};
use srtgen::transcript::Word;
use crate::common;

fn builder() -> SegmentBuilder {
    SegmentBuilder::new(SegmentConfig::default()).unwrap()
}

/// Two closely spaced words form a single cue extended to the minimum duration
#[test]
fn test_build_withTwoCloseWords_shouldProduceSingleExtendedCue() {
    let words = common::words(&[("Hello", 0.0, 0.4), ("world", 0.5, 0.9)]);
    let cues = builder().build(&words);

    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].index, 1);
    assert_eq!(cues[0].start_time, 0.0);
    assert!(cues[0].end_time >= 1.0, "short cue should be extended to min_cue_duration");
    assert_eq!(cues[0].lines, vec!["Hello world".to_string()]);
}

/// A silence gap larger than max_gap_to_merge forces a cue boundary even
/// though the size limits would allow merging
#[test]
fn test_build_withLargeGap_shouldStartNewCue() {
    let words = common::words(&[("before", 0.0, 0.5), ("after", 2.5, 3.0)]);
    let cues = builder().build(&words);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].lines, vec!["before".to_string()]);
    assert_eq!(cues[1].lines, vec!["after".to_string()]);
    assert_eq!(cues[1].start_time, 2.5);
}

/// Zero words is not an error, it is an empty cue sequence
#[test]
fn test_build_withNoWords_shouldProduceNoCues() {
    let cues = builder().build(&[]);
    assert!(cues.is_empty());
}

/// Wrapped lines never exceed max_chars_per_line unless a single word does
#[test]
fn test_build_withManyWords_shouldRespectLineLength() {
    let mut entries = Vec::new();
    let mut t = 0.0;
    for i in 0..40 {
        let text = format!("word{:02}", i);
        entries.push((text, t, t + 0.2));
        t += 0.3;
    }
    let words: Vec<Word> = entries
        .iter()
        .map(|(text, start, end)| Word::new(text.clone(), *start, *end, 0.9))
        .collect();

    let config = SegmentConfig::default();
    let cues = SegmentBuilder::new(config.clone()).unwrap().build(&words);

    assert!(!cues.is_empty());
    for cue in &cues {
        assert!(cue.lines.len() <= config.max_lines_per_cue);
        for line in &cue.lines {
            assert!(
                line.chars().count() <= config.max_chars_per_line,
                "line too long: {:?}",
                line
            );
        }
    }

    // No word may be lost or split across the cues
    let rejoined: Vec<String> = cues
        .iter()
        .flat_map(|c| c.lines.iter())
        .flat_map(|l| l.split_whitespace().map(|w| w.to_string()))
        .collect();
    let original: Vec<String> = entries.iter().map(|(t, _, _)| t.clone()).collect();
    assert_eq!(rejoined, original);
}

/// Cue start times strictly increase and consecutive cues never overlap
#[test]
fn test_build_withDenseSequence_shouldKeepCuesOrderedAndDisjoint() {
    let mut entries = Vec::new();
    let mut t = 0.0;
    for i in 0..120 {
        entries.push((format!("w{}", i), t, t + 0.25));
        // Mix short gaps with occasional silences
        t += if i % 17 == 0 { 1.5 } else { 0.3 };
    }
    let words: Vec<Word> = entries
        .iter()
        .map(|(text, start, end)| Word::new(text.clone(), *start, *end, 0.9))
        .collect();

    let cues = builder().build(&words);
    assert!(cues.len() > 1);

    for pair in cues.windows(2) {
        assert!(
            pair[1].start_time > pair[0].start_time,
            "start times must strictly increase"
        );
        assert!(
            pair[1].start_time >= pair[0].end_time,
            "cues must not overlap"
        );
    }

    // Indices are 1-based and contiguous after all decisions
    for (i, cue) in cues.iter().enumerate() {
        assert_eq!(cue.index, i + 1);
    }
}

/// A cue's span never exceeds max_cue_duration
#[test]
fn test_build_withLongSpeech_shouldSplitOnDuration() {
    // Short words spaced so character limits never trigger, duration does
    let mut entries = Vec::new();
    let mut t = 0.0;
    for _ in 0..30 {
        entries.push(("go", t, t + 0.1));
        t += 0.6;
    }
    let words: Vec<Word> = entries
        .iter()
        .map(|(text, start, end)| Word::new(*text, *start, *end, 0.9))
        .collect();

    let config = SegmentConfig::default();
    let cues = SegmentBuilder::new(config.clone()).unwrap().build(&words);

    assert!(cues.len() > 1);
    for cue in &cues {
        assert!(cue.end_time - cue.start_time <= config.max_cue_duration + 1e-9);
    }
}

/// A single word longer than the line limit occupies its own line, unsplit
#[test]
fn test_build_withOversizedWord_shouldKeepWordUnsplit() {
    let long_word = "Pneumonoultramicroscopicsilicovolcanoconiosis";
    assert!(long_word.len() > 42);

    let words = common::words(&[("the", 0.0, 0.2), (long_word, 0.3, 1.5), ("again", 1.6, 1.9)]);
    let cues = builder().build(&words);

    let all_lines: Vec<&String> = cues.iter().flat_map(|c| c.lines.iter()).collect();
    assert!(
        all_lines.iter().any(|l| l.as_str() == long_word),
        "oversized word must appear alone on a line: {:?}",
        all_lines
    );
}

/// Minimum-duration extension stops at the next cue's start instead of
/// overlapping it
#[test]
fn test_build_withTightFollowingCue_shouldNotOverlapWhenExtending() {
    let words = common::words(&[("blip", 0.0, 0.1), ("next", 0.9, 2.2)]);
    let cues = builder().build(&words);

    assert_eq!(cues.len(), 2);
    assert!(cues[0].end_time <= cues[1].start_time);
    // Extended as far as allowed, but short of the full min_cue_duration
    assert_eq!(cues[0].end_time, 0.9);
}

/// A word with end before start is clamped to zero length, not rejected
#[test]
fn test_build_withInvertedWordTiming_shouldClampNotFail() {
    let words = vec![
        Word::new("ok", 0.0, 0.3, 0.9),
        Word::new("broken", 0.5, 0.2, 0.9),
        Word::new("fine", 0.7, 1.0, 0.9),
    ];
    let cues = builder().build(&words);

    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].lines, vec!["ok broken fine".to_string()]);
}

/// Zero limits are a programmer error, reported as InvalidConfig
#[test]
fn test_new_withZeroLineLimit_shouldRejectConfig() {
    let config = SegmentConfig {
        max_chars_per_line: 0,
        ..SegmentConfig::default()
    };
    assert!(SegmentBuilder::new(config).is_err());

    let config = SegmentConfig {
        max_cue_duration: -1.0,
        ..SegmentConfig::default()
    };
    assert!(SegmentBuilder::new(config).is_err());
}

/// Word wrap packs left-to-right and never splits inside a word
#[test]
fn test_wrap_words_withMixedLengths_shouldPackGreedily() {
    let lines = wrap_words(&["one", "two", "three", "four"], 10);
    assert_eq!(lines, vec!["one two".to_string(), "three four".to_string()]);

    let lines = wrap_words(&["tiny", "enormousword"], 6);
    assert_eq!(lines, vec!["tiny".to_string(), "enormousword".to_string()]);

    assert!(wrap_words(&[], 10).is_empty());
}
