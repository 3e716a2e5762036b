/*!
 * Tests for SRT document rendering and parsing
 */

use srtgen::srt_formatter::{Cue, SubtitleDocument, format_timestamp, parse_timestamp};

fn sample_document() -> SubtitleDocument {
    SubtitleDocument::new(vec![
        Cue {
            index: 0,
            start_time: 0.0,
            end_time: 1.0,
            lines: vec!["Hello world".to_string()],
        },
        Cue {
            index: 0,
            start_time: 2.5,
            end_time: 4.25,
            lines: vec!["Two lines".to_string(), "of text".to_string()],
        },
    ])
}

/// Timestamps are zero-padded HH:MM:SS,mmm with millisecond truncation
#[test]
fn test_format_timestamp_withFractionalSeconds_shouldTruncateNotRound() {
    assert_eq!(format_timestamp(0.0), "00:00:00,000");
    assert_eq!(format_timestamp(1.9999), "00:00:01,999");
    assert_eq!(format_timestamp(3661.5), "01:01:01,500");
    assert_eq!(format_timestamp(0.9), "00:00:00,900");
    // Negative timing noise clamps to zero rather than underflowing
    assert_eq!(format_timestamp(-0.5), "00:00:00,000");
}

/// Timestamp parsing mirrors formatting
#[test]
fn test_parse_timestamp_withValidTimestamp_shouldRoundTrip() {
    let seconds = parse_timestamp("01:23:45,678").unwrap();
    assert_eq!(format_timestamp(seconds), "01:23:45,678");

    assert!(parse_timestamp("1:2:3").is_err());
    assert!(parse_timestamp("00:99:00,000").is_err());
}

/// Rendering emits index, timestamp range and text, with exactly one blank
/// line between blocks and none after the last
#[test]
fn test_render_withTwoCues_shouldMatchSrtLayout() {
    let rendered = sample_document().render();

    let expected = "1\n\
                    00:00:00,000 --> 00:00:01,000\n\
                    Hello world\n\
                    \n\
                    2\n\
                    00:00:02,500 --> 00:00:04,250\n\
                    Two lines\n\
                    of text\n";
    assert_eq!(rendered, expected);
    assert!(!rendered.ends_with("\n\n"));
}

/// An empty document renders as an empty string
#[test]
fn test_render_withEmptyDocument_shouldProduceEmptyString() {
    let document = SubtitleDocument::new(Vec::new());
    assert_eq!(document.render(), "");
    assert!(document.is_empty());
}

/// Documents are renumbered 1-based and contiguous on construction
#[test]
fn test_new_withArbitraryIndices_shouldRenumberContiguously() {
    let document = sample_document();
    let indices: Vec<usize> = document.cues().iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2]);
}

/// Parsing a rendered document reconstructs it exactly
#[test]
fn test_parse_withRenderedDocument_shouldRoundTrip() {
    let document = sample_document();
    let rendered = document.render();

    let reparsed = SubtitleDocument::parse(&rendered).unwrap();
    assert_eq!(reparsed.len(), document.len());
    assert_eq!(reparsed.render(), rendered);

    // Timestamps survive to millisecond precision, line text exactly
    assert_eq!(reparsed.cues()[1].lines, document.cues()[1].lines);
    assert_eq!(format_timestamp(reparsed.cues()[1].end_time), "00:00:04,250");
}

/// Parsing tolerates CRLF line endings and a trailing blank block
#[test]
fn test_parse_withCrlfContent_shouldParseAllCues() {
    let content = "1\r\n00:00:00,000 --> 00:00:01,500\r\nFirst\r\n\r\n2\r\n00:00:02,000 --> 00:00:03,000\r\nSecond\r\n\r\n";
    let document = SubtitleDocument::parse(content).unwrap();

    assert_eq!(document.len(), 2);
    assert_eq!(document.cues()[0].lines, vec!["First".to_string()]);
    assert_eq!(document.cues()[1].lines, vec!["Second".to_string()]);
}

/// A block whose header is not followed by a timestamp is an error
#[test]
fn test_parse_withMissingTimestamp_shouldFail() {
    let content = "1\nnot a timestamp\ntext\n";
    assert!(SubtitleDocument::parse(content).is_err());
}

/// Cue helpers expose duration and joined text
#[test]
fn test_cue_accessors_withMultiLineCue_shouldExposeTextAndDuration() {
    let cue = Cue {
        index: 1,
        start_time: 1.0,
        end_time: 3.5,
        lines: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(cue.duration(), 2.5);
    assert_eq!(cue.text(), "a\nb");
}
