//! LRC lyrics parser.
//!
//! Parses the line-oriented, tag-based LRC format:
//!
//! ```text
//! [ti:Title]
//! [ar:Artist]
//! [al:Album]
//! [length:03:45.00]
//! [00:12.34]A lyric line
//! [00:20.00][01:10.00]A lyric repeated at two timestamps
//! ```
//!
//! Parsing is best-effort: fragments that do not match a tag or a timestamped
//! record are ignored rather than rejected.

use crate::error::Result;
use crate::lyrics::{Line, Lyrics, DURATION_INFINITE};

/// Parse LRC text into a [`Lyrics`] document.
///
/// Returns `Ok(None)` for empty input. Lines come out sorted by start time,
/// each with its duration set to the gap to the next line; the final line
/// gets the remainder of the declared `[length:..]` when that is positive,
/// and [`DURATION_INFINITE`] otherwise.
///
/// # Errors
///
/// Propagates the document construction error, which parser-derived values
/// never trigger (start times are parsed from unsigned digits and durations
/// are computed as non-negative gaps).
pub fn parse(input: &str) -> Result<Option<Lyrics>> {
    if input.is_empty() {
        return Ok(None);
    }

    let title = find_meta_tag(input, "ti").unwrap_or_default();
    let artist = find_meta_tag(input, "ar");
    let album = find_meta_tag(input, "al");
    let length = find_length_tag(input);

    let mut lines = Vec::new();
    for raw in input.lines() {
        collect_record(raw, &mut lines);
    }

    // Stable: ties keep their order of first appearance.
    lines.sort_by_key(|line| line.start_at);

    if let Some((last, rest)) = lines.split_last_mut() {
        let mut next_start = last.start_at;
        for line in rest.iter_mut().rev() {
            line.duration_millis = next_start - line.start_at;
            next_start = line.start_at;
        }
        last.duration_millis = match length {
            Some(total) if total - last.start_at > 0 => total - last.start_at,
            _ => DURATION_INFINITE,
        };
    }

    Lyrics::new(title, artist, album, length, lines).map(Some)
}

/// First match of `[<key>:...]` anywhere in the input, value trimmed.
///
/// The value runs to the last `]` on the line, so nested brackets survive.
fn find_meta_tag(input: &str, key: &str) -> Option<String> {
    let open = format!("[{key}:");
    for raw in input.lines() {
        if let Some(at) = raw.find(&open) {
            let rest = &raw[at + open.len()..];
            if let Some(end) = rest.rfind(']') {
                return Some(rest[..end].trim().to_string());
            }
        }
    }
    None
}

/// First `[length:MM:SS(.FF)?]` tag, as milliseconds.
fn find_length_tag(input: &str) -> Option<i64> {
    for raw in input.lines() {
        if let Some(at) = raw.find("[length:") {
            let rest = &raw[at + "[length:".len()..];
            if let Some(end) = rest.find(']') {
                if let Some(millis) = parse_time_value(rest[..end].trim()) {
                    return Some(millis);
                }
            }
        }
    }
    None
}

/// Scan one text line for a lyric record: a run of adjacent timestamp tags
/// followed by content to end of line.
///
/// The run need not start at column 0. Each timestamp yields its own [`Line`]
/// sharing the trimmed content, with the duration left at 0 for the caller to
/// fill in.
fn collect_record(raw: &str, out: &mut Vec<Line>) {
    for (at, _) in raw.match_indices('[') {
        let mut rest = &raw[at..];
        let mut starts = Vec::new();
        while let Some((millis, consumed)) = take_time_tag(rest) {
            starts.push(millis);
            rest = &rest[consumed..];
        }
        if starts.is_empty() {
            continue;
        }
        let content = rest.trim();
        for start_at in starts {
            out.push(Line::new(content, start_at, 0));
        }
        return;
    }
}

/// Parse a leading `[MM:SS(.FF)?]` tag, returning its millisecond value and
/// the number of bytes consumed.
fn take_time_tag(s: &str) -> Option<(i64, usize)> {
    let rest = s.strip_prefix('[')?;
    let end = rest.find(']')?;
    let millis = parse_time_value(&rest[..end])?;
    Some((millis, end + 2))
}

/// Time-tag grammar: `minutes:seconds(.fraction)?`, any digit count.
///
/// The fraction digit-string is taken literally as centiseconds scaled by
/// 10ms, so `"5"` is 50ms and `"123"` is 1230ms.
fn parse_time_value(tag: &str) -> Option<i64> {
    let (clock, fraction) = match tag.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (tag, None),
    };
    let (minutes, seconds) = clock.split_once(':')?;
    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    let fraction = match fraction {
        Some(digits) => parse_digits(digits)?,
        None => 0,
    };
    Some(minutes * 60_000 + seconds * 1_000 + fraction * 10)
}

fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> Lyrics {
        parse(input).unwrap().unwrap()
    }

    #[test]
    fn test_parse_empty_returns_none() {
        assert!(parse("").unwrap().is_none());
    }

    #[test]
    fn test_parse_single_line() {
        let lyrics = parsed("[00:12.34]Hello world");
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].content, "Hello world");
        assert_eq!(lyrics.lines[0].start_at, 12_340);
        assert_eq!(lyrics.lines[0].duration_millis, DURATION_INFINITE);
    }

    #[test]
    fn test_parse_metadata_tags() {
        let lyrics = parsed("[ti: Song Title ]\n[ar:Artist Name]\n[al:Album Name]\n[00:01.00]x");
        assert_eq!(lyrics.title, "Song Title");
        assert_eq!(lyrics.artist.as_deref(), Some("Artist Name"));
        assert_eq!(lyrics.album.as_deref(), Some("Album Name"));
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let lyrics = parsed("[00:01.00]x");
        assert_eq!(lyrics.title, "");
        assert_eq!(lyrics.artist, None);
        assert_eq!(lyrics.album, None);
        assert_eq!(lyrics.duration_millis, None);
    }

    #[test]
    fn test_parse_length_tag() {
        let lyrics = parsed("[length:00:05.00]\n[00:01.00]A\n[00:03.00]B");
        assert_eq!(lyrics.duration_millis, Some(5000));
        assert_eq!(lyrics.lines[0].start_at, 1000);
        assert_eq!(lyrics.lines[0].duration_millis, 2000);
        assert_eq!(lyrics.lines[1].start_at, 3000);
        assert_eq!(lyrics.lines[1].duration_millis, 2000);
        assert_eq!(lyrics.optimal_duration_millis(), 5000);
    }

    #[test]
    fn test_length_tag_with_space() {
        let lyrics = parsed("[length: 01:30]\n[00:01.00]x");
        assert_eq!(lyrics.duration_millis, Some(90_000));
    }

    #[test]
    fn test_length_before_last_line_falls_back_to_sentinel() {
        let lyrics = parsed("[length:00:01.00]\n[00:02.00]x");
        assert_eq!(lyrics.lines[0].duration_millis, DURATION_INFINITE);
    }

    #[test]
    fn test_no_length_gives_last_line_infinite_duration() {
        let lyrics = parsed("[00:01.00]A\n[00:02.00]B");
        assert_eq!(lyrics.lines[0].duration_millis, 1000);
        assert_eq!(lyrics.lines[1].duration_millis, DURATION_INFINITE);
        // The sentinel is excluded from the fallback total.
        assert_eq!(lyrics.optimal_duration_millis(), 2000);
    }

    #[test]
    fn test_multi_timestamp_record() {
        let lyrics = parsed("[00:01.00][00:02.00]Echo");
        assert_eq!(lyrics.lines.len(), 2);
        assert_eq!(lyrics.lines[0].content, "Echo");
        assert_eq!(lyrics.lines[1].content, "Echo");
        assert_eq!(lyrics.lines[0].start_at, 1000);
        assert_eq!(lyrics.lines[1].start_at, 2000);
    }

    #[test]
    fn test_lines_sorted_by_start_time() {
        let lyrics = parsed("[00:10.00]Later\n[00:02.00]Earlier");
        assert_eq!(lyrics.lines[0].content, "Earlier");
        assert_eq!(lyrics.lines[1].content, "Later");
    }

    #[test]
    fn test_durations_fill_gaps_exactly() {
        let lyrics = parsed("[00:01.00]a\n[00:03.50]b\n[00:04.00]c\n[01:00.00]d");
        for pair in lyrics.lines.windows(2) {
            assert_eq!(
                pair[0].start_at + pair[0].duration_millis,
                pair[1].start_at
            );
        }
    }

    #[test]
    fn test_fraction_is_literal_centiseconds() {
        // A one-digit fraction is not normalized: "5" means 50ms, not 500ms.
        let lyrics = parsed("[0:1.5]x");
        assert_eq!(lyrics.lines[0].start_at, 1050);
    }

    #[test]
    fn test_long_fraction_scales_by_ten() {
        let lyrics = parsed("[00:01.234]x");
        assert_eq!(lyrics.lines[0].start_at, 3340);
    }

    #[test]
    fn test_timestamp_without_fraction() {
        let lyrics = parsed("[02:30]x");
        assert_eq!(lyrics.lines[0].start_at, 150_000);
    }

    #[test]
    fn test_unrecognized_lines_ignored() {
        let lyrics = parsed("just some text\n[oops\n[00:01.00]real line\n]]]");
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].content, "real line");
    }

    #[test]
    fn test_no_timestamps_yields_empty_lines() {
        let lyrics = parsed("[ti:Only Metadata]\nhello there");
        assert_eq!(lyrics.title, "Only Metadata");
        assert!(lyrics.lines.is_empty());
        assert_eq!(lyrics.optimal_duration_millis(), 0);
    }

    #[test]
    fn test_record_not_at_line_start() {
        let lyrics = parsed("noise [00:01.00]text");
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].start_at, 1000);
        assert_eq!(lyrics.lines[0].content, "text");
    }

    #[test]
    fn test_content_is_trimmed() {
        let lyrics = parsed("[00:01.00]   spaced out   ");
        assert_eq!(lyrics.lines[0].content, "spaced out");
    }

    #[test]
    fn test_length_line_is_not_a_record() {
        let lyrics = parsed("[length:00:05.00]\n[00:01.00]x");
        assert_eq!(lyrics.lines.len(), 1);
    }

    #[test]
    fn test_malformed_timestamp_is_skipped() {
        let lyrics = parsed("[00:0a.00]bad\n[0:-1]worse\n[00:01.00]good");
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].content, "good");
    }
}
