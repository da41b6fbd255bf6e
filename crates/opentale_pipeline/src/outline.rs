//! Conversion of raw outline text into ordered chapter records.
//!
//! Parsing is a pure function of the text and the declared chapter count:
//!
//! 1. When both `OUTLINE:` and `END OF OUTLINE` are present, only the text
//!    between them is scanned.
//! 2. Every `Chapter <digits>: <title>` header starts a chapter; its prompt is
//!    the text up to the next header.
//! 3. A chapter number seen twice keeps its first occurrence.
//! 4. Records are returned sorted by number.
//! 5. With no headers at all, `declared_chapter_count` placeholder records are
//!    synthesized and a [`ParseFallbackWarning`] is reported.
//!
//! When real headers exist the text is trusted over the declared count.

use opentale_core::ChapterRecord;
use opentale_error::ParseFallbackWarning;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Opening outline marker.
pub const OUTLINE_START: &str = "OUTLINE:";
/// Closing outline marker.
pub const OUTLINE_END: &str = "END OF OUTLINE";

static CHAPTER_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bChapter[ \t]+(\d+)[ \t]*:[ \t]*([^\n]*)").expect("Invalid regex pattern")
});

/// Parser output together with the fallback report, if stubs were used.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct ParsedOutline {
    /// Chapter records in ascending number order
    records: Vec<ChapterRecord>,
    /// Present when no headers were found
    warning: Option<ParseFallbackWarning>,
}

impl ParsedOutline {
    /// Consume into the records and the optional warning.
    pub fn into_parts(self) -> (Vec<ChapterRecord>, Option<ParseFallbackWarning>) {
        (self.records, self.warning)
    }
}

/// Parse outline text into chapter records.
///
/// # Examples
///
/// ```
/// use opentale_pipeline::parse_outline;
///
/// let raw = "OUTLINE:\n\nChapter 1: The Beginning\n- Key Events:\n  * A\n\
///            Chapter 3: Skip\nChapter 2: Middle\n\nEND OF OUTLINE";
/// let titles: Vec<_> = parse_outline(raw, 3)
///     .iter()
///     .map(|record| (*record.number(), record.title().clone()))
///     .collect();
/// assert_eq!(
///     titles,
///     vec![
///         (1, "The Beginning".to_string()),
///         (2, "Middle".to_string()),
///         (3, "Skip".to_string()),
///     ]
/// );
/// ```
pub fn parse_outline(raw: &str, declared_chapter_count: u32) -> Vec<ChapterRecord> {
    parse_with_report(raw, declared_chapter_count).records
}

/// Parse outline text, reporting whether placeholder records were generated.
pub fn parse_with_report(raw: &str, declared_chapter_count: u32) -> ParsedOutline {
    let body = outline_body(raw);
    let records = scan_headers(body);

    if !records.is_empty() {
        debug!(
            chapters = records.len(),
            declared = declared_chapter_count,
            "Parsed outline headers"
        );
        return ParsedOutline {
            records,
            warning: None,
        };
    }

    let warning = ParseFallbackWarning::new(declared_chapter_count);
    warn!(%warning, "Outline parse fell back to placeholders");
    ParsedOutline {
        records: placeholders(declared_chapter_count),
        warning: Some(warning),
    }
}

/// The text between the outline markers, or the whole text.
fn outline_body(raw: &str) -> &str {
    let Some(start) = raw.find(OUTLINE_START) else {
        return raw;
    };
    let after_start = start + OUTLINE_START.len();
    match raw[after_start..].find(OUTLINE_END) {
        Some(offset) => &raw[after_start..after_start + offset],
        None => raw,
    }
}

fn scan_headers(body: &str) -> Vec<ChapterRecord> {
    let headers: Vec<_> = CHAPTER_HEADER.captures_iter(body).collect();
    let mut records = BTreeMap::new();

    for (index, cap) in headers.iter().enumerate() {
        let (Some(whole), Some(digits), Some(title)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };

        let number = match digits.as_str().parse::<u32>() {
            Ok(0) | Err(_) => {
                debug!(header = whole.as_str(), "Skipping unusable chapter number");
                continue;
            }
            Ok(n) => n,
        };

        if records.contains_key(&number) {
            debug!(number, "Discarding duplicate chapter header");
            continue;
        }

        let body_end = headers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |next| next.start());
        let prompt = body[whole.end()..body_end].trim();

        let title = title.as_str().trim();
        let title = if title.is_empty() {
            format!("Chapter {}", number)
        } else {
            title.to_string()
        };

        records.insert(number, ChapterRecord::new(number, title, prompt));
    }

    records.into_values().collect()
}

fn placeholders(count: u32) -> Vec<ChapterRecord> {
    (1..=count)
        .map(|i| {
            ChapterRecord::new(
                i,
                format!("Chapter {}", i),
                format!("Write chapter {} of the story.", i),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(records: &[ChapterRecord]) -> Vec<u32> {
        records.iter().map(|record| *record.number()).collect()
    }

    #[test]
    fn prompt_is_body_between_headers() {
        let records = parse_outline(
            "Chapter 1: Dawn\n- Key Events:\n  * Arrival\n\nChapter 2: Dusk\n- Setting: Pier",
            2,
        );
        assert_eq!(records[0].prompt(), "- Key Events:\n  * Arrival");
        assert_eq!(records[1].prompt(), "- Setting: Pier");
    }

    #[test]
    fn markers_restrict_the_scanned_text() {
        let raw = "Chapter 9: Preamble\nOUTLINE:\nChapter 1: Inside\nbody\nEND OF OUTLINE\nChapter 7: After";
        let records = parse_outline(raw, 1);
        assert_eq!(numbers(&records), vec![1]);
        assert_eq!(records[0].prompt(), "body");
    }

    #[test]
    fn single_marker_parses_whole_text() {
        let raw = "Chapter 2: Before\nOUTLINE:\nChapter 1: After";
        assert_eq!(numbers(&parse_outline(raw, 0)), vec![1, 2]);
    }

    #[test]
    fn empty_title_gets_default() {
        let records = parse_outline("Chapter 4:\nbody", 1);
        assert_eq!(records[0].title(), "Chapter 4");
        assert_eq!(records[0].prompt(), "body");
    }

    #[test]
    fn chapter_zero_is_ignored() {
        let records = parse_outline("Chapter 0: Prologue\nChapter 1: One", 1);
        assert_eq!(numbers(&records), vec![1]);
    }

    #[test]
    fn header_requires_colon() {
        let parsed = parse_with_report("Chapter 1 - Dawn\nChapter 2 Dusk", 2);
        assert!(parsed.warning().is_some());
    }

    #[test]
    fn fallback_warning_carries_declared_count() {
        let (records, warning) = parse_with_report("no headers here", 4).into_parts();
        assert_eq!(numbers(&records), vec![1, 2, 3, 4]);
        assert_eq!(warning, Some(ParseFallbackWarning::new(4)));
        assert_eq!(records[2].title(), "Chapter 3");
    }

    #[test]
    fn real_headers_report_no_warning() {
        assert!(parse_with_report("Chapter 1: A", 10).warning().is_none());
    }
}
