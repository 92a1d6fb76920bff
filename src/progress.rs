//! Parser for downloader progress output
//!
//! The external downloader interleaves free-form text with lines of the form
//! `[download]  42.5% of 10MiB at 1.2MiB/s`. This module extracts the
//! percentage as a completion fraction and is deliberately kept apart from
//! the process plumbing so it can be tested on raw text alone.

use regex::Regex;
use std::sync::OnceLock;

static PROGRESS_RE: OnceLock<Regex> = OnceLock::new();

// The character class admits strings like "..." which fail the numeric parse
// in parse_progress and are treated as no match.
#[allow(clippy::expect_used)]
fn progress_regex() -> &'static Regex {
    PROGRESS_RE.get_or_init(|| {
        Regex::new(r"\[download\]\s+([0-9.]+)%").expect("progress regex is valid")
    })
}

/// Extract a completion fraction from a chunk of downloader output
///
/// Searches `chunk` for the first `[download]  <number>%` occurrence
/// (whitespace-tolerant, decimal point allowed) and returns the number
/// divided by 100, clamped to [0.0, 1.0].
///
/// Returns `None` when no pattern is present or the matched text fails
/// numeric parsing. Stateless: chunks may be arbitrary fragments and
/// multiple calls share nothing.
///
/// When several percentages appear in one chunk only the first contributes.
/// Last-match would be equally defensible against line-buffered output, but
/// first-match is the documented tie-break for determinism.
///
/// # Examples
///
/// ```
/// use yoink_dl::progress::parse_progress;
///
/// assert_eq!(parse_progress("[download]  12.0% of 10MiB"), Some(0.12));
/// assert_eq!(parse_progress("[youtube] extracting formats"), None);
/// ```
pub fn parse_progress(chunk: &str) -> Option<f64> {
    let captures = progress_regex().captures(chunk)?;
    let percent: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some((percent / 100.0).clamp(0.0, 1.0))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn assert_fraction(chunk: &str, expected: f64) {
        let actual = parse_progress(chunk)
            .unwrap_or_else(|| panic!("chunk {:?} should yield a fraction", chunk));
        assert!(
            (actual - expected).abs() < 1e-9,
            "chunk {:?}: expected {}, got {}",
            chunk,
            expected,
            actual
        );
    }

    // --- Valid percentages map to percent/100 ---

    #[test]
    fn parses_typical_progress_lines() {
        assert_fraction("[download]  12.0% of 10MiB", 0.12);
        assert_fraction("[download]  87.5% of 10MiB at 1.2MiB/s", 0.875);
        assert_fraction("[download] 100% of 10MiB in 00:12", 1.0);
        assert_fraction("[download]  0.0% of 10MiB", 0.0);
    }

    #[test]
    fn parses_boundary_percentages() {
        assert_fraction("[download] 0%", 0.0);
        assert_fraction("[download] 100%", 1.0);
        assert_fraction("[download] 50%", 0.5);
    }

    #[test]
    fn tolerates_variable_whitespace_after_tag() {
        assert_fraction("[download]\t42.5%", 0.425);
        assert_fraction("[download]     3.1%", 0.031);
    }

    #[test]
    fn finds_pattern_mid_chunk() {
        // Partial reads can split lines arbitrarily; the pattern may sit
        // anywhere in the chunk.
        assert_fraction("retrying...\n[download]  55.0% of 4MiB\n[down", 0.55);
    }

    // --- No-match chunks yield None ---

    #[test]
    fn non_matching_chunks_yield_none() {
        assert_eq!(parse_progress(""), None);
        assert_eq!(parse_progress("[youtube] extracting URL"), None);
        assert_eq!(parse_progress("[download] Destination: video.mp4"), None);
        assert_eq!(parse_progress("download 50%"), None);
        assert_eq!(parse_progress("[download] 50"), None, "missing percent sign");
        assert_eq!(parse_progress("50%"), None, "missing [download] tag");
    }

    #[test]
    fn malformed_number_yields_none() {
        // Matches the character class but fails the numeric parse.
        assert_eq!(parse_progress("[download] ...%"), None);
        assert_eq!(parse_progress("[download] 1.2.3.4.5.%"), None);
    }

    // --- Clamping ---

    #[test]
    fn percent_above_hundred_clamps_to_one() {
        assert_fraction("[download] 150.0%", 1.0);
        assert_fraction("[download] 100.1%", 1.0);
    }

    // --- Tie-break policy ---

    #[test]
    fn first_match_wins_when_chunk_holds_several() {
        assert_fraction(
            "[download]  10.0% of 10MiB\n[download]  20.0% of 10MiB\n",
            0.10,
        );
    }

    #[test]
    fn sweep_of_valid_percentages_maps_to_fraction() {
        for tenths in 0..=1000 {
            let percent = f64::from(tenths) / 10.0;
            let chunk = format!("[download]  {:.1}% of 10MiB", percent);
            assert_fraction(&chunk, percent / 100.0);
        }
    }
}
