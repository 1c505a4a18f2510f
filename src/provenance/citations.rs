//! Citation formatting for transplanted annotations.

use std::fmt::Write as _;

/// Non-breaking space joining a sentence to its citation.
pub const NBSP: char = '\u{a0}';

/// CSS classes marking a timestamp citation span.
pub const CITATION_CLASSES: &str = "citation timestamp-link";

const CITE_LEFT_BR: &str = "⟦";
const CITE_RIGHT_BR: &str = "⟧";

/// Append a citation to a sentence, joined with a non-breaking space.
pub fn add_citation_to_text(text: &str, citation: &str) -> String {
    format!("{text}{NBSP}{citation}")
}

/// Render seconds as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_timestamp(timestamp: f64) -> String {
    let total = timestamp.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Wrap a citation in brackets inside a citation span.
pub fn format_citation(citation: &str) -> String {
    format!(
        "<span class=\"{CITATION_CLASSES}\">{CITE_LEFT_BR}{citation}{CITE_RIGHT_BR}</span>"
    )
}

/// A media URL pointing at the given timestamp, using a `t=SECONDSs`
/// query parameter.
pub fn timestamp_media_url(base_url: &str, timestamp: f64) -> String {
    let mut url = base_url.to_string();
    let sep = if base_url.contains('?') { '&' } else { '?' };
    let _ = write!(url, "{sep}t={}s", timestamp.max(0.0) as u64);
    url
}

/// A full timestamp citation: a bracketed link to the timestamped media.
pub fn format_timestamp_citation(base_url: &str, timestamp: f64) -> String {
    let url = timestamp_media_url(base_url, timestamp);
    let link = format!("<a href=\"{url}\">{}</a>", format_timestamp(timestamp));
    format_citation(&link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_format_as_clock_times() {
        assert_eq!(format_timestamp(5.6), "00:05");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3661.0), "01:01:01");
        assert_eq!(format_timestamp(0.0), "00:00");
    }

    #[test]
    fn media_urls_gain_a_time_parameter() {
        assert_eq!(
            timestamp_media_url("https://www.youtube.com/watch?v=abc", 75.2),
            "https://www.youtube.com/watch?v=abc&t=75s"
        );
        assert_eq!(
            timestamp_media_url("https://example.com/video", 5.0),
            "https://example.com/video?t=5s"
        );
    }

    #[test]
    fn citations_join_with_a_non_breaking_space() {
        let citation = format_timestamp_citation("https://example.com/v", 5.6);
        let cited = add_citation_to_text("Alright, guys.", &citation);
        assert!(cited.starts_with("Alright, guys.\u{a0}<span class=\"citation timestamp-link\">"));
        assert!(cited.contains("⟦<a href=\"https://example.com/v?t=5s\">00:05</a>⟧"));
    }
}
