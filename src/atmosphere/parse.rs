//! Extract a structured reading from a model's free-text answer.
//!
//! The backend is asked to reply with two lines,
//!
//! ```text
//! AQI: <number>
//! Summary: <text>
//! ```
//!
//! but models drift: they add preambles, translate the label, use Persian digits,
//! or omit the number entirely. Parsing is therefore total; the worst case is a
//! reading with no index, `Level::Unknown`, and whatever prose came back.

use std::sync::LazyLock;

use regex::Regex;

use super::{GroundingChunk, Level, Source};

/// Title used for citations that came without one.
pub const UNTITLED_SOURCE: &str = "Web source";

/// "AQI: 87", "aqi 87", "شاخص: ۸۷" and friends.
static INDEX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:AQI|شاخص)[:\s]*([0-9\x{06F0}-\x{06F9}\x{0660}-\x{0669}]+)")
        .expect("index pattern is valid")
});

static SUMMARY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^summary[:\s]*").expect("summary pattern is valid"));

/// Keywords for the textual fallback, most severe first.
///
/// Order matters: "very unhealthy" and "unhealthy for sensitive" both contain "unhealthy",
/// and "ناسالم" contains "سالم".
const KEYWORDS: [(Level, &[&str]); 6] = [
    (Level::Hazardous, &["hazardous", "خطرناک"]),
    (Level::VeryUnhealthy, &["very unhealthy", "بسیار ناسالم"]),
    (
        Level::UnhealthySensitive,
        &["unhealthy for sensitive", "ناسالم برای"],
    ),
    (Level::Unhealthy, &["unhealthy", "ناسالم"]),
    (
        Level::Moderate,
        &["moderate", "acceptable", "سالم", "قابل قبول"],
    ),
    (Level::Good, &["good", "پاک"]),
];

/// Fields of a reading that can be recovered from a backend response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub aqi: Option<u32>,
    pub level: Level,
    pub summary: String,
    pub sources: Vec<Source>,
}

/// Parse response text and grounding metadata. Never fails.
pub fn parse_response(text: &str, citations: &[GroundingChunk]) -> ParsedResponse {
    let found = INDEX_PATTERN.captures(text).and_then(|caps| {
        let whole = caps.get(0)?;
        let digits = caps.get(1)?;
        Some((whole.start()..whole.end(), parse_digits(digits.as_str())))
    });

    let aqi = found.as_ref().and_then(|(_, aqi)| *aqi);
    let level = match aqi {
        Some(aqi) => Level::from_index(aqi),
        None => level_from_keywords(text),
    };

    let body = match &found {
        Some((span, _)) => remove_line(text, span.start, span.end),
        None => text.to_owned(),
    };
    let summary = SUMMARY_LABEL.replace(body.trim(), "").trim().to_owned();

    ParsedResponse {
        aqi,
        level,
        summary,
        sources: collect_sources(citations),
    }
}

/// Fold ASCII, Persian, and Arabic-Indic digits into a number.
fn parse_digits(digits: &str) -> Option<u32> {
    let mut value: u32 = 0;
    for c in digits.chars() {
        let d = match c {
            '0'..='9' => c as u32 - '0' as u32,
            '\u{06F0}'..='\u{06F9}' => c as u32 - 0x06F0,
            '\u{0660}'..='\u{0669}' => c as u32 - 0x0660,
            _ => return None,
        };
        value = match value.checked_mul(10).and_then(|v| v.checked_add(d)) {
            Some(v) => v,
            None => {
                tracing::warn!("index {digits:?} does not fit; ignoring it");
                return None;
            }
        };
    }
    Some(value)
}

fn level_from_keywords(text: &str) -> Level {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(level, _)| *level)
        .unwrap_or_default()
}

/// Drop the whole line containing `start..end`, along with its line terminator.
fn remove_line(text: &str, start: usize, end: usize) -> String {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(text.len());
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..line_start]);
    out.push_str(&text[line_end..]);
    out
}

fn collect_sources(citations: &[GroundingChunk]) -> Vec<Source> {
    let mut sources: Vec<Source> = Vec::new();
    for web in citations.iter().filter_map(|c| c.web.as_ref()) {
        let Some(uri) = web.uri.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        if sources.iter().any(|s| s.uri == uri) {
            continue;
        }
        let title = web
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED_SOURCE);
        sources.push(Source {
            title: title.to_owned(),
            uri: uri.to_owned(),
        });
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_line_answer() {
        let p = parse_response("AQI: 87\nSummary: Moderate pollution today.", &[]);
        assert_eq!(p.aqi, Some(87));
        assert_eq!(p.level, Level::Moderate);
        assert_eq!(p.summary, "Moderate pollution today.");
        assert!(p.sources.is_empty());
    }

    #[test]
    fn index_wins_over_keywords() {
        let p = parse_response("AQI: 40\nSummary: Hazardous yesterday, good today.", &[]);
        assert_eq!(p.aqi, Some(40));
        assert_eq!(p.level, Level::Good);
    }

    #[test]
    fn most_severe_keyword_wins() {
        let p = parse_response(
            "Air was good this morning, moderate by noon, now hazardous in the south.",
            &[],
        );
        assert_eq!(p.aqi, None);
        assert_eq!(p.level, Level::Hazardous);
    }

    #[test]
    fn overlapping_keywords() {
        let cases = [
            ("Unhealthy for sensitive groups.", Level::UnhealthySensitive),
            ("Very unhealthy conditions.", Level::VeryUnhealthy),
            ("Plainly unhealthy.", Level::Unhealthy),
            ("Quality is acceptable.", Level::Moderate),
            ("هوا ناسالم برای گروه‌های حساس است", Level::UnhealthySensitive),
            ("هوا بسیار ناسالم است", Level::VeryUnhealthy),
            ("هوا ناسالم است", Level::Unhealthy),
            ("هوا سالم است", Level::Moderate),
            ("هوا پاک است", Level::Good),
            ("No data right now.", Level::Unknown),
        ];
        for (text, want) in cases {
            assert_eq!(parse_response(text, &[]).level, want, "{text}");
        }
    }

    #[test]
    fn empty_text() {
        let p = parse_response("", &[]);
        assert_eq!(p, ParsedResponse::default());
        assert_eq!(p.summary, "");
    }

    #[test]
    fn localized_token_and_digits() {
        let p = parse_response("شاخص: ۱۵۶\nSummary: هوا ناسالم است.", &[]);
        assert_eq!(p.aqi, Some(156));
        assert_eq!(p.level, Level::Unhealthy);
        assert_eq!(p.summary, "هوا ناسالم است.");
    }

    #[test]
    fn loose_formatting() {
        let p = parse_response(
            "Here is what I found.\n**aqi 212** (24-hour average)\nsummary:   Stay indoors.",
            &[],
        );
        assert_eq!(p.aqi, Some(212));
        assert_eq!(p.level, Level::VeryUnhealthy);
        assert_eq!(p.summary, "Here is what I found.\nsummary:   Stay indoors.");
    }

    #[test]
    fn first_match_is_used() {
        let p = parse_response("AQI: 30\nYesterday AQI: 180", &[]);
        assert_eq!(p.aqi, Some(30));
        assert_eq!(p.summary, "Yesterday AQI: 180");
    }

    #[test]
    fn label_stripped_without_index() {
        let p = parse_response("  Summary: Data unavailable.  ", &[]);
        assert_eq!(p.aqi, None);
        assert_eq!(p.summary, "Data unavailable.");
    }

    #[test]
    fn overflowing_index_is_dropped() {
        let p = parse_response("AQI: 99999999999\nSummary: Glitch.", &[]);
        assert_eq!(p.aqi, None);
        assert_eq!(p.level, Level::Unknown);
        assert_eq!(p.summary, "Glitch.");
    }

    #[test]
    fn sources_keep_order_and_dedupe() {
        let citations = vec![
            GroundingChunk::web("https://airnow.tehran.ir/", Some("AirNow Tehran")),
            GroundingChunk::default(),
            GroundingChunk::web("https://example.com/aqi", None),
            GroundingChunk::web("https://airnow.tehran.ir/", Some("Duplicate")),
            GroundingChunk::web("  ", Some("No uri")),
            GroundingChunk::web("https://example.org/", Some("   ")),
        ];
        let p = parse_response("AQI: 10", &citations);
        assert_eq!(
            p.sources,
            vec![
                Source {
                    title: "AirNow Tehran".into(),
                    uri: "https://airnow.tehran.ir/".into()
                },
                Source {
                    title: UNTITLED_SOURCE.into(),
                    uri: "https://example.com/aqi".into()
                },
                Source {
                    title: UNTITLED_SOURCE.into(),
                    uri: "https://example.org/".into()
                },
            ]
        );
        assert_eq!(p.summary, "");
    }

    #[test]
    fn parsing_is_pure() {
        let text = "AQI: 151\r\nSummary: Unhealthy; limit outdoor activity.";
        let citations = [GroundingChunk::web("https://a.example", Some("A"))];
        assert_eq!(
            parse_response(text, &citations),
            parse_response(text, &citations)
        );
    }
}
