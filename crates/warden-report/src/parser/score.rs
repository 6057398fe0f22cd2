//! Security score extraction.

use std::sync::LazyLock;

use regex::Regex;
use warden_core::report::SecurityScore;

/// Score patterns, most explicit first.
static PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"(?i)\b(\d{1,3}(?:\.\d+)?)\s*(?:/|out\s+of)\s*100\b",
        r"\b(\d{1,3}(?:\.\d+)?)\s*%",
        r"(?i)\bscore\b[^0-9\n]{0,20}(\d{1,3}(?:\.\d+)?)",
        r"\b(\d{1,3}(?:\.\d+)?)\b",
    ]
    .map(|pattern| Regex::new(pattern).expect("score regex"))
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•+]|\d{1,3}[.)])\s+").expect("list marker regex"));

/// Round a matched number, keeping it only when it lands in `0..=100`.
#[allow(clippy::cast_possible_truncation)]
fn to_score(number: &str) -> Option<SecurityScore> {
    let value: f64 = number.parse().ok()?;
    if !(0.0..=100.0).contains(&value.round()) {
        return None;
    }
    SecurityScore::new(value.round() as i32)
}

/// A minus sign makes the number negative; a slash makes it a denominator.
fn is_signed_or_denominator(line: &str, start: usize) -> bool {
    line[..start].ends_with(['-', '−', '/'])
}

/// First score in the section body, trying each pattern across the whole body
/// before falling back to the next.
pub(super) fn extract(lines: &[&str]) -> Option<SecurityScore> {
    let cleaned: Vec<String> = lines
        .iter()
        .map(|line| LIST_MARKER.replace(line, "").replace(['*', '`'], ""))
        .collect();

    PATTERNS.iter().find_map(|pattern| {
        cleaned.iter().find_map(|line| {
            pattern
                .captures_iter(line)
                .filter_map(|caps| caps.get(1))
                .filter(|m| !is_signed_or_denominator(line, m.start()))
                .find_map(|m| to_score(m.as_str()))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn score(lines: &[&str]) -> Option<i32> {
        extract(lines).map(SecurityScore::value)
    }

    #[rstest]
    #[case(&["85/100"], 85)]
    #[case(&["**85 / 100**"], 85)]
    #[case(&["Overall: 72 out of 100"], 72)]
    #[case(&["Rating: 90%"], 90)]
    #[case(&["Overall security score: 64"], 64)]
    #[case(&["- 55"], 55)]
    #[case(&["Score: 84.6/100"], 85)]
    #[case(&["0/100"], 0)]
    #[case(&["100/100"], 100)]
    fn extracts_scores(#[case] lines: &[&str], #[case] expected: i32) {
        assert_eq!(score(lines), Some(expected));
    }

    #[test]
    fn explicit_form_beats_earlier_bare_number() {
        let lines = ["Found 3 issues in 2 functions.", "Final rating 78/100"];
        assert_eq!(score(&lines), Some(78));
    }

    #[test]
    fn list_markers_are_not_scores() {
        let lines = ["1. Strength: access control", "2. Score 70"];
        assert_eq!(score(&lines), Some(70));
    }

    #[test]
    fn out_of_range_falls_through() {
        assert_eq!(score(&["150/100", "Adjusted score: 80"]), Some(80));
        assert_eq!(score(&["Score: 250"]), None);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["Not enough information to rate this contract."])]
    #[case(&["N/A"])]
    #[case(&["-5/100"])]
    #[case(&["Score: -20"])]
    #[case(&["150/100"])]
    fn unscored_when_nothing_matches(#[case] lines: &[&str]) {
        assert_eq!(score(lines), None);
    }
}
