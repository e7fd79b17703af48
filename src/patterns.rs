// src/patterns.rs
//! Pattern library: date/time recognizers and their normalizers.
//!
//! Every matcher here is a plain `regex::Regex` behind a `Lazy`. `Regex` keeps no
//! match cursor between calls, so the same instance can be shared by the segmenter
//! and the extractor (and across threads) without position bleed-over.
//!
//! Normalizers are total: they never panic and never return an error.
//! - `normalize_date` → ISO `YYYY-MM-DD`, or `""` when the token cannot be parsed.
//! - `normalize_time` → 24h `HH:MM`, or the raw token unchanged when it cannot be parsed.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Month-name alternation shared by the date recognizers (prefix + any letters).
pub(crate) const MONTH_PREFIX: &str = r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*";

/// `MM/DD/YYYY`, `YYYY-MM-DD` or `<Month> D[,] YYYY`.
pub static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:\d{{1,2}}/\d{{1,2}}/\d{{4}}|\d{{4}}-\d{{2}}-\d{{2}}|{MONTH_PREFIX}\s+\d{{1,2}},?\s+\d{{4}})\b"
    ))
    .expect("date regex")
});

/// `H:MM` / `HH:MM` with an optional AM/PM marker.
pub static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{1,2}:\d{2}\s*(?:AM|PM)?\b").expect("time regex"));

/// First URL-looking token (http/https).
pub static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s<>"]+"#).expect("url regex"));

static US_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("us date regex"));
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("iso date regex"));
static NAMED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z]+)\s+(\d{1,2}),?\s+(\d{4})$").expect("named date regex")
});
static MERIDIEM_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(AM|PM)$").expect("meridiem regex"));
static CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}):(\d{2})(?: (AM|PM))?$").expect("clock regex")
});

/// Fixed reference day used when turning a bare clock reading into a time value.
fn reference_day() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
}

/// First date token in `text`, if any.
pub fn find_date(text: &str) -> Option<&str> {
    DATE_PATTERN.find(text).map(|m| m.as_str())
}

/// First time token in `text`, if any (trailing whitespace trimmed).
pub fn find_time(text: &str) -> Option<&str> {
    TIME_PATTERN.find(text).map(|m| m.as_str().trim_end())
}

/// First http(s) URL in `text`, with trailing sentence punctuation removed.
pub fn find_url(text: &str) -> Option<&str> {
    URL_PATTERN
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']))
        .filter(|u| !u.is_empty())
}

/// True when `text` carries a date or a time signal.
pub fn has_temporal_signal(text: &str) -> bool {
    DATE_PATTERN.is_match(text) || TIME_PATTERN.is_match(text)
}

/// Parse a raw date token into ISO `YYYY-MM-DD`. Returns `""` if unparseable.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    match parse_date(raw) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => {
            debug!(target: "patterns", raw, "unparseable date");
            String::new()
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Some(c) = US_DATE.captures(raw) {
        let (m, d, y) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(c) = ISO_DATE.captures(raw) {
        let (y, m, d) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(c) = NAMED_DATE.captures(raw) {
        let m = month_number(&c[1])?;
        let (d, y) = (c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

/// Month number from a (possibly abbreviated) English month name.
/// Only the first three letters are significant ("Sept", "Sep", "September").
fn month_number(name: &str) -> Option<u32> {
    let key: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let n = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

/// Parse a raw time token into 24h `HH:MM`. Returns `raw` unchanged if unparseable.
pub fn normalize_time(raw: &str) -> String {
    match parse_time(raw) {
        Some(t) => t.format("%H:%M").to_string(),
        None => {
            debug!(target: "patterns", raw, "unparseable time, passing through");
            raw.to_string()
        }
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    // "2:00PM" → "2:00 PM"
    let spaced = MERIDIEM_GAP.replace(raw.trim(), " $1");
    let c = CLOCK.captures(&spaced)?;
    let hour: u32 = c[1].parse().ok()?;
    let minute: u32 = c[2].parse().ok()?;
    let hour24 = match c.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (meridiem.as_str(), hour) {
                ("AM", 12) => 0,
                ("AM", h) => h,
                ("PM", 12) => 12,
                (_, h) => h + 12,
            }
        }
        None => hour,
    };
    reference_day()?
        .and_hms_opt(hour24, minute, 0)
        .map(|dt| dt.time())
}

/// Parse an already-normalized `HH:MM` value. Used by the exporters, which treat
/// pass-through raw tokens as "no time".
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Parse an already-normalized ISO date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_pattern_forms() {
        assert_eq!(find_date("due 03/15/2025 sharp"), Some("03/15/2025"));
        assert_eq!(find_date("on 2025-03-15."), Some("2025-03-15"));
        assert_eq!(find_date("on March 15, 2025 at noon"), Some("March 15, 2025"));
        assert_eq!(find_date("SEPT 5 2025"), Some("SEPT 5 2025"));
        assert_eq!(find_date("no date here"), None);
    }

    #[test]
    fn time_pattern_forms() {
        assert_eq!(find_time("at 2:00 PM sharp"), Some("2:00 PM"));
        assert_eq!(find_time("at 14:30."), Some("14:30"));
        assert_eq!(find_time("doors 7:15pm"), Some("7:15pm"));
        assert_eq!(find_time("nothing"), None);
    }

    #[test]
    fn normalize_date_variants() {
        assert_eq!(normalize_date("03/15/2025"), "2025-03-15");
        assert_eq!(normalize_date("2025-03-15"), "2025-03-15");
        assert_eq!(normalize_date("March 15, 2025"), "2025-03-15");
        assert_eq!(normalize_date("Sept 5 2025"), "2025-09-05");
        assert_eq!(normalize_date("13/45/2025"), "");
        assert_eq!(normalize_date("Smarch 1, 2025"), "");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn normalize_date_is_stable_on_its_own_output() {
        for raw in ["3/1/2024", "Feb 29, 2024", "2023-12-31"] {
            let once = normalize_date(raw);
            assert!(!once.is_empty());
            assert_eq!(normalize_date(&once), once);
        }
    }

    #[test]
    fn normalize_time_variants() {
        assert_eq!(normalize_time("2:00 PM"), "14:00");
        assert_eq!(normalize_time("2:00PM"), "14:00");
        assert_eq!(normalize_time("12:15 am"), "00:15");
        assert_eq!(normalize_time("12:15 PM"), "12:15");
        assert_eq!(normalize_time("9:05"), "09:05");
        assert_eq!(normalize_time("23:59"), "23:59");
    }

    #[test]
    fn normalize_time_passes_through_garbage() {
        assert_eq!(normalize_time("13:00 PM"), "13:00 PM");
        assert_eq!(normalize_time("25:00"), "25:00");
        assert_eq!(normalize_time("9:75"), "9:75");
    }

    #[test]
    fn url_trailing_punctuation_is_dropped() {
        assert_eq!(
            find_url("See https://example.com/e?id=1. Thanks"),
            Some("https://example.com/e?id=1")
        );
        assert_eq!(find_url("nothing"), None);
    }
}
