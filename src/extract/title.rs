// src/extract/title.rs
//! Title heuristics.
//!
//! Order:
//! 1) A short first line that does not read like description prose is the title, verbatim.
//! 2) Otherwise strip leading boilerplate ("Join us for a", "Annual", ...),
//! 3) cut before the first "on <date>" / "at <time>"-style lead-in,
//! 4) or, failing that, before the first description starter,
//! 5) collapse to five words when the result is empty or too long.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::MONTH_PREFIX;

const FIRST_LINE_MAX_CHARS: usize = 150;
const FALLBACK_MAX_CHARS: usize = 80;
const FALLBACK_WORDS: usize = 5;

/// Prose openers and field labels; a first line starting with one of these is not a title.
static LINE_STARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:The event|This|Don['’]t miss|Come|Register|RSVP|Bring|Please|All)\b|(?:Location|Time|Date|Where|When):)",
    )
    .expect("line starter regex")
});

static ANY_STARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:The event|This|Don['’]t miss|Come|Register|RSVP|Bring|Please|All)\b|\b(?:Location|Time|Date|Where|When):)",
    )
    .expect("starter regex")
});

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Join us for an?|Annual|Virtual|Interactive)\s+").expect("boilerplate regex")
});

static DATE_TIME_LEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:on|scheduled for|happening|set for|taking place|at)\s+(?:\d{{1,2}}/\d{{1,2}}/\d{{4}}|\d{{4}}-\d{{2}}-\d{{2}}|{MONTH_PREFIX}\s+\d{{1,2}}|\d{{1,2}}:\d{{2}})"
    ))
    .expect("date/time lead regex")
});

static TRAILING_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,.:;!?-]+$").expect("trailing punct regex"));

/// True when `line` opens like description prose or a field label.
pub fn is_description_starter(line: &str) -> bool {
    LINE_STARTER.is_match(line.trim_start())
}

/// Derive a title from a block. May return an empty string; the caller drops such blocks.
pub fn title_from_text(text: &str, max_chars: usize) -> String {
    if let Some(first) = first_line(text) {
        if first.chars().count() < FIRST_LINE_MAX_CHARS && !is_description_starter(first) {
            return clean_title(first, max_chars);
        }
    }

    let stripped = BOILERPLATE.replace(text.trim_start(), "");
    let cut = if let Some(m) = DATE_TIME_LEAD.find(&stripped) {
        &stripped[..m.start()]
    } else if let Some(m) = ANY_STARTER.find(&stripped) {
        &stripped[..m.start()]
    } else {
        &stripped[..]
    };
    let cut = cut.trim();

    let candidate = if cut.is_empty() {
        first_words(&stripped, FALLBACK_WORDS)
    } else if cut.chars().count() > FALLBACK_MAX_CHARS {
        first_words(cut, FALLBACK_WORDS)
    } else {
        cut.split_whitespace().collect::<Vec<_>>().join(" ")
    };
    clean_title(&candidate, max_chars)
}

/// Trailing punctuation off, whitespace trimmed, length capped.
pub fn clean_title(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    let no_punct = TRAILING_PUNCT.replace(trimmed, "");
    no_punct.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}

fn first_line(text: &str) -> Option<&str> {
    text.split(['\r', '\n'])
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}
