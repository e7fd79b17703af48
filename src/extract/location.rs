// src/extract/location.rs
//! Location heuristics, most specific signal first:
//! 1) `Location: ...` label
//! 2) "held at/in ..." phrase
//! 3) "at/in [the] <Capitalized ...> <venue word>"
//! 4) "at/in [the] <Capitalized ...>" on the same line, after the first time token

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::TIME_PATTERN;

static LABELED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Location:[ \t]*([^\n.]+)").expect("location label regex"));

static HELD_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:will\s+be\s+|be\s+)?held\s+(?:at|in)\s+(?:the\s+)?([^.\n]+)")
        .expect("held-at regex")
});

static VENUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\b(?:at|in)\s+(?:the\s+)?)([A-Z][a-zA-Z\s]+?(?i:Convention Center|Hotel|Center|Centre|Building|Office|Room|Hall|Ballroom|Auditorium|Theater|Theatre|Park|Plaza|Arena|Stadium|Headquarters))\b",
    )
    .expect("venue regex")
});

static AFTER_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:\b(?:at|in)\s+(?:the\s+)?)([A-Z][a-zA-Z ]*)").expect("after-time regex")
});

/// Words that end a free-form location phrase.
static STOP_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Don['’]t|Please|Bring|RSVP|All)\b").expect("stop word regex")
});

/// Pattern-only location for `text`, capped at `max_chars`. Empty if nothing matched.
pub fn location_from_text(text: &str, max_chars: usize) -> String {
    let found = labeled(text)
        .or_else(|| held_at(text))
        .or_else(|| venue(text))
        .or_else(|| after_time(text))
        .unwrap_or_default();
    cap(&found, max_chars)
}

pub fn cap(value: &str, max_chars: usize) -> String {
    value
        .trim()
        .chars()
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn labeled(text: &str) -> Option<String> {
    let c = LABELED.captures(text)?;
    non_empty(c[1].trim())
}

fn held_at(text: &str) -> Option<String> {
    let c = HELD_AT.captures(text)?;
    non_empty(until_stop_word(&c[1]))
}

fn venue(text: &str) -> Option<String> {
    let c = VENUE.captures(text)?;
    non_empty(c[1].trim())
}

fn after_time(text: &str) -> Option<String> {
    let time = TIME_PATTERN.find(text)?;
    let rest = text[time.end()..].split('\n').next().unwrap_or_default();
    let c = AFTER_TIME.captures(rest)?;
    non_empty(until_stop_word(&c[1]))
}

fn until_stop_word(phrase: &str) -> &str {
    match STOP_WORD.find(phrase) {
        Some(m) => phrase[..m.start()].trim(),
        None => phrase.trim(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
