// src/extract/mod.rs
//! Field extractor: one candidate block in, zero or one `EventRecord` out.
//!
//! Order:
//! 1) Title (organization entities, then first line / fallback heuristics). Empty → no event.
//! 2) Date and time: first pattern match, normalized.
//! 3) Location (location entities, then label / held-at / venue / after-time patterns).
//! 4) Description (first 200 chars + "...") and first URL.
//!
//! Nothing here fails: a non-matching pattern just leaves its field empty.

pub mod location;
pub mod title;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{join_spans, Entity};
use crate::patterns::{find_date, find_time, find_url, normalize_date, normalize_time};

pub const DEFAULT_MAX_LOCATION_CHARS: usize = 100;
pub const DEFAULT_MAX_TITLE_CHARS: usize = 100;
pub const DEFAULT_MAX_DESCRIPTION_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";

/// Structured event pulled out of one block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub title: String,
    /// ISO `YYYY-MM-DD` or empty.
    pub date: String,
    /// 24h `HH:MM`, the raw token when it could not be normalized, or empty.
    pub time: String,
    pub location: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// 100 is canonical; 50 reproduces the lighter fallback variant.
    pub max_location_chars: usize,
    pub max_title_chars: usize,
    pub max_description_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_location_chars: DEFAULT_MAX_LOCATION_CHARS,
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            max_description_chars: DEFAULT_MAX_DESCRIPTION_CHARS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    cfg: ExtractorConfig,
}

impl FieldExtractor {
    pub fn new(cfg: ExtractorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.cfg
    }

    /// Pattern-only extraction.
    pub fn extract(&self, text: &str) -> Option<EventRecord> {
        self.extract_with_entities(text, None)
    }

    /// Extraction preferring externally supplied entities for title and location.
    pub fn extract_with_entities(
        &self,
        text: &str,
        entities: Option<&[Entity]>,
    ) -> Option<EventRecord> {
        let title = self.title(text, entities);
        if title.is_empty() {
            debug!(target: "extract", "no title derivable, block dropped");
            return None;
        }

        Some(EventRecord {
            title,
            date: find_date(text).map(normalize_date).unwrap_or_default(),
            time: find_time(text).map(normalize_time).unwrap_or_default(),
            location: self.location(text, entities),
            description: describe(text, self.cfg.max_description_chars),
            url: find_url(text).map(str::to_string).unwrap_or_default(),
        })
    }

    fn title(&self, text: &str, entities: Option<&[Entity]>) -> String {
        if let Some(ents) = entities {
            let orgs = join_spans(ents.iter().filter(|e| e.is_organization()));
            let t = title::clean_title(&orgs, self.cfg.max_title_chars);
            if !t.is_empty() {
                return t;
            }
        }
        title::title_from_text(text, self.cfg.max_title_chars)
    }

    fn location(&self, text: &str, entities: Option<&[Entity]>) -> String {
        if let Some(ents) = entities {
            let locs = join_spans(ents.iter().filter(|e| e.is_location()));
            let l = location::cap(&locs, self.cfg.max_location_chars);
            if !l.is_empty() {
                return l;
            }
        }
        location::location_from_text(text, self.cfg.max_location_chars)
    }
}

/// Pattern-only extraction with the default caps.
pub fn extract_event(text: &str) -> Option<EventRecord> {
    FieldExtractor::default().extract(text)
}

/// First `max_chars` chars of the block, with an ellipsis marker when cut.
pub fn describe(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str(ELLIPSIS);
        out
    } else {
        text.to_string()
    }
}
