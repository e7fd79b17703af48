// src/classify.rs
//! Confidence & categorization: informational annotations on an extracted record.
//!
//! Nothing here gates extraction. `confidence` is a completeness score (field presence),
//! not a probability. Categories are keyword sets checked in a fixed priority order,
//! first match wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::EventRecord;

pub const BASE_CONFIDENCE: f64 = 50.0;
pub const MAX_CONFIDENCE: f64 = 99.9;
pub const MAX_TAGS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tech,
    Art,
    Music,
    Business,
    Sport,
    Culture,
    Food,
    #[default]
    General,
}

impl Category {
    /// Priority order used by `category`; `General` is the fallback and not listed.
    pub const RANKED: [Category; 7] = [
        Category::Tech,
        Category::Art,
        Category::Music,
        Category::Business,
        Category::Sport,
        Category::Culture,
        Category::Food,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Art => "art",
            Category::Music => "music",
            Category::Business => "business",
            Category::Sport => "sport",
            Category::Culture => "culture",
            Category::Food => "food",
            Category::General => "general",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Tech => "💻",
            Category::Art => "🎨",
            Category::Music => "🎵",
            Category::Business => "💼",
            Category::Sport => "⚽",
            Category::Culture => "🎭",
            Category::Food => "🍽️",
            Category::General => "📅",
        }
    }

    /// Display tag: `"tech"` → `"Tech"`.
    pub fn tag(self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }

    fn keywords(self) -> Option<&'static Regex> {
        match self {
            Category::Tech => Some(&*TECH),
            Category::Art => Some(&*ART),
            Category::Music => Some(&*MUSIC),
            Category::Business => Some(&*BUSINESS),
            Category::Sport => Some(&*SPORT),
            Category::Culture => Some(&*CULTURE),
            Category::Food => Some(&*FOOD),
            Category::General => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn word_set(words: &[&str]) -> Regex {
    let alt = words.join("|");
    Regex::new(&format!(r"(?i)\b(?:{alt})\b")).expect("keyword regex")
}

static TECH: Lazy<Regex> = Lazy::new(|| {
    word_set(&[
        "tech", "ai", "ml", "summit", "conference", "hackathon", "coding", "developer",
        "software", "digital",
    ])
});
static ART: Lazy<Regex> = Lazy::new(|| {
    word_set(&["art", "exhibition", "gallery", "museum", "painting", "sculpture", "artist"])
});
static MUSIC: Lazy<Regex> = Lazy::new(|| {
    word_set(&["music", "concert", "jazz", "rock", "festival", "band", "live", "performance"])
});
static BUSINESS: Lazy<Regex> = Lazy::new(|| {
    word_set(&["business", "meeting", "corporate", "networking", "seminar", "workshop"])
});
static SPORT: Lazy<Regex> = Lazy::new(|| {
    word_set(&["sport", "game", "match", "championship", "tournament", "fitness"])
});
static CULTURE: Lazy<Regex> = Lazy::new(|| {
    word_set(&["culture", "cultural", "theater", "theatre", "opera", "ballet"])
});
static FOOD: Lazy<Regex> = Lazy::new(|| {
    word_set(&["food", "restaurant", "dining", "cuisine", "culinary", "tasting"])
});

/// Secondary tags, checked independently against title + description.
static SECONDARY: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("Conference", word_set(&["conference", "summit"])),
        ("Live", word_set(&["live", "performance"])),
        ("Free", word_set(&["free", "complimentary"])),
        ("Online", word_set(&["online", "virtual", "zoom", "webinar"])),
        ("Workshop", word_set(&["workshop", "training"])),
    ]
});

/// Completeness score in `[50, 99.9]`.
pub fn confidence(record: &EventRecord) -> f64 {
    let mut score = BASE_CONFIDENCE;
    if record.title.chars().count() > 5 {
        score += 20.0;
    }
    if !record.date.is_empty() {
        score += 15.0;
    }
    if !record.time.is_empty() {
        score += 10.0;
    }
    if !record.location.is_empty() {
        score += 15.0;
    }
    if record.description.chars().count() > 20 {
        score += 10.0;
    }
    if !record.url.is_empty() {
        score += 5.0;
    }
    score.min(MAX_CONFIDENCE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Med,
    Low,
}

pub fn confidence_level(score: f64) -> ConfidenceLevel {
    if score >= 90.0 {
        ConfidenceLevel::High
    } else if score >= 70.0 {
        ConfidenceLevel::Med
    } else {
        ConfidenceLevel::Low
    }
}

/// First keyword set (in priority order) matching title + description + location.
pub fn category(record: &EventRecord) -> Category {
    let haystack = format!("{} {} {}", record.title, record.description, record.location);
    Category::RANKED
        .into_iter()
        .find(|c| c.keywords().is_some_and(|re| re.is_match(&haystack)))
        .unwrap_or(Category::General)
}

/// Capitalized category plus up to two secondary tags.
pub fn tags(record: &EventRecord, category: Category) -> Vec<String> {
    let haystack = format!("{} {}", record.title, record.description);
    let mut out = vec![category.tag()];
    for (tag, re) in SECONDARY.iter() {
        if out.len() >= MAX_TAGS {
            break;
        }
        if re.is_match(&haystack) {
            out.push((*tag).to_string());
        }
    }
    out
}

/// An `EventRecord` with its annotations; serializes flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEvent {
    #[serde(flatten)]
    pub record: EventRecord,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub category: Category,
    pub icon: String,
    pub tags: Vec<String>,
}

pub fn annotate(record: EventRecord) -> AnnotatedEvent {
    let score = confidence(&record);
    let cat = category(&record);
    let tags = tags(&record, cat);
    AnnotatedEvent {
        confidence: score,
        confidence_level: confidence_level(score),
        category: cat,
        icon: cat.icon().to_string(),
        tags,
        record,
    }
}
