// src/entities/lexicon.rs
//! Regex lexicon tagger loaded from JSON files in a directory (default `config/entities/`,
//! override with `ENTITY_LEXICON_DIR`).
//!
//! Each `*.json` file holds `{ "patterns": [{ "regex": "...", "entity_type": "LOC" }] }`.
//! `entity_type` falls back to the file stem (`venues.json` → `venues`), so a file named
//! `locations.json` tags locations without repeating the type on every pattern.
//!
//! Notes:
//! - Regexes must be compatible with the `regex` crate (no lookarounds).
//! - Case-insensitive matching can be requested with `(?i)` in patterns.
//! - Bad files and bad patterns are skipped, never fatal.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{Entity, EntityStrategy};

pub const ENV_LEXICON_DIR: &str = "ENTITY_LEXICON_DIR";
pub const DEFAULT_LEXICON_DIR: &str = "config/entities";

#[derive(Debug, Deserialize)]
struct Pattern {
    regex: String,
    #[serde(default)]
    entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    patterns: Vec<Pattern>,
}

#[derive(Debug)]
struct CompiledPattern {
    entity_type: String,
    re: Regex,
}

#[derive(Debug, Default)]
pub struct LexiconStrategy {
    patterns: Vec<CompiledPattern>,
}

/// `ENTITY_LEXICON_DIR` if set, else `config/entities`.
pub fn lexicon_dir() -> PathBuf {
    std::env::var(ENV_LEXICON_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LEXICON_DIR))
}

impl LexiconStrategy {
    /// Load every `*.json` file in `dir`, in file-name order.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let read_dir = fs::read_dir(dir)
            .with_context(|| format!("reading entity lexicon dir {}", dir.display()))?;

        let mut paths: Vec<PathBuf> = read_dir
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut patterns = Vec::new();
        for path in paths {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            match Self::compile(&content, &stem) {
                Ok(mut v) => patterns.append(&mut v),
                Err(e) => warn!(error = %e, file = %path.display(), "skipping lexicon file"),
            }
        }

        if patterns.is_empty() {
            return Err(anyhow!("no usable patterns in {}", dir.display()));
        }
        debug!(count = patterns.len(), "entity lexicon loaded");
        Ok(Self { patterns })
    }

    /// Build from a single JSON document (tests/tools).
    pub fn from_json_str(json: &str, default_type: &str) -> anyhow::Result<Self> {
        Ok(Self {
            patterns: Self::compile(json, default_type)?,
        })
    }

    fn compile(json: &str, default_type: &str) -> anyhow::Result<Vec<CompiledPattern>> {
        let file: LexiconFile = serde_json::from_str(json)?;
        let mut out = Vec::with_capacity(file.patterns.len());
        for p in file.patterns {
            match Regex::new(&p.regex) {
                Ok(re) => out.push(CompiledPattern {
                    entity_type: p.entity_type.unwrap_or_else(|| default_type.to_string()),
                    re,
                }),
                Err(e) => warn!(error = %e, regex = %p.regex, "skipping lexicon pattern"),
            }
        }
        Ok(out)
    }

    /// Synchronous tagging: every match of every pattern, in pattern order then text order.
    pub fn tag(&self, text: &str) -> Vec<Entity> {
        let mut out = Vec::new();
        for p in &self.patterns {
            for m in p.re.find_iter(text) {
                out.push(Entity::new(p.entity_type.clone(), m.as_str()));
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[async_trait]
impl EntityStrategy for LexiconStrategy {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        Ok(self.tag(text))
    }
    fn name(&self) -> &'static str {
        "lexicon"
    }
}
