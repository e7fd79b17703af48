// src/config.rs
//! Layered runtime configuration.
//!
//! 1) `$CALCLIK_CONFIG_PATH` (must exist when set)
//! 2) `config/calclik.toml`
//! 3) built-in defaults
//!
//! Env overrides are applied on top, then `validate` clamps out-of-range values.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::entities::lexicon::lexicon_dir;
use crate::entities::Provider;
use crate::extract::{ExtractorConfig, DEFAULT_MAX_LOCATION_CHARS};
use crate::segment::{SegmenterConfig, MAX_CANDIDATE_BLOCKS};

pub const ENV_CONFIG_PATH: &str = "CALCLIK_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/calclik.toml";

fn default_entity_timeout_ms() -> u64 {
    3000
}
fn default_fetch_timeout_ms() -> u64 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// "none" | "lexicon" | "openai"
    pub provider: Provider,
    /// Directory of `*.json` lexicon files (lexicon provider).
    pub lexicon_dir: PathBuf,
    /// Completion model override (openai provider).
    pub model: Option<String>,
    /// Per-block budget for the strategy call.
    pub timeout_ms: u64,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            provider: Provider::None,
            lexicon_dir: lexicon_dir(),
            model: None,
            timeout_ms: default_entity_timeout_ms(),
        }
    }
}

impl EntityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Timeout for `/scan/url` page fetches.
    pub fetch_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub segmenter: SegmenterConfig,
    pub extractor: ExtractorConfig,
    pub entities: EntityConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing calclik config")?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// File (env path, then default path, then defaults) + env overrides + validation.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if pb.exists() {
                Self::load_from(&pb)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        validate(&mut cfg);
        Ok(cfg)
    }

    /// `CALCLIK_GRANULARITY`, `CALCLIK_LOCATION_CAP`, `CALCLIK_ENTITY_PROVIDER`.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CALCLIK_GRANULARITY") {
            match v.parse() {
                Ok(g) => self.segmenter.granularity = g,
                Err(e) => warn!(error = %e, "ignoring CALCLIK_GRANULARITY"),
            }
        }
        if let Ok(v) = std::env::var("CALCLIK_LOCATION_CAP") {
            match v.trim().parse::<usize>() {
                Ok(n) => self.extractor.max_location_chars = n,
                Err(e) => warn!(error = %e, "ignoring CALCLIK_LOCATION_CAP"),
            }
        }
        if let Ok(v) = std::env::var("CALCLIK_ENTITY_PROVIDER") {
            match v.parse() {
                Ok(p) => self.entities.provider = p,
                Err(e) => warn!(error = %e, "ignoring CALCLIK_ENTITY_PROVIDER"),
            }
        }
    }
}

/// Clamp instead of failing: max blocks 1..=10, location cap 1..=100, timeouts >= 1 ms.
pub fn validate(cfg: &mut AppConfig) {
    cfg.segmenter.max_blocks = cfg.segmenter.max_blocks.clamp(1, MAX_CANDIDATE_BLOCKS);
    cfg.extractor.max_location_chars = cfg
        .extractor
        .max_location_chars
        .clamp(1, DEFAULT_MAX_LOCATION_CHARS);
    cfg.extractor.max_title_chars = cfg.extractor.max_title_chars.max(1);
    cfg.extractor.max_description_chars = cfg.extractor.max_description_chars.max(1);
    cfg.entities.timeout_ms = cfg.entities.timeout_ms.max(1);
    cfg.server.fetch_timeout_ms = cfg.server.fetch_timeout_ms.max(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Granularity;

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.segmenter.granularity, Granularity::Paragraph);
        assert_eq!(cfg.segmenter.max_blocks, 10);
        assert_eq!(cfg.extractor.max_location_chars, 100);
        assert_eq!(cfg.entities.provider, Provider::None);
        assert_eq!(cfg.entities.timeout_ms, 3000);
        assert_eq!(cfg.server.fetch_timeout_ms, 8000);
    }

    #[test]
    fn sections_are_read() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [segmenter]
            granularity = "sentence"
            min_sentence_chars = 12

            [extractor]
            max_location_chars = 50

            [entities]
            provider = "lexicon"
            lexicon_dir = "/tmp/lex"
            timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(cfg.segmenter.granularity, Granularity::Sentence);
        assert_eq!(cfg.segmenter.min_sentence_chars, 12);
        assert_eq!(cfg.extractor.max_location_chars, 50);
        assert_eq!(cfg.entities.provider, Provider::Lexicon);
        assert_eq!(cfg.entities.lexicon_dir, PathBuf::from("/tmp/lex"));
        assert_eq!(cfg.entities.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("[segmenter]\ngranularity = \"word\"").is_err());
    }

    #[test]
    fn validate_clamps() {
        let mut cfg = AppConfig::default();
        cfg.segmenter.max_blocks = 500;
        cfg.extractor.max_location_chars = 0;
        cfg.entities.timeout_ms = 0;
        validate(&mut cfg);
        assert_eq!(cfg.segmenter.max_blocks, 10);
        assert_eq!(cfg.extractor.max_location_chars, 1);
        assert_eq!(cfg.entities.timeout_ms, 1);
    }
}
