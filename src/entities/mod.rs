// src/entities/mod.rs
//! Entity-extraction strategies: pluggable sources of location/organization spans
//! that the field extractor prefers over its own patterns.
//!
//! The extractor itself never calls a strategy. The pipeline asks the strategy first
//! (with a timeout), then hands the spans to the extractor. A failing or slow
//! strategy only means pattern-only extraction for that block.

pub mod completion;
pub mod lexicon;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use completion::CompletionStrategy;
pub use lexicon::LexiconStrategy;

/// One tagged span, e.g. `{ "entity_type": "B-LOC", "span": "Austin" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(alias = "entity", alias = "entityType")]
    pub entity_type: String,
    #[serde(alias = "word")]
    pub span: String,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, span: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            span: span.into(),
        }
    }

    /// NER location classes (`LOC`, `B-LOC`, `I-LOC`, `location`, ...).
    pub fn is_location(&self) -> bool {
        self.entity_type.to_ascii_uppercase().contains("LOC")
    }

    /// NER organization classes (`ORG`, `B-ORG`, `organization`, ...).
    pub fn is_organization(&self) -> bool {
        self.entity_type.to_ascii_uppercase().contains("ORG")
    }
}

/// Concatenate spans with single spaces; `##piece` word-pieces glue onto the previous token.
pub fn join_spans<'a>(spans: impl IntoIterator<Item = &'a Entity>) -> String {
    let mut out = String::new();
    for e in spans {
        let s = e.span.trim();
        if s.is_empty() {
            continue;
        }
        if let Some(piece) = s.strip_prefix("##") {
            out.push_str(piece);
        } else {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(s);
        }
    }
    out.trim().to_string()
}

#[async_trait]
pub trait EntityStrategy: Send + Sync {
    /// Tag `text`. Errors are handled by the caller (fallback to patterns).
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<Entity>>;
    /// Strategy name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynEntityStrategy = Arc<dyn EntityStrategy>;

/// Pattern-only mode: never supplies entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

#[async_trait]
impl EntityStrategy for NoEntities {
    async fn entities(&self, _text: &str) -> anyhow::Result<Vec<Entity>> {
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "none"
    }
}

/// Returns the same entities for every input. Used for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct FixedEntities {
    pub fixed: Vec<Entity>,
}

#[async_trait]
impl EntityStrategy for FixedEntities {
    async fn entities(&self, _text: &str) -> anyhow::Result<Vec<Entity>> {
        Ok(self.fixed.clone())
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    None,
    Lexicon,
    Openai,
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "disabled" => Ok(Self::None),
            "lexicon" => Ok(Self::Lexicon),
            "openai" => Ok(Self::Openai),
            other => anyhow::bail!("unknown entity provider `{other}`"),
        }
    }
}

/// Factory: build the configured strategy.
///
/// * `ENTITY_TEST_MODE=none` forces pattern-only mode (tests, offline runs).
/// * A lexicon that fails to load degrades to pattern-only mode with a warning.
pub fn build_strategy(cfg: &crate::config::EntityConfig) -> DynEntityStrategy {
    if std::env::var("ENTITY_TEST_MODE")
        .map(|v| v == "none")
        .unwrap_or(false)
    {
        return Arc::new(NoEntities);
    }

    match cfg.provider {
        Provider::None => Arc::new(NoEntities),
        Provider::Lexicon => match LexiconStrategy::from_dir(&cfg.lexicon_dir) {
            Ok(lex) => Arc::new(lex),
            Err(e) => {
                warn!(error = ?e, dir = %cfg.lexicon_dir.display(), "entity lexicon unavailable, pattern-only mode");
                Arc::new(NoEntities)
            }
        },
        Provider::Openai => Arc::new(CompletionStrategy::new(cfg.model.as_deref())),
    }
}
