// src/segment.rs
//! Block segmenter: reduces a whole document to at most ten date/time-bearing
//! candidate blocks, in source order.
//!
//! Two granularities:
//! - `paragraph`: split on blank-line runs; each line of a block is trimmed, line
//!   structure is kept (the extractor reads the first line as a title candidate).
//! - `sentence`:  split on `.`/`!`/`?` runs; short fragments are dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::patterns::has_temporal_signal;

/// Hard ceiling on the number of blocks one scan may return.
pub const MAX_CANDIDATE_BLOCKS: usize = 10;
/// Sentences at or below this many chars are not considered (sentence mode).
pub const DEFAULT_MIN_SENTENCE_CHARS: usize = 20;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n+").expect("paragraph break regex"));
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence break regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Paragraph,
    Sentence,
}

impl std::str::FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paragraph" | "para" => Ok(Self::Paragraph),
            "sentence" => Ok(Self::Sentence),
            other => anyhow::bail!("unknown granularity `{other}`"),
        }
    }
}

/// A span of the raw text that carries a date or time signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBlock {
    pub text: String,
    /// Byte offset of the (trimmed) span in the scanned text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub granularity: Granularity,
    /// Clamped to `MAX_CANDIDATE_BLOCKS`.
    pub max_blocks: usize,
    pub min_sentence_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Paragraph,
            max_blocks: MAX_CANDIDATE_BLOCKS,
            min_sentence_chars: DEFAULT_MIN_SENTENCE_CHARS,
        }
    }
}

impl SegmenterConfig {
    pub fn with_granularity(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    fn limit(&self) -> usize {
        self.max_blocks.clamp(1, MAX_CANDIDATE_BLOCKS)
    }
}

/// Split `raw` and keep the spans that carry a date/time signal.
pub fn segment(raw: &str, cfg: &SegmenterConfig) -> Vec<CandidateBlock> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let spans = match cfg.granularity {
        Granularity::Paragraph => split_spans(raw, &PARAGRAPH_BREAK),
        Granularity::Sentence => split_spans(raw, &SENTENCE_BREAK),
    };

    let mut out = Vec::new();
    for (offset, span) in spans {
        let text = match cfg.granularity {
            Granularity::Paragraph => clean_paragraph(span),
            Granularity::Sentence => {
                let s = span.trim();
                if s.chars().count() <= cfg.min_sentence_chars {
                    continue;
                }
                s.to_string()
            }
        };
        if text.is_empty() || !has_temporal_signal(&text) {
            continue;
        }
        let lead = span.len() - span.trim_start().len();
        out.push(CandidateBlock {
            text,
            source_offset: Some(offset + lead),
        });
        if out.len() >= cfg.limit() {
            break;
        }
    }

    debug!(
        target: "segment",
        granularity = ?cfg.granularity,
        blocks = out.len(),
        "segmented text"
    );
    out
}

/// Pieces of `raw` between delimiter matches, with their byte offsets.
fn split_spans<'a>(raw: &'a str, delim: &Regex) -> Vec<(usize, &'a str)> {
    let mut spans = Vec::new();
    let mut last = 0usize;
    for m in delim.find_iter(raw) {
        spans.push((last, &raw[last..m.start()]));
        last = m.end();
    }
    spans.push((last, &raw[last..]));
    spans
}

/// Trim every line, keep line breaks, trim the whole block.
fn clean_paragraph(block: &str) -> String {
    block
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
