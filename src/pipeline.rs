// src/pipeline.rs
//! Scan pipeline: raw text → candidate blocks → event records → annotated events.
//!
//! `Scanner::scan` is pattern-only and synchronous. `Scanner::scan_with` asks an
//! entity strategy first, one block at a time under a timeout; a failing or slow
//! strategy degrades that block to pattern-only extraction. Output order always
//! follows block order.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::{annotate, AnnotatedEvent};
use crate::entities::{Entity, EntityStrategy};
use crate::extract::{ExtractorConfig, FieldExtractor};
use crate::metrics::ensure_described;
use crate::patterns::{DATE_PATTERN, TIME_PATTERN};
use crate::segment::{segment, CandidateBlock, Granularity, SegmenterConfig};

/// Entity strategy timeout when the caller has no opinion.
pub const DEFAULT_ENTITY_TIMEOUT: Duration = Duration::from_millis(3000);

// Dev logging gate: CALCLIK_DEV_LOG=1 AND dev env (debug build or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("CALCLIK_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short SHA-256 prefix; stands in for block text in logs.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_block(block: &CandidateBlock, event: Option<&AnnotatedEvent>, source: &str) {
    if !dev_logging_enabled() {
        return;
    }
    // Never log raw text. Only hashed id + derived fields.
    let id = anon_hash(&block.text);
    match event {
        Some(ev) => debug!(
            target: "pipeline",
            %id, source,
            offset = ?block.source_offset,
            category = %ev.category,
            confidence = ev.confidence,
            has_date = !ev.record.date.is_empty(),
            has_time = !ev.record.time.is_empty(),
            has_location = !ev.record.location.is_empty(),
            "block kept"
        ),
        None => debug!(target: "pipeline", %id, source, offset = ?block.source_offset, "block dropped"),
    }
}

/// Input of one scan: document text plus traceability fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Overrides the configured granularity for this scan only.
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub title: Option<String>,
    pub url: Option<String>,
    /// Distinct raw date tokens anywhere in the text, first-seen order.
    pub dates: Vec<String>,
    /// Distinct raw time tokens anywhere in the text, first-seen order.
    pub times: Vec<String>,
    /// Number of candidate blocks the segmenter produced.
    pub blocks: usize,
    pub events: Vec<AnnotatedEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    segmenter: SegmenterConfig,
    extractor: FieldExtractor,
}

impl Scanner {
    pub fn new(segmenter: SegmenterConfig, extractor: ExtractorConfig) -> Self {
        Self {
            segmenter,
            extractor: FieldExtractor::new(extractor),
        }
    }

    pub fn segmenter(&self) -> &SegmenterConfig {
        &self.segmenter
    }

    fn segmenter_for(&self, granularity: Option<Granularity>) -> SegmenterConfig {
        let mut cfg = self.segmenter.clone();
        if let Some(g) = granularity {
            cfg.granularity = g;
        }
        cfg
    }

    /// Pattern-only scan.
    pub fn scan(&self, raw: &str) -> Vec<AnnotatedEvent> {
        self.scan_blocks(&segment(raw, &self.segmenter))
    }

    fn scan_blocks(&self, blocks: &[CandidateBlock]) -> Vec<AnnotatedEvent> {
        blocks
            .iter()
            .filter_map(|b| {
                let ev = self.extractor.extract(&b.text).map(annotate);
                dev_log_block(b, ev.as_ref(), "patterns");
                ev
            })
            .collect()
    }

    /// Scan with an entity strategy; each block falls back to patterns on error/timeout.
    pub async fn scan_with(
        &self,
        raw: &str,
        strategy: &dyn EntityStrategy,
        timeout: Duration,
    ) -> Vec<AnnotatedEvent> {
        let blocks = segment(raw, &self.segmenter);
        self.scan_blocks_with(&blocks, strategy, timeout).await
    }

    async fn scan_blocks_with(
        &self,
        blocks: &[CandidateBlock],
        strategy: &dyn EntityStrategy,
        timeout: Duration,
    ) -> Vec<AnnotatedEvent> {
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            let entities = entities_for(block, strategy, timeout).await;
            let ev = self
                .extractor
                .extract_with_entities(&block.text, entities.as_deref())
                .map(annotate);
            dev_log_block(
                block,
                ev.as_ref(),
                if entities.is_some() { strategy.name() } else { "patterns" },
            );
            if let Some(ev) = ev {
                out.push(ev);
            }
        }
        out
    }

    /// Full scan of one document, with traceability fields and raw token summary.
    pub async fn report(
        &self,
        req: ScanRequest,
        strategy: &dyn EntityStrategy,
        timeout: Duration,
    ) -> ScanReport {
        ensure_described();
        counter!("scan_requests_total").increment(1);
        let t0 = Instant::now();

        let blocks = segment(&req.text, &self.segmenter_for(req.granularity));
        let events = self.scan_blocks_with(&blocks, strategy, timeout).await;

        let ms = t0.elapsed().as_secs_f64() * 1000.0;
        histogram!("scan_duration_ms").record(ms);
        counter!("scan_blocks_total").increment(blocks.len() as u64);
        counter!("scan_events_total").increment(events.len() as u64);
        info!(
            target: "pipeline",
            blocks = blocks.len(),
            events = events.len(),
            strategy = strategy.name(),
            ms,
            "scan finished"
        );

        ScanReport {
            dates: distinct_tokens(DATE_PATTERN.find_iter(&req.text)),
            times: distinct_tokens(TIME_PATTERN.find_iter(&req.text)),
            title: req.title.filter(|t| !t.trim().is_empty()),
            url: req.url.filter(|u| !u.trim().is_empty()),
            blocks: blocks.len(),
            events,
        }
    }
}

/// `None` means "use patterns": strategy error, timeout, or no entities at all.
async fn entities_for(
    block: &CandidateBlock,
    strategy: &dyn EntityStrategy,
    timeout: Duration,
) -> Option<Vec<Entity>> {
    match tokio::time::timeout(timeout, strategy.entities(&block.text)).await {
        Ok(Ok(ents)) if !ents.is_empty() => Some(ents),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            counter!("entity_strategy_failures_total").increment(1);
            warn!(target: "pipeline", strategy = strategy.name(), error = %e, "entity strategy failed, pattern fallback");
            None
        }
        Err(_) => {
            counter!("entity_strategy_failures_total").increment(1);
            warn!(target: "pipeline", strategy = strategy.name(), timeout_ms = timeout.as_millis() as u64, "entity strategy timed out, pattern fallback");
            None
        }
    }
}

fn distinct_tokens<'t>(matches: impl Iterator<Item = regex::Match<'t>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in matches {
        let tok = m.as_str().trim();
        if !out.iter().any(|seen| seen == tok) {
            out.push(tok.to_string());
        }
    }
    out
}
