// src/lib.rs
// Public library surface for the service binary and integration tests.

// Core: text → blocks → records → annotations → calendar exports
pub mod classify;
pub mod export;
pub mod extract;
pub mod patterns;
pub mod pipeline;
pub mod segment;

// Collaborators at the core's boundary
pub mod entities;
pub mod page;

// Service plumbing
pub mod api;
pub mod config;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::classify::{annotate, AnnotatedEvent, Category};
pub use crate::config::AppConfig;
pub use crate::extract::{extract_event, EventRecord, FieldExtractor};
pub use crate::pipeline::{ScanReport, ScanRequest, Scanner};
pub use crate::segment::{segment, CandidateBlock, Granularity, SegmenterConfig};
