// src/export/mod.rs
//! Calendar serializer: `EventRecord` → ICS document, Google/Outlook compose URLs,
//! share text.
//!
//! All three calendar targets compute their start/end from the same `EventWindow`, so
//! they always agree on the wall-clock instant. A missing or non-`HH:MM` time means
//! the default 09:00–10:00 window; a missing or invalid date means today (local).

pub mod ics;
pub mod links;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::EventRecord;
use crate::patterns::{parse_hhmm, parse_iso_date};

pub use ics::{to_ics, to_ics_at};
pub use links::{google_url, outlook_url};

pub const DEFAULT_START_HOUR: u32 = 9;

/// Local (floating) start/end of an exported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl EventWindow {
    /// Window for `record`, using `today` when the record has no usable date.
    ///
    /// A date so close to the end of the calendar that the end time would overflow
    /// counts as unusable too.
    pub fn for_record(record: &EventRecord, today: NaiveDate) -> Self {
        let date = parse_iso_date(&record.date).unwrap_or(today);
        let time = parse_hhmm(&record.time).unwrap_or(default_start());
        Self::starting_at(date.and_time(time)).unwrap_or_else(|| {
            debug!(target: "export", date = %record.date, "event window out of range; using default");
            let start = today.and_time(default_start());
            Self::starting_at(start).unwrap_or(Self {
                start,
                end: NaiveDateTime::MAX,
            })
        })
    }

    fn starting_at(start: NaiveDateTime) -> Option<Self> {
        let end = start.checked_add_signed(TimeDelta::hours(1))?;
        Some(Self { start, end })
    }

    /// Window for `record` relative to the current local date.
    pub fn now(record: &EventRecord) -> Self {
        Self::for_record(record, Local::now().date_naive())
    }
}

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Description plus the URL as a trailing `Link:` line.
pub(crate) fn details(record: &EventRecord) -> String {
    match (record.description.is_empty(), record.url.is_empty()) {
        (_, true) => record.description.clone(),
        (true, false) => format!("Link: {}", record.url),
        (false, false) => format!("{}\n\nLink: {}", record.description, record.url),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarTarget {
    Ics,
    Google,
    Outlook,
}

/// One rendered export, ready to be handed to a browser or saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum CalendarExport {
    Ics { filename: String, body: String },
    Google { url: String },
    Outlook { url: String },
}

pub fn export(record: &EventRecord, target: CalendarTarget) -> CalendarExport {
    match target {
        CalendarTarget::Ics => CalendarExport::Ics {
            filename: ics_filename(&record.title),
            body: to_ics(record),
        },
        CalendarTarget::Google => CalendarExport::Google {
            url: google_url(record),
        },
        CalendarTarget::Outlook => CalendarExport::Outlook {
            url: outlook_url(record),
        },
    }
}

/// Plain-text summary for clipboard / share sheets.
pub fn share_text(record: &EventRecord) -> String {
    let mut out = format!("{}\n📅 {}", record.title, record.date);
    if !record.time.is_empty() {
        out.push_str(" at ");
        out.push_str(&record.time);
    }
    out.push_str("\n📍 ");
    out.push_str(if record.location.is_empty() {
        "TBA"
    } else {
        &record.location
    });
    if !record.url.is_empty() {
        out.push_str("\n🔗 ");
        out.push_str(&record.url);
    }
    out
}

/// `"Tech Summit 2025"` → `"Tech_Summit_2025.ics"`.
pub fn ics_filename(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return "event.ics".to_string();
    }
    let stem: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}.ics")
}
