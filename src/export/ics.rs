// src/export/ics.rs
//! iCalendar (RFC 5545) document for a single VEVENT.
//!
//! The VEVENT itself is an `icalendar::Event`; the crate writes CRLF content lines and
//! folds long ones. The VCALENDAR envelope carries our own PRODID.
//! DTSTART/DTEND are floating local times (no `Z`); DTSTAMP is UTC.

use chrono::{DateTime, Local, Utc};
use icalendar::{Component, Event};
use uuid::Uuid;

use super::{details, EventWindow};
use crate::extract::EventRecord;

pub const PRODID: &str = "-//CalClik//Event Scanner//EN";
const UID_DOMAIN: &str = "calclik.app";
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// ICS document for `record`, stamped now.
pub fn to_ics(record: &EventRecord) -> String {
    to_ics_at(record, Utc::now())
}

/// ICS document for `record` with an explicit generation instant (DTSTAMP, UID and
/// the default date all derive from `now`).
pub fn to_ics_at(record: &EventRecord, now: DateTime<Utc>) -> String {
    let today = now.with_timezone(&Local).date_naive();
    let window = EventWindow::for_record(record, today);

    let mut event = Event::new();
    event.uid(&uid(now));
    event.timestamp(now);
    event.add_property("DTSTART", window.start.format(LOCAL_FORMAT).to_string());
    event.add_property("DTEND", window.end.format(LOCAL_FORMAT).to_string());
    event.summary(&escape_text(&record.title));
    event.description(&escape_text(&details(record)));
    if !record.location.is_empty() {
        event.add_property("LOCATION", escape_text(&record.location));
    }

    let mut out = format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:{PRODID}\r\n");
    out.push_str(event.to_string().trim_end());
    out.push_str("\r\nEND:VCALENDAR\r\n");
    out
}

/// `<millis>-<uuid v4>@calclik.app`: sortable by generation time, unique across processes.
fn uid(now: DateTime<Utc>) -> String {
    format!("{}-{}@{UID_DOMAIN}", now.timestamp_millis(), Uuid::new_v4())
}

/// RFC 5545 §3.3.11 TEXT escaping.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
