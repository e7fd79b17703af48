// src/export/links.rs
//! Google Calendar / Outlook compose URLs.
//!
//! Google wants `YYYYMMDDTHHMMSS/YYYYMMDDTHHMMSS` (separators stripped), Outlook wants
//! `YYYY-MM-DDTHH:MM:SS`. Every user-controlled value goes through the same
//! component encoder as a browser's `encodeURIComponent`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{details, EventWindow};
use crate::extract::EventRecord;

const GOOGLE_BASE: &str = "https://calendar.google.com/calendar/event?action=TEMPLATE";
const OUTLOOK_BASE: &str = "https://outlook.live.com/calendar/0/action/compose";
const ISO_LOCAL: &str = "%Y-%m-%dT%H:%M:%S";

/// Unreserved set of `encodeURIComponent`: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn google_url(record: &EventRecord) -> String {
    google_url_for(record, EventWindow::now(record))
}

pub fn outlook_url(record: &EventRecord) -> String {
    outlook_url_for(record, EventWindow::now(record))
}

pub fn google_url_for(record: &EventRecord, window: EventWindow) -> String {
    let start = strip_separators(&window.start.format(ISO_LOCAL).to_string());
    let end = strip_separators(&window.end.format(ISO_LOCAL).to_string());
    format!(
        "{GOOGLE_BASE}&text={}&dates={start}/{end}&location={}&details={}",
        encode_component(&record.title),
        encode_component(&record.location),
        encode_component(&details(record)),
    )
}

pub fn outlook_url_for(record: &EventRecord, window: EventWindow) -> String {
    format!(
        "{OUTLOOK_BASE}?subject={}&startdt={}&enddt={}&location={}&body={}",
        encode_component(&record.title),
        window.start.format(ISO_LOCAL),
        window.end.format(ISO_LOCAL),
        encode_component(&record.location),
        encode_component(&details(record)),
    )
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != '-' && *c != ':').collect()
}
