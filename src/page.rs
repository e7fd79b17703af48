// src/page.rs
//! Page text source: HTML document → plain text the segmenter can work with.
//!
//! Block-level closing tags turn into blank lines so paragraph segmentation still sees
//! the page's structure. `<br>` is a single line break. Scripts, styles and comments
//! are dropped entirely.

use std::time::Duration;

use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Upper bound on the text handed to the scanner.
pub const MAX_PAGE_CHARS: usize = 200_000;

static RE_DROP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>")
        .expect("drop regex")
});
static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title regex"));
static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br regex"));
static RE_BLOCK_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:p|div|section|article|header|footer|li|ul|ol|h[1-6]|tr|table|blockquote|pre)\s*>")
        .expect("block end regex")
});
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tags regex"));
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\x0B\x0C\u{A0}]+").expect("ws regex"));
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub title: String,
    pub text: String,
}

/// Strip markup, keep paragraph structure, decode entities.
pub fn html_to_text(html: &str) -> PageText {
    let title = RE_TITLE
        .captures(html)
        .map(|c| collapse_inline(&html_escape::decode_html_entities(&c[1])))
        .unwrap_or_default();

    let body = RE_DROP.replace_all(html, "");
    let body = RE_TITLE.replace_all(&body, "");
    let body = RE_BR.replace_all(&body, "\n");
    let body = RE_BLOCK_END.replace_all(&body, "\n\n");
    let body = RE_TAGS.replace_all(&body, "");
    let decoded = html_escape::decode_html_entities(&body);

    let lines: Vec<String> = decoded
        .replace("\r\n", "\n")
        .split('\n')
        .map(|l| RE_SPACES.replace_all(l, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    let mut text = RE_BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string();

    if text.chars().count() > MAX_PAGE_CHARS {
        text = text.chars().take(MAX_PAGE_CHARS).collect();
    }
    PageText { title, text }
}

fn collapse_inline(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// HTTP client with the timeouts used for page fetches.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("calclik/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Fetch `url` and convert it. Non-HTML bodies are treated as plain text.
pub async fn fetch(client: &reqwest::Client, url: &str) -> anyhow::Result<PageText> {
    let parsed = reqwest::Url::parse(url).with_context(|| format!("invalid url {url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("unsupported url scheme {}", parsed.scheme());
    }

    let resp = client
        .get(parsed)
        .send()
        .await
        .with_context(|| format!("fetching {url}"))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("{url} returned {status}");
    }
    let is_html = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("html"))
        .unwrap_or(true);
    let body = resp.text().await.context("reading page body")?;
    debug!(target: "page", bytes = body.len(), is_html, "page fetched");

    if is_html {
        Ok(html_to_text(&body))
    } else {
        Ok(PageText {
            title: String::new(),
            text: body.chars().take(MAX_PAGE_CHARS).collect(),
        })
    }
}
