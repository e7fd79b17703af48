//! Remote chat-completion tagger (OpenAI Chat Completions API). Requires `OPENAI_API_KEY`.
//!
//! The model is asked for a bare JSON array of `{ "entity_type", "span" }` objects.
//! Anything else (HTTP error, missing key, non-JSON reply) is an `Err` and the
//! pipeline falls back to patterns for that block.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Entity, EntityStrategy};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const MAX_ENTITIES: usize = 32;

const SYSTEM_PROMPT: &str = "You tag named entities in short event announcements. \
Return ONLY a JSON array of objects {\"entity_type\": \"LOC\"|\"ORG\", \"span\": string}. \
LOC = venues, cities, addresses. ORG = organizations or named events. \
Spans must be copied verbatim from the input. Return [] when there are none.";

pub struct CompletionStrategy {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl CompletionStrategy {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::with_endpoint(api_key, model_override, ENDPOINT)
    }

    pub fn with_endpoint(api_key: String, model_override: Option<&str>, endpoint: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("calclik/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_MODEL).to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[async_trait]
impl EntityStrategy for CompletionStrategy {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        if self.api_key.is_empty() {
            bail!("OPENAI_API_KEY is not set");
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
            max_tokens: 300,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("completion API returned {status}");
        }
        let body: Resp = resp.json().await.context("decoding completion response")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| anyhow!("completion response has no choices"))?;
        parse_entities(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Parse the model reply. Tolerates a surrounding Markdown code fence.
pub fn parse_entities(content: &str) -> anyhow::Result<Vec<Entity>> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();
    let mut ents: Vec<Entity> =
        serde_json::from_str(body).context("completion reply is not a JSON entity array")?;
    ents.retain(|e| !e.span.trim().is_empty());
    ents.truncate(MAX_ENTITIES);
    Ok(ents)
}
