//! OpenAI-compatible chat completions (Ollama serves the same API under `/v1`)
//! and the three model-backed capabilities built on them.
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use orion_core::config::ModelSettings;
use orion_core::error::{Error, Result};
use orion_core::traits::{AnswerSynthesizer, CurationModel, RelevanceJudge};
use orion_core::types::{DocumentChunk, RawDocument};

pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn from_settings(models: &ModelSettings) -> Self { Self::new(&models.llm_endpoint, &models.llm_model, models.llm_api_key.clone()) }

    pub fn model(&self) -> &str { &self.model }

    /// One system + user exchange at temperature 0. `json_mode` asks the server for
    /// a JSON object response.
    pub async fn complete(&self, system: &str, user: &str, json_mode: bool) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "temperature": 0,
            "stream": false,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if json_mode { body["response_format"] = json!({ "type": "json_object" }); }

        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key { req = req.bearer_auth(key); }

        let resp = req.send().await.map_err(|e| Error::Model(format!("connection to {url} failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Model(format!("{} returned {status}: {text}", self.model)));
        }
        let parsed: ChatResponse = resp.json().await.map_err(Error::model)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Model("no choices in response".into()))?;
        debug!(model = %self.model, chars = content.len(), "chat completion");
        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse { choices: Vec<Choice> }

#[derive(Debug, Deserialize)]
struct Choice { message: ChoiceMessage }

#[derive(Debug, Deserialize)]
struct ChoiceMessage { content: Option<String> }

/// Removes a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else { return trimmed };
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

const JUDGE_SYSTEM: &str = "You grade whether a retrieved document is relevant to a user question. \
If the document contains keywords or meaning related to the question, it is relevant. \
The test does not need to be strict; its goal is to filter out erroneous retrievals. \
Reply with a JSON object with a single key \"score\" whose value is \"yes\" or \"no\". No preamble or explanation.";

/// Reads `{"score": "yes" | "no"}`. Anything but a yes is irrelevant; unparsable
/// output is a judgment failure.
pub fn parse_judgment(text: &str) -> Result<bool> {
    let value: Value = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| Error::GradingJudgmentFailure(format!("unparsable judgment {text:?}: {e}")))?;
    let score = value
        .get("score")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::GradingJudgmentFailure(format!("judgment without a score: {text:?}")))?;
    Ok(score.trim().eq_ignore_ascii_case("yes"))
}

pub struct LlmJudge { chat: ChatClient }

impl LlmJudge {
    pub fn new(chat: ChatClient) -> Self { Self { chat } }
}

#[async_trait]
impl RelevanceJudge for LlmJudge {
    async fn judge(&self, chunk: &DocumentChunk, query: &str) -> Result<bool> {
        let user = format!("Here is the retrieved document:\n\n{}\n\nHere is the user question: {query}", chunk.content);
        let reply = self
            .chat
            .complete(JUDGE_SYSTEM, &user, true)
            .await
            .map_err(|e| Error::GradingJudgmentFailure(e.to_string()))?;
        parse_judgment(&reply)
    }
}

const ANSWER_SYSTEM: &str = "You are given a user query and a list of documents that may help answer it. \
Answer the query and point to where the user can learn more. Do not write a preamble.";

/// Source, time and content of every document, in order.
pub fn render_documents(documents: &[DocumentChunk]) -> String {
    documents
        .iter()
        .map(|d| format!("\n Source: {} Time: {} \n Content: {} \n", d.source, d.time().unwrap_or("None"), d.content))
        .collect()
}

pub struct LlmAnswerSynthesizer { chat: ChatClient }

impl LlmAnswerSynthesizer {
    pub fn new(chat: ChatClient) -> Self { Self { chat } }
}

#[async_trait]
impl AnswerSynthesizer for LlmAnswerSynthesizer {
    async fn synthesize(&self, query: &str, documents: &[DocumentChunk]) -> Result<String> {
        let user = format!("Here are the retrieved documents:\n\n{}\n\nHere is the user question: {query}", render_documents(documents));
        self.chat.complete(ANSWER_SYSTEM, &user, false).await
    }
}

const CURATION_SYSTEM: &str = "You keep technical documentation current. You receive the current documentation \
structure and new information chunks, and propose statements that insert, update or delete documentation \
entries so that it reflects the new information. Reply with one JSON object with a single key \"queries\" \
holding a list of statement strings. Return an empty list when the new information is conversational or \
not useful. Output only the JSON object.";

/// Reads `{"queries": [...]}`. Invalid output yields no statements.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    let value: Value = match serde_json::from_str(strip_code_fences(text)) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "curation reply is not valid JSON, ignoring");
            return Vec::new();
        }
    };
    match value.get("queries").and_then(Value::as_array) {
        Some(items) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        None => {
            warn!("curation reply has no queries list, ignoring");
            Vec::new()
        }
    }
}

pub struct LlmCurator { chat: ChatClient }

impl LlmCurator {
    pub fn new(chat: ChatClient) -> Self { Self { chat } }
}

#[async_trait]
impl CurationModel for LlmCurator {
    async fn suggest(&self, docs_structure: &str, new_documents: &[RawDocument]) -> Result<Vec<String>> {
        let chunks = new_documents
            .iter()
            .map(|d| format!("Source: {}\nContent: {}", d.source().unwrap_or("None"), d.content))
            .collect::<Vec<_>>()
            .join("\n---\n");
        let system = format!("{CURATION_SYSTEM}\n\nCurrent documentation structure:\n{docs_structure}");
        let user = format!("New information chunks to analyze:\n{chunks}");
        let reply = self.chat.complete(&system, &user, true).await?;
        Ok(parse_suggestions(&reply))
    }
}
