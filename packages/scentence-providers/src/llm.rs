//! OpenAI-compatible chat completion client.

use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

const JSON_ATTEMPTS: usize = 3;

static FENCE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").ok());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: String,
	pub content: String,
}
impl ChatMessage {
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: "system".to_string(), content: content.into() }
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self { role: "user".to_string(), content: content.into() }
	}
}

/// What a completion produced: a parsed object in JSON mode, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutput {
	Json(Value),
	Text(String),
}
impl LlmOutput {
	pub fn into_json(self) -> Option<Value> {
		match self {
			Self::Json(value) => Some(value),
			Self::Text(text) => parse_json_content(&text),
		}
	}

	pub fn into_text(self) -> String {
		match self {
			Self::Json(value) => value.to_string(),
			Self::Text(text) => text,
		}
	}
}

/// Returns the assistant text of the first choice.
pub async fn complete(
	cfg: &scentence_config::LlmProviderConfig,
	messages: &[ChatMessage],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let json = post(&client, cfg, messages, false).await?;

	parse_choice_content(&json)
}

/// Asks for a JSON object and retries when the model answers with something unparseable.
pub async fn complete_json(
	cfg: &scentence_config::LlmProviderConfig,
	messages: &[ChatMessage],
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

	for attempt in 1..=JSON_ATTEMPTS {
		let json = post(&client, cfg, messages, true).await?;
		let content = parse_choice_content(&json)?;

		match parse_json_content(&content) {
			Some(parsed) => return Ok(parsed),
			None => tracing::warn!(attempt, "LLM response is not a JSON object."),
		}
	}

	Err(Error::InvalidResponse { message: "LLM response is not valid JSON.".to_string() })
}

pub async fn complete_output(
	cfg: &scentence_config::LlmProviderConfig,
	messages: &[ChatMessage],
	json_mode: bool,
) -> Result<LlmOutput> {
	if json_mode {
		Ok(LlmOutput::Json(complete_json(cfg, messages).await?))
	} else {
		Ok(LlmOutput::Text(complete(cfg, messages).await?))
	}
}

/// Lenient JSON extraction: accepts fenced blocks and prose around a single object.
pub fn parse_json_content(content: &str) -> Option<Value> {
	let trimmed = content.trim();

	if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
		return Some(value);
	}

	let unfenced = FENCE
		.as_ref()
		.and_then(|re| re.captures(trimmed))
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str())
		.unwrap_or(trimmed);
	let start = unfenced.find('{')?;
	let end = unfenced.rfind('}')?;

	if end < start {
		return None;
	}

	match serde_json::from_str::<Value>(&unfenced[start..=end]) {
		Ok(value @ Value::Object(_)) => Some(value),
		_ => None,
	}
}

async fn post(
	client: &Client,
	cfg: &scentence_config::LlmProviderConfig,
	messages: &[ChatMessage],
	json_mode: bool,
) -> Result<Value> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"messages": messages,
	});

	if let Some(temperature) = cfg.temperature {
		body["temperature"] = serde_json::json!(temperature);
	}
	if json_mode {
		body["response_format"] = serde_json::json!({ "type": "json_object" });
	}

	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	Ok(res.error_for_status()?.json().await?)
}

fn parse_choice_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "LLM response is missing message content.".to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "researcher" } }
			]
		});

		assert_eq!(parse_choice_content(&json).expect("parse failed"), "researcher");
		assert!(parse_choice_content(&serde_json::json!({ "choices": [] })).is_err());
	}

	#[test]
	fn strips_code_fences() {
		let content = "Here you go:\n```json\n{\"plans\": []}\n```";
		let parsed = parse_json_content(content).expect("Expected JSON.");

		assert!(parsed.get("plans").is_some());
	}

	#[test]
	fn extracts_object_from_prose() {
		let parsed = parse_json_content("Sure! {\"brand\": \"Dior\"} Hope this helps.")
			.expect("Expected JSON.");

		assert_eq!(parsed["brand"], "Dior");
	}

	#[test]
	fn text_output_can_still_yield_json() {
		let output = LlmOutput::Text("```json\n{\"route\": \"writer\"}\n```".to_string());

		assert_eq!(output.into_json().expect("Expected JSON.")["route"], "writer");
	}

	#[test]
	fn rejects_non_objects() {
		assert!(parse_json_content("[1, 2]").is_none());
		assert!(parse_json_content("no json here").is_none());
		assert!(parse_json_content("} backwards {").is_none());
	}
}
