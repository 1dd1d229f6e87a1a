//! Gemini `generateContent` decision model.
//!
//! Each decision is one non-streaming request. The two widget tools are
//! declared as functions and `toolConfig.functionCallingConfig.mode` is
//! `ANY`, so a well-behaved response is a single `functionCall` part.

use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{Action, SchedulingContext};
use cadence_widgets::WidgetKind;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::errors::DecisionError;
use crate::model::DecisionModel;
use crate::prompt::{SYSTEM_INSTRUCTION, action_message, tool_description};

/// Default public API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_VERSION: &str = "v1beta";

/// Connection settings for [`GeminiDecisionModel`].
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// Model ID, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// Base URL without version (overridable for tests).
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Config for `model` with the public endpoint and a 10s timeout.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    tools: Vec<ToolDeclarations>,
    tool_config: ToolConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionCallingConfig {
    mode: &'static str,
    allowed_function_names: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

/// [`DecisionModel`] backed by Gemini function calling.
pub struct GeminiDecisionModel {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiDecisionModel {
    /// Build a model client. Fails when the API key is empty.
    pub fn new(config: GeminiConfig) -> Result<Self, DecisionError> {
        if config.api_key.trim().is_empty() {
            return Err(DecisionError::Unconfigured("missing API key".into()));
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/{API_VERSION}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn headers(&self) -> Result<HeaderMap, DecisionError> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|e| DecisionError::Unconfigured(format!("invalid API key header: {e}")))?;
        let _ = headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    fn build_request(action: &Action, ctx: &SchedulingContext) -> GenerateRequest {
        let declarations = WidgetKind::ALL
            .into_iter()
            .map(|kind| FunctionDeclaration {
                name: kind.tool_name(),
                description: tool_description(kind),
            })
            .collect();

        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![text_part(SYSTEM_INSTRUCTION)],
            },
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![text_part(&action_message(action, ctx))],
            }],
            tools: vec![ToolDeclarations {
                function_declarations: declarations,
            }],
            tool_config: ToolConfig {
                function_calling_config: FunctionCallingConfig {
                    mode: "ANY",
                    allowed_function_names: WidgetKind::ALL
                        .into_iter()
                        .map(WidgetKind::tool_name)
                        .collect(),
                },
            },
        }
    }
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        function_call: None,
    }
}

/// Extract the single widget tool call from a response.
fn extract_decision(response: GenerateResponse) -> Result<WidgetKind, DecisionError> {
    let calls: Vec<FunctionCall> = response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.function_call)
        .collect();

    match calls.as_slice() {
        [call] => WidgetKind::from_tool_name(&call.name)
            .ok_or_else(|| DecisionError::NonConforming(format!("unknown tool `{}`", call.name))),
        [] => Err(DecisionError::NonConforming("no function call".into())),
        many => Err(DecisionError::NonConforming(format!(
            "{} function calls, expected one",
            many.len()
        ))),
    }
}

/// Pull the message out of a Gemini error body.
fn parse_api_error(body: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| format!("HTTP {status}: {body}"))
}

#[async_trait]
impl DecisionModel for GeminiDecisionModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.config.model, action = action.name()))]
    async fn decide(
        &self,
        action: &Action,
        ctx: &SchedulingContext,
    ) -> Result<WidgetKind, DecisionError> {
        let body = Self::build_request(action, ctx);
        let response = self
            .client
            .post(self.url())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = parse_api_error(&text, status.as_u16());
            warn!(status = status.as_u16(), %message, "Gemini API error");
            return Err(DecisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        let kind = extract_decision(parsed)?;
        debug!(tool = kind.tool_name(), "model chose widget");
        Ok(kind)
    }
}
