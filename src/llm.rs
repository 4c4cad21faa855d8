use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::config::ResolvedConfig;
use crate::domain::GeneRecommendations;
use crate::error::OncoError;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Turns a rendered prompt into structured gene recommendations.
pub trait RecommendationModel: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<GeneRecommendations, OncoError>;
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, OncoError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(OncoError::MissingApiKey)?;
        Self::new(
            &config.llm_base_url,
            &config.model,
            config.temperature,
            &api_key,
            config.llm_timeout,
        )
    }

    pub fn new(
        base_url: &str,
        model: &str,
        temperature: f32,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, OncoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("onco-genes/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OncoError::LlmHttp(err.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| OncoError::LlmHttp("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| OncoError::LlmHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    fn complete(&self, prompt: &str) -> Result<String, OncoError> {
        let request = ChatCompletionsRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .map_err(|err| OncoError::LlmHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "chat completion failed".to_string());
            return Err(OncoError::LlmStatus { status, message });
        }
        let body: ChatCompletionsResponse = response
            .json()
            .map_err(|err| OncoError::LlmHttp(err.to_string()))?;
        if let Some(usage) = &body.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| OncoError::LlmResponse("no choices in completion".to_string()))
    }
}

impl RecommendationModel for OpenAiChatClient {
    fn generate(&self, prompt: &str) -> Result<GeneRecommendations, OncoError> {
        let content = self.complete(prompt)?;
        parse_recommendations(&content)
    }
}

/// Best-effort extraction of the recommendation object from a model reply.
///
/// Accepts a bare JSON object, one wrapped in a Markdown code fence, or one
/// surrounded by prose. Missing list fields default to empty.
pub fn parse_recommendations(content: &str) -> Result<GeneRecommendations, OncoError> {
    let candidate = json_candidate(content)
        .ok_or_else(|| OncoError::LlmResponse(format!("no JSON object in reply: {}", snippet(content))))?;
    serde_json::from_str(candidate).map_err(|err| OncoError::LlmResponse(err.to_string()))
}

fn json_candidate(content: &str) -> Option<&str> {
    let mut text = content.trim();
    if let Some(fenced) = text.strip_prefix("```") {
        let body = fenced
            .split_once('\n')
            .map(|(_, body)| body)
            .unwrap_or(fenced);
        text = body.rsplit_once("```").map(|(body, _)| body).unwrap_or(body).trim();
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn snippet(content: &str) -> String {
    const MAX_CHARS: usize = 120;
    let trimmed = content.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        format!("{}...", trimmed.chars().take(MAX_CHARS).collect::<String>())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
