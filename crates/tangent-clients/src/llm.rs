use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

fn default_temperature() -> f32 {
    0.7
}

/// A chat-completion request. `response_schema`, when set, asks the
/// provider for structured output conforming to that JSON schema —
/// `complete_structured` is the method that uses it.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn single_turn(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::system(system), Message::user(prompt)],
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
}

/// The LLM collaborator: freeform chat completion plus a structured-output
/// variant used wherever the caller needs a guaranteed-valid JSON shape
/// (ContextJudge, the Synthesizer) rather than a tolerant freeform parse
/// (legacy concept extraction).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;

    /// Requests output conforming to `schema`, returning the parsed JSON
    /// value. Implementations that don't have a native structured-output
    /// mode may fall back to instructing the model via the prompt and
    /// parsing its freeform reply; either way the contract is "valid JSON
    /// matching the shape the caller expects, or an error".
    async fn complete_structured(
        &self,
        request: &CompletionRequest,
        schema: &Value,
    ) -> anyhow::Result<Value>;
}

/// An OpenAI-compatible chat-completion client. Works against any
/// provider exposing the `/chat/completions` wire shape (OpenAI itself,
/// or a local vLLM-style gateway).
pub struct OpenAiLlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn post_chat(&self, body: Value) -> anyhow::Result<Value> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(ClientError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()).into())
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let parsed = self.post_chat(body).await?;
        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClientError::Decode("missing choices[0].message.content".into()))?
            .to_string();

        Ok(CompletionResponse { content })
    }

    async fn complete_structured(
        &self,
        request: &CompletionRequest,
        schema: &Value,
    ) -> anyhow::Result<Value> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "response_format": {
                "type": "json_schema",
                "json_schema": schema,
            },
        });

        let parsed = self.post_chat(body).await?;
        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClientError::Decode("missing choices[0].message.content".into()))?;

        serde_json::from_str(content)
            .map_err(|err| ClientError::Decode(format!("structured output was not valid JSON: {err}")).into())
    }
}
