use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::provider::{GenerationParams, LLMProvider};

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, api_key }
    }
}

#[async_trait]
impl LLMProvider for ClaudeProvider {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        tracing::debug!(
            "Sending ~{} tokens to Claude ({})",
            prompt.len() / 4,
            params.model
        );

        let request_body = ClaudeRequest {
            model: params.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LlmApi {
                status: status.as_u16(),
                message: body,
            });
        }

        let result: ClaudeResponse = response.json().await?;
        if let Some(error) = result.error {
            return Err(Error::LlmApi {
                status: status.as_u16(),
                message: error.message,
            });
        }

        let text = result
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::LlmApi {
                status: status.as_u16(),
                message: "Empty response from Claude".to_string(),
            });
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "Claude"
    }
}
