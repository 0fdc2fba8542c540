use crate::clients::ai::AiClient;
use crate::config::{EXPLAIN_MAX_TOKENS, EXPLAIN_TEMPERATURE};
use crate::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn build_request(&self, prompt: &str) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: EXPLAIN_TEMPERATURE,
            max_tokens: EXPLAIN_MAX_TOKENS,
        }
    }

    async fn call_api(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("OpenAI API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApi(format!(
                "OpenAI API returned {}: {}",
                status, error_text
            )));
        }

        let openai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse OpenAI response: {}", e)))?;

        first_content(openai_response)
    }
}

fn first_content(response: OpenAiResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AppError::ExternalApi("No content in OpenAI response".to_string()))
}

#[async_trait]
impl AiClient for OpenAiClient {
    async fn complete(&self, prompt: String) -> Result<String> {
        tracing::debug!("Requesting explanation from {}", self.model);
        self.call_api(&prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_fixed_sampling_settings() {
        let client = OpenAiClient::new("sk-test", "gpt-3.5-turbo").unwrap();
        let body = serde_json::to_value(client.build_request("hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.5,
                "max_tokens": 100,
            })
        );
    }

    #[test]
    fn first_choice_is_returned_verbatim() {
        let response: OpenAiResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "  It costs *more*.  "}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }))
        .unwrap();
        assert_eq!(first_content(response).unwrap(), "  It costs *more*.  ");
    }

    #[test]
    fn empty_choices_is_an_upstream_error() {
        let response: OpenAiResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(first_content(response), Err(AppError::ExternalApi(_))));
    }
}
