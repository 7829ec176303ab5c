//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint speaking the `/chat/completions` dialect
//! (OpenAI, OpenRouter, Together, a local Ollama, ...) — pointed at by the
//! configured base URL. The API key is optional; local endpoints don't
//! need one.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ChatMessage, GenerationConfig, LlmError, LlmProvider};
use crate::config::LlmConfig;

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Request {
                endpoint: config.base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let endpoint = self.endpoint();

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "stream": false,
        });

        let mut request = self.client.post(&endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| LlmError::Request {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| LlmError::Request {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if !status.is_success() {
            let preview: String = text.chars().take(300).collect();
            return Err(LlmError::BadResponse {
                endpoint,
                detail: format!("HTTP {status}: {preview}"),
            });
        }

        // An HTML body on a 200 means a proxy or gateway answered, not the API
        if text.trim_start().starts_with('<') {
            let preview: String = text.chars().take(200).collect();
            return Err(LlmError::BadResponse {
                endpoint,
                detail: format!("got HTML instead of JSON: {preview}"),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::BadResponse {
                endpoint: endpoint.clone(),
                detail: format!("invalid JSON: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::BadResponse {
                endpoint,
                detail: "response contained no choices".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> OpenAiProvider {
        let config = LlmConfig {
            base_url: base_url.to_string(),
            ..LlmConfig::default()
        };
        OpenAiProvider::new(&config, Some("test-key".to_string())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_path() {
        let p = provider("https://api.openai.com/v1");
        assert_eq!(p.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let p = provider("http://localhost:11434/v1/");
        assert_eq!(p.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Hello!")
        );
    }

    #[test]
    fn test_response_parsing_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
