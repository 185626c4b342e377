use async_trait::async_trait;
use serde_json::json;

use crate::config::LlmConfig;
use crate::error::{CatalogError, Result};
use super::summarizer::RoutineSummarizer;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Factory function to create the summarizer named by the config
pub fn create_summarizer(config: &LlmConfig) -> Result<Box<dyn RoutineSummarizer>> {
    if !config.enabled {
        return Err(CatalogError::Config("Summarization is disabled".to_string()));
    }

    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiSummarizer::new(config)?)),
        _ => Err(CatalogError::Config(
            format!("Unsupported summarizer provider: {}", config.provider)
        )),
    }
}

/// Summarizer backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiSummarizer {
    config: LlmConfig,
    api_key: String,
    provider_name: String,
    client: reqwest::Client,
}

impl OpenAiSummarizer {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CatalogError::Config(
                "API key required for the openai summarizer (set llm.api_key or OPENAI_API_KEY)".to_string()
            ))?;

        Ok(Self {
            config: config.clone(),
            api_key,
            provider_name: format!("OpenAI {}", config.model),
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn build_prompt(&self, body: &str, name: &str) -> String {
        format!(
            "Analyze the following PL/SQL code. Provide a concise English summary of what it does. \
             The code may contain comments or identifiers in languages other than English.\n\
             Also infer and describe the meaning of the input and output parameters, in a Markdown table format.\n\n\
             Procedure/Function name: {}\n\nCode:\n{}",
            name, body
        )
    }
}

#[async_trait]
impl RoutineSummarizer for OpenAiSummarizer {
    async fn summarize(&self, body: &str, name: &str) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert Oracle PL/SQL documentation assistant."
                },
                {
                    "role": "user",
                    "content": self.build_prompt(body, name)
                }
            ],
            "max_tokens": self.config.max_tokens.unwrap_or(1000),
            "temperature": self.config.temperature.unwrap_or(0.3)
        });

        let response = self.client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| CatalogError::Summarizer(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Summarizer(
                format!("API error {}: {}", status, error_text)
            ));
        }

        let response_data: serde_json::Value = response.json().await
            .map_err(|e| CatalogError::Summarizer(format!("Failed to parse response: {}", e)))?;

        response_data["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| CatalogError::Summarizer("Response carried no message content".to_string()))
    }

    fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            enabled: true,
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_disabled_config_is_rejected() {
        let disabled = LlmConfig { enabled: false, ..config() };
        assert!(matches!(create_summarizer(&disabled), Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let other = LlmConfig { provider: "carrier-pigeon".to_string(), ..config() };
        let err = create_summarizer(&other).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_endpoint_and_prompt() {
        let summarizer = OpenAiSummarizer::new(&config()).unwrap();
        assert_eq!(summarizer.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(summarizer.provider_name(), "OpenAI gpt-4");

        let prompt = summarizer.build_prompt("BEGIN NULL; END;", "PLACE_ORDER");
        assert!(prompt.contains("Procedure/Function name: PLACE_ORDER"));
        assert!(prompt.ends_with("BEGIN NULL; END;"));
    }
}
