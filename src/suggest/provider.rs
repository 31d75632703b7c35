use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde_json::{Value, json};
use tracing::trace;

use crate::{
    AgentflowError, Result, SuggestionConfig,
    suggest::{SuggestionInput, prompt},
};

/// Generative backend producing a raw, unvalidated suggestion document.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn generate(
        &self,
        input: &SuggestionInput,
    ) -> Result<Value>;
}

/// Calls an OpenAI compatible `/chat/completions` api in JSON mode.
#[derive(Debug, Clone)]
pub struct HttpSuggestionProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

fn provider_err(err: impl std::fmt::Display) -> AgentflowError {
    AgentflowError::Suggestion(err.to_string())
}

impl HttpSuggestionProvider {
    pub fn new(config: &SuggestionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.resolve_api_key() {
            let mut value: HeaderValue = format!("Bearer {}", key).parse().map_err(|err: InvalidHeaderValue| AgentflowError::Config(err.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| AgentflowError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn request_body(
        &self,
        input: &SuggestionInput,
    ) -> Result<Value> {
        let (system, user) = prompt::build_messages(input)?;
        Ok(json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        }))
    }
}

#[async_trait]
impl SuggestionProvider for HttpSuggestionProvider {
    async fn generate(
        &self,
        input: &SuggestionInput,
    ) -> Result<Value> {
        let url = format!("{}/chat/completions", self.endpoint);
        trace!("suggest::generate({}, {})", url, self.model);

        let body = self.request_body(input)?;
        let res = self.client.post(&url).json(&body).send().await.and_then(|r| r.error_for_status()).map_err(provider_err)?;
        let reply: Value = res.json().await.map_err(provider_err)?;

        let content = reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentflowError::Suggestion("completion has no message content".to_string()))?;

        serde_json::from_str(extract_json(content)).map_err(provider_err)
    }
}

/// Strip a markdown code fence some models wrap around JSON output.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag on the opening fence line
    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or(inner);
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
    }

    #[test]
    fn test_request_body() {
        let config = SuggestionConfig {
            model: "test-model".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let provider = HttpSuggestionProvider::new(&config).unwrap();
        let body = provider.request_body(&SuggestionInput::new("Summarize logs").with_agent_types(["summarizer"])).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][1]["content"].as_str().unwrap().contains("Summarize logs"));
    }
}
