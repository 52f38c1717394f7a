use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::http_client::HttpClientTrait;
use crate::domain::{CompletionProvider, DomainError, ResponseSchema};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI chat completions provider
///
/// Works with any service exposing the OpenAI chat completions API.
#[derive(Debug)]
pub struct OpenAiCompletionProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
}

impl<C: HttpClientTrait> OpenAiCompletionProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: model.into(),
            system_prompt: None,
        }
    }

    /// Prepend a system message to every prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &str, schema: Option<&ResponseSchema>) -> Value {
        let mut messages = Vec::with_capacity(2);

        if let Some(ref system) = self.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        if let Some(schema) = schema {
            let mut json_schema = serde_json::json!({
                "name": schema.name,
                "strict": schema.strict,
                "schema": schema.schema,
            });

            if let Some(ref description) = schema.description {
                json_schema["description"] = serde_json::json!(description);
            }

            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": json_schema,
            });
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    async fn send(&self, prompt: &str, schema: Option<&ResponseSchema>) -> Result<String, DomainError> {
        let body = self.build_request(prompt, schema);
        let response = self
            .client
            .post_json(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        parse_content(response)
    }
}

/// Extract the assistant message text from a chat completion response
fn parse_content(json: Value) -> Result<String, DomainError> {
    let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
        DomainError::provider("openai", format!("Failed to parse response: {}", e))
    })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::provider("openai", "No choices in response"))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(DomainError::provider(
            "openai",
            format!("Model refused to answer: {}", refusal),
        ));
    }

    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl<C: HttpClientTrait> CompletionProvider for OpenAiCompletionProvider<C> {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.send(prompt, None).await
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Value, DomainError> {
        let content = self.send(prompt, Some(schema)).await?;

        serde_json::from_str(&content).map_err(|e| {
            DomainError::provider(
                "openai",
                format!("Structured answer is not valid JSON: {}", e),
            )
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// OpenAI API types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
