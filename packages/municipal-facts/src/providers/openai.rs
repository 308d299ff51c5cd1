//! OpenAI chat completions with JSON output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{build_client, read_json};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::security::ApiKey;
use crate::traits::generator::{parse_json_reply, GenerationRequest, Generator};

const SERVICE: &str = "openai";

const SYSTEM_PROMPT: &str = "You extract facts about municipal bulk waste and mattress disposal. \
Answer with JSON only. Use null for anything the provided text does not state.";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonObject,
    JsonSchema { json_schema: JsonSchemaFormat },
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    // Reply shapes are decoded leniently, so the schema guides rather than binds.
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn build_request<'a>(model: &'a str, request: &GenerationRequest) -> ChatRequest<'a> {
    let response_format = match &request.schema {
        Some(schema) => ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: "structured_response",
                strict: false,
                schema: schema.clone(),
            },
        },
        None => ResponseFormat::JsonObject,
    };

    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            },
        ],
        temperature: request.temperature,
        response_format,
    }
}

fn reply_content(response: ChatResponse) -> CollaboratorResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CollaboratorError::malformed(SERVICE, "no content in response"))
}

/// OpenAI-backed [`Generator`].
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: ApiKey,
    base_url: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: ApiKey) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(SERVICE, std::time::Duration::from_secs(120))?,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        })
    }

    /// Set the model. Default: gpt-4o-mini
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> CollaboratorResult<Value> {
        debug!(
            task = %request.task,
            model = %self.model,
            prompt_chars = request.prompt.len(),
            "Calling OpenAI"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&build_request(&self.model, request))
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let content = reply_content(read_json(SERVICE, response).await?)?;
        parse_json_reply(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::generator::GenerationTask;
    use serde_json::json;

    #[test]
    fn test_request_with_schema() {
        let request = GenerationRequest::new(GenerationTask::Contacts, "Find the phone", 0.1)
            .with_schema(json!({"type": "object"}));
        let body = serde_json::to_value(build_request("gpt-4o-mini", &request)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Find the phone");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "structured_response");
        assert_eq!(body["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn test_request_without_schema() {
        let request = GenerationRequest::new(GenerationTask::Discovery, "Where?", 0.2);
        let body = serde_json::to_value(build_request("m", &request)).unwrap();
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
    }

    #[test]
    fn test_reply_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "{\"phone\": \"3-1-1\"}"}}]
        }))
        .unwrap();
        let value = parse_json_reply(&reply_content(response).unwrap()).unwrap();
        assert_eq!(value["phone"], "3-1-1");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(reply_content(empty).is_err());
    }
}
