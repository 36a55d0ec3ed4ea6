use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::{AiError, GenerationDefaults, ProviderDescriptor, ProviderError, Request};

use super::LlmProvider;
use super::http::{RawResponse, build_client, invalid_body, send, status_failure};
use super::response_parsing::error_message_at;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-style `chat/completions` backend.
pub struct ChatCompletionProvider {
    descriptor: ProviderDescriptor,
    defaults: GenerationDefaults,
    api_base_url: String,
    client: Client,
}

impl ChatCompletionProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        defaults: GenerationDefaults,
    ) -> Result<Self, AiError> {
        let client = build_client(&descriptor)?;
        Self::with_client(descriptor, defaults, client)
    }

    pub fn with_client(
        descriptor: ProviderDescriptor,
        defaults: GenerationDefaults,
        client: Client,
    ) -> Result<Self, AiError> {
        descriptor.validate()?;
        let api_base_url = descriptor
            .connection
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            descriptor,
            defaults,
            api_base_url,
            client,
        })
    }

    fn endpoint_url(&self) -> String {
        build_v1_url(&self.api_base_url, "chat/completions")
    }

    fn build_request_payload(&self, request: &Request) -> ChatCompletionsRequest {
        let params = self.descriptor.resolve(request, &self.defaults);

        ChatCompletionsRequest {
            model: params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            messages: vec![ChatMessageRequest {
                role: "user".to_string(),
                content: request.content().to_string(),
            }],
        }
    }

    fn map_response(&self, response: RawResponse) -> Result<String, ProviderError> {
        let provider = self.provider_id();
        if !response.status.is_success() {
            let message = error_message_at(&response.body, &["error", "message"]);
            return Err(status_failure(provider, response.status, message));
        }

        let decoded: ChatCompletionsResponse = serde_json::from_str(&response.body)
            .map_err(|_| invalid_body(provider, &response.body))?;

        if let Some(text) = decoded.choices.first().and_then(ChatChoice::extract_text) {
            return Ok(text);
        }
        if let Some(message) = decoded.error.and_then(|detail| detail.message) {
            return Err(ProviderError::request_failure(provider, message));
        }
        Err(invalid_body(provider, &response.body))
    }
}

impl LlmProvider for ChatCompletionProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn execute(&self, request: &Request) -> Result<String, ProviderError> {
        let payload = self.build_request_payload(request);
        debug!(
            provider = %self.descriptor.name,
            model = %payload.model,
            max_tokens = payload.max_tokens,
            "sending chat completion request"
        );

        let mut http_request = self.client.post(self.endpoint_url()).json(&payload);
        if let Some(api_key) = &self.descriptor.connection.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = send(self.provider_id(), http_request)?;
        self.map_response(response)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    messages: Vec<ChatMessageRequest>,
}

#[derive(Debug, Serialize)]
struct ChatMessageRequest {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ChatErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

impl ChatChoice {
    fn extract_text(&self) -> Option<String> {
        if let Some(content) = self
            .message
            .as_ref()
            .and_then(|message| message.content.as_ref())
        {
            return extract_message_content(content);
        }
        self.text.clone()
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

fn extract_message_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts = parts
                .iter()
                .filter_map(extract_content_part_text)
                .collect::<Vec<_>>();
            if texts.is_empty() {
                None
            } else {
                Some(texts.concat())
            }
        }
        _ => None,
    }
}

fn extract_content_part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(text) => Some(text.to_string()),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}

fn build_v1_url(api_base_url: &str, endpoint_path: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let endpoint_path = endpoint_path.trim_start_matches('/');

    if base.ends_with("/v1") {
        format!("{base}/{endpoint_path}")
    } else {
        format!("{base}/v1/{endpoint_path}")
    }
}
