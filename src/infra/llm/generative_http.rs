use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{AiError, GenerationDefaults, ProviderDescriptor, ProviderError, Request};

use super::LlmProvider;
use super::http::{RawResponse, build_client, invalid_body, send, status_failure};
use super::response_parsing::{error_message_at, string_at_path, value_at_path};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const TEXT_PATH: &[&str] = &["candidates", "0", "content", "parts", "0", "text"];
const ERROR_MESSAGE_PATH: &[&str] = &["error", "message"];

/// `generateContent` JSON endpoint taking structured content parts.
///
/// The API key travels as the `key` query parameter rather than a header.
pub struct GenerativeHttpProvider {
    descriptor: ProviderDescriptor,
    defaults: GenerationDefaults,
    api_base_url: String,
    client: Client,
}

impl GenerativeHttpProvider {
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

    fn endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(model)
        )
    }

    fn build_request_payload(&self, request: &Request) -> (String, GenerateContentRequest) {
        let params = self.descriptor.resolve(request, &self.defaults);
        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.content().to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: params.max_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
            },
        };
        (params.model, payload)
    }

    fn map_response(&self, response: RawResponse) -> Result<String, ProviderError> {
        let provider = self.provider_id();
        if !response.status.is_success() {
            let message = error_message_at(&response.body, ERROR_MESSAGE_PATH);
            return Err(status_failure(provider, response.status, message));
        }

        let decoded: Value = serde_json::from_str(&response.body)
            .map_err(|_| invalid_body(provider, &response.body))?;
        if let Some(text) = string_at_path(&decoded, TEXT_PATH) {
            return Ok(text);
        }
        if let Some(message) = value_at_path(&decoded, ERROR_MESSAGE_PATH).and_then(Value::as_str) {
            return Err(ProviderError::request_failure(provider, message));
        }
        Err(invalid_body(provider, &response.body))
    }
}

impl LlmProvider for GenerativeHttpProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn execute(&self, request: &Request) -> Result<String, ProviderError> {
        let (model, payload) = self.build_request_payload(request);
        debug!(
            provider = %self.descriptor.name,
            model = %model,
            max_tokens = payload.generation_config.max_output_tokens,
            "sending generateContent request"
        );

        let mut http_request = self.client.post(self.endpoint_url(&model)).json(&payload);
        if let Some(api_key) = &self.descriptor.connection.api_key {
            http_request = http_request.query(&[("key", api_key)]);
        }

        let response = send(self.provider_id(), http_request)?;
        self.map_response(response)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}
