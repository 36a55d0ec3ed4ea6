use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AiError, GenerationDefaults, ProviderDescriptor, ProviderError, Request};

use super::LlmProvider;
use super::http::{RawResponse, build_client, invalid_body, send, status_failure};
use super::response_parsing::non_empty_owned;

const DEFAULT_REGION: &str = "us-west-2";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Hosted model runtime invoked through `POST /model/{id}/invoke` with a
/// Human/Assistant completion prompt.
///
/// Requests carry a bearer token when the descriptor has an API key; request
/// signing for other credential types is left to the client passed to
/// [`HostedLlmProvider::with_client`].
pub struct HostedLlmProvider {
    descriptor: ProviderDescriptor,
    defaults: GenerationDefaults,
    api_base_url: String,
    client: Client,
}

impl HostedLlmProvider {
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
        let api_base_url = match &descriptor.connection.base_url {
            Some(base_url) => base_url.clone(),
            None => {
                let region = descriptor
                    .connection
                    .region
                    .as_deref()
                    .and_then(non_empty_owned)
                    .unwrap_or_else(|| DEFAULT_REGION.to_string());
                format!("https://bedrock-runtime.{region}.amazonaws.com")
            }
        };

        Ok(Self {
            descriptor,
            defaults,
            api_base_url,
            client,
        })
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/model/{}/invoke",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(model)
        )
    }

    fn build_request_payload(&self, request: &Request) -> (String, InvokeModelRequest) {
        let params = self.descriptor.resolve(request, &self.defaults);
        let payload = InvokeModelRequest {
            prompt: completion_prompt(request.content()),
            max_tokens_to_sample: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        };
        (params.model, payload)
    }

    fn map_response(&self, response: RawResponse) -> Result<String, ProviderError> {
        let provider = self.provider_id();
        if !response.status.is_success() {
            return Err(status_failure(
                provider,
                response.status,
                error_message(&response),
            ));
        }

        let decoded: InvokeModelResponse = serde_json::from_str(&response.body)
            .map_err(|_| invalid_body(provider, &response.body))?;
        match decoded.completion {
            Some(completion) => Ok(completion),
            None => Err(invalid_body(provider, &response.body)),
        }
    }
}

impl LlmProvider for HostedLlmProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn execute(&self, request: &Request) -> Result<String, ProviderError> {
        let (model, payload) = self.build_request_payload(request);
        debug!(
            provider = %self.descriptor.name,
            model = %model,
            max_tokens = payload.max_tokens_to_sample,
            "invoking hosted model"
        );

        let mut http_request = self
            .client
            .post(self.endpoint_url(&model))
            .header("accept", "application/json")
            .json(&payload);
        if let Some(api_key) = &self.descriptor.connection.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = send(self.provider_id(), http_request)?;
        self.map_response(response)
    }
}

fn completion_prompt(content: &str) -> String {
    format!("\n\nHuman: {content}\n\nAssistant:")
}

fn error_message(response: &RawResponse) -> Option<String> {
    let message = serde_json::from_str::<InvokeModelError>(&response.body)
        .ok()
        .and_then(|envelope| envelope.message.or(envelope.upper_message))
        .and_then(|message| non_empty_owned(&message));

    let error_type = response
        .headers
        .get(ERROR_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| non_empty_owned(value.split(':').next().unwrap_or(value)));

    match (error_type, message) {
        (Some(error_type), Some(message)) => Some(format!("{error_type}: {message}")),
        (Some(error_type), None) => Some(error_type),
        (None, message) => message,
    }
}

#[derive(Debug, Serialize)]
struct InvokeModelRequest {
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct InvokeModelResponse {
    #[serde(default)]
    completion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvokeModelError {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "Message", default)]
    upper_message: Option<String>,
}
