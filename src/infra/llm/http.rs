use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderMap;

use crate::domain::{AiError, ProviderDescriptor, ProviderError};

use super::response_parsing::truncate_message;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub(crate) fn build_client(descriptor: &ProviderDescriptor) -> Result<Client, AiError> {
    let timeout = descriptor.connection.timeout.unwrap_or(DEFAULT_TIMEOUT);
    Client::builder().timeout(timeout).build().map_err(|err| {
        AiError::config(format!(
            "failed to create HTTP client for provider '{}': {err}",
            descriptor.name
        ))
    })
}

/// Sends one request and reads the whole body; transport errors are classified here.
pub(crate) fn send(provider: &str, request: RequestBuilder) -> Result<RawResponse, ProviderError> {
    let response = request
        .send()
        .map_err(|err| map_transport_error(provider, err))?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .text()
        .map_err(|err| map_transport_error(provider, err))?;

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

pub(crate) fn status_failure(
    provider: &str,
    status: StatusCode,
    message: Option<String>,
) -> ProviderError {
    match message {
        Some(message) => ProviderError::request_failure(provider, message),
        None => ProviderError::request_failure(provider, format!("HTTP {status}")),
    }
}

pub(crate) fn invalid_body(provider: &str, body: &str) -> ProviderError {
    ProviderError::invalid_response(provider, truncate_message(body))
}

fn map_transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        return ProviderError::request_failure(provider, format!("request timed out: {error}"));
    }
    ProviderError::request_failure(provider, format!("transport error: {error}"))
}
