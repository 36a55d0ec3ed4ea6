use std::net::TcpListener;
use std::time::Duration;

use mockito::{Matcher, Server};
use promptrelay::domain::{
    GenerationDefaults, ProviderDescriptor, ProviderError, ProviderErrorKind, ProviderKind,
    Request,
};
use promptrelay::infra::llm::{
    ChatCompletionProvider, GenerativeHttpProvider, HostedLlmProvider, LlmProvider,
    build_provider,
};
use serde_json::json;

fn hello_request() -> Request {
    let mut request = Request::new();
    request.add_content("Hello");
    request
}

fn chat_provider(server: &Server) -> ChatCompletionProvider {
    let descriptor =
        ProviderDescriptor::new("openai", ProviderKind::ChatCompletion, "gpt-3.5-turbo", 4000)
            .with_api_key("test-key")
            .with_base_url(server.url())
            .with_timeout(Duration::from_secs(2));
    ChatCompletionProvider::new(descriptor, GenerationDefaults::default())
        .expect("provider should build")
}

fn hosted_provider(server: &Server) -> HostedLlmProvider {
    let descriptor =
        ProviderDescriptor::new("bedrock", ProviderKind::HostedLlm, "anthropic.claude-v2", 6000)
            .with_api_key("bedrock-token")
            .with_base_url(server.url())
            .with_timeout(Duration::from_secs(2));
    HostedLlmProvider::new(descriptor, GenerationDefaults::default())
        .expect("provider should build")
}

fn generative_provider(server: &Server) -> GenerativeHttpProvider {
    let descriptor =
        ProviderDescriptor::new("gemini", ProviderKind::GenerativeHttp, "gemini-pro", 4000)
            .with_api_key("gemini-key")
            .with_base_url(format!("{}/v1beta", server.url()))
            .with_timeout(Duration::from_secs(2));
    GenerativeHttpProvider::new(descriptor, GenerationDefaults::default())
        .expect("provider should build")
}

#[test]
fn chat_completion_sends_user_message_and_returns_first_choice() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 4000,
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
            })
            .to_string(),
        )
        .create();

    let text = chat_provider(&server)
        .execute(&hello_request())
        .expect("mocked chat completion should succeed");

    mock.assert();
    assert_eq!(text, "Hi there");
}

#[test]
fn chat_completion_applies_request_overrides() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 128,
            "temperature": 0.5
        })))
        .with_status(200)
        .with_body(json!({"choices": [{"text": "legacy text"}]}).to_string())
        .create();

    let mut request = hello_request();
    request
        .set_model("gpt-4o-mini")
        .set_max_tokens(128)
        .set_attribute("temperature", 0.5);
    let text = chat_provider(&server)
        .execute(&request)
        .expect("mocked chat completion should succeed");

    mock.assert();
    assert_eq!(text, "legacy text");
}

#[test]
fn chat_completion_error_payload_is_request_failure() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(json!({"error": {"message": "Incorrect API key provided"}}).to_string())
        .create();

    let error = chat_provider(&server)
        .execute(&hello_request())
        .expect_err("401 should fail");

    mock.assert();
    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert_eq!(error.provider_name(), "openai");
    assert_eq!(error.detail(), "Incorrect API key provided");
}

#[test]
fn chat_completion_without_choices_is_invalid_response() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(json!({"choices": []}).to_string())
        .create();

    let error = chat_provider(&server)
        .execute(&hello_request())
        .expect_err("empty choices should fail");

    mock.assert();
    assert_eq!(error.kind(), ProviderErrorKind::InvalidResponse);
}

#[test]
fn hosted_llm_wraps_prompt_and_returns_completion() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/model/anthropic.claude-v2/invoke")
        .match_header("authorization", "Bearer bedrock-token")
        .match_header("accept", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "prompt": "\n\nHuman: Hello\n\nAssistant:",
            "max_tokens_to_sample": 6000
        })))
        .with_status(200)
        .with_body(
            json!({"completion": " Hello from Claude", "stop_reason": "stop_sequence"}).to_string(),
        )
        .create();

    let text = hosted_provider(&server)
        .execute(&hello_request())
        .expect("mocked invoke should succeed");

    mock.assert();
    assert_eq!(text, " Hello from Claude");
}

#[test]
fn hosted_llm_throttling_is_request_failure_with_error_type() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/model/anthropic.claude-v2/invoke")
        .with_status(429)
        .with_header(
            "x-amzn-errortype",
            "ThrottlingException:http://internal.amazon.com/coral/com.amazon.bedrock/",
        )
        .with_body(json!({"message": "Too many requests"}).to_string())
        .create();

    let error = hosted_provider(&server)
        .execute(&hello_request())
        .expect_err("throttling should fail");

    mock.assert();
    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert_eq!(error.detail(), "ThrottlingException: Too many requests");
}

#[test]
fn hosted_llm_missing_completion_is_invalid_response() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/model/anthropic.claude-v2/invoke")
        .with_status(200)
        .with_body(json!({"stop_reason": "max_tokens"}).to_string())
        .create();

    let error = hosted_provider(&server)
        .execute(&hello_request())
        .expect_err("missing completion should fail");

    mock.assert();
    assert_eq!(error.kind(), ProviderErrorKind::InvalidResponse);
    assert_eq!(error.provider_name(), "bedrock");
}

#[test]
fn generative_http_sends_key_query_and_returns_first_part() {
    let mut server = Server::new();
    let mock = server
        .mock(
            "POST",
            Matcher::Regex("^/v1beta/models/gemini-pro:generateContent".to_string()),
        )
        .match_query(Matcher::UrlEncoded("key".to_string(), "gemini-key".to_string()))
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [{"text": "Hello"}]}],
            "generationConfig": {"maxOutputTokens": 4000}
        })))
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{"content": {"parts": [{"text": "Hi from Gemini"}], "role": "model"}}]
            })
            .to_string(),
        )
        .create();

    let text = generative_provider(&server)
        .execute(&hello_request())
        .expect("mocked generateContent should succeed");

    mock.assert();
    assert_eq!(text, "Hi from Gemini");
}

#[test]
fn generative_http_error_status_is_request_failure() {
    let mut server = Server::new();
    let mock = server
        .mock(
            "POST",
            Matcher::Regex("^/v1beta/models/gemini-pro:generateContent".to_string()),
        )
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(
            json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}})
                .to_string(),
        )
        .create();

    let error = generative_provider(&server)
        .execute(&hello_request())
        .expect_err("400 should fail");

    mock.assert();
    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert_eq!(error.detail(), "API key not valid");
}

#[test]
fn generative_http_non_json_body_is_invalid_response() {
    let mut server = Server::new();
    let mock = server
        .mock(
            "POST",
            Matcher::Regex("^/v1beta/models/gemini-pro:generateContent".to_string()),
        )
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create();

    let error = generative_provider(&server)
        .execute(&hello_request())
        .expect_err("non-JSON body should fail");

    mock.assert();
    assert_eq!(error.kind(), ProviderErrorKind::InvalidResponse);
    assert_eq!(error.detail(), "<html>gateway</html>");
}

// Nothing listens on port 1, so connecting is refused immediately.
const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:1";

fn unreachable_failure(kind: ProviderKind, base_url: &str) -> ProviderError {
    let descriptor = ProviderDescriptor::new("backend", kind, "model-a", 1000)
        .with_api_key("test-key")
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(2));
    let provider =
        build_provider(descriptor, GenerationDefaults::default()).expect("provider should build");

    provider
        .execute(&hello_request())
        .expect_err("unreachable backend should fail")
}

#[test]
fn chat_completion_connection_refused_is_request_failure() {
    let error = unreachable_failure(ProviderKind::ChatCompletion, UNREACHABLE_BASE_URL);

    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert_eq!(error.provider_name(), "backend");
    assert!(error.detail().starts_with("transport error:"));
}

#[test]
fn hosted_llm_connection_refused_is_request_failure() {
    let error = unreachable_failure(ProviderKind::HostedLlm, UNREACHABLE_BASE_URL);

    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert!(error.detail().starts_with("transport error:"));
}

#[test]
fn generative_http_connection_refused_is_request_failure() {
    let base_url = format!("{UNREACHABLE_BASE_URL}/v1beta");
    let error = unreachable_failure(ProviderKind::GenerativeHttp, &base_url);

    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert!(error.detail().starts_with("transport error:"));
}

#[test]
fn silent_backend_times_out_as_request_failure() {
    // Accepted by the kernel backlog but never answered.
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let address = listener.local_addr().expect("listener should have an address");
    let descriptor =
        ProviderDescriptor::new("openai", ProviderKind::ChatCompletion, "gpt-3.5-turbo", 4000)
            .with_base_url(format!("http://{address}"))
            .with_timeout(Duration::from_millis(300));
    let provider = ChatCompletionProvider::new(descriptor, GenerationDefaults::default())
        .expect("provider should build");

    let error = provider
        .execute(&hello_request())
        .expect_err("silent backend should time out");

    assert_eq!(error.kind(), ProviderErrorKind::RequestFailure);
    assert!(
        error.detail().starts_with("request timed out:"),
        "unexpected detail: {}",
        error.detail()
    );
    drop(listener);
}
