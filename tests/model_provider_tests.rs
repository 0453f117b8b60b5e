// Model provider routing against mock chat endpoints

use atlassian_mcp_bridge::config::{ModelInfo, ModelProviderConfig};
use atlassian_mcp_bridge::domain::ChatMessage;
use atlassian_mcp_bridge::model::{DynamicModelProvider, ModelError, ModelProvider, ModelRequest};
use httpmock::prelude::*;
use serde_json::json;
use serial_test::serial;

fn provider(id: &str, kind: &str, endpoint: String, api_key: Option<&str>) -> ModelProviderConfig {
    ModelProviderConfig {
        id: id.into(),
        provider_type: kind.into(),
        endpoint,
        api_key: api_key.map(String::from),
        api_path: None,
        models: vec![ModelInfo {
            name: "m1".into(),
            display_name: None,
        }],
    }
}

fn local_only(server: &MockServer) -> DynamicModelProvider {
    DynamicModelProvider::from_configs(
        &[provider("local", "ollama", server.base_url(), None)],
        "local",
        "m1",
    )
    .expect("provider")
}

fn request(provider: &str, model: &str) -> ModelRequest {
    ModelRequest {
        provider: provider.into(),
        model: model.into(),
        messages: vec![
            ChatMessage::system("Reply in JSON."),
            ChatMessage::user("Fetch PROJ-1"),
        ],
    }
}

#[tokio::test]
#[serial]
async fn openai_provider_sends_bearer_token_and_reads_first_choice() {
    let server = MockServer::start();
    let chat = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-bridge-test")
            .body_includes("\"role\":\"system\"")
            .body_includes("Fetch PROJ-1");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"action\":\"final\",\"response\":\"ok\"}"}}]
        }));
    });
    unsafe {
        std::env::set_var("BRIDGE_TEST_OPENAI_KEY", "sk-bridge-test");
    }

    let routed = DynamicModelProvider::from_configs(
        &[provider(
            "cloud",
            "openai",
            server.base_url(),
            Some("BRIDGE_TEST_OPENAI_KEY"),
        )],
        "cloud",
        "m1",
    )
    .expect("provider");
    let response = routed.chat(request("cloud", "m1")).await.expect("reply");

    chat.assert();
    assert!(response.message.content.contains("\"final\""));
    unsafe {
        std::env::remove_var("BRIDGE_TEST_OPENAI_KEY");
    }
}

#[tokio::test]
async fn ollama_provider_posts_to_api_chat() {
    let server = MockServer::start();
    let chat = server.mock(|when, then| {
        when.method(POST).path("/api/chat").body_includes("\"stream\":false");
        then.status(200)
            .json_body(json!({"message": {"role": "assistant", "content": "hello"}}));
    });

    let routed = local_only(&server);
    let response = routed.chat(request("local", "m1")).await.expect("reply");

    chat.assert();
    assert_eq!(response.message.content, "hello");
}

#[tokio::test]
async fn unknown_provider_or_model_is_rejected_before_any_request() {
    let server = MockServer::start();
    let chat = server.mock(|when, then| {
        when.method(POST).path("/api/chat");
        then.status(200).json_body(json!({"message": {"content": "x"}}));
    });
    let routed = local_only(&server);

    assert!(matches!(
        routed.chat(request("other", "m1")).await,
        Err(ModelError::ProviderNotFound { .. })
    ));
    assert!(matches!(
        routed.chat(request("local", "m2")).await,
        Err(ModelError::ModelNotFound { .. })
    ));
    chat.assert_calls(0);
}

#[tokio::test]
async fn malformed_provider_payload_is_invalid_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/chat");
        then.status(200).body("not json");
    });
    let routed = local_only(&server);

    assert!(matches!(
        routed.chat(request("local", "m1")).await,
        Err(ModelError::InvalidResponse { .. })
    ));
}

#[test]
fn default_route_is_checked_when_building() {
    let providers = [
        provider("local", "ollama", "http://127.0.0.1:9".into(), None),
        provider("cloud", "openai", "http://127.0.0.1:9".into(), Some("BRIDGE_TEST_UNSET_KEY")),
    ];

    assert!(DynamicModelProvider::from_configs(&providers, "local", "m1").is_ok());
    assert!(matches!(
        DynamicModelProvider::from_configs(&providers, "remote", "m1"),
        Err(ModelError::ProviderNotFound { .. })
    ));
    assert!(matches!(
        DynamicModelProvider::from_configs(&providers, "local", "m2"),
        Err(ModelError::ModelNotFound { .. })
    ));
    assert!(matches!(
        DynamicModelProvider::from_configs(&providers, "cloud", "m1"),
        Err(ModelError::MissingApiKey { .. })
    ));
}
