//! End-to-end flows: settings -> factory -> agent -> HTTP model and search.

#![allow(clippy::unwrap_used, clippy::panic)]

use pantry::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> ModelSettings {
    ModelSettings::new(
        Some("abc".into()),
        Some(format!("{}/v1", server.uri())),
        Some("qwen-turbo".into()),
    )
}

fn assistant(message: Value, finish_reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "model": "qwen-turbo",
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
    }))
}

#[tokio::test]
async fn factory_model_uses_environment_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer abc"))
        .and(body_partial_json(json!({"model": "qwen-turbo", "temperature": 0.5})))
        .respond_with(assistant(json!({"role": "assistant", "content": "pong"}), "stop"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let factory = ClientFactory::new(&settings);
    assert_eq!(factory.get_model_name(), "qwen-turbo");

    let model = factory
        .get_model(ModelOverrides::new().temperature(0.5))
        .unwrap();
    assert_eq!(model.complete("ping").await.unwrap(), "pong");
}

#[tokio::test]
async fn chef_agent_searches_then_answers() {
    let llm = MockServer::start().await;
    let search = MockServer::start().await;

    // Second turn: the tool result is in the transcript.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"role\":\"tool\""))
        .respond_with(assistant(
            json!({"role": "assistant", "content": "Try a spinach frittata."}),
            "stop",
        ))
        .expect(1)
        .mount(&llm)
        .await;
    // First turn: ask for a search.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(assistant(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "web_search",
                        "arguments": "{\"query\":\"recipes eggs spinach\"}"
                    }
                }]
            }),
            "tool_calls",
        ))
        .up_to_n_times(1)
        .mount(&llm)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"query": "recipes eggs spinach"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "recipes eggs spinach",
            "results": [{
                "title": "Spinach Frittata",
                "url": "https://example.com/frittata",
                "content": "Eggs, spinach, feta.",
                "score": 0.9
            }]
        })))
        .expect(1)
        .mount(&search)
        .await;

    let settings = settings_for(&llm);
    let factory = ClientFactory::new(&settings);
    let web_search =
        WebSearchTool::new(TavilyConfig::new("tvly-test").with_base_url(search.uri())).unwrap();
    let agent = factory
        .get_agent(
            AgentOverrides::new()
                .tool(Box::new(web_search))
                .system_prompt("You are a personal chef."),
        )
        .unwrap();

    let result = agent.run("eggs, spinach").await.unwrap();
    assert_eq!(result.output, "Try a spinach frittata.");
    assert_eq!(result.steps, 2);
    assert_eq!(result.usage.total_tokens, 50);

    let requests = llm.received_requests().await.unwrap();
    let first: Value = requests[0].body_json().unwrap();
    assert_eq!(first["messages"][0]["role"], "system");
    assert_eq!(first["messages"][0]["content"], "You are a personal chef.");
    assert_eq!(first["tools"][0]["function"]["name"], "web_search");

    let second: Value = requests[1].body_json().unwrap();
    let tool_msg = &second["messages"][3];
    assert_eq!(tool_msg["role"], "tool");
    assert_eq!(tool_msg["tool_call_id"], "call_1");
    assert!(tool_msg["content"].as_str().unwrap().contains("Spinach Frittata"));
}

#[tokio::test]
async fn explicit_model_skips_default_construction() {
    let settings = ModelSettings::new(None, None, None);
    let factory = ClientFactory::new(&settings);
    let scripted: SharedChatProvider =
        std::sync::Arc::new(MockProvider::from_texts(["Pasta aglio e olio."]));

    let agent = factory
        .get_agent(AgentOverrides::new().model(scripted).system_prompt("chef"))
        .unwrap();
    assert_eq!(agent.provider().provider_name(), "mock");

    let result = agent.run("garlic, pasta").await.unwrap();
    assert_eq!(result.output, "Pasta aglio e olio.");
}
