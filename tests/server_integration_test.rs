//! End-to-end tests: the axum server on an ephemeral port, driven by the
//! crate's own MCP client over streamable HTTP.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use common::TestServer;
use futures::StreamExt;

use mcpdemo::commands::chat::{ChatClient, ChatOutcome};
use mcpdemo::commands::example::run_sequence;
use mcpdemo::mcp::protocol::ServerCapabilityFlag;
use mcpdemo::mcp::McpSession;
use mcpdemo::registry::Registry;

async fn connect(server: &TestServer) -> McpSession {
    McpSession::connect(&server.client_config(), "integration-test")
        .await
        .expect("connect")
}

#[tokio::test]
async fn test_handshake_reports_demo_server() {
    let server = TestServer::start().await;
    let session = connect(&server).await;

    assert_eq!(session.server_info().name, "mcp-server-demo");
    assert_eq!(session.protocol_version(), "2025-11-25");
    assert!(session.capable(ServerCapabilityFlag::Tools));
    assert!(session.capable(ServerCapabilityFlag::Resources));
    assert!(session.capable(ServerCapabilityFlag::Prompts));

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_listings_match_registry() {
    let server = TestServer::start().await;
    let session = connect(&server).await;
    let registry = Registry::with_defaults().unwrap();

    let tools: Vec<String> = session
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tools, registry.tools.names());

    let prompts = session.list_prompts().await.unwrap();
    assert_eq!(prompts.len(), 4);

    let resources = session.list_resources().await.unwrap();
    let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
    assert_eq!(uris, ["facts://random", "facts://all"]);

    let templates = session.list_resource_templates().await.unwrap();
    assert_eq!(templates[0].uri_template, "weather://{city}");

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_tools_over_the_wire() {
    let server = TestServer::start().await;
    let session = connect(&server).await;

    let bmi = session
        .call_tool(
            "calculate_bmi",
            Some(serde_json::json!({"weight_kg": 70, "height_m": 1.75})),
        )
        .await
        .unwrap();
    let bmi = bmi.structured_content.unwrap();
    assert_eq!(bmi["bmi"], 22.86);
    assert_eq!(bmi["category"], "Normal weight");

    let temp = session
        .call_tool(
            "convert_temperature",
            Some(serde_json::json!({"value": 0, "from_unit": "Celsius", "to_unit": "Fahrenheit"})),
        )
        .await
        .unwrap();
    assert_eq!(temp.structured_content.unwrap()["converted_value"], 32.0);

    let counts = session
        .call_tool("word_count", Some(serde_json::json!({"text": "a b\nc"})))
        .await
        .unwrap();
    let counts = counts.structured_content.unwrap();
    assert_eq!(counts["word_count"], 3);
    assert_eq!(counts["line_count"], 2);
    assert_eq!(counts["character_count"], 5);

    let echo = session
        .call_tool("echo_with_context", Some(serde_json::json!({"message": "hi"})))
        .await
        .unwrap();
    assert!(echo.joined_text().starts_with("Echo: hi\nRequest ID: "));

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_tool_rejections() {
    let server = TestServer::start().await;
    let session = connect(&server).await;

    let refused = session
        .call_tool(
            "calculate_bmi",
            Some(serde_json::json!({"weight_kg": -1, "height_m": 1.75})),
        )
        .await
        .unwrap();
    assert_eq!(refused.is_error, Some(true));
    assert_eq!(
        refused.joined_text(),
        "Weight and height must be positive values"
    );

    let err = session
        .call_tool(
            "calculate_bmi",
            Some(serde_json::json!({"weight_kg": "heavy", "height_m": 1.75})),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid params"), "{err}");

    let err = session.call_tool("no_such_tool", None).await.unwrap_err();
    assert!(err.to_string().contains("Unknown tool"), "{err}");

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_resources_over_the_wire() {
    let server = TestServer::start().await;
    let session = connect(&server).await;

    let weather = session.read_resource("weather://London").await.unwrap();
    assert_eq!(weather.first_text(), "Rainy, 60°F");

    let spaced = session.read_resource("weather://new%20york").await.unwrap();
    assert_eq!(spaced.first_text(), "Sunny, 75°F");

    let unknown = session.read_resource("weather://oslo").await.unwrap();
    assert_eq!(
        unknown.first_text(),
        "Weather data for oslo is not available."
    );

    let all = session.read_resource("facts://all").await.unwrap();
    let facts: Vec<String> = serde_json::from_str(all.first_text()).unwrap();
    assert!(!facts.is_empty());
    for _ in 0..10 {
        let fact = session.read_resource("facts://random").await.unwrap();
        assert!(facts.iter().any(|f| f == fact.first_text()));
    }

    let err = session.read_resource("facts://none").await.unwrap_err();
    assert!(err.to_string().contains("Resource not found"), "{err}");

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_prompts_over_the_wire() {
    let server = TestServer::start().await;
    let session = connect(&server).await;

    let prompt = session
        .get_prompt(
            "weather_inquiry",
            Some(HashMap::from([("city".to_string(), "Tokyo".to_string())])),
        )
        .await
        .unwrap();
    assert_eq!(
        prompt.messages[0].text(),
        "What's the weather like in Tokyo today?"
    );

    let err = session.get_prompt("weather_inquiry", None).await.unwrap_err();
    assert!(err.to_string().contains("Invalid params"), "{err}");

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_example_sequence_completes() {
    let server = TestServer::start().await;
    let session = connect(&server).await;

    run_sequence(&session).await.unwrap();

    drop(session);
    server.stop().await;
}

#[tokio::test]
async fn test_chat_client_commands_and_keywords() {
    let server = TestServer::start().await;
    let mut chat = ChatClient::from_session(connect(&server).await)
        .await
        .unwrap();

    assert_eq!(chat.tools().len(), 4);
    assert_eq!(chat.resources().len(), 3);
    assert_eq!(chat.prompts().len(), 4);

    let greeting = chat.greeting().await.unwrap();
    assert_eq!(
        greeting,
        "Hello! I'm an AI assistant. How can I help you today?"
    );

    assert_eq!(
        chat.handle_line("what's the weather in Paris?").await,
        ChatOutcome::Assistant("The weather in Paris is: Partly cloudy, 65°F".to_string())
    );
    assert_eq!(
        chat.handle_line("hello there").await,
        ChatOutcome::Assistant("You said: hello there".to_string())
    );

    let ChatOutcome::Command(out) = chat
        .handle_line("/tool calculate_bmi weight_kg=70 height_m=1.75")
        .await
    else {
        panic!("expected command output");
    };
    assert!(out.starts_with("Tool result:"), "{out}");
    assert!(out.contains("22.86"), "{out}");

    assert_eq!(
        chat.handle_line("/tool launch_rocket").await,
        ChatOutcome::Command("Error: Tool 'launch_rocket' not found.".to_string())
    );

    let ChatOutcome::Command(out) = chat.handle_line("/resource facts://all").await else {
        panic!("expected command output");
    };
    assert!(out.starts_with("Resource content:"), "{out}");

    // greeting + two exchanges
    assert_eq!(chat.history().len(), 5);
    assert_eq!(
        chat.handle_line("/clear").await,
        ChatOutcome::Command("Conversation history cleared.".to_string())
    );
    assert!(chat.history().is_empty());

    assert_eq!(chat.handle_line("/quit").await, ChatOutcome::Exit);

    drop(chat);
    server.stop().await;
}

/// Next non-comment SSE event, buffering partial chunks
async fn read_event<S>(body: &mut S, buffer: &mut String) -> String
where
    S: futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
{
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let event: String = buffer.drain(..end + 2).collect();
            if event.starts_with(':') {
                continue;
            }
            return event;
        }
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("sse timed out")
            .expect("sse ended")
            .unwrap();
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
}

fn data_line(event: &str) -> &str {
    event
        .lines()
        .find_map(|l| l.strip_prefix("data:"))
        .map(str::trim_start)
        .unwrap_or_default()
}

#[tokio::test]
async fn test_legacy_sse_transport() {
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/sse", server.base_url()))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let mut body = Box::pin(response.bytes_stream());
    let mut buffer = String::new();

    let endpoint = read_event(&mut body, &mut buffer).await;
    assert!(endpoint.contains("endpoint"), "{endpoint}");
    let path = data_line(&endpoint).to_string();
    assert!(path.starts_with("/messages/?session_id="), "{path}");

    let status = http
        .post(format!("{}{}", server.base_url(), path))
        .json(&serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "ping"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);

    let message = read_event(&mut body, &mut buffer).await;
    assert!(message.contains("message"), "{message}");
    let reply: serde_json::Value = serde_json::from_str(data_line(&message)).unwrap();
    assert_eq!(reply["id"], 7);
    assert_eq!(reply["result"], serde_json::json!({}));

    drop(body);
    server.stop().await;
}
