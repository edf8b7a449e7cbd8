//! Scripted example client
//!
//! Walks through one request per capability category against a running
//! server and prints each result. The first failed request ends the run
//! with an error.

use std::collections::HashMap;

use colored::Colorize;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{DemoError, Result};
use crate::mcp::types::CallToolResponse;
use crate::mcp::McpSession;

const WORD_COUNT_SAMPLE: &str =
    "This is a sample text for word counting. It has multiple words and characters.";

fn section(title: &str, body: impl std::fmt::Display) {
    println!("\n{} {}", format!("{}:", title).bold(), body);
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Treat a tool-level error as a failed step
fn tool_output(name: &str, response: CallToolResponse) -> Result<String> {
    if response.is_error == Some(true) {
        return Err(DemoError::InvalidArguments(format!(
            "{} failed: {}",
            name,
            response.joined_text()
        ))
        .into());
    }
    match &response.structured_content {
        Some(value) => to_json(value),
        None => Ok(response.joined_text()),
    }
}

/// Run the fixed example sequence against an established session
///
/// # Errors
///
/// Returns the first request or tool failure
pub async fn run_sequence(session: &McpSession) -> Result<()> {
    section("Server Info", to_json(session.server_info())?);
    println!("Protocol version: {}", session.protocol_version());

    section("Available Prompts", to_json(&session.list_prompts().await?)?);

    let greeting = session.get_prompt("greeting", None).await?;
    section("Greeting Prompt", to_json(&greeting.messages)?);

    let weather_prompt = session
        .get_prompt(
            "weather_inquiry",
            Some(HashMap::from([("city".to_string(), "London".to_string())])),
        )
        .await?;
    section("Weather Inquiry Prompt", to_json(&weather_prompt.messages)?);

    section(
        "Available Resources",
        to_json(&session.list_resources().await?)?,
    );
    section(
        "Resource Templates",
        to_json(&session.list_resource_templates().await?)?,
    );

    let weather = session.read_resource("weather://london").await?;
    section("London Weather", weather.first_text());

    let fact = session.read_resource("facts://random").await?;
    section("Random Fact", fact.first_text());

    section("Available Tools", to_json(&session.list_tools().await?)?);

    let calls: [(&str, &str, serde_json::Value); 4] = [
        (
            "BMI Calculation",
            "calculate_bmi",
            serde_json::json!({"weight_kg": 70, "height_m": 1.75}),
        ),
        (
            "Temperature Conversion",
            "convert_temperature",
            serde_json::json!({"value": 32, "from_unit": "F", "to_unit": "C"}),
        ),
        (
            "Word Count",
            "word_count",
            serde_json::json!({"text": WORD_COUNT_SAMPLE}),
        ),
        (
            "Echo Result",
            "echo_with_context",
            serde_json::json!({"message": "Hello from MCP client!"}),
        ),
    ];

    for (title, tool, arguments) in calls {
        tracing::debug!(tool, "Calling tool");
        let response = session.call_tool(tool, Some(arguments)).await?;
        section(title, tool_output(tool, response)?);
    }

    Ok(())
}

/// Connect to the configured server and run the example sequence
///
/// # Errors
///
/// Returns an error if the server is unreachable or any step fails
pub async fn run_example(config: &ClientConfig) -> Result<()> {
    println!("Connecting to MCP server at {}...", config.server_url);
    let session = McpSession::connect(config, "mcpdemo-example").await?;
    run_sequence(&session).await?;
    println!("\n{}", "Example completed.".green());
    Ok(())
}
