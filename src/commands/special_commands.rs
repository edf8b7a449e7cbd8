//! Slash commands for the interactive chat client
//!
//! Anything starting with `/` (plus bare `exit`/`quit`) is parsed here
//! instead of being answered as conversation. Command words are
//! case-insensitive; arguments keep their case.

use std::collections::HashMap;

use thiserror::Error;

/// Errors produced while parsing or resolving a chat command
///
/// The `Display` text is printed to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}. Type /help to see available commands.")]
    UnknownCommand(String),

    /// `/tool` without a name
    #[error("Error: Tool name is required.")]
    MissingToolName,

    /// `/prompt` without a name
    #[error("Error: Prompt name is required.")]
    MissingPromptName,

    /// `/resource` without a URI
    #[error("Error: Resource URI is required.")]
    MissingResourceUri,

    /// A `key=value` argument without `=`
    #[error("Error: Invalid parameter format '{0}'. Use param=value.")]
    InvalidParameter(String),

    /// Name absent from `tools/list`
    #[error("Error: Tool '{0}' not found.")]
    ToolNotFound(String),

    /// Name absent from `prompts/list`
    #[error("Error: Prompt '{0}' not found.")]
    PromptNotFound(String),
}

/// A parsed chat command
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Show the command list
    Help,
    /// List tool names
    Tools,
    /// List resource URIs and templates
    Resources,
    /// List prompt names
    Prompts,
    /// Forget the conversation history
    Clear,
    /// Call a tool with typed arguments
    Tool {
        name: String,
        arguments: serde_json::Map<String, serde_json::Value>,
    },
    /// Read a resource by URI
    Resource(String),
    /// Render a prompt with string arguments
    Prompt {
        name: String,
        arguments: HashMap<String, String>,
    },
    /// `/exit`, `/quit` or a bare `exit`/`quit`
    Exit,
    /// Not a command; answer as conversation
    None,
}

/// Parse one line of user input
///
/// # Errors
///
/// Returns a [`CommandError`] for an unknown `/command`, a missing tool,
/// prompt or URI argument, or a malformed `key=value` pair
///
/// # Examples
///
/// ```
/// use mcpdemo::commands::special_commands::{parse_special_command, ChatCommand};
///
/// assert_eq!(parse_special_command("/tools").unwrap(), ChatCommand::Tools);
/// assert_eq!(parse_special_command("hello").unwrap(), ChatCommand::None);
/// assert!(parse_special_command("/tool").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<ChatCommand, CommandError> {
    let trimmed = input.trim();
    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or_default().to_lowercase();
    let rest: Vec<&str> = parts.collect();

    if !trimmed.starts_with('/') {
        return Ok(match head.as_str() {
            "exit" | "quit" if rest.is_empty() => ChatCommand::Exit,
            _ => ChatCommand::None,
        });
    }

    match head.as_str() {
        "/help" | "/?" => Ok(ChatCommand::Help),
        "/tools" => Ok(ChatCommand::Tools),
        "/resources" => Ok(ChatCommand::Resources),
        "/prompts" => Ok(ChatCommand::Prompts),
        "/clear" => Ok(ChatCommand::Clear),
        "/exit" | "/quit" => Ok(ChatCommand::Exit),

        "/tool" => {
            let (name, params) = rest.split_first().ok_or(CommandError::MissingToolName)?;
            let mut arguments = serde_json::Map::new();
            for param in params {
                let (key, value) = split_param(param)?;
                arguments.insert(key.to_string(), typed_value(value));
            }
            Ok(ChatCommand::Tool {
                name: name.to_string(),
                arguments,
            })
        }

        "/resource" => rest
            .first()
            .map(|uri| ChatCommand::Resource(uri.to_string()))
            .ok_or(CommandError::MissingResourceUri),

        "/prompt" => {
            let (name, params) = rest.split_first().ok_or(CommandError::MissingPromptName)?;
            let mut arguments = HashMap::new();
            for param in params {
                let (key, value) = split_param(param)?;
                arguments.insert(key.to_string(), value.to_string());
            }
            Ok(ChatCommand::Prompt {
                name: name.to_string(),
                arguments,
            })
        }

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn split_param(param: &str) -> Result<(&str, &str), CommandError> {
    param
        .split_once('=')
        .ok_or_else(|| CommandError::InvalidParameter(param.to_string()))
}

/// Interpret a tool argument value
///
/// A value containing `.` is tried as a float, anything else as an
/// integer; whatever does not parse stays a string.
///
/// # Examples
///
/// ```
/// use mcpdemo::commands::special_commands::typed_value;
///
/// assert_eq!(typed_value("1.75"), serde_json::json!(1.75));
/// assert_eq!(typed_value("70"), serde_json::json!(70));
/// assert_eq!(typed_value("C"), serde_json::json!("C"));
/// ```
pub fn typed_value(value: &str) -> serde_json::Value {
    let parsed = if value.contains('.') {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    } else {
        value.parse::<i64>().ok().map(serde_json::Value::from)
    };
    parsed.unwrap_or_else(|| serde_json::Value::String(value.to_string()))
}

/// Help text for the chat client
pub fn help_text() -> &'static str {
    r#"Available commands:
/help - Show this help message
/tools - List available tools
/resources - List available resources
/prompts - List available prompts
/clear - Clear the conversation history
/exit - Exit the chat

To use a tool: /tool <tool_name> <param1>=<value1> <param2>=<value2> ...
To get a resource: /resource <resource_uri>
To use a prompt: /prompt <prompt_name> <param1>=<value1> <param2>=<value2> ..."#
}
