//! Interactive chat client
//!
//! Connects to the demo server, shows the greeting prompt and then runs a
//! readline loop. Slash commands call capabilities directly; free text is
//! answered by simple keyword matching that reads resources on the user's
//! behalf. There is no LLM behind it.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::catalog::DEFAULT_CITY;
use crate::commands::special_commands::{
    help_text, parse_special_command, ChatCommand, CommandError,
};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::mcp::types::PromptMessage;
use crate::mcp::McpSession;

/// Cities the keyword matcher recognizes
pub const KNOWN_CITIES: [&str; 5] = ["new york", "london", "tokyo", "sydney", "paris"];

const FRAME_WIDTH: usize = 50;

/// What a line of free text asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Read `weather://<city>`
    Weather(String),
    /// Read `facts://random`
    Fact,
    /// Explain how to call `calculate_bmi`
    BmiHint,
    /// Explain how to call `convert_temperature`
    TemperatureHint,
    /// Explain how to call `word_count`
    WordCountHint,
    /// Nothing recognized
    Echo,
}

/// Classify free text by keyword, first match wins
///
/// # Examples
///
/// ```
/// use mcpdemo::commands::chat::{classify, Intent};
///
/// assert_eq!(classify("Weather in Tokyo?"), Intent::Weather("tokyo".to_string()));
/// assert_eq!(classify("tell me a fact"), Intent::Fact);
/// assert_eq!(classify("hi"), Intent::Echo);
/// ```
pub fn classify(input: &str) -> Intent {
    let lower = input.to_lowercase();

    if lower.contains("weather") {
        let city = KNOWN_CITIES
            .iter()
            .find(|city| lower.contains(*city))
            .copied()
            .unwrap_or(DEFAULT_CITY);
        Intent::Weather(city.to_string())
    } else if lower.contains("fact") {
        Intent::Fact
    } else if lower.contains("bmi") {
        Intent::BmiHint
    } else if lower.contains("temperature") && lower.contains("convert") {
        Intent::TemperatureHint
    } else if lower.contains("count") && (lower.contains("word") || lower.contains("character")) {
        Intent::WordCountHint
    } else {
        Intent::Echo
    }
}

/// `new york` -> `New York`
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result of handling one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Text answering a conversation line
    Assistant(String),
    /// Output of a slash command
    Command(String),
    /// The user asked to leave
    Exit,
}

/// A chat client connected to one server
#[derive(Debug)]
pub struct ChatClient {
    session: McpSession,
    tools: Vec<String>,
    resources: Vec<String>,
    prompts: Vec<String>,
    history: Vec<PromptMessage>,
}

impl ChatClient {
    /// Connect and fetch the capability lists
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake or any listing request fails
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let session = McpSession::connect(config, "mcpdemo-chat").await?;
        Self::from_session(session).await
    }

    /// Build a client around an initialized session
    pub async fn from_session(session: McpSession) -> Result<Self> {
        let tools = session
            .list_tools()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let mut resources: Vec<String> = session
            .list_resources()
            .await?
            .into_iter()
            .map(|r| r.uri)
            .collect();
        resources.extend(
            session
                .list_resource_templates()
                .await?
                .into_iter()
                .map(|t| t.uri_template),
        );

        let prompts = session
            .list_prompts()
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        Ok(Self {
            session,
            tools,
            resources,
            prompts,
            history: Vec::new(),
        })
    }

    /// Name the server reported during the handshake
    pub fn server_name(&self) -> &str {
        &self.session.server_info().name
    }

    /// Tool names discovered at connect time
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// Resource URIs followed by URI templates
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Prompt names discovered at connect time
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Conversation so far, oldest first
    pub fn history(&self) -> &[PromptMessage] {
        &self.history
    }

    /// Fetch the `greeting` prompt and record it as the assistant's opener
    pub async fn greeting(&mut self) -> Result<String> {
        let response = self.session.get_prompt("greeting", None).await?;
        let text = response
            .messages
            .iter()
            .map(PromptMessage::text)
            .collect::<Vec<_>>()
            .join("\n");
        self.history.push(PromptMessage::assistant(text.clone()));
        Ok(text)
    }

    /// Handle one line of input
    ///
    /// Failures are reported in the returned text; nothing is retried.
    pub async fn handle_line(&mut self, line: &str) -> ChatOutcome {
        match parse_special_command(line) {
            Ok(ChatCommand::None) => ChatOutcome::Assistant(self.converse(line.trim()).await),
            Ok(ChatCommand::Exit) => ChatOutcome::Exit,
            Ok(command) => ChatOutcome::Command(self.run_command(command).await),
            Err(e) => ChatOutcome::Command(e.to_string()),
        }
    }

    async fn run_command(&mut self, command: ChatCommand) -> String {
        match command {
            ChatCommand::Help => help_text().to_string(),
            ChatCommand::Tools => format!("Available tools: {}", self.tools.join(", ")),
            ChatCommand::Resources => {
                format!("Available resources: {}", self.resources.join(", "))
            }
            ChatCommand::Prompts => format!("Available prompts: {}", self.prompts.join(", ")),
            ChatCommand::Clear => {
                self.history.clear();
                "Conversation history cleared.".to_string()
            }
            ChatCommand::Tool { name, arguments } => {
                if !self.tools.contains(&name) {
                    return CommandError::ToolNotFound(name).to_string();
                }
                tracing::debug!(tool = %name, "Calling tool");
                match self
                    .session
                    .call_tool(&name, Some(serde_json::Value::Object(arguments)))
                    .await
                {
                    Ok(result) if result.is_error == Some(true) => {
                        format!("Tool error: {}", result.joined_text())
                    }
                    Ok(result) => format!("Tool result: {}", pretty(&result.joined_text())),
                    Err(e) => format!("Error using tool: {}", e),
                }
            }
            ChatCommand::Resource(uri) => match self.session.read_resource(&uri).await {
                Ok(result) => format!("Resource content: {}", pretty(result.first_text())),
                Err(e) => format!("Error getting resource: {}", e),
            },
            ChatCommand::Prompt { name, arguments } => {
                if !self.prompts.contains(&name) {
                    return CommandError::PromptNotFound(name).to_string();
                }
                match self.session.get_prompt(&name, Some(arguments)).await {
                    Ok(result) => {
                        let mut out = String::from("Prompt:");
                        for message in &result.messages {
                            out.push_str(&format!("\n[{}] {}", message.role, message.text()));
                        }
                        out
                    }
                    Err(e) => format!("Error getting prompt: {}", e),
                }
            }
            ChatCommand::Exit | ChatCommand::None => String::new(),
        }
    }

    async fn converse(&mut self, input: &str) -> String {
        self.history.push(PromptMessage::user(input));

        let response = match classify(input) {
            Intent::Weather(city) => {
                match self.session.read_resource(&format!("weather://{}", city)).await {
                    Ok(result) => format!(
                        "The weather in {} is: {}",
                        title_case(&city),
                        result.first_text()
                    ),
                    Err(e) => format!("Sorry, I couldn't get the weather information: {}", e),
                }
            }
            Intent::Fact => match self.session.read_resource("facts://random").await {
                Ok(result) => format!("Here's an interesting fact: {}", result.first_text()),
                Err(e) => format!("Sorry, I couldn't get a fact: {}", e),
            },
            Intent::BmiHint => "To calculate BMI, use the command: /tool calculate_bmi \
                                weight_kg=<weight> height_m=<height>"
                .to_string(),
            Intent::TemperatureHint => "To convert temperature, use the command: /tool \
                                        convert_temperature value=<value> from_unit=<C/F/K> \
                                        to_unit=<C/F/K>"
                .to_string(),
            Intent::WordCountHint => {
                "To count words and characters, use the command: /tool word_count \
                 text=<your text>"
                    .to_string()
            }
            Intent::Echo => format!("You said: {}", input),
        };

        self.history.push(PromptMessage::assistant(response.clone()));
        response
    }
}

/// Re-indent JSON text; anything else is returned unchanged
fn pretty(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .filter(|v| v.is_object() || v.is_array())
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| text.to_string())
}

fn print_framed(body: &str) {
    let rule = "=".repeat(FRAME_WIDTH);
    println!("\n{}", rule.dimmed());
    println!("{}", body);
    println!("{}\n", rule.dimmed());
}

fn print_outcome(outcome: &ChatOutcome) {
    match outcome {
        ChatOutcome::Assistant(text) => {
            print_framed(&format!("{} {}", "Assistant:".cyan().bold(), text));
        }
        ChatOutcome::Command(text) if text.starts_with("Error") => {
            print_framed(&text.red().to_string());
        }
        ChatOutcome::Command(text) => print_framed(text),
        ChatOutcome::Exit => {}
    }
}

/// Start the interactive chat loop
///
/// # Arguments
///
/// * `config` - Client settings naming the server URL
///
/// # Errors
///
/// Returns an error if the server cannot be reached or initialized, or the
/// line editor cannot be created
pub async fn run_chat(config: &ClientConfig) -> Result<()> {
    tracing::info!("Connecting to MCP server at {}", config.server_url);
    let mut client = ChatClient::connect(config).await?;

    println!(
        "{} {}",
        "Connected to MCP server:".green(),
        client.server_name().bold()
    );
    println!(
        "Found {} tools, {} resources, {} prompts",
        client.tools().len(),
        client.resources().len(),
        client.prompts().len()
    );
    println!("Available tools: {}", client.tools().join(", "));
    println!("Available resources: {}", client.resources().join(", "));
    println!("Available prompts: {}", client.prompts().join(", "));

    let greeting = client.greeting().await?;
    print_outcome(&ChatOutcome::Assistant(greeting));
    println!("Type /help for commands, /exit to leave.\n");

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let outcome = client.handle_line(trimmed).await;
                if outcome == ChatOutcome::Exit {
                    break;
                }
                print_outcome(&outcome);
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_weather_picks_known_city() {
        assert_eq!(
            classify("What's the weather in New York?"),
            Intent::Weather("new york".to_string())
        );
        assert_eq!(
            classify("sydney weather please"),
            Intent::Weather("sydney".to_string())
        );
    }

    #[test]
    fn test_classify_weather_defaults_to_london() {
        assert_eq!(
            classify("how is the weather in Oslo"),
            Intent::Weather("london".to_string())
        );
    }

    #[test]
    fn test_classify_weather_wins_over_fact() {
        assert_eq!(
            classify("fact: weather in paris"),
            Intent::Weather("paris".to_string())
        );
    }

    #[test]
    fn test_classify_hints() {
        assert_eq!(classify("what is my BMI"), Intent::BmiHint);
        assert_eq!(
            classify("convert this temperature"),
            Intent::TemperatureHint
        );
        assert_eq!(classify("temperature today"), Intent::Echo);
        assert_eq!(classify("count the words"), Intent::WordCountHint);
        assert_eq!(classify("count characters"), Intent::WordCountHint);
        assert_eq!(classify("count to ten"), Intent::Echo);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("london"), "London");
    }

    #[test]
    fn test_pretty_reindents_json_only() {
        assert!(pretty(r#"{"bmi":22.86}"#).contains("\n  \"bmi\": 22.86"));
        assert_eq!(pretty("Rainy, 60°F"), "Rainy, 60°F");
        assert_eq!(pretty("42"), "42");
    }
}
