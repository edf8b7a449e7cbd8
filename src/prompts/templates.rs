//! The four demo prompts

use super::{required, PromptArgs, PromptTemplate};
use crate::error::Result;
use crate::mcp::types::PromptMessage;

/// All demo templates in listing order
pub fn all() -> Vec<PromptTemplate> {
    vec![
        PromptTemplate::new("greeting", "A friendly greeting prompt", &[], greeting),
        PromptTemplate::new(
            "weather_inquiry",
            "Ask about the weather in a specific city",
            &[("city", "City to ask about")],
            weather_inquiry,
        ),
        PromptTemplate::new(
            "code_review",
            "Request a review of a code snippet",
            &[
                ("code", "Source code to review"),
                ("language", "Programming language of the code"),
            ],
            code_review,
        ),
        PromptTemplate::new(
            "conversation_starter",
            "Open a conversation about a topic",
            &[("topic", "Topic to talk about")],
            conversation_starter,
        ),
    ]
}

fn greeting(_args: &PromptArgs) -> Result<Vec<PromptMessage>> {
    Ok(vec![PromptMessage::user(
        "Hello! I'm an AI assistant. How can I help you today?",
    )])
}

fn weather_inquiry(args: &PromptArgs) -> Result<Vec<PromptMessage>> {
    let city = required(args, "city")?;
    Ok(vec![PromptMessage::user(format!(
        "What's the weather like in {city} today?"
    ))])
}

fn code_review(args: &PromptArgs) -> Result<Vec<PromptMessage>> {
    let code = required(args, "code")?;
    let language = required(args, "language")?;
    Ok(vec![PromptMessage::user(format!(
        "Please review this {language} code and provide feedback:\n\n\
         ```{language}\n{code}\n```\n\n\
         Please consider:\n\
         1. Code correctness\n\
         2. Best practices\n\
         3. Potential bugs\n\
         4. Performance issues\n\
         5. Readability"
    ))])
}

fn conversation_starter(args: &PromptArgs) -> Result<Vec<PromptMessage>> {
    let topic = required(args, "topic")?;
    Ok(vec![
        PromptMessage::user(format!("Let's talk about {topic}.")),
        PromptMessage::assistant(
            "That's an interesting topic! What aspects of it would you like to explore?",
        ),
    ])
}
