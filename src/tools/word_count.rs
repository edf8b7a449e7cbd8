//! `word_count` tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{parse_args, round2, ToolContext, ToolExecutor};
use crate::error::Result;
use crate::mcp::types::{CallToolResponse, McpTool};

/// Tool name on the wire
pub const NAME: &str = "word_count";

/// Counts reported by [`word_stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordStats {
    /// Whitespace-separated tokens
    pub word_count: usize,
    /// Unicode scalar values, newlines included
    pub character_count: usize,
    /// Lines; empty text still has one
    pub line_count: usize,
    /// Total characters over words, two decimals; 0 when there are no words
    pub average_word_length: f64,
}

/// Count words, characters and lines in `text`
///
/// # Examples
///
/// ```
/// use mcpdemo::tools::word_count::word_stats;
///
/// let stats = word_stats("a b\nc");
/// assert_eq!(stats.word_count, 3);
/// assert_eq!(stats.line_count, 2);
/// assert_eq!(stats.character_count, 5);
/// ```
pub fn word_stats(text: &str) -> WordStats {
    let word_count = text.split_whitespace().count();
    let character_count = text.chars().count();
    // Whitespace and newlines count toward the average too.
    let average_word_length = if word_count == 0 {
        0.0
    } else {
        round2(character_count as f64 / word_count as f64)
    };

    WordStats {
        word_count,
        character_count,
        line_count: count_lines(text).max(1),
        average_word_length,
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}' | '\u{2029}'
    )
}

/// Lines split on every Unicode line boundary
///
/// `\r\n` is one break and a trailing break does not open a new line.
fn count_lines(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if is_line_break(c) {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            lines += 1;
            open = false;
        } else {
            open = true;
        }
    }
    lines + usize::from(open)
}

#[derive(Debug, Deserialize)]
struct WordCountArgs {
    text: String,
}

/// Executor for [`NAME`]
pub struct WordCountTool;

#[async_trait]
impl ToolExecutor for WordCountTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: NAME.to_string(),
            description: Some("Count words, characters, and lines in text".to_string()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to analyze"}
                },
                "required": ["text"]
            }),
        }
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<CallToolResponse> {
        let args: WordCountArgs = parse_args(NAME, args)?;
        let stats = word_stats(&args.text);
        Ok(CallToolResponse::json(serde_json::to_value(stats)?))
    }
}
