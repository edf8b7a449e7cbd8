//! Prompt templates served over `prompts/list` and `prompts/get`
//!
//! A prompt is a named text template; rendering fills in caller-supplied
//! arguments and returns one or more messages ready to hand to an LLM.

pub mod templates;

use std::collections::HashMap;

use crate::error::{DemoError, Result};
use crate::mcp::types::{GetPromptResponse, Prompt, PromptArgument, PromptMessage};

/// Arguments passed to `prompts/get`
pub type PromptArgs = HashMap<String, String>;

/// Render function signature shared by all templates
pub type RenderFn = fn(&PromptArgs) -> Result<Vec<PromptMessage>>;

/// A registered prompt: its listing metadata plus how to render it
#[derive(Clone)]
pub struct PromptTemplate {
    prompt: Prompt,
    render: RenderFn,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("name", &self.prompt.name)
            .finish_non_exhaustive()
    }
}

impl PromptTemplate {
    /// Build a template
    ///
    /// # Arguments
    ///
    /// * `name` - Unique prompt name
    /// * `description` - Listing description
    /// * `arguments` - `(name, description)` pairs; all are required
    /// * `render` - Produces the messages
    pub fn new(
        name: &str,
        description: &str,
        arguments: &[(&str, &str)],
        render: RenderFn,
    ) -> Self {
        let arguments = (!arguments.is_empty()).then(|| {
            arguments
                .iter()
                .map(|(arg, desc)| PromptArgument {
                    name: arg.to_string(),
                    description: Some(desc.to_string()),
                    required: Some(true),
                })
                .collect()
        });

        Self {
            prompt: Prompt {
                name: name.to_string(),
                description: Some(description.to_string()),
                arguments,
            },
            render,
        }
    }

    /// Listing metadata
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Render with `args`
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::InvalidArguments`] if a required argument is missing
    pub fn render(&self, args: &PromptArgs) -> Result<GetPromptResponse> {
        Ok(GetPromptResponse {
            description: self.prompt.description.clone(),
            messages: (self.render)(args)?,
        })
    }
}

/// Fetch a required argument
///
/// # Errors
///
/// Returns [`DemoError::InvalidArguments`] naming the missing key
pub fn required<'a>(args: &'a PromptArgs, key: &str) -> Result<&'a str> {
    args.get(key)
        .map(String::as_str)
        .ok_or_else(|| {
            DemoError::InvalidArguments(format!("missing required argument '{key}'")).into()
        })
}

/// Ordered set of prompt templates with unique names
#[derive(Debug, Default)]
pub struct PromptRegistry {
    templates: Vec<PromptTemplate>,
}

impl PromptRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four demo prompts
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        for template in templates::all() {
            registry.register(template)?;
        }
        Ok(registry)
    }

    /// Add a template
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::DuplicateCapability`] if the name is taken
    pub fn register(&mut self, template: PromptTemplate) -> Result<()> {
        if self.get(&template.prompt.name).is_some() {
            return Err(DemoError::DuplicateCapability {
                kind: "prompt".to_string(),
                name: template.prompt.name,
            }
            .into());
        }
        self.templates.push(template);
        Ok(())
    }

    /// Look up a template by name
    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.iter().find(|t| t.prompt.name == name)
    }

    /// Listing metadata in registration order
    pub fn list(&self) -> Vec<Prompt> {
        self.templates.iter().map(|t| t.prompt.clone()).collect()
    }

    /// Render a prompt by name
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::InvalidArguments`] for an unknown name or a
    /// missing argument
    pub fn render(&self, name: &str, args: &PromptArgs) -> Result<GetPromptResponse> {
        let template = self
            .get(name)
            .ok_or_else(|| DemoError::InvalidArguments(format!("Unknown prompt: {name}")))?;
        template.render(args)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
