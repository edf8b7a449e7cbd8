//! Capability registry
//!
//! Bundles the prompt, resource and tool registries the server exposes and
//! describes every capability as a `(name, kind)` pair. The set is fixed at
//! startup; names are unique within their kind.

use std::collections::HashSet;
use std::fmt;

use crate::error::{DemoError, Result};
use crate::mcp::types::{ListChangedCapability, ServerCapabilities};
use crate::prompts::PromptRegistry;
use crate::resources::ResourceRegistry;
use crate::tools::ToolRegistry;

/// Capability category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// Served by `prompts/*`
    Prompt,
    /// Served by `resources/*`
    Resource,
    /// Served by `tools/*`
    Tool,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapabilityKind::Prompt => "prompt",
            CapabilityKind::Resource => "resource",
            CapabilityKind::Tool => "tool",
        })
    }
}

/// Immutable descriptor of one capability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    /// Prompt or tool name, or resource URI / URI template
    pub name: String,
    /// Category
    pub kind: CapabilityKind,
}

/// Everything the server exposes
#[derive(Debug)]
pub struct Registry {
    /// Prompt templates
    pub prompts: PromptRegistry,
    /// Resources and resource templates
    pub resources: ResourceRegistry,
    /// Tool executors
    pub tools: ToolRegistry,
}

impl Registry {
    /// Combine the three registries, checking name uniqueness per kind
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::DuplicateCapability`] for the first clash found
    pub fn new(
        prompts: PromptRegistry,
        resources: ResourceRegistry,
        tools: ToolRegistry,
    ) -> Result<Self> {
        let registry = Self {
            prompts,
            resources,
            tools,
        };

        let mut seen = HashSet::new();
        for capability in registry.descriptors() {
            if !seen.insert((capability.kind, capability.name.clone())) {
                return Err(DemoError::DuplicateCapability {
                    kind: capability.kind.to_string(),
                    name: capability.name,
                }
                .into());
            }
        }

        Ok(registry)
    }

    /// The demo capability set
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            PromptRegistry::with_defaults()?,
            ResourceRegistry::with_defaults(),
            ToolRegistry::with_defaults()?,
        )
    }

    /// Descriptors for every capability: prompts, then resources, then tools
    pub fn descriptors(&self) -> Vec<Capability> {
        let prompts = self.prompts.list().into_iter().map(|p| Capability {
            name: p.name,
            kind: CapabilityKind::Prompt,
        });
        let resources = self.resources.uris().map(|uri| Capability {
            name: uri.to_string(),
            kind: CapabilityKind::Resource,
        });
        let tools = self.tools.names().iter().map(|name| Capability {
            name: name.clone(),
            kind: CapabilityKind::Tool,
        });

        prompts.chain(resources).chain(tools).collect()
    }

    /// Whether a capability with this name and kind exists
    pub fn contains(&self, kind: CapabilityKind, name: &str) -> bool {
        match kind {
            CapabilityKind::Prompt => self.prompts.get(name).is_some(),
            CapabilityKind::Resource => self.resources.uris().any(|uri| uri == name),
            CapabilityKind::Tool => self.tools.get(name).is_some(),
        }
    }

    /// Capabilities advertised in the `initialize` result
    pub fn server_capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            prompts: Some(ListChangedCapability::default()),
            resources: Some(ListChangedCapability::default()),
            tools: Some(ListChangedCapability::default()),
        }
    }
}
