//! Resources served over `resources/list`, `resources/templates/list` and
//! `resources/read`
//!
//! All three resources are views over the shared [`Catalog`], so a reloaded
//! catalog is visible on the next read without re-registering anything.

use crate::catalog::Catalog;
use crate::error::{DemoError, Result};
use crate::mcp::types::{ReadResourceResponse, Resource, ResourceTemplate, TextResourceContents};

/// URI of the random fact resource
pub const RANDOM_FACT_URI: &str = "facts://random";
/// URI of the full fact list
pub const ALL_FACTS_URI: &str = "facts://all";
/// Template for per-city weather
pub const WEATHER_TEMPLATE: &str = "weather://{city}";

const WEATHER_SCHEME: &str = "weather://";
const TEXT_PLAIN: &str = "text/plain";
const APPLICATION_JSON: &str = "application/json";

/// A parsed resource URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRoute {
    /// `weather://{city}`
    Weather(String),
    /// `facts://random`
    RandomFact,
    /// `facts://all`
    AllFacts,
}

/// Parse a resource URI into a route.
///
/// Returns `None` if no resource matches.
pub fn parse_resource_uri(uri: &str) -> Option<ResourceRoute> {
    match uri {
        RANDOM_FACT_URI => return Some(ResourceRoute::RandomFact),
        ALL_FACTS_URI => return Some(ResourceRoute::AllFacts),
        _ => {}
    }

    let city = uri.strip_prefix(WEATHER_SCHEME)?.trim_end_matches('/');
    if city.is_empty() || city.contains('/') {
        return None;
    }
    Some(ResourceRoute::Weather(percent_decode(city)))
}

/// Decode every `%XX` escape in a URI segment
///
/// Escapes are collected as bytes so multi-byte UTF-8 sequences survive.
/// A `%` not followed by two hex digits is kept literally.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).map(|d| d as u8)
}

/// Static listing of the demo resources
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
    templates: Vec<ResourceTemplate>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ResourceRegistry {
    /// The two static fact resources and the weather template
    pub fn with_defaults() -> Self {
        Self {
            resources: vec![
                Resource {
                    uri: RANDOM_FACT_URI.to_string(),
                    name: "random_fact".to_string(),
                    description: Some("A randomly selected interesting fact".to_string()),
                    mime_type: Some(TEXT_PLAIN.to_string()),
                },
                Resource {
                    uri: ALL_FACTS_URI.to_string(),
                    name: "all_facts".to_string(),
                    description: Some("Every fact as a JSON array".to_string()),
                    mime_type: Some(APPLICATION_JSON.to_string()),
                },
            ],
            templates: vec![ResourceTemplate {
                uri_template: WEATHER_TEMPLATE.to_string(),
                name: "weather".to_string(),
                description: Some("Current weather for a city".to_string()),
                mime_type: Some(TEXT_PLAIN.to_string()),
            }],
        }
    }

    /// Concrete resources
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Parameterized resources
    pub fn templates(&self) -> &[ResourceTemplate] {
        &self.templates
    }

    /// URIs and URI templates, listing order
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.resources
            .iter()
            .map(|r| r.uri.as_str())
            .chain(self.templates.iter().map(|t| t.uri_template.as_str()))
    }

    /// Read `uri` against the current catalog
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::ResourceNotFound`] if the URI matches nothing
    pub async fn read(&self, uri: &str, catalog: &Catalog) -> Result<ReadResourceResponse> {
        let route =
            parse_resource_uri(uri).ok_or_else(|| DemoError::ResourceNotFound(uri.to_string()))?;

        let (text, mime_type) = match route {
            ResourceRoute::Weather(city) => {
                let text = catalog
                    .weather_for(&city)
                    .await
                    .unwrap_or_else(|| format!("Weather data for {city} is not available."));
                (text, TEXT_PLAIN)
            }
            ResourceRoute::RandomFact => {
                let fact = catalog
                    .random_fact()
                    .await
                    .ok_or_else(|| DemoError::Environment("catalog has no facts".to_string()))?;
                (fact, TEXT_PLAIN)
            }
            ResourceRoute::AllFacts => {
                (serde_json::to_string(&catalog.facts().await)?, APPLICATION_JSON)
            }
        };

        Ok(ReadResourceResponse {
            contents: vec![TextResourceContents {
                uri: uri.to_string(),
                mime_type: Some(mime_type.to_string()),
                text,
            }],
        })
    }
}
