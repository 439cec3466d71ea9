//! Tool contract and the built-in tool catalog.

mod collections;
mod pages;
pub(crate) mod system;

pub use collections::{MenuListTool, TemplateListTool, UserListTool};
pub use pages::{
    PageCreateTool, PageDeleteTool, PageGetTool, PageListTool, PageSearchTool, PageUpdateTool,
};
pub use system::{SiteInfoTool, SiteListTool, SystemInfoTool};

use crate::mcp::protocol::ServerInfo;
use crate::site::{SiteContext, SiteDirectory, SiteStore};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One content block of a tool result. Only text blocks exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// The envelope every tool execution produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Content>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
        }
    }

    /// Structured payloads travel as pretty-printed JSON text.
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> Result<Self> {
        Ok(Self::text(serde_json::to_string_pretty(payload)?))
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            Content::Text { text } => text.as_str(),
        })
    }
}

/// What a capability can see while it runs.
pub struct ToolContext<'a> {
    /// The active site, present whenever a switch happened for this call.
    pub site: Option<&'a SiteContext>,
    pub sites: &'a SiteDirectory,
    pub server: &'a ServerInfo,
}

impl<'a> ToolContext<'a> {
    pub fn store(&self) -> Result<&'a dyn SiteStore> {
        self.site
            .map(|ctx| ctx.store.as_ref())
            .ok_or_else(|| Error::Internal("No active site for this call".to_string()))
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for `arguments`. Advisory only; tools validate input themselves.
    fn input_schema(&self) -> Value;

    /// Whether the default site is selected when the caller names none.
    fn requires_site(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult>;
}

/// `tools/list` entry for a tool.
pub fn describe(tool: &dyn Tool) -> Value {
    json!({
        "name": tool.name(),
        "description": tool.description(),
        "inputSchema": tool.input_schema(),
    })
}

/// Object schema with an optional `site` property added to `properties`.
pub(crate) fn site_schema(properties: Value, required: &[&str]) -> Value {
    let mut properties = properties.as_object().cloned().unwrap_or_default();
    properties.insert(
        "site".to_string(),
        json!({
            "type": "string",
            "description": "Site domain to operate on (defaults to the configured default site)"
        }),
    );
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(Error::InvalidParams(format!(
            "Argument '{}' must not be empty",
            key
        ))),
        Some(_) => Err(Error::InvalidParams(format!(
            "Argument '{}' must be a string",
            key
        ))),
        None => Err(Error::InvalidParams(format!(
            "Missing required argument: {}",
            key
        ))),
    }
}

pub fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(Error::InvalidParams(format!(
            "Argument '{}' must be a string",
            key
        ))),
    }
}
