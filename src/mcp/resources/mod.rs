use crate::mcp::tools::ToolContext;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

mod catalog;
pub use catalog::{
    ServerInfoResource, SiteInfoResource, SiteListResource, SitePageResource, SitePagesResource,
};

/// Segments captured from a URI template, keyed by placeholder name.
pub type UriParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// How a resource claims URIs: an exact string or a `{name}` template.
///
/// Templates are split on `/`; each `{name}` segment captures exactly one
/// non-empty path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriMatcher {
    Exact(String),
    Template { raw: String, segments: Vec<Segment> },
}

impl UriMatcher {
    pub fn exact(uri: impl Into<String>) -> Self {
        Self::Exact(uri.into())
    }

    pub fn template(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw
            .split('/')
            .map(|part| match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(part.to_string()),
            })
            .collect();
        Self::Template { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(uri) => uri,
            Self::Template { raw, .. } => raw,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template { .. })
    }

    pub fn matches(&self, uri: &str) -> Option<UriParams> {
        match self {
            Self::Exact(expected) => (expected == uri).then(UriParams::new),
            Self::Template { segments, .. } => {
                let parts: Vec<&str> = uri.split('/').collect();
                if parts.len() != segments.len() {
                    return None;
                }

                let mut params = UriParams::new();
                for (segment, part) in segments.iter().zip(parts) {
                    match segment {
                        Segment::Literal(lit) if lit == part => {}
                        Segment::Literal(_) => return None,
                        Segment::Param(_) if part.is_empty() => return None,
                        Segment::Param(name) => {
                            params.insert(name.clone(), part.to_string());
                        }
                    }
                }
                Some(params)
            }
        }
    }
}

/// One entry of a `resources/read` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

impl ResourceContents {
    pub fn json<T: Serialize + ?Sized>(uri: &str, payload: &T) -> Result<Self> {
        Ok(Self {
            uri: uri.to_string(),
            mime_type: "application/json".to_string(),
            text: serde_json::to_string_pretty(payload)?,
        })
    }
}

#[async_trait]
pub trait Resource: Send + Sync {
    fn matcher(&self) -> &UriMatcher;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn mime_type(&self) -> &str {
        "application/json"
    }

    /// Whether the default site is selected when the URI names none.
    fn requires_site(&self) -> bool {
        false
    }

    async fn read(
        &self,
        ctx: &ToolContext<'_>,
        uri: &str,
        params: &UriParams,
    ) -> Result<ResourceContents>;
}

/// `resources/list` entry.
pub fn describe(resource: &dyn Resource) -> Value {
    json!({
        "uri": resource.matcher().as_str(),
        "name": resource.name(),
        "description": resource.description(),
        "mimeType": resource.mime_type(),
    })
}

/// `resources/templates/list` entry.
pub fn describe_template(resource: &dyn Resource) -> Value {
    json!({
        "uriTemplate": resource.matcher().as_str(),
        "name": resource.name(),
        "description": resource.description(),
        "mimeType": resource.mime_type(),
    })
}
