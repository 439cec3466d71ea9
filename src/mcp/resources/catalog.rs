use super::{Resource, ResourceContents, UriMatcher, UriParams};
use crate::mcp::tools::{system, ToolContext};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;

pub struct ServerInfoResource {
    matcher: UriMatcher,
}

impl Default for ServerInfoResource {
    fn default() -> Self {
        Self {
            matcher: UriMatcher::exact("cms://server/info"),
        }
    }
}

#[async_trait]
impl Resource for ServerInfoResource {
    fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    fn name(&self) -> &str {
        "Server Info"
    }

    fn description(&self) -> &str {
        "Name and version of this server"
    }

    fn mime_type(&self) -> &str {
        "text/plain"
    }

    async fn read(&self, ctx: &ToolContext<'_>, uri: &str, _params: &UriParams) -> Result<ResourceContents> {
        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: self.mime_type().to_string(),
            text: format!(
                "{} v{} (rust {})",
                ctx.server.name,
                ctx.server.version,
                system::rust_version()
            ),
        })
    }
}

pub struct SiteListResource {
    matcher: UriMatcher,
}

impl Default for SiteListResource {
    fn default() -> Self {
        Self {
            matcher: UriMatcher::exact("cms://sites/list"),
        }
    }
}

#[async_trait]
impl Resource for SiteListResource {
    fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    fn name(&self) -> &str {
        "Sites"
    }

    fn description(&self) -> &str {
        "Every site this server can switch to"
    }

    async fn read(&self, ctx: &ToolContext<'_>, uri: &str, _params: &UriParams) -> Result<ResourceContents> {
        let sites = ctx.sites.list_sites().await?;
        ResourceContents::json(uri, &sites)
    }
}

pub struct SiteInfoResource {
    matcher: UriMatcher,
}

impl Default for SiteInfoResource {
    fn default() -> Self {
        Self {
            matcher: UriMatcher::template("cms://sites/{domain}/info"),
        }
    }
}

#[async_trait]
impl Resource for SiteInfoResource {
    fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    fn name(&self) -> &str {
        "Site Info"
    }

    fn description(&self) -> &str {
        "Manifest and collection counts of one site"
    }

    fn requires_site(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ToolContext<'_>, uri: &str, _params: &UriParams) -> Result<ResourceContents> {
        let summary = system::site_summary(ctx.store()?).await?;
        ResourceContents::json(uri, &summary)
    }
}

pub struct SitePagesResource {
    matcher: UriMatcher,
}

impl Default for SitePagesResource {
    fn default() -> Self {
        Self {
            matcher: UriMatcher::template("cms://sites/{domain}/pages"),
        }
    }
}

#[async_trait]
impl Resource for SitePagesResource {
    fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    fn name(&self) -> &str {
        "Site Pages"
    }

    fn description(&self) -> &str {
        "All pages of one site"
    }

    fn requires_site(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ToolContext<'_>, uri: &str, _params: &UriParams) -> Result<ResourceContents> {
        let pages = ctx.store()?.list("pages").await?;
        ResourceContents::json(uri, &pages)
    }
}

pub struct SitePageResource {
    matcher: UriMatcher,
}

impl Default for SitePageResource {
    fn default() -> Self {
        Self {
            matcher: UriMatcher::template("cms://sites/{domain}/pages/{id}"),
        }
    }
}

#[async_trait]
impl Resource for SitePageResource {
    fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    fn name(&self) -> &str {
        "Page"
    }

    fn description(&self) -> &str {
        "One page of one site"
    }

    fn requires_site(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ToolContext<'_>, uri: &str, params: &UriParams) -> Result<ResourceContents> {
        let id = params
            .get("id")
            .ok_or_else(|| Error::Internal("Template is missing the id segment".to_string()))?;
        let page = ctx
            .store()?
            .get("pages", id)
            .await?
            .ok_or_else(|| Error::ResourceNotFound(uri.to_string()))?;
        ResourceContents::json(uri, &Value::Object(page))
    }
}
