use super::{site_schema, Tool, ToolContext, ToolResult};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const SITE_COLLECTIONS: [&str; 4] = ["pages", "menus", "templates", "users"];

pub(crate) fn rust_version() -> &'static str {
    option_env!("CARGO_PKG_RUST_VERSION")
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
}

pub struct SystemInfoTool;

#[async_trait]
impl Tool for SystemInfoTool {
    fn name(&self) -> &str {
        "system_info"
    }

    fn description(&self) -> &str {
        "Report the server name, version and runtime"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn requires_site(&self) -> bool {
        false
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _args: &Map<String, Value>) -> Result<ToolResult> {
        Ok(ToolResult::text(format!(
            "{} v{} (rust {})",
            ctx.server.name,
            ctx.server.version,
            rust_version()
        )))
    }
}

pub struct SiteListTool;

#[async_trait]
impl Tool for SiteListTool {
    fn name(&self) -> &str {
        "site_list"
    }

    fn description(&self) -> &str {
        "List every site this server can switch to"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn requires_site(&self) -> bool {
        false
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _args: &Map<String, Value>) -> Result<ToolResult> {
        let sites = ctx.sites.list_sites().await?;
        ToolResult::json(&sites)
    }
}

pub struct SiteInfoTool;

#[async_trait]
impl Tool for SiteInfoTool {
    fn name(&self) -> &str {
        "site_info"
    }

    fn description(&self) -> &str {
        "Show the manifest of a site and how many records each collection holds"
    }

    fn input_schema(&self) -> Value {
        site_schema(json!({}), &[])
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _args: &Map<String, Value>) -> Result<ToolResult> {
        let store = ctx.store()?;
        ToolResult::json(&site_summary(store).await?)
    }
}

/// Manifest plus per-collection counts; shared with the site info resource.
pub(crate) async fn site_summary(store: &dyn crate::site::SiteStore) -> Result<Value> {
    let mut counts = Map::new();
    for collection in SITE_COLLECTIONS {
        let count = store.list(collection).await?.len();
        counts.insert(collection.to_string(), json!(count));
    }

    Ok(json!({
        "domain": store.domain(),
        "manifest": store.manifest().await?,
        "collections": counts,
    }))
}
