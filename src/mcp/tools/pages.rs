//! Page tools. Pages live in the `pages` collection with the fields
//! `id`, `title`, `slug`, `content`, `status`.

use super::{optional_str, required_str, site_schema, Tool, ToolContext, ToolResult};
use crate::site::{Record, SiteStore};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const PAGES: &str = "pages";
const STATUSES: [&str; 3] = ["draft", "published", "archived"];

fn check_status(status: &str) -> Result<()> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(Error::InvalidParams(format!(
            "Unknown status '{}' (expected one of: {})",
            status,
            STATUSES.join(", ")
        )))
    }
}

/// Lowercase ASCII words joined by single dashes.
pub(crate) fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Rejects a slug that is empty or already used by a page other than `except_id`.
async fn check_slug(store: &dyn SiteStore, slug: &str, except_id: Option<&str>) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::InvalidParams(
            "Slug must contain at least one letter or digit".to_string(),
        ));
    }
    let taken = store
        .list(PAGES)
        .await?
        .iter()
        .any(|page| field(page, "slug") == slug && Some(field(page, "id")) != except_id);
    if taken {
        return Err(Error::InvalidParams(format!("Slug '{}' is already in use", slug)));
    }
    Ok(())
}

fn field<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

pub struct PageListTool;

#[async_trait]
impl Tool for PageListTool {
    fn name(&self) -> &str {
        "page_list"
    }

    fn description(&self) -> &str {
        "List the pages of a site, optionally filtered by status"
    }

    fn input_schema(&self) -> Value {
        site_schema(
            json!({
                "status": {
                    "type": "string",
                    "enum": STATUSES,
                    "description": "Only return pages with this status"
                }
            }),
            &[],
        )
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult> {
        let status = optional_str(args, "status")?;
        if let Some(status) = status {
            check_status(status)?;
        }

        let pages: Vec<Value> = ctx
            .store()?
            .list(PAGES)
            .await?
            .into_iter()
            .filter(|page| status.map_or(true, |s| field(page, "status") == s))
            .map(|page| {
                json!({
                    "id": field(&page, "id"),
                    "title": field(&page, "title"),
                    "slug": field(&page, "slug"),
                    "status": field(&page, "status"),
                })
            })
            .collect();

        ToolResult::json(&pages)
    }
}

pub struct PageGetTool;

#[async_trait]
impl Tool for PageGetTool {
    fn name(&self) -> &str {
        "page_get"
    }

    fn description(&self) -> &str {
        "Fetch a single page by id or slug"
    }

    fn input_schema(&self) -> Value {
        site_schema(
            json!({
                "id": { "type": "string", "description": "Page id" },
                "slug": { "type": "string", "description": "Page slug, used when id is absent" }
            }),
            &[],
        )
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult> {
        let store = ctx.store()?;
        let page = match (optional_str(args, "id")?, optional_str(args, "slug")?) {
            (Some(id), _) => store.get(PAGES, id).await?,
            (None, Some(slug)) => store
                .list(PAGES)
                .await?
                .into_iter()
                .find(|page| field(page, "slug") == slug),
            (None, None) => {
                return Err(Error::InvalidParams(
                    "Either 'id' or 'slug' is required".to_string(),
                ))
            }
        };

        match page {
            Some(page) => ToolResult::json(&page),
            None => Err(Error::tool(-32602, "Page not found")),
        }
    }
}

pub struct PageCreateTool;

#[async_trait]
impl Tool for PageCreateTool {
    fn name(&self) -> &str {
        "page_create"
    }

    fn description(&self) -> &str {
        "Create a page. The slug is derived from the title when omitted"
    }

    fn input_schema(&self) -> Value {
        site_schema(
            json!({
                "title": { "type": "string" },
                "slug": { "type": "string" },
                "content": { "type": "string" },
                "status": { "type": "string", "enum": STATUSES }
            }),
            &["title"],
        )
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult> {
        let title = required_str(args, "title")?;
        let slug = match optional_str(args, "slug")? {
            Some(slug) => slugify(slug),
            None => slugify(title),
        };
        if slug.is_empty() {
            return Err(Error::InvalidParams(
                "Could not derive a slug from the title".to_string(),
            ));
        }
        let status = optional_str(args, "status")?.unwrap_or("draft");
        check_status(status)?;

        let store = ctx.store()?;
        check_slug(store, &slug, None).await?;

        let page = json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "title": title,
            "slug": slug,
            "content": optional_str(args, "content")?.unwrap_or(""),
            "status": status,
        });
        let record = page.as_object().cloned().unwrap_or_default();
        let stored = store.put(PAGES, record).await?;

        ToolResult::json(&stored)
    }
}

pub struct PageUpdateTool;

#[async_trait]
impl Tool for PageUpdateTool {
    fn name(&self) -> &str {
        "page_update"
    }

    fn description(&self) -> &str {
        "Change the title, slug, content or status of a page"
    }

    fn input_schema(&self) -> Value {
        site_schema(
            json!({
                "id": { "type": "string" },
                "title": { "type": "string" },
                "slug": { "type": "string" },
                "content": { "type": "string" },
                "status": { "type": "string", "enum": STATUSES }
            }),
            &["id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult> {
        let id = required_str(args, "id")?;
        let store = ctx.store()?;
        let mut page = store
            .get(PAGES, id)
            .await?
            .ok_or_else(|| Error::tool(-32602, format!("Page not found: {}", id)))?;

        if let Some(status) = optional_str(args, "status")? {
            check_status(status)?;
            page.insert("status".to_string(), json!(status));
        }
        if let Some(title) = optional_str(args, "title")? {
            page.insert("title".to_string(), json!(title));
        }
        if let Some(slug) = optional_str(args, "slug")? {
            let slug = slugify(slug);
            check_slug(store, &slug, Some(id)).await?;
            page.insert("slug".to_string(), json!(slug));
        }
        if let Some(content) = optional_str(args, "content")? {
            page.insert("content".to_string(), json!(content));
        }

        let stored = store.put(PAGES, page).await?;
        ToolResult::json(&stored)
    }
}

pub struct PageDeleteTool;

#[async_trait]
impl Tool for PageDeleteTool {
    fn name(&self) -> &str {
        "page_delete"
    }

    fn description(&self) -> &str {
        "Delete a page by id"
    }

    fn input_schema(&self) -> Value {
        site_schema(json!({ "id": { "type": "string" } }), &["id"])
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult> {
        let id = required_str(args, "id")?;
        if !ctx.store()?.delete(PAGES, id).await? {
            return Err(Error::tool(-32602, format!("Page not found: {}", id)));
        }
        Ok(ToolResult::text(format!("Deleted page {}", id)))
    }
}

pub struct PageSearchTool;

#[async_trait]
impl Tool for PageSearchTool {
    fn name(&self) -> &str {
        "page_search"
    }

    fn description(&self) -> &str {
        "Case-insensitive search over page titles and content"
    }

    fn input_schema(&self) -> Value {
        site_schema(json!({ "query": { "type": "string" } }), &["query"])
    }

    async fn execute(&self, ctx: &ToolContext<'_>, args: &Map<String, Value>) -> Result<ToolResult> {
        let query = required_str(args, "query")?.to_lowercase();

        let hits: Vec<Value> = ctx
            .store()?
            .list(PAGES)
            .await?
            .into_iter()
            .filter(|page| {
                field(page, "title").to_lowercase().contains(&query)
                    || field(page, "content").to_lowercase().contains(&query)
            })
            .map(|page| {
                json!({
                    "id": field(&page, "id"),
                    "title": field(&page, "title"),
                    "slug": field(&page, "slug"),
                })
            })
            .collect();

        ToolResult::json(&hits)
    }
}
