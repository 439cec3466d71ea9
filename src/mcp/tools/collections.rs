use super::{site_schema, Tool, ToolContext, ToolResult};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Fields never returned by `user_list`.
const SECRET_FIELDS: [&str; 3] = ["password", "password_hash", "api_token"];

pub struct MenuListTool;

#[async_trait]
impl Tool for MenuListTool {
    fn name(&self) -> &str {
        "menu_list"
    }

    fn description(&self) -> &str {
        "List the navigation menus of a site"
    }

    fn input_schema(&self) -> Value {
        site_schema(json!({}), &[])
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _args: &Map<String, Value>) -> Result<ToolResult> {
        ToolResult::json(&ctx.store()?.list("menus").await?)
    }
}

pub struct TemplateListTool;

#[async_trait]
impl Tool for TemplateListTool {
    fn name(&self) -> &str {
        "template_list"
    }

    fn description(&self) -> &str {
        "List the page templates available on a site"
    }

    fn input_schema(&self) -> Value {
        site_schema(json!({}), &[])
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _args: &Map<String, Value>) -> Result<ToolResult> {
        ToolResult::json(&ctx.store()?.list("templates").await?)
    }
}

pub struct UserListTool;

#[async_trait]
impl Tool for UserListTool {
    fn name(&self) -> &str {
        "user_list"
    }

    fn description(&self) -> &str {
        "List the users of a site without credentials"
    }

    fn input_schema(&self) -> Value {
        site_schema(json!({}), &[])
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _args: &Map<String, Value>) -> Result<ToolResult> {
        let users: Vec<_> = ctx
            .store()?
            .list("users")
            .await?
            .into_iter()
            .map(|mut user| {
                for secret in SECRET_FIELDS {
                    user.remove(secret);
                }
                user
            })
            .collect();

        ToolResult::json(&users)
    }
}
