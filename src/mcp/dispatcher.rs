//! Routes decoded requests to handlers and shapes their responses.

use super::prompts;
use super::protocol::{JsonRpcRequest, JsonRpcResponse, ServerInfo, MCP_PROTOCOL_VERSION};
use super::registry::Registry;
use super::resources::{self, Resource, UriParams};
use super::tools::{self, Tool, ToolContext, ToolResult};
use crate::site::{SiteContext, SiteContextManager};
use crate::{Error, Result};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourceTemplatesList,
    ResourcesRead,
    PromptsList,
    PromptsGet,
}

fn method_table() -> HashMap<&'static str, Method> {
    HashMap::from([
        ("initialize", Method::Initialize),
        ("initialized", Method::Initialized),
        ("notifications/initialized", Method::Initialized),
        ("ping", Method::Ping),
        ("tools/list", Method::ToolsList),
        ("tools/call", Method::ToolsCall),
        ("resources/list", Method::ResourcesList),
        ("resources/templates/list", Method::ResourceTemplatesList),
        ("resources/read", Method::ResourcesRead),
        ("prompts/list", Method::PromptsList),
        ("prompts/get", Method::PromptsGet),
    ])
}

/// Stateless router shared by every transport.
///
/// The only mutable state a request can touch is the active site, which
/// lives in the [`SiteContextManager`] and is locked for the whole
/// switch-then-execute step of a `tools/call` or `resources/read`.
pub struct Dispatcher {
    registry: Arc<Registry>,
    sites: Arc<SiteContextManager>,
    server: ServerInfo,
    methods: HashMap<&'static str, Method>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, sites: Arc<SiteContextManager>) -> Self {
        Self {
            registry,
            sites,
            server: ServerInfo::current(),
            methods: method_table(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sites(&self) -> &Arc<SiteContextManager> {
        &self.sites
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    /// Handles one request. Returns `None` for notifications, whatever the outcome.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Dispatching {} (id {:?})", request.method, request.id);

        let outcome = match self.methods.get(request.method.as_str()) {
            Some(&method) => self.handle(method, &request.params).await,
            None => Err(Error::MethodNotFound(request.method.clone())),
        };

        let Some(id) = request.id else {
            if let Err(e) = outcome {
                debug!("Ignoring error from notification {}: {}", request.method, e);
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("Request {} ({}) failed: {}", id, request.method, e);
                JsonRpcResponse::from_error(id, &e)
            }
        })
    }

    async fn handle(&self, method: Method, params: &Map<String, Value>) -> Result<Value> {
        match method {
            Method::Initialize => Ok(self.initialize()),
            Method::Initialized => Ok(json!({})),
            Method::Ping => Ok(json!("pong")),
            Method::ToolsList => Ok(self.tools_list()),
            Method::ToolsCall => self.tools_call(params).await,
            Method::ResourcesList => Ok(self.resources_list()),
            Method::ResourceTemplatesList => Ok(self.resource_templates_list()),
            Method::ResourcesRead => self.resources_read(params).await,
            Method::PromptsList => Ok(self.prompts_list()),
            Method::PromptsGet => self.prompts_get(params),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false },
                "prompts": { "listChanged": false },
            },
            "serverInfo": self.server,
        })
    }

    fn tools_list(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .tools()
            .map(|t| tools::describe(t.as_ref()))
            .collect();
        json!({ "tools": tools })
    }

    fn resources_list(&self) -> Value {
        let resources: Vec<Value> = self
            .registry
            .resources()
            .map(|r| resources::describe(r.as_ref()))
            .collect();
        json!({ "resources": resources })
    }

    fn resource_templates_list(&self) -> Value {
        let templates: Vec<Value> = self
            .registry
            .resources()
            .filter(|r| r.matcher().is_template())
            .map(|r| resources::describe_template(r.as_ref()))
            .collect();
        json!({ "resourceTemplates": templates })
    }

    fn prompts_list(&self) -> Value {
        let prompts: Vec<Value> = self
            .registry
            .prompts()
            .map(|p| prompts::describe(p.as_ref()))
            .collect();
        json!({ "prompts": prompts })
    }

    async fn tools_call(&self, params: &Map<String, Value>) -> Result<Value> {
        let name = tools::required_str(params, "name")?;
        let empty = Map::new();
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(args)) => args,
            Some(_) => {
                return Err(Error::InvalidParams(
                    "Argument 'arguments' must be an object".to_string(),
                ))
            }
        };

        // Resolve the tool before touching the site so an unknown name never switches.
        let tool = self
            .registry
            .tool(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        let domain = match tools::optional_str(arguments, "site")? {
            Some(site) => Some(site),
            None if tool.requires_site() => Some(self.sites.default_site()),
            None => None,
        };

        debug!("Calling tool {} on site {:?}", name, domain);
        let result = self.run_tool(tool.as_ref(), domain, arguments).await?;
        Ok(serde_json::to_value(result)?)
    }

    async fn run_tool(
        &self,
        tool: &dyn Tool,
        domain: Option<&str>,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResult> {
        match domain {
            Some(domain) => {
                let active = self.sites.enter(Some(domain)).await?;
                let ctx = self.context(active.context());
                tool.execute(&ctx, arguments).await
            }
            None => tool.execute(&self.context(None), arguments).await,
        }
    }

    async fn resources_read(&self, params: &Map<String, Value>) -> Result<Value> {
        let uri = tools::required_str(params, "uri")?;
        let (resource, captured) = self
            .registry
            .match_resource(uri)
            .ok_or_else(|| Error::ResourceNotFound(uri.to_string()))?;

        let domain = match captured.get("domain") {
            Some(domain) => Some(domain.as_str()),
            None if resource.requires_site() => Some(self.sites.default_site()),
            None => None,
        };

        debug!("Reading resource {} on site {:?}", uri, domain);
        let contents = self
            .read_resource(resource.as_ref(), domain, uri, &captured)
            .await?;
        Ok(json!({ "contents": [contents] }))
    }

    async fn read_resource(
        &self,
        resource: &dyn Resource,
        domain: Option<&str>,
        uri: &str,
        captured: &UriParams,
    ) -> Result<resources::ResourceContents> {
        match domain {
            Some(domain) => {
                let active = self.sites.enter(Some(domain)).await?;
                let ctx = self.context(active.context());
                resource.read(&ctx, uri, captured).await
            }
            None => resource.read(&self.context(None), uri, captured).await,
        }
    }

    fn prompts_get(&self, params: &Map<String, Value>) -> Result<Value> {
        let name = tools::required_str(params, "name")?;
        let prompt = self
            .registry
            .prompt(name)
            .ok_or_else(|| Error::PromptNotFound(name.to_string()))?;

        let empty = Map::new();
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(args)) => args,
            Some(_) => {
                return Err(Error::InvalidParams(
                    "Argument 'arguments' must be an object".to_string(),
                ))
            }
        };
        prompts::get(prompt.as_ref(), arguments, self.sites.default_site())
    }

    fn context<'a>(&'a self, site: Option<&'a SiteContext>) -> ToolContext<'a> {
        ToolContext {
            site,
            sites: self.sites.directory(),
            server: &self.server,
        }
    }
}
