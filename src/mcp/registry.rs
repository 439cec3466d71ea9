//! Catalog of tools, resources and prompts.
//!
//! Built once at startup and shared read-only afterwards. Each capability
//! class is its own namespace; listing preserves registration order and
//! lookup by name is a hash probe.

use super::prompts::{self, Prompt};
use super::resources::{self, Resource, UriParams};
use super::tools::{self, Tool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

struct Catalog<T: ?Sized> {
    kind: &'static str,
    entries: Vec<Arc<T>>,
    index: HashMap<String, usize>,
}

impl<T: ?Sized> Catalog<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Last registration for a name wins, keeping the original position.
    fn insert(&mut self, key: String, entry: Arc<T>) {
        match self.index.get(&key) {
            Some(&slot) => {
                warn!("Duplicate {} registration: {} (replacing)", self.kind, key);
                self.entries[slot] = entry;
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }
}

pub struct Registry {
    tools: Catalog<dyn Tool>,
    resources: Catalog<dyn Resource>,
    prompts: Catalog<dyn Prompt>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            tools: Catalog::new("tool"),
            resources: Catalog::new("resource"),
            prompts: Catalog::new("prompt"),
        }
    }

    /// The built-in catalog.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_tool(tools::SystemInfoTool);
        registry.register_tool(tools::SiteListTool);
        registry.register_tool(tools::SiteInfoTool);
        registry.register_tool(tools::PageListTool);
        registry.register_tool(tools::PageGetTool);
        registry.register_tool(tools::PageCreateTool);
        registry.register_tool(tools::PageUpdateTool);
        registry.register_tool(tools::PageDeleteTool);
        registry.register_tool(tools::PageSearchTool);
        registry.register_tool(tools::MenuListTool);
        registry.register_tool(tools::TemplateListTool);
        registry.register_tool(tools::UserListTool);

        registry.register_resource(resources::ServerInfoResource::default());
        registry.register_resource(resources::SiteListResource::default());
        registry.register_resource(resources::SiteInfoResource::default());
        registry.register_resource(resources::SitePagesResource::default());
        registry.register_resource(resources::SitePageResource::default());

        registry.register_prompt(prompts::write_page());
        registry.register_prompt(prompts::seo_review());
        registry.register_prompt(prompts::site_audit());

        registry
    }

    pub fn register_tool(&mut self, tool: impl Tool + 'static) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn register_resource(&mut self, resource: impl Resource + 'static) {
        let resource: Arc<dyn Resource> = Arc::new(resource);
        self.resources
            .insert(resource.matcher().as_str().to_string(), resource);
    }

    pub fn register_prompt(&mut self, prompt: impl Prompt + 'static) {
        let prompt: Arc<dyn Prompt> = Arc::new(prompt);
        self.prompts.insert(prompt.name().to_string(), prompt);
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.entries.iter()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Arc<dyn Resource>> {
        self.resources.entries.iter()
    }

    pub fn prompt(&self, name: &str) -> Option<&Arc<dyn Prompt>> {
        self.prompts.get(name)
    }

    pub fn prompts(&self) -> impl Iterator<Item = &Arc<dyn Prompt>> {
        self.prompts.entries.iter()
    }

    /// First resource, in registration order, whose matcher accepts `uri`.
    pub fn match_resource(&self, uri: &str) -> Option<(&Arc<dyn Resource>, UriParams)> {
        self.resources
            .entries
            .iter()
            .find_map(|r| r.matcher().matches(uri).map(|params| (r, params)))
    }
}
