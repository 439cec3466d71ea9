//! Templated instructions handed to the agent by `prompts/get`.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

pub trait Prompt: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn arguments(&self) -> &[PromptArgument];

    /// Produces the user message. Required arguments are already checked.
    fn render(&self, args: &Map<String, Value>) -> Result<String>;
}

/// `prompts/list` entry.
pub fn describe(prompt: &dyn Prompt) -> Value {
    json!({
        "name": prompt.name(),
        "description": prompt.description(),
        "arguments": prompt.arguments(),
    })
}

/// Argument that names the target site. Left empty, it is filled with the
/// server's default site before rendering.
pub const SITE_ARGUMENT: &str = "site";

/// Checks required arguments, renders, and wraps the text as `prompts/get` expects.
pub fn get(prompt: &dyn Prompt, args: &Map<String, Value>, default_site: &str) -> Result<Value> {
    for arg in prompt.arguments().iter().filter(|a| a.required) {
        let present = match args.get(&arg.name) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if !present {
            return Err(Error::InvalidParams(format!(
                "Missing required argument: {}",
                arg.name
            )));
        }
    }

    let takes_site = prompt.arguments().iter().any(|a| a.name == SITE_ARGUMENT);
    let site_given = matches!(args.get(SITE_ARGUMENT), Some(Value::String(s)) if !s.trim().is_empty());
    let text = if takes_site && !site_given {
        let mut args = args.clone();
        args.insert(SITE_ARGUMENT.to_string(), json!(default_site));
        prompt.render(&args)?
    } else {
        prompt.render(args)?
    };
    Ok(json!({
        "description": prompt.description(),
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": text }
        }]
    }))
}

/// A prompt whose body is a template with `{{name}}` placeholders.
pub struct TemplatePrompt {
    name: String,
    description: String,
    template: String,
    arguments: Vec<PromptArgument>,
    defaults: Map<String, Value>,
}

impl TemplatePrompt {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            template: template.into(),
            arguments: Vec::new(),
            defaults: Map::new(),
        }
    }

    pub fn required(mut self, name: &str, description: &str) -> Self {
        self.arguments.push(PromptArgument {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, description: &str, default: &str) -> Self {
        self.arguments.push(PromptArgument {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
        });
        self.defaults.insert(name.to_string(), json!(default));
        self
    }

    /// Optional target site, defaulting to the server's default site.
    pub fn site_argument(mut self, description: &str) -> Self {
        self.arguments.push(PromptArgument {
            name: SITE_ARGUMENT.to_string(),
            description: description.to_string(),
            required: false,
        });
        self
    }
}

impl Prompt for TemplatePrompt {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn arguments(&self) -> &[PromptArgument] {
        &self.arguments
    }

    fn render(&self, args: &Map<String, Value>) -> Result<String> {
        let mut text = self.template.clone();
        for arg in &self.arguments {
            let value = match args.get(&arg.name).or_else(|| self.defaults.get(&arg.name)) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            text = text.replace(&format!("{{{{{}}}}}", arg.name), &value);
        }
        Ok(text)
    }
}

pub fn write_page() -> TemplatePrompt {
    TemplatePrompt::new(
        "write_page",
        "Draft a new page and save it with page_create",
        "Write a new page about {{topic}} in a {{tone}} tone. \
         Check page_list first so the slug does not collide with an existing page, \
         then save the draft with page_create (status \"draft\") on site {{site}}.",
    )
    .required("topic", "What the page is about")
    .optional("tone", "Writing tone", "friendly")
    .site_argument("Target site domain")
}

pub fn seo_review() -> TemplatePrompt {
    TemplatePrompt::new(
        "seo_review",
        "Review one page for search engine friendliness",
        "Load page {{page_id}} from site {{site}} with page_get. Review its title, slug \
         and content for search engine friendliness: title length, a descriptive slug, \
         headings, and internal links. List concrete fixes, then apply the ones the user \
         approves with page_update.",
    )
    .required("page_id", "Id of the page to review")
    .site_argument("Site domain")
}

pub fn site_audit() -> TemplatePrompt {
    TemplatePrompt::new(
        "site_audit",
        "Audit the content of a whole site",
        "Audit site {{site}}. Start with site_info, then walk page_list and menu_list. \
         Report draft pages that are linked from menus, published pages with empty \
         content, and duplicate titles.",
    )
    .site_argument("Site domain")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_fills_defaults() {
        let prompt = write_page();
        let result = get(&prompt, &args(json!({"topic": "rust"})), "default").unwrap();

        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("about rust in a friendly tone"));
        assert!(text.contains("on site default."));
        assert!(!text.contains("{{"));
        assert_eq!(result["messages"][0]["role"], "user");
    }

    #[test]
    fn test_missing_required_argument() {
        let prompt = seo_review();
        let err = get(&prompt, &Map::new(), "default").unwrap_err();
        assert!(matches!(err, Error::InvalidParams(ref m) if m.contains("page_id")));
        assert_eq!(err.error_code(), -32602);
    }

    #[test]
    fn test_site_falls_back_to_configured_default() {
        let prompt = site_audit();
        let text_of = |result: Value| {
            result["messages"][0]["content"]["text"]
                .as_str()
                .unwrap()
                .to_string()
        };

        let text = text_of(get(&prompt, &Map::new(), "shop.test").unwrap());
        assert!(text.starts_with("Audit site shop.test."));

        let text = text_of(get(&prompt, &args(json!({"site": "blog.test"})), "shop.test").unwrap());
        assert!(text.starts_with("Audit site blog.test."));

        let text = text_of(get(&prompt, &args(json!({"site": " "})), "shop.test").unwrap());
        assert!(text.starts_with("Audit site shop.test."));
    }

    #[test]
    fn test_describe_lists_arguments() {
        let prompt = write_page();
        let value = describe(&prompt);
        assert_eq!(value["name"], "write_page");
        assert_eq!(value["arguments"][0]["name"], "topic");
        assert_eq!(value["arguments"][0]["required"], true);
        assert_eq!(value["arguments"][1]["required"], false);
    }

    #[test]
    fn test_non_string_argument_is_rendered() {
        let prompt = TemplatePrompt::new("n", "d", "count={{count}}").required("count", "c");
        let text = prompt.render(&args(json!({"count": 3}))).unwrap();
        assert_eq!(text, "count=3");
    }
}
