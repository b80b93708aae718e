/*
 * helper.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Handlebars integration.
//!
//! Registers a [`ComponentRenderer`] as the `component` helper:
//!
//! ```text
//! {{component "atoms/button" color="teal"}}
//! {{#component "atoms/button" fullWidth=true}}Click me{{/component}}
//! ```
//!
//! Component templates render through the same registry, so they may use
//! `{{component}}` themselves.

use std::sync::Arc;

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason, Renderable,
};
use serde_json::Value;

use crate::component::{ComponentRenderer, InvocationArguments, TemplateEngine};
use crate::error::ComponentError;

/// Name the helper is registered under.
pub const HELPER_NAME: &str = "component";

impl TemplateEngine for Handlebars<'_> {
    fn render_template(&self, source: &str, data: &Value) -> Result<String, String> {
        Handlebars::render_template(self, source, data).map_err(|e| e.to_string())
    }
}

/// The `component` Handlebars helper.
#[derive(Debug, Clone)]
pub struct ComponentHelper {
    renderer: Arc<ComponentRenderer>,
}

impl ComponentHelper {
    pub fn new(renderer: Arc<ComponentRenderer>) -> Self {
        Self { renderer }
    }
}

impl HelperDef for ComponentHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(component_name) = h.param(0).and_then(|p| p.value().as_str()) else {
            return Err(helper_error(ComponentError::usage(
                "componentName is required: e.g. {{component \"base/atoms/button\"}}",
            )));
        };
        if h.params().len() != 1 {
            return Err(helper_error(ComponentError::usage(
                "syntax error please use {{component \"base/atoms/button\" setting=\"value\"}}",
            )));
        }

        let mut arguments = InvocationArguments::new();
        for (key, value) in h.hash() {
            arguments
                .hash
                .insert((*key).to_string(), value.value().clone());
        }
        if let Some(template) = h.template() {
            arguments.children = Some(template.renders(r, ctx, rc)?);
        }

        let output = self
            .renderer
            .render(component_name, &arguments, r)
            .map_err(helper_error)?;
        out.write(output.as_str())?;
        Ok(())
    }
}

fn helper_error(err: ComponentError) -> handlebars::RenderError {
    RenderErrorReason::Other(err.to_string()).into()
}

/// Register `renderer` as the `component` helper of `registry`.
pub fn register_component_helper(registry: &mut Handlebars<'_>, renderer: Arc<ComponentRenderer>) {
    registry.register_helper(HELPER_NAME, Box::new(ComponentHelper::new(renderer)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::SafeString;
    use crate::config::ComponentConfig;
    use crate::loader::MemoryLoader;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry(renderer: ComponentRenderer) -> Handlebars<'static> {
        let mut registry = Handlebars::new();
        register_component_helper(&mut registry, Arc::new(renderer));
        registry
    }

    fn loader() -> MemoryLoader {
        MemoryLoader::with_files([
            ("/c/badge/badge.hbs", "<span class=\"{{tone}}\">{{label}}</span>"),
            ("/c/card/card.hbs", "<div>{{{children}}}</div>"),
            ("/c/list/list.hbs", "{{#each items}}[{{this}}]{{/each}}"),
            ("/c/outer/outer.hbs", "<b>{{component \"badge\" label=label}}</b>"),
        ])
    }

    fn render(template: &str, data: Value) -> Result<String, handlebars::RenderError> {
        let renderer = ComponentRenderer::builder(ComponentConfig::new("/c"))
            .loader(loader())
            .build();
        registry(renderer).render_template(template, &data)
    }

    #[test]
    fn test_inline_component() {
        let output = render(r#"{{component "badge" tone="ok" label=name}}"#, json!({"name": "Hi"}));
        assert_eq!(output.unwrap(), r#"<span class="ok">Hi</span>"#);
    }

    #[test]
    fn test_block_component_receives_rendered_children() {
        let output = render(
            r#"{{#component "card"}}<i>{{name}}</i>{{/component}}"#,
            json!({"name": "Ann"}),
        );
        assert_eq!(output.unwrap(), "<div><i>Ann</i></div>");
    }

    #[test]
    fn test_literal_argument() {
        let output = render(r#"{{component "list" items="['a', 'b']"}}"#, json!({}));
        assert_eq!(output.unwrap(), "[a][b]");
    }

    #[test]
    fn test_nested_components() {
        let output = render(r#"{{component "outer" label="x"}}"#, json!({}));
        assert_eq!(output.unwrap(), r#"<b><span class="">x</span></b>"#);
    }

    #[test]
    fn test_missing_name_parameter() {
        let err = render(r#"{{component}}"#, json!({})).unwrap_err();
        assert!(
            err.to_string()
                .contains("componentName is required: e.g. {{component \"base/atoms/button\"}}")
        );
    }

    #[test]
    fn test_extra_positional_parameter() {
        let err = render(r#"{{component "badge" "extra"}}"#, json!({})).unwrap_err();
        assert!(
            err.to_string()
                .contains("syntax error please use {{component \"base/atoms/button\" setting=\"value\"}}")
        );
    }

    #[test]
    fn test_non_string_name() {
        let err = render(r#"{{component 42}}"#, json!({})).unwrap_err();
        assert!(err.to_string().contains("componentName is required"));
    }

    #[test]
    fn test_fallback_output_is_written() {
        let renderer = ComponentRenderer::builder(ComponentConfig::new("/c"))
            .loader(loader())
            .error_handler(|_, name| Ok(SafeString::new(format!("<!-- {} -->", name))))
            .build();
        let output = registry(renderer)
            .render_template(r#"a{{component "nope"}}b"#, &json!({}))
            .unwrap();
        assert_eq!(output, "a<!-- nope -->b");
    }
}
