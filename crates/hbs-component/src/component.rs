/*
 * component.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The component rendering pipeline.
//!
//! [`ComponentRenderer`] sequences one invocation:
//!
//! 1. resolve the component reference to a template file
//! 2. load the component schema (when schemas are enabled) and pass it
//!    through the pre-validate hook
//! 3. assemble the render data and pass it through the pre-render hook
//! 4. validate the render data (when schemas are enabled)
//! 5. read the template and render it through a [`TemplateEngine`]
//!
//! Any failure is routed through a single error handler, which decides
//! whether the call fails or yields a fallback.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::ComponentConfig;
use crate::data::{RenderData, assemble_render_data};
use crate::error::{ComponentError, ComponentResult};
use crate::loader::{FileSystemLoader, SourceLoader};
use crate::path::{PackageDirLocator, PackageLocator, resolve_template_path};
use crate::schema::{load_schema, validate_render_data};

/// Trait for the engine that renders a template source with data.
pub trait TemplateEngine {
    /// Render `source` with `data`, returning the output or an error message.
    fn render_template(&self, source: &str, data: &Value) -> Result<String, String>;
}

/// Rendered component output.
///
/// The content is already escaped by the template engine and must be
/// embedded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeString(String);

impl SafeString {
    /// Wrap already-safe output.
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    /// The output as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SafeString {
    fn from(content: String) -> Self {
        Self(content)
    }
}

/// Everything a component invocation supplies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationArguments {
    /// Keyed arguments, e.g. `color="teal" fullWidth=true`.
    pub hash: BTreeMap<String, Value>,
    /// The rendered block body of `{{#component}}…{{/component}}`.
    pub children: Option<String>,
    /// The template file containing the invocation, for error attribution.
    pub source_file: Option<PathBuf>,
}

impl InvocationArguments {
    /// Create empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyed argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hash.insert(key.into(), value.into());
        self
    }

    /// Set the rendered block body.
    pub fn children(mut self, children: impl Into<String>) -> Self {
        self.children = Some(children.into());
        self
    }

    /// Set the template file containing the invocation.
    pub fn source_file(mut self, source_file: impl Into<PathBuf>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }
}

/// The state of one invocation, handed to the hooks.
#[derive(Debug)]
pub struct ComponentInvocation<'a> {
    /// The component reference as written.
    pub component_name: &'a str,
    /// The resolved template file.
    pub template_file: PathBuf,
    /// The directory containing the template file.
    pub template_directory: PathBuf,
    /// The invocation's arguments.
    pub arguments: &'a InvocationArguments,
    /// The renderer configuration.
    pub config: &'a ComponentConfig,
}

/// Hook that may rewrite the render data before validation.
pub type PreRenderHandler =
    Box<dyn Fn(RenderData, &ComponentInvocation<'_>) -> RenderData + Send + Sync>;

/// Hook that may rewrite (or supply) the schema before validation.
pub type PreValidateHandler =
    Box<dyn Fn(Option<Value>, &ComponentInvocation<'_>) -> Option<Value> + Send + Sync>;

/// Decides the outcome of a failed invocation: propagate the error or
/// return a fallback.
pub type ErrorHandler =
    Box<dyn Fn(ComponentError, &str) -> ComponentResult<SafeString> + Send + Sync>;

/// Notified of every failure before the error handler runs.
pub type ErrorObserver = Box<dyn Fn(&ComponentError) + Send + Sync>;

/// Resolves, validates and renders components.
///
/// Immutable once built; share it between threads and Handlebars registries
/// through an `Arc`.
pub struct ComponentRenderer {
    config: ComponentConfig,
    loader: Box<dyn SourceLoader>,
    package_locator: Box<dyn PackageLocator>,
    pre_render_handler: PreRenderHandler,
    pre_validate_handler: PreValidateHandler,
    error_handler: ErrorHandler,
    error_observer: Option<ErrorObserver>,
}

impl fmt::Debug for ComponentRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRenderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ComponentRenderer {
    /// Create a renderer with default collaborators and hooks.
    pub fn new(config: ComponentConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a renderer.
    pub fn builder(config: ComponentConfig) -> ComponentRendererBuilder {
        ComponentRendererBuilder::new(config)
    }

    /// The renderer configuration.
    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Resolve a component reference to its template file.
    pub fn resolve(&self, component_name: &str) -> ComponentResult<PathBuf> {
        resolve_template_path(
            component_name,
            &self.config.root_directory,
            self.package_locator.as_ref(),
            &self.config.template_extension,
        )
    }

    /// Render a component.
    ///
    /// Failures are attributed to the invocation's source file (when known),
    /// reported to the error observer and then handed to the error handler,
    /// whose result is returned.
    pub fn render(
        &self,
        component_name: &str,
        arguments: &InvocationArguments,
        engine: &dyn TemplateEngine,
    ) -> ComponentResult<SafeString> {
        let err = match self.render_component(component_name, arguments, engine) {
            Ok(output) => return Ok(output),
            Err(err) => err,
        };
        let err = match &arguments.source_file {
            Some(source_file) => err.in_source(source_file.clone()),
            None => err,
        };
        tracing::warn!(component = component_name, error = %err, "Component failed to render");
        if let Some(observer) = &self.error_observer {
            observer(&err);
        }
        (self.error_handler)(err, component_name)
    }

    fn render_component(
        &self,
        component_name: &str,
        arguments: &InvocationArguments,
        engine: &dyn TemplateEngine,
    ) -> ComponentResult<SafeString> {
        if component_name.is_empty() {
            return Err(ComponentError::usage(
                "componentName is required: e.g. {{component \"base/atoms/button\"}}",
            ));
        }

        let template_file = self.resolve(component_name)?;
        let template_directory = template_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(component = component_name, template = %template_file.display(), "Resolved component");

        let invocation = ComponentInvocation {
            component_name,
            template_file,
            template_directory,
            arguments,
            config: &self.config,
        };

        let policy = self.config.schema_policy();
        let base_schema = if policy.is_enabled() {
            load_schema(
                &invocation.template_directory,
                &self.config.schema_name,
                policy,
                self.loader.as_ref(),
            )?
        } else {
            None
        };
        let schema = (self.pre_validate_handler)(base_schema, &invocation);

        let base_data = assemble_render_data(
            component_name,
            &invocation.template_directory,
            &arguments.hash,
            arguments.children.as_deref(),
            &self.config,
            self.loader.as_ref(),
        )?;
        let mut render_data = (self.pre_render_handler)(base_data, &invocation);

        if policy.is_enabled() {
            validate_render_data(component_name, &mut render_data, schema.as_ref())?;
        }

        let source = self
            .loader
            .read_to_string(&invocation.template_file)
            .map_err(|source| ComponentError::TemplateRead {
                path: invocation.template_file.clone(),
                source,
            })?;
        let output = engine
            .render_template(&source, &Value::Object(render_data))
            .map_err(|message| ComponentError::Render {
                component: component_name.to_string(),
                message,
            })?;
        Ok(SafeString::from(output))
    }
}

/// Builder for [`ComponentRenderer`].
pub struct ComponentRendererBuilder {
    config: ComponentConfig,
    loader: Option<Box<dyn SourceLoader>>,
    package_locator: Option<Box<dyn PackageLocator>>,
    pre_render_handler: Option<PreRenderHandler>,
    pre_validate_handler: Option<PreValidateHandler>,
    error_handler: Option<ErrorHandler>,
    error_observer: Option<ErrorObserver>,
}

impl ComponentRendererBuilder {
    /// Create a builder with default collaborators and hooks.
    pub fn new(config: ComponentConfig) -> Self {
        Self {
            config,
            loader: None,
            package_locator: None,
            pre_render_handler: None,
            pre_validate_handler: None,
            error_handler: None,
            error_observer: None,
        }
    }

    /// Read sources through `loader` instead of the filesystem.
    pub fn loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Locate `~package` references through `locator`.
    pub fn package_locator(mut self, locator: impl PackageLocator + 'static) -> Self {
        self.package_locator = Some(Box::new(locator));
        self
    }

    /// Rewrite the render data of every invocation.
    pub fn pre_render_handler(
        mut self,
        handler: impl Fn(RenderData, &ComponentInvocation<'_>) -> RenderData + Send + Sync + 'static,
    ) -> Self {
        self.pre_render_handler = Some(Box::new(handler));
        self
    }

    /// Rewrite the schema of every invocation.
    pub fn pre_validate_handler(
        mut self,
        handler: impl Fn(Option<Value>, &ComponentInvocation<'_>) -> Option<Value>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.pre_validate_handler = Some(Box::new(handler));
        self
    }

    /// Decide the outcome of failed invocations.
    pub fn error_handler(
        mut self,
        handler: impl Fn(ComponentError, &str) -> ComponentResult<SafeString> + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Observe failed invocations.
    pub fn error_observer(
        mut self,
        observer: impl Fn(&ComponentError) + Send + Sync + 'static,
    ) -> Self {
        self.error_observer = Some(Box::new(observer));
        self
    }

    /// Build the renderer.
    pub fn build(self) -> ComponentRenderer {
        let package_directory = self.config.package_directory.clone();
        ComponentRenderer {
            config: self.config,
            loader: self.loader.unwrap_or_else(|| Box::new(FileSystemLoader)),
            package_locator: self
                .package_locator
                .unwrap_or_else(|| Box::new(PackageDirLocator::new(package_directory))),
            pre_render_handler: self
                .pre_render_handler
                .unwrap_or_else(|| Box::new(keep_render_data)),
            pre_validate_handler: self
                .pre_validate_handler
                .unwrap_or_else(|| Box::new(keep_schema)),
            error_handler: self.error_handler.unwrap_or_else(|| Box::new(propagate_error)),
            error_observer: self.error_observer,
        }
    }
}

fn keep_render_data(data: RenderData, _: &ComponentInvocation<'_>) -> RenderData {
    data
}

fn keep_schema(schema: Option<Value>, _: &ComponentInvocation<'_>) -> Option<Value> {
    schema
}

fn propagate_error(err: ComponentError, _: &str) -> ComponentResult<SafeString> {
    Err(err)
}
