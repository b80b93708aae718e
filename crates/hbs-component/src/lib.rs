/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Handlebars component helper.
//!
//! This crate lets templates include reusable, self-describing template
//! fragments ("components"):
//!
//! ```text
//! {{#component "atoms/button" color="teal" classes="['a', 'b']"}}
//!   Click me
//! {{/component}}
//! ```
//!
//! A component lives in its own directory: `atoms/button/button.hbs`, an
//! optional `pattern.json` schema describing its arguments and optional data
//! files under `_data/`. An invocation
//!
//! - resolves the component reference to its template file ([`path`])
//! - builds the render data from a data file, the inline arguments (which
//!   may be lenient JSON literals) and the rendered block body ([`data`],
//!   [`attribute`])
//! - optionally validates the render data against the component schema,
//!   filling in defaults ([`schema`])
//! - renders the template ([`component`], [`helper`])
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hbs_component::{ComponentConfig, ComponentRenderer, register_component_helper};
//!
//! let config = ComponentConfig::new("/srv/site/components").with_use_schema(true);
//! let renderer = Arc::new(ComponentRenderer::new(config));
//!
//! let mut registry = handlebars::Handlebars::new();
//! register_component_helper(&mut registry, renderer);
//! let html = registry.render_template(r#"{{component "atoms/button" color="teal"}}"#, &())?;
//! ```

pub mod attribute;
pub mod component;
pub mod config;
pub mod data;
pub mod error;
pub mod helper;
pub mod literal;
pub mod loader;
pub mod path;
pub mod schema;

pub use component::{
    ComponentInvocation, ComponentRenderer, ComponentRendererBuilder, InvocationArguments,
    SafeString, TemplateEngine,
};
pub use config::{ComponentConfig, ConfigError, SchemaPolicy};
pub use data::RenderData;
pub use error::{ComponentError, ComponentResult};
pub use helper::{ComponentHelper, register_component_helper};
pub use loader::{FileSystemLoader, MemoryLoader, SourceLoader};
pub use path::{PackageDirLocator, PackageLocator, StaticPackageLocator};
