use anyhow::{Context, Result};
use clap::Parser;
use handlebars::Handlebars;
use hbs_component::{
    ComponentConfig, ComponentRenderer, InvocationArguments, register_component_helper,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Render a single Handlebars component
#[derive(Parser, Debug)]
#[command(name = "render-component")]
#[command(version, about = "Render a Handlebars component to stdout", long_about = None)]
struct Args {
    /// Component reference, e.g. `atoms/button` or `~ui-kit/atoms/button`
    component: String,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Component root directory (overrides the configuration file)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Validate arguments against the component schema
    #[arg(long)]
    schema: bool,

    /// Fail when a component has no schema
    #[arg(long)]
    schema_required: bool,

    /// Schema file name inside the component directory
    #[arg(long, value_name = "NAME")]
    schema_name: Option<String>,

    /// Data file under the component's data directory
    #[arg(long, value_name = "NAME")]
    data_file: Option<String>,

    /// Component argument; values may be literals such as `[1,2]`
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    args: Vec<(String, String)>,

    /// Boolean component argument set to true
    #[arg(long = "flag", value_name = "KEY")]
    flags: Vec<String>,

    /// Block body passed to the component as `children`
    #[arg(long, value_name = "TEXT")]
    children: Option<String>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "render_component=info,hbs_component=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    tracing::debug!(root = %config.root_directory.display(), "Using component root");

    let renderer = Arc::new(ComponentRenderer::new(config));
    let mut registry = Handlebars::new();
    register_component_helper(&mut registry, Arc::clone(&renderer));

    let mut arguments = InvocationArguments::new();
    if let Some(data_file) = &args.data_file {
        let key = renderer.config().data_file_key.clone();
        arguments = arguments.arg(key, data_file.as_str());
    }
    for (key, value) in &args.args {
        arguments = arguments.arg(key.as_str(), value.as_str());
    }
    for key in &args.flags {
        arguments = arguments.arg(key.as_str(), Value::Bool(true));
    }
    if let Some(children) = &args.children {
        arguments = arguments.children(children.as_str());
    }

    let output = renderer
        .render(&args.component, &arguments, &registry)
        .with_context(|| format!("Failed to render component \"{}\"", args.component))?;
    print!("{}", output);
    Ok(())
}

fn build_config(args: &Args) -> Result<ComponentConfig> {
    let mut config = match (&args.config, &args.root) {
        (Some(path), _) => ComponentConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        (None, Some(root)) => ComponentConfig::new(root),
        (None, None) => {
            let cwd = std::env::current_dir().context("Failed to determine current directory")?;
            ComponentConfig::new(cwd)
        }
    };
    if let Some(root) = &args.root {
        config = config.with_root_directory(root);
    }
    if let Some(schema_name) = &args.schema_name {
        config.schema_name = schema_name.clone();
    }
    config.use_schema |= args.schema;
    config.schema_required |= args.schema_required;
    Ok(config)
}
