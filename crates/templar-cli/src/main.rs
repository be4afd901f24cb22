//! templar - render a template file against a JSON context
//!
//! The context is built from `--vars` (a JSON object file) and any number
//! of `--var name=value` pairs, later pairs overriding earlier entries.
//! Output goes to stdout unless `--output` names a file; logs go to
//! stderr and are filtered with `RUST_LOG`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value as Json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use templar::{Engine, Options, Record, Value};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "templar")]
#[command(about = "Render a templar template")]
struct Cli {
    /// Template file to render
    template: PathBuf,

    /// Context variable as NAME=VALUE; VALUE is read as JSON when it parses,
    /// otherwise as a string
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// JSON file holding an object of context variables
    #[arg(long = "vars", value_name = "FILE")]
    vars_file: Option<PathBuf>,

    /// JSON file with engine options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail on names that do not resolve
    #[arg(long)]
    strict: bool,

    /// Re-render the output until no markers remain
    #[arg(long)]
    stable: bool,

    /// Write the result here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "templar=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let options = load_options(&cli)?;
    let context = load_context(&cli)?;
    let source = fs::read_to_string(&cli.template)
        .with_context(|| format!("failed to read template {}", cli.template.display()))?;
    info!(template = %cli.template.display(), strict = options.strict, stable = cli.stable, "rendering");

    let engine = Engine::new().with_options(options);
    let rendered = if cli.stable {
        engine.render_until_stable(&source, &context)
    } else {
        engine.render(&source, &context)
    }
    .with_context(|| format!("failed to render {}", cli.template.display()))?;

    match &cli.output {
        Some(path) => {
            fs::write(path, &rendered).with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), bytes = rendered.len(), "output written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn load_options(cli: &Cli) -> Result<Options> {
    let mut options = match &cli.config {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Options::default(),
    };
    if cli.strict {
        options.strict = true;
    }
    Ok(options)
}

fn load_context(cli: &Cli) -> Result<Value> {
    let record = Record::new();
    if let Some(path) = &cli.vars_file {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read vars {}", path.display()))?;
        let json: Json = serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?;
        let Json::Object(entries) = json else {
            bail!("{} must hold a JSON object", path.display());
        };
        for (name, value) in entries {
            record.insert(name, to_value(value));
        }
    }
    for pair in &cli.vars {
        let (name, value) = parse_var(pair)?;
        record.insert(name, value);
    }
    debug!(variables = record.len(), "context loaded");
    Ok(Value::object(record))
}

fn parse_var(pair: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = pair.split_once('=') else {
        bail!("expected NAME=VALUE, got '{}'", pair);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("empty variable name in '{}'", pair);
    }
    let value = match serde_json::from_str::<Json>(raw) {
        Ok(json) => to_value(json),
        Err(_) => Value::from(raw),
    };
    Ok((name.to_string(), value))
}

/// JSON objects become records so templates can `#define` into them.
fn to_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::from(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => Value::from(small),
                    Err(_) => Value::from(i),
                }
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::from(s),
        Json::Array(items) => Value::list(items.into_iter().map(to_value)),
        Json::Object(entries) => Value::object(
            entries
                .into_iter()
                .map(|(name, value)| (name, to_value(value)))
                .collect::<Record>(),
        ),
    }
}
