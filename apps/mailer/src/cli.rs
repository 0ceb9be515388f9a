//! Command-line triggers: single sends, bulk sample sends, listing and previews.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::mail::templates::{self, Category, TemplateSpec};
use crate::mail::EmailService;
use crate::samples;

#[derive(Debug, Parser)]
#[command(name = "sendscript-mailer", version, about = "Templated email dispatch for SendScript")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Send one template.
    Send(SendArgs),
    /// Send every template (optionally one category) with sample data.
    SendAll {
        category: Option<Category>,
        #[arg(long)]
        to: String,
    },
    /// Print the template table grouped by category.
    List,
    /// Test the SMTP connection.
    Check,
    /// Render a template with sample data without sending it.
    Preview {
        template: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct SendArgs {
    pub template: String,
    pub email: String,
    /// Template data as key=value. Repeatable.
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
    /// JSON file with template data. `--field` values win over it.
    #[arg(long)]
    pub data: Option<PathBuf>,
    #[arg(long)]
    pub subject: Option<String>,
    /// Prompt for fields that are still missing.
    #[arg(short, long)]
    pub interactive: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

// ─── send ────────────────────────────────────────────────────────────────────

pub async fn send(service: &EmailService, args: SendArgs) -> Result<()> {
    let spec = templates::lookup(&args.template)?;

    let mut data = match &args.data {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_str::<Value>(&raw)
                .with_context(|| format!("{} is not valid JSON", path.display()))?
            {
                Value::Object(map) => map,
                _ => bail!("{} must contain a JSON object", path.display()),
            }
        }
        None => Map::new(),
    };
    for (key, value) in args.fields {
        data.insert(key, Value::String(value));
    }

    if args.interactive {
        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        prompt_missing_fields(spec, &mut data, &mut stdin, &mut stdout).await?;
    }

    let receipt = service
        .send_template_email(
            spec.name,
            &args.email,
            &Value::Object(data),
            args.subject.as_deref(),
        )
        .await?;
    println!("Sent {} to {} ({})", spec.name, receipt.to, receipt.message_id);
    Ok(())
}

/// Asks for every field of `spec` not already in `data`.
/// An empty answer keeps the default; required fields are asked again.
pub async fn prompt_missing_fields<R, W>(
    spec: &TemplateSpec,
    data: &mut Map<String, Value>,
    reader: &mut R,
    writer: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for field in spec.fields() {
        let supplied = [field.key, field.var]
            .iter()
            .any(|k| data.get(*k).is_some_and(templates::is_present));
        if supplied {
            continue;
        }

        loop {
            let hint = match (field.required, field.default) {
                (_, Some(default)) => format!(" [{}]", default.display()),
                (true, None) => " (required)".to_string(),
                (false, None) => " (optional)".to_string(),
            };
            writer
                .write_all(format!("Enter {}{hint}: ", field.label).as_bytes())
                .await?;
            writer.flush().await?;

            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                bail!("Input closed before {} was entered", field.label);
            }
            let answer = line.trim();

            if !answer.is_empty() {
                data.insert(field.key.to_string(), Value::String(answer.to_string()));
                break;
            }
            if !field.required {
                break;
            }
            writer
                .write_all(format!("{} is required.\n", field.label).as_bytes())
                .await?;
        }
    }
    Ok(())
}

// ─── send-all ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SendOutcome {
    pub template: &'static str,
    pub result: Result<String, String>,
}

/// Sends sample data for every template in `category` (all when `None`).
/// Keeps going after failures.
pub async fn send_all(
    service: &EmailService,
    category: Option<Category>,
    to: &str,
) -> Vec<SendOutcome> {
    let mut outcomes = Vec::new();
    for spec in templates::TEMPLATES
        .iter()
        .filter(|t| category.map_or(true, |c| t.category == c))
    {
        let input = samples::sample_input(spec);
        let result = service
            .send_template_email(spec.name, to, &input, None)
            .await
            .map(|receipt| receipt.message_id)
            .map_err(|e| e.to_string());
        outcomes.push(SendOutcome {
            template: spec.name,
            result,
        });
    }
    outcomes
}

pub fn report(outcomes: &[SendOutcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    for outcome in outcomes {
        match &outcome.result {
            Ok(message_id) => info!("✓ {} sent ({message_id})", outcome.template),
            Err(e) => error!("✗ {} failed: {e}", outcome.template),
        }
    }
    println!(
        "{} sent, {failed} failed, {} total",
        outcomes.len() - failed,
        outcomes.len()
    );
    if failed > 0 {
        bail!("{failed} of {} emails failed", outcomes.len());
    }
    Ok(())
}

// ─── list / preview ──────────────────────────────────────────────────────────

pub fn list() -> String {
    let mut out = String::new();
    for category in Category::ALL {
        out.push_str(&format!("\n{} ({category})\n", category.title()));
        for spec in templates::by_category(category) {
            let required: Vec<&str> = spec
                .fields()
                .iter()
                .filter(|f| f.required)
                .map(|f| f.key)
                .collect();
            let contract = match spec.shape {
                templates::DataShape::Fields(_) => required.join(", "),
                templates::DataShape::Passthrough => "free-form data".to_string(),
                templates::DataShape::Paginated { items_key } => {
                    format!("paginated by {items_key}")
                }
            };
            out.push_str(&format!("  {:<40} {contract}\n", spec.name));
        }
    }
    out
}

pub async fn preview(service: &EmailService, template: &str, output: Option<PathBuf>) -> Result<()> {
    let spec = templates::lookup(template)?;
    let html = service.render_preview(spec.name, &samples::sample_input(spec))?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Preview of {} written to {}", spec.name, path.display());
        }
        None => println!("{html}"),
    }
    Ok(())
}
