mod cli;
mod config;
mod errors;
mod layout;
mod mail;
mod routes;
mod samples;
mod state;

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::layout::{PageLayoutPlanner, PageMetrics};
use crate::mail::{EmailService, SmtpTransport, TemplateRenderer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("sendscript_mailer={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // `list` needs neither templates nor SMTP
    if let Some(Command::List) = cli.command {
        print!("{}", cli::list());
        return Ok(());
    }

    let service = build_service(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, service).await,
        Command::Send(args) => cli::send(&service, args).await,
        Command::SendAll { category, to } => {
            let outcomes = cli::send_all(&service, category, &to).await;
            cli::report(&outcomes)
        }
        Command::Check => {
            if service.test_connection().await {
                println!("SMTP connection to {}:{} OK", config.smtp.host, config.smtp.port);
                Ok(())
            } else {
                anyhow::bail!(
                    "SMTP connection to {}:{} failed",
                    config.smtp.host,
                    config.smtp.port
                )
            }
        }
        Command::Preview { template, output } => cli::preview(&service, &template, output).await,
        Command::List => Ok(()),
    }
}

fn build_service(config: &Config) -> Result<EmailService> {
    let renderer = TemplateRenderer::from_dir(&config.template_dir)?;
    let transport = Arc::new(SmtpTransport::from_settings(&config.smtp)?);
    info!(
        "SMTP transport: {}:{} (secure: {}, auth: {})",
        config.smtp.host,
        config.smtp.port,
        config.smtp.secure,
        config.smtp.user.is_some()
    );

    // A4 defaults; prescription requests may override per call
    let page_metrics = PageMetrics::default();
    let planner = PageLayoutPlanner::new(page_metrics);
    info!(
        "Page layout: {} rows per page ({} minimum shown)",
        planner.max_rows_per_page(),
        planner.optimal_rows_per_page()
    );

    Ok(EmailService::new(
        renderer,
        transport,
        config.mail_from.clone(),
        page_metrics,
    ))
}

async fn serve(config: Config, service: EmailService) -> Result<()> {
    info!("Starting SendScript mailer v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(service);
    if !service.test_connection().await {
        error!("SMTP server unreachable; sends will fail until it is available");
    }

    let state = AppState {
        mailer: service,
        public_dir: config.public_dir.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
