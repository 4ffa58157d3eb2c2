//! promptcanvas - prompt-to-image front end and generation proxy.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod coordinator;
mod error;
mod params;
mod ports;
mod proxy;
mod render;

use std::process;

use clap::Parser;
use tracing::Level;

use crate::cli::{Cli, Command, GenerateArgs, ServeArgs};
use crate::config::Config;
use crate::context::{Endpoints, RecordingSession, ServiceContext};
use crate::coordinator::{Coordinator, GenerationResult};
use crate::error::{CliError, Notice};
use crate::proxy::AppState;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match (&cli.command, cli.verbose) {
        (_, true) => Level::DEBUG,
        (Command::Serve(_), false) => Level::INFO,
        (Command::Generate(_), false) => Level::ERROR,
    };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(CliError::Config)?;

    match cli.command {
        Command::Serve(args) => serve(args, &config).await,
        Command::Generate(args) => generate(args, &config).await,
    }
}

async fn serve(args: ServeArgs, config: &Config) -> Result<(), CliError> {
    // Resolved once; the proxy never reads the environment again.
    let api_key = config.nebius_key();
    match &api_key {
        Some(key) => tracing::info!(key = %key.masked(), "upstream credential loaded"),
        None => tracing::warn!(
            env_var = config::API_KEY_ENV,
            "no upstream credential; generation requests will fail"
        ),
    }

    let endpoints = Endpoints {
        upstream_url: config.server.upstream_url.clone(),
        proxy_url: config.client.proxy_url.clone(),
    };
    let (ctx, recording) = ServiceContext::from_env(&endpoints)?;
    let state = AppState::new(api_key, ctx.upstream);

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "promptcanvas proxy listening");

    proxy::serve(listener, state, shutdown_signal())
        .await
        .map_err(|e| CliError::Serve(e.to_string()))?;

    finish_recording(recording);
    Ok(())
}

async fn generate(args: GenerateArgs, config: &Config) -> Result<(), CliError> {
    let prompt = args.resolve_prompt()?;

    let endpoints = Endpoints {
        upstream_url: config.server.upstream_url.clone(),
        proxy_url: args.proxy_url.unwrap_or_else(|| config.client.proxy_url.clone()),
    };
    let (ctx, recording) = ServiceContext::from_env(&endpoints)?;

    let mut coordinator = Coordinator::new(ctx.proxy);
    let view = render::spawn_progress_view(coordinator.subscribe());
    let outcome = coordinator.submit(&prompt).await;
    if let Some(GenerationResult::Failed { message }) = coordinator.snapshot().result {
        tracing::debug!(%message, "last request failed");
    }
    drop(coordinator);
    if let Err(e) = view.await {
        tracing::debug!(error = %e, "progress view ended abnormally");
    }

    finish_recording(recording);

    let image = outcome?;
    eprintln!("{}", Notice::Generated);
    println!("{}", image.data_uri());
    eprintln!("Prompt: {}", image.prompt);
    Ok(())
}

fn finish_recording(recording: Option<RecordingSession>) {
    if let Some(session) = recording {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
