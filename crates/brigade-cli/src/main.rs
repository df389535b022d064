//! Brigade CLI
//!
//! Command-line front end for brigade kitchen sessions: one-off planning,
//! event-log replay and a JSON-lines session server.

mod args;
mod cli;
mod renderer;
mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use args::{Args, Commands};
use brigade_core::{params::CreateSession, DispatcherBuilder, KeywordResources};
use clap::Parser;
use cli::{load_recipe, Cli};
use log::info;
use renderer::TerminalRenderer;
use serve::run_stdio_server;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut builder = DispatcherBuilder::new()
        .with_machine_spec_path(args.machine_file.as_ref())
        .with_scheduler_config(args.scheduler_config());
    if args.shared_oven {
        builder = builder.with_resource_classifier(Arc::new(KeywordResources::oven()));
    }
    let dispatcher = builder
        .build()
        .await
        .context("Failed to initialize dispatcher")?;

    let renderer = TerminalRenderer::new(!args.no_color);

    info!("Brigade started");

    match &args.command {
        Commands::Plan(plan) => Cli::new(dispatcher, renderer).plan(plan).await,
        Commands::Replay(replay) => Cli::new(dispatcher, renderer).replay(replay).await,
        Commands::Machine => Cli::new(dispatcher, renderer).machine(),
        Commands::Serve(serve) => {
            let recipe = load_recipe(&serve.recipe).await?;
            dispatcher
                .create_session(&CreateSession {
                    session_id: serve.session.clone(),
                    recipe,
                })
                .await?;
            run_stdio_server(dispatcher, &serve.session)
                .await
                .context("Session server failed")
        }
    }
}
