mod cli;
mod commands;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use services::services::config::ClientConfig;
use tracing::debug;

use crate::{
    cli::{AuthCommand, Cli, Command},
    commands::App,
    session::{Session, default_state_dir},
};

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init("info");
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(ClientConfig::default_path);
    let mut config =
        ClientConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    debug!(base_url = %config.base_url, "configuration loaded");

    let state_dir = cli
        .state_dir
        .or_else(default_state_dir)
        .context("could not determine a state directory, pass --state-dir")?;
    let session = Session::open(&config, state_dir)?;

    let signing_out = matches!(cli.command, Command::Auth(AuthCommand::SignOut));
    let app = App {
        config,
        session,
        json: cli.json,
    };
    commands::run(&app, cli.command).await?;

    // the server may have refreshed or set cookies during the call
    if !signing_out {
        app.session.save()?;
    }
    Ok(())
}
