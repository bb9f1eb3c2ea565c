//! hostlink - remote command interface over WebSocket
//!
//! Main entry point for the hostlink CLI and server.

mod cli;
mod register;
mod scene;
mod server;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use hostlink_dispatch::LIST_ACTIONS;
use hostlink_protocols::Params;

use crate::cli::{Cli, Commands};
use crate::register::{build_registry, SCENE_NAME};
use crate::scene::SceneStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        None => server::run_server(config_path, None, None).await,
        Some(Commands::Run { host, port }) => server::run_server(config_path, host, port).await,
        Some(Commands::Actions) => print_actions(),
        Some(Commands::CheckConfig) => check_config(config_path),
    }
}

fn print_actions() -> Result<(), Box<dyn std::error::Error>> {
    let registry = build_registry(Arc::new(SceneStore::new(SCENE_NAME)))?;
    let Some(discovery) = registry.get(LIST_ACTIONS) else {
        return Err(format!("{} is not registered", LIST_ACTIONS).into());
    };
    let listing = discovery.call(&Params::new())?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, warnings) = server::load_config(path)?;
    match path {
        Some(path) => println!("Configuration OK: {}", path.display()),
        None => println!("Configuration OK: built-in defaults"),
    }
    println!("  listen:      {}:{}", config.server.host, config.server.port);
    println!("  max pending: {}", config.dispatch.max_pending);
    println!("  tick:        {:?}", config.dispatch.tick_interval());
    for warning in warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}
