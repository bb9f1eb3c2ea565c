//! CLI definitions for hostlink.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// hostlink CLI.
#[derive(Parser)]
#[command(name = "hostlink")]
#[command(about = "Remote command interface over WebSocket")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path. Built-in defaults are used when omitted.
    #[arg(short, long, env = "HOSTLINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Bind address, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the discovery listing of every registered action
    Actions,

    /// Load and validate the configuration, then exit
    CheckConfig,
}
