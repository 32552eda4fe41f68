//! Command-line argument parsing for the rook client.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// rook command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "rook", about = "Play chess against a remote opponent")]
pub struct CliArgs {
    /// Game authority host.
    #[arg(long)]
    pub server: Option<String>,

    /// Game authority port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Identity token attached to the handshake.
    #[arg(long)]
    pub token: Option<String>,

    /// E-mail sent with session requests.
    #[arg(long)]
    pub email: Option<String>,

    /// Display name.
    #[arg(long)]
    pub name: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref addr) = args.server {
            self.network.server_address = addr.clone();
        }
        if let Some(port) = args.port {
            self.network.server_port = port;
        }
        if let Some(ref token) = args.token {
            self.identity.token = token.clone();
        }
        if let Some(ref email) = args.email {
            self.identity.email = email.clone();
        }
        if let Some(ref name) = args.name {
            self.identity.display_name = name.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
