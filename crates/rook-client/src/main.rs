//! rook: play chess against a remote opponent from the terminal.
//!
//! Run with: `cargo run -p rook-client -- --server 127.0.0.1 --port 3000 --token <token>`

mod app;
mod commands;
mod render;

use clap::Parser;
use rook_config::{CliArgs, Config, IdentityConfig, default_config_dir};
use rook_session::{StaticIdentity, UserInfo};
use tracing::info;

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => default_config_dir().unwrap_or_else(|e| {
            eprintln!("Failed to resolve config directory: {e}");
            std::process::exit(1);
        }),
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    let file_logging = cfg!(debug_assertions) || config.debug.log_to_file;
    rook_log::init_logging(Some(&log_dir), file_logging, Some(&config));

    let Some(identity) = identity_from(&config.identity) else {
        eprintln!(
            "Please authenticate: set identity.token in {} or pass --token",
            config_dir.join(rook_config::CONFIG_FILE_NAME).display()
        );
        std::process::exit(1);
    };
    info!(email = %config.identity.email, "signed in");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    runtime.block_on(app::run(&config, identity));
}

/// The configured user, or `None` when no token is set.
fn identity_from(identity: &IdentityConfig) -> Option<StaticIdentity> {
    identity.is_signed_in().then(|| {
        StaticIdentity::signed_in(UserInfo {
            subject: identity.subject.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
        })
    })
}
