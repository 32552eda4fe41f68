//! Configuration for the rook client.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, IdentityConfig, NetworkConfig, default_config_dir,
};
pub use error::ConfigError;
