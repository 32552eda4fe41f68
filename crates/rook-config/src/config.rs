//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

const APP_NAME: &str = "rook";

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Connection to the game authority.
    pub network: NetworkConfig,
    /// Who the local participant is.
    pub identity: IdentityConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Network configuration for the session channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Host name or IP of the game authority.
    pub server_address: String,
    /// Port of the game authority.
    pub server_port: u16,
    /// How long to wait for the authority to accept the handshake.
    pub handshake_timeout_seconds: u32,
    /// Largest frame payload accepted or sent, in bytes.
    pub max_payload_size: u32,
}

/// Identity of the local participant.
///
/// An empty `token` means the participant has not signed in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Stable subject identifier issued by the identity provider.
    pub subject: String,
    /// E-mail address sent alongside session requests.
    pub email: String,
    /// Human-readable name.
    pub display_name: String,
    /// Credential attached to the channel handshake.
    pub token: String,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write JSON logs to the log directory (always on in debug builds).
    pub log_to_file: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 3000,
            handshake_timeout_seconds: 10,
            max_payload_size: 65_536,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl NetworkConfig {
    /// `host:port` string suitable for `TcpStream::connect`.
    pub fn authority_addr(&self) -> String {
        format!("{}:{}", self.server_address, self.server_port)
    }
}

impl IdentityConfig {
    /// Whether a credential is present.
    pub fn is_signed_in(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Resolve `<os config dir>/rook`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(2))
                .unwrap();
        assert!(ron_str.contains("server_port: 3000"));
        assert!(ron_str.contains("log_level: \"info\""));
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(network: (server_port: 4000))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.network.server_port, 4000);
        assert_eq!(config.network.server_address, "127.0.0.1");
        assert_eq!(config.identity, IdentityConfig::default());
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(board_theme: \"green\")");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.network.server_address = "chess.example".to_string();
        config.identity.email = "alice@example.com".to_string();
        config.identity.token = "tok-1".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_authority_addr_joins_host_and_port() {
        let network = NetworkConfig::default();
        assert_eq!(network.authority_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_blank_token_is_not_signed_in() {
        let mut identity = IdentityConfig::default();
        assert!(!identity.is_signed_in());
        identity.token = "   ".to_string();
        assert!(!identity.is_signed_in());
        identity.token = "abc".to_string();
        assert!(identity.is_signed_in());
    }
}
