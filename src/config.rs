use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{Client, DEFAULT_ENDPOINT};
use crate::store::StateStore;
use crate::transport::{HttpTransport, TransportError, WireLog};

const DEFAULT_COOLDOWN_SECS: u64 = 60;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Toml(err) => write!(f, "invalid config file: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}

impl From<TransportError> for ConfigError {
    fn from(value: TransportError) -> Self {
        ConfigError::Invalid(format!("could not build HTTP client: {}", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Defaults to `$HOME/lib/tdsync` when unset.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub wire_log: Option<PathBuf>,
    #[serde(default = "default_cooldown_secs")]
    pub pull_cooldown_secs: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            state_dir: None,
            wire_log: None,
            pull_cooldown_secs: DEFAULT_COOLDOWN_SECS,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// `$HOME/.config/tdsync/config.toml`, if HOME is set.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            Path::new(&home)
                .join(".config")
                .join("tdsync")
                .join("config.toml"),
        )
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Io(err)),
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn state_store(&self) -> Result<StateStore, ConfigError> {
        match &self.state_dir {
            Some(dir) => Ok(StateStore::new(dir.clone())),
            None => StateStore::default_location()
                .map_err(|err| ConfigError::Invalid(err.to_string())),
        }
    }

    /// Builds a client over HTTP with this configuration. The cache starts
    /// empty; restore it with [`Client::with_cache`].
    pub fn build_client(&self, token: impl Into<String>) -> Result<Client, ConfigError> {
        self.validate()?;
        let transport = match self.request_timeout_secs {
            Some(secs) => HttpTransport::with_timeout(Duration::from_secs(secs))?,
            None => HttpTransport::new(),
        };
        let wire_log = match &self.wire_log {
            Some(path) => WireLog::open(path)?,
            None => WireLog::disabled(),
        };
        Ok(Client::new(token)
            .with_endpoint(self.endpoint.clone())
            .with_transport(transport)
            .with_wire_log(wire_log)
            .with_pull_cooldown(Duration::from_secs(self.pull_cooldown_secs)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::{ClientConfig, ConfigError};
    use crate::client::DEFAULT_ENDPOINT;

    fn unique_workspace() -> PathBuf {
        let root = std::env::temp_dir().join(format!("tdsync-config-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("workspace should be creatable");
        root
    }

    #[test]
    fn missing_file_yields_defaults() {
        let root = unique_workspace();
        let config = ClientConfig::load(&root.join("absent.toml")).expect("load should succeed");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.pull_cooldown_secs, 60);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config = ClientConfig::parse(
            r#"
state_dir = "/tmp/tdsync-state"
request_timeout_secs = 15
"#,
        )
        .expect("config should parse");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.state_dir, Some(PathBuf::from("/tmp/tdsync-state")));
        assert_eq!(config.request_timeout_secs, Some(15));
        assert_eq!(config.wire_log, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClientConfig::parse("endpont = \"https://typo.example\"")
            .expect_err("typo should be rejected");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_timeout_and_blank_endpoint_are_invalid() {
        assert!(matches!(
            ClientConfig::parse("request_timeout_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::parse("endpoint = \"  \""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn build_client_applies_endpoint_and_opens_wire_log() {
        let root = unique_workspace();
        let log_path = root.join("logs").join("wire.log");
        let config = ClientConfig {
            endpoint: "http://127.0.0.1:9/sync".to_string(),
            wire_log: Some(log_path.clone()),
            request_timeout_secs: Some(5),
            ..ClientConfig::default()
        };
        let client = config.build_client("token").expect("client should build");
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/sync");
        assert!(client.wire_log.is_enabled());
        assert!(log_path.exists());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn configured_state_dir_wins_over_home() {
        let config = ClientConfig {
            state_dir: Some(PathBuf::from("/var/tmp/tdsync")),
            ..ClientConfig::default()
        };
        let store = config.state_store().expect("store should resolve");
        assert_eq!(store.dir(), PathBuf::from("/var/tmp/tdsync").as_path());
    }
}
