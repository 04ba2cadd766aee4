//! boardsync configuration file handling
//!
//! Loads and manages the YAML configuration: board credentials, server
//! authentication, polling sources and notification services. Everything here is
//! loaded once at process start and read-only afterwards.

use crate::schedule::Period;
use crate::{BoardSyncError, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do with stale board items when a source runs in strict mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalAction {
    /// Soft-remove: the item disappears from the active view but is recoverable
    Archive,
    /// Permanently delete the item
    Delete,
}

impl Default for RemovalAction {
    fn default() -> Self {
        RemovalAction::Archive
    }
}

/// How board mutations are dispatched during a polling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Workers only compute actions; a single consumer serializes all board writes
    Serialized,
    /// Each worker writes to the board directly (client is internally thread-safe)
    Direct,
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Serialized
    }
}

/// Webhook settings for inbound board change events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret used to verify inbound webhook signatures
    pub secret: String,

    /// The callback URL the board signs payloads against
    pub callback_url: String,
}

/// Board API credentials and behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    pub api_key: String,
    pub api_token: String,
    pub board_id: String,

    #[serde(default)]
    pub removal_action: RemovalAction,

    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Basic auth credentials for the poll trigger endpoint
    pub username: String,
    pub password: String,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// One configured source of board items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,

    /// Label ID binding the source to a subset of the board
    pub label: String,

    /// List ID that newly created items are placed into
    pub list: String,

    /// HTTP endpoint returning the source's current items as a JSON array
    pub endpoint: String,

    #[serde(default)]
    pub period: Period,

    /// Enables removal of board items no longer present in the source's fetch
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// One downstream service notified of archived board items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Label ID that selects which archived items this service cares about
    pub label: String,

    /// Shared secret sent as an authentication header with each notification
    #[serde(default)]
    pub secret: String,

    pub endpoint: String,
}

/// boardsync configuration
///
/// Represents the complete YAML config file: board credentials, server settings,
/// polling sources and notification services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub board: BoardConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Fixed UTC offset for schedule evaluation, e.g. "+03:00" (default UTC)
    #[serde(default)]
    pub timezone_offset: Option<String>,

    /// Global deadline for a polling cycle, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub topology: Topology,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            server: ServerConfig::default(),
            timezone_offset: None,
            timeout_seconds: default_timeout_seconds(),
            topology: Topology::default(),
            sources: Vec::new(),
            services: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            BoardSyncError::Config(format!(
                "could not read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Resolve the configured timezone offset, defaulting to UTC
    pub fn timezone(&self) -> Result<FixedOffset> {
        match self.timezone_offset.as_deref() {
            None | Some("") => Ok(FixedOffset::east_opt(0).unwrap()),
            Some(s) => s.parse::<FixedOffset>().map_err(|e| {
                BoardSyncError::Config(format!("invalid timezone offset '{}': {}", s, e))
            }),
        }
    }

    /// Structural validation beyond what serde enforces
    fn validate(&self) -> Result<()> {
        for src in &self.sources {
            if src.name.is_empty() {
                return Err(BoardSyncError::Config("source name cannot be blank".into()));
            }
            if src.label.is_empty() {
                return Err(BoardSyncError::Config(format!(
                    "source '{}' has a blank label ID",
                    src.name
                )));
            }
            if src.endpoint.is_empty() {
                return Err(BoardSyncError::Config(format!(
                    "source '{}' has a blank endpoint",
                    src.name
                )));
            }
        }
        for svc in &self.services {
            if svc.label.is_empty() || svc.endpoint.is_empty() {
                return Err(BoardSyncError::Config(
                    "service entries require both a label and an endpoint".into(),
                ));
            }
        }
        Ok(())
    }
}

impl ServiceConfig {
    /// Parse a comma-separated list of `label[:secret]@endpoint` entries.
    ///
    /// This compact form is accepted from an environment variable as an
    /// alternative to the YAML `services` section. Labels and secrets must be
    /// alphanumeric.
    pub fn parse_list(input: &str) -> Result<Vec<ServiceConfig>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut services = Vec::new();

        for entry in input.split(',') {
            let major: Vec<&str> = entry.split('@').collect();
            if major.len() != 2 {
                return Err(BoardSyncError::Config(format!(
                    "expected only one occurrence of '@', got {} in {}",
                    major.len() - 1,
                    entry
                )));
            }

            let minor: Vec<&str> = major[0].split(':').collect();
            if minor.len() > 2 {
                return Err(BoardSyncError::Config(format!(
                    "expected at most one occurrence of ':', got {} in {}",
                    minor.len() - 1,
                    entry
                )));
            }

            if !is_alphanumeric(minor[0]) {
                return Err(BoardSyncError::Config(format!(
                    "unexpected non-alphanumeric characters in {}",
                    entry
                )));
            }

            let secret = if minor.len() > 1 {
                if !is_alphanumeric(minor[1]) {
                    return Err(BoardSyncError::Config(format!(
                        "unexpected non-alphanumeric characters in {}",
                        entry
                    )));
                }
                minor[1].to_string()
            } else {
                String::new()
            };

            services.push(ServiceConfig {
                label: minor[0].to_string(),
                secret,
                endpoint: major[1].to_string(),
            });
        }

        Ok(services)
    }
}

fn is_alphanumeric(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::PeriodType;
    use tempfile::TempDir;

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let config = Config {
            board: BoardConfig {
                api_key: "key".into(),
                api_token: "token".into(),
                board_id: "board-1".into(),
                removal_action: RemovalAction::Delete,
                webhook: WebhookConfig {
                    secret: "hush".into(),
                    callback_url: "https://example.com/webhook".into(),
                },
            },
            server: ServerConfig {
                port: 9090,
                username: "user".into(),
                password: "pass".into(),
            },
            timezone_offset: Some("+03:00".into()),
            timeout_seconds: 30,
            topology: Topology::Direct,
            sources: vec![SourceConfig {
                name: "issues".into(),
                label: "lbl-1".into(),
                list: "lst-1".into(),
                endpoint: "https://issues.example.com/items".into(),
                period: Period {
                    period_type: PeriodType::Hour,
                    interval: 2,
                },
                strict: true,
                enabled: true,
            }],
            services: vec![ServiceConfig {
                label: "lbl-1".into(),
                secret: "s3cret".into(),
                endpoint: "https://downstream.example.com/hook".into(),
            }],
        };

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(loaded.server.port, 9090);
        assert_eq!(loaded.topology, Topology::Direct);
        assert_eq!(loaded.board.removal_action, RemovalAction::Delete);
        assert_eq!(loaded.sources.len(), 1);
        assert!(loaded.sources[0].strict);
        assert_eq!(loaded.sources[0].period.interval, 2);
        assert_eq!(loaded.services.len(), 1);
    }

    #[test]
    fn test_load_rejects_blank_source_label() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml = r#"
board:
  api_key: key
  api_token: token
  board_id: board-1
sources:
  - name: issues
    label: ""
    list: lst-1
    endpoint: https://issues.example.com/items
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(matches!(err, BoardSyncError::Config(_)));
    }

    #[test]
    fn test_source_defaults() {
        let yaml = r#"
board:
  api_key: key
  api_token: token
  board_id: board-1
sources:
  - name: issues
    label: lbl-1
    list: lst-1
    endpoint: https://issues.example.com/items
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let src = &config.sources[0];
        assert!(src.enabled);
        assert!(!src.strict);
        assert_eq!(src.period.period_type, PeriodType::Default);
    }

    #[test]
    fn test_timezone_defaults_to_utc() {
        let config = Config::default();
        assert_eq!(config.timezone().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_timezone_parses_offset() {
        let config = Config {
            timezone_offset: Some("+03:00".into()),
            ..Default::default()
        };
        assert_eq!(config.timezone().unwrap().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_timezone_rejects_garbage() {
        let config = Config {
            timezone_offset: Some("Mars/Olympus".into()),
            ..Default::default()
        };
        assert!(config.timezone().is_err());
    }

    #[test]
    fn test_parse_service_list() {
        let services =
            ServiceConfig::parse_list("habits:pass123@https://example.com/a,chores@http://b")
                .unwrap();

        assert_eq!(
            services,
            vec![
                ServiceConfig {
                    label: "habits".into(),
                    secret: "pass123".into(),
                    endpoint: "https://example.com/a".into(),
                },
                ServiceConfig {
                    label: "chores".into(),
                    secret: String::new(),
                    endpoint: "http://b".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_service_list_empty() {
        assert!(ServiceConfig::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_service_list_rejects_malformed() {
        // missing endpoint separator
        assert!(ServiceConfig::parse_list("habits").is_err());
        // two '@' separators
        assert!(ServiceConfig::parse_list("habits@x@y").is_err());
        // two ':' separators
        assert!(ServiceConfig::parse_list("a:b:c@endpoint").is_err());
        // non-alphanumeric label
        assert!(ServiceConfig::parse_list("ha-bits@endpoint").is_err());
        // non-alphanumeric secret
        assert!(ServiceConfig::parse_list("habits:p@ss@endpoint").is_err());
    }
}
