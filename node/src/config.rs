//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use eggvote_rounds::CloseSchedule;

use crate::NodeError;

/// Configuration for the eggvote service.
///
/// Loaded from a TOML file via [`NodeConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Storage and round-lifecycle settings.
    #[serde(default)]
    pub node: NodeSection,

    /// HTTP listener settings.
    #[serde(default)]
    pub rpc: RpcSection,

    /// External tokenization collaborator settings.
    #[serde(default)]
    pub tokenizer: TokenizerSection,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSection {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Number of candidates per round (ids `1..=candidate_count`).
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u16,

    /// UTC hour at which rounds close daily.
    #[serde(default = "default_close_hour")]
    pub close_hour: u8,

    /// UTC minute at which rounds close daily.
    #[serde(default)]
    pub close_minute: u8,

    /// Scheduler tick interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcSection {
    /// Socket address the HTTP server binds, e.g. `127.0.0.1:8080`.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Whether to answer cross-origin requests from any origin. The voting
    /// page is served from a different origin than this API.
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerSection {
    /// Endpoint URL of the tokenization collaborator. When absent, round
    /// winners are acknowledged locally instead of dispatched.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds for dispatch attempts.
    #[serde(default = "default_tokenizer_timeout_secs")]
    pub timeout_secs: u64,

    /// Delivery attempts before a job is parked for operator attention.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./eggvote_data")
}

fn default_candidate_count() -> u16 {
    20
}

fn default_close_hour() -> u8 {
    6
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_true() -> bool {
    true
}

fn default_tokenizer_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    10
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.node.candidate_count == 0 {
            return Err(NodeError::Config(
                "candidate_count must be at least 1".to_string(),
            ));
        }
        if self.node.close_hour >= 24 {
            return Err(NodeError::Config(format!(
                "close_hour {} out of range 0..=23",
                self.node.close_hour
            )));
        }
        if self.node.close_minute >= 60 {
            return Err(NodeError::Config(format!(
                "close_minute {} out of range 0..=59",
                self.node.close_minute
            )));
        }
        if self.node.poll_interval_secs == 0 {
            return Err(NodeError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// The close schedule described by this configuration.
    ///
    /// `validate` has range-checked the fields, so construction cannot
    /// panic for a validated config.
    pub fn schedule(&self) -> CloseSchedule {
        CloseSchedule::new(self.node.close_hour, self.node.close_minute)
    }

    /// The parsed HTTP listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, NodeError> {
        self.rpc
            .listen
            .parse()
            .map_err(|e| NodeError::Config(format!("invalid listen address: {e}")))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSection::default(),
            rpc: RpcSection::default(),
            tokenizer: TokenizerSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            candidate_count: default_candidate_count(),
            close_hour: default_close_hour(),
            close_minute: 0,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cors_allow_any: default_true(),
        }
    }
}

impl Default for TokenizerSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_tokenizer_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}
