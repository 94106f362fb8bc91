//! Configuration file support for the vconn demo tools

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use vconn_protocol::config::{
    DEFAULT_ACK_BITS, DEFAULT_HISTORY_CAPACITY, DEFAULT_INITIAL_SEQUENCE,
};
use vconn_protocol::peers::DEFAULT_MAX_PEERS;
use vconn_protocol::sequence::DEFAULT_SEQUENCE_MODULUS;
use vconn_protocol::ProtocolConfig;

/// Default server port
pub const DEFAULT_PORT: u16 = 35555;

/// Protocol parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSettings {
    /// Size of the sequence number space
    #[serde(default = "default_sequence_modulus")]
    pub sequence_modulus: u32,
    /// Width of the ack bitfield
    #[serde(default = "default_ack_bits")]
    pub ack_bits: u32,
    /// Slots in each connection's receive history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// First outgoing sequence number
    #[serde(default = "default_initial_sequence")]
    pub initial_sequence: u32,
    /// Pick a random first sequence number instead of `initial_sequence`
    ///
    /// The draw stays in the lower half of the sequence space. A fresh peer
    /// starts with remote sequence 0, and anything past the half point would
    /// compare as older than that and go unacknowledged until it wraps.
    #[serde(default)]
    pub randomize_initial_sequence: bool,
}

fn default_sequence_modulus() -> u32 {
    DEFAULT_SEQUENCE_MODULUS
}

fn default_ack_bits() -> u32 {
    DEFAULT_ACK_BITS
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_initial_sequence() -> u32 {
    DEFAULT_INITIAL_SEQUENCE
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        ProtocolSettings {
            sequence_modulus: DEFAULT_SEQUENCE_MODULUS,
            ack_bits: DEFAULT_ACK_BITS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            initial_sequence: DEFAULT_INITIAL_SEQUENCE,
            randomize_initial_sequence: false,
        }
    }
}

impl ProtocolSettings {
    /// Check the fixed parameters without drawing a random start
    pub fn validate(&self) -> Result<ProtocolConfig, ConfigError> {
        let initial = if self.randomize_initial_sequence {
            0
        } else {
            self.initial_sequence
        };

        Ok(ProtocolConfig::new(
            self.sequence_modulus,
            self.ack_bits,
            self.history_capacity,
            initial,
        )?)
    }

    /// Validate into a protocol configuration
    pub fn to_protocol_config(&self) -> Result<ProtocolConfig, ConfigError> {
        let config = self.validate()?;
        if !self.randomize_initial_sequence {
            return Ok(config);
        }

        let initial = rand::thread_rng().gen_range(0..config.sequence_modulus() / 2);
        Ok(config.with_initial_sequence(initial)?)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen: SocketAddr,
    /// Maximum number of concurrent peers
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,
    /// Probability of dropping each outgoing datagram
    #[serde(default = "default_loss_rate")]
    pub loss_rate: f64,
    /// Statistics interval in seconds (0 disables)
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

fn default_max_peers() -> usize {
    DEFAULT_MAX_PEERS
}

fn default_loss_rate() -> f64 {
    0.5
}

fn default_stats_interval() -> u64 {
    5
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address
    pub server: SocketAddr,
    /// Optional local bind address
    pub bind: Option<SocketAddr>,
    /// Counter messages to send before shutting the server down
    #[serde(default = "default_packet_count")]
    pub packet_count: u32,
    /// Probability of dropping each outgoing datagram
    #[serde(default = "default_loss_rate")]
    pub loss_rate: f64,
    /// Pause when nothing was received, in milliseconds
    #[serde(default = "default_idle_interval")]
    pub idle_interval_ms: u64,
}

fn default_packet_count() -> u32 {
    10
}

fn default_idle_interval() -> u64 {
    1000
}

/// Combined configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Protocol parameters shared by both sides
    #[serde(default)]
    pub protocol: ProtocolSettings,
    /// Server configuration
    pub server: Option<ServerConfig>,
    /// Client configuration
    pub client: Option<ClientConfig>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check values the type system does not
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol.validate()?;
        if let Some(server) = &self.server {
            server.validate()?;
        }
        if let Some(client) = &self.client {
            client.validate()?;
        }
        Ok(())
    }

    /// Create example server configuration
    pub fn example_server() -> Self {
        Config {
            protocol: ProtocolSettings::default(),
            server: Some(ServerConfig {
                listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
                max_peers: DEFAULT_MAX_PEERS,
                loss_rate: 0.5,
                stats_interval_secs: 5,
            }),
            client: None,
        }
    }

    /// Create example client configuration
    pub fn example_client() -> Self {
        Config {
            protocol: ProtocolSettings::default(),
            server: None,
            client: Some(ClientConfig {
                server: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
                bind: None,
                packet_count: 10,
                loss_rate: 0.5,
                idle_interval_ms: 1000,
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] vconn_protocol::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn validate_loss_rate(rate: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::Invalid(format!(
            "loss_rate must be within [0, 1], got {}",
            rate
        )));
    }
    Ok(())
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_loss_rate(self.loss_rate)
    }

    /// Get statistics interval as Duration
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

impl ClientConfig {
    /// Counter values travel as `i32`, which bounds `packet_count`
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_loss_rate(self.loss_rate)?;
        if i32::try_from(self.packet_count).is_err() {
            return Err(ConfigError::Invalid(format!(
                "packet_count must be at most {}, got {}",
                i32::MAX,
                self.packet_count
            )));
        }
        Ok(())
    }

    /// Get idle interval as Duration
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}
