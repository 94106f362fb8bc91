//! vconn CLI Library
//!
//! Shared functionality for the vconn demo client and server.

pub mod config;
pub mod delivery;
pub mod message;
pub mod stats;

pub use config::{ClientConfig, Config, ConfigError, ProtocolSettings, ServerConfig};
pub use delivery::{DeliveryStats, DeliveryTracker};
pub use message::{DemoMessage, MessageError};
pub use stats::{format_bitfield, format_bytes, format_duration, summary_line, LinkStats};

use tracing_subscriber::EnvFilter;

/// Install the log subscriber
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug over info.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
