//! Statistics formatting

use crate::delivery::DeliveryStats;
use std::time::Duration;
use vconn_io::EndpointStats;

/// Snapshot shared between the I/O loop and the stats reporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub endpoint: EndpointStats,
    pub delivery: DeliveryStats,
    /// Datagrams dropped by the loss simulator
    pub simulated_drops: u64,
    /// Live virtual connections
    pub peers: usize,
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Render the used bits of an ack bitfield, newest (`ack`) first
///
/// A `1` means received, `.` means missing.
pub fn format_bitfield(bitfield: u32, ack_bits: u32) -> String {
    (0..ack_bits.min(32))
        .rev()
        .map(|bit| if bitfield & (1 << bit) != 0 { '1' } else { '.' })
        .collect()
}

/// One-line summary for periodic reporting
pub fn summary_line(stats: &LinkStats, uptime: Duration) -> String {
    let e = &stats.endpoint;
    let d = &stats.delivery;
    format!(
        "[{}] peers={} sent={} ({}) recv={} ({}) discarded={} dropped={} acked={} lost={} pending={}",
        format_duration(uptime),
        stats.peers,
        e.datagrams_sent,
        format_bytes(e.bytes_sent),
        e.datagrams_received,
        format_bytes(e.bytes_received),
        e.datagrams_discarded,
        stats.simulated_drops,
        d.acked,
        d.lost,
        d.pending
    )
}
