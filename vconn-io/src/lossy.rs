//! Lossy transport for exercising the ack signal
//!
//! Wraps another transport and silently drops outgoing datagrams with a
//! configurable probability. A dropped send still reports the full length as
//! sent, the way a real network loses packets after they leave the host.
//! Seed the generator to make a run reproducible.

use crate::socket::{DatagramTransport, SocketError};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Transport wrapper that drops a fraction of outgoing datagrams
#[derive(Debug)]
pub struct LossyTransport<T> {
    inner: T,
    /// Probability in `[0.0, 1.0]` that a datagram is dropped
    loss_rate: f64,
    rng: Mutex<StdRng>,
    /// Loss is only applied while enabled
    enabled: AtomicBool,
    dropped: AtomicU64,
    forwarded: AtomicU64,
}

impl<T: DatagramTransport> LossyTransport<T> {
    /// Wrap `inner`, seeding the generator from the OS
    pub fn new(inner: T, loss_rate: f64) -> Self {
        Self::with_rng(inner, loss_rate, StdRng::from_entropy())
    }

    /// Wrap `inner` with a reproducible drop pattern
    pub fn with_seed(inner: T, loss_rate: f64, seed: u64) -> Self {
        Self::with_rng(inner, loss_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(inner: T, loss_rate: f64, rng: StdRng) -> Self {
        LossyTransport {
            inner,
            loss_rate: if loss_rate.is_nan() {
                0.0
            } else {
                loss_rate.clamp(0.0, 1.0)
            },
            rng: Mutex::new(rng),
            enabled: AtomicBool::new(true),
            dropped: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
        }
    }

    pub fn loss_rate(&self) -> f64 {
        self.loss_rate
    }

    /// Turn simulated loss on or off; while off every datagram is forwarded
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Datagrams dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Datagrams handed to the inner transport so far
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: DatagramTransport> DatagramTransport for LossyTransport<T> {
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError> {
        if self.is_enabled() && self.rng.lock().gen_bool(self.loss_rate) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(%target, len = buf.len(), "simulated loss");
            return Ok(buf.len());
        }
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        self.inner.send_to(buf, target)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, SocketError> {
        self.inner.recv_from(buf)
    }

    fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.inner.local_addr()
    }
}
