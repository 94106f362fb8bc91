//! Peer table
//!
//! Maps peer addresses to their virtual connections. A server creates entries
//! implicitly on first receipt from an unseen address; a client inserts its
//! single server up front. The table is bounded and never evicts on its own.

use crate::config::ProtocolConfig;
use crate::connection::VirtualConnection;
use std::collections::hash_map::{Entry, HashMap};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::debug;

/// Default maximum number of peers per table
pub const DEFAULT_MAX_PEERS: usize = 256;

/// Peer table errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("Peer table is full ({max} peers), rejecting {addr}")]
    TableFull { addr: SocketAddr, max: usize },
}

/// One virtual connection per peer address
#[derive(Debug)]
pub struct PeerTable {
    peers: HashMap<SocketAddr, VirtualConnection>,
    max_peers: usize,
    config: ProtocolConfig,
}

impl PeerTable {
    /// Create an empty table holding at most `max_peers` connections
    pub fn new(max_peers: usize, config: ProtocolConfig) -> Self {
        PeerTable {
            peers: HashMap::new(),
            max_peers,
            config,
        }
    }

    /// Connection for `addr`, created if it does not exist yet
    pub fn get_or_insert(&mut self, addr: SocketAddr) -> Result<&mut VirtualConnection, PeerError> {
        let at_capacity = self.peers.len() >= self.max_peers;
        match self.peers.entry(addr) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(_) if at_capacity => Err(PeerError::TableFull {
                addr,
                max: self.max_peers,
            }),
            Entry::Vacant(entry) => {
                debug!(peer = %addr, "creating virtual connection");
                Ok(entry.insert(VirtualConnection::new(addr, self.config)))
            }
        }
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&VirtualConnection> {
        self.peers.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut VirtualConnection> {
        self.peers.get_mut(addr)
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.peers.contains_key(addr)
    }

    /// Drop the connection for `addr`, returning it if present
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<VirtualConnection> {
        self.peers.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualConnection> {
        self.peers.values()
    }
}
