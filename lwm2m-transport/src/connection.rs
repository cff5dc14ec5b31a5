//! Connection bookkeeping for the single server socket
//!
//! CoAP over UDP is connectionless, but the protocol engine tracks each
//! remote it talks to. This table maps remote addresses to the stable ids the
//! engine receives with every datagram.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Stable identifier of a remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Raw id value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Table of known remote endpoints
#[derive(Debug, Default)]
pub struct ConnectionList {
    by_addr: HashMap<SocketAddr, ConnectionId>,
    next_id: u64,
}

impl ConnectionList {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the connection for a remote address
    pub fn find(&self, addr: SocketAddr) -> Option<ConnectionId> {
        self.by_addr.get(&addr).copied()
    }

    /// Look up the connection for a remote address, registering it on first
    /// sight
    ///
    /// Returns the id plus whether the address was newly registered.
    pub fn resolve(&mut self, addr: SocketAddr) -> (ConnectionId, bool) {
        if let Some(id) = self.find(addr) {
            return (id, false);
        }
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.by_addr.insert(addr, id);
        (id, true)
    }

    /// Drop every known connection
    pub fn clear(&mut self) {
        self.by_addr.clear();
    }

    /// Number of known connections
    pub fn len(&self) -> usize {
        self.by_addr.len()
    }

    /// Check whether no connection is known
    pub fn is_empty(&self) -> bool {
        self.by_addr.is_empty()
    }
}
