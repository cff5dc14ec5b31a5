//! Transport layer for the LWM2M server
//!
//! This crate owns the server's UDP listen socket and the connection table
//! that maps remote addresses to the ids the protocol engine sees.

pub mod connection;
pub mod udp;

pub use connection::{ConnectionId, ConnectionList};
pub use udp::{
    recv_datagram, AddressFamily, Datagram, UdpEndpointSettings, UdpServerEndpoint,
    MAX_DATAGRAM_SIZE,
};
