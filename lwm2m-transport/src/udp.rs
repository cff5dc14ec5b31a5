//! UDP server endpoint

use bytes::Bytes;
use lwm2m_core::{Lwm2mError, Lwm2mResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Maximum size of a single datagram handed to the engine
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Address family the server socket binds with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    fn wildcard(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "0.0.0.0",
            AddressFamily::Ipv6 => "[::]",
        }
    }
}

/// UDP endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpEndpointSettings {
    pub port: String,
    pub family: AddressFamily,
}

impl UdpEndpointSettings {
    /// Create settings for the given listen port, IPv4 by default
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            family: AddressFamily::Ipv4,
        }
    }

    /// Select the address family
    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = family;
        self
    }
}

/// A received datagram together with its remote address
#[derive(Debug, Clone)]
pub struct Datagram {
    pub bytes: Bytes,
    pub peer: SocketAddr,
}

/// Server-side UDP endpoint
///
/// Owns the single listen socket of the server. The socket is held behind an
/// `Arc` so the receive wait can run without holding any server state lock.
pub struct UdpServerEndpoint {
    socket: Option<Arc<UdpSocket>>,
    settings: UdpEndpointSettings,
}

impl UdpServerEndpoint {
    /// Create a closed endpoint
    pub fn new(settings: UdpEndpointSettings) -> Self {
        Self {
            socket: None,
            settings,
        }
    }

    /// Bind the listen socket
    ///
    /// # Errors
    /// Returns error if the endpoint is already open or the bind fails.
    pub async fn open(&mut self) -> Lwm2mResult<()> {
        if self.socket.is_some() {
            return Err(Lwm2mError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Endpoint has already been opened",
            )));
        }

        let addr = format!("{}:{}", self.settings.family.wildcard(), self.settings.port);
        let socket = UdpSocket::bind(&addr).await.map_err(Lwm2mError::Connection)?;
        log::info!("LWM2M server listening on {}", addr);

        self.socket = Some(Arc::new(socket));
        Ok(())
    }

    /// Close the listen socket
    pub fn close(&mut self) {
        self.socket = None;
    }

    /// Check if the endpoint is closed
    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Shared handle to the open socket
    pub fn socket(&self) -> Option<Arc<UdpSocket>> {
        self.socket.clone()
    }

    /// Local address of the open socket
    pub fn local_addr(&self) -> Lwm2mResult<SocketAddr> {
        let socket = self.socket.as_ref().ok_or_else(|| {
            Lwm2mError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "UDP socket not bound",
            ))
        })?;
        socket.local_addr().map_err(Lwm2mError::Connection)
    }
}

/// Wait for one datagram with a bounded timeout
///
/// Returns `Ok(None)` when the budget elapses without traffic; socket errors
/// surface as `Err` so the caller's loop iteration can report them and move
/// on.
pub async fn recv_datagram(socket: &UdpSocket, budget: Duration) -> Lwm2mResult<Option<Datagram>> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    match tokio::time::timeout(budget, socket.recv_from(&mut buf)).await {
        Err(_) => Ok(None),
        Ok(Err(e)) => Err(Lwm2mError::Connection(e)),
        Ok(Ok((len, peer))) => {
            buf.truncate(len);
            Ok(Some(Datagram {
                bytes: Bytes::from(buf),
                peer,
            }))
        }
    }
}
