//! Events emitted by the protocol engine
//!
//! The underlying CoAP/LWM2M library reports registrations, device-management
//! responses and observe notifications through callbacks. This binding turns
//! each callback into a value event carrying an opaque correlation token, so
//! the server routes results without process-wide state.

use bytes::Bytes;
use lwm2m_core::{CoapStatus, MediaType, Uri};

/// Opaque key correlating a submitted request with its eventual result
///
/// Tokens are handed to the engine on submission and round-tripped back on
/// the matching response or notification. They are generation-counted and
/// never reused within a server's lifetime, so a late callback for a
/// discarded request resolves to a lookup miss instead of a stale slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationToken(u64);

impl CorrelationToken {
    /// Raw token value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Generator for correlation tokens
#[derive(Debug, Default)]
pub struct TokenGenerator {
    next: u64,
}

impl TokenGenerator {
    /// Create a generator starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next token
    pub fn next_token(&mut self) -> CorrelationToken {
        let token = CorrelationToken(self.next);
        self.next += 1;
        token
    }
}

/// One callback delivery from the protocol engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Registration lifecycle transition reported by the monitoring hook
    ///
    /// `Created` announces a new registration, `Deleted` a deregistration and
    /// `Changed` a registration update. The client is identified by the
    /// engine's ephemeral internal id.
    Registration { client: u16, status: CoapStatus },

    /// Response to a submitted Read or Write
    DmResult {
        client: u16,
        uri: Uri,
        status: CoapStatus,
        format: MediaType,
        payload: Bytes,
        token: CorrelationToken,
    },

    /// Observe acknowledgement or value notification
    ///
    /// Establishment and cancellation acknowledgements arrive with an empty
    /// payload and the engine success status; value pushes arrive as
    /// `Content` with the encoded payload.
    Notification {
        client: u16,
        uri: Uri,
        status: CoapStatus,
        format: MediaType,
        payload: Bytes,
        token: CorrelationToken,
    },
}
