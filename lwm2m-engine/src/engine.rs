//! Protocol engine trait
//!
//! The raw CoAP/LWM2M machinery (framing, retransmission, block-wise
//! transfer, content negotiation) lives in an external library. This trait is
//! the complete verb table the server core needs from it; the server owns one
//! boxed engine and is the only caller, so implementations do not need
//! internal locking.

use crate::client_info::ClientInfo;
use crate::event::{CorrelationToken, EngineEvent};
use async_trait::async_trait;
use bytes::Bytes;
use lwm2m_core::{DataRecord, Lwm2mResult, MediaType, Uri};
use lwm2m_transport::ConnectionId;
use std::time::Duration;

/// Binding to the external CoAP/LWM2M protocol library
///
/// # Submission vs. completion
/// The `dm_*`, `observe` and `cancel_observe` verbs only *submit* a request;
/// a returned error means the library rejected the submission and no event
/// will follow. Accepted submissions complete later through an
/// [`EngineEvent`] carrying the same correlation token.
///
/// # Event delivery
/// `step` and `handle_packet` may produce any number of events; the caller
/// drains them with `poll_event` after each call. Events are delivered in
/// the order the library produced them.
#[async_trait]
pub trait ProtocolEngine: Send {
    /// Initialise the engine context
    async fn open(&mut self) -> Lwm2mResult<()>;

    /// Tear down the engine context
    ///
    /// Outstanding submissions never complete after a close.
    async fn close(&mut self) -> Lwm2mResult<()>;

    /// Run one engine step with the given time budget
    ///
    /// Returns the wait the engine suggests before the next step, e.g. the
    /// time until its next scheduled retransmission.
    async fn step(&mut self, budget: Duration) -> Lwm2mResult<Duration>;

    /// Feed one received datagram into the engine
    async fn handle_packet(&mut self, datagram: Bytes, link: ConnectionId) -> Lwm2mResult<()>;

    /// Take the next pending event, if any
    fn poll_event(&mut self) -> Option<EngineEvent>;

    /// Snapshot of a registered client by its internal id
    fn client_info(&self, client: u16) -> Option<ClientInfo>;

    /// Submit a Read of the given URI
    fn dm_read(&mut self, client: u16, uri: Uri, token: CorrelationToken) -> Lwm2mResult<()>;

    /// Submit a Write of the given payload
    fn dm_write(
        &mut self,
        client: u16,
        uri: Uri,
        format: MediaType,
        payload: Bytes,
        token: CorrelationToken,
    ) -> Lwm2mResult<()>;

    /// Submit an Observe of the given URI
    fn observe(&mut self, client: u16, uri: Uri, token: CorrelationToken) -> Lwm2mResult<()>;

    /// Submit a Cancel-Observe for the given URI
    fn cancel_observe(&mut self, client: u16, uri: Uri, token: CorrelationToken)
        -> Lwm2mResult<()>;

    /// Decode a payload into resource records
    fn parse(&self, uri: &Uri, payload: &[u8], format: MediaType) -> Lwm2mResult<Vec<DataRecord>>;
}
