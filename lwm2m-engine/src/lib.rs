//! Binding layer to the external CoAP/LWM2M protocol engine
//!
//! The server core drives the engine through the [`ProtocolEngine`] trait and
//! consumes its callbacks as [`EngineEvent`] values correlated by token. The
//! engine owns everything below CoAP semantics; the server owns everything
//! above them.

pub mod client_info;
pub mod engine;
pub mod event;

pub use client_info::{ClientInfo, ObjectInfo, ResourceInfo, MAX_ENDPOINT_NAME_LEN};
pub use engine::ProtocolEngine;
pub use event::{CorrelationToken, EngineEvent, TokenGenerator};
