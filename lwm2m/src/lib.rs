//! LWM2M device-management server
//!
//! This library implements the server side of the Lightweight M2M protocol
//! over CoAP/UDP: client registration tracking, a live Object / Instance /
//! Resource inventory per client, Read / Write / Observe operations and
//! notification fan-out to in-process observers.
//!
//! # Architecture
//!
//! The library is organized as a workspace with multiple crates:
//!
//! - `lwm2m-core`: core types, error handling, URI addressing
//! - `lwm2m-transport`: UDP endpoint and connection bookkeeping
//! - `lwm2m-engine`: binding to the external CoAP/LWM2M protocol engine
//! - `lwm2m-server`: client directory, observations, server loop and API
//!
//! # Usage
//!
//! ```no_run
//! use lwm2m::server::{Lwm2mServer, ServerConfig};
//! ```

// Re-export core types
pub use lwm2m_core::{CoapStatus, DataRecord, DataValue, Lwm2mError, Lwm2mResult, MediaType, Uri};

// Re-export the engine binding
pub mod engine {
    pub use lwm2m_engine::*;
}

// Re-export the transport layer
pub mod transport {
    pub use lwm2m_transport::*;
}

// Re-export the server API
pub mod server {
    pub use lwm2m_server::*;
}
