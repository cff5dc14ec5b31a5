//! Core types and utilities for the LWM2M server stack
//!
//! This crate provides the fundamental vocabulary shared by every layer:
//! error handling, URI addressing, CoAP status codes, content formats and
//! decoded resource values.

pub mod coap;
pub mod data;
pub mod error;
pub mod media_type;
pub mod uri;

pub use coap::CoapStatus;
pub use data::{DataRecord, DataValue};
pub use error::{Lwm2mError, Lwm2mResult};
pub use media_type::MediaType;
pub use uri::Uri;
