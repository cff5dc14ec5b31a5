//! Content formats exchanged with LWM2M clients

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type of a payload as negotiated by the protocol engine
///
/// Writes carry `TextPlain`; reads and notifications surface whatever the
/// engine produced, typically `Tlv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// text/plain (CoAP content format 0)
    TextPlain,
    /// application/link-format (40)
    LinkFormat,
    /// application/octet-stream (42)
    Opaque,
    /// application/vnd.oma.lwm2m+tlv (11542)
    Tlv,
    /// application/vnd.oma.lwm2m+json (11543)
    Json,
}

impl MediaType {
    /// CoAP content-format registry code
    pub fn code(&self) -> u16 {
        match self {
            MediaType::TextPlain => 0,
            MediaType::LinkFormat => 40,
            MediaType::Opaque => 42,
            MediaType::Tlv => 11542,
            MediaType::Json => 11543,
        }
    }

    /// Decode a content-format code; unknown codes map to `None`
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(MediaType::TextPlain),
            40 => Some(MediaType::LinkFormat),
            42 => Some(MediaType::Opaque),
            11542 => Some(MediaType::Tlv),
            11543 => Some(MediaType::Json),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::TextPlain => "text/plain",
            MediaType::LinkFormat => "application/link-format",
            MediaType::Opaque => "application/octet-stream",
            MediaType::Tlv => "application/vnd.oma.lwm2m+tlv",
            MediaType::Json => "application/vnd.oma.lwm2m+json",
        };
        write!(f, "{}", name)
    }
}
