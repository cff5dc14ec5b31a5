//! CoAP result codes surfaced by the protocol engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// CoAP status code as delivered by the protocol engine callbacks
///
/// Registration monitoring uses `Created` / `Deleted` / `Changed`, device
/// management responses use `Content` / `Changed` plus the 4.xx / 5.xx error
/// classes. `NoError` is the engine-internal success marker reported for
/// observe and cancel acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoapStatus {
    /// Engine-level success (no CoAP response code attached)
    NoError,
    /// 2.01 Created
    Created,
    /// 2.02 Deleted
    Deleted,
    /// 2.04 Changed
    Changed,
    /// 2.05 Content
    Content,
    /// 4.00 Bad Request
    BadRequest,
    /// 4.01 Unauthorized
    Unauthorized,
    /// 4.04 Not Found
    NotFound,
    /// 4.05 Method Not Allowed
    MethodNotAllowed,
    /// 4.06 Not Acceptable
    NotAcceptable,
    /// 5.00 Internal Server Error
    InternalServerError,
    /// 5.03 Service Unavailable (also used for response timeouts)
    ServiceUnavailable,
}

impl CoapStatus {
    /// Raw code in CoAP `class.detail` wire encoding (class in the upper
    /// three bits, detail in the lower five)
    pub fn raw(&self) -> u8 {
        let (class, detail) = self.class_detail();
        (class << 5) | detail
    }

    /// Decode a raw wire code; unknown codes map to `None`
    pub fn from_raw(raw: u8) -> Option<Self> {
        let status = match (raw >> 5, raw & 0x1f) {
            (0, 0) => CoapStatus::NoError,
            (2, 1) => CoapStatus::Created,
            (2, 2) => CoapStatus::Deleted,
            (2, 4) => CoapStatus::Changed,
            (2, 5) => CoapStatus::Content,
            (4, 0) => CoapStatus::BadRequest,
            (4, 1) => CoapStatus::Unauthorized,
            (4, 4) => CoapStatus::NotFound,
            (4, 5) => CoapStatus::MethodNotAllowed,
            (4, 6) => CoapStatus::NotAcceptable,
            (5, 0) => CoapStatus::InternalServerError,
            (5, 3) => CoapStatus::ServiceUnavailable,
            _ => return None,
        };
        Some(status)
    }

    fn class_detail(&self) -> (u8, u8) {
        match self {
            CoapStatus::NoError => (0, 0),
            CoapStatus::Created => (2, 1),
            CoapStatus::Deleted => (2, 2),
            CoapStatus::Changed => (2, 4),
            CoapStatus::Content => (2, 5),
            CoapStatus::BadRequest => (4, 0),
            CoapStatus::Unauthorized => (4, 1),
            CoapStatus::NotFound => (4, 4),
            CoapStatus::MethodNotAllowed => (4, 5),
            CoapStatus::NotAcceptable => (4, 6),
            CoapStatus::InternalServerError => (5, 0),
            CoapStatus::ServiceUnavailable => (5, 3),
        }
    }

    /// Check whether the status is a success class (`NoError` or 2.xx)
    pub fn is_success(&self) -> bool {
        matches!(self.class_detail().0, 0 | 2)
    }

    /// Check whether the status carries response data (2.05 Content)
    pub fn has_content(&self) -> bool {
        matches!(self, CoapStatus::Content)
    }
}

impl fmt::Display for CoapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (class, detail) = self.class_detail();
        write!(f, "{}.{:02}", class, detail)
    }
}
