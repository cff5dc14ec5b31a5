//! Application observer interfaces
//!
//! Two observer families exist: server observers receive device lifecycle
//! transitions, resource observers receive value notifications for resources
//! they attached to. Both run synchronously on the server loop while the
//! server lock is held; an observer must not call back into the server's
//! device-management operations.

use lwm2m_core::{DataRecord, Uri};
use lwm2m_engine::MAX_ENDPOINT_NAME_LEN;

/// Kind of a device lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEventKind {
    /// The client registered
    Registered,
    /// The client deregistered or was replaced
    Deregistered,
    /// The client refreshed its registration
    Updated,
}

/// A device lifecycle event
///
/// Carries a bounded copy of the endpoint name rather than a handle: by the
/// time the event is delivered the device may already have been replaced by
/// a re-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    name: String,
    kind: DeviceEventKind,
}

impl DeviceEvent {
    /// Create an event, truncating the name to [`MAX_ENDPOINT_NAME_LEN`]
    pub fn new(name: &str, kind: DeviceEventKind) -> Self {
        let mut name = name.to_string();
        if name.len() > MAX_ENDPOINT_NAME_LEN {
            let mut cut = MAX_ENDPOINT_NAME_LEN;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            name.truncate(cut);
        }
        Self { name, kind }
    }

    /// Endpoint name of the device the event refers to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event kind
    pub fn kind(&self) -> DeviceEventKind {
        self.kind
    }
}

/// Observer of device lifecycle transitions
pub trait ServerObserver: Send + Sync {
    /// Called for every Registered / Deregistered / Updated transition, in
    /// arrival order
    fn on_device_event(&self, event: &DeviceEvent);
}

/// A value notification delivered to a resource observer
#[derive(Debug, Clone)]
pub struct ResourceNotification {
    /// Endpoint name of the reporting device
    pub device: String,
    /// Resource-level URI the value belongs to
    pub uri: Uri,
    /// Decoded value
    pub record: DataRecord,
}

impl ResourceNotification {
    pub(crate) fn new(device: &str, uri: Uri, record: DataRecord) -> Self {
        Self {
            device: device.to_string(),
            uri,
            record,
        }
    }
}

/// Observer of value changes on a single resource
pub trait ResourceObserver: Send + Sync {
    /// Called once per matching notification, in arrival order
    fn on_notification(&self, notification: &ResourceNotification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_is_bounded() {
        let event = DeviceEvent::new(&"n".repeat(300), DeviceEventKind::Registered);
        assert_eq!(event.name().len(), MAX_ENDPOINT_NAME_LEN);
        assert_eq!(event.kind(), DeviceEventKind::Registered);
    }

    #[test]
    fn test_short_name_is_kept() {
        let event = DeviceEvent::new("sensor-01", DeviceEventKind::Deregistered);
        assert_eq!(event.name(), "sensor-01");
    }
}
