//! Registration snapshots exposed by the protocol engine

/// Maximum endpoint name length carried in lifecycle events
///
/// Names longer than this are truncated when copied into events; the bound
/// matches the engine's own client-name limit.
pub const MAX_ENDPOINT_NAME_LEN: usize = 64;

/// Capabilities of one advertised resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    pub resource_id: u16,
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
}

impl ResourceInfo {
    /// A readable resource with no other capabilities
    pub fn readable(resource_id: u16) -> Self {
        Self {
            resource_id,
            readable: true,
            writable: false,
            executable: false,
        }
    }
}

/// One advertised Object Instance with its resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub object_id: u16,
    pub instance_id: u8,
    pub resources: Vec<ResourceInfo>,
}

/// Snapshot of a registered client as known to the engine
///
/// Produced from the engine's client list when the monitoring hook reports a
/// registration or an update. The snapshot is a copy; it stays valid after
/// the engine replaces or discards the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Ephemeral internal id, reassigned on every re-registration
    pub internal_id: u16,
    /// Stable endpoint name
    pub name: String,
    /// Advertised lifetime in seconds
    pub lifetime: u32,
    /// Advertised object instances
    pub objects: Vec<ObjectInfo>,
}

impl ClientInfo {
    /// Endpoint name truncated to [`MAX_ENDPOINT_NAME_LEN`]
    pub fn bounded_name(&self) -> String {
        let mut name = self.name.clone();
        if name.len() > MAX_ENDPOINT_NAME_LEN {
            let mut cut = MAX_ENDPOINT_NAME_LEN;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            name.truncate(cut);
        }
        name
    }
}
