//! Transaction slots and the observation registry
//!
//! Every device-management exchange completes through a slot: a single-slot
//! mailbox whose status field moves away from `Pending` exactly once per
//! armed request. Blocking Read/Write allocate a slot locally and spin on
//! it; persistent observations keep their slot alive in the registry, where
//! notification events find it by correlation token. The two populations
//! never share a slot.

use crate::device::{DeviceKey, ObjectHandle, ResourceHandle};
use bytes::Bytes;
use lwm2m_core::{CoapStatus, DataRecord, MediaType, Uri};
use lwm2m_engine::CorrelationToken;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Completion state of a transaction slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// Armed, no response yet
    Pending,
    /// Completed with the given CoAP status
    Done(CoapStatus),
}

/// Result mailbox of one device-management exchange
#[derive(Debug)]
pub struct TransactionSlot {
    status: SlotStatus,
    /// Internal id of the responding client
    pub client: Option<u16>,
    /// URI the response refers to
    pub uri: Option<Uri>,
    /// Content format of the raw payload
    pub format: Option<MediaType>,
    /// Raw response payload
    pub payload: Bytes,
    /// Decoded records, filled when the target still resolves
    pub records: Vec<DataRecord>,
}

impl TransactionSlot {
    /// Create an armed, empty slot
    pub fn new() -> Self {
        Self {
            status: SlotStatus::Pending,
            client: None,
            uri: None,
            format: None,
            payload: Bytes::new(),
            records: Vec::new(),
        }
    }

    /// Re-arm the slot for a fresh exchange
    pub fn arm(&mut self) {
        self.status = SlotStatus::Pending;
        self.client = None;
        self.uri = None;
        self.format = None;
        self.payload = Bytes::new();
        self.records = Vec::new();
    }

    /// Record a response
    pub fn complete(
        &mut self,
        client: u16,
        uri: Uri,
        status: CoapStatus,
        format: MediaType,
        payload: Bytes,
    ) {
        self.client = Some(client);
        self.uri = Some(uri);
        self.format = Some(format);
        self.payload = payload;
        self.status = SlotStatus::Done(status);
    }

    /// Current status
    pub fn status(&self) -> SlotStatus {
        self.status
    }

    /// Check whether the slot still awaits its response
    pub fn is_pending(&self) -> bool {
        self.status == SlotStatus::Pending
    }
}

impl Default for TransactionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared ownership of a slot between the caller and the server loop
pub type SharedSlot = Arc<Mutex<TransactionSlot>>;

/// Allocate a fresh shared slot
pub fn shared_slot() -> SharedSlot {
    Arc::new(Mutex::new(TransactionSlot::new()))
}

/// Pending Read/Write correlations
///
/// Routing only: the slots are owned by their callers, entries disappear
/// when the response arrives. Abandoned entries are dropped wholesale on
/// server stop.
#[derive(Debug, Default)]
pub struct TransactionTable {
    pending: HashMap<CorrelationToken, SharedSlot>,
}

impl TransactionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a submitted request
    pub fn insert(&mut self, token: CorrelationToken, slot: SharedSlot) {
        self.pending.insert(token, slot);
    }

    /// Take the slot for an arrived response
    pub fn take(&mut self, token: CorrelationToken) -> Option<SharedSlot> {
        self.pending.remove(&token)
    }

    /// Drop every pending correlation
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of in-flight requests
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check whether no request is in flight
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// What an observation is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObserveTarget {
    /// A whole object instance; notifications fan out per resource
    Object(ObjectHandle),
    /// A single resource
    Resource(ResourceHandle),
}

impl ObserveTarget {
    /// Key of the registration the target belongs to
    pub fn device_key(&self) -> &DeviceKey {
        match self {
            ObserveTarget::Object(handle) => handle.device_key(),
            ObserveTarget::Resource(handle) => handle.device_key(),
        }
    }

    /// Endpoint name of the device
    pub fn device_name(&self) -> &str {
        self.device_key().name()
    }

    /// URI the protocol observe is issued against
    pub fn uri(&self) -> Uri {
        match self {
            ObserveTarget::Object(handle) => handle.uri(),
            ObserveTarget::Resource(handle) => handle.uri(),
        }
    }
}

/// One active observation
#[derive(Debug, Clone)]
pub struct ObservationEntry {
    /// Token round-tripped through the engine with every notification
    pub token: CorrelationToken,
    /// The application handle the caller observed
    pub target: ObserveTarget,
    /// Status mailbox and latest payload
    pub slot: SharedSlot,
}

/// Registry of active observations
///
/// Keyed by the application handle the caller passed to `observe`, with a
/// token index for routing engine events back to their entry.
#[derive(Debug, Default)]
pub struct ObservationRegistry {
    objects: HashMap<ObjectHandle, ObservationEntry>,
    resources: HashMap<ResourceHandle, ObservationEntry>,
    tokens: HashMap<CorrelationToken, ObserveTarget>,
}

impl ObservationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry by its target handle
    pub fn get(&self, target: &ObserveTarget) -> Option<&ObservationEntry> {
        match target {
            ObserveTarget::Object(handle) => self.objects.get(handle),
            ObserveTarget::Resource(handle) => self.resources.get(handle),
        }
    }

    /// Check whether a target is observed
    pub fn is_observed(&self, target: &ObserveTarget) -> bool {
        self.get(target).is_some()
    }

    /// Insert an entry, replacing any previous entry for the same target
    pub fn insert(&mut self, entry: ObservationEntry) {
        self.tokens.insert(entry.token, entry.target.clone());
        match entry.target.clone() {
            ObserveTarget::Object(handle) => {
                self.objects.insert(handle, entry);
            }
            ObserveTarget::Resource(handle) => {
                self.resources.insert(handle, entry);
            }
        }
    }

    /// Remove the entry for a target
    pub fn remove(&mut self, target: &ObserveTarget) -> Option<ObservationEntry> {
        let entry = match target {
            ObserveTarget::Object(handle) => self.objects.remove(handle),
            ObserveTarget::Resource(handle) => self.resources.remove(handle),
        };
        if let Some(entry) = &entry {
            self.tokens.remove(&entry.token);
        }
        entry
    }

    /// Resolve the target an engine event belongs to
    pub fn target_for_token(&self, token: CorrelationToken) -> Option<ObserveTarget> {
        self.tokens.get(&token).cloned()
    }

    /// Drop every entry whose device left the grace list
    ///
    /// Returns the number of removed entries.
    pub fn purge_device(&mut self, key: &DeviceKey) -> usize {
        let doomed: Vec<ObserveTarget> = self
            .objects
            .values()
            .chain(self.resources.values())
            .filter(|e| e.target.device_key() == key)
            .map(|e| e.target.clone())
            .collect();
        for target in &doomed {
            self.remove(target);
        }
        doomed.len()
    }

    /// Number of active observations
    pub fn len(&self) -> usize {
        self.objects.len() + self.resources.len()
    }

    /// Check whether no observation is active
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.resources.is_empty()
    }
}
