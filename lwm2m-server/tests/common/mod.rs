//! Scripted in-memory protocol engine for exercising the server end to end
//!
//! The engine double records every submission and delivers canned responses
//! and notifications as engine events, the way the real binding surfaces its
//! callbacks. Payload decoding uses a trivial `id=value;id=value` encoding
//! standing in for TLV.

use async_trait::async_trait;
use bytes::Bytes;
use lwm2m_core::{CoapStatus, DataRecord, Lwm2mError, Lwm2mResult, MediaType, Uri};
use lwm2m_engine::{ClientInfo, CorrelationToken, EngineEvent, ProtocolEngine};
use lwm2m_server::{DeviceEvent, ResourceNotification, ResourceObserver, ServerObserver};
use lwm2m_transport::ConnectionId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    open: bool,
    clients: HashMap<u16, ClientInfo>,
    events: VecDeque<EngineEvent>,
    observations: HashMap<(u16, Uri), CorrelationToken>,
    staged_reads: HashMap<(u16, Uri), (CoapStatus, MediaType, Bytes)>,
    staged_writes: HashMap<(u16, Uri), CoapStatus>,
    reject_submissions: bool,
    fail_cancel: bool,
    observe_submissions: usize,
}

/// Cloneable handle; every clone scripts the same engine
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Announce a registration for the given client snapshot
    pub fn register_client(&self, info: ClientInfo) {
        let mut inner = self.lock();
        let client = info.internal_id;
        inner.clients.insert(client, info);
        inner.events.push_back(EngineEvent::Registration {
            client,
            status: CoapStatus::Created,
        });
    }

    /// Announce a deregistration
    pub fn deregister_client(&self, client: u16) {
        let mut inner = self.lock();
        inner.clients.remove(&client);
        inner.events.push_back(EngineEvent::Registration {
            client,
            status: CoapStatus::Deleted,
        });
    }

    /// Announce a registration update, optionally with a new lifetime
    pub fn update_client(&self, client: u16, lifetime: Option<u32>) {
        let mut inner = self.lock();
        if let Some(lifetime) = lifetime {
            if let Some(info) = inner.clients.get_mut(&client) {
                info.lifetime = lifetime;
            }
        }
        inner.events.push_back(EngineEvent::Registration {
            client,
            status: CoapStatus::Changed,
        });
    }

    /// Stage the response the next read of this URI receives
    pub fn stage_read(
        &self,
        client: u16,
        uri: Uri,
        status: CoapStatus,
        format: MediaType,
        payload: &[u8],
    ) {
        self.lock()
            .staged_reads
            .insert((client, uri), (status, format, Bytes::copy_from_slice(payload)));
    }

    /// Stage the status the next write of this URI receives
    pub fn stage_write(&self, client: u16, uri: Uri, status: CoapStatus) {
        self.lock().staged_writes.insert((client, uri), status);
    }

    /// Push an unsolicited value notification for an observed URI
    ///
    /// Returns false when no observation is active for the URI.
    pub fn notify(&self, client: u16, uri: Uri, format: MediaType, payload: &[u8]) -> bool {
        let mut inner = self.lock();
        let Some(token) = inner.observations.get(&(client, uri)).copied() else {
            return false;
        };
        inner.events.push_back(EngineEvent::Notification {
            client,
            uri,
            status: CoapStatus::Content,
            format,
            payload: Bytes::copy_from_slice(payload),
            token,
        });
        true
    }

    /// Make every subsequent submission fail synchronously
    pub fn reject_submissions(&self, reject: bool) {
        self.lock().reject_submissions = reject;
    }

    /// Make cancel acknowledgements report an error
    pub fn fail_cancel(&self, fail: bool) {
        self.lock().fail_cancel = fail;
    }

    /// Number of protocol observes submitted so far
    pub fn observe_submissions(&self) -> usize {
        self.lock().observe_submissions
    }

    /// Check whether a protocol observation is in flight for the URI
    pub fn has_observation(&self, client: u16, uri: Uri) -> bool {
        self.lock().observations.contains_key(&(client, uri))
    }
}

#[async_trait]
impl ProtocolEngine for ScriptedEngine {
    async fn open(&mut self) -> Lwm2mResult<()> {
        self.lock().open = true;
        Ok(())
    }

    async fn close(&mut self) -> Lwm2mResult<()> {
        self.lock().open = false;
        Ok(())
    }

    async fn step(&mut self, budget: Duration) -> Lwm2mResult<Duration> {
        Ok(budget)
    }

    async fn handle_packet(&mut self, _datagram: Bytes, _link: ConnectionId) -> Lwm2mResult<()> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.lock().events.pop_front()
    }

    fn client_info(&self, client: u16) -> Option<ClientInfo> {
        self.lock().clients.get(&client).cloned()
    }

    fn dm_read(&mut self, client: u16, uri: Uri, token: CorrelationToken) -> Lwm2mResult<()> {
        let mut inner = self.lock();
        if inner.reject_submissions {
            return Err(Lwm2mError::Submission("read rejected".to_string()));
        }
        if let Some((status, format, payload)) = inner.staged_reads.get(&(client, uri)).cloned() {
            inner.events.push_back(EngineEvent::DmResult {
                client,
                uri,
                status,
                format,
                payload,
                token,
            });
        }
        Ok(())
    }

    fn dm_write(
        &mut self,
        client: u16,
        uri: Uri,
        format: MediaType,
        _payload: Bytes,
        token: CorrelationToken,
    ) -> Lwm2mResult<()> {
        let mut inner = self.lock();
        if inner.reject_submissions {
            return Err(Lwm2mError::Submission("write rejected".to_string()));
        }
        if let Some(status) = inner.staged_writes.get(&(client, uri)).copied() {
            inner.events.push_back(EngineEvent::DmResult {
                client,
                uri,
                status,
                format,
                payload: Bytes::new(),
                token,
            });
        }
        Ok(())
    }

    fn observe(&mut self, client: u16, uri: Uri, token: CorrelationToken) -> Lwm2mResult<()> {
        let mut inner = self.lock();
        if inner.reject_submissions {
            return Err(Lwm2mError::Submission("observe rejected".to_string()));
        }
        inner.observations.insert((client, uri), token);
        inner.observe_submissions += 1;
        inner.events.push_back(EngineEvent::Notification {
            client,
            uri,
            status: CoapStatus::NoError,
            format: MediaType::TextPlain,
            payload: Bytes::new(),
            token,
        });
        Ok(())
    }

    fn cancel_observe(
        &mut self,
        client: u16,
        uri: Uri,
        token: CorrelationToken,
    ) -> Lwm2mResult<()> {
        let mut inner = self.lock();
        if inner.reject_submissions {
            return Err(Lwm2mError::Submission("cancel rejected".to_string()));
        }
        let status = if inner.fail_cancel {
            CoapStatus::InternalServerError
        } else {
            inner.observations.remove(&(client, uri));
            CoapStatus::NoError
        };
        inner.events.push_back(EngineEvent::Notification {
            client,
            uri,
            status,
            format: MediaType::TextPlain,
            payload: Bytes::new(),
            token,
        });
        Ok(())
    }

    fn parse(&self, uri: &Uri, payload: &[u8], format: MediaType) -> Lwm2mResult<Vec<DataRecord>> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Lwm2mError::InvalidData("payload is not UTF-8".to_string()))?;
        match format {
            MediaType::TextPlain => Ok(vec![DataRecord::text(
                uri.resource_id().unwrap_or(0),
                text,
            )]),
            MediaType::Tlv => {
                let mut records = Vec::new();
                for pair in text.split(';').filter(|p| !p.is_empty()) {
                    let (id, value) = pair
                        .split_once('=')
                        .ok_or_else(|| Lwm2mError::InvalidData(format!("bad record: {}", pair)))?;
                    let id = id
                        .parse::<u16>()
                        .map_err(|_| Lwm2mError::InvalidData(format!("bad record id: {}", id)))?;
                    records.push(DataRecord::text(id, value));
                }
                Ok(records)
            }
            other => Err(Lwm2mError::InvalidData(format!(
                "unsupported format {}",
                other
            ))),
        }
    }
}

/// Lifecycle observer collecting every event it sees
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DeviceEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl ServerObserver for RecordingObserver {
    fn on_device_event(&self, event: &DeviceEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Resource observer collecting every notification it sees
#[derive(Default)]
pub struct RecordingResourceObserver {
    notifications: Mutex<Vec<ResourceNotification>>,
}

impl RecordingResourceObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<ResourceNotification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| n.record.value.as_text().map(str::to_string))
            .collect()
    }
}

impl ResourceObserver for RecordingResourceObserver {
    fn on_notification(&self, notification: &ResourceNotification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}
