//! LWM2M server: loop, engine driver and device-management API
//!
//! # Architecture
//! One logical execution drives the protocol engine. All server state lives
//! behind a single async mutex; the lock is released across every wait (the
//! socket receive and the poll quantum of a blocking call), so a blocking
//! operation never starves the loop.
//!
//! One loop iteration:
//! 1. deliver pending lifecycle events to the registered observers
//! 2. sweep the delete grace list
//! 3. run one engine step with a bounded budget and drain its events
//! 4. wait on the socket for the remaining budget (lock released)
//! 5. feed a received datagram to the engine and drain again
//!
//! # Driving the loop
//! With `DriveMode::Spawned`, `start()` spawns a driver task that owns the
//! loop and blocking calls sleep between polls of their slot. With
//! `DriveMode::CallerDriven` there is no driver task; blocking calls pump
//! `step()` themselves, and a host application may also pump it from its own
//! loop.
//!
//! Observer callbacks run synchronously under the server lock and must not
//! call back into Read/Write/Observe on the same server.

use crate::config::{DriveMode, ServerConfig};
use crate::device::{ObjectHandle, Resource, ResourceHandle};
use crate::lifecycle::{EventQueue, GraceList};
use crate::observation::{
    shared_slot, ObservationEntry, ObservationRegistry, ObserveTarget, SharedSlot, SlotStatus,
    TransactionTable,
};
use crate::observer::{
    DeviceEvent, DeviceEventKind, ResourceNotification, ResourceObserver, ServerObserver,
};
use crate::registry::ClientDirectory;
use bytes::Bytes;
use lwm2m_core::{CoapStatus, DataRecord, Lwm2mError, Lwm2mResult, MediaType, Uri};
use lwm2m_engine::{CorrelationToken, EngineEvent, ProtocolEngine, TokenGenerator};
use lwm2m_transport::{recv_datagram, ConnectionList, UdpEndpointSettings, UdpServerEndpoint};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Upper bound on the socket wait, whatever the engine suggests
const MAX_SOCKET_WAIT: Duration = Duration::from_secs(1);

struct ServerState {
    engine: Box<dyn ProtocolEngine>,
    endpoint: UdpServerEndpoint,
    connections: ConnectionList,
    directory: ClientDirectory,
    observations: ObservationRegistry,
    transactions: TransactionTable,
    events: EventQueue,
    grace: GraceList,
    observers: Vec<Arc<dyn ServerObserver>>,
    tokens: TokenGenerator,
    alive: bool,
}

struct ServerInner {
    config: ServerConfig,
    state: Mutex<ServerState>,
    running: AtomicBool,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// LWM2M server handle
///
/// Cheap to clone; every clone refers to the same server.
#[derive(Clone)]
pub struct Lwm2mServer {
    inner: Arc<ServerInner>,
}

impl Lwm2mServer {
    /// Create a stopped server around a protocol engine
    pub fn new(config: ServerConfig, engine: Box<dyn ProtocolEngine>) -> Self {
        let settings =
            UdpEndpointSettings::new(config.port.clone()).with_family(config.address_family);
        let state = ServerState {
            engine,
            endpoint: UdpServerEndpoint::new(settings),
            connections: ConnectionList::new(),
            directory: ClientDirectory::new(),
            observations: ObservationRegistry::new(),
            transactions: TransactionTable::new(),
            events: EventQueue::new(),
            grace: GraceList::new(),
            observers: Vec::new(),
            tokens: TokenGenerator::new(),
            alive: false,
        };
        Self {
            inner: Arc::new(ServerInner {
                config,
                state: Mutex::new(state),
                running: AtomicBool::new(false),
                driver: Mutex::new(None),
            }),
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Open the socket and the engine, then begin serving
    ///
    /// A running server is stopped and restarted. In `Spawned` mode this
    /// also launches the driver task.
    pub async fn start(&self) -> Lwm2mResult<()> {
        self.stop().await?;

        {
            let mut state = self.inner.state.lock().await;
            state.endpoint.open().await?;
            if let Err(e) = state.engine.open().await {
                state.endpoint.close();
                return Err(e);
            }
            state.alive = true;
        }

        if self.inner.config.drive == DriveMode::Spawned {
            self.inner.running.store(true, Ordering::SeqCst);
            let server = self.clone();
            let quantum = self.inner.config.poll_quantum;
            let handle = tokio::spawn(async move {
                while server.inner.running.load(Ordering::SeqCst) {
                    if let Err(e) = server.step().await {
                        log::warn!("Server loop iteration failed: {}", e);
                        tokio::time::sleep(quantum).await;
                    }
                }
            });
            *self.inner.driver.lock().await = Some(handle);
        }
        Ok(())
    }

    /// Stop serving and release the socket and the engine
    ///
    /// Outstanding blocking calls keep their slot at the pending sentinel
    /// and terminate through their deadline.
    pub async fn stop(&self) -> Lwm2mResult<()> {
        self.inner.running.store(false, Ordering::SeqCst);
        let handle = self.inner.driver.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::warn!("Driver task ended abnormally: {}", e);
            }
        }

        let mut state = self.inner.state.lock().await;
        if !state.alive {
            return Ok(());
        }
        state.alive = false;
        state.connections.clear();
        state.endpoint.close();
        state.transactions.clear();
        state.engine.close().await?;
        log::info!("LWM2M server stopped");
        Ok(())
    }

    /// Check whether the server is serving
    pub async fn is_alive(&self) -> bool {
        self.inner.state.lock().await.alive
    }

    /// Local address of the listen socket
    pub async fn local_addr(&self) -> Lwm2mResult<SocketAddr> {
        self.inner.state.lock().await.endpoint.local_addr()
    }

    /// Run one loop iteration
    pub async fn step(&self) -> Lwm2mResult<()> {
        let (socket, budget) = {
            let mut state = self.inner.state.lock().await;
            if !state.alive {
                return Err(Lwm2mError::NotRunning);
            }

            Self::deliver_events(&mut state);
            Self::sweep_grace(&mut state, Instant::now());

            let step_budget = self.inner.config.step_budget;
            let stepped = state.engine.step(step_budget).await;
            let budget = match &stepped {
                Ok(wait) => (*wait).clamp(Duration::from_millis(1), MAX_SOCKET_WAIT),
                Err(_) => step_budget,
            };
            Self::drain_engine_events(&mut state).await;
            if let Err(e) = stepped {
                return Err(e);
            }

            let socket = state.endpoint.socket().ok_or(Lwm2mError::NotRunning)?;
            (socket, budget)
        };

        // The lock is released for the socket wait
        let datagram = recv_datagram(&socket, budget).await?;

        if let Some(datagram) = datagram {
            let mut state = self.inner.state.lock().await;
            if !state.alive {
                return Ok(());
            }
            let (link, is_new) = state.connections.resolve(datagram.peer);
            if is_new {
                log::debug!("New connection from {}", datagram.peer);
            }
            let handled = state.engine.handle_packet(datagram.bytes, link).await;
            Self::drain_engine_events(&mut state).await;
            handled?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Directory API
    // ------------------------------------------------------------------

    /// Check whether a device with the given name is registered
    pub async fn has_device(&self, name: &str) -> bool {
        let state = self.inner.state.lock().await;
        state.alive && state.directory.has(name)
    }

    /// Names of all registered devices
    pub async fn device_names(&self) -> Vec<String> {
        self.inner.state.lock().await.directory.names()
    }

    /// Advertised lifetime of a registered device, in seconds
    pub async fn device_lifetime(&self, name: &str) -> Option<u32> {
        let state = self.inner.state.lock().await;
        state.directory.get(name).map(|d| d.lifetime())
    }

    /// End-of-life deadline of a registered device
    pub async fn device_end_of_life(&self, name: &str) -> Option<Instant> {
        let state = self.inner.state.lock().await;
        state.directory.get(name).map(|d| d.end_of_life())
    }

    /// Handles for the object instances a device advertised
    pub async fn object_handles(&self, name: &str) -> Vec<ObjectHandle> {
        let state = self.inner.state.lock().await;
        state
            .directory
            .get(name)
            .map(|d| d.object_handles())
            .unwrap_or_default()
    }

    /// Handle for one advertised object instance
    pub async fn object_handle(
        &self,
        name: &str,
        object_id: u16,
        instance_id: u8,
    ) -> Option<ObjectHandle> {
        let state = self.inner.state.lock().await;
        state
            .directory
            .get(name)
            .and_then(|d| d.object_handle(object_id, instance_id))
    }

    /// Handles for the resources of one advertised object instance
    pub async fn resource_handles(&self, object: &ObjectHandle) -> Vec<ResourceHandle> {
        let state = self.inner.state.lock().await;
        state
            .directory
            .get(object.device_name())
            .map(|d| d.resource_handles(object.object_id(), object.instance_id()))
            .unwrap_or_default()
    }

    /// Handle for one advertised resource
    pub async fn resource_handle(
        &self,
        name: &str,
        object_id: u16,
        instance_id: u8,
        resource_id: u16,
    ) -> Option<ResourceHandle> {
        let state = self.inner.state.lock().await;
        state
            .directory
            .get(name)
            .and_then(|d| d.resource_handle(object_id, instance_id, resource_id))
    }

    /// Names and cleanup deadlines of the devices on the delete grace list
    pub async fn grace_list(&self) -> Vec<(String, Instant)> {
        let state = self.inner.state.lock().await;
        state
            .grace
            .iter()
            .map(|e| (e.device().name().to_string(), e.deadline()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Device management
    // ------------------------------------------------------------------

    /// Read a resource, blocking until the response arrives
    ///
    /// Returns the decoded records of a 2.05 Content response.
    ///
    /// # Errors
    /// `Transaction` carries any non-Content response status; submission
    /// failures and the blocking deadline surface as their own variants.
    pub async fn read(&self, resource: &ResourceHandle) -> Lwm2mResult<Vec<DataRecord>> {
        let slot = shared_slot();
        self.submit_read(resource, &slot).await?;
        self.wait_for_slot(&slot).await?;

        let guard = slot.lock().await;
        match guard.status() {
            SlotStatus::Done(CoapStatus::Content) => Ok(guard.records.clone()),
            SlotStatus::Done(status) => Err(Lwm2mError::Transaction(status)),
            SlotStatus::Pending => Err(Lwm2mError::Timeout),
        }
    }

    /// Submit a read and return immediately
    ///
    /// The caller owns the slot; it completes when the response arrives.
    pub async fn read_with_slot(
        &self,
        resource: &ResourceHandle,
        slot: SharedSlot,
    ) -> Lwm2mResult<()> {
        self.submit_read(resource, &slot).await
    }

    /// Write a plain-text value to a resource, blocking until the response
    /// arrives
    pub async fn write(&self, resource: &ResourceHandle, value: &str) -> Lwm2mResult<()> {
        let slot = shared_slot();
        self.submit_write(resource, value, &slot).await?;
        self.wait_for_slot(&slot).await?;

        let guard = slot.lock().await;
        match guard.status() {
            SlotStatus::Done(CoapStatus::Changed) => Ok(()),
            SlotStatus::Done(status) => Err(Lwm2mError::Transaction(status)),
            SlotStatus::Pending => Err(Lwm2mError::Timeout),
        }
    }

    /// Submit a write and return immediately
    pub async fn write_with_slot(
        &self,
        resource: &ResourceHandle,
        value: &str,
        slot: SharedSlot,
    ) -> Lwm2mResult<()> {
        self.submit_write(resource, value, &slot).await
    }

    /// Start or cancel an observation of a single resource
    pub async fn observe_resource(
        &self,
        resource: &ResourceHandle,
        enable: bool,
    ) -> Lwm2mResult<()> {
        self.observe_target(ObserveTarget::Resource(resource.clone()), enable)
            .await
    }

    /// Start or cancel an observation of a whole object instance
    ///
    /// Notifications fan out to the observers of every resource the object
    /// currently advertises, matched by resource id.
    pub async fn observe_object(&self, object: &ObjectHandle, enable: bool) -> Lwm2mResult<()> {
        self.observe_target(ObserveTarget::Object(object.clone()), enable)
            .await
    }

    /// Check whether a resource observation is active
    pub async fn resource_observed(&self, resource: &ResourceHandle) -> bool {
        let state = self.inner.state.lock().await;
        state
            .observations
            .is_observed(&ObserveTarget::Resource(resource.clone()))
    }

    /// Check whether an object observation is active
    pub async fn object_observed(&self, object: &ObjectHandle) -> bool {
        let state = self.inner.state.lock().await;
        state
            .observations
            .is_observed(&ObserveTarget::Object(object.clone()))
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register a lifecycle observer; registering twice is a no-op
    pub async fn register_observer(&self, observer: Arc<dyn ServerObserver>) {
        let mut state = self.inner.state.lock().await;
        if !state.observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            state.observers.push(observer);
        }
    }

    /// Deregister a lifecycle observer; returns whether it was registered
    pub async fn deregister_observer(&self, observer: &Arc<dyn ServerObserver>) -> bool {
        let mut state = self.inner.state.lock().await;
        let before = state.observers.len();
        state.observers.retain(|o| !Arc::ptr_eq(o, observer));
        state.observers.len() != before
    }

    /// Attach an observer to a resource
    ///
    /// The resource may belong to a registered device or to one still on the
    /// delete grace list.
    pub async fn register_resource_observer(
        &self,
        resource: &ResourceHandle,
        observer: Arc<dyn ResourceObserver>,
    ) -> Lwm2mResult<()> {
        let mut state = self.inner.state.lock().await;
        let entry = Self::resource_entry_mut(&mut state, resource)
            .ok_or_else(|| Lwm2mError::UnknownTarget(resource.uri().to_string()))?;
        entry.register_observer(observer);
        Ok(())
    }

    /// Detach an observer from a resource; returns whether it was attached
    pub async fn deregister_resource_observer(
        &self,
        resource: &ResourceHandle,
        observer: &Arc<dyn ResourceObserver>,
    ) -> Lwm2mResult<bool> {
        let mut state = self.inner.state.lock().await;
        let entry = Self::resource_entry_mut(&mut state, resource)
            .ok_or_else(|| Lwm2mError::UnknownTarget(resource.uri().to_string()))?;
        Ok(entry.deregister_observer(observer))
    }

    /// Check whether a resource has observers attached
    pub async fn has_observer(&self, resource: &ResourceHandle) -> bool {
        let state = self.inner.state.lock().await;
        Self::resource_entry(&state, resource).map_or(false, Resource::has_observer)
    }

    // ------------------------------------------------------------------
    // Submission and waiting
    // ------------------------------------------------------------------

    async fn submit_read(&self, resource: &ResourceHandle, slot: &SharedSlot) -> Lwm2mResult<()> {
        let mut state = self.inner.state.lock().await;
        if !state.alive {
            return Err(Lwm2mError::NotRunning);
        }
        let client = Self::client_for(&state, resource.device_name())?;

        slot.lock().await.arm();
        let token = state.tokens.next_token();
        state.transactions.insert(token, slot.clone());
        if let Err(e) = state.engine.dm_read(client, resource.uri(), token) {
            state.transactions.take(token);
            return Err(e);
        }
        Ok(())
    }

    async fn submit_write(
        &self,
        resource: &ResourceHandle,
        value: &str,
        slot: &SharedSlot,
    ) -> Lwm2mResult<()> {
        let mut state = self.inner.state.lock().await;
        if !state.alive {
            return Err(Lwm2mError::NotRunning);
        }
        let client = Self::client_for(&state, resource.device_name())?;

        slot.lock().await.arm();
        let token = state.tokens.next_token();
        state.transactions.insert(token, slot.clone());
        let payload = Bytes::copy_from_slice(value.as_bytes());
        if let Err(e) = state.engine.dm_write(
            client,
            resource.uri(),
            MediaType::TextPlain,
            payload,
            token,
        ) {
            state.transactions.take(token);
            return Err(e);
        }
        Ok(())
    }

    async fn observe_target(&self, target: ObserveTarget, enable: bool) -> Lwm2mResult<()> {
        let slot = {
            let mut state = self.inner.state.lock().await;
            if !state.alive {
                return Err(Lwm2mError::NotRunning);
            }
            let client = Self::client_for(&state, target.device_name())?;
            let uri = target.uri();

            if enable {
                if state.observations.is_observed(&target) {
                    // One entry, one in-flight protocol observe
                    return Ok(());
                }
                let token = state.tokens.next_token();
                let slot = shared_slot();
                state.observations.insert(ObservationEntry {
                    token,
                    target: target.clone(),
                    slot: slot.clone(),
                });
                if let Err(e) = state.engine.observe(client, uri, token) {
                    state.observations.remove(&target);
                    return Err(e);
                }
                slot
            } else {
                let entry = state
                    .observations
                    .get(&target)
                    .ok_or(Lwm2mError::NotObserved)?;
                let token = entry.token;
                let slot = entry.slot.clone();
                // Re-arm so the wait sees the cancel acknowledgement, not a
                // stale notification status
                slot.lock().await.arm();
                state.engine.cancel_observe(client, uri, token)?;
                slot
            }
        };

        if let Err(e) = self.wait_for_slot(&slot).await {
            if enable {
                let mut state = self.inner.state.lock().await;
                state.observations.remove(&target);
            }
            return Err(e);
        }

        let status = slot.lock().await.status();
        let mut state = self.inner.state.lock().await;
        match status {
            SlotStatus::Done(CoapStatus::NoError) => {
                if !enable {
                    state.observations.remove(&target);
                }
                Ok(())
            }
            SlotStatus::Done(status) => {
                if enable {
                    state.observations.remove(&target);
                }
                // A failed cancel leaves the entry; retrying is permitted
                Err(Lwm2mError::Transaction(status))
            }
            SlotStatus::Pending => Err(Lwm2mError::Timeout),
        }
    }

    /// Spin until the slot completes or the blocking deadline elapses
    ///
    /// Never holds the server lock across a wait. Without a driver task each
    /// spin pumps one loop iteration; with one it sleeps a quantum.
    async fn wait_for_slot(&self, slot: &SharedSlot) -> Lwm2mResult<()> {
        let deadline = Instant::now() + self.inner.config.blocking_deadline;
        loop {
            if !slot.lock().await.is_pending() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Lwm2mError::Timeout);
            }
            if self.inner.running.load(Ordering::SeqCst) {
                tokio::time::sleep(self.inner.config.poll_quantum).await;
            } else {
                match self.step().await {
                    Ok(()) => {}
                    Err(Lwm2mError::NotRunning) => return Err(Lwm2mError::NotRunning),
                    Err(e) => {
                        log::debug!("Loop iteration failed during wait: {}", e);
                        tokio::time::sleep(self.inner.config.poll_quantum).await;
                    }
                }
            }
        }
    }

    fn client_for(state: &ServerState, name: &str) -> Lwm2mResult<u16> {
        state
            .directory
            .get(name)
            .map(|d| d.internal_id())
            .ok_or_else(|| Lwm2mError::UnknownClient(name.to_string()))
    }

    fn resource_entry<'a>(state: &'a ServerState, handle: &ResourceHandle) -> Option<&'a Resource> {
        let in_directory = state
            .directory
            .get(handle.device_name())
            .map_or(false, |d| d.matches(handle.device_key()));
        let device = if in_directory {
            state.directory.get(handle.device_name())
        } else {
            state.grace.get(handle.device_key())
        };
        device?
            .object(handle.object_id(), handle.instance_id())?
            .resource(handle.resource_id())
    }

    fn resource_entry_mut<'a>(
        state: &'a mut ServerState,
        handle: &ResourceHandle,
    ) -> Option<&'a mut Resource> {
        let in_directory = state
            .directory
            .get(handle.device_name())
            .map_or(false, |d| d.matches(handle.device_key()));
        let device = if in_directory {
            state.directory.get_mut(handle.device_name())
        } else {
            state.grace.get_mut(handle.device_key())
        };
        device?
            .object_mut(handle.object_id(), handle.instance_id())?
            .resource_mut(handle.resource_id())
    }

    // ------------------------------------------------------------------
    // Loop internals
    // ------------------------------------------------------------------

    fn deliver_events(state: &mut ServerState) {
        while let Some(event) = state.events.pop() {
            for observer in &state.observers {
                observer.on_device_event(&event);
            }
        }
    }

    fn sweep_grace(state: &mut ServerState, now: Instant) {
        for device in state.grace.sweep(now) {
            let purged = state.observations.purge_device(&device.key());
            log::debug!(
                "Device {} left the delete grace list ({} observations purged)",
                device.name(),
                purged
            );
        }
    }

    async fn drain_engine_events(state: &mut ServerState) {
        while let Some(event) = state.engine.poll_event() {
            match event {
                EngineEvent::Registration { client, status } => {
                    Self::handle_registration(state, client, status, Instant::now());
                }
                EngineEvent::DmResult {
                    client,
                    uri,
                    status,
                    format,
                    payload,
                    token,
                } => {
                    Self::handle_dm_result(state, client, uri, status, format, payload, token)
                        .await;
                }
                EngineEvent::Notification {
                    client,
                    uri,
                    status,
                    format,
                    payload,
                    token,
                } => {
                    Self::handle_notification(state, client, uri, status, format, payload, token)
                        .await;
                }
            }
        }
    }

    fn handle_registration(state: &mut ServerState, client: u16, status: CoapStatus, now: Instant) {
        match status {
            CoapStatus::Created => {
                let Some(info) = state.engine.client_info(client) else {
                    log::warn!("Registration for unknown client {} dropped", client);
                    return;
                };
                let (_, displaced) = state.directory.register(&info, now);
                if let Some(old) = displaced {
                    state
                        .events
                        .push(DeviceEvent::new(old.name(), DeviceEventKind::Deregistered));
                    state.grace.push(old, now);
                }
                state
                    .events
                    .push(DeviceEvent::new(&info.name, DeviceEventKind::Registered));
            }
            CoapStatus::Deleted => {
                let Some(device) = state.directory.remove_by_internal_id(client) else {
                    log::debug!("Deregistration for unknown client {} dropped", client);
                    return;
                };
                state
                    .events
                    .push(DeviceEvent::new(device.name(), DeviceEventKind::Deregistered));
                state.grace.push(device, now);
            }
            CoapStatus::Changed => {
                let lifetime = state.engine.client_info(client).map(|i| i.lifetime);
                let Some(device) = state.directory.get_by_internal_id_mut(client) else {
                    log::debug!("Registration update for unknown client {} dropped", client);
                    return;
                };
                device.refresh(lifetime, now);
                let name = device.name().to_string();
                state
                    .events
                    .push(DeviceEvent::new(&name, DeviceEventKind::Updated));
                log::debug!("Device {} refreshed its registration", name);
            }
            other => {
                log::debug!("Unhandled monitoring status {} dropped", other);
            }
        }
    }

    async fn handle_dm_result(
        state: &mut ServerState,
        client: u16,
        uri: Uri,
        status: CoapStatus,
        format: MediaType,
        payload: Bytes,
        token: CorrelationToken,
    ) {
        let Some(slot) = state.transactions.take(token) else {
            log::debug!("DM response with unknown correlation dropped ({})", uri);
            return;
        };
        let mut guard = slot.lock().await;
        guard.complete(client, uri, status, format, payload.clone());

        if !status.has_content() {
            return;
        }
        // Decode for the caller only while the resource still resolves
        let Some(device) = state.directory.get_by_internal_id(client) else {
            log::debug!("DM response for unknown client {} left undecoded", client);
            return;
        };
        let Some(instance_id) = uri.instance_id() else {
            return;
        };
        let known = uri.resource_id().is_some_and(|rid| {
            device
                .object(uri.object_id(), instance_id)
                .and_then(|o| o.resource(rid))
                .is_some()
        });
        if !known {
            return;
        }
        match state.engine.parse(&uri, &payload, format) {
            Ok(records) => guard.records = records,
            Err(e) => log::debug!("Failed to decode response for {}: {}", uri, e),
        }
    }

    async fn handle_notification(
        state: &mut ServerState,
        client: u16,
        uri: Uri,
        status: CoapStatus,
        format: MediaType,
        payload: Bytes,
        token: CorrelationToken,
    ) {
        let Some(target) = state.observations.target_for_token(token) else {
            log::debug!("Notification with unknown correlation dropped ({})", uri);
            return;
        };
        let Some(entry) = state.observations.get(&target) else {
            return;
        };
        let slot = entry.slot.clone();
        slot.lock()
            .await
            .complete(client, uri, status, format, payload.clone());

        if !status.has_content() || payload.is_empty() {
            // Establishment and cancel acknowledgements carry no value
            return;
        }
        let Some(device) = state.directory.get_by_internal_id(client) else {
            log::debug!("Notification for unknown client {} dropped", client);
            return;
        };
        let Some(instance_id) = uri.instance_id() else {
            return;
        };
        let Some(object) = device.object(uri.object_id(), instance_id) else {
            log::debug!("Notification for unknown object {} dropped", uri);
            return;
        };

        match &target {
            ObserveTarget::Resource(_) => {
                let Some(resource_id) = uri.resource_id() else {
                    return;
                };
                let Some(resource) = object.resource(resource_id) else {
                    log::debug!("Notification for unknown resource {} dropped", uri);
                    return;
                };
                let records = match state.engine.parse(&uri, &payload, format) {
                    Ok(records) => records,
                    Err(e) => {
                        log::debug!("Unparseable notification for {} dropped: {}", uri, e);
                        return;
                    }
                };
                let Some(record) = records.into_iter().next() else {
                    return;
                };
                slot.lock().await.records = vec![record.clone()];
                let notification = ResourceNotification::new(device.name(), uri, record);
                resource.notify(&notification);
            }
            ObserveTarget::Object(_) => {
                let records = match state.engine.parse(&uri, &payload, format) {
                    Ok(records) => records,
                    Err(e) => {
                        log::debug!("Unparseable notification for {} dropped: {}", uri, e);
                        return;
                    }
                };
                slot.lock().await.records = records.clone();
                for resource in object.resources() {
                    for record in &records {
                        if record.id == resource.resource_id() {
                            let resource_uri =
                                Uri::resource(uri.object_id(), instance_id, record.id);
                            let notification = ResourceNotification::new(
                                device.name(),
                                resource_uri,
                                record.clone(),
                            );
                            resource.notify(&notification);
                        }
                    }
                }
            }
        }
    }
}
