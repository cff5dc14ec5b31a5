//! Client directory
//!
//! In-memory inventory of registered devices, keyed by endpoint name. The
//! engine's internal ids are secondary and looked up with a linear scan;
//! device counts stay small enough that an index is not worth carrying.

use crate::device::{Device, DeviceKey};
use lwm2m_engine::ClientInfo;
use std::collections::HashMap;
use std::time::Instant;

/// Directory of registered devices
#[derive(Debug, Default)]
pub struct ClientDirectory {
    devices: HashMap<String, Device>,
    next_generation: u64,
}

impl ClientDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device from the engine's snapshot
    ///
    /// A client rebooting re-registers under its old name; the previous
    /// entry is displaced and returned so the caller can move it to the
    /// delete grace list.
    pub fn register(&mut self, info: &ClientInfo, now: Instant) -> (DeviceKey, Option<Device>) {
        self.next_generation += 1;
        let device = Device::from_registration(info, self.next_generation, now);
        let key = device.key();

        let displaced = self.devices.remove(&info.name);
        if displaced.is_some() {
            log::info!("Device {} re-registered, replacing old entry", info.name);
        } else {
            log::info!("Device {} registered", info.name);
        }
        self.devices.insert(info.name.clone(), device);
        (key, displaced)
    }

    /// Remove a device by the engine's internal id
    pub fn remove_by_internal_id(&mut self, internal_id: u16) -> Option<Device> {
        let name = self
            .devices
            .values()
            .find(|d| d.internal_id() == internal_id)
            .map(|d| d.name().to_string())?;
        let device = self.devices.remove(&name);
        log::info!("Device {} deregistered", name);
        device
    }

    /// Check whether a device with the given name is registered
    pub fn has(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Look up a device by name
    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Look up a device by name, mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.get_mut(name)
    }

    /// Look up a device by the engine's internal id (linear scan)
    pub fn get_by_internal_id(&self, internal_id: u16) -> Option<&Device> {
        self.devices
            .values()
            .find(|d| d.internal_id() == internal_id)
    }

    /// Look up a device by the engine's internal id, mutably
    pub fn get_by_internal_id_mut(&mut self, internal_id: u16) -> Option<&mut Device> {
        self.devices
            .values_mut()
            .find(|d| d.internal_id() == internal_id)
    }

    /// Iterate over the registered devices
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Registered endpoint names
    pub fn names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
