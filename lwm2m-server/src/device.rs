//! Device inventory: registered clients with their object and resource trees
//!
//! # Ownership
//! The server owns its devices, a device owns its object instances, an
//! object instance owns its resources. Application code never holds
//! references into this tree; it holds value handles carrying the device
//! key and the numeric ids, so a handle outliving its device degrades into
//! a lookup miss instead of a dangling reference.
//!
//! # Generations
//! A device key pairs the stable endpoint name with a generation counter
//! bumped on every registration. A handle taken before a client rebooted
//! therefore never aliases the tree built by the replacement registration.

use crate::observer::{ResourceNotification, ResourceObserver};
use lwm2m_core::Uri;
use lwm2m_engine::{ClientInfo, ObjectInfo, ResourceInfo};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity of one registration of a device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    name: String,
    generation: u64,
}

impl DeviceKey {
    /// Stable endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to an Object Instance of a registered device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    device: DeviceKey,
    object_id: u16,
    instance_id: u8,
}

impl ObjectHandle {
    /// Key of the registration the handle was taken from
    pub fn device_key(&self) -> &DeviceKey {
        &self.device
    }

    /// Endpoint name of the device
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Object ID
    pub fn object_id(&self) -> u16 {
        self.object_id
    }

    /// Instance ID
    pub fn instance_id(&self) -> u8 {
        self.instance_id
    }

    /// Instance-level URI of the object
    pub fn uri(&self) -> Uri {
        Uri::instance(self.object_id, self.instance_id)
    }
}

/// Handle to a Resource of a registered device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    device: DeviceKey,
    object_id: u16,
    instance_id: u8,
    resource_id: u16,
}

impl ResourceHandle {
    /// Key of the registration the handle was taken from
    pub fn device_key(&self) -> &DeviceKey {
        &self.device
    }

    /// Endpoint name of the device
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Object ID
    pub fn object_id(&self) -> u16 {
        self.object_id
    }

    /// Instance ID
    pub fn instance_id(&self) -> u8 {
        self.instance_id
    }

    /// Resource ID
    pub fn resource_id(&self) -> u16 {
        self.resource_id
    }

    /// Handle of the parent object
    pub fn object_handle(&self) -> ObjectHandle {
        ObjectHandle {
            device: self.device.clone(),
            object_id: self.object_id,
            instance_id: self.instance_id,
        }
    }

    /// Resource-level URI
    pub fn uri(&self) -> Uri {
        Uri::resource(self.object_id, self.instance_id, self.resource_id)
    }
}

/// A leaf resource within an object instance
pub struct Resource {
    resource_id: u16,
    readable: bool,
    writable: bool,
    executable: bool,
    observers: Vec<Arc<dyn ResourceObserver>>,
}

impl Resource {
    fn from_info(info: &ResourceInfo) -> Self {
        Self {
            resource_id: info.resource_id,
            readable: info.readable,
            writable: info.writable,
            executable: info.executable,
            observers: Vec::new(),
        }
    }

    /// Resource ID
    pub fn resource_id(&self) -> u16 {
        self.resource_id
    }

    /// Advertised read capability
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Advertised write capability
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Advertised execute capability
    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// Attach an observer; registering the same observer twice is a no-op
    pub fn register_observer(&mut self, observer: Arc<dyn ResourceObserver>) {
        if !self.observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            self.observers.push(observer);
        }
    }

    /// Detach an observer; returns whether it was attached
    pub fn deregister_observer(&mut self, observer: &Arc<dyn ResourceObserver>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !Arc::ptr_eq(o, observer));
        self.observers.len() != before
    }

    /// Check whether any observer is attached
    pub fn has_observer(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Deliver a notification to every attached observer
    pub(crate) fn notify(&self, notification: &ResourceNotification) {
        for observer in &self.observers {
            observer.on_notification(notification);
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("resource_id", &self.resource_id)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("executable", &self.executable)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// One Object/Instance pair owned by a device
#[derive(Debug)]
pub struct ObjectInstance {
    object_id: u16,
    instance_id: u8,
    resources: Vec<Resource>,
}

impl ObjectInstance {
    fn from_info(info: &ObjectInfo) -> Self {
        Self {
            object_id: info.object_id,
            instance_id: info.instance_id,
            resources: info.resources.iter().map(Resource::from_info).collect(),
        }
    }

    /// Object ID
    pub fn object_id(&self) -> u16 {
        self.object_id
    }

    /// Instance ID
    pub fn instance_id(&self) -> u8 {
        self.instance_id
    }

    /// Look up a resource by id
    pub fn resource(&self, resource_id: u16) -> Option<&Resource> {
        self.resources.iter().find(|r| r.resource_id() == resource_id)
    }

    /// Look up a resource by id, mutably
    pub fn resource_mut(&mut self, resource_id: u16) -> Option<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|r| r.resource_id() == resource_id)
    }

    /// Resources in advertisement order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

/// A registered LWM2M client with its object tree
#[derive(Debug)]
pub struct Device {
    name: String,
    internal_id: u16,
    generation: u64,
    lifetime: u32,
    end_of_life: Instant,
    objects: Vec<ObjectInstance>,
}

impl Device {
    /// Build a device from the engine's registration snapshot
    pub fn from_registration(info: &ClientInfo, generation: u64, now: Instant) -> Self {
        Self {
            name: info.name.clone(),
            internal_id: info.internal_id,
            generation,
            lifetime: info.lifetime,
            end_of_life: now + Duration::from_secs(u64::from(info.lifetime)),
            objects: info.objects.iter().map(ObjectInstance::from_info).collect(),
        }
    }

    /// Endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ephemeral internal id assigned by the engine
    pub fn internal_id(&self) -> u16 {
        self.internal_id
    }

    /// Registration generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Key identifying this registration
    pub fn key(&self) -> DeviceKey {
        DeviceKey {
            name: self.name.clone(),
            generation: self.generation,
        }
    }

    /// Check whether a handle key refers to this registration
    pub fn matches(&self, key: &DeviceKey) -> bool {
        self.name == key.name && self.generation == key.generation
    }

    /// Advertised lifetime in seconds
    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    /// Wall-clock deadline after which the registration is stale
    pub fn end_of_life(&self) -> Instant {
        self.end_of_life
    }

    /// Refresh the registration, optionally with an updated lifetime
    pub fn refresh(&mut self, lifetime: Option<u32>, now: Instant) {
        if let Some(lifetime) = lifetime {
            self.lifetime = lifetime;
        }
        self.end_of_life = now + Duration::from_secs(u64::from(self.lifetime));
    }

    /// Look up an object instance by (object id, instance id)
    pub fn object(&self, object_id: u16, instance_id: u8) -> Option<&ObjectInstance> {
        self.objects
            .iter()
            .find(|o| o.object_id() == object_id && o.instance_id() == instance_id)
    }

    /// Look up an object instance mutably
    pub fn object_mut(&mut self, object_id: u16, instance_id: u8) -> Option<&mut ObjectInstance> {
        self.objects
            .iter_mut()
            .find(|o| o.object_id() == object_id && o.instance_id() == instance_id)
    }

    /// Object instances in advertisement order
    pub fn objects(&self) -> &[ObjectInstance] {
        &self.objects
    }

    /// Handles for every advertised object instance
    pub fn object_handles(&self) -> Vec<ObjectHandle> {
        let key = self.key();
        self.objects
            .iter()
            .map(|o| ObjectHandle {
                device: key.clone(),
                object_id: o.object_id(),
                instance_id: o.instance_id(),
            })
            .collect()
    }

    /// Handle for one advertised object instance
    pub fn object_handle(&self, object_id: u16, instance_id: u8) -> Option<ObjectHandle> {
        self.object(object_id, instance_id).map(|o| ObjectHandle {
            device: self.key(),
            object_id: o.object_id(),
            instance_id: o.instance_id(),
        })
    }

    /// Handles for every resource of one object instance
    pub fn resource_handles(&self, object_id: u16, instance_id: u8) -> Vec<ResourceHandle> {
        let key = self.key();
        match self.object(object_id, instance_id) {
            None => Vec::new(),
            Some(object) => object
                .resources()
                .iter()
                .map(|r| ResourceHandle {
                    device: key.clone(),
                    object_id,
                    instance_id,
                    resource_id: r.resource_id(),
                })
                .collect(),
        }
    }

    /// Handle for one advertised resource
    pub fn resource_handle(
        &self,
        object_id: u16,
        instance_id: u8,
        resource_id: u16,
    ) -> Option<ResourceHandle> {
        self.object(object_id, instance_id)
            .and_then(|o| o.resource(resource_id))
            .map(|r| ResourceHandle {
                device: self.key(),
                object_id,
                instance_id,
                resource_id: r.resource_id(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> ClientInfo {
        ClientInfo {
            internal_id: 7,
            name: "sensor-01".to_string(),
            lifetime: 60,
            objects: vec![ObjectInfo {
                object_id: 3,
                instance_id: 0,
                resources: vec![ResourceInfo::readable(0), ResourceInfo::readable(1)],
            }],
        }
    }

    #[test]
    fn test_device_from_registration() {
        let now = Instant::now();
        let device = Device::from_registration(&sample_info(), 1, now);

        assert_eq!(device.name(), "sensor-01");
        assert_eq!(device.internal_id(), 7);
        assert_eq!(device.lifetime(), 60);
        assert_eq!(device.end_of_life(), now + Duration::from_secs(60));
        assert!(device.object(3, 0).is_some());
        assert!(device.object(3, 1).is_none());
        assert!(device.object(3, 0).unwrap().resource(1).is_some());
    }

    #[test]
    fn test_refresh_moves_end_of_life() {
        let now = Instant::now();
        let mut device = Device::from_registration(&sample_info(), 1, now);

        let later = now + Duration::from_secs(30);
        device.refresh(Some(120), later);
        assert_eq!(device.lifetime(), 120);
        assert_eq!(device.end_of_life(), later + Duration::from_secs(120));
    }

    #[test]
    fn test_handles_follow_the_tree() {
        let device = Device::from_registration(&sample_info(), 2, Instant::now());

        let object = device.object_handle(3, 0).unwrap();
        assert_eq!(object.uri(), Uri::instance(3, 0));
        assert_eq!(object.device_key().generation(), 2);

        let resources = device.resource_handles(3, 0);
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].uri(), Uri::resource(3, 0, 0));
        assert_eq!(resources[0].object_handle(), object);

        assert!(device.resource_handle(3, 0, 9).is_none());
    }

    #[test]
    fn test_observer_registration_is_deduplicated() {
        struct Noop;
        impl ResourceObserver for Noop {
            fn on_notification(&self, _notification: &ResourceNotification) {}
        }

        let mut device = Device::from_registration(&sample_info(), 1, Instant::now());
        let resource = device.object_mut(3, 0).unwrap().resource_mut(0).unwrap();
        let observer: Arc<dyn ResourceObserver> = Arc::new(Noop);

        assert!(!resource.has_observer());
        resource.register_observer(observer.clone());
        resource.register_observer(observer.clone());
        assert!(resource.has_observer());

        assert!(resource.deregister_observer(&observer));
        assert!(!resource.deregister_observer(&observer));
        assert!(!resource.has_observer());
    }
}
