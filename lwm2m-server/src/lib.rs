//! LWM2M server core
//!
//! This crate implements the long-running protocol engine of an LWM2M
//! server: it accepts client registrations over CoAP/UDP, maintains a live
//! inventory of each client's Objects, Object Instances and Resources,
//! dispatches Read / Write / Observe / Cancel-Observe operations against
//! those resources and delivers notifications to in-process subscribers.
//!
//! # Architecture
//!
//! - [`registry::ClientDirectory`]: name-keyed inventory of registered
//!   devices and their object trees
//! - [`observation`]: transaction slots for Read/Write correlation and the
//!   registry of active observations
//! - [`lifecycle`]: queue of Registered / Deregistered / Updated events and
//!   the delete grace list absorbing late callbacks
//! - [`server::Lwm2mServer`]: the loop driving the protocol engine and the
//!   public device-management API
//!
//! The raw CoAP machinery is behind the `lwm2m-engine` binding; the UDP
//! socket is behind `lwm2m-transport`.

pub mod config;
pub mod device;
pub mod lifecycle;
pub mod observation;
pub mod observer;
pub mod registry;
pub mod server;

pub use config::{DriveMode, ServerConfig};
pub use device::{Device, DeviceKey, ObjectHandle, ObjectInstance, Resource, ResourceHandle};
pub use observation::{
    shared_slot, ObservationEntry, ObservationRegistry, ObserveTarget, SharedSlot, SlotStatus,
    TransactionSlot, TransactionTable,
};
pub use observer::{
    DeviceEvent, DeviceEventKind, ResourceNotification, ResourceObserver, ServerObserver,
};
pub use registry::ClientDirectory;
pub use server::Lwm2mServer;
