//! Server configuration

use lwm2m_transport::AddressFamily;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the server loop is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveMode {
    /// `start()` spawns a dedicated driver task that pumps the loop
    Spawned,
    /// The caller pumps `step()`; blocking operations drive the loop
    /// themselves while they wait
    CallerDriven,
}

/// Configuration of an LWM2M server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// UDP listen port
    pub port: String,
    /// Address family of the listen socket
    pub address_family: AddressFamily,
    /// Loop driving mode
    pub drive: DriveMode,
    /// Time budget handed to the engine step each iteration
    pub step_budget: Duration,
    /// Sleep quantum between polls of a blocking operation
    pub poll_quantum: Duration,
    /// Hard deadline for blocking Read/Write/Observe calls
    pub blocking_deadline: Duration,
}

impl ServerConfig {
    /// Configuration with the standard CoAP port
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen port
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    /// Set the address family
    pub fn with_address_family(mut self, family: AddressFamily) -> Self {
        self.address_family = family;
        self
    }

    /// Set the drive mode
    pub fn with_drive(mut self, drive: DriveMode) -> Self {
        self.drive = drive;
        self
    }

    /// Set the engine step budget
    pub fn with_step_budget(mut self, budget: Duration) -> Self {
        self.step_budget = budget;
        self
    }

    /// Set the blocking-call deadline
    pub fn with_blocking_deadline(mut self, deadline: Duration) -> Self {
        self.blocking_deadline = deadline;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: "5683".to_string(),
            address_family: AddressFamily::Ipv4,
            drive: DriveMode::Spawned,
            step_budget: Duration::from_millis(100),
            poll_quantum: Duration::from_millis(5),
            blocking_deadline: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, "5683");
        assert_eq!(config.address_family, AddressFamily::Ipv4);
        assert_eq!(config.drive, DriveMode::Spawned);
        assert_eq!(config.step_budget, Duration::from_millis(100));
        assert_eq!(config.blocking_deadline, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = ServerConfig::new()
            .with_port("0")
            .with_address_family(AddressFamily::Ipv6)
            .with_drive(DriveMode::CallerDriven)
            .with_step_budget(Duration::from_millis(10))
            .with_blocking_deadline(Duration::from_secs(2));

        assert_eq!(config.port, "0");
        assert_eq!(config.address_family, AddressFamily::Ipv6);
        assert_eq!(config.drive, DriveMode::CallerDriven);
        assert_eq!(config.step_budget, Duration::from_millis(10));
        assert_eq!(config.blocking_deadline, Duration::from_secs(2));
    }
}
