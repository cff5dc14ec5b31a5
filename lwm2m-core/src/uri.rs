use crate::error::{Lwm2mError, Lwm2mResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// LWM2M URI addressing an Object, an Object Instance, or a Resource
///
/// LWM2M addresses client state with up to three path segments:
/// `/object/instance/resource`. The instance and resource segments are
/// optional; which segments are present decides the scope of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    object_id: u16,
    instance_id: Option<u8>,
    resource_id: Option<u16>,
}

impl Uri {
    /// Create an Object-level URI (`/3`)
    pub fn object(object_id: u16) -> Self {
        Self {
            object_id,
            instance_id: None,
            resource_id: None,
        }
    }

    /// Create an Object-Instance-level URI (`/3/0`)
    pub fn instance(object_id: u16, instance_id: u8) -> Self {
        Self {
            object_id,
            instance_id: Some(instance_id),
            resource_id: None,
        }
    }

    /// Create a Resource-level URI (`/3/0/0`)
    pub fn resource(object_id: u16, instance_id: u8, resource_id: u16) -> Self {
        Self {
            object_id,
            instance_id: Some(instance_id),
            resource_id: Some(resource_id),
        }
    }

    /// Parse a URI from its path form, with or without a leading slash
    ///
    /// Supports "3", "3/0" and "3/0/0".
    pub fn from_string(s: &str) -> Lwm2mResult<Self> {
        let trimmed = s.trim_start_matches('/');
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.is_empty() || parts.len() > 3 || parts[0].is_empty() {
            return Err(Lwm2mError::InvalidData(format!("Invalid URI path: {}", s)));
        }

        let object_id = parts[0]
            .parse::<u16>()
            .map_err(|_| Lwm2mError::InvalidData(format!("Invalid object id: {}", parts[0])))?;

        let instance_id = match parts.get(1) {
            Some(p) => Some(
                p.parse::<u8>()
                    .map_err(|_| Lwm2mError::InvalidData(format!("Invalid instance id: {}", p)))?,
            ),
            None => None,
        };

        let resource_id = match parts.get(2) {
            Some(p) => Some(
                p.parse::<u16>()
                    .map_err(|_| Lwm2mError::InvalidData(format!("Invalid resource id: {}", p)))?,
            ),
            None => None,
        };

        Ok(Self {
            object_id,
            instance_id,
            resource_id,
        })
    }

    /// Get the Object ID
    pub fn object_id(&self) -> u16 {
        self.object_id
    }

    /// Get the Instance ID, if the URI addresses an instance
    pub fn instance_id(&self) -> Option<u8> {
        self.instance_id
    }

    /// Get the Resource ID, if the URI addresses a resource
    pub fn resource_id(&self) -> Option<u16> {
        self.resource_id
    }

    /// Check whether the instance segment is present
    pub fn has_instance(&self) -> bool {
        self.instance_id.is_some()
    }

    /// Check whether the resource segment is present
    pub fn has_resource(&self) -> bool {
        self.resource_id.is_some()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.object_id)?;
        if let Some(instance_id) = self.instance_id {
            write!(f, "/{}", instance_id)?;
        }
        if let Some(resource_id) = self.resource_id {
            write!(f, "/{}", resource_id)?;
        }
        Ok(())
    }
}
