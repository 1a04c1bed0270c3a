// SPDX-License-Identifier: GPL-3.0-only
//! Input devices known to the server

mod registry;

pub use registry::DeviceRegistry;

use crate::attributes::Attribute;

/// Opaque device handle, unique for the lifetime of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) u32);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which collection a device lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Currently active
    Enabled,
    /// Administratively disabled
    Disabled,
}

#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Identifier assigned by the hotplug backend that created the device.
    /// `None` for devices that were not hotplugged.
    pub config_info: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl Device {
    /// True if this device was created from the given backend identifier
    ///
    /// Devices without an identifier never match.
    pub fn matches(&self, config_info: &str) -> bool {
        self.config_info.as_deref() == Some(config_info)
    }
}
