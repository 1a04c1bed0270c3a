// SPDX-License-Identifier: GPL-3.0-only
//! Hotplug backends
//!
//! A backend detects device arrival and removal for one OS mechanism. Exactly
//! one backend is active per server; it is picked from [`BackendKind`] when the
//! settings are loaded and injected into [`crate::hotplug::HotplugConfig`].

#[cfg(feature = "dbus")]
mod dbus;
#[cfg(feature = "udev")]
mod udev;
mod wscons;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::attributes::AttributeList;
use crate::config::Config;
use crate::error::Result;

#[cfg(feature = "dbus")]
pub use dbus::DBusBackend;
#[cfg(feature = "udev")]
pub use udev::UdevBackend;
pub use wscons::WsconsBackend;

/// Everything device creation needs to know about a discovered device
#[derive(Debug)]
pub struct DeviceDescription {
    /// Backend identifier stored on the created device
    pub config_info: String,
    pub name: String,
    pub attributes: AttributeList,
}

/// Notification sent from a backend to the main loop
#[derive(Debug)]
pub enum HotplugEvent {
    Added(DeviceDescription),
    Removed { config_info: String },
}

/// Capability interface implemented by every backend
pub trait HotplugBackend {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Early setup, before the rest of the server is initialised
    fn pre_init(&mut self) -> Result<()> {
        Ok(())
    }

    fn init(&mut self) -> Result<()>;

    /// Teardown. Must not fail.
    fn fini(&mut self);

    /// Synchronously enumerate devices that are already present
    fn probe(&mut self, _callback: &mut dyn FnMut(DeviceDescription)) {}

    /// Start forwarding hotplug events to the main loop
    fn listen(&mut self, _events: Sender<HotplugEvent>) -> Result<()> {
        Ok(())
    }
}

/// Available backend variants
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Udev,
    DBus,
    Hal,
    Wscons,
    None,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "udev") {
            BackendKind::Udev
        } else {
            BackendKind::None
        }
    }
}

/// Build the backend selected in the settings
///
/// Falls back to [`NoBackend`] when the requested variant was not compiled in.
pub fn from_kind(kind: BackendKind, config: &Config) -> Box<dyn HotplugBackend> {
    match kind {
        #[cfg(feature = "udev")]
        BackendKind::Udev => Box::new(UdevBackend::new()),
        #[cfg(feature = "dbus")]
        BackendKind::DBus => Box::new(DBusBackend::api(config.display)),
        #[cfg(feature = "dbus")]
        BackendKind::Hal => Box::new(DBusBackend::hal()),
        BackendKind::Wscons => Box::new(WsconsBackend::new()),
        BackendKind::None => Box::new(NoBackend),
        #[allow(unreachable_patterns)]
        other => {
            let _ = config;
            warn!("{:?} backend not compiled in, hotplug disabled", other);
            Box::new(NoBackend)
        }
    }
}

/// Backend used when hotplugging is unavailable; every operation is a no-op
#[derive(Debug, Default)]
pub struct NoBackend;

impl HotplugBackend for NoBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn fini(&mut self) {}
}
