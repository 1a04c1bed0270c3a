// SPDX-License-Identifier: GPL-3.0-only
//! Hotplug lifecycle dispatch
//!
//! [`HotplugConfig`] forwards the server's startup and shutdown hooks to the
//! single active backend. Hotplugging is best effort: failures are logged and
//! the server carries on without it.

mod subscription;
#[cfg(feature = "udev")]
mod udev_monitor;

pub use subscription::{HotplugSession, OutputDevice};
#[cfg(feature = "udev")]
pub(crate) use udev_monitor::UdevMonitor;

use tokio::sync::mpsc::Sender;

use crate::backend::{DeviceDescription, HotplugBackend, HotplugEvent, NoBackend};
use crate::error::ConfigError;

pub struct HotplugConfig {
    backend: Box<dyn HotplugBackend>,
}

impl HotplugConfig {
    pub fn new(backend: Box<dyn HotplugBackend>) -> Self {
        Self { backend }
    }

    /// Name of the active backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn pre_init(&mut self) {
        if let Err(err) = self.backend.pre_init() {
            error!("[config] failed to pre-init {}: {}", self.backend.name(), err);
        }
    }

    pub fn init(&mut self) {
        match self.backend.init() {
            Ok(()) => debug!("[config] {} backend initialised", self.backend.name()),
            Err(err @ ConfigError::BackendInit { .. }) => error!("[config] {}", err),
            Err(err) => error!("[config] failed to initialise {}: {}", self.backend.name(), err),
        }
    }

    pub fn fini(&mut self) {
        self.backend.fini();
    }

    /// Report devices that already exist, once each, through `callback`
    pub fn odev_probe<F>(&mut self, mut callback: F)
    where
        F: FnMut(DeviceDescription),
    {
        self.backend.probe(&mut callback);
    }

    /// Start sending hotplug events to the main loop
    pub fn listen(&mut self, events: Sender<HotplugEvent>) {
        if let Err(err) = self.backend.listen(events) {
            error!("[config] failed to listen for {} events: {}", self.backend.name(), err);
        }
    }
}

impl Default for HotplugConfig {
    fn default() -> Self {
        Self::new(Box::new(NoBackend))
    }
}
