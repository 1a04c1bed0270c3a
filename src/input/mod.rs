// SPDX-License-Identifier: GPL-3.0-only
//! Boundary to the server's input device subsystem
//!
//! The subsystem owns device creation, event processing and device deletion.
//! Hotplug code only drives it through [`InputSubsystem`].

mod gate;
mod queue;

pub use gate::{EventDeferral, EventGate};
pub use queue::QueuedInput;

use crate::backend::DeviceDescription;
use crate::devices::{Device, DeviceId, DeviceRegistry};
use crate::error::Result;

/// A raw input event addressed to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub device: DeviceId,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

/// Operations hotplug code needs from the input subsystem
pub trait InputSubsystem {
    /// Gate consulted by the event delivery path
    fn gate(&self) -> &EventGate;

    /// Process every event queued so far. Returns how many were dispatched.
    fn process_input_events(&mut self, registry: &DeviceRegistry) -> usize;

    /// Remove a device from whichever collection holds it and release it
    fn delete_input_device(&mut self, registry: &mut DeviceRegistry, id: DeviceId)
    -> Result<Device>;

    /// Create a device from a backend description, consuming its attribute list
    fn new_input_device(
        &mut self,
        registry: &mut DeviceRegistry,
        description: DeviceDescription,
    ) -> Result<DeviceId>;
}
