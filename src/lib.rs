// SPDX-License-Identifier: GPL-3.0-only
//! Input device hotplug configuration for a display server
//!
//! Routes the server's lifecycle hooks to one hotplug backend and keeps track
//! of the input devices those backends created, so they can be recognised as
//! duplicates and removed again when their source disappears.

#[macro_use]
extern crate tracing;

pub mod attributes;
pub mod backend;
pub mod config;
pub mod devices;
pub mod error;
pub mod hotplug;
pub mod input;

#[cfg(test)]
mod test_support;

pub use attributes::{Attribute, AttributeList};
pub use backend::{BackendKind, DeviceDescription, HotplugBackend, HotplugEvent};
pub use devices::{Device, DeviceId, DeviceRegistry, DeviceState};
pub use error::{ConfigError, Result};
pub use hotplug::{HotplugConfig, HotplugSession};
pub use input::{EventGate, InputSubsystem, QueuedInput};
