// SPDX-License-Identifier: GPL-3.0-only
//! Main-loop side of hotplugging
//!
//! Backends push [`HotplugEvent`]s into a channel; the session applies them to
//! the device registry one at a time on the main loop.
//!
//! Output devices enumerated at startup (KMS cards) are kept in their own list.
//! They are not input devices and never enter the registry.

use std::future::Future;

use tokio::sync::mpsc::Receiver;

use crate::attributes::Attribute;
use crate::backend::{DeviceDescription, HotplugEvent};
use crate::devices::{DeviceId, DeviceRegistry};
use crate::input::InputSubsystem;

/// A platform output device, e.g. `/dev/dri/card0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDevice {
    pub config_info: String,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

pub struct HotplugSession<I> {
    backend: &'static str,
    registry: DeviceRegistry,
    outputs: Vec<OutputDevice>,
    input: I,
}

impl<I: InputSubsystem> HotplugSession<I> {
    pub fn new(backend: &'static str, input: I) -> Self {
        Self {
            backend,
            registry: DeviceRegistry::new(),
            outputs: Vec::new(),
            input,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn outputs(&self) -> &[OutputDevice] {
        &self.outputs
    }

    /// Record an output device enumerated at startup
    ///
    /// Returns false if the device was already known.
    pub fn add_output_device(&mut self, description: DeviceDescription) -> bool {
        if self
            .outputs
            .iter()
            .any(|o| o.config_info == description.config_info)
        {
            description.attributes.free();
            return false;
        }

        info!(
            "config/{}: found output device {} ({})",
            self.backend, description.name, description.config_info
        );
        self.outputs.push(OutputDevice {
            config_info: description.config_info,
            name: description.name,
            attributes: description.attributes.into_attributes(),
        });
        true
    }

    /// Create a device for `description` unless one already exists for its source
    pub fn add_device(&mut self, description: DeviceDescription) -> Option<DeviceId> {
        if self.registry.is_duplicate(&description.config_info) {
            debug!(
                "config/{}: device {} already added, ignoring",
                self.backend, description.name
            );
            description.attributes.free();
            return None;
        }

        info!(
            "config/{}: adding input device {} ({})",
            self.backend, description.name, description.config_info
        );
        let name = description.name.clone();
        match self.input.new_input_device(&mut self.registry, description) {
            Ok(id) => Some(id),
            Err(err) => {
                error!("config/{}: failed to add device {}: {}", self.backend, name, err);
                None
            }
        }
    }

    pub fn handle_event(&mut self, event: HotplugEvent) {
        match event {
            HotplugEvent::Added(description) => {
                self.add_device(description);
            }
            HotplugEvent::Removed { config_info } => {
                let removed = self
                    .registry
                    .remove_devices(&mut self.input, self.backend, &config_info);
                trace!("config/{}: {} device(s) gone for {}", self.backend, removed, config_info);
            }
        }
    }

    /// Apply events until the channel closes or `shutdown` completes
    pub async fn run<S>(&mut self, mut events: Receiver<HotplugEvent>, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event);
                        self.input.process_input_events(&self.registry);
                    }
                    None => {
                        info!("Hotplug event channel closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutting down hotplug session");
                    break;
                }
            }
        }
    }

    /// Tear the registry down at server stop
    pub fn close(&mut self) {
        self.input.process_input_events(&self.registry);
        self.registry.clear();
        self.outputs.clear();
    }
}
