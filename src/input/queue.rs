// SPDX-License-Identifier: GPL-3.0-only
//! In-memory input subsystem with a FIFO event queue

use std::collections::VecDeque;

use super::{EventGate, InputEvent, InputSubsystem};
use crate::backend::DeviceDescription;
use crate::devices::{Device, DeviceId, DeviceRegistry, DeviceState};
use crate::error::{ConfigError, Result};

type Sink = Box<dyn FnMut(&Device, &InputEvent)>;

/// Queue-backed input subsystem
///
/// Events delivered while the gate is deferred are parked and only join the
/// queue on a processing pass with the gate open.
pub struct QueuedInput {
    gate: EventGate,
    queue: VecDeque<InputEvent>,
    parked: Vec<InputEvent>,
    sink: Option<Sink>,
}

impl QueuedInput {
    pub fn new() -> Self {
        Self {
            gate: EventGate::new(),
            queue: VecDeque::new(),
            parked: Vec::new(),
            sink: None,
        }
    }

    /// Route processed events to `sink`
    pub fn with_sink<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&Device, &InputEvent) + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Delivery path: called when the backend or driver produces an event
    pub fn deliver(&mut self, event: InputEvent) {
        if self.gate.is_deferred() {
            trace!("Delivery deferred, parking event for device {}", event.device);
            self.parked.push(event);
        } else {
            self.queue.push_back(event);
        }
    }

    /// Events waiting for the next processing pass
    pub fn pending(&self) -> usize {
        self.queue.len() + self.parked.len()
    }
}

impl Default for QueuedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueuedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedInput")
            .field("gate", &self.gate)
            .field("queued", &self.queue.len())
            .field("parked", &self.parked.len())
            .finish()
    }
}

impl InputSubsystem for QueuedInput {
    fn gate(&self) -> &EventGate {
        &self.gate
    }

    fn process_input_events(&mut self, registry: &DeviceRegistry) -> usize {
        if !self.gate.is_deferred() && !self.parked.is_empty() {
            self.queue.extend(self.parked.drain(..));
        }

        let mut dispatched = 0;
        while let Some(event) = self.queue.pop_front() {
            match registry.get(event.device) {
                Some(device) => {
                    if let Some(sink) = self.sink.as_mut() {
                        sink(device, &event);
                    }
                    dispatched += 1;
                }
                None => debug!("Dropping event for removed device {}", event.device),
            }
        }
        dispatched
    }

    fn delete_input_device(
        &mut self,
        registry: &mut DeviceRegistry,
        id: DeviceId,
    ) -> Result<Device> {
        let device = registry.delete(id).ok_or(ConfigError::DeviceNotFound(id))?;
        self.queue.retain(|e| e.device != id);
        debug!("Deleted input device {} ({})", device.name, id);
        Ok(device)
    }

    fn new_input_device(
        &mut self,
        registry: &mut DeviceRegistry,
        description: DeviceDescription,
    ) -> Result<DeviceId> {
        let DeviceDescription {
            config_info,
            name,
            attributes,
        } = description;

        let id = registry.insert(
            DeviceState::Enabled,
            name,
            Some(config_info),
            attributes.into_attributes(),
        );
        Ok(id)
    }
}
