// SPDX-License-Identifier: GPL-3.0-only
//! Device registry
//!
//! Holds the server's two device collections and implements the queries and
//! bulk removal hotplug backends rely on.
//!
//! # Removal
//!
//! [`DeviceRegistry::remove_devices`] marks every matching device of a
//! collection first and only then removes them one by one, so deleting the
//! current device never causes another one to be skipped or visited twice.
//! Each deletion happens with input event delivery deferred, after the queue
//! has been flushed, so no queued event can reference a released device.

use super::{Device, DeviceId, DeviceState};
use crate::attributes::Attribute;
use crate::input::InputSubsystem;

/// The enabled and disabled device collections
///
/// Created at server start and torn down with [`DeviceRegistry::clear`] at
/// server stop. Every device is in exactly one of the two collections.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    enabled: Vec<Device>,
    disabled: Vec<Device>,
    next_id: u32,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device at the end of the collection for `state`
    pub fn insert(
        &mut self,
        state: DeviceState,
        name: impl Into<String>,
        config_info: Option<String>,
        attributes: Vec<Attribute>,
    ) -> DeviceId {
        self.next_id += 1;
        let id = DeviceId(self.next_id);
        let device = Device {
            id,
            name: name.into(),
            config_info,
            attributes,
        };
        self.collection_mut(state).push(device);
        id
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.enabled
            .iter()
            .chain(self.disabled.iter())
            .find(|d| d.id == id)
    }

    pub fn state_of(&self, id: DeviceId) -> Option<DeviceState> {
        if self.enabled.iter().any(|d| d.id == id) {
            Some(DeviceState::Enabled)
        } else if self.disabled.iter().any(|d| d.id == id) {
            Some(DeviceState::Disabled)
        } else {
            None
        }
    }

    /// Move a disabled device to the end of the enabled collection
    pub fn enable(&mut self, id: DeviceId) -> bool {
        self.move_to(id, DeviceState::Enabled)
    }

    /// Move an enabled device to the end of the disabled collection
    pub fn disable(&mut self, id: DeviceId) -> bool {
        self.move_to(id, DeviceState::Disabled)
    }

    /// Take a device out of whichever collection holds it
    pub fn delete(&mut self, id: DeviceId) -> Option<Device> {
        for state in [DeviceState::Enabled, DeviceState::Disabled] {
            let devices = self.collection_mut(state);
            if let Some(pos) = devices.iter().position(|d| d.id == id) {
                return Some(devices.remove(pos));
            }
        }
        None
    }

    pub fn enabled(&self) -> &[Device] {
        &self.enabled
    }

    pub fn disabled(&self) -> &[Device] {
        &self.disabled
    }

    pub fn len(&self) -> usize {
        self.enabled.len() + self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }

    /// Drop every device (server shutdown)
    pub fn clear(&mut self) {
        self.enabled.clear();
        self.disabled.clear();
    }

    /// Check whether a device already exists for a backend identifier
    ///
    /// Scans enabled devices, then disabled ones. Devices without an
    /// identifier are never considered duplicates.
    pub fn is_duplicate(&self, config_info: &str) -> bool {
        self.enabled
            .iter()
            .chain(self.disabled.iter())
            .any(|d| d.matches(config_info))
    }

    /// Remove every device created from `config_info`
    ///
    /// Called by a backend once the source of those devices has disappeared.
    /// The enabled collection is processed completely before the disabled
    /// one. Returns the number of devices removed; zero is a normal outcome.
    pub fn remove_devices<I>(&mut self, input: &mut I, backend: &str, config_info: &str) -> usize
    where
        I: InputSubsystem + ?Sized,
    {
        let mut removed = 0;

        for state in [DeviceState::Enabled, DeviceState::Disabled] {
            let marked: Vec<DeviceId> = self
                .collection(state)
                .iter()
                .filter(|d| d.matches(config_info))
                .map(|d| d.id)
                .collect();

            for id in marked {
                // An earlier deletion may have taken this one with it
                let Some(name) = self.get(id).map(|d| d.name.clone()) else {
                    continue;
                };
                if self.remove_device(input, backend, id, &name) {
                    removed += 1;
                }
            }
        }

        removed
    }

    fn remove_device<I>(&mut self, input: &mut I, backend: &str, id: DeviceId, name: &str) -> bool
    where
        I: InputSubsystem + ?Sized,
    {
        info!("config/{}: removing device {}", backend, name);

        // Flush queued events so nothing refers to the device once it is gone
        let _deferral = input.gate().defer();
        input.process_input_events(self);

        match input.delete_input_device(self, id) {
            Ok(_) => true,
            Err(err) => {
                warn!("config/{}: failed to remove device {}: {}", backend, name, err);
                false
            }
        }
    }

    fn move_to(&mut self, id: DeviceId, target: DeviceState) -> bool {
        let source = match target {
            DeviceState::Enabled => DeviceState::Disabled,
            DeviceState::Disabled => DeviceState::Enabled,
        };
        let devices = self.collection_mut(source);
        match devices.iter().position(|d| d.id == id) {
            Some(pos) => {
                let device = devices.remove(pos);
                self.collection_mut(target).push(device);
                true
            }
            None => false,
        }
    }

    fn collection(&self, state: DeviceState) -> &Vec<Device> {
        match state {
            DeviceState::Enabled => &self.enabled,
            DeviceState::Disabled => &self.disabled,
        }
    }

    fn collection_mut(&mut self, state: DeviceState) -> &mut Vec<Device> {
        match state {
            DeviceState::Enabled => &mut self.enabled,
            DeviceState::Disabled => &mut self.disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::DeviceDescription;
    use crate::error::{ConfigError, Result};
    use crate::input::{EventGate, InputEvent, QueuedInput};
    use crate::test_support::capture_logs;

    fn add(
        registry: &mut DeviceRegistry,
        state: DeviceState,
        name: &str,
        info: Option<&str>,
    ) -> DeviceId {
        registry.insert(state, name, info.map(str::to_string), Vec::new())
    }

    fn names(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.name.as_str()).collect()
    }

    /// Subsystem whose deletions always fail
    struct BrokenInput {
        gate: EventGate,
        deferred_during_delete: Vec<bool>,
    }

    impl InputSubsystem for BrokenInput {
        fn gate(&self) -> &EventGate {
            &self.gate
        }

        fn process_input_events(&mut self, _registry: &DeviceRegistry) -> usize {
            0
        }

        fn delete_input_device(
            &mut self,
            _registry: &mut DeviceRegistry,
            id: DeviceId,
        ) -> Result<Device> {
            self.deferred_during_delete.push(self.gate.is_deferred());
            Err(ConfigError::DeviceNotFound(id))
        }

        fn new_input_device(
            &mut self,
            _registry: &mut DeviceRegistry,
            _description: DeviceDescription,
        ) -> Result<DeviceId> {
            unreachable!()
        }
    }

    #[test]
    fn test_duplicate_in_either_collection() {
        let mut registry = DeviceRegistry::new();
        add(&mut registry, DeviceState::Enabled, "A", Some("seat0-event3"));
        add(&mut registry, DeviceState::Disabled, "C", Some("seat0-event7"));

        assert!(registry.is_duplicate("seat0-event3"));
        assert!(registry.is_duplicate("seat0-event7"));
        assert!(!registry.is_duplicate("seat0-event9"));
    }

    #[test]
    fn test_duplicate_is_exact_match() {
        let mut registry = DeviceRegistry::new();
        add(&mut registry, DeviceState::Enabled, "A", Some("udev:/sys/event3"));

        assert!(!registry.is_duplicate("UDEV:/sys/event3"));
        assert!(!registry.is_duplicate("udev:/sys/event"));
        assert!(!registry.is_duplicate(""));
    }

    #[test]
    fn test_absent_config_info_never_matches() {
        let mut registry = DeviceRegistry::new();
        add(&mut registry, DeviceState::Enabled, "core pointer", None);
        add(&mut registry, DeviceState::Disabled, "core keyboard", None);

        assert!(!registry.is_duplicate(""));
        assert!(!registry.is_duplicate("seat0-event3"));

        let mut input = QueuedInput::new();
        assert_eq!(registry.remove_devices(&mut input, "udev", ""), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_cleared_by_removal() {
        let mut registry = DeviceRegistry::new();
        let mut input = QueuedInput::new();
        add(&mut registry, DeviceState::Disabled, "A", Some("seat0-event3"));
        assert!(registry.is_duplicate("seat0-event3"));

        registry.remove_devices(&mut input, "udev", "seat0-event3");
        assert!(!registry.is_duplicate("seat0-event3"));
    }

    #[test]
    fn test_remove_first_middle_last() {
        for victim in 0..3 {
            let mut registry = DeviceRegistry::new();
            let mut input = QueuedInput::new();
            let all = ["first", "middle", "last"];
            for name in all {
                add(&mut registry, DeviceState::Enabled, name, Some(name));
                add(&mut registry, DeviceState::Disabled, name, Some(name));
            }

            let removed = registry.remove_devices(&mut input, "udev", all[victim]);
            assert_eq!(removed, 2);

            let expected: Vec<&str> = all.iter().copied().filter(|n| *n != all[victim]).collect();
            assert_eq!(names(registry.enabled()), expected);
            assert_eq!(names(registry.disabled()), expected);
        }
    }

    #[test]
    fn test_remove_adjacent_matches() {
        let mut registry = DeviceRegistry::new();
        let mut input = QueuedInput::new();
        add(&mut registry, DeviceState::Enabled, "pen", Some("wacom"));
        add(&mut registry, DeviceState::Enabled, "eraser", Some("wacom"));
        add(&mut registry, DeviceState::Enabled, "mouse", Some("usb-mouse"));
        add(&mut registry, DeviceState::Enabled, "pad", Some("wacom"));

        assert_eq!(registry.remove_devices(&mut input, "udev", "wacom"), 3);
        assert_eq!(names(registry.enabled()), vec!["mouse"]);
    }

    #[test]
    fn test_seat_scenario() {
        let mut registry = DeviceRegistry::new();
        let mut input = QueuedInput::new();
        add(&mut registry, DeviceState::Enabled, "A", Some("seat0-event3"));
        let b = add(&mut registry, DeviceState::Enabled, "B", Some("seat0-event5"));
        add(&mut registry, DeviceState::Disabled, "C", Some("seat0-event3"));

        let (removed, logs) =
            capture_logs(|| registry.remove_devices(&mut input, "evdev", "seat0-event3"));

        assert_eq!(removed, 2);
        assert_eq!(names(registry.enabled()), vec!["B"]);
        assert!(registry.disabled().is_empty());
        assert_eq!(registry.state_of(b), Some(DeviceState::Enabled));
        assert!(!registry.is_duplicate("seat0-event3"));
        assert!(registry.is_duplicate("seat0-event5"));

        let a_pos = logs.find("config/evdev: removing device A").unwrap();
        let c_pos = logs.find("config/evdev: removing device C").unwrap();
        assert!(a_pos < c_pos);
    }

    #[test]
    fn test_no_match_leaves_registry_and_logs_untouched() {
        let mut registry = DeviceRegistry::new();
        let mut input = QueuedInput::new();
        add(&mut registry, DeviceState::Enabled, "A", Some("seat0-event3"));
        add(&mut registry, DeviceState::Disabled, "C", Some("seat0-event4"));

        let (removed, logs) =
            capture_logs(|| registry.remove_devices(&mut input, "udev", "seat0-event9"));

        assert_eq!(removed, 0);
        assert_eq!(names(registry.enabled()), vec!["A"]);
        assert_eq!(names(registry.disabled()), vec!["C"]);
        assert!(!logs.contains("removing device"));
    }

    #[test]
    fn test_events_flushed_before_delete() {
        let mut registry = DeviceRegistry::new();
        let kbd = add(&mut registry, DeviceState::Enabled, "kbd", Some("seat0-event3"));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = Rc::clone(&seen);
        let mut input = QueuedInput::new().with_sink(move |device, event| {
            sink_seen.borrow_mut().push((device.name.clone(), event.code));
        });
        input.deliver(InputEvent { device: kbd, event_type: 1, code: 28, value: 0 });

        registry.remove_devices(&mut input, "udev", "seat0-event3");

        assert_eq!(*seen.borrow(), vec![("kbd".to_string(), 28)]);
        assert_eq!(input.pending(), 0);
        assert!(!input.gate().is_deferred());
    }

    #[test]
    fn test_guard_released_when_delete_fails() {
        let mut registry = DeviceRegistry::new();
        add(&mut registry, DeviceState::Enabled, "A", Some("seat0-event3"));
        add(&mut registry, DeviceState::Disabled, "C", Some("seat0-event3"));
        let mut input = BrokenInput {
            gate: EventGate::new(),
            deferred_during_delete: Vec::new(),
        };

        let removed = registry.remove_devices(&mut input, "udev", "seat0-event3");

        assert_eq!(removed, 0);
        assert_eq!(input.deferred_during_delete, vec![true, true]);
        assert!(!input.gate.is_deferred());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_enable_disable_moves_between_collections() {
        let mut registry = DeviceRegistry::new();
        let a = add(&mut registry, DeviceState::Enabled, "A", Some("a"));
        let b = add(&mut registry, DeviceState::Enabled, "B", Some("b"));

        assert!(registry.disable(a));
        assert!(!registry.disable(a));
        assert_eq!(names(registry.enabled()), vec!["B"]);
        assert_eq!(names(registry.disabled()), vec!["A"]);

        assert!(registry.enable(a));
        assert_eq!(names(registry.enabled()), vec!["B", "A"]);
        assert_eq!(registry.state_of(b), Some(DeviceState::Enabled));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = DeviceRegistry::new();
        let a = add(&mut registry, DeviceState::Enabled, "A", None);
        registry.delete(a);
        let b = add(&mut registry, DeviceState::Enabled, "B", None);

        assert_ne!(a, b);
        assert!(registry.get(a).is_none());

        registry.clear();
        assert!(registry.is_empty());
    }
}
