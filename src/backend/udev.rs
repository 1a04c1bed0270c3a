// SPDX-License-Identifier: GPL-3.0-only
//! udev backend
//!
//! Input devices are reported through a udev monitor running on its own
//! thread; KMS devices (`drm` cards) can be enumerated synchronously through
//! [`HotplugBackend::probe`].

use tokio::sync::mpsc::Sender;

use super::{DeviceDescription, HotplugBackend, HotplugEvent};
use crate::attributes::{self, AttributeList};
use crate::error::{ConfigError, Result};
use crate::hotplug::UdevMonitor;

const BACKEND: &str = "udev";

/// Identifier stored on devices created by this backend
pub(crate) fn config_info(syspath: &str) -> String {
    format!("udev:{}", syspath)
}

/// Input device names live on the parent node and may be quoted
fn clean_name(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

fn is_event_node(sysname: &str) -> bool {
    sysname.starts_with("event")
}

pub struct UdevBackend {
    context: Option<udev::Udev>,
    listening: bool,
}

impl UdevBackend {
    pub fn new() -> Self {
        Self {
            context: None,
            listening: false,
        }
    }
}

impl Default for UdevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HotplugBackend for UdevBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn pre_init(&mut self) -> Result<()> {
        if self.context.is_none() {
            self.context = Some(udev::Udev::new()?);
        }
        Ok(())
    }

    fn init(&mut self) -> Result<()> {
        let Some(context) = self.context.as_ref() else {
            return Err(ConfigError::BackendInit {
                backend: BACKEND,
                reason: "no udev context".to_string(),
            });
        };

        // The real socket is opened on the monitor thread; make sure it can be
        UdevMonitor::with_udev(context.clone()).map_err(|err| ConfigError::BackendInit {
            backend: BACKEND,
            reason: format!("cannot open monitor socket: {}", err),
        })?;
        Ok(())
    }

    fn fini(&mut self) {
        self.context = None;
    }

    fn probe(&mut self, callback: &mut dyn FnMut(DeviceDescription)) {
        let Some(context) = self.context.as_ref() else {
            debug!("config/udev: no udev context, skipping KMS probe");
            return;
        };

        let devices = udev::Enumerator::with_udev(context.clone())
            .and_then(|enumerator| enumerate(enumerator, "drm", "card[0-9]*"));
        match devices {
            Ok(devices) => {
                debug!("Found {} KMS device(s)", devices.len());
                for description in devices {
                    callback(description);
                }
            }
            Err(err) => warn!("config/udev: KMS probe failed: {}", err),
        }
    }

    fn listen(&mut self, events: Sender<HotplugEvent>) -> Result<()> {
        if self.listening {
            return Ok(());
        }

        std::thread::Builder::new()
            .name("udev-monitor".to_string())
            .spawn(move || {
                // Open the socket before enumerating so nothing is missed in between
                let monitor = match UdevMonitor::new() {
                    Ok(m) => m,
                    Err(e) => {
                        error!("Failed to initialize input hotplug monitoring: {}", e);
                        return;
                    }
                };

                // The context from pre_init is not Send, so this thread opens its own
                let devices = udev::Enumerator::new()
                    .and_then(|enumerator| enumerate(enumerator, "input", "event[0-9]*"));
                match devices {
                    Ok(devices) => {
                        for description in devices {
                            if events.blocking_send(HotplugEvent::Added(description)).is_err() {
                                return;
                            }
                        }
                    }
                    Err(err) => warn!("config/udev: input enumeration failed: {}", err),
                }

                let _err = monitor.run(|event| {
                    for hotplug_event in translate(&event) {
                        if events.blocking_send(hotplug_event).is_err() {
                            error!("Hotplug channel closed, stopping monitor");
                            return false;
                        }
                    }
                    true
                });

                error!("Input hotplug monitoring stopped");
            })?;

        self.listening = true;
        Ok(())
    }
}

fn enumerate(
    mut enumerator: udev::Enumerator,
    subsystem: &str,
    sysname: &str,
) -> std::io::Result<Vec<DeviceDescription>> {
    enumerator.match_subsystem(subsystem)?;
    enumerator.match_sysname(sysname)?;

    Ok(enumerator
        .scan_devices()?
        .filter_map(|device| describe(&device))
        .collect())
}

/// Build a description for a device that has a device node
fn describe(device: &udev::Device) -> Option<DeviceDescription> {
    let devnode = device.devnode()?.to_string_lossy().into_owned();
    let syspath = device.syspath().to_string_lossy().into_owned();

    let name = device
        .parent()
        .and_then(|parent| {
            parent
                .property_value("NAME")
                .map(|value| clean_name(&value.to_string_lossy()))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| device.sysname().to_string_lossy().into_owned());

    let mut attribs = AttributeList::allocate().ok()?;
    if attribs.add(attributes::PATH, &devnode).is_err()
        || attribs.add(attributes::SYSPATH, &syspath).is_err()
    {
        attribs.free();
        return None;
    }

    Some(DeviceDescription {
        config_info: config_info(&syspath),
        name,
        attributes: attribs,
    })
}

/// Map a udev event on an input node to what the main loop should do
fn translate(event: &udev::Event) -> Vec<HotplugEvent> {
    if !is_event_node(&event.sysname().to_string_lossy()) {
        return Vec::new();
    }

    let removed = || HotplugEvent::Removed {
        config_info: config_info(&event.syspath().to_string_lossy()),
    };

    match event.event_type() {
        udev::EventType::Add => describe(event).map(HotplugEvent::Added).into_iter().collect(),
        udev::EventType::Remove => vec![removed()],
        udev::EventType::Change => {
            let mut out = vec![removed()];
            out.extend(describe(event).map(HotplugEvent::Added));
            out
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_info_format() {
        assert_eq!(
            config_info("/sys/devices/platform/i8042/serio0/input/input3/event3"),
            "udev:/sys/devices/platform/i8042/serio0/input/input3/event3"
        );
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("\"AT Translated Set 2 keyboard\""), "AT Translated Set 2 keyboard");
        assert_eq!(clean_name("Logitech USB Receiver"), "Logitech USB Receiver");
    }

    #[test]
    fn test_event_node_filter() {
        assert!(is_event_node("event3"));
        assert!(!is_event_node("mouse0"));
        assert!(!is_event_node("js0"));
        assert!(!is_event_node("input12"));
    }

    #[test]
    fn test_kms_enumeration_without_context_reports_nothing() {
        let mut backend = UdevBackend::new();

        let mut found = 0;
        backend.probe(&mut |_| found += 1);
        assert_eq!(found, 0);
    }

    #[test]
    fn test_init_requires_pre_init() {
        let mut backend = UdevBackend::new();
        let err = backend.init().unwrap_err();
        assert!(matches!(err, ConfigError::BackendInit { backend: "udev", .. }));
    }
}
