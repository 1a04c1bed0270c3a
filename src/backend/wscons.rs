// SPDX-License-Identifier: GPL-3.0-only
//! wscons backend
//!
//! wscons exposes one multiplexed keyboard and one multiplexed pointer node.
//! There is no hotplug notification; both are reported once when listening
//! starts.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::Sender;

use super::{DeviceDescription, HotplugBackend, HotplugEvent};
use crate::attributes::{self, AttributeList};
use crate::error::{ConfigError, Result};

const BACKEND: &str = "wscons";

/// Device nodes relative to the device directory, with the names given to them
const NODES: [(&str, &str); 2] = [("wskbd", "keyboard"), ("wsmouse", "mouse")];

pub struct WsconsBackend {
    dev_dir: PathBuf,
    present: Vec<(PathBuf, &'static str)>,
}

impl WsconsBackend {
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    pub fn with_dev_dir(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
            present: Vec::new(),
        }
    }

    fn describe(path: &Path, name: &str) -> Result<DeviceDescription> {
        let path = path.to_string_lossy();
        let mut attribs = AttributeList::allocate()?;
        attribs.add(attributes::PATH, &path)?;

        Ok(DeviceDescription {
            config_info: format!("wscons:{}", path),
            name: name.to_string(),
            attributes: attribs,
        })
    }
}

impl Default for WsconsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HotplugBackend for WsconsBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn init(&mut self) -> Result<()> {
        self.present = NODES
            .iter()
            .map(|(node, name)| (self.dev_dir.join(node), *name))
            .filter(|(path, _)| path.exists())
            .collect();

        if self.present.is_empty() {
            return Err(ConfigError::BackendInit {
                backend: BACKEND,
                reason: format!("no wscons devices in {}", self.dev_dir.display()),
            });
        }
        Ok(())
    }

    fn fini(&mut self) {
        self.present.clear();
    }

    fn listen(&mut self, events: Sender<HotplugEvent>) -> Result<()> {
        for (path, name) in &self.present {
            let description = Self::describe(path, name)?;
            if let Err(err) = events.try_send(HotplugEvent::Added(description)) {
                warn!("config/wscons: could not report {}: {}", path.display(), err);
            }
        }
        Ok(())
    }
}
