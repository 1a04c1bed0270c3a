// SPDX-License-Identifier: GPL-3.0-only
//! Settings file
//!
//! Read once at startup from `$HOTPLUG_CONFIG`, or from
//! `<config dir>/hotplug-config/config.toml`. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::error::{ConfigError, Result};

pub const CONFIG_VERSION: u64 = 1;
pub const APPID: &str = "hotplug-config";
const ENV_PATH: &str = "HOTPLUG_CONFIG";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub version: u64,
    /// Which hotplug backend drives device arrival and removal
    pub backend: BackendKind,
    /// Display number, used for the D-Bus API bus name
    pub display: u32,
    /// Enumerate already-present KMS devices at startup
    #[serde(default = "default_probe_on_start")]
    pub probe_on_start: bool,
}

fn default_probe_on_start() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: BackendKind::default(),
            display: 0,
            probe_on_start: default_probe_on_start(),
        }
    }
}

impl Config {
    /// Where the settings file is looked up
    pub fn path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_PATH) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(APPID).join("config.toml"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| ConfigError::Settings(e.to_string()))?;
        if config.version < CONFIG_VERSION {
            warn!(
                "Settings file version {} is older than {}, unknown keys use defaults",
                config.version, CONFIG_VERSION
            );
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load the settings, falling back to defaults on any error
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("errors loading config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }
}
