// SPDX-License-Identifier: GPL-3.0-only
//! Error types for hotplug configuration
//!
//! Hotplug is best effort: most of these are logged and swallowed by the
//! dispatcher. Only allocation failures reach callers of the attribute list.

use thiserror::Error;

use crate::devices::DeviceId;

/// Main error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Resource exhaustion while building an attribute list
    #[error("Failed to allocate attribute storage")]
    AllocationFailure,

    /// A backend could not be brought up
    #[error("failed to initialise {backend}: {reason}")]
    BackendInit { backend: &'static str, reason: String },

    /// Device is in neither collection
    #[error("Device {0} not found")]
    DeviceNotFound(DeviceId),

    /// Settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(String),

    /// D-Bus error
    #[cfg(feature = "dbus")]
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::collections::TryReserveError> for ConfigError {
    fn from(_: std::collections::TryReserveError) -> Self {
        ConfigError::AllocationFailure
    }
}

/// Result type alias for ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;
