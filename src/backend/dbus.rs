// SPDX-License-Identifier: GPL-3.0-only
//! D-Bus backend
//!
//! The D-Bus core (a system bus connection) is brought up first. On top of it
//! runs either the configuration API, which claims `org.x.config.display<N>`,
//! or HAL, which needs `org.freedesktop.Hal` to be present on the bus.

use zbus::blocking::{Connection, fdo::DBusProxy};
use zbus::names::BusName;

use super::HotplugBackend;
use crate::error::{ConfigError, Result};

const HAL_SERVICE: &str = "org.freedesktop.Hal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Api { display: u32 },
    Hal,
}

impl Component {
    fn label(self) -> &'static str {
        match self {
            Component::Api { .. } => "D-Bus API",
            Component::Hal => "HAL",
        }
    }
}

fn api_name(display: u32) -> String {
    format!("org.x.config.display{}", display)
}

pub struct DBusBackend {
    component: Component,
    connection: Option<Connection>,
    component_up: bool,
}

impl DBusBackend {
    /// Core plus the configuration API for the given display number
    pub fn api(display: u32) -> Self {
        Self::with_component(Component::Api { display })
    }

    /// Core plus HAL
    pub fn hal() -> Self {
        Self::with_component(Component::Hal)
    }

    fn with_component(component: Component) -> Self {
        Self {
            component,
            connection: None,
            component_up: false,
        }
    }

    fn init_core(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let connection = Connection::system().map_err(|err| ConfigError::BackendInit {
            backend: "D-Bus core",
            reason: err.to_string(),
        })?;
        self.connection = Some(connection);
        Ok(())
    }

    fn init_component(&self, connection: &Connection) -> Result<()> {
        match self.component {
            Component::Api { display } => {
                connection.request_name(api_name(display))?;
            }
            Component::Hal => {
                let proxy = DBusProxy::new(connection)?;
                let name = BusName::try_from(HAL_SERVICE).map_err(zbus::Error::from)?;
                let present = proxy.name_has_owner(name).map_err(zbus::Error::from)?;
                if !present {
                    return Err(ConfigError::BackendInit {
                        backend: "HAL",
                        reason: format!("{} is not running", HAL_SERVICE),
                    });
                }
            }
        }
        Ok(())
    }
}

impl HotplugBackend for DBusBackend {
    fn name(&self) -> &'static str {
        match self.component {
            Component::Api { .. } => "dbus",
            Component::Hal => "hal",
        }
    }

    fn init(&mut self) -> Result<()> {
        self.init_core()?;

        if !self.component_up {
            if let Some(connection) = self.connection.as_ref() {
                match self.init_component(connection) {
                    Ok(()) => self.component_up = true,
                    // Core stays up, the component just isn't available
                    Err(err) => error!(
                        "[config] failed to initialise {}: {}",
                        self.component.label(),
                        err
                    ),
                }
            }
        }
        Ok(())
    }

    fn fini(&mut self) {
        if self.component_up {
            if let (Component::Api { display: display_num }, Some(connection)) =
                (self.component, self.connection.as_ref())
            {
                if let Err(err) = connection.release_name(api_name(display_num)) {
                    debug!("Failed to release {}: {}", api_name(display_num), err);
                }
            }
            self.component_up = false;
        }
        self.connection = None;
    }
}
