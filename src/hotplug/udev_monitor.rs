use std::os::fd::AsRawFd;

/// Monitors udev for input device hotplug events
///
/// This runs in a dedicated blocking thread because udev's MonitorSocket is not Send.
/// It uses libc::poll() to wait for events on the udev socket.
pub struct UdevMonitor {
    socket: udev::MonitorSocket,
}

impl UdevMonitor {
    /// Create a new udev monitor for the input subsystem
    pub fn new() -> Result<Self, std::io::Error> {
        Self::from_builder(udev::MonitorBuilder::new()?)
    }

    /// Same as [`UdevMonitor::new`], on an existing udev context
    pub fn with_udev(context: udev::Udev) -> Result<Self, std::io::Error> {
        Self::from_builder(udev::MonitorBuilder::with_udev(context)?)
    }

    fn from_builder(builder: udev::MonitorBuilder) -> Result<Self, std::io::Error> {
        let socket = builder.match_subsystem("input")?.listen()?;

        Ok(Self { socket })
    }

    /// Run the monitoring loop, calling the callback for each event
    ///
    /// Blocks until the callback asks to stop or polling fails.
    pub fn run<F>(self, mut callback: F) -> std::io::Error
    where
        F: FnMut(udev::Event) -> bool, // Returns true to continue, false to stop
    {
        info!("Input hotplug monitoring started");

        let fd = self.socket.as_raw_fd();

        loop {
            let mut poll_fd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };

            // Block until socket has data (negative timeout = wait forever)
            let poll_result = unsafe { libc::poll(&mut poll_fd, 1, -1) };

            if poll_result < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                error!("Poll error: {}", err);
                return err;
            }

            if poll_result == 0 {
                continue;
            }

            // Drain everything that is ready
            for event in self.socket.iter() {
                debug!(
                    "udev event: type={:?}, devnode={:?}, syspath={:?}",
                    event.event_type(),
                    event.devnode(),
                    event.syspath()
                );

                if !callback(event) {
                    info!("Input hotplug monitoring stopped by callback");
                    return std::io::Error::new(
                        std::io::ErrorKind::Interrupted,
                        "Stopped by callback",
                    );
                }
            }
        }
    }
}
