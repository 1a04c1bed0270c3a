// SPDX-License-Identifier: GPL-3.0-only
//! Deferral of input event delivery
//!
//! While at least one [`EventDeferral`] is alive, the event delivery path must
//! park incoming events instead of queueing them for processing. Deferrals
//! nest; delivery resumes when the outermost one is dropped.

use std::cell::Cell;
use std::rc::Rc;

/// Counter shared between the delivery path and code that must not be
/// interrupted by it. Not `Send`: it only guards against re-entrancy on the
/// main loop.
#[derive(Debug, Clone, Default)]
pub struct EventGate {
    depth: Rc<Cell<u32>>,
}

impl EventGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer event delivery until the returned guard is dropped
    #[must_use = "delivery resumes as soon as the guard is dropped"]
    pub fn defer(&self) -> EventDeferral {
        self.depth.set(self.depth.get() + 1);
        EventDeferral {
            depth: Rc::clone(&self.depth),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.depth.get() > 0
    }

    /// Number of live deferrals
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }
}

/// Scoped deferral, released on drop (including unwinding)
#[derive(Debug)]
pub struct EventDeferral {
    depth: Rc<Cell<u32>>,
}

impl Drop for EventDeferral {
    fn drop(&mut self) {
        let depth = self.depth.get();
        debug_assert!(depth > 0);
        self.depth.set(depth.saturating_sub(1));
    }
}
