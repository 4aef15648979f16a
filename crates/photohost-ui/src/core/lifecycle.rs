//! Page lifecycle: when widgets are mounted and torn down.
//!
//! Widgets mount once the document is parsed and unmount on `pagehide`, which aborts any
//! in-flight upload. A page restored from the back/forward cache fires `pageshow` with
//! `persisted` set and is mounted again.

/// Page-level event relevant to mounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// Document parsed (`DOMContentLoaded`, or already parsed at startup).
    Ready,
    /// `pageshow`; `persisted` is true for a back/forward cache restore.
    Show {
        /// Whether the page came from the back/forward cache.
        persisted: bool,
    },
    /// `pagehide`.
    Hide,
}

/// What the entry point does in response to a [`PageEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleStep {
    /// Mount every widget present on the page.
    Mount,
    /// Unmount every mounted widget.
    Unmount,
    /// Nothing to do.
    Idle,
}

/// Tracks whether widgets are currently mounted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageLifecycle {
    mounted: bool,
}

impl PageLifecycle {
    /// Nothing mounted yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { mounted: false }
    }

    /// Apply an event and return the step to run.
    pub const fn apply(&mut self, event: PageEvent) -> LifecycleStep {
        match event {
            PageEvent::Ready | PageEvent::Show { persisted: true } if !self.mounted => {
                self.mounted = true;
                LifecycleStep::Mount
            }
            PageEvent::Hide if self.mounted => {
                self.mounted = false;
                LifecycleStep::Unmount
            }
            _ => LifecycleStep::Idle,
        }
    }

    /// Whether widgets are mounted.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }
}
