//! Button input: debounce, gating and the command slots
//!
//! [`InputSource::press`] is the edge handler. It may run on another thread
//! (or in interrupt context on a board), so it only touches atomics: it never
//! blocks and never does I/O. Accepted presses are posted into one slot per
//! command; the control loop drains the slots with [`InputSource::take`].
//!
//! The edge handler gates on the mount and capture state the controller last
//! published. Those reads are not synchronised with the controller's
//! transitions, so a capture toggle accepted just before an unmount can
//! reach the controller after the medium is gone. The controller drops such
//! stale requests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// No press accepted yet
const NEVER: u64 = u64::MAX;

/// Physical buttons on the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Start/stop capture
    A,
    /// Mount/unmount the card
    B,
}

/// Logical events produced from button presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleCapture,
    RequestMountToggle,
}

impl Button {
    pub fn command(self) -> Command {
        match self {
            Button::A => Command::ToggleCapture,
            Button::B => Command::RequestMountToggle,
        }
    }
}

/// Single-entry mailbox between the edge handler and the control loop
#[derive(Debug, Default)]
pub struct CommandSlot {
    pending: AtomicBool,
}

impl CommandSlot {
    /// Post the command; `false` if one is already waiting
    pub fn post(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Consume the command if one is waiting
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Debounced, state-gated button input shared with the controller
#[derive(Debug)]
pub struct InputSource {
    debounce_ms: u64,
    last_accepted_ms: AtomicU64,
    mounted: AtomicBool,
    capturing: AtomicBool,
    toggle_capture: CommandSlot,
    mount_toggle: CommandSlot,
}

impl InputSource {
    pub fn new(debounce_window: Duration) -> Self {
        Self {
            debounce_ms: debounce_window.as_millis() as u64,
            last_accepted_ms: AtomicU64::new(NEVER),
            mounted: AtomicBool::new(false),
            capturing: AtomicBool::new(false),
            toggle_capture: CommandSlot::default(),
            mount_toggle: CommandSlot::default(),
        }
    }

    /// Handle a press edge of `button` seen at `now_ms`
    ///
    /// Returns the command that was posted, or `None` if the edge was
    /// bounce, arrived in a state where the button does nothing, or its
    /// command is still waiting to be consumed. Only accepted edges restart
    /// the debounce window, which is shared by both buttons.
    pub fn press(&self, button: Button, now_ms: u64) -> Option<Command> {
        let last = self.last_accepted_ms.load(Ordering::Acquire);
        if last != NEVER && now_ms.saturating_sub(last) <= self.debounce_ms {
            debug!("{:?} ignored: within debounce window", button);
            return None;
        }

        let command = button.command();
        let allowed = match command {
            Command::ToggleCapture => self.mounted.load(Ordering::Acquire),
            Command::RequestMountToggle => !self.capturing.load(Ordering::Acquire),
        };
        if !allowed {
            debug!("{:?} ignored in current session state", button);
            return None;
        }

        if !self.slot(command).post() {
            debug!("{:?} ignored: {:?} already pending", button, command);
            return None;
        }

        // Single producer: no other writer races this store
        self.last_accepted_ms.store(now_ms, Ordering::Release);
        debug!("{:?} accepted at {} ms", command, now_ms);
        Some(command)
    }

    /// Consume `command` if it is pending
    pub fn take(&self, command: Command) -> bool {
        self.slot(command).take()
    }

    pub fn is_pending(&self, command: Command) -> bool {
        self.slot(command).is_pending()
    }

    /// Mount state as last published by the controller
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Capture state as last published by the controller
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// Publish the controller's state for gating future presses
    pub(crate) fn publish(&self, mounted: bool, capturing: bool) {
        self.mounted.store(mounted, Ordering::Release);
        self.capturing.store(capturing, Ordering::Release);
    }

    fn slot(&self, command: Command) -> &CommandSlot {
        match command {
            Command::ToggleCapture => &self.toggle_capture,
            Command::RequestMountToggle => &self.mount_toggle,
        }
    }
}
