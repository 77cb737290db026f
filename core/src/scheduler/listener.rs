//! Tick listeners (registered callbacks)
//!
//! A `TickListener` binds a callback to a tick offset. One-shot listeners
//! fire when the count lands exactly on their trigger tick. Recurring
//! listeners fire on every tick from the trigger onward; a caller wanting
//! "every N ticks" checks the modulo inside its own callback.

use std::fmt;

use super::TickScheduler;

/// Callback invoked when a listener fires
pub type TickCallback = Box<dyn FnMut(&mut TickScheduler)>;

/// Identifier handed out at registration, never reused by the same scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ListenerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered listener
pub struct TickListener {
    pub id: ListenerId,

    /// Tick count at which the listener starts firing (always > 0)
    pub trigger_tick: u64,

    /// Fire only when `tick_count == trigger_tick`
    pub once: bool,

    /// Taken out while the callback runs so it can receive the scheduler
    callback: Option<TickCallback>,
}

impl TickListener {
    pub(crate) fn new(id: ListenerId, trigger_tick: u64, once: bool, callback: TickCallback) -> Self {
        Self {
            id,
            trigger_tick,
            once,
            callback: Some(callback),
        }
    }

    /// Whether this listener fires when the count is `tick`
    pub fn fires_at(&self, tick: u64) -> bool {
        if self.once {
            tick == self.trigger_tick
        } else {
            tick >= self.trigger_tick
        }
    }

    pub(crate) fn take_callback(&mut self) -> Option<TickCallback> {
        self.callback.take()
    }

    pub(crate) fn restore_callback(&mut self, callback: TickCallback) {
        if self.callback.is_none() {
            self.callback = Some(callback);
        }
    }
}

impl fmt::Debug for TickListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickListener")
            .field("id", &self.id)
            .field("trigger_tick", &self.trigger_tick)
            .field("once", &self.once)
            .field("in_flight", &self.callback.is_none())
            .finish()
    }
}
