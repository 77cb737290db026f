//! Observer slots
//!
//! Each slot holds at most one handler. Invoking an empty slot does nothing.

use super::{TickListener, TickScheduler};

/// Handler for tick and lifecycle transitions
pub type LifecycleHook = Box<dyn FnMut(&mut TickScheduler)>;

/// Handler for listener registration changes
pub type ListenerHook = Box<dyn FnMut(&TickListener)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Tick,
    Play,
    Stop,
    Reset,
}

impl Lifecycle {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Tick => "tick",
            Lifecycle::Play => "play",
            Lifecycle::Stop => "stop",
            Lifecycle::Reset => "reset",
        }
    }
}

#[derive(Default)]
pub(crate) struct Hooks {
    pub tick: Option<LifecycleHook>,
    pub play: Option<LifecycleHook>,
    pub stop: Option<LifecycleHook>,
    pub reset: Option<LifecycleHook>,
    pub listener_added: Option<ListenerHook>,
    pub listener_removed: Option<ListenerHook>,
}

impl Hooks {
    pub(crate) fn slot(&mut self, which: Lifecycle) -> &mut Option<LifecycleHook> {
        match which {
            Lifecycle::Tick => &mut self.tick,
            Lifecycle::Play => &mut self.play,
            Lifecycle::Stop => &mut self.stop,
            Lifecycle::Reset => &mut self.reset,
        }
    }

    /// Names of the occupied slots, for debug output
    pub(crate) fn installed(&self) -> Vec<&'static str> {
        [
            ("on_tick", self.tick.is_some()),
            ("on_play", self.play.is_some()),
            ("on_stop", self.stop.is_some()),
            ("on_reset", self.reset.is_some()),
            ("on_listener_added", self.listener_added.is_some()),
            ("on_listener_removed", self.listener_removed.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}
