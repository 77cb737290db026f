//! The tick scheduler
//!
//! Owns the tick counter, the listener registry and the hook slots.
//! Periodic execution is a pending deadline: `play()` arms it, `stop()`
//! drops it, and `next_tick()` sleeps until it and processes one tick.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::hooks::{Hooks, Lifecycle};
use super::{ListenerId, TickCallback, TickListener};
use crate::config::SchedulerConfig;

/// Tick counter with listeners and play/stop/reset lifecycle
pub struct TickScheduler {
    tick_count: u64,
    running: bool,
    tick_period: Duration,
    /// Auto-reset once `tick_count` reaches this (0 = unlimited)
    tick_ceiling: u64,
    listeners: Vec<TickListener>,
    next_listener_id: u64,
    /// Next firing; `Some` exactly while running
    deadline: Option<Instant>,
    hooks: Hooks,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    /// Scheduler with a 1000 ms period and a ceiling of 50 ticks
    pub fn new() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            tick_count: 0,
            running: false,
            tick_period: Duration::from_millis(config.tick_period_ms.max(1)),
            tick_ceiling: config.tick_ceiling,
            listeners: Vec::new(),
            next_listener_id: 0,
            deadline: None,
            hooks: Hooks::default(),
        }
    }

    /// Start counting from a previously persisted tick count
    pub fn resume_at(mut self, tick_count: u64) -> Self {
        self.tick_count = tick_count;
        self
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Takes effect from the next deadline; zero is clamped to 1 ms
    pub fn set_tick_period_ms(&mut self, period_ms: u64) {
        self.tick_period = Duration::from_millis(period_ms.max(1));
    }

    pub fn tick_ceiling(&self) -> u64 {
        self.tick_ceiling
    }

    pub fn set_tick_ceiling(&mut self, ceiling: u64) {
        self.tick_ceiling = ceiling;
    }

    /// Registered listeners in registration order
    pub fn listeners(&self) -> &[TickListener] {
        &self.listeners
    }

    pub fn listener(&self, id: ListenerId) -> Option<&TickListener> {
        self.listeners.iter().find(|l| l.id == id)
    }

    fn listener_mut(&mut self, id: ListenerId) -> Option<&mut TickListener> {
        self.listeners.iter_mut().find(|l| l.id == id)
    }

    // ─── Hooks ──────────────────────────────────────────────────────────────

    pub fn on_tick(&mut self, hook: impl FnMut(&mut TickScheduler) + 'static) {
        self.hooks.tick = Some(Box::new(hook));
    }

    pub fn on_play(&mut self, hook: impl FnMut(&mut TickScheduler) + 'static) {
        self.hooks.play = Some(Box::new(hook));
    }

    pub fn on_stop(&mut self, hook: impl FnMut(&mut TickScheduler) + 'static) {
        self.hooks.stop = Some(Box::new(hook));
    }

    pub fn on_reset(&mut self, hook: impl FnMut(&mut TickScheduler) + 'static) {
        self.hooks.reset = Some(Box::new(hook));
    }

    pub fn on_listener_added(&mut self, hook: impl FnMut(&TickListener) + 'static) {
        self.hooks.listener_added = Some(Box::new(hook));
    }

    pub fn on_listener_removed(&mut self, hook: impl FnMut(&TickListener) + 'static) {
        self.hooks.listener_removed = Some(Box::new(hook));
    }

    /// Run a lifecycle hook with access to the scheduler.
    ///
    /// The handler is moved out of its slot for the call, so a transition
    /// triggered from inside its own hook does not re-enter it. If the
    /// handler installed a replacement meanwhile, the replacement wins.
    fn emit(&mut self, which: Lifecycle) {
        let Some(mut hook) = self.hooks.slot(which).take() else {
            return;
        };
        trace!(hook = which.as_str(), "Dispatching hook");
        hook(self);
        let slot = self.hooks.slot(which);
        if slot.is_none() {
            *slot = Some(hook);
        }
    }

    // ─── Listener registry ──────────────────────────────────────────────────

    /// Register a one-shot listener firing when the count equals `trigger_tick`
    pub fn register<F>(&mut self, trigger_tick: u64, callback: F) -> Option<ListenerId>
    where
        F: FnMut(&mut TickScheduler) + 'static,
    {
        self.register_with(trigger_tick, Some(Box::new(callback)), true)
    }

    /// Register a listener firing on every tick from `trigger_tick` onward
    pub fn register_recurring<F>(&mut self, trigger_tick: u64, callback: F) -> Option<ListenerId>
    where
        F: FnMut(&mut TickScheduler) + 'static,
    {
        self.register_with(trigger_tick, Some(Box::new(callback)), false)
    }

    /// Register a listener.
    ///
    /// Returns `None` and registers nothing when `trigger_tick` is 0 or the
    /// callback is missing. Callers are expected to tolerate the silent drop.
    pub fn register_with(
        &mut self,
        trigger_tick: u64,
        callback: Option<TickCallback>,
        once: bool,
    ) -> Option<ListenerId> {
        let Some(callback) = callback else {
            warn!(trigger_tick, "Ignoring tick listener without a callback");
            return None;
        };
        if trigger_tick == 0 {
            warn!("Ignoring tick listener with trigger tick 0");
            return None;
        }

        let id = ListenerId::from(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners
            .push(TickListener::new(id, trigger_tick, once, callback));
        debug!(listener_id = id.get(), trigger_tick, once, "Tick listener registered");

        if let (Some(hook), Some(listener)) =
            (self.hooks.listener_added.as_mut(), self.listeners.last())
        {
            hook(listener);
        }
        Some(id)
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unregister(&mut self, id: ListenerId) {
        let Some(index) = self.listeners.iter().position(|l| l.id == id) else {
            return;
        };
        if let Some(hook) = self.hooks.listener_removed.as_mut() {
            hook(&self.listeners[index]);
        }
        self.listeners.remove(index);
        debug!(listener_id = id.get(), "Tick listener removed");
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Start ticking. Restarts the period if already running.
    pub fn play(&mut self) {
        if self.deadline.is_some() {
            self.stop();
        }
        self.emit(Lifecycle::Play);
        self.running = true;
        self.deadline = Some(Instant::now() + self.tick_period);
        info!(
            tick = self.tick_count,
            period_ms = self.tick_period.as_millis() as u64,
            ceiling = self.tick_ceiling,
            "Scheduler playing"
        );
    }

    /// Stop ticking. Does nothing when no periodic execution is active.
    pub fn stop(&mut self) {
        if self.deadline.take().is_none() {
            return;
        }
        self.running = false;
        info!(tick = self.tick_count, "Scheduler stopped");
        self.emit(Lifecycle::Stop);
    }

    /// Stop, zero the count and notify. Registered listeners are kept.
    ///
    /// `on_stop` fires before `on_reset` even when the scheduler was idle.
    pub fn reset(&mut self) {
        if self.deadline.is_some() {
            self.stop();
        } else {
            self.running = false;
            self.emit(Lifecycle::Stop);
        }
        self.tick_count = 0;
        debug!("Scheduler reset");
        self.emit(Lifecycle::Reset);
    }

    /// Wait for the pending deadline and process one tick.
    ///
    /// Never resolves while stopped. Cancel-safe: dropping the future before
    /// the deadline leaves the scheduler untouched.
    pub async fn next_tick(&mut self) {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline).await;

        // A late wake-up skips the missed periods instead of bursting
        let now = Instant::now();
        let mut next = deadline + self.tick_period;
        if next <= now {
            next = now + self.tick_period;
        }
        self.deadline = Some(next);

        self.tick();
    }

    /// Process one periodic firing.
    pub fn tick(&mut self) {
        if !self.running {
            self.stop();
            return;
        }

        self.tick_count += 1;
        debug!(tick = self.tick_count, "Tick");
        self.emit(Lifecycle::Tick);

        self.fire_listeners();

        if self.tick_ceiling != 0 && self.tick_count >= self.tick_ceiling {
            info!(
                tick = self.tick_count,
                ceiling = self.tick_ceiling,
                "Tick ceiling reached"
            );
            self.reset();
        }
    }

    /// Run every listener due at the current count.
    ///
    /// The due set is chosen up front. A listener removed by an earlier
    /// callback in the same pass is skipped; one added during the pass waits
    /// for the next tick.
    fn fire_listeners(&mut self) {
        let tick = self.tick_count;
        let due: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|l| l.fires_at(tick))
            .map(|l| l.id)
            .collect();

        for id in due {
            let Some(mut callback) = self.listener_mut(id).and_then(TickListener::take_callback)
            else {
                continue;
            };
            callback(self);
            if let Some(listener) = self.listener_mut(id) {
                listener.restore_callback(callback);
            }
        }
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickScheduler")
            .field("tick_count", &self.tick_count)
            .field("running", &self.running)
            .field("tick_period", &self.tick_period)
            .field("tick_ceiling", &self.tick_ceiling)
            .field("listeners", &self.listeners)
            .field("next_listener_id", &self.next_listener_id)
            .field("hooks", &self.hooks.installed())
            .finish()
    }
}
