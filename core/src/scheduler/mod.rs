//! Tick scheduler
//!
//! This module provides:
//! - **Scheduler**: a tick counter advanced once per period, with play/stop/reset
//! - **Listeners**: callbacks bound to a tick offset, one-shot or recurring
//! - **Hooks**: optional observer slots for every tick and lifecycle transition
//!
//! # Tick Processing
//!
//! ```text
//! deadline reached
//!        │
//!        ▼
//!   tick_count += 1 ──► on_tick
//!        │
//!        ▼
//!   listeners (registration order, snapshot of ids)
//!        │     once:      tick_count == trigger_tick
//!        │     recurring: tick_count >= trigger_tick
//!        ▼
//!   ceiling reached? ──► reset() ──► on_stop, on_reset
//! ```
//!
//! Everything runs on one logical thread. Callbacks and hooks receive the
//! scheduler itself and may register, unregister, stop or reset from inside
//! a tick.

mod hooks;
mod listener;
mod tick_scheduler;


pub use hooks::{LifecycleHook, ListenerHook};
pub use listener::{ListenerId, TickCallback, TickListener};
pub use tick_scheduler::TickScheduler;
