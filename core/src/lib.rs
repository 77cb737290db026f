//! lull-core
//!
//! Tick scheduling for the lull countdown timer, plus the settings and
//! clock helpers its front end builds on.

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;

pub use clock::{format_clock, parse_duration, remaining_secs};
pub use config::{SchedulerConfig, Settings};
pub use error::{ClockError, ConfigError};
pub use scheduler::{ListenerId, TickListener, TickScheduler};
