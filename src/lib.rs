pub mod commands;
pub mod logging;
pub mod session;

pub use session::{CountdownSession, StopKind, TimerEvent};
