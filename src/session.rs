//! Countdown session
//!
//! Binds a `TickScheduler` to the countdown settings. Scheduler hooks are
//! forwarded as `TimerEvent`s over an unbounded channel; the front end feeds
//! them back through `handle_event`, which renders the clock, persists
//! progress and rings the bell when the countdown completes.
//!
//! Events carry what they need to render, computed when the hook fired, so a
//! `duration` change queued behind them does not alter how they read.

use std::cell::Cell;
use std::rc::Rc;

use hashbrown::HashMap;
use lull_core::clock::{format_clock, parse_duration, remaining_secs};
use lull_core::config::Settings;
use lull_core::error::ClockError;
use lull_core::scheduler::{ListenerId, TickCallback, TickScheduler};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Scheduler activity, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Started { tick: u64, remaining: u64 },
    Ticked { tick: u64, remaining: u64 },
    Stopped { tick: u64, remaining: u64, kind: StopKind },
    Reset,
    ListenerAdded { id: ListenerId, trigger_tick: u64, once: bool },
    ListenerRemoved { id: ListenerId },
    Reminder { tick: u64, message: String },
}

/// What an `on_stop` notification meant at the time it fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// Paused before reaching the end
    Paused,
    /// Reached the ceiling
    Completed,
    /// Reset while nothing was playing
    Idle,
}

pub type EventReceiver = UnboundedReceiver<TimerEvent>;

pub struct CountdownSession {
    scheduler: TickScheduler,
    settings: Settings,
    /// Write settings through confy on every change
    persist: bool,
    /// Tick progress recorded in `settings` but not yet written
    unsaved: bool,
    reminders: HashMap<ListenerId, String>,
    events: UnboundedSender<TimerEvent>,
}

impl CountdownSession {
    /// Session whose progress and duration are saved to the settings file
    pub fn persistent(settings: Settings) -> (Self, EventReceiver) {
        let (mut session, events) = Self::in_memory(settings);
        session.persist = true;
        (session, events)
    }

    /// Session that never touches the settings file
    pub fn in_memory(settings: Settings) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut scheduler = TickScheduler::from_config(&settings.scheduler_config())
            .resume_at(settings.resume_point());
        forward_hooks(&mut scheduler, &tx);

        let session = Self {
            scheduler,
            settings,
            persist: false,
            unsaved: false,
            reminders: HashMap::new(),
            events: tx,
        };
        (session, rx)
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn duration_secs(&self) -> u64 {
        self.settings.duration_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        remaining_secs(self.settings.duration_secs, self.scheduler.tick_count())
    }

    /// Remaining time as `HH:MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs())
    }

    // ─── Controls ───────────────────────────────────────────────────────────

    pub fn play(&mut self) {
        self.scheduler.play();
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Play when idle, stop when running
    pub fn toggle(&mut self) {
        if self.scheduler.is_running() {
            self.scheduler.stop();
        } else {
            self.scheduler.play();
        }
    }

    pub fn reset(&mut self) {
        self.scheduler.reset();
    }

    /// Reset and switch to a new countdown length (e.g. `"25m"`)
    pub fn set_duration(&mut self, text: &str) -> Result<u64, ClockError> {
        let secs = parse_duration(text)?;
        self.scheduler.reset();
        self.scheduler.set_tick_ceiling(secs);
        self.settings.duration_secs = secs;
        self.settings.resume_ticks = 0;
        self.store();
        info!(duration_secs = secs, "Countdown duration changed");
        Ok(secs)
    }

    /// Reset and adopt a whole new set of settings
    pub fn replace_settings(&mut self, settings: Settings) {
        self.scheduler.reset();
        self.scheduler.set_tick_ceiling(settings.duration_secs);
        self.scheduler.set_tick_period_ms(settings.tick_period_ms);
        self.settings = settings;
    }

    /// Print `message` when the count reaches `trigger_tick` (every tick
    /// from then on when `recurring`). Returns `None` for tick 0.
    pub fn remind(&mut self, trigger_tick: u64, message: String, recurring: bool) -> Option<ListenerId> {
        let events = self.events.clone();
        let text = message.clone();
        let callback: TickCallback = Box::new(move |s: &mut TickScheduler| {
            let _ = events.send(TimerEvent::Reminder {
                tick: s.tick_count(),
                message: text.clone(),
            });
        });

        let id = self
            .scheduler
            .register_with(trigger_tick, Some(callback), !recurring)?;
        self.reminders.insert(id, message);
        Some(id)
    }

    /// Remove a reminder. Returns false if no such reminder exists.
    pub fn cancel(&mut self, id: ListenerId) -> bool {
        let known = self.scheduler.listener(id).is_some();
        self.scheduler.unregister(id);
        self.reminders.remove(&id);
        known
    }

    /// Wait for and process the next scheduler tick
    pub async fn next_tick(&mut self) {
        self.scheduler.next_tick().await;
    }

    /// Save the current position so the next start resumes from it
    pub fn shutdown(&mut self) {
        let ticks = self.scheduler.tick_count();
        if self.unsaved || self.settings.resume_ticks != ticks {
            self.settings.resume_ticks = ticks;
            self.store();
        }
    }

    // ─── Events ─────────────────────────────────────────────────────────────

    /// React to a scheduler event. Returns a line to show the user, if any.
    pub fn handle_event(&mut self, event: &TimerEvent) -> Option<String> {
        match event {
            TimerEvent::Started { remaining, .. } => {
                self.settings.resume_ticks = 0;
                self.store();
                Some(format!("playing from {}", format_clock(*remaining)))
            }
            // Kept in memory only; written on pause, reset or shutdown
            TimerEvent::Ticked { tick, remaining } => {
                self.settings.resume_ticks = *tick;
                self.unsaved = true;
                Some(format_clock(*remaining))
            }
            TimerEvent::Stopped {
                tick,
                kind: StopKind::Completed,
                ..
            } => {
                self.settings.resume_ticks = 0;
                self.store();
                info!(ticks = *tick, "Countdown complete");
                let bell = if self.settings.bell { "\x07" } else { "" };
                Some(format!("{bell}time's up"))
            }
            TimerEvent::Stopped {
                tick,
                remaining,
                kind: StopKind::Paused,
            } => {
                self.settings.resume_ticks = *tick;
                self.store();
                Some(format!("paused at {}", format_clock(*remaining)))
            }
            TimerEvent::Stopped {
                kind: StopKind::Idle,
                ..
            } => None,
            TimerEvent::Reset => {
                self.settings.resume_ticks = 0;
                self.store();
                Some(format_clock(self.settings.duration_secs))
            }
            TimerEvent::ListenerAdded { id, trigger_tick, once } => {
                debug!(listener_id = id.get(), trigger_tick, once, "Reminder added");
                None
            }
            TimerEvent::ListenerRemoved { id } => {
                debug!(listener_id = id.get(), "Reminder removed");
                None
            }
            TimerEvent::Reminder { tick, message } => Some(format!("[{tick}] {message}")),
        }
    }

    /// Multi-line summary for the `status` command
    pub fn status(&self) -> String {
        let state = if self.scheduler.is_running() {
            "running"
        } else {
            "stopped"
        };
        let mut out = format!(
            "state:     {state}\nelapsed:   {} / {} ticks\nremaining: {}\nperiod:    {} ms",
            self.scheduler.tick_count(),
            self.settings.duration_secs,
            self.display(),
            self.scheduler.tick_period().as_millis(),
        );

        if self.scheduler.listeners().is_empty() {
            out.push_str("\nreminders: none");
            return out;
        }
        out.push_str("\nreminders:");
        for listener in self.scheduler.listeners() {
            let kind = if listener.once { "at" } else { "every tick from" };
            let message = self
                .reminders
                .get(&listener.id)
                .map(String::as_str)
                .unwrap_or("");
            out.push_str(&format!(
                "\n  {} {kind} {}: {message}",
                listener.id, listener.trigger_tick
            ));
        }
        out
    }

    fn store(&mut self) {
        self.unsaved = false;
        if !self.persist {
            return;
        }
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "Failed to persist settings");
        }
    }
}

/// Install hooks that turn scheduler activity into `TimerEvent`s
fn forward_hooks(scheduler: &mut TickScheduler, tx: &UnboundedSender<TimerEvent>) {
    // Set between on_play and the matching on_stop
    let playing = Rc::new(Cell::new(false));

    let events = tx.clone();
    let p = Rc::clone(&playing);
    scheduler.on_play(move |s| {
        p.set(true);
        let _ = events.send(TimerEvent::Started {
            tick: s.tick_count(),
            remaining: remaining_at(s),
        });
    });

    let events = tx.clone();
    scheduler.on_tick(move |s| {
        let _ = events.send(TimerEvent::Ticked {
            tick: s.tick_count(),
            remaining: remaining_at(s),
        });
    });

    let events = tx.clone();
    scheduler.on_stop(move |s| {
        let ceiling = s.tick_ceiling();
        let kind = if !playing.replace(false) {
            StopKind::Idle
        } else if ceiling != 0 && s.tick_count() >= ceiling {
            StopKind::Completed
        } else {
            StopKind::Paused
        };
        let _ = events.send(TimerEvent::Stopped {
            tick: s.tick_count(),
            remaining: remaining_at(s),
            kind,
        });
    });

    let events = tx.clone();
    scheduler.on_reset(move |_| {
        let _ = events.send(TimerEvent::Reset);
    });

    let events = tx.clone();
    scheduler.on_listener_added(move |l| {
        let _ = events.send(TimerEvent::ListenerAdded {
            id: l.id,
            trigger_tick: l.trigger_tick,
            once: l.once,
        });
    });

    let events = tx.clone();
    scheduler.on_listener_removed(move |l| {
        let _ = events.send(TimerEvent::ListenerRemoved { id: l.id });
    });
}

/// The session keeps the ceiling equal to the countdown duration
fn remaining_at(scheduler: &TickScheduler) -> u64 {
    remaining_secs(scheduler.tick_ceiling(), scheduler.tick_count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(duration_secs: u64) -> (CountdownSession, EventReceiver) {
        CountdownSession::in_memory(Settings {
            duration_secs,
            ..Default::default()
        })
    }

    fn drain(events: &mut EventReceiver) -> Vec<TimerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn countdown_completes_and_rings() {
        let (mut session, mut events) = session(3);
        session.play();
        for _ in 0..3 {
            session.scheduler.tick();
        }

        let seen = drain(&mut events);
        assert_eq!(
            seen,
            vec![
                TimerEvent::Started { tick: 0, remaining: 3 },
                TimerEvent::Ticked { tick: 1, remaining: 2 },
                TimerEvent::Ticked { tick: 2, remaining: 1 },
                TimerEvent::Ticked { tick: 3, remaining: 0 },
                TimerEvent::Stopped {
                    tick: 3,
                    remaining: 0,
                    kind: StopKind::Completed
                },
                TimerEvent::Reset,
            ]
        );

        let lines: Vec<_> = seen.iter().filter_map(|e| session.handle_event(e)).collect();
        assert_eq!(lines[0], "playing from 00:00:03");
        assert_eq!(lines[1], "00:00:02");
        assert_eq!(lines[3], "00:00:00");
        assert_eq!(lines[4], "\x07time's up");
        assert_eq!(lines[5], "00:00:03");
        assert_eq!(session.settings().resume_ticks, 0);
        assert!(!session.scheduler().is_running());
    }

    #[test]
    fn bell_can_be_disabled() {
        let (mut session, _events) = CountdownSession::in_memory(Settings {
            duration_secs: 5,
            bell: false,
            ..Default::default()
        });
        let line = session.handle_event(&TimerEvent::Stopped {
            tick: 5,
            remaining: 0,
            kind: StopKind::Completed,
        });
        assert_eq!(line.as_deref(), Some("time's up"));
    }

    #[test]
    fn pause_reports_remaining_time() {
        let (mut session, mut events) = session(120);
        session.toggle();
        session.scheduler.tick();
        session.toggle();

        assert!(!session.scheduler().is_running());
        assert_eq!(session.display(), "00:01:59");
        let lines: Vec<_> = drain(&mut events)
            .iter()
            .filter_map(|e| session.handle_event(e))
            .collect();
        assert_eq!(lines.last().map(String::as_str), Some("paused at 00:01:59"));
    }

    #[test]
    fn tick_progress_is_remembered() {
        let (mut session, mut events) = session(60);
        session.play();
        session.scheduler.tick();
        session.scheduler.tick();
        for event in drain(&mut events) {
            session.handle_event(&event);
        }
        assert_eq!(session.settings().resume_ticks, 2);
    }

    #[test]
    fn resumes_from_saved_ticks() {
        let (session, _events) = CountdownSession::in_memory(Settings {
            duration_secs: 60,
            resume_ticks: 45,
            ..Default::default()
        });
        assert_eq!(session.scheduler().tick_count(), 45);
        assert_eq!(session.display(), "00:00:15");
    }

    #[test]
    fn set_duration_resets_and_sets_ceiling() {
        let (mut session, _events) = session(120);
        session.play();
        session.scheduler.tick();

        assert_eq!(session.set_duration("25m"), Ok(1500));
        assert_eq!(session.scheduler().tick_count(), 0);
        assert_eq!(session.scheduler().tick_ceiling(), 1500);
        assert!(!session.scheduler().is_running());
        assert_eq!(session.display(), "00:25:00");
    }

    fn lines(session: &mut CountdownSession, events: &mut EventReceiver) -> Vec<String> {
        drain(events)
            .iter()
            .filter_map(|e| session.handle_event(e))
            .collect()
    }

    #[test]
    fn shortening_duration_to_paused_count_does_not_ring() {
        let (mut session, mut events) = session(120);
        session.play();
        for _ in 0..30 {
            session.scheduler.tick();
        }
        session.stop();
        lines(&mut session, &mut events);

        session.set_duration("30").unwrap();

        assert_eq!(lines(&mut session, &mut events), vec!["00:00:30"]);
    }

    #[test]
    fn duration_change_while_running_reports_old_position() {
        let (mut session, mut events) = session(120);
        session.play();
        for _ in 0..30 {
            session.scheduler.tick();
        }
        lines(&mut session, &mut events);

        session.set_duration("30").unwrap();

        assert_eq!(
            lines(&mut session, &mut events),
            vec!["paused at 00:01:30", "00:00:30"]
        );
    }

    #[test]
    fn replacing_settings_does_not_ring() {
        let (mut session, mut events) = session(120);
        session.play();
        for _ in 0..50 {
            session.scheduler.tick();
        }
        session.stop();
        lines(&mut session, &mut events);

        session.replace_settings(Settings {
            duration_secs: 50,
            ..Default::default()
        });

        let shown = lines(&mut session, &mut events);
        assert!(shown.iter().all(|l| !l.contains("time's up")));
        assert_eq!(shown, vec!["00:00:50"]);
    }

    #[test]
    fn idle_reset_only_shows_full_duration() {
        let (mut session, mut events) = session(120);
        session.reset();
        assert_eq!(lines(&mut session, &mut events), vec!["00:02:00"]);

        session.play();
        session.scheduler.tick();
        session.stop();
        lines(&mut session, &mut events);
        session.reset();
        assert_eq!(lines(&mut session, &mut events), vec!["00:02:00"]);
    }

    #[test]
    fn ticks_are_written_on_pause_not_per_tick() {
        let (mut session, mut events) = session(60);
        session.play();
        session.scheduler.tick();
        session.scheduler.tick();
        lines(&mut session, &mut events);
        assert!(session.unsaved);
        assert_eq!(session.settings().resume_ticks, 2);

        session.stop();
        lines(&mut session, &mut events);
        assert!(!session.unsaved);
        assert_eq!(session.settings().resume_ticks, 2);
    }

    #[test]
    fn invalid_duration_leaves_session_alone() {
        let (mut session, _events) = session(120);
        session.play();
        session.scheduler.tick();

        assert!(session.set_duration("later").is_err());
        assert!(session.scheduler().is_running());
        assert_eq!(session.duration_secs(), 120);
    }

    #[test]
    fn reminders_fire_and_cancel() {
        let (mut session, mut events) = session(0);
        session.play();
        let once = session.remind(2, "stretch".to_string(), false).unwrap();
        let every = session.remind(3, "breathe".to_string(), true).unwrap();
        assert_eq!(session.remind(0, "never".to_string(), false), None);

        for _ in 0..4 {
            session.scheduler.tick();
        }
        assert!(session.cancel(every));
        assert!(!session.cancel(ListenerId::from(99)));
        session.scheduler.tick();

        let reminders: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                TimerEvent::Reminder { tick, message } => Some((tick, message)),
                _ => None,
            })
            .collect();
        assert_eq!(
            reminders,
            vec![
                (2, "stretch".to_string()),
                (3, "breathe".to_string()),
                (4, "breathe".to_string()),
            ]
        );
        assert!(session.status().contains(&format!("{once} at 2: stretch")));
    }

    #[test]
    fn listener_changes_are_forwarded() {
        let (mut session, mut events) = session(60);
        let id = session.remind(5, "hi".to_string(), false).unwrap();
        session.cancel(id);

        assert_eq!(
            drain(&mut events),
            vec![
                TimerEvent::ListenerAdded {
                    id,
                    trigger_tick: 5,
                    once: true
                },
                TimerEvent::ListenerRemoved { id },
            ]
        );
    }

    #[test]
    fn status_lists_state() {
        let (session, _events) = session(90);
        let status = session.status();
        assert!(status.contains("state:     stopped"));
        assert!(status.contains("elapsed:   0 / 90 ticks"));
        assert!(status.contains("remaining: 00:01:30"));
        assert!(status.contains("reminders: none"));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_arrive_through_next_tick() {
        let (mut session, mut events) = session(2);
        session.play();
        session.next_tick().await;
        session.next_tick().await;

        let seen = drain(&mut events);
        assert!(seen.contains(&TimerEvent::Stopped {
            tick: 2,
            remaining: 0,
            kind: StopKind::Completed
        }));
        assert_eq!(seen.last(), Some(&TimerEvent::Reset));
    }
}
