//! Session engine implementation.
//!
//! The engine is a tick-counting state machine. It does not own a thread or
//! a timer: a [`Ticker`](super::Ticker) (or a test) calls `tick()` once per
//! second while the engine is running, and each tick is exactly one second
//! of progress regardless of scheduler jitter.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -start-> Running -pause-> Stopped
//!                  Running -tick (remaining == 0)-> Stopped + End
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::default();
//! engine.start();
//! // Once per second:
//! for event in engine.tick() { /* render, react to End */ }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SessionMode;
use crate::events::{SessionEvent, SessionSnapshot};
use crate::storage::config::TimerConfig;

pub const DEFAULT_FOCUS_SECS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u64 = 15 * 60;

/// Full engine state, including both configured durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub running: bool,
    pub mode: SessionMode,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub focus_duration_secs: u64,
    pub break_duration_secs: u64,
}

/// Core session engine.
///
/// Every command returns the events it produced, in order. An empty vector
/// means the command was rejected and nothing changed.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    mode: SessionMode,
    focus_duration_secs: u64,
    break_duration_secs: u64,
    total_secs: u64,
    remaining_secs: u64,
    running: bool,
}

impl SessionEngine {
    /// Create an engine in focus mode with a full, stopped countdown.
    ///
    /// A zero duration falls back to the default for that mode.
    pub fn new(focus_secs: u64, break_secs: u64) -> Self {
        let focus = if focus_secs == 0 { DEFAULT_FOCUS_SECS } else { focus_secs };
        let brk = if break_secs == 0 { DEFAULT_BREAK_SECS } else { break_secs };
        Self {
            mode: SessionMode::Focus,
            focus_duration_secs: focus,
            break_duration_secs: brk,
            total_secs: focus,
            remaining_secs: focus,
            running: false,
        }
    }

    pub fn from_config(config: &TimerConfig) -> Self {
        Self::new(
            u64::from(config.focus_minutes).saturating_mul(60),
            u64::from(config.break_minutes).saturating_mul(60),
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn focus_duration_secs(&self) -> u64 {
        self.focus_duration_secs
    }

    pub fn break_duration_secs(&self) -> u64 {
        self.break_duration_secs
    }

    pub fn duration_for(&self, mode: SessionMode) -> u64 {
        match mode {
            SessionMode::Focus => self.focus_duration_secs,
            SessionMode::Break => self.break_duration_secs,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            running: self.running,
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            running: self.running,
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            focus_duration_secs: self.focus_duration_secs,
            break_duration_secs: self.break_duration_secs,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Switch between focus and break. Rejected while running.
    pub fn set_mode(&mut self, mode: SessionMode) -> Vec<SessionEvent> {
        if self.running {
            debug!(%mode, "mode change rejected while running");
            return Vec::new();
        }
        self.mode = mode;
        self.rewind();
        vec![self.state_change()]
    }

    /// Update the focus duration. When in focus mode the countdown restarts
    /// from the new value, even mid-run.
    pub fn set_focus_duration(&mut self, secs: u64) -> Vec<SessionEvent> {
        self.set_duration(SessionMode::Focus, secs)
    }

    /// Update the break duration. When in break mode the countdown restarts
    /// from the new value, even mid-run.
    pub fn set_break_duration(&mut self, secs: u64) -> Vec<SessionEvent> {
        self.set_duration(SessionMode::Break, secs)
    }

    pub fn start(&mut self) -> Vec<SessionEvent> {
        if self.running || self.remaining_secs == 0 {
            return Vec::new();
        }
        self.running = true;
        debug!(mode = %self.mode, remaining = self.remaining_secs, "countdown started");
        vec![self.state_change()]
    }

    pub fn pause(&mut self) -> Vec<SessionEvent> {
        if !self.running {
            return Vec::new();
        }
        self.running = false;
        debug!(mode = %self.mode, remaining = self.remaining_secs, "countdown paused");
        vec![self.state_change()]
    }

    pub fn reset(&mut self) -> Vec<SessionEvent> {
        self.running = false;
        self.rewind();
        vec![self.state_change()]
    }

    pub fn toggle(&mut self) -> Vec<SessionEvent> {
        if self.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Advance the countdown by one second. A tick that arrives after the
    /// engine stopped is ignored.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let mut events = vec![SessionEvent::Tick {
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
        }];
        if self.remaining_secs == 0 {
            self.running = false;
            debug!(mode = %self.mode, "interval finished");
            events.push(self.state_change());
            events.push(SessionEvent::End { mode: self.mode });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_duration(&mut self, mode: SessionMode, secs: u64) -> Vec<SessionEvent> {
        if secs == 0 {
            debug!(%mode, "zero duration rejected");
            return Vec::new();
        }
        match mode {
            SessionMode::Focus => self.focus_duration_secs = secs,
            SessionMode::Break => self.break_duration_secs = secs,
        }
        if self.mode == mode {
            self.rewind();
        }
        vec![self.state_change()]
    }

    fn rewind(&mut self) {
        self.total_secs = self.duration_for(self.mode);
        self.remaining_secs = self.total_secs;
    }

    fn state_change(&self) -> SessionEvent {
        SessionEvent::StateChange(self.snapshot())
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_SECS, DEFAULT_BREAK_SECS)
    }
}
