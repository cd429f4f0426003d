//! Glue between the session engine and the task store.
//!
//! The coordinator owns one [`SessionEngine`] and one [`TaskStore`]. Engine
//! commands go through it so that every produced event reaches the listener
//! in order and finished focus intervals are booked against the active task.
//! Task selection pushes the task's duration into the engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{SessionEvent, SessionListener};
use crate::storage::KvStore;
use crate::task::{Stats, Task, TaskStore};
use crate::timer::{SessionEngine, SessionMode, Ticker};

/// Sent to the notifier when an interval runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalNotice {
    pub mode: SessionMode,
    /// Name of the task that is active after the interval was booked.
    pub next_task: Option<String>,
}

impl IntervalNotice {
    pub fn heading(&self) -> &'static str {
        match self.mode {
            SessionMode::Focus => "TIME'S UP",
            SessionMode::Break => "BREAK OVER",
        }
    }

    pub fn message(&self) -> String {
        match (self.mode, &self.next_task) {
            (SessionMode::Focus, Some(name)) => format!("Next: \"{name}\""),
            (SessionMode::Focus, None) => "All tasks done. Great work!".to_string(),
            (SessionMode::Break, _) => "Back to it, you've got this.".to_string(),
        }
    }
}

/// End-of-interval alarm (sound, desktop notification, terminal bell).
pub trait Notifier {
    fn interval_ended(&mut self, notice: &IntervalNotice);
}

impl<F> Notifier for F
where
    F: FnMut(&IntervalNotice),
{
    fn interval_ended(&mut self, notice: &IntervalNotice) {
        self(notice)
    }
}

pub struct Coordinator<S: KvStore> {
    engine: SessionEngine,
    store: TaskStore<S>,
    listener: Option<Box<dyn SessionListener>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl<S: KvStore> Coordinator<S> {
    pub fn new(engine: SessionEngine, store: TaskStore<S>) -> Self {
        Self {
            engine,
            store,
            listener: None,
            notifier: None,
        }
    }

    pub fn with_listener(mut self, listener: impl SessionListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    // ── Engine ───────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<()> {
        let events = self.engine.start();
        self.dispatch(events)
    }

    pub fn pause(&mut self) -> Result<()> {
        let events = self.engine.pause();
        self.dispatch(events)
    }

    pub fn toggle(&mut self) -> Result<()> {
        let events = self.engine.toggle();
        self.dispatch(events)
    }

    pub fn reset(&mut self) -> Result<()> {
        let events = self.engine.reset();
        self.dispatch(events)
    }

    pub fn set_mode(&mut self, mode: SessionMode) -> Result<()> {
        let events = self.engine.set_mode(mode);
        self.dispatch(events)
    }

    pub fn set_focus_duration(&mut self, secs: u64) -> Result<()> {
        let events = self.engine.set_focus_duration(secs);
        self.dispatch(events)
    }

    pub fn set_break_duration(&mut self, secs: u64) -> Result<()> {
        let events = self.engine.set_break_duration(secs);
        self.dispatch(events)
    }

    /// Apply one second of progress.
    pub fn tick(&mut self) -> Result<()> {
        let events = self.engine.tick();
        self.dispatch(events)
    }

    /// Tick until the engine stops, either because the interval ended or
    /// because something paused it. Dropping the returned future cancels the
    /// pending tick and leaves the engine where the last tick put it.
    ///
    /// The ticker is reset first, so a resumed countdown waits a full second
    /// before its first tick.
    pub async fn run_countdown<T: Ticker>(&mut self, ticker: &mut T) -> Result<()> {
        ticker.reset();
        while self.engine.is_running() {
            ticker.tick().await;
            self.tick()?;
        }
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, name: &str, duration_minutes: Option<u32>) -> Result<Option<Task>> {
        let task = self.store.add_task(name, duration_minutes)?;
        if let Some(task) = &task {
            self.apply_task_duration(task)?;
        }
        Ok(task)
    }

    pub fn select_task(&mut self, id: &str) -> Result<Option<Task>> {
        let task = self.store.set_active(id)?;
        if let Some(task) = &task {
            self.apply_task_duration(task)?;
        }
        Ok(task)
    }

    pub fn repeat_task(&mut self, id: &str) -> Result<Option<Task>> {
        let task = self.store.repeat_task(id)?;
        if let Some(task) = &task {
            self.apply_task_duration(task)?;
        }
        Ok(task)
    }

    /// Mark the active task done outside a session; the next open task
    /// takes over the focus duration.
    pub fn complete_active(&mut self) -> Result<Option<Task>> {
        let done = self.store.complete_active()?;
        if done.is_some() {
            self.sync_focus_to_active()?;
        }
        Ok(done)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Option<Task>> {
        self.store.delete_task(id)
    }

    pub fn clear_done(&mut self) -> Result<usize> {
        self.store.clear_done()
    }

    pub fn reset_stats(&mut self) -> Result<()> {
        self.store.reset_stats()
    }

    pub fn stats(&self) -> Stats {
        self.store.stats()
    }

    /// Load the active task's duration into the engine, if there is one.
    pub fn sync_focus_to_active(&mut self) -> Result<Option<Task>> {
        let active = self.store.active_task();
        if let Some(task) = &active {
            self.apply_task_duration(task)?;
        }
        Ok(active)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply_task_duration(&mut self, task: &Task) -> Result<()> {
        debug!(id = %task.id, secs = task.duration_secs(), "retargeting focus duration");
        let events = self.engine.set_focus_duration(task.duration_secs());
        self.dispatch(events)
    }

    fn dispatch(&mut self, events: Vec<SessionEvent>) -> Result<()> {
        for event in events {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_event(&event);
            }
            if let SessionEvent::End { mode } = event {
                self.finish_interval(mode)?;
            }
        }
        Ok(())
    }

    /// A failed write still rings the notifier; the error is returned after.
    fn finish_interval(&mut self, mode: SessionMode) -> Result<()> {
        let mut booked = Ok(());
        let next_task = match mode {
            SessionMode::Focus => {
                let minutes = self.engine.focus_duration_secs() as f64 / 60.0;
                booked = self.store.finish_focus_session(minutes).map(|_| ());
                if let Err(e) = &booked {
                    warn!(error = %e, "could not book finished focus session");
                }
                let next = self.store.active_task();
                if let Some(task) = &next {
                    self.apply_task_duration(task)?;
                }
                next.map(|t| t.name)
            }
            SessionMode::Break => None,
        };

        let notice = IntervalNotice { mode, next_task };
        info!(%mode, next = ?notice.next_task, "interval ended");
        if let Some(notifier) = self.notifier.as_mut() {
            notifier.interval_ended(&notice);
        }
        booked
    }
}
