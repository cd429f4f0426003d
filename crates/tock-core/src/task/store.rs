//! Task queue, active task and lifetime stats, persisted through a
//! [`KvStore`].
//!
//! Invariant: `active_id` is either `None` or the id of a queued task that is
//! not done. Every mutation that could break it repairs it to the first
//! not-done task in queue order.
//!
//! Every mutation writes the whole state (queue, stats, active id) before
//! returning. Rejected inputs and unknown ids return `Ok(None)` and write
//! nothing; `Err` only reports a failed write, after which the in-memory
//! state is back where it was before the call.

use tracing::{debug, info, warn};

use super::{Stats, Task, TaskFilter};
use crate::error::Result;
use crate::storage::KvStore;

pub const KEY_TASKS: &str = "tock_tasks";
pub const KEY_STATS: &str = "tock_stats";
pub const KEY_ACTIVE_ID: &str = "tock_aid";

/// State as it was before a mutation, restored when the write fails.
struct Checkpoint {
    tasks: Vec<Task>,
    stats: Stats,
    active_id: Option<String>,
}

pub struct TaskStore<S: KvStore> {
    backend: S,
    tasks: Vec<Task>,
    stats: Stats,
    active_id: Option<String>,
}

impl<S: KvStore> TaskStore<S> {
    /// Load state from `backend`. Missing or corrupt entries load as empty
    /// defaults instead of failing.
    pub fn load(backend: S) -> Self {
        let tasks = load_tasks(&backend);
        let stats = load_stats(&backend);
        let active_id = match backend.get(KEY_ACTIVE_ID) {
            Ok(id) => id.filter(|id| !id.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read active task id, starting without one");
                None
            }
        };

        let mut store = Self {
            backend,
            tasks,
            stats,
            active_id,
        };
        if !store.active_is_valid() {
            warn!(active_id = ?store.active_id, "stored active task is missing or done, repairing");
            store.repair_active();
        }
        debug!(tasks = store.tasks.len(), active = ?store.active_id, "task store loaded");
        store
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Tasks matching `filter`, in queue order.
    pub fn tasks(&self, filter: TaskFilter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn active_task(&self) -> Option<Task> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<String> {
        self.active_id.clone()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Add a task at the front of the queue. It becomes active when nothing
    /// else is. `None` or `Some(0)` minutes takes the default duration.
    pub fn add_task(&mut self, name: &str, duration_minutes: Option<u32>) -> Result<Option<Task>> {
        if name.trim().is_empty() {
            debug!("rejected task with empty name");
            return Ok(None);
        }
        let task = Task::new(name, duration_minutes.unwrap_or(0));
        let before = self.checkpoint();
        self.tasks.insert(0, task.clone());

        let active_open = self
            .active_task()
            .is_some_and(|active| !active.done);
        if !active_open {
            self.active_id = Some(task.id.clone());
        }
        info!(id = %task.id, name = %task.name, minutes = task.duration_minutes, "task added");
        self.commit(before)?;
        Ok(Some(task))
    }

    /// Remove a task unconditionally. Asking the user first is the caller's job.
    pub fn delete_task(&mut self, id: &str) -> Result<Option<Task>> {
        let Some(pos) = self.position(id) else {
            return Ok(None);
        };
        let before = self.checkpoint();
        let removed = self.tasks.remove(pos);
        if self.active_id.as_deref() == Some(id) {
            self.repair_active();
        }
        info!(id = %removed.id, "task deleted");
        self.commit(before)?;
        Ok(Some(removed))
    }

    /// Mark the active task done and move on to the next open one.
    pub fn complete_active(&mut self) -> Result<Option<Task>> {
        let before = self.checkpoint();
        let completed = self.mark_active_done();
        if completed.is_some() {
            self.commit(before)?;
        }
        Ok(completed)
    }

    /// Book a finished focus interval: count the session, then complete the
    /// active task, in one write. Returns the completed task, if any.
    pub fn finish_focus_session(&mut self, minutes: f64) -> Result<Option<Task>> {
        let before = self.checkpoint();
        self.stats.record_session(minutes);
        debug!(minutes, total = self.stats.total_focus_minutes, "session recorded");
        let completed = self.mark_active_done();
        self.commit(before)?;
        Ok(completed)
    }

    /// Reopen a task, bump its repeat count, move it to the front and make
    /// it active.
    pub fn repeat_task(&mut self, id: &str) -> Result<Option<Task>> {
        let Some(pos) = self.position(id) else {
            return Ok(None);
        };
        let before = self.checkpoint();
        let mut task = self.tasks.remove(pos);
        task.done = false;
        task.repeat_count += 1;
        self.tasks.insert(0, task.clone());
        self.active_id = Some(task.id.clone());
        info!(id = %task.id, repeats = task.repeat_count, "task repeated");
        self.commit(before)?;
        Ok(Some(task))
    }

    /// Make an open task the active one.
    pub fn set_active(&mut self, id: &str) -> Result<Option<Task>> {
        let Some(task) = self.get(id).filter(|t| !t.done) else {
            return Ok(None);
        };
        let before = self.checkpoint();
        self.active_id = Some(task.id.clone());
        debug!(id = %task.id, "active task selected");
        self.commit(before)?;
        Ok(Some(task))
    }

    /// Drop every done task. Returns how many were removed.
    pub fn clear_done(&mut self) -> Result<usize> {
        let before = self.checkpoint();
        self.tasks.retain(|t| !t.done);
        let removed = before.tasks.len() - self.tasks.len();
        if !self.active_is_valid() {
            self.repair_active();
        }
        info!(removed, "cleared done tasks");
        self.commit(before)?;
        Ok(removed)
    }

    /// Count a completed focus interval of `minutes` length.
    pub fn record_session(&mut self, minutes: f64) -> Result<Stats> {
        let before = self.checkpoint();
        self.stats.record_session(minutes);
        debug!(minutes, total = self.stats.total_focus_minutes, "session recorded");
        self.commit(before)?;
        Ok(self.stats)
    }

    pub fn reset_stats(&mut self) -> Result<()> {
        let before = self.checkpoint();
        self.stats = Stats::default();
        info!("stats reset");
        self.commit(before)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn active_is_valid(&self) -> bool {
        match self.active_id.as_deref() {
            None => true,
            Some(id) => self.tasks.iter().any(|t| t.id == id && !t.done),
        }
    }

    fn repair_active(&mut self) {
        self.active_id = self.tasks.iter().find(|t| !t.done).map(|t| t.id.clone());
    }

    fn mark_active_done(&mut self) -> Option<Task> {
        let pos = self.active_id.as_deref().and_then(|id| self.position(id))?;
        self.tasks[pos].done = true;
        self.stats.tasks_done += 1;
        let completed = self.tasks[pos].clone();
        self.repair_active();
        info!(id = %completed.id, next = ?self.active_id, "task completed");
        Some(completed)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tasks: self.tasks.clone(),
            stats: self.stats,
            active_id: self.active_id.clone(),
        }
    }

    /// Write the current state. On failure the in-memory state rolls back to
    /// `before` and is written again, so keys that were already overwritten
    /// get their old values back.
    fn commit(&mut self, before: Checkpoint) -> Result<()> {
        let Err(e) = self.persist() else {
            return Ok(());
        };
        warn!(error = %e, "write failed, rolling back");
        self.tasks = before.tasks;
        self.stats = before.stats;
        self.active_id = before.active_id;
        if let Err(restore) = self.persist() {
            warn!(error = %restore, "could not restore previous state in backing store");
        }
        Err(e)
    }

    fn persist(&mut self) -> Result<()> {
        let tasks = serde_json::to_string(&self.tasks)?;
        let stats = serde_json::to_string(&self.stats)?;
        self.backend.set(KEY_TASKS, &tasks)?;
        self.backend.set(KEY_STATS, &stats)?;
        match &self.active_id {
            Some(id) => self.backend.set(KEY_ACTIVE_ID, id)?,
            None => self.backend.remove(KEY_ACTIVE_ID)?,
        }
        Ok(())
    }
}

fn load_tasks<S: KvStore>(backend: &S) -> Vec<Task> {
    let raw = match backend.get(KEY_TASKS) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "could not read task queue, starting empty");
            return Vec::new();
        }
    };
    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "task queue is corrupt, starting empty");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Task>(entry) {
            Ok(mut task) => {
                task.name = task.name.trim().to_string();
                if task.name.is_empty() {
                    warn!(id = %task.id, "dropping stored task without a name");
                    None
                } else {
                    Some(task)
                }
            }
            Err(e) => {
                warn!(error = %e, "dropping unreadable stored task");
                None
            }
        })
        .collect()
}

fn load_stats<S: KvStore>(backend: &S) -> Stats {
    match backend.get(KEY_STATS) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "stats are corrupt, starting from zero");
            Stats::default()
        }),
        Ok(None) => Stats::default(),
        Err(e) => {
            warn!(error = %e, "could not read stats, starting from zero");
            Stats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{FailWrites, FlakyStore};
    use crate::storage::MemoryStore;

    fn store() -> TaskStore<MemoryStore> {
        TaskStore::load(MemoryStore::new())
    }

    #[test]
    fn first_task_becomes_active() {
        let mut store = store();
        let task = store.add_task("Write report", Some(25)).unwrap().unwrap();
        assert_eq!(store.active_id(), Some(task.id.clone()));
        assert_eq!(task.duration_minutes, 25);
    }

    #[test]
    fn later_tasks_do_not_steal_active() {
        let mut store = store();
        let a = store.add_task("A", None).unwrap().unwrap();
        let b = store.add_task("B", None).unwrap().unwrap();
        assert_eq!(store.active_id(), Some(a.id));
        assert_eq!(store.all_tasks()[0].id, b.id, "newest first");
    }

    #[test]
    fn blank_name_is_rejected_without_writing() {
        let mut store = store();
        assert!(store.add_task("   ", Some(10)).unwrap().is_none());
        assert!(store.is_empty());
        assert!(store.backend().is_empty());
    }

    #[test]
    fn zero_minutes_take_default() {
        let mut store = store();
        let task = store.add_task("x", Some(0)).unwrap().unwrap();
        assert_eq!(task.duration_minutes, 25);
    }

    #[test]
    fn complete_without_active_is_noop() {
        let mut store = store();
        assert!(store.complete_active().unwrap().is_none());
        assert_eq!(store.stats(), Stats::default());
    }

    #[test]
    fn complete_moves_to_next_open_task() {
        let mut store = store();
        let a = store.add_task("A", None).unwrap().unwrap();
        let b = store.add_task("B", None).unwrap().unwrap();

        let done = store.complete_active().unwrap().unwrap();
        assert_eq!(done.id, a.id);
        assert!(done.done);
        assert_eq!(store.active_id(), Some(b.id));
        assert_eq!(store.stats().tasks_done, 1);

        store.complete_active().unwrap();
        assert_eq!(store.active_id(), None);
        assert_eq!(store.stats().tasks_done, 2);
    }

    #[test]
    fn delete_active_repairs_to_first_open() {
        let mut store = store();
        let a = store.add_task("A", None).unwrap().unwrap();
        let b = store.add_task("B", None).unwrap().unwrap();
        assert_eq!(store.active_id(), Some(a.id.clone()));

        store.delete_task(&a.id).unwrap();
        assert_eq!(store.active_id(), Some(b.id.clone()));
        store.delete_task(&b.id).unwrap();
        assert_eq!(store.active_id(), None);
        assert!(store.delete_task("missing").unwrap().is_none());
    }

    #[test]
    fn repeat_reopens_and_moves_to_front() {
        let mut store = store();
        let a = store.add_task("A", None).unwrap().unwrap();
        store.add_task("B", None).unwrap();
        store.complete_active().unwrap();

        let repeated = store.repeat_task(&a.id).unwrap().unwrap();
        assert!(!repeated.done);
        assert_eq!(repeated.repeat_count, 1);
        assert_eq!(store.all_tasks()[0].id, a.id);
        assert_eq!(store.active_id(), Some(a.id));
        assert!(store.repeat_task("missing").unwrap().is_none());
    }

    #[test]
    fn set_active_refuses_done_and_missing() {
        let mut store = store();
        let a = store.add_task("A", None).unwrap().unwrap();
        let b = store.add_task("B", None).unwrap().unwrap();
        assert_eq!(store.set_active(&b.id).unwrap().unwrap().id, b.id);
        store.complete_active().unwrap();

        assert!(store.set_active(&b.id).unwrap().is_none());
        assert!(store.set_active("nope").unwrap().is_none());
        assert_eq!(store.active_id(), Some(a.id));
    }

    #[test]
    fn clear_done_is_idempotent() {
        let mut store = store();
        store.add_task("A", None).unwrap();
        store.add_task("B", None).unwrap();
        store.complete_active().unwrap();

        assert_eq!(store.clear_done().unwrap(), 1);
        let first = store.all_tasks();
        assert_eq!(store.clear_done().unwrap(), 0);
        assert_eq!(store.all_tasks(), first);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn filters_preserve_order() {
        let mut store = store();
        store.add_task("A", None).unwrap();
        store.add_task("B", None).unwrap();
        store.add_task("C", None).unwrap();
        store.complete_active().unwrap();

        let names = |f| -> Vec<String> { store.tasks(f).into_iter().map(|t| t.name).collect() };
        assert_eq!(names(TaskFilter::All), ["C", "B", "A"]);
        assert_eq!(names(TaskFilter::Active), ["C", "B"]);
        assert_eq!(names(TaskFilter::Done), ["A"]);
    }

    #[test]
    fn queries_are_copies() {
        let mut store = store();
        store.add_task("A", None).unwrap();
        let mut listed = store.all_tasks();
        listed[0].done = true;
        assert!(!store.all_tasks()[0].done);
    }

    #[test]
    fn record_session_rounds_and_persists() {
        let mut store = store();
        store.record_session(24.6).unwrap();
        let stats = store.record_session(0.2).unwrap();
        assert_eq!(stats.sessions_completed, 2);
        assert_eq!(stats.total_focus_minutes, 25);

        let reloaded = TaskStore::load(store.into_backend());
        assert_eq!(reloaded.stats(), stats);
    }

    #[test]
    fn reset_stats_zeroes() {
        let mut store = store();
        store.record_session(25.0).unwrap();
        store.reset_stats().unwrap();
        assert_eq!(store.stats(), Stats::default());
    }

    #[test]
    fn reload_is_identical() {
        let mut store = store();
        let a = store.add_task("A", Some(10)).unwrap().unwrap();
        store.add_task("B", Some(20)).unwrap();
        store.complete_active().unwrap();
        store.repeat_task(&a.id).unwrap();
        store.record_session(10.0).unwrap();

        let tasks = store.all_tasks();
        let stats = store.stats();
        let active = store.active_id();

        let reloaded = TaskStore::load(store.into_backend());
        assert_eq!(reloaded.all_tasks(), tasks);
        assert_eq!(reloaded.stats(), stats);
        assert_eq!(reloaded.active_id(), active);
    }

    #[test]
    fn corrupt_backend_loads_defaults() {
        let mut backend = MemoryStore::new();
        backend.set(KEY_TASKS, "{not json").unwrap();
        backend.set(KEY_STATS, "oops").unwrap();
        backend.set(KEY_ACTIVE_ID, "ghost").unwrap();

        let store = TaskStore::load(backend);
        assert!(store.is_empty());
        assert_eq!(store.stats(), Stats::default());
        assert_eq!(store.active_id(), None);
    }

    #[test]
    fn bad_entries_are_dropped_individually() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                KEY_TASKS,
                r#"[{"id":"1","name":"keep","duration_minutes":0},{"id":"2"},{"id":"3","name":"  "}]"#,
            )
            .unwrap();
        backend.set(KEY_ACTIVE_ID, "").unwrap();

        let store = TaskStore::load(backend);
        let tasks = store.all_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].duration_minutes, 25);
        assert_eq!(store.active_id(), None);
    }

    #[test]
    fn stale_active_id_is_repaired_on_load() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                KEY_TASKS,
                r#"[{"id":"a","name":"A","done":true},{"id":"b","name":"B"}]"#,
            )
            .unwrap();
        backend.set(KEY_ACTIVE_ID, "a").unwrap();

        let store = TaskStore::load(backend);
        assert_eq!(store.active_id().as_deref(), Some("b"));
    }

    #[test]
    fn no_active_id_key_without_active_task() {
        let mut store = store();
        let a = store.add_task("A", None).unwrap().unwrap();
        store.delete_task(&a.id).unwrap();
        assert!(store.backend().get(KEY_ACTIVE_ID).unwrap().is_none());
        assert_eq!(store.backend().get(KEY_TASKS).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let backend = FlakyStore::default();
        backend.fail.set(FailWrites::All);
        let mut store = TaskStore::load(backend);

        assert!(store.add_task("A", Some(5)).is_err());
        assert!(store.is_empty());
        assert_eq!(store.active_id(), None);

        let reloaded = TaskStore::load(store.into_backend().inner);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn partial_write_is_rolled_back_in_backend() {
        let backend = FlakyStore::default();
        let fail = std::rc::Rc::clone(&backend.fail);
        let mut store = TaskStore::load(backend);
        let a = store.add_task("A", Some(5)).unwrap().unwrap();
        store.add_task("B", Some(5)).unwrap();

        // Queue is written before stats, so only the stats write fails.
        fail.set(FailWrites::Key(KEY_STATS));
        assert!(store.complete_active().is_err());
        assert!(!store.get(&a.id).unwrap().done);
        assert_eq!(store.active_id(), Some(a.id.clone()));
        assert_eq!(store.stats().tasks_done, 0);

        fail.set(FailWrites::Never);
        let reloaded = TaskStore::load(store.into_backend().inner);
        assert!(!reloaded.get(&a.id).unwrap().done);
        assert_eq!(reloaded.active_id(), Some(a.id));
    }

    #[test]
    fn failed_stats_reset_keeps_totals() {
        let backend = FlakyStore::default();
        let fail = std::rc::Rc::clone(&backend.fail);
        let mut store = TaskStore::load(backend);
        store.record_session(25.0).unwrap();

        fail.set(FailWrites::All);
        assert!(store.reset_stats().is_err());
        assert_eq!(store.stats().sessions_completed, 1);
        assert!(store.record_session(25.0).is_err());
        assert_eq!(store.stats().total_focus_minutes, 25);
    }

    #[test]
    fn finish_focus_session_books_session_and_task() {
        let mut store = store();
        let a = store.add_task("A", Some(25)).unwrap().unwrap();
        let b = store.add_task("B", Some(10)).unwrap().unwrap();

        let done = store.finish_focus_session(25.0).unwrap().unwrap();
        assert_eq!(done.id, a.id);
        let stats = store.stats();
        assert_eq!(stats.sessions_completed, 1);
        assert_eq!(stats.total_focus_minutes, 25);
        assert_eq!(stats.tasks_done, 1);
        assert_eq!(store.active_id(), Some(b.id));

        let reloaded = TaskStore::load(store.into_backend());
        assert_eq!(reloaded.stats(), stats);
        assert!(reloaded.get(&a.id).unwrap().done);
    }

    #[test]
    fn finish_focus_session_without_active_task_still_counts() {
        let mut store = store();
        assert!(store.finish_focus_session(25.0).unwrap().is_none());
        assert_eq!(store.stats().sessions_completed, 1);
        assert_eq!(store.stats().tasks_done, 0);
    }
}
