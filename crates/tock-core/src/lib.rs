//! # Tock Core Library
//!
//! Core logic for the Tock focus timer: a focus/break countdown paired with
//! a task queue and lifetime stats. Front-ends (the `tock` CLI, tests) drive
//! it through the [`Coordinator`].
//!
//! ## Architecture
//!
//! - **Session Engine**: a tick-counting state machine; the caller supplies
//!   ticks through a [`Ticker`]
//! - **Task Store**: ordered task queue with a single active task, persisted
//!   through any [`KvStore`]
//! - **Coordinator**: books finished focus intervals against the active task
//!   and keeps the focus duration in step with the selected task
//! - **Storage**: SQLite key-value table and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: focus/break countdown
//! - [`TaskStore`]: task queue and stats
//! - [`Coordinator`]: wiring between the two
//! - [`Database`]: SQLite-backed [`KvStore`]
//! - [`Config`]: application configuration

pub mod coordinator;
pub mod error;
pub mod events;
pub mod storage;
pub mod task;
pub mod timer;

pub use coordinator::{Coordinator, IntervalNotice, Notifier};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::{SessionEvent, SessionListener, SessionSnapshot};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use task::{Stats, Task, TaskFilter, TaskStore};
pub use timer::{InstantTicker, IntervalTicker, SessionEngine, SessionMode, SessionState, Ticker};
