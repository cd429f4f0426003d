//! Integration tests for full focus sessions.
//!
//! Drives the coordinator end to end: task added, focus duration taken from
//! the task, countdown run to zero, task and stats updated.

use tock_core::{
    Coordinator, InstantTicker, MemoryStore, SessionEngine, SessionMode, TaskStore,
};

fn coordinator() -> Coordinator<MemoryStore> {
    Coordinator::new(SessionEngine::default(), TaskStore::load(MemoryStore::new()))
}

#[test]
fn test_write_report_session() {
    let mut coord = coordinator();

    let task = coord.add_task("Write report", Some(25)).unwrap().unwrap();
    assert_eq!(coord.store().active_id(), Some(task.id.clone()));
    assert_eq!(coord.engine().focus_duration_secs(), 1500);

    coord.start().unwrap();
    let mut ticks = 0;
    while coord.engine().is_running() {
        coord.tick().unwrap();
        ticks += 1;
    }
    assert_eq!(ticks, 1500);

    let stats = coord.stats();
    assert_eq!(stats.tasks_done, 1);
    assert_eq!(stats.sessions_completed, 1);
    assert_eq!(stats.total_focus_minutes, 25);
    assert!(coord.store().get(&task.id).unwrap().done);
    assert_eq!(coord.store().active_id(), None);
    assert_eq!(coord.engine().remaining_secs(), 0);
}

#[test]
fn test_repeat_after_completion_runs_again() {
    let mut coord = coordinator();
    let task = coord.add_task("Inbox zero", Some(1)).unwrap().unwrap();
    coord.start().unwrap();
    while coord.engine().is_running() {
        coord.tick().unwrap();
    }

    let repeated = coord.repeat_task(&task.id).unwrap().unwrap();
    assert_eq!(repeated.repeat_count, 1);
    assert_eq!(coord.engine().remaining_secs(), 60);

    coord.start().unwrap();
    while coord.engine().is_running() {
        coord.tick().unwrap();
    }
    let stats = coord.stats();
    assert_eq!(stats.sessions_completed, 2);
    assert_eq!(stats.total_focus_minutes, 2);
    assert_eq!(stats.tasks_done, 2);
}

#[test]
fn test_aborted_session_books_nothing() {
    let mut coord = coordinator();
    coord.add_task("Half done", Some(5)).unwrap();
    coord.start().unwrap();
    for _ in 0..100 {
        coord.tick().unwrap();
    }
    coord.reset().unwrap();

    assert_eq!(coord.stats().sessions_completed, 0);
    assert_eq!(coord.engine().remaining_secs(), 300);
    assert!(coord.store().active_task().is_some());
}

#[test]
fn test_mode_switch_blocked_while_running() {
    let mut coord = coordinator();
    coord.start().unwrap();
    coord.set_mode(SessionMode::Break).unwrap();
    assert_eq!(coord.engine().mode(), SessionMode::Focus);

    coord.pause().unwrap();
    coord.set_mode(SessionMode::Break).unwrap();
    assert_eq!(coord.engine().mode(), SessionMode::Break);
    assert_eq!(coord.engine().remaining_secs(), 15 * 60);
}

#[tokio::test]
async fn test_run_countdown_with_instant_ticker() {
    let mut coord = coordinator();
    coord.add_task("Quick", Some(1)).unwrap();
    coord.start().unwrap();

    let mut ticker = InstantTicker::new();
    coord.run_countdown(&mut ticker).await.unwrap();

    assert_eq!(ticker.ticks(), 60);
    assert!(!coord.engine().is_running());
    assert_eq!(coord.stats().sessions_completed, 1);
}

#[tokio::test]
async fn test_run_countdown_returns_immediately_when_stopped() {
    let mut coord = coordinator();
    let mut ticker = InstantTicker::new();
    coord.run_countdown(&mut ticker).await.unwrap();
    assert_eq!(ticker.ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_interval_ticker_drives_real_countdown() {
    let mut coord = coordinator();
    coord.set_focus_duration(3).unwrap();
    coord.start().unwrap();

    let started = tokio::time::Instant::now();
    let mut ticker = tock_core::IntervalTicker::new();
    coord.run_countdown(&mut ticker).await.unwrap();

    assert!(started.elapsed() >= std::time::Duration::from_secs(3));
    assert_eq!(coord.stats().sessions_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_keeps_last_tick() {
    let mut coord = coordinator();
    coord.set_focus_duration(10).unwrap();
    coord.start().unwrap();

    let mut ticker = tock_core::IntervalTicker::new();
    let finished = tokio::time::timeout(
        std::time::Duration::from_millis(3500),
        coord.run_countdown(&mut ticker),
    )
    .await;
    assert!(finished.is_err(), "countdown should still be pending");

    coord.pause().unwrap();
    assert_eq!(coord.engine().remaining_secs(), 7);
    coord.tick().unwrap();
    assert_eq!(coord.engine().remaining_secs(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_resumed_countdown_waits_full_second() {
    let mut coord = coordinator();
    coord.set_focus_duration(100).unwrap();
    coord.start().unwrap();

    let mut ticker = tock_core::IntervalTicker::new();
    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(2500),
        coord.run_countdown(&mut ticker),
    )
    .await;
    coord.pause().unwrap();
    assert_eq!(coord.engine().remaining_secs(), 98);

    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    coord.start().unwrap();
    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(10),
        coord.run_countdown(&mut ticker),
    )
    .await;
    assert_eq!(coord.engine().remaining_secs(), 98, "no tick right after resume");

    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(1500),
        coord.run_countdown(&mut ticker),
    )
    .await;
    assert_eq!(coord.engine().remaining_secs(), 97);
}
