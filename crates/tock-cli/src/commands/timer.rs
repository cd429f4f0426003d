use std::io::Write;

use clap::Subcommand;
use tock_core::timer::{format_clock, is_final_minute, progress, Control};
use tock_core::{
    CoreError, IntervalNotice, IntervalTicker, SessionEvent, SessionListener, SessionMode,
    SessionSnapshot,
};

use super::Context;

const BAR_WIDTH: usize = 24;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground (Ctrl-C pauses and exits)
    Run {
        /// Interval to run: focus or break
        #[arg(long, default_value = "focus")]
        mode: SessionMode,
        /// Override the interval length in minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Print the session state a new run would start from, as JSON
    Status,
}

/// Redraws a single status line on every tick and state change.
///
/// Once an interval ends the line is finished: later state changes that do
/// not restart the countdown are remembered but not drawn, so the
/// end-of-interval notice starts on a clean line.
#[derive(Default)]
struct StatusLine {
    last: Option<SessionSnapshot>,
    finished: bool,
}

impl StatusLine {
    fn render(snapshot: &SessionSnapshot) -> String {
        let filled = ((progress(snapshot) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
        let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
        let marker = if is_final_minute(snapshot) { " !" } else { "" };
        format!(
            "\r{:<5} {} [{bar}] {}{marker}   ",
            snapshot.mode.label(),
            format_clock(snapshot.remaining_secs),
            Control::for_snapshot(snapshot).label(),
        )
    }

    /// Text to write for `event`, if any.
    fn output(&mut self, event: &SessionEvent) -> Option<String> {
        match event {
            SessionEvent::StateChange(snapshot) => {
                self.last = Some(*snapshot);
                if self.finished && !snapshot.running {
                    return None;
                }
                self.finished = false;
                Some(Self::render(snapshot))
            }
            SessionEvent::Tick {
                remaining_secs,
                total_secs,
            } => {
                let snapshot = self.last.as_mut()?;
                snapshot.remaining_secs = *remaining_secs;
                snapshot.total_secs = *total_secs;
                Some(Self::render(snapshot))
            }
            SessionEvent::End { .. } => {
                self.finished = true;
                Some("\n".to_string())
            }
        }
    }
}

impl SessionListener for StatusLine {
    fn on_event(&mut self, event: &SessionEvent) {
        if let Some(text) = self.output(event) {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    }
}

fn ring_bell(notice: &IntervalNotice) {
    println!("\x07{}", notice.heading());
    println!("{}", notice.message());
}

pub fn run(action: TimerAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { mode, minutes } => {
            let mut coord = ctx.coordinator()?;
            coord.set_mode(mode)?;
            if let Some(minutes) = minutes {
                let secs = u64::from(minutes) * 60;
                match mode {
                    SessionMode::Focus => coord.set_focus_duration(secs)?,
                    SessionMode::Break => coord.set_break_duration(secs)?,
                }
            }

            if mode == SessionMode::Focus {
                match coord.store().active_task() {
                    Some(task) => println!("Active task: {}", task.name),
                    None => println!("No active task"),
                }
            }

            let mut coord = coord
                .with_listener(StatusLine::default())
                .with_notifier(ring_bell);
            coord.start()?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let interrupted = runtime.block_on(async {
                let mut ticker = IntervalTicker::new();
                tokio::select! {
                    res = coord.run_countdown(&mut ticker) => res.map(|()| false),
                    res = tokio::signal::ctrl_c() => res.map(|()| true).map_err(CoreError::from),
                }
            })?;

            if interrupted {
                coord.pause()?;
                println!();
                println!(
                    "Paused at {}; unfinished intervals are not recorded.",
                    format_clock(coord.engine().remaining_secs())
                );
            }
        }
        TimerAction::Status => {
            let coord = ctx.coordinator()?;
            let state = coord.engine().state();
            let output = serde_json::json!({
                "state": state,
                "clock": format_clock(state.remaining_secs),
                "active_task": coord.store().active_task(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
