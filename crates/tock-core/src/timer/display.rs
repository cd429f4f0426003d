//! Presentation helpers shared by every front-end.

use serde::{Deserialize, Serialize};

use super::SessionMode;
use crate::events::SessionSnapshot;

/// Seconds left at which a running focus countdown is flagged as ending.
pub const FINAL_MINUTE_SECS: u64 = 60;

/// What the main control button should offer next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Start,
    Pause,
    Resume,
}

impl Control {
    pub fn for_snapshot(snapshot: &SessionSnapshot) -> Self {
        if snapshot.running {
            Control::Pause
        } else if snapshot.remaining_secs < snapshot.total_secs {
            Control::Resume
        } else {
            Control::Start
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Control::Start => "START",
            Control::Pause => "PAUSE",
            Control::Resume => "RESUME",
        }
    }
}

/// `mm:ss`, or `h:mm:ss` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Elapsed fraction of the current interval, 0.0 ..= 1.0.
pub fn progress(snapshot: &SessionSnapshot) -> f64 {
    if snapshot.total_secs == 0 {
        return 0.0;
    }
    1.0 - (snapshot.remaining_secs as f64 / snapshot.total_secs as f64)
}

pub fn is_final_minute(snapshot: &SessionSnapshot) -> bool {
    snapshot.running
        && snapshot.mode == SessionMode::Focus
        && snapshot.remaining_secs <= FINAL_MINUTE_SECS
}

/// Compact minute total: `45m`, `2h`, `1h30m`.
pub fn format_minutes(minutes: u64) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    match minutes % 60 {
        0 => format!("{}h", minutes / 60),
        rest => format!("{}h{rest}m", minutes / 60),
    }
}
