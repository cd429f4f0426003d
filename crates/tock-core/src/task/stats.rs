use serde::{Deserialize, Serialize};

/// Lifetime totals. Only grow, except through an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Focus intervals that ran to zero.
    #[serde(default, alias = "sessions")]
    pub sessions_completed: u64,
    /// Sum of each completed focus interval's rounded minutes.
    #[serde(default, alias = "mins")]
    pub total_focus_minutes: u64,
    /// Tasks marked done.
    #[serde(default, alias = "done")]
    pub tasks_done: u64,
}

impl Stats {
    pub fn record_session(&mut self, minutes: f64) {
        self.sessions_completed += 1;
        self.total_focus_minutes += rounded_minutes(minutes);
    }
}

/// Nearest whole minute; negative and non-finite input counts as zero.
fn rounded_minutes(minutes: f64) -> u64 {
    if minutes.is_finite() && minutes > 0.0 {
        minutes.round() as u64
    } else {
        0
    }
}
