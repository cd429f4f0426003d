use serde::{Deserialize, Serialize};

use crate::timer::SessionMode;

/// The slice of session state carried by every state-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub running: bool,
    pub mode: SessionMode,
    pub remaining_secs: u64,
    pub total_secs: u64,
}

/// Every mutation of the session engine produces one or more events, in the
/// order they happened. An empty batch means the call was a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// One second elapsed while running.
    Tick { remaining_secs: u64, total_secs: u64 },
    /// Mode, running flag or a duration changed.
    StateChange(SessionSnapshot),
    /// A countdown reached zero. Emitted after the engine stopped running.
    End { mode: SessionMode },
}

impl SessionEvent {
    pub fn is_end(&self) -> bool {
        matches!(self, SessionEvent::End { .. })
    }
}

/// Receives session events synchronously, in emission order.
pub trait SessionListener {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F> SessionListener for F
where
    F: FnMut(&SessionEvent),
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}
