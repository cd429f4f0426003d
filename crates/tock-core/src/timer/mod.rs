mod display;
mod engine;
mod mode;
mod ticker;

pub use display::{format_clock, format_minutes, is_final_minute, progress, Control};
pub use engine::{SessionEngine, SessionState, DEFAULT_BREAK_SECS, DEFAULT_FOCUS_SECS};
pub use mode::SessionMode;
pub use ticker::{InstantTicker, IntervalTicker, Ticker, TICK_PERIOD};
