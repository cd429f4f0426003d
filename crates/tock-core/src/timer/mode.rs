use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which kind of interval the engine is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Focus,
    Break,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Focus => "focus",
            SessionMode::Break => "break",
        }
    }

    /// Human label shown under the clock.
    pub fn label(&self) -> &'static str {
        match self {
            SessionMode::Focus => "Focus",
            SessionMode::Break => "Break",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "focus" => Ok(SessionMode::Focus),
            "break" => Ok(SessionMode::Break),
            other => Err(format!("unknown mode '{other}' (expected focus or break)")),
        }
    }
}
