//! Turn state types

use serde::{Deserialize, Serialize};

/// State held between events. Only `Idle` and `Generating` ever persist
/// across an await point; every other phase is passed through within a
/// single transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Generating,
}

impl TurnState {
    pub fn phase(&self) -> TurnPhase {
        match self {
            TurnState::Idle => TurnPhase::Idle,
            TurnState::Generating => TurnPhase::Generating,
        }
    }
}

/// Phases of a turn as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    UserSubmitted,
    Generating,
    Rendering,
    Formatting,
    Committed,
    Failed,
}

impl TurnPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnPhase::Idle => "idle",
            TurnPhase::UserSubmitted => "user_submitted",
            TurnPhase::Generating => "generating",
            TurnPhase::Rendering => "rendering",
            TurnPhase::Formatting => "formatting",
            TurnPhase::Committed => "committed",
            TurnPhase::Failed => "failed",
        }
    }

    /// Whether the turn has finished (successfully or not)
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnPhase::Committed | TurnPhase::Failed)
    }
}
