//! Controller state machine: what the dialogue loop is doing right now.

use serde::{Deserialize, Serialize};

/// Turn-level state of the dialogue controller.
///
/// Independent of [`SessionMode`](crate::session::SessionMode): the mode
/// says which part of the form flow the session is in, this says whether
/// the assistant is talking, waiting for input, or working on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    Triage,
    Speaking,
    Listening,
    Processing,
    Completed,
}

impl ControllerState {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Any state may drop back to `Idle`; that is teardown, not a turn.
    pub fn can_transition_to(&self, target: ControllerState) -> bool {
        use ControllerState::*;
        matches!(
            (self, target),
            (_, Idle)
                | (Idle, Triage)
                | (Idle, Speaking)
                | (Triage, Speaking)
                | (Triage, Processing)
                | (Speaking, Triage)
                | (Speaking, Listening)
                | (Speaking, Completed)
                | (Listening, Processing)
                | (Completed, Processing)
                | (Processing, Speaking)
        )
    }

    /// Whether a transcript may be accepted in this state.
    ///
    /// Never true while speaking, so the assistant cannot hear itself.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Triage | Self::Listening | Self::Completed)
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Triage => "triage",
            Self::Speaking => "speaking",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}
