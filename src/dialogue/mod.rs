//! Dialogue controller: the state machine behind the conversation.
//!
//! The controller exclusively owns the [`SessionState`](crate::session::SessionState)
//! and the turn-level [`ControllerState`]. It reports outward through
//! [`DialogueEvent`]s and [`SessionSnapshot`]s and accepts outside actions
//! through a [`SessionHandle`].

pub mod controller;
pub mod events;
pub mod handle;
pub mod phrases;
pub mod state;

pub use controller::{DialogueConfig, DialogueController, DialogueDeps};
pub use events::{DialogueEvent, SessionSnapshot, TurnOutcome};
pub use handle::SessionHandle;
pub use state::ControllerState;
