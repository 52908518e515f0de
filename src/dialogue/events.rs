//! Outward-facing results of the dialogue: events and state snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::ControllerState;
use crate::catalog::Language;
use crate::services::ChatAction;
use crate::session::{HistoryEntry, SessionMode, SessionState, Speaker};

/// Side effects the controller reports to the UI.
///
/// These are the only structured results the controller sends outward; it
/// never touches a form view itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    /// A line was added to the conversation history.
    Transcript { speaker: Speaker, text: String },
    FieldUpdated { key: String, value: String },
    SchemeSwitched { form_id: String },
    DocumentReady { form_id: String, document: Vec<u8> },
    DocumentFailed { form_id: String, reason: String },
    /// Speech capability is missing; the caller should offer typed input.
    VoiceUnavailable { reason: String },
}

/// What one processed transcript led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    SchemeSelected { form_id: String },
    /// Triage could not pick a scheme; the user is asked again.
    TriageRetry,
    FieldRecorded {
        key: String,
        value: String,
        completed: bool,
    },
    /// Nothing extractable; the same question is asked again.
    Retry { field: String },
    ChatReply { action: ChatAction },
    ChatUnavailable,
    /// Blank input.
    Ignored,
    /// The session ended while the turn was in flight.
    Cancelled,
}

/// Read-only copy of the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: ControllerState,
    pub mode: SessionMode,
    pub language: Language,
    pub form_id: Option<String>,
    /// Index of the field being asked. Once the form is completed it stays
    /// at the field count, with `current_field` empty and no fields remaining.
    pub step_index: usize,
    pub current_field: Option<String>,
    pub remaining_fields: usize,
    pub collected_fields: HashMap<String, String>,
    pub history: Vec<HistoryEntry>,
    pub started_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn capture(state: ControllerState, session: &SessionState) -> Self {
        Self {
            session_id: session.id(),
            state,
            mode: session.mode(),
            language: session.language(),
            form_id: session.selected_form().map(|f| f.id.clone()),
            step_index: session.step_index(),
            current_field: session.current_field().map(str::to_string),
            remaining_fields: session.remaining_fields(),
            collected_fields: session.collected_fields().clone(),
            history: session.history().to_vec(),
            started_at: session.started_at(),
        }
    }
}
