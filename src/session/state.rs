//! Session state: selected form, step cursor, collected values, history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{FormDefinition, Language};
use crate::error::SessionError;

/// Which part of the conversation the session is in.
///
/// Progresses NoForm → Triage → Collecting → Completed, or NoForm →
/// Collecting when the caller pre-selects a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    NoForm,
    Triage,
    Collecting,
    Completed,
}

impl SessionMode {
    pub fn can_transition_to(&self, target: SessionMode) -> bool {
        use SessionMode::*;
        matches!(
            (self, target),
            (NoForm, Triage) | (NoForm, Collecting) | (Triage, Collecting) | (Collecting, Completed)
        )
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoForm => "no_form",
            Self::Triage => "triage",
            Self::Collecting => "collecting",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    User,
}

/// One line of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of storing a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecorded {
    pub key: String,
    pub value: String,
    /// Whether this was the last field of the form.
    pub completed: bool,
}

/// Mutable record of an in-progress conversation.
///
/// Only the dialogue controller mutates it. Methods enforce the invariants:
/// the selected form is set once, the step cursor only moves forward, and
/// collected keys always belong to the selected form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    id: Uuid,
    mode: SessionMode,
    language: Language,
    step_index: usize,
    collected_fields: HashMap<String, String>,
    history: Vec<HistoryEntry>,
    selected_form: Option<FormDefinition>,
    started_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: SessionMode::NoForm,
            language,
            step_index: 0,
            collected_fields: HashMap::new(),
            history: Vec::new(),
            selected_form: None,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Cursor into the form's fields. Equals the field count after the last
    /// field is recorded and never moves again.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn collected_fields(&self) -> &HashMap<String, String> {
        &self.collected_fields
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn selected_form(&self) -> Option<&FormDefinition> {
        self.selected_form.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn transition(&mut self, target: SessionMode, action: &str) -> Result<(), SessionError> {
        if !self.mode.can_transition_to(target) {
            return Err(SessionError::WrongMode {
                mode: self.mode.to_string(),
                action: action.to_string(),
            });
        }
        tracing::debug!(session_id = %self.id, from = %self.mode, to = %target, "Session mode change");
        self.mode = target;
        Ok(())
    }

    /// Enter triage: no form yet, waiting for a problem description.
    pub fn begin_triage(&mut self) -> Result<(), SessionError> {
        self.transition(SessionMode::Triage, "begin triage")
    }

    /// Select the form to fill. Allowed once per session.
    pub fn select_form(&mut self, form: FormDefinition) -> Result<(), SessionError> {
        if let Some(existing) = &self.selected_form {
            return Err(SessionError::FormAlreadySelected(existing.id.clone()));
        }
        self.transition(SessionMode::Collecting, "select a form")?;
        self.selected_form = Some(form);
        self.step_index = 0;
        Ok(())
    }

    /// Field key under the cursor, while collecting.
    pub fn current_field(&self) -> Option<&str> {
        if self.mode != SessionMode::Collecting {
            return None;
        }
        self.selected_form
            .as_ref()
            .and_then(|form| form.fields.get(self.step_index))
            .map(String::as_str)
    }

    /// Number of fields still to collect.
    pub fn remaining_fields(&self) -> usize {
        self.selected_form
            .as_ref()
            .map(|form| form.field_count().saturating_sub(self.step_index))
            .unwrap_or(0)
    }

    /// Store `value` for the current field and advance the cursor. Moves the
    /// session to `Completed` after the last field.
    pub fn record_field(&mut self, value: String) -> Result<FieldRecorded, SessionError> {
        let form = self.selected_form.as_ref().ok_or(SessionError::NoFormSelected)?;
        if self.mode != SessionMode::Collecting {
            return Err(SessionError::WrongMode {
                mode: self.mode.to_string(),
                action: "record a field".to_string(),
            });
        }
        let key = form
            .fields
            .get(self.step_index)
            .cloned()
            .ok_or_else(|| SessionError::AllFieldsCollected(form.id.clone()))?;
        let field_count = form.field_count();

        self.collected_fields.insert(key.clone(), value.clone());
        self.step_index += 1;

        let completed = self.step_index == field_count;
        if completed {
            self.transition(SessionMode::Completed, "complete the form")?;
        }

        Ok(FieldRecorded {
            key,
            value,
            completed,
        })
    }

    /// Switch the active language. Collected fields are kept.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Append a transcript line.
    pub fn push_history(&mut self, speaker: Speaker, text: &str) -> &HistoryEntry {
        self.history.push(HistoryEntry {
            speaker,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        &self.history[self.history.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LocalizedText;

    fn form() -> FormDefinition {
        FormDefinition::new(
            "test-form",
            LocalizedText::uniform("Test"),
            &["name", "aadhar", "mobile"],
        )
    }

    #[test]
    fn valid_mode_transitions() {
        use SessionMode::*;
        assert!(NoForm.can_transition_to(Triage));
        assert!(NoForm.can_transition_to(Collecting));
        assert!(Triage.can_transition_to(Collecting));
        assert!(Collecting.can_transition_to(Completed));
    }

    #[test]
    fn invalid_mode_transitions() {
        use SessionMode::*;
        assert!(!Completed.can_transition_to(Collecting));
        assert!(!Collecting.can_transition_to(Triage));
        assert!(!Triage.can_transition_to(Completed));
        assert!(!Triage.can_transition_to(Triage));
    }

    #[test]
    fn display_matches_serde() {
        use SessionMode::*;
        for mode in [NoForm, Triage, Collecting, Completed] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(format!("\"{mode}\""), json);
        }
    }

    #[test]
    fn new_session_has_no_form() {
        let session = SessionState::new(Language::Hi);
        assert_eq!(session.mode(), SessionMode::NoForm);
        assert_eq!(session.language(), Language::Hi);
        assert!(session.selected_form().is_none());
        assert!(session.current_field().is_none());
        assert_eq!(session.remaining_fields(), 0);
    }

    #[test]
    fn collects_fields_in_order() {
        let mut session = SessionState::new(Language::En);
        session.begin_triage().unwrap();
        session.select_form(form()).unwrap();
        assert_eq!(session.current_field(), Some("name"));

        let first = session.record_field("Rajesh".into()).unwrap();
        assert_eq!(first.key, "name");
        assert!(!first.completed);
        assert_eq!(session.current_field(), Some("aadhar"));
        assert_eq!(session.step_index(), 1);

        session.record_field("123456789012".into()).unwrap();
        let last = session.record_field("9876543210".into()).unwrap();
        assert!(last.completed);
        assert_eq!(session.mode(), SessionMode::Completed);
        assert_eq!(session.step_index(), 3);
        assert_eq!(session.collected_fields().len(), 3);
        assert!(session.current_field().is_none());
    }

    #[test]
    fn record_after_completion_fails() {
        let mut session = SessionState::new(Language::En);
        session.select_form(form()).unwrap();
        for value in ["a1", "b2", "c3"] {
            session.record_field(value.into()).unwrap();
        }
        assert!(session.record_field("extra".into()).is_err());
        assert_eq!(session.collected_fields().len(), 3);
    }

    #[test]
    fn record_without_form_fails() {
        let mut session = SessionState::new(Language::En);
        assert!(matches!(
            session.record_field("x".into()),
            Err(SessionError::NoFormSelected)
        ));
    }

    #[test]
    fn form_is_selected_once() {
        let mut session = SessionState::new(Language::En);
        session.select_form(form()).unwrap();
        let err = session.select_form(form()).unwrap_err();
        assert!(matches!(err, SessionError::FormAlreadySelected(id) if id == "test-form"));
    }

    #[test]
    fn language_switch_keeps_fields() {
        let mut session = SessionState::new(Language::Hi);
        session.select_form(form()).unwrap();
        session.record_field("Sita".into()).unwrap();
        session.set_language(Language::Gu);
        assert_eq!(session.language(), Language::Gu);
        assert_eq!(session.collected_fields().get("name").map(String::as_str), Some("Sita"));
        assert_eq!(session.current_field(), Some("aadhar"));
    }

    #[test]
    fn history_is_append_only() {
        let mut session = SessionState::new(Language::En);
        session.push_history(Speaker::Assistant, "Hello");
        session.push_history(Speaker::User, "Hi");
        let speakers: Vec<_> = session.history().iter().map(|e| e.speaker).collect();
        assert_eq!(speakers, [Speaker::Assistant, Speaker::User]);
        assert!(session.history()[0].timestamp <= session.history()[1].timestamp);
    }
}
