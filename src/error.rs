//! Error types for Jan-Sahayak.

use std::time::Duration;

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Dialogue error: {0}")]
    Dialogue(#[from] DialogueError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Form catalog errors, raised while validating static configuration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("No prompt for field {field} in language {language}")]
    MissingPrompt { field: String, language: String },

    #[error("Form {0} is defined more than once")]
    DuplicateForm(String),

    #[error("Form {0} has no fields")]
    EmptyForm(String),

    #[error("Form {form} lists field {field} twice")]
    DuplicateField { form: String, field: String },

    #[error("Unknown form: {0}")]
    UnknownForm(String),
}

/// Failures talking to the remote HTTP collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("{endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("{endpoint} returned an empty body")]
    EmptyBody { endpoint: String },
}

/// Speech input/output errors.
///
/// Cloneable because they travel inside utterance outcomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech capability unavailable: {0}")]
    Unsupported(String),

    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Input closed")]
    InputClosed,
}

/// Violations of session invariants.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Form already selected: {0}")]
    FormAlreadySelected(String),

    #[error("No form selected")]
    NoFormSelected,

    #[error("All fields of form {0} are already collected")]
    AllFieldsCollected(String),

    #[error("Session is in mode {mode}, cannot {action}")]
    WrongMode { mode: String, action: String },
}

/// Dialogue controller errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("No conversation has been started")]
    NotStarted,

    #[error("Dialogue loop has stopped")]
    Stopped,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result type alias for the assistant.
pub type Result<T> = std::result::Result<T, Error>;
