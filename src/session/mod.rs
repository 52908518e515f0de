//! In-memory record of one conversation.

pub mod state;

pub use state::{FieldRecorded, HistoryEntry, SessionMode, SessionState, Speaker};
