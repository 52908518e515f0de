//! SessionHandle: how other tasks talk to a running controller.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::controller::Command;
use super::events::{DialogueEvent, SessionSnapshot, TurnOutcome};
use crate::catalog::Language;
use crate::error::DialogueError;
use crate::speech::{SpeechInputManager, SpeechOutputManager};

/// Cloneable remote control for a [`DialogueController`](super::DialogueController).
///
/// Reads go through snapshots; actions are queued to the dialogue loop and
/// handled between turns. `end` and `shutdown` take effect immediately.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    token: watch::Receiver<CancellationToken>,
    shutdown: CancellationToken,
    snapshot: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<DialogueEvent>,
    speech_out: Arc<SpeechOutputManager>,
    speech_in: Arc<SpeechInputManager>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        token: watch::Receiver<CancellationToken>,
        shutdown: CancellationToken,
        snapshot: watch::Receiver<SessionSnapshot>,
        events: broadcast::Sender<DialogueEvent>,
        speech_out: Arc<SpeechOutputManager>,
        speech_in: Arc<SpeechInputManager>,
    ) -> Self {
        Self {
            commands,
            token,
            shutdown,
            snapshot,
            events,
            speech_out,
            speech_in,
        }
    }

    /// Latest published session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every published change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DialogueEvent> {
        self.events.subscribe()
    }

    /// Start a new conversation, on `form` or in triage when `None`. The
    /// current session is ended first, so a response still in flight for it
    /// is discarded.
    pub async fn start(
        &self,
        form: Option<&str>,
        language: Language,
    ) -> Result<SessionSnapshot, DialogueError> {
        self.end().await;
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Start {
                form: form.map(str::to_string),
                language,
                reply,
            })
            .await
            .map_err(|_| DialogueError::Stopped)?;
        rx.await.map_err(|_| DialogueError::Stopped)?
    }

    /// Hand typed input to the dialogue loop and wait for the turn result.
    pub async fn submit_transcript(&self, text: &str) -> Result<TurnOutcome, DialogueError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Transcript {
                text: text.to_string(),
                reply,
            })
            .await
            .map_err(|_| DialogueError::Stopped)?;
        rx.await.map_err(|_| DialogueError::Stopped)?
    }

    pub async fn switch_language(&self, language: Language) -> Result<(), DialogueError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::SwitchLanguage { language, reply })
            .await
            .map_err(|_| DialogueError::Stopped)?;
        rx.await.map_err(|_| DialogueError::Stopped)?
    }

    /// End the current session: in-flight responses are dropped, audio and
    /// recognition stop.
    pub async fn end(&self) {
        let token = self.token.borrow().clone();
        token.cancel();
        self.speech_out.cancel().await;
        self.speech_in.cancel().await;
    }

    /// End the session and stop the dialogue loop.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.end().await;
    }
}
