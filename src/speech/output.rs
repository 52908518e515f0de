//! Speech output: remote synthesis with a local voice fallback. Only one
//! utterance plays at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{AudioPlayer, LocalSynthesizer, RemoteSynthesizer};
use crate::catalog::Language;
use crate::error::SpeechError;
use crate::session::{SessionState, Speaker};

/// Which path produced the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechRoute {
    Remote,
    Local,
}

/// How an utterance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Audio played to the end.
    Finished(SpeechRoute),
    /// Nothing could be voiced. The text is still on the transcript and the
    /// conversation continues.
    Failed(SpeechError),
    /// Superseded by a newer utterance or stopped by teardown.
    Cancelled,
}

impl UtteranceOutcome {
    /// Finished and failed utterances both let the conversation move on.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Completion handle for one utterance.
#[derive(Debug)]
pub struct Utterance {
    id: u64,
    done: oneshot::Receiver<UtteranceOutcome>,
}

impl Utterance {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the utterance to end. Resolves exactly once.
    pub async fn finished(self) -> UtteranceOutcome {
        self.done.await.unwrap_or(UtteranceOutcome::Cancelled)
    }
}

struct ActiveUtterance {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Clone)]
struct Renderer {
    remote: Arc<dyn RemoteSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    local: Arc<dyn LocalSynthesizer>,
}

impl Renderer {
    async fn render(&self, text: &str, language: Language) -> UtteranceOutcome {
        match self.remote.synthesize(text, language).await {
            Ok(audio) => match self.player.play(audio).await {
                Ok(()) => return UtteranceOutcome::Finished(SpeechRoute::Remote),
                Err(SpeechError::PlaybackBlocked(reason)) => {
                    warn!(%reason, "Remote audio blocked, falling back to local voice");
                }
                Err(e) => {
                    warn!(error = %e, "Playback failed");
                    return UtteranceOutcome::Failed(e);
                }
            },
            Err(e) => {
                warn!(error = %e, "Remote synthesis failed, falling back to local voice");
            }
        }

        let voice = self
            .local
            .voices()
            .into_iter()
            .find(|v| v.speaks(language));
        if voice.is_none() {
            debug!(%language, "No local voice registered for language, using engine default");
        }
        match self.local.speak(text, language, voice.as_ref()).await {
            Ok(()) => UtteranceOutcome::Finished(SpeechRoute::Local),
            Err(e) => {
                warn!(error = %e, "Local synthesis failed");
                UtteranceOutcome::Failed(e)
            }
        }
    }
}

/// Owns the single system-wide playing utterance.
pub struct SpeechOutputManager {
    renderer: Renderer,
    active: Arc<Mutex<Option<ActiveUtterance>>>,
    next_id: AtomicU64,
}

impl SpeechOutputManager {
    pub fn new(
        remote: Arc<dyn RemoteSynthesizer>,
        player: Arc<dyn AudioPlayer>,
        local: Arc<dyn LocalSynthesizer>,
    ) -> Self {
        Self {
            renderer: Renderer {
                remote,
                player,
                local,
            },
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Speak `text` in the session's language.
    ///
    /// The text is appended to the session history before playback starts.
    /// Any utterance still playing is cancelled first.
    pub async fn speak(&self, session: &mut SessionState, text: &str) -> Utterance {
        session.push_history(Speaker::Assistant, text);
        let language = session.language();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                debug!(utterance = previous.id, "Cancelling active utterance");
                previous.cancel.cancel();
            }
            *active = Some(ActiveUtterance {
                id,
                cancel: cancel.clone(),
            });
        }

        let (tx, rx) = oneshot::channel();
        let renderer = self.renderer.clone();
        let active = Arc::clone(&self.active);
        let text = text.to_string();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => UtteranceOutcome::Cancelled,
                outcome = renderer.render(&text, language) => outcome,
            };
            {
                let mut active = active.lock().await;
                if active.as_ref().is_some_and(|a| a.id == id) {
                    *active = None;
                }
            }
            debug!(utterance = id, ?outcome, "Utterance ended");
            let _ = tx.send(outcome);
        });

        Utterance { id, done: rx }
    }

    /// Stop whatever is playing.
    pub async fn cancel(&self) {
        if let Some(active) = self.active.lock().await.take() {
            debug!(utterance = active.id, "Stopping utterance");
            active.cancel.cancel();
        }
    }

    /// Id of the utterance currently playing, if any.
    pub async fn active_utterance(&self) -> Option<u64> {
        self.active.lock().await.as_ref().map(|a| a.id)
    }
}
