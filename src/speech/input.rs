//! Speech input: one recognition session at a time, cancellable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Recognizer;
use crate::catalog::Language;
use crate::error::SpeechError;

/// Result of one listening session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Transcript(String),
    /// Recognition ended without any speech.
    Silence,
    Cancelled,
    Failed(SpeechError),
}

struct ActiveRecognition {
    id: u64,
    cancel: CancellationToken,
}

/// Owns the active recognition session.
pub struct SpeechInputManager {
    recognizer: Arc<dyn Recognizer>,
    active: Mutex<Option<ActiveRecognition>>,
    next_id: AtomicU64,
}

impl SpeechInputManager {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            recognizer,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Listen for one transcript. A session already in progress is cancelled.
    pub async fn listen(&self, language: Language) -> ListenOutcome {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.replace(ActiveRecognition {
                id,
                cancel: cancel.clone(),
            }) {
                previous.cancel.cancel();
            }
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => ListenOutcome::Cancelled,
            result = self.recognizer.recognize(language) => match result {
                Ok(Some(text)) if !text.trim().is_empty() => ListenOutcome::Transcript(text.trim().to_string()),
                Ok(_) => ListenOutcome::Silence,
                Err(e) => ListenOutcome::Failed(e),
            },
        };

        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|a| a.id == id) {
            *active = None;
        }
        debug!(recognition = id, ?outcome, "Recognition ended");
        outcome
    }

    /// Abort the active recognition session, if any.
    pub async fn cancel(&self) {
        if let Some(active) = self.active.lock().await.take() {
            debug!(recognition = active.id, "Cancelling recognition");
            active.cancel.cancel();
        }
    }

    pub async fn is_listening(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::speech::TypedInput;

    #[tokio::test]
    async fn returns_trimmed_transcript() {
        let (tx, rx) = mpsc::unbounded_channel();
        let input = SpeechInputManager::new(Arc::new(TypedInput::from_receiver(rx)));
        tx.send("  Rajesh Kumar \n".to_string()).unwrap();

        assert_eq!(
            input.listen(Language::En).await,
            ListenOutcome::Transcript("Rajesh Kumar".to_string())
        );
        assert!(!input.is_listening().await);
    }

    #[tokio::test]
    async fn blank_input_is_silence() {
        let (tx, rx) = mpsc::unbounded_channel();
        let input = SpeechInputManager::new(Arc::new(TypedInput::from_receiver(rx)));
        tx.send("   ".to_string()).unwrap();
        assert_eq!(input.listen(Language::En).await, ListenOutcome::Silence);
    }

    #[tokio::test]
    async fn closed_input_fails() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        let input = SpeechInputManager::new(Arc::new(TypedInput::from_receiver(rx)));
        assert_eq!(
            input.listen(Language::En).await,
            ListenOutcome::Failed(SpeechError::InputClosed)
        );
    }

    struct BrokenMic;

    #[async_trait::async_trait]
    impl Recognizer for BrokenMic {
        async fn recognize(&self, _language: Language) -> Result<Option<String>, SpeechError> {
            Err(SpeechError::RecognitionFailed("no-speech timeout".into()))
        }
    }

    #[tokio::test]
    async fn recognizer_error_is_reported() {
        let input = SpeechInputManager::new(Arc::new(BrokenMic));
        assert!(matches!(
            input.listen(Language::Hi).await,
            ListenOutcome::Failed(SpeechError::RecognitionFailed(_))
        ));
        assert!(!input.is_listening().await);
    }

    #[tokio::test]
    async fn cancel_stops_pending_recognition() {
        let (_tx, rx) = mpsc::unbounded_channel::<String>();
        let input = Arc::new(SpeechInputManager::new(Arc::new(TypedInput::from_receiver(rx))));

        let listener = {
            let input = Arc::clone(&input);
            tokio::spawn(async move { input.listen(Language::En).await })
        };
        while !input.is_listening().await {
            tokio::task::yield_now().await;
        }
        input.cancel().await;

        let outcome = tokio::time::timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener should stop")
            .unwrap();
        assert_eq!(outcome, ListenOutcome::Cancelled);
    }
}
