//! Keyboard input standing in for speech recognition.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use super::Recognizer;
use crate::catalog::Language;
use crate::error::SpeechError;

/// A recognizer fed by typed lines.
pub struct TypedInput {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl TypedInput {
    /// Read lines from stdin.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Self::from_receiver(rx)
    }

    /// Use lines pushed by another component (API handler, tests).
    pub fn from_receiver(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            lines: Mutex::new(lines),
        }
    }
}

#[async_trait]
impl Recognizer for TypedInput {
    async fn recognize(&self, _language: Language) -> Result<Option<String>, SpeechError> {
        let mut lines = self.lines.lock().await;
        match lines.recv().await {
            Some(line) if line.trim().is_empty() => Ok(None),
            Some(line) => Ok(Some(line)),
            None => Err(SpeechError::InputClosed),
        }
    }
}
