//! Speech output and input.
//!
//! [`SpeechOutputManager`] exclusively owns the "currently playing" utterance
//! and [`SpeechInputManager`] the active recognition session. Both are
//! injected into the dialogue controller; nothing else starts or stops audio.

pub mod input;
pub mod local;
pub mod output;
pub mod typed;

pub use input::{ListenOutcome, SpeechInputManager};
pub use local::{ProcessPlayer, ProcessVoice};
pub use output::{SpeechOutputManager, SpeechRoute, Utterance, UtteranceOutcome};
pub use typed::TypedInput;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::Language;
use crate::error::{ServiceError, SpeechError};

/// A voice registered with the local synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Engine-specific voice name.
    pub name: String,
    /// Language tag the voice speaks (`hi`, `en-IN`, ...).
    pub language: String,
}

impl Voice {
    pub fn new(name: &str, language: &str) -> Self {
        Self {
            name: name.to_string(),
            language: language.to_string(),
        }
    }

    pub fn speaks(&self, language: Language) -> bool {
        Language::from_tag(&self.language) == Some(language)
    }
}

/// Remote text-to-speech: returns encoded audio for `text`.
#[async_trait]
pub trait RemoteSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ServiceError>;
}

/// Plays encoded audio to completion.
///
/// Returns `SpeechError::PlaybackBlocked` when audio cannot be played at all
/// (no output device, autoplay restrictions); any other error means playback
/// started and broke.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError>;
}

/// On-device speech synthesis.
#[async_trait]
pub trait LocalSynthesizer: Send + Sync {
    /// Voices available on this device.
    fn voices(&self) -> Vec<Voice>;

    /// Speak `text` to completion.
    async fn speak(
        &self,
        text: &str,
        language: Language,
        voice: Option<&Voice>,
    ) -> Result<(), SpeechError>;
}

/// Speech-to-text. `Ok(None)` means nothing was heard.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, language: Language) -> Result<Option<String>, SpeechError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_matches_regional_tag() {
        let voice = Voice::new("Lekha", "hi-IN");
        assert!(voice.speaks(Language::Hi));
        assert!(!voice.speaks(Language::Gu));
        assert!(!Voice::new("Tamil", "ta-IN").speaks(Language::En));
    }
}
