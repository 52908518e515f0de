//! Host speech: an on-device TTS command and an external audio player.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{AudioPlayer, LocalSynthesizer, Voice};
use crate::catalog::Language;
use crate::error::SpeechError;

/// Local synthesizer backed by an espeak-compatible command
/// (`<program> -v <voice> <text>`).
#[derive(Debug, Clone)]
pub struct ProcessVoice {
    program: String,
    voices: Vec<Voice>,
}

impl ProcessVoice {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            voices: vec![
                Voice::new("en-us", "en"),
                Voice::new("hi", "hi"),
                Voice::new("gu", "gu"),
            ],
        }
    }
}

#[async_trait]
impl LocalSynthesizer for ProcessVoice {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn speak(
        &self,
        text: &str,
        language: Language,
        voice: Option<&Voice>,
    ) -> Result<(), SpeechError> {
        let voice_name = voice.map(|v| v.name.as_str()).unwrap_or(language.tag());
        debug!(program = %self.program, voice = %voice_name, "Speaking with local voice");

        let status = Command::new(&self.program)
            .arg("-v")
            .arg(voice_name)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    SpeechError::Unsupported(format!("{} is not available: {e}", self.program))
                }
                _ => SpeechError::SynthesisFailed(e.to_string()),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::SynthesisFailed(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

/// Plays audio by writing it to `scratch` and running `<program> [args] <scratch>`.
#[derive(Debug, Clone)]
pub struct ProcessPlayer {
    program: String,
    args: Vec<String>,
    scratch: PathBuf,
}

impl ProcessPlayer {
    pub fn new(program: &str, scratch: PathBuf) -> Self {
        Self {
            program: program.to_string(),
            args: vec!["-q".to_string()],
            scratch,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[async_trait]
impl AudioPlayer for ProcessPlayer {
    async fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError> {
        if let Some(parent) = self.scratch.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SpeechError::PlaybackBlocked(e.to_string()))?;
        }
        tokio::fs::write(&self.scratch, &audio)
            .await
            .map_err(|e| SpeechError::PlaybackBlocked(e.to_string()))?;

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.scratch)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    SpeechError::PlaybackBlocked(format!("{} is not available: {e}", self.program))
                }
                _ => SpeechError::PlaybackFailed(e.to_string()),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::PlaybackFailed(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}
