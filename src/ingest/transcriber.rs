//! Whisper transcription backend.
//!
//! Shells out to a local whisper binary. Whisper decodes audio through
//! ffmpeg, so any format ffmpeg reads works without a conversion step.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{TranscriptResult, Transcriber};
use crate::config::VoiceSettings;

/// Whisper output JSON structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    end: f64,
}

/// Transcriber backed by the local whisper CLI
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    settings: VoiceSettings,
}

impl WhisperTranscriber {
    pub fn new(settings: VoiceSettings) -> Self {
        Self { settings }
    }

    fn parse_output(json_content: &str, fallback_language: &str) -> Result<TranscriptResult> {
        let whisper: WhisperOutput =
            serde_json::from_str(json_content).context("Failed to parse whisper JSON")?;

        let duration = whisper.segments.last().map(|s| s.end).unwrap_or(0.0);

        Ok(TranscriptResult {
            text: whisper.text.trim().to_string(),
            language: if whisper.language.is_empty() {
                fallback_language.to_string()
            } else {
                whisper.language
            },
            duration_seconds: duration,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult> {
        // Create temp dir for output
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;

        let output = Command::new(&self.settings.whisper_path)
            .arg(audio_path)
            .arg("--model")
            .arg(&self.settings.model)
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json")
            .arg("--language")
            .arg(&self.settings.language)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run whisper ({})", self.settings.whisper_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Whisper could not decode {}; is it an audio file ffmpeg can read? {}",
                audio_path.display(),
                stderr.trim()
            );
        }

        // Find and parse JSON output
        let stem = audio_path.file_stem().unwrap_or_default().to_string_lossy();
        let json_path = temp_dir.path().join(format!("{}.json", stem));

        let json_content = tokio::fs::read_to_string(&json_path)
            .await
            .context("Failed to read whisper output")?;

        Self::parse_output(&json_content, &self.settings.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output() {
        let json = r#"{
            "text": "  Garage next hammer next two screwdrivers ",
            "language": "",
            "segments": [{"end": 1.5}, {"end": 4.25}]
        }"#;

        let result = WhisperTranscriber::parse_output(json, "en").unwrap();

        assert_eq!(result.text, "Garage next hammer next two screwdrivers");
        assert_eq!(result.language, "en");
        assert_eq!(result.duration_seconds, 4.25);
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        assert!(WhisperTranscriber::parse_output("not json", "en").is_err());
    }
}
