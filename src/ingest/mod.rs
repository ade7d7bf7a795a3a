//! Voice memo ingestion.
//!
//! Turns an audio file into transcript text. The pipeline only needs the
//! [`Transcriber`] trait; [`WhisperTranscriber`] is the production backend.

pub mod transcriber;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

pub use transcriber::WhisperTranscriber;

/// Result of transcription
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    pub text: String,
    pub language: String,
    pub duration_seconds: f64,
}

/// Speech-to-text backend
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult>;
}

/// Check that `path` names a file with an extension before handing it to a
/// transcriber
pub fn check_audio_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    if path.extension().and_then(|e| e.to_str()).is_none() {
        anyhow::bail!(
            "Faulty file path {}: expected a file name with an audio file extension",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_audio_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let memo = temp.path().join("memo.m4a");
        let bare = temp.path().join("memo");
        std::fs::write(&memo, b"").unwrap();
        std::fs::write(&bare, b"").unwrap();

        assert!(check_audio_path(&memo).is_ok());
        assert!(check_audio_path(&bare).is_err());
        assert!(check_audio_path(&temp.path().join("missing.wav")).is_err());
    }
}
