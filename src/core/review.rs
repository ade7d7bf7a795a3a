//! Human review through an external editor.
//!
//! An [`EditSession`] stages a document on a fixed scratch path, blocks
//! until the editor exits, and decodes whatever is on disk afterwards.
//! "No changes", "cancelled" and "editor failed to open" are
//! indistinguishable: all three decode the bytes present at read time.
//!
//! The scratch path is held through a [`ScratchLease`] for the whole call:
//! an exclusive advisory lock on `<scratch>.lock`, and removal of the
//! scratch file when the lease drops.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Command;

use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use super::codec::{Document, RecordCodec};

/// Errors that can occur while staging or reading back a review
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Scratch file is in use by another review: {}", .path.display())]
    ScratchBusy { path: PathBuf },

    #[error("Scratch file IO error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReviewError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Capability to let a human edit a file, blocking until they are done
pub trait Editor: Send + Sync {
    /// Open `path` and return once the editor process has exited
    fn open_blocking(&self, path: &Path) -> anyhow::Result<()>;
}

/// Launches a real editor process
#[derive(Debug, Clone, Default)]
pub struct SystemEditor {
    /// Command line to run (path is appended); platform default when `None`
    command: Option<String>,
}

impl SystemEditor {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Program and leading arguments used for `path`
    fn command_line(&self) -> Vec<String> {
        match &self.command {
            Some(command) => command.split_whitespace().map(str::to_string).collect(),
            None => platform_default()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(target_os = "macos")]
fn platform_default() -> &'static [&'static str] {
    // -W waits for the app to quit, -t picks the default text editor
    &["open", "-W", "-t"]
}

#[cfg(windows)]
fn platform_default() -> &'static [&'static str] {
    &["notepad"]
}

#[cfg(not(any(target_os = "macos", windows)))]
fn platform_default() -> &'static [&'static str] {
    &["vi"]
}

impl Editor for SystemEditor {
    fn open_blocking(&self, path: &Path) -> anyhow::Result<()> {
        let command_line = self.command_line();
        let (program, args) = command_line
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("Editor command is empty"))?;

        let status = Command::new(program)
            .args(args)
            .arg(path)
            .status()
            .map_err(|e| anyhow::anyhow!("Failed to launch editor '{}': {}", program, e))?;

        if !status.success() {
            anyhow::bail!(
                "Editor '{}' exited with code {}",
                program,
                status.code().unwrap_or(-1)
            );
        }

        Ok(())
    }
}

/// Exclusive hold on the scratch path for the duration of one review
pub struct ScratchLease {
    path: PathBuf,
    lock: File,
}

impl ScratchLease {
    /// Lock `<path>.lock`, creating parent directories as needed.
    ///
    /// Fails fast with [`ReviewError::ScratchBusy`] if another lease is held.
    pub fn acquire(path: &Path) -> Result<Self, ReviewError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ReviewError::io(parent, e))?;
        }

        let lock_path = lock_path_for(path);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| ReviewError::io(&lock_path, e))?;

        match lock.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path: path.to_path_buf(),
                lock,
            }),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(ReviewError::ScratchBusy {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(ReviewError::io(&lock_path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the scratch file
    pub fn write(&self, contents: &str) -> Result<(), ReviewError> {
        fs::write(&self.path, contents).map_err(|e| ReviewError::io(&self.path, e))
    }

    /// Read the scratch file back.
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD rather than failing the
    /// review, so a file saved in a legacy encoding still decodes.
    pub fn read(&self) -> Result<String, ReviewError> {
        let bytes = fs::read(&self.path).map_err(|e| ReviewError::io(&self.path, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    "{} is not valid UTF-8; invalid bytes were replaced",
                    self.path.display()
                );
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }
}

impl Drop for ScratchLease {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove scratch file {}: {}", self.path.display(), e);
            }
        }
        let _ = self.lock.unlock();
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Review checkpoint: encode, hand to the editor, decode
pub struct EditSession {
    scratch_path: PathBuf,
    codec: RecordCodec,
    editor: Box<dyn Editor>,
}

impl EditSession {
    pub fn new(scratch_path: PathBuf, codec: RecordCodec, editor: impl Editor + 'static) -> Self {
        Self {
            scratch_path,
            codec,
            editor: Box::new(editor),
        }
    }

    /// Let a human correct `document`; blocks until the editor exits.
    ///
    /// Editor failures are logged and otherwise ignored: the document on
    /// disk is decoded either way.
    pub fn review<D: Document>(&self, document: &D) -> Result<D, ReviewError> {
        let lease = ScratchLease::acquire(&self.scratch_path)?;
        lease.write(&document.encode(&self.codec))?;

        info!("Waiting for review of {}", lease.path().display());
        if let Err(e) = self.editor.open_blocking(lease.path()) {
            warn!("Editor did not complete cleanly: {:#}", e);
        }

        let text = lease.read()?;
        Ok(D::decode(&self.codec, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("/tmp/review.txt")),
            PathBuf::from("/tmp/review.txt.lock")
        );
    }

    #[test]
    fn test_system_editor_command_line() {
        let editor = SystemEditor::new(Some("code --wait".to_string()));
        assert_eq!(editor.command_line(), vec!["code", "--wait"]);

        let blank = SystemEditor::new(Some("   ".to_string()));
        assert_eq!(blank.command_line(), SystemEditor::default().command_line());
        assert!(!blank.command_line().is_empty());
    }

    #[test]
    fn test_second_lease_is_refused() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("review.txt");

        let first = ScratchLease::acquire(&path).unwrap();
        assert!(matches!(
            ScratchLease::acquire(&path),
            Err(ReviewError::ScratchBusy { .. })
        ));

        drop(first);
        assert!(ScratchLease::acquire(&path).is_ok());
    }

    #[test]
    fn test_lease_removes_scratch_on_drop() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("review.txt");

        {
            let lease = ScratchLease::acquire(&path).unwrap();
            lease.write("# hello\n").unwrap();
            assert_eq!(lease.read().unwrap(), "# hello\n");
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_lease_reads_invalid_utf8_lossily() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("review.txt");

        let lease = ScratchLease::acquire(&path).unwrap();
        fs::write(&path, b"::name:: K\xf6rb\n").unwrap();

        assert_eq!(lease.read().unwrap(), "::name:: K\u{FFFD}rb\n");
    }
}
