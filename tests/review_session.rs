//! Review Session Integration Tests
//!
//! Tests for the editor checkpoint: edits on disk win, editor failures fall
//! back to the staged text, and the scratch file never outlives a review.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use stashvoice::core::{EditSession, Editor, RecordCodec, ReviewError, ScratchLease};
use stashvoice::domain::{Group, Record};
use tempfile::TempDir;

/// Editor that replaces the document with fixed text and remembers what it saw
struct ScriptedEditor {
    replacement: Option<String>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Editor for ScriptedEditor {
    fn open_blocking(&self, path: &Path) -> anyhow::Result<()> {
        let staged = std::fs::read_to_string(path)?;
        self.seen.lock().unwrap().push(staged);
        if let Some(text) = &self.replacement {
            std::fs::write(path, text)?;
        }
        Ok(())
    }
}

/// Editor that cannot be launched
struct BrokenEditor;

impl Editor for BrokenEditor {
    fn open_blocking(&self, _path: &Path) -> anyhow::Result<()> {
        anyhow::bail!("Failed to launch editor 'nope': No such file or directory")
    }
}

/// Editor that saves raw bytes, e.g. a Latin-1 or BOM-prefixed file
struct BytesEditor(&'static [u8]);

impl Editor for BytesEditor {
    fn open_blocking(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.0)?;
        Ok(())
    }
}

/// Editor that reports whether the scratch path was locked while it ran
struct ContendingEditor {
    saw_busy: Arc<Mutex<Option<bool>>>,
}

impl Editor for ContendingEditor {
    fn open_blocking(&self, path: &Path) -> anyhow::Result<()> {
        let busy = matches!(
            ScratchLease::acquire(path),
            Err(ReviewError::ScratchBusy { .. })
        );
        *self.saw_busy.lock().unwrap() = Some(busy);
        Ok(())
    }
}

fn scratch(temp: &TempDir) -> PathBuf {
    temp.path().join("review").join("review.txt")
}

fn garage() -> Vec<Group> {
    vec![Group::new(
        "error",
        vec![Record::new().with("name", "Hammer").with("quantity", "2")],
    )]
}

#[test]
fn test_edits_on_disk_are_returned() {
    let temp = TempDir::new().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let editor = ScriptedEditor {
        replacement: Some("<Garage/Shelf>\n::name:: Hammer ::quantity:: 3\n".to_string()),
        seen: Arc::clone(&seen),
    };
    let session = EditSession::new(scratch(&temp), RecordCodec::default(), editor);

    let reviewed = session.review(&garage()).unwrap();

    assert_eq!(reviewed.len(), 1);
    assert_eq!(reviewed[0].header, "Garage/Shelf");
    assert_eq!(reviewed[0].records[0].first("quantity"), Some("3"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with('#'));
    assert!(seen[0].contains("<error>\n::quantity:: 2 ::name:: Hammer \n"));
}

#[test]
fn test_untouched_document_comes_back_unchanged() {
    let temp = TempDir::new().unwrap();
    let editor = ScriptedEditor {
        replacement: None,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let session = EditSession::new(scratch(&temp), RecordCodec::default(), editor);

    let reviewed = session.review(&garage()).unwrap();

    assert_eq!(reviewed, garage());
}

#[test]
fn test_broken_editor_still_decodes_staged_text() {
    let temp = TempDir::new().unwrap();
    let session = EditSession::new(scratch(&temp), RecordCodec::default(), BrokenEditor);

    let records = vec![Record::new().with("id", "i1").with("labels", vec!["A", "B"])];
    let reviewed = session.review(&records).unwrap();

    assert_eq!(reviewed, records);
}

#[test]
fn test_scratch_file_is_removed_after_review() {
    let temp = TempDir::new().unwrap();
    let path = scratch(&temp);
    let session = EditSession::new(path.clone(), RecordCodec::default(), BrokenEditor);

    session.review(&garage()).unwrap();

    assert!(!path.exists());
}

#[test]
fn test_scratch_is_locked_while_editor_runs() {
    let temp = TempDir::new().unwrap();
    let saw_busy = Arc::new(Mutex::new(None));
    let editor = ContendingEditor {
        saw_busy: Arc::clone(&saw_busy),
    };
    let session = EditSession::new(scratch(&temp), RecordCodec::default(), editor);

    session.review(&garage()).unwrap();

    assert_eq!(*saw_busy.lock().unwrap(), Some(true));
}

#[test]
fn test_review_fails_fast_when_scratch_is_busy() {
    let temp = TempDir::new().unwrap();
    let path = scratch(&temp);
    let _held = ScratchLease::acquire(&path).unwrap();

    let session = EditSession::new(path, RecordCodec::default(), BrokenEditor);

    assert!(matches!(
        session.review(&garage()),
        Err(ReviewError::ScratchBusy { .. })
    ));
}

#[test]
fn test_latin1_save_keeps_every_edit() {
    let temp = TempDir::new().unwrap();
    let path = scratch(&temp);
    let editor = BytesEditor(b"<Garage>\n::name:: K\xf6rb ::quantity:: 2\n::name:: Saw\n");
    let session = EditSession::new(path.clone(), RecordCodec::default(), editor);

    let reviewed = session.review(&garage()).unwrap();

    assert_eq!(reviewed.len(), 1);
    assert_eq!(reviewed[0].header, "Garage");
    assert_eq!(reviewed[0].records.len(), 2);
    assert_eq!(reviewed[0].records[0].first("name"), Some("K\u{FFFD}rb"));
    assert_eq!(reviewed[0].records[0].first("quantity"), Some("2"));
    assert_eq!(reviewed[0].records[1].first("name"), Some("Saw"));
    assert!(!path.exists());
}

#[test]
fn test_byte_order_mark_does_not_hide_first_header() {
    let temp = TempDir::new().unwrap();
    let editor = BytesEditor("\u{FEFF}<Garage>\n::name:: Saw\n".as_bytes());
    let session = EditSession::new(scratch(&temp), RecordCodec::default(), editor);

    let reviewed = session.review(&garage()).unwrap();

    assert_eq!(reviewed, vec![Group::new("Garage", vec![Record::new().with("name", "Saw")])]);
}
