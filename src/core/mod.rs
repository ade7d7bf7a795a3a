//! Core logic.
//!
//! This module contains:
//! - Flatten: location tree → slash-joined paths and ids
//! - Resolve: group headers → location ids
//! - Codec: editable text format for records and groups
//! - Review: external-editor checkpoint over the codec
//! - Intake / Labeling: the two pipelines built on the above

pub mod codec;
pub mod flatten;
pub mod intake;
pub mod labeling;
pub mod resolve;
pub mod review;

// Re-export commonly used types
pub use codec::{Document, KeyOrder, RecordCodec, DEFAULT_KEY_ORDER};
pub use flatten::flatten;
pub use intake::{Intake, IntakeReport, PreparedMemo};
pub use labeling::{Labeler, LabelingReport};
pub use resolve::{resolve, DroppedGroup, ResolveReport};
pub use review::{EditSession, Editor, ReviewError, ScratchLease, SystemEditor};
