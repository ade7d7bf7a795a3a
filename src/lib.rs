//! stashvoice - voice memos to home-inventory entries
//!
//! Records a spoken inventory tour, has an LLM structure it into locations
//! and items, lets a human correct the result in a plain text editor, and
//! pushes the corrected items to a Homebox inventory.
//!
//! # Architecture
//!
//! The reviewable core is synchronous and collaborator-free:
//! - Location trees are flattened into slash-joined paths with stable ids
//! - Records travel through a line-oriented, human-editable text format
//! - Free-text location paths resolve back to ids by exact match
//!
//! Everything with I/O sits behind traits so pipelines can run against fakes.
//!
//! # Modules
//!
//! - `adapters`: External systems (Homebox inventory, Gemini LLM)
//! - `core`: Flattening, resolution, codec, review, and the two pipelines
//! - `domain`: Data structures (LocationNode, Record, Group, InventoryItem)
//! - `ingest`: Audio transcription (whisper)
//! - `config`: Config file, environment, and credentials
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Add the items from a memo to the inventory
//! stashvoice add garage.m4a
//!
//! # Export an importable CSV instead
//! stashvoice add garage.m4a --csv garage.csv
//!
//! # Label items that have no labels yet
//! stashvoice label
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use core::{EditSession, Editor, KeyOrder, RecordCodec};
pub use domain::{FieldValue, Group, LocationIndex, LocationNode, Record};
