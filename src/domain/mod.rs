//! Domain types for stashvoice.
//!
//! This module contains the core data structures:
//! - Location: backend location tree and its flattened index
//! - Record: free-form reviewable records and header groups
//! - Inventory: items, labels and creation payloads

pub mod inventory;
pub mod location;
pub mod record;

// Re-export commonly used types
pub use inventory::{
    strip_angle_brackets, InventoryItem, ItemError, Label, LabelAssignment, NewItem,
};
pub use location::{FlattenedLocation, LocationIndex, LocationNode};
pub use record::{FieldValue, Group, Record};
