//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the collaborators the pipelines
//! talk to: the inventory service and the structuring LLM. Production
//! implementations live in the submodules; tests substitute fakes.

pub mod gemini;
pub mod homebox;

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;

use crate::domain::{Group, InventoryItem, Label, LabelAssignment, LocationNode, NewItem};

pub use gemini::GeminiStructurer;
pub use homebox::HomeboxClient;

/// Inventory backend
///
/// Transport and protocol failures are errors. A request the backend
/// rejects on an individual item is `Ok(false)` so callers can collect it
/// and carry on with the batch.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Root nodes of the location hierarchy
    async fn location_tree(&self) -> Result<Vec<LocationNode>>;

    /// Create an item; `false` if the backend refused it
    async fn add_item(&self, item: &NewItem) -> Result<bool>;

    /// All items, keyed by id
    async fn items(&self) -> Result<IndexMap<String, InventoryItem>>;

    /// All labels, keyed by name
    async fn labels(&self) -> Result<IndexMap<String, Label>>;

    /// Full backend representation of one item
    async fn item(&self, id: &str) -> Result<serde_json::Value>;

    /// Replace an item with `item`; `false` if the backend refused it
    async fn update_item(&self, id: &str, item: &serde_json::Value) -> Result<bool>;
}

/// LLM that turns free text into structured proposals
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Split a transcript into location groups of `{name, quantity, description}` records.
    ///
    /// `candidate_paths` are the known location paths; a group whose
    /// location fits none of them is headed `error`.
    async fn structure(&self, transcript: &str, candidate_paths: &[String]) -> Result<Vec<Group>>;

    /// Propose label names for each item
    async fn label_items(
        &self,
        items: &[InventoryItem],
        labels: &[Label],
    ) -> Result<Vec<LabelAssignment>>;
}
