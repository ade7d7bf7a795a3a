//! Inventory-side entities exchanged with the backend and the LLM.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::Record;

/// A reviewed record that cannot become an item as written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("'{name}' has quantity '{value}', which is not a whole number")]
    InvalidQuantity { name: String, value: String },
}

/// A label as defined in the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// An existing inventory item (summary fields only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Payload for creating an item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub location_id: String,
}

impl NewItem {
    /// Build from a reviewed record placed at `location_id`.
    ///
    /// A missing or blank quantity counts as 1; anything else must be a
    /// whole number.
    pub fn from_record(record: &Record, location_id: &str) -> Result<Self, ItemError> {
        let name = record.first("name").unwrap_or_default().to_string();

        let quantity = match record.first("quantity").map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ItemError::InvalidQuantity {
                    name: name.clone(),
                    value: raw.to_string(),
                })?,
        };

        Ok(Self {
            name,
            description: record.first("description").unwrap_or_default().to_string(),
            quantity,
            location_id: location_id.to_string(),
        })
    }
}

/// LLM proposal: labels to attach to the item with `id`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelAssignment {
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Strip one pair of surrounding angle brackets (`<Tools>` → `Tools`)
pub fn strip_angle_brackets(value: &str) -> &str {
    value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
}
