//! Location hierarchy as served by the inventory backend.

use serde::{Deserialize, Serialize};

/// A node of the backend location tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    /// Stable backend identifier
    pub id: String,

    /// Display name (one path segment)
    pub name: String,

    /// Child locations, in backend order
    #[serde(default)]
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    /// Create a leaf node
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Attach children (builder style)
    pub fn with_children(mut self, children: Vec<LocationNode>) -> Self {
        self.children = children;
        self
    }
}

/// One flattened entry: full slash-joined path and the id of the node it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedLocation<'a> {
    pub path: &'a str,
    pub id: &'a str,
}

/// Parallel, positionally aligned lists of flattened paths and ids.
///
/// Index `i` in [`paths`](Self::paths) and index `i` in [`ids`](Self::ids)
/// always describe the same tree node. The only way to grow the index is
/// [`push`](Self::push), which appends to both lists at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationIndex {
    paths: Vec<String>,
    ids: Vec<String>,
}

impl LocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one (path, id) pair
    pub fn push(&mut self, path: String, id: String) {
        self.paths.push(path);
        self.ids.push(id);
    }

    /// Append every entry of `other`, preserving its order
    pub fn extend(&mut self, other: LocationIndex) {
        self.paths.extend(other.paths);
        self.ids.extend(other.ids);
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Id of the first entry whose path equals `path` exactly
    pub fn id_for(&self, path: &str) -> Option<&str> {
        self.paths
            .iter()
            .position(|p| p == path)
            .map(|i| self.ids[i].as_str())
    }

    /// Iterate (path, id) pairs in flattened order
    pub fn iter(&self) -> impl Iterator<Item = FlattenedLocation<'_>> {
        self.paths
            .iter()
            .zip(self.ids.iter())
            .map(|(path, id)| FlattenedLocation { path, id })
    }

    /// Consume into the two parallel lists
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.paths, self.ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_deserializes_without_children() {
        let node: LocationNode =
            serde_json::from_str(r#"{"id": "a1", "name": "Attic", "type": "location"}"#).unwrap();
        assert_eq!(node, LocationNode::leaf("a1", "Attic"));
    }

    #[test]
    fn test_id_for_returns_first_match() {
        let mut index = LocationIndex::new();
        index.push("Garage".to_string(), "r1".to_string());
        index.push("Garage".to_string(), "r9".to_string());

        assert_eq!(index.id_for("Garage"), Some("r1"));
        assert_eq!(index.id_for("garage"), None);
    }
}
