//! Location path resolution.
//!
//! Replaces each group's free-text header with the id of the location whose
//! flattened path matches it exactly. Matching is strict: case-sensitive, no
//! trimming, no fuzzy fallback. A group whose header matches nothing keeps
//! its header but loses all of its records; the loss is logged and returned
//! in the [`ResolveReport`].

use tracing::{debug, warn};

use crate::domain::{Group, LocationIndex, Record};

/// A group whose header did not name a known location
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedGroup {
    /// The unmatched header, unchanged
    pub path: String,
    /// The records that were discarded
    pub records: Vec<Record>,
}

/// Outcome of resolving a batch of groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    /// Number of groups whose header was replaced with an id
    pub resolved: usize,
    /// Groups emptied because their header matched no location
    pub dropped: Vec<DroppedGroup>,
}

impl ResolveReport {
    pub fn dropped_groups(&self) -> usize {
        self.dropped.len()
    }

    pub fn dropped_records(&self) -> usize {
        self.dropped.iter().map(|d| d.records.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Resolve group headers in place against the flattened location index
pub fn resolve(groups: &mut [Group], index: &LocationIndex) -> ResolveReport {
    let mut report = ResolveReport::default();

    for group in groups.iter_mut() {
        match index.id_for(&group.header) {
            Some(id) => {
                debug!(path = %group.header, id, "Location resolved");
                group.header = id.to_string();
                report.resolved += 1;
            }
            None => {
                let records = std::mem::take(&mut group.records);
                let names: Vec<String> = records.iter().map(Record::label).collect();
                warn!(
                    "Location '{}' not found. These items will be discarded: {:?}",
                    group.header, names
                );
                report.dropped.push(DroppedGroup {
                    path: group.header.clone(),
                    records,
                });
            }
        }
    }

    report
}
