//! LLM-assisted labeling of existing inventory items.
//!
//! Proposals are reviewed as flat `{id, name, labels}` records, then merged
//! into each item's existing labels. Unknown ids and label names are warned
//! about and skipped; rejected updates are reported by item name.

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::review::EditSession;
use crate::adapters::{InventoryClient, Structurer};
use crate::domain::{strip_angle_brackets, InventoryItem, Label, LabelAssignment, Record};

/// Outcome of a labeling run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelingReport {
    /// Items offered to the LLM
    pub candidates: usize,
    /// Items whose labels were updated
    pub updated: usize,
    /// Names of items the inventory refused to update
    pub failed: Vec<String>,
    /// Ids that matched no inventory item
    pub unknown_items: Vec<String>,
    /// Label names that matched no inventory label
    pub unknown_labels: Vec<String>,
}

/// Labeling pipeline over injected collaborators
pub struct Labeler<'a> {
    inventory: &'a dyn InventoryClient,
    structurer: &'a dyn Structurer,
    session: &'a EditSession,
    relabel_labeled: bool,
}

impl<'a> Labeler<'a> {
    pub fn new(
        inventory: &'a dyn InventoryClient,
        structurer: &'a dyn Structurer,
        session: &'a EditSession,
        relabel_labeled: bool,
    ) -> Self {
        Self {
            inventory,
            structurer,
            session,
            relabel_labeled,
        }
    }

    /// Blocks the worker thread while the proposals are reviewed; needs the
    /// multi-threaded runtime.
    pub async fn run(&self) -> Result<LabelingReport> {
        let mut report = LabelingReport::default();

        let mut items = self.inventory.items().await?;
        let labels = self.inventory.labels().await?;
        if !self.relabel_labeled {
            items.retain(|_, item| item.labels.is_empty());
        }
        report.candidates = items.len();
        info!(items = items.len(), labels = labels.len(), "Got items and labels");

        if items.is_empty() || labels.is_empty() {
            info!("Nothing to label");
            return Ok(report);
        }

        let item_list: Vec<InventoryItem> = items.values().cloned().collect();
        let label_list: Vec<Label> = labels.values().cloned().collect();
        let assignments = self.structurer.label_items(&item_list, &label_list).await?;
        info!(proposals = assignments.len(), "Processed with LLM");

        let proposals = proposals_to_records(assignments, &items, &mut report);
        let reviewed = tokio::task::block_in_place(|| self.session.review(&proposals))?;
        info!("Checked for errors");

        for record in &reviewed {
            self.apply(record, &items, &labels, &mut report).await?;
        }
        info!(updated = report.updated, failed = report.failed.len(), "Labeled");

        Ok(report)
    }

    async fn apply(
        &self,
        record: &Record,
        items: &IndexMap<String, InventoryItem>,
        labels: &IndexMap<String, Label>,
        report: &mut LabelingReport,
    ) -> Result<()> {
        let Some(id) = record.first("id").map(strip_angle_brackets) else {
            return Ok(());
        };
        let wanted = record.values("labels");
        if wanted.is_empty() {
            return Ok(());
        }
        let Some(item) = items.get(id) else {
            warn!("Reviewed record names unknown item id '{}', skipping", id);
            report.unknown_items.push(id.to_string());
            return Ok(());
        };

        let label_ids = merged_label_ids(item, wanted, labels, report);
        if label_ids.len() == item.labels.len() {
            debug!(item = %item.name, "No new labels");
            return Ok(());
        }

        let mut full = self.inventory.item(id).await?;
        set_label_ids(&mut full, &label_ids);

        if self.inventory.update_item(id, &full).await? {
            report.updated += 1;
        } else {
            warn!("{} could not have labels added, skipping.", item.name);
            report.failed.push(item.name.clone());
        }
        Ok(())
    }
}

/// Turn LLM proposals into reviewable records, dropping unknown ids
fn proposals_to_records(
    assignments: Vec<LabelAssignment>,
    items: &IndexMap<String, InventoryItem>,
    report: &mut LabelingReport,
) -> Vec<Record> {
    let mut records = Vec::new();

    for assignment in assignments {
        let id = strip_angle_brackets(&assignment.id);
        let Some(item) = items.get(id) else {
            warn!("LLM proposed labels for unknown item id '{}'", id);
            report.unknown_items.push(id.to_string());
            continue;
        };

        let mut record = Record::new().with("id", id).with("name", item.name.as_str());
        for label in &assignment.labels {
            record.push("labels", strip_angle_brackets(label));
        }
        records.push(record);
    }

    records
}

/// Existing label ids followed by the ids of newly wanted labels
fn merged_label_ids(
    item: &InventoryItem,
    wanted: &[String],
    labels: &IndexMap<String, Label>,
    report: &mut LabelingReport,
) -> Vec<String> {
    let mut ids: Vec<String> = item.labels.iter().map(|l| l.id.clone()).collect();

    for name in wanted {
        let name = strip_angle_brackets(name);
        match labels.get(name) {
            Some(label) => {
                if !ids.contains(&label.id) {
                    ids.push(label.id.clone());
                }
            }
            None => {
                warn!("Unknown label '{}' for {}, skipping", name, item.name);
                report.unknown_labels.push(name.to_string());
            }
        }
    }

    ids
}

/// Put `labelIds` (and `locationId`, taken from the nested location) on a
/// full item so it can be sent back as an update
fn set_label_ids(full: &mut Value, label_ids: &[String]) {
    let location_id = full
        .pointer("/location/id")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(object) = full.as_object_mut() {
        object.insert("labelIds".to_string(), Value::from(label_ids.to_vec()));
        if let Some(location_id) = location_id {
            object
                .entry("locationId")
                .or_insert_with(|| Value::from(location_id));
        }
    }
}
