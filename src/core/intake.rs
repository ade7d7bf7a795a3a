//! Voice memo → inventory intake.
//!
//! Steps, in order:
//! 1. fetch and flatten the location tree
//! 2. transcribe the memo
//! 3. let the LLM structure the transcript into location groups
//! 4. human review of the groups
//! 5. either resolve locations and push items, or export a CSV
//!
//! Items the inventory rejects are collected per location instead of
//! aborting the batch. Nothing is retried.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::{info, warn};

use super::flatten::flatten;
use super::resolve::{resolve, ResolveReport};
use super::review::EditSession;
use crate::adapters::{InventoryClient, Structurer};
use crate::domain::{Group, LocationIndex, NewItem, Record};
use crate::ingest::Transcriber;

/// Column headers of the importable CSV
pub const CSV_COLUMNS: [&str; 6] = [
    "HB.name",
    "HB.quantity",
    "HB.location",
    "HB.description",
    "HB.purchase_from",
    "HB.purchase_price",
];

/// A memo that has been transcribed, structured and reviewed
#[derive(Debug, Clone)]
pub struct PreparedMemo {
    /// Reviewed groups, headers still location paths
    pub groups: Vec<Group>,
    pub locations: LocationIndex,
}

/// Outcome of pushing a memo's items
#[derive(Debug, Clone, Default)]
pub struct IntakeReport {
    pub resolve: ResolveReport,
    pub added: usize,
    /// Rejected items, keyed by location id
    pub failed: IndexMap<String, Vec<Record>>,
}

impl IntakeReport {
    pub fn failed_items(&self) -> usize {
        self.failed.values().map(Vec::len).sum()
    }

    /// Everything was resolved and accepted
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.resolve.is_clean()
    }
}

/// Intake pipeline over injected collaborators
pub struct Intake<'a> {
    inventory: &'a dyn InventoryClient,
    structurer: &'a dyn Structurer,
    transcriber: &'a dyn Transcriber,
    session: &'a EditSession,
}

impl<'a> Intake<'a> {
    pub fn new(
        inventory: &'a dyn InventoryClient,
        structurer: &'a dyn Structurer,
        transcriber: &'a dyn Transcriber,
        session: &'a EditSession,
    ) -> Self {
        Self {
            inventory,
            structurer,
            transcriber,
            session,
        }
    }

    /// Transcribe, structure and review one memo.
    ///
    /// Blocks the worker thread in the review step until the editor exits;
    /// needs the multi-threaded runtime.
    pub async fn prepare(&self, audio_path: &Path) -> Result<PreparedMemo> {
        let tree = self.inventory.location_tree().await?;
        let locations = flatten(&tree);
        info!(count = locations.len(), "Locations fetched");

        let transcript = self
            .transcriber
            .transcribe(audio_path)
            .await
            .with_context(|| format!("Failed to transcribe {}", audio_path.display()))?;
        info!("Text interpreted as: {}", transcript.text);

        let groups = self
            .structurer
            .structure(&transcript.text, locations.paths())
            .await?;
        info!(groups = groups.len(), "Formatted by LLM");

        let groups = tokio::task::block_in_place(|| self.session.review(&groups))?;
        info!("Data checked for errors");

        Ok(PreparedMemo {
            groups,
            locations,
        })
    }

    /// Resolve locations and add every surviving item
    pub async fn push(&self, prepared: PreparedMemo) -> Result<IntakeReport> {
        let mut groups = prepared.groups;
        let resolve_report = resolve(&mut groups, &prepared.locations);
        info!(
            resolved = resolve_report.resolved,
            dropped = resolve_report.dropped_groups(),
            "Locations translated"
        );

        let mut report = add_groups(self.inventory, &groups).await?;
        report.resolve = resolve_report;
        Ok(report)
    }
}

/// Add every record of already-resolved groups (headers are location ids)
pub async fn add_groups(inventory: &dyn InventoryClient, groups: &[Group]) -> Result<IntakeReport> {
    let mut report = IntakeReport::default();

    for group in groups {
        for record in &group.records {
            let accepted = match NewItem::from_record(record, &group.header) {
                Ok(item) => {
                    let accepted = inventory.add_item(&item).await?;
                    if !accepted {
                        warn!(location = %group.header, "Inventory rejected item '{}'", item.name);
                    }
                    accepted
                }
                Err(e) => {
                    warn!(location = %group.header, "{}, not added", e);
                    false
                }
            };

            if accepted {
                report.added += 1;
            } else {
                report
                    .failed
                    .entry(group.header.clone())
                    .or_default()
                    .push(record.clone());
            }
        }
    }

    Ok(report)
}

/// Write groups as importable CSV rows; the location column is the group header
fn write_rows<W: Write>(writer: &mut csv::Writer<W>, groups: &[Group]) -> csv::Result<()> {
    writer.write_record(CSV_COLUMNS)?;

    for group in groups {
        for record in &group.records {
            let field = |key: &str| record.values(key).join("; ");
            writer.write_record([
                field("name"),
                field("quantity"),
                group.header.clone(),
                field("description"),
                field("purchaseFrom"),
                field("purchasePrice"),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write groups as CSV to `path`
pub fn write_csv(path: &Path, groups: &[Group]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV: {}", path.display()))?;
    write_rows(&mut writer, groups)
        .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
    info!("Generated file {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_csv(groups: &[Group]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_rows(&mut writer, groups).unwrap();
        let bytes = writer.into_inner().map_err(|e| e.into_error()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_render_csv() {
        let groups = vec![Group::new(
            "Garage/Shelf",
            vec![
                Record::new()
                    .with("name", "Hammer")
                    .with("quantity", "2")
                    .with("description", "Claw, red"),
                Record::new()
                    .with("name", "Tape \"duct\"")
                    .with("purchasePrice", "4.50"),
            ],
        )];

        let csv = render_csv(&groups);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "HB.name,HB.quantity,HB.location,HB.description,HB.purchase_from,HB.purchase_price"
        );
        assert_eq!(lines[1], "Hammer,2,Garage/Shelf,\"Claw, red\",,");
        assert_eq!(lines[2], "\"Tape \"\"duct\"\"\",,Garage/Shelf,,,4.50");
    }

    #[test]
    fn test_write_csv_to_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("garage.csv");
        let groups = vec![Group::new("Garage", vec![Record::new().with("name", "Rake")])];

        write_csv(&path, &groups).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().nth(1), Some("Rake,,Garage,,,"));
    }

    #[test]
    fn test_report_completeness() {
        let mut report = IntakeReport::default();
        assert!(report.is_complete());

        report
            .failed
            .entry("r1".to_string())
            .or_default()
            .push(Record::new().with("name", "Saw"));
        assert!(!report.is_complete());
        assert_eq!(report.failed_items(), 1);
    }
}
