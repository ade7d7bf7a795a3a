//! Record Codec Integration Tests
//!
//! Tests for the write/read contract of the editable document format:
//! keys inside the key order survive a round trip, keys outside it do not.

use proptest::prelude::*;
use stashvoice::core::{Document, KeyOrder, RecordCodec, DEFAULT_KEY_ORDER};
use stashvoice::domain::{FieldValue, Group, Record};

#[test]
fn test_hammer_is_written_in_key_order() {
    let codec = RecordCodec::new(KeyOrder::new(["name", "quantity"]));
    let record = Record::new().with("quantity", "2").with("name", "Hammer");

    let text = codec.write_records(&[record.clone()]);
    let body: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();

    assert_eq!(body, vec!["::name:: Hammer ::quantity:: 2 "]);
    assert_eq!(codec.read_records(&text), vec![record]);
}

#[test]
fn test_two_element_list_survives() {
    let codec = RecordCodec::default();
    let record = Record::new()
        .with("name", "Drill")
        .with("labels", vec!["A", "B"]);

    let text = codec.write_records(&[record]);
    let read = codec.read_records(&text);

    assert_eq!(read.len(), 1);
    assert_eq!(read[0].get("labels"), Some(&FieldValue::from(vec!["A", "B"])));
}

#[test]
fn test_single_element_list_reads_back_as_scalar() {
    let codec = RecordCodec::default();
    let record = Record::new()
        .with("name", "Drill")
        .with("labels", vec!["Tools"]);

    let read = codec.read_records(&codec.write_records(&[record]));

    assert_eq!(read[0].get("labels"), Some(&FieldValue::from("Tools")));
}

#[test]
fn test_unknown_keys_are_lost() {
    let codec = RecordCodec::new(KeyOrder::new(["name"]));
    let record = Record::new()
        .with("name", "Ladder")
        .with("color", "silver");

    let read = codec.read_records(&codec.write_records(&[record]));

    assert_eq!(read, vec![Record::new().with("name", "Ladder")]);
}

#[test]
fn test_widened_key_order_keeps_extra_keys() {
    let codec = RecordCodec::new(KeyOrder::default().with_key("color"));
    let record = Record::new()
        .with("name", "Ladder")
        .with("color", "silver");

    let read = codec.read_records(&codec.write_records(&[record.clone()]));

    assert_eq!(read, vec![record]);
}

#[test]
fn test_hand_edited_grouped_document() {
    let codec = RecordCodec::default();
    let edited = "\
# Use this file to fix any errors made by the AI

<Garage/Shelf>
::name:: Hammer ::quantity:: 2
   ::name:: Tape measure   ::description:: 5m, yellow
this line was typed by mistake
<Kitchen>
::name:: Whisk ::labels:: Baking ::labels:: Steel
";

    let groups = codec.read_groups(edited);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].header, "Garage/Shelf");
    assert_eq!(groups[0].records.len(), 2);
    assert_eq!(groups[0].records[1].first("description"), Some("5m, yellow"));
    assert_eq!(groups[1].header, "Kitchen");
    assert_eq!(
        groups[1].records[0].get("labels"),
        Some(&FieldValue::from(vec!["Baking", "Steel"]))
    );
}

#[test]
fn test_document_trait_dispatches_by_shape() {
    let codec = RecordCodec::default();
    let groups = vec![Group::new(
        "error",
        vec![Record::new().with("name", "Mystery box")],
    )];

    let text = groups.encode(&codec);
    assert!(text.contains("<error>\n"));

    let back = Vec::<Group>::decode(&codec, &text);
    assert_eq!(back, groups);
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .,'/-]{0,12}".prop_map(|s| s.trim_end().to_string())
}

fn field_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        value_strategy().prop_map(FieldValue::Scalar),
        prop::collection::vec(value_strategy(), 2..4).prop_map(FieldValue::List),
    ]
}

/// Non-empty records whose keys all come from the default key order
fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::vec(prop::option::of(field_strategy()), DEFAULT_KEY_ORDER.len())
        .prop_filter("record needs at least one field", |fields| {
            fields.iter().any(Option::is_some)
        })
        .prop_map(|fields| {
            let mut record = Record::new();
            for (key, field) in DEFAULT_KEY_ORDER.iter().zip(fields) {
                if let Some(value) = field {
                    record.set(*key, value);
                }
            }
            record
        })
}

fn group_strategy() -> impl Strategy<Value = Group> {
    (
        "[A-Za-z][A-Za-z0-9 /]{0,12}",
        prop::collection::vec(record_strategy(), 0..4),
    )
        .prop_map(|(header, records)| Group::new(header, records))
}

proptest! {
    #[test]
    fn prop_records_round_trip(records in prop::collection::vec(record_strategy(), 0..6)) {
        let codec = RecordCodec::default();
        let text = codec.write_records(&records);
        prop_assert_eq!(codec.read_records(&text), records);
    }

    #[test]
    fn prop_groups_round_trip(groups in prop::collection::vec(group_strategy(), 0..5)) {
        let codec = RecordCodec::default();
        let text = codec.write_groups(&groups);
        prop_assert_eq!(codec.read_groups(&text), groups);
    }

    #[test]
    fn prop_output_is_stable_after_one_pass(groups in prop::collection::vec(group_strategy(), 0..5)) {
        let codec = RecordCodec::default();
        let once = codec.write_groups(&groups);
        let twice = codec.write_groups(&codec.read_groups(&once));
        prop_assert_eq!(once, twice);
    }
}
