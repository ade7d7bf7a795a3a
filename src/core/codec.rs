//! Human-editable line format for records.
//!
//! # Grammar
//!
//! ```text
//! document = preamble? line*
//! line     = blank | comment | header | record | other
//! blank    = whitespace only
//! comment  = "#" text
//! header   = "<" text ">"
//! record   = junk? token (whitespace token)*
//! token    = "::" key "::" value
//! key      = word-char+                  (alphanumeric or "_")
//! value    = text up to the next whitespace-preceded token, or end of line
//! ```
//!
//! Lines are classified in the order above after trimming; anything that is
//! not a header and holds no well-formed token is `other` and ignored on
//! read. A `::` that does not open a well-formed token is part of the value.
//! Values are trimmed; an empty value is kept as an empty string.
//!
//! Writing is lossy by policy: only keys listed in the codec's [`KeyOrder`]
//! are emitted, in that order. Widen the key order to round-trip more keys.

use tracing::debug;

use crate::domain::{Group, Record};

/// Keys recognised by default, in emission order
pub const DEFAULT_KEY_ORDER: [&str; 7] = [
    "id",
    "quantity",
    "name",
    "description",
    "purchaseFrom",
    "purchasePrice",
    "labels",
];

/// Preamble for documents with group headers
pub const GROUPED_PREAMBLE: &str = "\
# Use this file to fix any errors made by the AI
# If a location is <error>, make sure to assign a correct location!
# e.g. 'Kitchen' or 'Storage Room/Shelf 1/Box 4'.
";

/// Preamble for flat record lists
pub const FLAT_PREAMBLE: &str = "# Use this file to fix any errors made by the AI\n";

/// Ordered list of keys the codec writes; everything else is dropped on write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOrder {
    keys: Vec<String>,
}

impl KeyOrder {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Append `key` unless already present
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

impl Default for KeyOrder {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_ORDER)
    }
}

/// One `::key:: value` pair found on a record line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Classification of a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Comment(&'a str),
    /// Inner text of a `<...>` line
    Header(&'a str),
    Record(Vec<Token<'a>>),
    Other(&'a str),
}

/// Classify one line of an edited document.
///
/// A leading byte order mark is treated like whitespace.
pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim_start_matches('\u{feff}').trim();

    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(comment) = line.strip_prefix('#') {
        return Line::Comment(comment);
    }
    if line.len() >= 2 && line.starts_with('<') && line.ends_with('>') {
        return Line::Header(&line[1..line.len() - 1]);
    }

    let tokens = tokenize(line);
    if tokens.is_empty() {
        Line::Other(line)
    } else {
        Line::Record(tokens)
    }
}

/// Extract every `::key:: value` token from a record line.
///
/// Text before the first token is ignored.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = find_token(line, 0, false);

    while let Some((_, key, value_start)) = cursor {
        let next = find_token(line, value_start, true);
        let value_end = next.map(|(start, _, _)| start).unwrap_or(line.len());
        tokens.push(Token {
            key,
            value: line[value_start..value_end].trim(),
        });
        cursor = next;
    }

    tokens
}

/// Find the next well-formed token opener at or after `from`.
///
/// Returns `(token_start, key, value_start)`. With `after_whitespace`, only
/// openers directly preceded by whitespace count, which is what ends a value.
fn find_token(line: &str, from: usize, after_whitespace: bool) -> Option<(usize, &str, usize)> {
    let bytes = line.as_bytes();
    let mut at = from;

    while at + 1 < bytes.len() {
        if bytes[at] == b':' && bytes[at + 1] == b':' {
            let preceded_ok = !after_whitespace
                || line[..at]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace);
            if preceded_ok {
                if let Some((key, value_start)) = token_at(line, at) {
                    return Some((at, key, value_start));
                }
            }
        }
        at += 1;
    }

    None
}

/// Parse `::key::` starting exactly at byte `at`
fn token_at(line: &str, at: usize) -> Option<(&str, usize)> {
    let rest = line[at..].strip_prefix("::")?;
    let key_len: usize = rest
        .chars()
        .take_while(|c| is_word_char(*c))
        .map(char::len_utf8)
        .sum();
    if key_len == 0 {
        return None;
    }
    rest[key_len..].strip_prefix("::")?;
    Some((&rest[..key_len], at + 2 + key_len + 2))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Build a record from tokens, applying the scalar → sequence promotion rule
fn record_from_tokens(tokens: &[Token<'_>]) -> Record {
    let mut record = Record::new();
    for token in tokens {
        record.push(token.key, token.value);
    }
    record
}

/// Values and headers must stay on one line
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Writes and reads the editable document format
#[derive(Debug, Clone, Default)]
pub struct RecordCodec {
    key_order: KeyOrder,
}

impl RecordCodec {
    pub fn new(key_order: KeyOrder) -> Self {
        Self { key_order }
    }

    pub fn key_order(&self) -> &KeyOrder {
        &self.key_order
    }

    /// Render groups as header lines each followed by their record lines
    pub fn write_groups(&self, groups: &[Group]) -> String {
        let mut out = String::from(GROUPED_PREAMBLE);
        for group in groups {
            out.push_str(&format!("<{}>\n", single_line(&group.header)));
            for record in &group.records {
                self.write_record_line(&mut out, record);
            }
        }
        out
    }

    /// Render a flat list of records, one line each
    pub fn write_records(&self, records: &[Record]) -> String {
        let mut out = String::from(FLAT_PREAMBLE);
        for record in records {
            self.write_record_line(&mut out, record);
        }
        out
    }

    fn write_record_line(&self, out: &mut String, record: &Record) {
        for key in self.key_order.keys() {
            let Some(value) = record.get(key) else {
                continue;
            };
            for v in value.values().iter().filter(|v| !v.is_empty()) {
                out.push_str(&format!("::{}:: {} ", key, single_line(v)));
            }
        }
        out.push('\n');

        let dropped: Vec<&str> = record
            .keys()
            .filter(|k| !self.key_order.contains(k))
            .collect();
        if !dropped.is_empty() {
            debug!(?dropped, "Keys outside the key order were not written");
        }
    }

    /// Parse an edited grouped document.
    ///
    /// Record lines before the first header belong to no group and are
    /// ignored.
    pub fn read_groups(&self, text: &str) -> Vec<Group> {
        let mut groups = Vec::new();
        let mut current: Option<Group> = None;

        for line in text.lines() {
            match classify(line) {
                Line::Header(header) => {
                    if let Some(group) = current.take() {
                        groups.push(group);
                    }
                    current = Some(Group::new(header, Vec::new()));
                }
                Line::Record(tokens) => match current.as_mut() {
                    Some(group) => group.records.push(record_from_tokens(&tokens)),
                    None => debug!(line, "Record line outside any group ignored"),
                },
                Line::Blank | Line::Comment(_) | Line::Other(_) => {}
            }
        }

        if let Some(group) = current {
            groups.push(group);
        }
        groups
    }

    /// Parse an edited flat document; header lines are ignored
    pub fn read_records(&self, text: &str) -> Vec<Record> {
        text.lines()
            .filter_map(|line| match classify(line) {
                Line::Record(tokens) => Some(record_from_tokens(&tokens)),
                _ => None,
            })
            .collect()
    }
}

/// Something that can be staged as an editable document
pub trait Document: Sized {
    fn encode(&self, codec: &RecordCodec) -> String;
    fn decode(codec: &RecordCodec, text: &str) -> Self;
}

impl Document for Vec<Group> {
    fn encode(&self, codec: &RecordCodec) -> String {
        codec.write_groups(self)
    }

    fn decode(codec: &RecordCodec, text: &str) -> Self {
        codec.read_groups(text)
    }
}

impl Document for Vec<Record> {
    fn encode(&self, codec: &RecordCodec) -> String {
        codec.write_records(self)
    }

    fn decode(codec: &RecordCodec, text: &str) -> Self {
        codec.read_records(text)
    }
}
