use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Identifier the store assigns to a submitted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A typed value written to a record field or line column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Float(_) => None,
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&RecordId> for FieldValue {
    fn from(id: &RecordId) -> Self {
        FieldValue::Text(id.0.clone())
    }
}

/// One row of a sublist, keyed by column id.
pub type Line = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
enum Cursor {
    New(Line),
    Existing(usize, Line),
}

/// Rows of one sublist plus the line currently being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sublist {
    pub lines: Vec<Line>,
    #[serde(skip)]
    cursor: Option<Cursor>,
}

impl Sublist {
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines,
            cursor: None,
        }
    }
}

/// In-memory representation of a record being assembled before submission.
///
/// Line indexes are 1-based, as in the store's own sublist API. Line edits go
/// through a cursor: open or select a line, set columns, commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub record_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Fields set by display text rather than internal value
    #[serde(default)]
    pub field_texts: BTreeMap<String, String>,
    #[serde(default)]
    pub sublists: BTreeMap<String, Sublist>,
}

impl DraftRecord {
    pub fn new(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            ..Default::default()
        }
    }

    pub fn set_field(&mut self, field_id: &str, value: FieldValue) {
        self.fields.insert(field_id.to_string(), value);
    }

    pub fn set_field_text(&mut self, field_id: &str, text: &str) {
        self.field_texts
            .insert(field_id.to_string(), text.to_string());
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    pub fn field_text(&self, field_id: &str) -> Option<&str> {
        self.field_texts.get(field_id).map(String::as_str)
    }

    pub fn lines(&self, sublist: &str) -> &[Line] {
        self.sublists
            .get(sublist)
            .map(|s| s.lines.as_slice())
            .unwrap_or(&[])
    }

    pub fn line_count(&self, sublist: &str) -> usize {
        self.lines(sublist).len()
    }

    /// Column value of line `index` (1-based).
    pub fn line_column(&self, sublist: &str, index: usize, column: &str) -> Option<&FieldValue> {
        index
            .checked_sub(1)
            .and_then(|i| self.lines(sublist).get(i))
            .and_then(|line| line.get(column))
    }

    /// Starts a new, empty line. An uncommitted line is discarded.
    pub fn open_line(&mut self, sublist: &str) {
        self.sublist_mut(sublist).cursor = Some(Cursor::New(Line::new()));
    }

    /// Starts editing an existing line.
    pub fn select_line(&mut self, sublist: &str, index: usize) -> StoreResult<()> {
        let line = self.existing_line(sublist, index)?.clone();
        self.sublist_mut(sublist).cursor = Some(Cursor::Existing(index, line));
        Ok(())
    }

    pub fn set_current_line_value(
        &mut self,
        sublist: &str,
        column: &str,
        value: FieldValue,
    ) -> StoreResult<()> {
        match self.sublist_mut(sublist).cursor.as_mut() {
            Some(Cursor::New(line)) | Some(Cursor::Existing(_, line)) => {
                line.insert(column.to_string(), value);
                Ok(())
            }
            None => Err(StoreError::NoCurrentLine(sublist.to_string())),
        }
    }

    pub fn commit_line(&mut self, sublist: &str) -> StoreResult<()> {
        let list = self.sublist_mut(sublist);
        match list.cursor.take() {
            Some(Cursor::New(line)) => {
                list.lines.push(line);
                Ok(())
            }
            Some(Cursor::Existing(index, line)) => match list.lines.get_mut(index - 1) {
                Some(slot) => {
                    *slot = line;
                    Ok(())
                }
                None => Err(StoreError::InvalidLine {
                    sublist: sublist.to_string(),
                    index,
                }),
            },
            None => Err(StoreError::NoCurrentLine(sublist.to_string())),
        }
    }

    /// Writes a column of an existing line without selecting it.
    pub fn set_line_value(
        &mut self,
        sublist: &str,
        index: usize,
        column: &str,
        value: FieldValue,
    ) -> StoreResult<()> {
        self.existing_line(sublist, index)?;
        self.sublist_mut(sublist).lines[index - 1].insert(column.to_string(), value);
        Ok(())
    }

    pub fn remove_line(&mut self, sublist: &str, index: usize) -> StoreResult<()> {
        self.existing_line(sublist, index)?;
        let list = self.sublist_mut(sublist);
        list.lines.remove(index - 1);
        list.cursor = None;
        Ok(())
    }

    fn existing_line(&self, sublist: &str, index: usize) -> StoreResult<&Line> {
        index
            .checked_sub(1)
            .and_then(|i| self.lines(sublist).get(i))
            .ok_or_else(|| StoreError::InvalidLine {
                sublist: sublist.to_string(),
                index,
            })
    }

    fn sublist_mut(&mut self, sublist: &str) -> &mut Sublist {
        self.sublists.entry(sublist.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lines_are_appended_on_commit() {
        let mut record = DraftRecord::new("salesorder");
        record.open_line("item");
        record
            .set_current_line_value("item", "item", FieldValue::text("55"))
            .unwrap();
        assert_eq!(record.line_count("item"), 0);
        record.commit_line("item").unwrap();
        assert_eq!(record.line_count("item"), 1);
        assert_eq!(
            record.line_column("item", 1, "item"),
            Some(&FieldValue::text("55"))
        );
    }

    #[test]
    fn selected_lines_are_replaced_on_commit() {
        let mut record = DraftRecord::new("itemfulfillment");
        record.sublists.insert(
            "item".to_string(),
            Sublist::new(vec![Line::new(), Line::new()]),
        );
        record.select_line("item", 2).unwrap();
        record
            .set_current_line_value("item", "quantity", FieldValue::Integer(3))
            .unwrap();
        record.commit_line("item").unwrap();
        assert_eq!(record.line_column("item", 2, "quantity"), Some(&FieldValue::Integer(3)));
        assert_eq!(record.line_column("item", 1, "quantity"), None);
    }

    #[test]
    fn line_operations_validate_indexes() {
        let mut record = DraftRecord::new("itemfulfillment");
        assert!(matches!(
            record.select_line("package", 1),
            Err(StoreError::InvalidLine { index: 1, .. })
        ));
        assert!(matches!(
            record.commit_line("package"),
            Err(StoreError::NoCurrentLine(_))
        ));
        assert!(record.remove_line("package", 0).is_err());
    }

    #[test]
    fn remove_line_shifts_following_lines() {
        let mut record = DraftRecord::new("itemfulfillment");
        let mut second = Line::new();
        second.insert("packageweight".to_string(), FieldValue::Float(2.5));
        record
            .sublists
            .insert("package".to_string(), Sublist::new(vec![Line::new(), second]));
        record.remove_line("package", 1).unwrap();
        assert_eq!(record.line_count("package"), 1);
        assert_eq!(
            record.line_column("package", 1, "packageweight"),
            Some(&FieldValue::Float(2.5))
        );
    }
}
