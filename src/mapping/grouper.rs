//! Merges mapping fields with extracted payload values and clusters the
//! resulting field instances into header, line and address buckets.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use super::extractor::{extract, ExtractedOccurrence, ParentTag};
use super::transformer::{self, parse_integer, RequestContext};
use crate::error::TransformError;
use crate::schema::MappingField;
use crate::store::FieldValue;

/// Target field mapped to an explicit line number
pub const LINE_TARGET: &str = "line";

/// One mapping field bound to one value found in the payload.
///
/// `line` is `0` for header data, the 1-based line group for sublist data and
/// the negated address code for address data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInstance {
    pub field: MappingField,
    /// Value as found in the payload, `""` when absent. The field default is
    /// not applied here; see [`FieldInstance::effective_value`].
    pub extracted_value: Value,
    pub line: i64,
    pub parent_tag: ParentTag,
}

impl FieldInstance {
    fn new(field: &MappingField, extracted_value: Value, line: i64, parent_tag: ParentTag) -> Self {
        Self {
            field: field.clone(),
            extracted_value,
            line,
            parent_tag,
        }
    }

    pub fn target(&self) -> &str {
        &self.field.target_field_id
    }

    pub fn join(&self) -> &str {
        self.field.join()
    }

    pub fn lookup(&self) -> Option<&str> {
        self.field.lookup()
    }

    pub fn is_sublist(&self) -> bool {
        self.field.is_sublist_field
    }

    /// The configured default if there is one, else the extracted value.
    pub fn effective_value(&self) -> Value {
        match self.field.default_text() {
            Some(default) => Value::String(default.to_string()),
            None => self.extracted_value.clone(),
        }
    }

    /// Effective value converted to the field's declared type.
    pub fn transformed(&self, ctx: &RequestContext) -> Result<FieldValue, TransformError> {
        transformer::transform(&self.effective_value(), self.field.field_type, ctx)
    }

    /// Value written to a line column: a default is written as configured,
    /// anything else is converted to the declared type.
    pub fn column_value(&self, ctx: &RequestContext) -> Result<FieldValue, TransformError> {
        match self.field.default_text() {
            Some(default) => Ok(FieldValue::text(default)),
            None => transformer::transform(&self.extracted_value, self.field.field_type, ctx),
        }
    }

    /// Effective value as text, for searches.
    pub fn value_text(&self) -> String {
        transformer::value_text(&self.effective_value())
    }
}

/// Field instances sharing one `(line, join)` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBucket {
    pub line: i64,
    pub join: String,
    pub instances: Vec<FieldInstance>,
}

impl GroupedBucket {
    pub fn is_header(&self) -> bool {
        self.line == 0
    }

    pub fn is_line(&self) -> bool {
        self.line > 0
    }

    pub fn is_address(&self) -> bool {
        self.line < 0
    }

    /// First instance carrying a lookup; it decides whether the bucket applies.
    pub fn governing_lookup(&self) -> Option<&FieldInstance> {
        self.instances.iter().find(|i| i.lookup().is_some())
    }
}

/// Extracts and groups in one step.
pub fn group(fields: &[MappingField], payload: &Value) -> Vec<GroupedBucket> {
    group_instances(collect_instances(fields, payload))
}

/// Builds the field instances for every mapping field, in schema order.
pub fn collect_instances(fields: &[MappingField], payload: &Value) -> Vec<FieldInstance> {
    let mut instances = Vec::new();
    for field in fields {
        let occurrences = extract(payload, field.leaf_name());
        if field.is_sublist_field && !occurrences.is_empty() {
            instances.extend(sublist_instances(field, &occurrences));
        } else {
            instances.push(header_instance(field, &occurrences));
        }
    }
    instances
}

fn sublist_instances(field: &MappingField, occurrences: &[ExtractedOccurrence]) -> Vec<FieldInstance> {
    let expected_parent = field.parent_tag();
    let mut explicit_line: Option<i64> = None;
    let mut instances = Vec::new();

    for occurrence in occurrences {
        let parent_index = occurrence.parent_tag.as_index();
        if !occurrence.parent_tag.matches(expected_parent) && parent_index.is_none() {
            continue;
        }

        let mut instance = FieldInstance::new(
            field,
            occurrence.value.clone(),
            0,
            occurrence.parent_tag.clone(),
        );

        if field.target_field_id == LINE_TARGET {
            // The line number itself stays on the header bucket
            explicit_line = parse_integer(&instance.effective_value())
                .ok()
                .filter(|line| *line != 0);
        } else {
            instance.line = match (explicit_line, parent_index) {
                (Some(line), _) => line,
                (None, Some(index)) => index as i64 + 1,
                (None, None) => 1,
            };
        }
        instances.push(instance);
    }
    instances
}

fn header_instance(field: &MappingField, occurrences: &[ExtractedOccurrence]) -> FieldInstance {
    let chosen = match occurrences {
        [] => None,
        [only] => Some(only),
        several => several
            .iter()
            .find(|o| o.parent_tag.matches(field.parent_tag())),
    };

    let (value, parent_tag) = match chosen {
        Some(occurrence) => (occurrence.value.clone(), occurrence.parent_tag.clone()),
        None => (Value::String(String::new()), ParentTag::Root),
    };

    let line = match (field.is_address_field, field.address_type) {
        (true, Some(address_type)) => address_type.line(),
        _ => 0,
    };

    FieldInstance::new(field, value, line, parent_tag)
}

/// Clusters instances by `(line, join)`, buckets ordered by first appearance.
pub fn group_instances(instances: Vec<FieldInstance>) -> Vec<GroupedBucket> {
    let mut positions: HashMap<(i64, String), usize> = HashMap::new();
    let mut buckets: Vec<GroupedBucket> = Vec::new();

    for instance in instances {
        let key = (instance.line, instance.join().to_string());
        match positions.get(&key) {
            Some(&position) => buckets[position].instances.push(instance),
            None => {
                positions.insert(key.clone(), buckets.len());
                buckets.push(GroupedBucket {
                    line: key.0,
                    join: key.1,
                    instances: vec![instance],
                });
            }
        }
    }
    buckets
}

/// Sublist instances that carry a default but matched nothing in the payload.
/// They are appended to every line of the sublist they join.
pub fn sublist_defaults(instances: &[FieldInstance]) -> Vec<FieldInstance> {
    instances
        .iter()
        .filter(|i| i.is_sublist() && i.line == 0 && i.field.default_text().is_some())
        .cloned()
        .collect()
}
