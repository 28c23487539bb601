//! Recursive property search over an arbitrary JSON payload

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Key of the container a matched property was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParentTag {
    /// The property sits directly on the payload root
    Root,
    /// Key of the enclosing object
    Key(String),
    /// Position of the enclosing array element
    Index(usize),
}

impl ParentTag {
    /// Whether this tag satisfies the parent named by a mapping path. An
    /// empty expectation accepts any parent.
    pub fn matches(&self, expected: &str) -> bool {
        if expected.is_empty() {
            return true;
        }
        match self {
            ParentTag::Root => false,
            ParentTag::Key(key) => key == expected,
            ParentTag::Index(index) => index.to_string() == expected,
        }
    }

    /// Array position of the parent, also for objects keyed by a number.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            ParentTag::Root => None,
            ParentTag::Key(key) => key.parse::<usize>().ok(),
            ParentTag::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for ParentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentTag::Root => Ok(()),
            ParentTag::Key(key) => write!(f, "{}", key),
            ParentTag::Index(index) => write!(f, "{}", index),
        }
    }
}

/// One match of a property anywhere in the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedOccurrence {
    pub parent_tag: ParentTag,
    pub value: Value,
}

/// Finds every occurrence of `property` in `root`, depth first.
///
/// Object keys are visited in document order and a matching key is reported
/// before its value is descended into; array elements follow in sequence.
/// Callers rely on this order for first-match-wins decisions.
pub fn extract(root: &Value, property: &str) -> Vec<ExtractedOccurrence> {
    let mut found = Vec::new();
    walk(root, &ParentTag::Root, property, &mut found);
    found
}

fn walk(value: &Value, parent: &ParentTag, property: &str, found: &mut Vec<ExtractedOccurrence>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == property {
                    found.push(ExtractedOccurrence {
                        parent_tag: parent.clone(),
                        value: child.clone(),
                    });
                }
                if is_container(child) {
                    walk(child, &ParentTag::Key(key.clone()), property, found);
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                if is_container(child) {
                    walk(child, &ParentTag::Index(index), property, found);
                }
            }
        }
        _ => {}
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
