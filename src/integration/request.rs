//! Incoming payload handling and validation

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MappingError, MappingResult};

/// Message returned when a request carries nothing to map
pub const EMPTY_REQUEST_MESSAGE: &str =
    "No record / transaction was sent to the Integration Project endpoint";

/// Request to map a payload onto a record
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationRequest {
    /// External document to map
    pub data: Value,
    /// Mapping project to use instead of the configured one
    #[serde(default)]
    pub project_id: Option<String>,
    /// External document number, reported with errors
    #[serde(default)]
    pub document_id: Option<String>,
}

impl IntegrationRequest {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            project_id: None,
            document_id: None,
        }
    }

    pub fn for_project(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }

    /// Validate JSON input
    pub fn validate_input(&self) -> MappingResult<()> {
        let is_empty = match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(MappingError::invalid_input(EMPTY_REQUEST_MESSAGE));
        }

        if !self.data.is_object() && !self.data.is_array() {
            return Err(MappingError::invalid_input(
                "Input data must be a JSON object or array",
            ));
        }

        Ok(())
    }
}
