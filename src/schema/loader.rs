use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::mapping_field::MappingField;
use crate::error::{MappingResult, StoreError, StoreResult};

/// Header record of a mapping project: which record the payloads become.
///
/// `record_type` is either a record type id (`"customer"`) or the display
/// text `"Transaction"`, in which case `transaction_type` carries the
/// transaction display name (`"Sales Order"`, `"Item Fulfillment"`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationProject {
    pub id: String,
    pub record_type: String,
    #[serde(default)]
    pub transaction_type: Option<String>,
}

/// A project together with its ordered field mappings, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDefinition {
    pub project: IntegrationProject,
    pub fields: Vec<MappingField>,
}

/// Source of mapping projects and their field schemas.
///
/// Implementations must return fields in a stable order; bucket order is
/// derived from it.
pub trait SchemaStore {
    fn load_project(&self, project_id: &str) -> StoreResult<Option<IntegrationProject>>;

    fn load_mapping_fields(&self, project_id: &str) -> StoreResult<Vec<MappingField>>;
}

/// Loads a project definition from a JSON file.
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read
/// * The file content is not valid JSON
/// * The JSON does not describe a project with its fields
pub fn load_project_from_file<P: AsRef<Path>>(path: P) -> MappingResult<ProjectDefinition> {
    let definition_str = fs::read_to_string(path.as_ref())?;
    let definition: ProjectDefinition = serde_json::from_str(&definition_str)?;
    Ok(definition)
}

/// Schema store backed by a map of project definitions.
#[derive(Debug, Default, Clone)]
pub struct InMemorySchemaStore {
    projects: HashMap<String, ProjectDefinition>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: ProjectDefinition) {
        self.projects
            .insert(definition.project.id.clone(), definition);
    }

    pub fn with_project(mut self, project: IntegrationProject, fields: Vec<MappingField>) -> Self {
        self.insert(ProjectDefinition { project, fields });
        self
    }
}

impl SchemaStore for InMemorySchemaStore {
    fn load_project(&self, project_id: &str) -> StoreResult<Option<IntegrationProject>> {
        Ok(self.projects.get(project_id).map(|d| d.project.clone()))
    }

    fn load_mapping_fields(&self, project_id: &str) -> StoreResult<Vec<MappingField>> {
        Ok(self
            .projects
            .get(project_id)
            .map(|d| d.fields.clone())
            .unwrap_or_default())
    }
}

/// Schema store reading `<project id>.json` definitions from a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSchemaStore {
    directory: PathBuf,
}

impl JsonFileSchemaStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn definition(&self, project_id: &str) -> StoreResult<Option<ProjectDefinition>> {
        let path = self.directory.join(format!("{}.json", project_id));
        if !path.exists() {
            return Ok(None);
        }
        load_project_from_file(&path)
            .map(Some)
            .map_err(|e| StoreError::backend(format!("{}: {}", path.display(), e)))
    }
}

impl SchemaStore for JsonFileSchemaStore {
    fn load_project(&self, project_id: &str) -> StoreResult<Option<IntegrationProject>> {
        Ok(self.definition(project_id)?.map(|d| d.project))
    }

    fn load_mapping_fields(&self, project_id: &str) -> StoreResult<Vec<MappingField>> {
        Ok(self
            .definition(project_id)?
            .map(|d| d.fields)
            .unwrap_or_default())
    }
}
