//! # Mapping Schema
//!
//! Declarative field mappings that drive the engine: which external property
//! feeds which target field, how the raw value is typed, and whether the
//! field belongs to the header, a sublist line, an address block or a join
//! record.

pub mod field_type;
pub mod loader;
pub mod mapping_field;

pub use field_type::{AddressType, FieldType};
pub use loader::{
    load_project_from_file, InMemorySchemaStore, IntegrationProject, JsonFileSchemaStore,
    ProjectDefinition, SchemaStore,
};
pub use mapping_field::{prepare_schema, MappingField};
