//! # Integration Mapper Library
//!
//! Maps external JSON documents onto business records of a record-oriented
//! backend, driven by a declarative mapping schema stored per integration
//! project.
//!
//! ## Core Components
//!
//! * `schema` - mapping fields, field types and the schema loading boundary
//! * `mapping` - extraction, typing, grouping and record mutation
//! * `store` - the record store boundary, draft records and error sinks
//! * `integration` - request validation and the create and transform flows
//! * `config` - engine configuration
//! * `error` - error types and handling
//!
//! ## Architecture
//!
//! A request names a mapping project. The project resolves to a target
//! record type, and the payload is turned into grouped field instances:
//! header fields, sublist lines and address blocks. New records are built
//! from scratch; item fulfillments and receipts are derived from their
//! source order and only the lines the payload names are received. Every
//! flow submits the record once and answers with the new id or an error
//! payload.

pub mod config;
pub mod error;
pub mod integration;
pub mod mapping;
pub mod schema;
pub mod store;

// Re-export main types for convenience
pub use config::{load_engine_config, EngineConfig};
pub use error::{MappingError, MappingResult, StoreError, StoreResult, TransformError};
pub use integration::{FlowStage, IntegrationRequest, IntegrationResponse, IntegrationService};
pub use mapping::{extract, group, transform, GroupedBucket, ParentTag, RequestContext};
pub use schema::{
    load_project_from_file, AddressType, FieldType, IntegrationProject, MappingField,
    SchemaStore,
};
pub use store::{DraftRecord, ErrorSink, FieldValue, RecordId, RecordStore};

#[cfg(feature = "mock")]
pub use store::InMemoryRecordStore;
