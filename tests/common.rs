//! Shared fixtures for the integration flow tests

#![allow(dead_code)]

use integration_mapper::config::EngineConfig;
use integration_mapper::schema::{InMemorySchemaStore, IntegrationProject, MappingField};
use integration_mapper::store::{DraftRecord, FieldValue, InMemoryRecordStore, Line, Sublist};

pub const PROJECT_ID: &str = "7";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> EngineConfig {
    EngineConfig::new(PROJECT_ID)
}

pub fn project(record_type: &str, transaction_type: Option<&str>) -> IntegrationProject {
    IntegrationProject {
        id: PROJECT_ID.to_string(),
        record_type: record_type.to_string(),
        transaction_type: transaction_type.map(str::to_string),
    }
}

pub fn schemas(project: IntegrationProject, fields: Vec<MappingField>) -> InMemorySchemaStore {
    InMemorySchemaStore::new().with_project(project, fields)
}

pub fn line(columns: &[(&str, FieldValue)]) -> Line {
    columns
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

pub fn item(item_id: &str) -> DraftRecord {
    let mut record = DraftRecord::new("item");
    record.set_field("itemid", FieldValue::text(item_id));
    record
}

/// Store holding items `A-1` and `B-2`.
pub fn store_with_items() -> InMemoryRecordStore {
    let mut store = InMemoryRecordStore::new();
    store.insert_with_id("11".into(), item("A-1"));
    store.insert_with_id("12".into(), item("B-2"));
    store
}

/// Sales order `SO1007` (internal id 500) with two item lines.
pub fn sales_order(status: &str) -> DraftRecord {
    let mut order = DraftRecord::new("salesorder");
    order.set_field("numbertext", FieldValue::text("SO1007"));
    order.set_field("entity", FieldValue::text("77"));
    order.set_field("status", FieldValue::text(status));
    order.sublists.insert(
        "item".to_string(),
        Sublist::new(vec![
            line(&[
                ("item", FieldValue::text("11")),
                ("custcol_sku", FieldValue::text("A-1")),
                ("line", FieldValue::Integer(1)),
            ]),
            line(&[
                ("item", FieldValue::text("12")),
                ("custcol_sku", FieldValue::text("B-2")),
                ("line", FieldValue::Integer(2)),
            ]),
        ]),
    );
    order
}

pub fn store_with_order(status: &str) -> InMemoryRecordStore {
    let mut store = store_with_items();
    store.insert_with_id("500".into(), sales_order(status));
    store
}
