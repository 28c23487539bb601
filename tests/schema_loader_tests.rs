use integration_mapper::schema::{
    load_project_from_file, prepare_schema, AddressType, FieldType, JsonFileSchemaStore,
    SchemaStore,
};
use integration_mapper::MappingError;
use serde_json::json;
use std::error::Error;
use std::fs;
use tempfile::tempdir;

fn definition() -> serde_json::Value {
    json!({
        "project": {"id": "12", "recordType": "Transaction", "transactionType": "Sales Order"},
        "fields": [
            {"targetFieldId": "tranid", "externalPath": "order_number"},
            {
                "targetFieldId": "item",
                "externalPath": "items.sku",
                "isSublistField": true,
                "lookupField": "itemid",
                "joinRecordType": "Item"
            },
            {
                "targetFieldId": "quantity",
                "externalPath": "items.qty",
                "fieldType": "Integer Number",
                "isSublistField": true,
                "joinRecordType": "item"
            },
            {
                "targetFieldId": "shipcity",
                "externalPath": "shipping.city",
                "isAddressField": true,
                "addressType": "shippingaddress"
            }
        ]
    })
}

#[test]
fn loads_project_definition_from_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("12.json");
    fs::write(&path, serde_json::to_string_pretty(&definition())?)?;

    let loaded = load_project_from_file(&path)?;

    assert_eq!(loaded.project.record_type, "Transaction");
    assert_eq!(loaded.project.transaction_type.as_deref(), Some("Sales Order"));
    assert_eq!(loaded.fields.len(), 4);
    assert_eq!(loaded.fields[2].field_type, FieldType::Integer);
    assert_eq!(loaded.fields[3].address_type, Some(AddressType::Shipping));
    Ok(())
}

#[test]
fn file_store_serves_projects_by_id() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("12.json"),
        serde_json::to_string(&definition())?,
    )?;
    let store = JsonFileSchemaStore::new(dir.path());

    let project = store.load_project("12")?.ok_or("project missing")?;
    assert_eq!(project.id, "12");

    let fields = prepare_schema(store.load_mapping_fields("12")?)?;
    let targets: Vec<&str> = fields.iter().map(|f| f.target_field_id.as_str()).collect();
    assert_eq!(targets, vec!["tranid", "item", "quantity", "shipcity"]);
    assert_eq!(fields[1].join(), "item");

    assert!(store.load_project("99")?.is_none());
    assert!(store.load_mapping_fields("99")?.is_empty());
    Ok(())
}

#[test]
fn unknown_field_type_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("bad.json");
    let mut bad = definition();
    bad["fields"][0]["fieldType"] = json!("Rich Text");
    fs::write(&path, serde_json::to_string(&bad)?)?;

    assert!(load_project_from_file(&path).is_err());
    Ok(())
}

#[test]
fn empty_schema_is_missing() {
    match prepare_schema(Vec::new()) {
        Err(MappingError::Schema(msg)) => {
            assert_eq!(msg, "Schema of the integration project is missing.")
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}
