//! In-memory reference implementation of [`RecordStore`]

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::record::{DraftRecord, FieldValue, Line, RecordId, Sublist};
use super::RecordStore;
use crate::error::{MappingResult, StoreError, StoreResult};
use crate::integration::tables;

const FIRST_ID: u64 = 100;

/// A record held by the store together with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: DraftRecord,
}

/// Seed data for [`InMemoryRecordStore`], usually read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub records: Vec<StoredRecord>,
    #[serde(default)]
    pub date_format: Option<String>,
    /// Fields a record type must carry to be accepted on submit
    #[serde(default)]
    pub required_fields: HashMap<String, Vec<String>>,
    /// Transformed fulfillments start with one empty package line
    #[serde(default)]
    pub precreate_package_line: bool,
}

/// Record store kept entirely in memory.
///
/// Searches compare the text form of field values. The `transaction` record
/// type searches every record whose type has an internal transaction code.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    next_id: u64,
    records: Vec<StoredRecord>,
    required_fields: HashMap<String, Vec<String>>,
    date_format: Option<String>,
    precreate_package_line: bool,
    submitted: Vec<RecordId>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self {
            next_id: FIRST_ID,
            records: Vec::new(),
            required_fields: HashMap::new(),
            date_format: None,
            precreate_package_line: false,
            submitted: Vec::new(),
        }
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        let mut store = Self {
            required_fields: fixture.required_fields,
            date_format: fixture.date_format,
            precreate_package_line: fixture.precreate_package_line,
            ..Self::default()
        };
        for stored in fixture.records {
            store.insert_with_id(stored.id, stored.record);
        }
        store
    }

    /// Loads a store fixture from a JSON file.
    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> MappingResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let fixture: StoreFixture = serde_json::from_str(&content)?;
        info!(
            "Loaded {} fixture records from {}",
            fixture.records.len(),
            path.as_ref().display()
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_date_format(mut self, pattern: &str) -> Self {
        self.date_format = Some(pattern.to_string());
        self
    }

    pub fn with_required_fields(mut self, record_type: &str, fields: &[&str]) -> Self {
        self.required_fields.insert(
            record_type.to_string(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_package_line(mut self) -> Self {
        self.precreate_package_line = true;
        self
    }

    /// Stores `record` under the next free id.
    pub fn insert(&mut self, record: DraftRecord) -> RecordId {
        let id = RecordId::from(self.next_id);
        self.insert_with_id(id.clone(), record);
        id
    }

    pub fn insert_with_id(&mut self, id: RecordId, record: DraftRecord) {
        if let Ok(numeric) = id.as_str().parse::<u64>() {
            self.next_id = self.next_id.max(numeric + 1);
        }
        self.records.push(StoredRecord { id, record });
    }

    pub fn record(&self, id: &RecordId) -> Option<&DraftRecord> {
        self.records
            .iter()
            .find(|stored| &stored.id == id)
            .map(|stored| &stored.record)
    }

    pub fn records_of_type(&self, record_type: &str) -> Vec<&StoredRecord> {
        self.records
            .iter()
            .filter(|stored| stored.record.record_type == record_type)
            .collect()
    }

    /// Ids of records accepted through [`RecordStore::submit`], oldest first.
    pub fn submitted(&self) -> &[RecordId] {
        &self.submitted
    }

    fn find(&self, record_type: &str, id: &RecordId) -> Option<&DraftRecord> {
        self.records
            .iter()
            .find(|stored| &stored.id == id && stored.record.record_type == record_type)
            .map(|stored| &stored.record)
    }

    fn type_matches(search_type: &str, record_type: &str) -> bool {
        search_type == record_type
            || (search_type == tables::TRANSACTION
                && tables::code_for_record_type(record_type).is_some())
    }

    fn missing_required(&self, record: &DraftRecord) -> Vec<String> {
        self.required_fields
            .get(&record.record_type)
            .map(|fields| {
                fields
                    .iter()
                    .filter(|field| {
                        let has_value = record.field(field).map_or(false, |v| !v.is_empty());
                        let has_text = record.field_text(field).map_or(false, |t| !t.is_empty());
                        !has_value && !has_text
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn field_equals(record: &DraftRecord, field: &str, value: &str) -> bool {
    record.field(field).map_or(false, |v| v.to_string() == value)
        || record.field_text(field) == Some(value)
}

impl RecordStore for InMemoryRecordStore {
    fn create_record(&mut self, record_type: &str) -> StoreResult<DraftRecord> {
        if record_type.trim().is_empty() {
            return Err(StoreError::rejected("Record type must not be empty"));
        }
        Ok(DraftRecord::new(record_type))
    }

    fn transform_record(
        &mut self,
        source_type: &str,
        source_id: &RecordId,
        target_type: &str,
    ) -> StoreResult<DraftRecord> {
        let source = self.find(source_type, source_id).ok_or_else(|| {
            StoreError::not_found(format!("{} {}", source_type, source_id))
        })?;

        let mut target = DraftRecord::new(target_type);
        target.set_field(tables::CREATED_FROM_FIELD, FieldValue::from(source_id));
        if let Some(entity) = source.field("entity") {
            target.set_field("entity", entity.clone());
        }

        let lines: Vec<Line> = source
            .lines(tables::ITEM_SUBLIST)
            .iter()
            .enumerate()
            .map(|(index, source_line)| {
                let mut line = source_line.clone();
                line.entry(tables::LINE_FIELD.to_string())
                    .or_insert(FieldValue::Integer(index as i64 + 1));
                line.insert(tables::RECEIVE_COLUMN.to_string(), FieldValue::text("T"));
                line
            })
            .collect();
        target
            .sublists
            .insert(tables::ITEM_SUBLIST.to_string(), Sublist::new(lines));

        if self.precreate_package_line && target_type == tables::ITEM_FULFILLMENT {
            target.sublists.insert(
                tables::PACKAGE_SUBLIST.to_string(),
                Sublist::new(vec![Line::new()]),
            );
        }

        debug!(
            "Transformed {} {} into {} with {} item lines",
            source_type,
            source_id,
            target_type,
            target.line_count(tables::ITEM_SUBLIST)
        );
        Ok(target)
    }

    fn submit(&mut self, record: DraftRecord) -> StoreResult<RecordId> {
        let missing = self.missing_required(&record);
        if !missing.is_empty() {
            return Err(StoreError::rejected(format!(
                "Please enter value(s) for: {}",
                missing.join(", ")
            )));
        }
        let record_type = record.record_type.clone();
        let id = self.insert(record);
        self.submitted.push(id.clone());
        info!("Submitted {} record {}", record_type, id);
        Ok(id)
    }

    fn search(
        &self,
        record_type: &str,
        key_field: &str,
        value: &str,
    ) -> StoreResult<Option<RecordId>> {
        Ok(self
            .records
            .iter()
            .find(|stored| {
                Self::type_matches(record_type, &stored.record.record_type)
                    && field_equals(&stored.record, key_field, value)
            })
            .map(|stored| stored.id.clone()))
    }

    fn find_transaction_line(
        &self,
        code: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<i64>> {
        let record_type = match tables::record_type_for_code(code) {
            Some(record_type) => record_type,
            None => return Ok(None),
        };

        let ordinal = self
            .records_of_type(record_type)
            .into_iter()
            .flat_map(|stored| stored.record.sublists.values())
            .flat_map(|sublist| sublist.lines.iter())
            .find(|line| line.get(column).map_or(false, |v| v.to_string() == value))
            .and_then(|line| line.get(tables::LINE_FIELD))
            .and_then(FieldValue::as_i64);
        Ok(ordinal)
    }

    fn transaction_exists(&self, id: &RecordId, code: &str) -> StoreResult<bool> {
        Ok(tables::record_type_for_code(code)
            .map_or(false, |record_type| self.find(record_type, id).is_some()))
    }

    fn lookup_field(
        &self,
        record_type: &str,
        id: &RecordId,
        field: &str,
    ) -> StoreResult<Option<String>> {
        let record = self
            .find(record_type, id)
            .ok_or_else(|| StoreError::not_found(format!("{} {}", record_type, id)))?;
        Ok(record
            .field(field)
            .map(|v| v.to_string())
            .or_else(|| record.field_text(field).map(str::to_string)))
    }

    fn company_date_format(&self) -> StoreResult<Option<String>> {
        Ok(self.date_format.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_order() -> DraftRecord {
        let mut order = DraftRecord::new("salesorder");
        order.set_field("tranid", FieldValue::text("SO1007"));
        order.set_field("status", FieldValue::text("pendingFulfillment"));
        let mut line = Line::new();
        line.insert("item".to_string(), FieldValue::text("55"));
        line.insert("custcol_sku".to_string(), FieldValue::text("SKU-1"));
        line.insert("line".to_string(), FieldValue::Integer(3));
        order
            .sublists
            .insert("item".to_string(), Sublist::new(vec![line]));
        order
    }

    #[test]
    fn transaction_search_spans_transaction_types() {
        let mut store = InMemoryRecordStore::new();
        let mut customer = DraftRecord::new("customer");
        customer.set_field("tranid", FieldValue::text("SO1007"));
        store.insert(customer);
        let id = store.insert(sales_order());

        assert_eq!(store.search("transaction", "tranid", "SO1007").unwrap(), Some(id.clone()));
        assert_eq!(store.search("salesorder", "tranid", "SO1008").unwrap(), None);
        assert!(store.transaction_exists(&id, "SalesOrd").unwrap());
        assert!(!store.transaction_exists(&id, "PurchOrd").unwrap());
    }

    #[test]
    fn transform_copies_item_lines() {
        let mut store = InMemoryRecordStore::new().with_package_line();
        let id = store.insert(sales_order());

        let fulfillment = store
            .transform_record("salesorder", &id, "itemfulfillment")
            .unwrap();
        assert_eq!(fulfillment.field("createdfrom"), Some(&FieldValue::from(&id)));
        assert_eq!(fulfillment.line_column("item", 1, "line"), Some(&FieldValue::Integer(3)));
        assert_eq!(
            fulfillment.line_column("item", 1, "itemreceive"),
            Some(&FieldValue::text("T"))
        );
        assert_eq!(fulfillment.line_count("package"), 1);

        assert!(store
            .transform_record("purchaseorder", &id, "itemreceipt")
            .is_err());
    }

    #[test]
    fn finds_source_line_ordinals() {
        let mut store = InMemoryRecordStore::new();
        store.insert(sales_order());
        assert_eq!(
            store.find_transaction_line("SalesOrd", "custcol_sku", "SKU-1").unwrap(),
            Some(3)
        );
        assert_eq!(
            store.find_transaction_line("SalesOrd", "custcol_sku", "SKU-2").unwrap(),
            None
        );
    }

    #[test]
    fn submit_enforces_required_fields() {
        let mut store = InMemoryRecordStore::new().with_required_fields("customer", &["companyname"]);
        let err = store.submit(DraftRecord::new("customer")).unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        let mut customer = DraftRecord::new("customer");
        customer.set_field("companyname", FieldValue::text("Acme"));
        let id = store.submit(customer).unwrap();
        assert_eq!(store.submitted(), &[id]);
    }

    #[test]
    fn fixture_ids_advance_the_counter() {
        let mut store = InMemoryRecordStore::from_fixture(StoreFixture {
            records: vec![StoredRecord {
                id: RecordId::new("500"),
                record: sales_order(),
            }],
            ..Default::default()
        });
        let id = store.insert(DraftRecord::new("customer"));
        assert_eq!(id, RecordId::new("501"));
        assert_eq!(
            store
                .lookup_field("salesorder", &RecordId::new("500"), "status")
                .unwrap()
                .as_deref(),
            Some("pendingFulfillment")
        );
    }
}
