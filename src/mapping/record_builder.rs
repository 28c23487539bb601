//! Applies grouped buckets to a record: header fields, join references,
//! address blocks and freshly created sublist lines.

use log::{debug, info, warn};

use super::grouper::{FieldInstance, GroupedBucket};
use super::transformer::{self, RequestContext};
use crate::error::{MappingError, MappingResult};
use crate::integration::tables;
use crate::schema::FieldType;
use crate::store::{DraftRecord, FieldValue, RecordId, RecordStore};

const CUSTOMER: &str = "customer";
const IS_PERSON: &str = "isperson";

/// Writes buckets onto a record through a [`RecordStore`].
///
/// Join records are created and submitted as soon as a reference cannot be
/// resolved. They stay in the store when a later step of the same request
/// fails.
pub struct RecordBuilder<'a> {
    store: &'a mut dyn RecordStore,
    ctx: &'a RequestContext,
    reserved: Vec<String>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(store: &'a mut dyn RecordStore, ctx: &'a RequestContext) -> Self {
        Self {
            store,
            ctx,
            reserved: Vec::new(),
        }
    }

    /// Header fields the builder must leave untouched.
    pub fn reserving(mut self, field_id: &str) -> Self {
        self.reserved.push(field_id.to_string());
        self
    }

    /// Creates a `record_type` record, applies every bucket in order and
    /// submits it.
    pub fn build(
        &mut self,
        buckets: &[GroupedBucket],
        record_type: &str,
        sublist_defaults: &[FieldInstance],
    ) -> MappingResult<RecordId> {
        let mut record = self.store.create_record(record_type)?;
        for bucket in buckets {
            self.apply_bucket(&mut record, bucket, sublist_defaults)?;
        }
        Ok(self.store.submit(record)?)
    }

    /// Dispatches one bucket by its line number.
    pub fn apply_bucket(
        &mut self,
        record: &mut DraftRecord,
        bucket: &GroupedBucket,
        sublist_defaults: &[FieldInstance],
    ) -> MappingResult<()> {
        if bucket.is_header() {
            self.apply_header(record, bucket)
        } else if bucket.is_line() {
            self.add_line(record, &bucket.join, bucket, sublist_defaults)
        } else {
            self.apply_address(record, bucket)
        }
    }

    /// Header bucket: references are resolved (or created) and plain fields
    /// written. Instances that only feed a join record are skipped.
    pub fn apply_header(&mut self, record: &mut DraftRecord, bucket: &GroupedBucket) -> MappingResult<()> {
        for instance in &bucket.instances {
            if instance.is_sublist() || self.reserved.iter().any(|r| r == instance.target()) {
                continue;
            }

            match (instance.lookup(), instance.join()) {
                (Some(_), "") => {
                    warn!(
                        "Field '{}' has a lookup but no join record type, skipping",
                        instance.target()
                    );
                }
                (Some(_), _) => {
                    let id = self.resolve_reference(bucket, instance)?;
                    record.set_field(instance.target(), FieldValue::from(&id));
                }
                (None, "") => {
                    let value = instance.transformed(self.ctx)?;
                    set_header_value(record, instance.target(), value);
                }
                (None, _) => {}
            }
        }
        Ok(())
    }

    /// Address bucket: every populated instance is written to the record.
    pub fn apply_address(&self, record: &mut DraftRecord, bucket: &GroupedBucket) -> MappingResult<()> {
        for instance in &bucket.instances {
            if instance.target().is_empty() || transformer::is_blank(&instance.effective_value()) {
                continue;
            }
            let value = instance.transformed(self.ctx).map_err(|e| {
                MappingError::address(format!(
                    "The integration was not able to set the address field '{}': {}",
                    instance.target(),
                    e
                ))
            })?;
            record.set_field(instance.target(), value);
        }
        Ok(())
    }

    /// Creates one new line on `sublist` from a line bucket.
    ///
    /// The governing lookup instance must resolve to an existing record;
    /// otherwise the whole request fails.
    pub fn add_line(
        &mut self,
        record: &mut DraftRecord,
        sublist: &str,
        bucket: &GroupedBucket,
        sublist_defaults: &[FieldInstance],
    ) -> MappingResult<()> {
        let governing = match bucket.governing_lookup() {
            Some(instance) => instance,
            None => {
                debug!("Line bucket {} on '{}' has no lookup field, skipping", bucket.line, sublist);
                return Ok(());
            }
        };

        let column = tables::lookup_column_for(governing.target()).ok_or_else(|| {
            MappingError::line("Mapping was not setup properly, line could not be submitted.")
        })?;
        let key = governing.value_text();
        let id = self.store.search(sublist, column, &key)?.ok_or_else(|| {
            MappingError::line(format!(
                "Item record {} was not found in the system, line could not be submitted.",
                key
            ))
        })?;

        record.open_line(sublist);
        record.set_current_line_value(sublist, governing.target(), FieldValue::from(&id))?;
        for member in line_members(bucket, sublist_defaults, governing.join()) {
            if member.lookup().is_some() {
                continue;
            }
            let value = member.column_value(self.ctx)?;
            record.set_current_line_value(sublist, member.target(), value)?;
        }
        record.commit_line(sublist)?;

        debug!("Added line {} to '{}' for {} {}", bucket.line, sublist, column, key);
        Ok(())
    }

    fn resolve_reference(&mut self, bucket: &GroupedBucket, instance: &FieldInstance) -> MappingResult<RecordId> {
        let join = instance.join();
        let lookup = instance.lookup().unwrap_or_default();

        let (key_field, key_value) = match bucket
            .instances
            .iter()
            .find(|sibling| !std::ptr::eq(*sibling, instance) && sibling.field.leaf_name() == lookup)
        {
            Some(sibling) => (sibling.target().to_string(), sibling.value_text()),
            None => (lookup.to_string(), instance.value_text()),
        };

        if !key_value.is_empty() {
            if let Some(id) = self.store.search(join, &key_field, &key_value)? {
                debug!("Resolved {} {} = '{}' to {}", join, key_field, key_value, id);
                return Ok(id);
            }
        }

        info!(
            "No {} record with {} = '{}', creating one",
            join, key_field, key_value
        );
        self.create_join_record(join, bucket)
    }

    fn create_join_record(&mut self, join: &str, bucket: &GroupedBucket) -> MappingResult<RecordId> {
        let mut members: Vec<&FieldInstance> =
            bucket.instances.iter().filter(|i| i.join() == join).collect();
        if join == CUSTOMER {
            members = customer_members(members);
        }

        self.submit_join_record(join, &members).map_err(|e| {
            warn!("Join record could not be submitted: {}", e);
            MappingError::resolution(format!(
                "The integration was not able to create new {} record.",
                join
            ))
        })
    }

    fn submit_join_record(&mut self, join: &str, members: &[&FieldInstance]) -> MappingResult<RecordId> {
        let mut record = self.store.create_record(join)?;
        for member in members {
            let value = member.transformed(self.ctx)?;
            set_header_value(&mut record, member.target(), value);
        }
        Ok(self.store.submit(record)?)
    }
}

fn set_header_value(record: &mut DraftRecord, field_id: &str, value: FieldValue) {
    if tables::is_display_text_field(field_id) {
        record.set_field_text(field_id, &value.to_string());
    } else {
        record.set_field(field_id, value);
    }
}

/// Bucket instances followed by the sublist defaults of the same join.
pub(crate) fn line_members<'b>(
    bucket: &'b GroupedBucket,
    sublist_defaults: &'b [FieldInstance],
    join: &'b str,
) -> impl Iterator<Item = &'b FieldInstance> {
    bucket
        .instances
        .iter()
        .chain(sublist_defaults.iter().filter(move |d| d.join() == join))
}

/// A person drops the company name, a company drops the personal names.
/// `isperson` moves to the front so the record type is set first.
fn customer_members(members: Vec<&FieldInstance>) -> Vec<&FieldInstance> {
    let is_person = match members.iter().find(|m| m.target() == IS_PERSON) {
        Some(flag) => *flag,
        None => return members,
    };
    let person = transformer::transform(&is_person.effective_value(), FieldType::Boolean, &RequestContext::default())
        .map(|v| v == FieldValue::text("T"))
        .unwrap_or(false);
    let dropped: &[&str] = if person {
        &["companyname", IS_PERSON]
    } else {
        &["firstname", "lastname", IS_PERSON]
    };

    std::iter::once(is_person)
        .chain(members.into_iter().filter(|m| !dropped.contains(&m.target())))
        .collect()
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mapping::grouper::{collect_instances, group, group_instances, sublist_defaults};
    use crate::schema::MappingField;
    use crate::store::InMemoryRecordStore;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new("MM/DD/YYYY")
    }

    #[test]
    fn plain_header_fields_are_transformed() {
        let schema = vec![
            MappingField::new("memo", "note"),
            MappingField::new("trandate", "created").with_type(FieldType::Date),
            MappingField::new("orderstatus", "state").with_default("Pending Fulfillment"),
        ];
        let buckets = group(&schema, &json!({"note": "rush", "created": "1700000000"}));
        let mut store = InMemoryRecordStore::new();
        let ctx = ctx();
        let id = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap();

        let order = store.record(&id).unwrap();
        assert_eq!(order.field("memo"), Some(&FieldValue::text("rush")));
        assert_eq!(order.field("trandate"), Some(&FieldValue::text("11/14/2023")));
        assert_eq!(order.field_text("orderstatus"), Some("Pending Fulfillment"));
    }

    #[test]
    fn existing_join_records_are_referenced() {
        let mut store = InMemoryRecordStore::new();
        let mut customer = DraftRecord::new("customer");
        customer.set_field("entityid", FieldValue::text("C-42"));
        let customer_id = store.insert(customer);

        let schema = vec![MappingField::new("entity", "customer.id")
            .with_lookup("entityid")
            .with_join("customer")];
        let buckets = group(&schema, &json!({"customer": {"id": "C-42"}}));
        let ctx = ctx();
        let id = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap();

        assert_eq!(store.record(&id).unwrap().field("entity"), Some(&FieldValue::from(&customer_id)));
        assert_eq!(store.records_of_type("customer").len(), 1);
    }

    #[test]
    fn customer_person_flag_drops_company_name() {
        let schema = vec![
            MappingField::new("entity", "customer.email")
                .with_lookup("email")
                .with_join("customer"),
            MappingField::new("email", "customer.email").with_join("customer"),
            MappingField::new("companyname", "customer.company").with_join("customer"),
            MappingField::new("firstname", "customer.first").with_join("customer"),
            MappingField::new("isperson", "customer.person")
                .with_type(FieldType::Boolean)
                .with_join("customer"),
        ];
        let payload = json!({"customer": {
            "email": "ann@example.com", "company": "Acme", "first": "Ann", "person": true
        }});
        let buckets = group(&schema, &payload);
        let mut store = InMemoryRecordStore::new();
        let ctx = ctx();
        RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap();

        let customers = store.records_of_type("customer");
        assert_eq!(customers.len(), 1);
        let customer = &customers[0].record;
        assert_eq!(customer.field("isperson"), Some(&FieldValue::text("T")));
        assert_eq!(customer.field("firstname"), Some(&FieldValue::text("Ann")));
        assert_eq!(customer.field("companyname"), None);
    }

    #[test]
    fn join_creation_failure_is_fatal() {
        let mut store = InMemoryRecordStore::new().with_required_fields("customer", &["companyname"]);
        let schema = vec![MappingField::new("entity", "customer.id")
            .with_lookup("entityid")
            .with_join("customer")];
        let buckets = group(&schema, &json!({"customer": {"id": "C-7"}}));
        let ctx = ctx();
        let err = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap_err();

        assert_eq!(err.user_message(), "The integration was not able to create new customer record.");
        assert!(store.records_of_type("salesorder").is_empty());
    }

    #[test]
    fn lines_resolve_items_and_append_defaults() {
        let mut store = InMemoryRecordStore::new();
        let mut item = DraftRecord::new("item");
        item.set_field("itemid", FieldValue::text("A-1"));
        let item_id = store.insert(item);

        let schema = vec![
            MappingField::new("item", "items.sku").sublist().with_lookup("itemid").with_join("item"),
            MappingField::new("quantity", "items.qty")
                .sublist()
                .with_type(FieldType::Integer)
                .with_join("item"),
            MappingField::new("location", "items.location")
                .sublist()
                .with_default("3")
                .with_join("item"),
        ];
        let payload = json!({"items": [{"sku": "A-1", "qty": "2"}]});
        let instances = collect_instances(&schema, &payload);
        let defaults = sublist_defaults(&instances);
        let buckets = group_instances(instances);

        let ctx = ctx();
        let id = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &defaults)
            .unwrap();

        let order = store.record(&id).unwrap();
        assert_eq!(order.line_count("item"), 1);
        assert_eq!(order.line_column("item", 1, "item"), Some(&FieldValue::from(&item_id)));
        assert_eq!(order.line_column("item", 1, "quantity"), Some(&FieldValue::Integer(2)));
        assert_eq!(order.line_column("item", 1, "location"), Some(&FieldValue::text("3")));
    }

    #[test]
    fn unknown_items_fail_the_line() {
        let schema = vec![MappingField::new("item", "items.sku")
            .sublist()
            .with_lookup("itemid")
            .with_join("item")];
        let buckets = group(&schema, &json!({"items": [{"sku": "ZZZ"}]}));
        let mut store = InMemoryRecordStore::new();
        let ctx = ctx();
        let err = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Item record ZZZ was not found in the system, line could not be submitted."
        );
    }

    #[test]
    fn lookups_without_column_mapping_are_rejected() {
        let schema = vec![MappingField::new("custcol_ref", "items.ref")
            .sublist()
            .with_lookup("name")
            .with_join("item")];
        let buckets = group(&schema, &json!({"items": [{"ref": "R"}]}));
        let mut store = InMemoryRecordStore::new();
        let ctx = ctx();
        let err = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Mapping was not setup properly, line could not be submitted."
        );
    }

    #[test]
    fn address_fields_skip_blank_values() {
        let schema = vec![
            MappingField::new("shipcity", "shipping.city").address(crate::schema::AddressType::Shipping),
            MappingField::new("shipzip", "shipping.zip").address(crate::schema::AddressType::Shipping),
        ];
        let buckets = group(&schema, &json!({"shipping": {"city": "Austin", "zip": ""}}));
        let mut store = InMemoryRecordStore::new();
        let ctx = ctx();
        let id = RecordBuilder::new(&mut store, &ctx)
            .build(&buckets, "salesorder", &[])
            .unwrap();
        let order = store.record(&id).unwrap();
        assert_eq!(order.field("shipcity"), Some(&FieldValue::text("Austin")));
        assert_eq!(order.field("shipzip"), None);
    }
}
