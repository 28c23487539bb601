//! Lines on a record derived from a source transaction.
//!
//! Item lines already exist on the derived record and are matched to the
//! payload through the source transaction's line ordinals. Package lines are
//! always created fresh.

use log::debug;

use super::grouper::{FieldInstance, GroupedBucket};
use super::record_builder::line_members;
use super::transformer::{self, RequestContext};
use crate::error::MappingResult;
use crate::integration::tables::{
    ITEM_COLUMN, ITEM_SUBLIST, LINE_FIELD, PACKAGE_SUBLIST, PACKAGE_TRACKING_COLUMN,
    PACKAGE_WEIGHT_COLUMN,
};
use crate::schema::FieldType;
use crate::store::{DraftRecord, FieldValue, RecordStore};

/// Receives line buckets on a derived record. The store is passed per call
/// so header buckets can mutate it between line buckets.
pub struct LineMatcher<'a> {
    ctx: &'a RequestContext,
    /// Internal type code of the source transaction (`SalesOrd`, `PurchOrd`)
    source_code: &'a str,
    packages_added: bool,
}

impl<'a> LineMatcher<'a> {
    pub fn new(ctx: &'a RequestContext, source_code: &'a str) -> Self {
        Self {
            ctx,
            source_code,
            packages_added: false,
        }
    }

    /// Applies one line bucket to `sublist`. Sublists other than `item` and
    /// `package` are left alone.
    pub fn receive(
        &mut self,
        store: &dyn RecordStore,
        record: &mut DraftRecord,
        sublist: &str,
        bucket: &GroupedBucket,
        sublist_defaults: &[FieldInstance],
    ) -> MappingResult<()> {
        match sublist {
            ITEM_SUBLIST => self.receive_item(store, record, bucket, sublist_defaults),
            PACKAGE_SUBLIST => self.add_package(record, bucket),
            other => {
                debug!("No line matching for sublist '{}', skipping bucket {}", other, bucket.line);
                Ok(())
            }
        }
    }

    fn receive_item(
        &self,
        store: &dyn RecordStore,
        record: &mut DraftRecord,
        bucket: &GroupedBucket,
        sublist_defaults: &[FieldInstance],
    ) -> MappingResult<()> {
        let governing = match bucket.governing_lookup() {
            Some(instance) => instance,
            None => return Ok(()),
        };

        let reference = match governing.value_text() {
            text if text.is_empty() => "0".to_string(),
            text => text,
        };
        let ordinal = match store.find_transaction_line(
            self.source_code,
            governing.target(),
            &reference,
        )? {
            Some(ordinal) => ordinal,
            None => {
                debug!(
                    "No {} line with {} = '{}', bucket {} not received",
                    self.source_code,
                    governing.target(),
                    reference,
                    bucket.line
                );
                return Ok(());
            }
        };

        let index = (1..=record.line_count(ITEM_SUBLIST)).find(|&index| {
            record
                .line_column(ITEM_SUBLIST, index, LINE_FIELD)
                .and_then(FieldValue::as_i64)
                == Some(ordinal)
        });
        let index = match index {
            Some(index) => index,
            None => {
                debug!("Line {} is not on the derived record", ordinal);
                return Ok(());
            }
        };

        record.select_line(ITEM_SUBLIST, index)?;
        for member in line_members(bucket, sublist_defaults, governing.join()) {
            let skipped = member.lookup().is_some() || member.target() == ITEM_COLUMN;
            if skipped && member.field.default_text().is_none() {
                continue;
            }
            let value = member.column_value(self.ctx)?;
            record.set_current_line_value(ITEM_SUBLIST, member.target(), value)?;
        }
        record.commit_line(ITEM_SUBLIST)?;

        debug!("Received line {} (ordinal {})", index, ordinal);
        Ok(())
    }

    fn add_package(&mut self, record: &mut DraftRecord, bucket: &GroupedBucket) -> MappingResult<()> {
        let weight = match bucket
            .instances
            .iter()
            .find(|i| i.target() == PACKAGE_WEIGHT_COLUMN)
        {
            Some(instance) => instance,
            None => return Ok(()),
        };

        record.open_line(PACKAGE_SUBLIST);
        // Weight is written as sent
        let raw = transformer::transform(&weight.effective_value(), FieldType::String, self.ctx)?;
        record.set_current_line_value(PACKAGE_SUBLIST, PACKAGE_WEIGHT_COLUMN, raw)?;
        for member in bucket.instances.iter().filter(|i| i.target() != PACKAGE_WEIGHT_COLUMN) {
            let value = member.column_value(self.ctx)?;
            record.set_current_line_value(PACKAGE_SUBLIST, member.target(), value)?;
        }
        record.commit_line(PACKAGE_SUBLIST)?;
        self.packages_added = true;
        Ok(())
    }

    /// Drops the first package line when it carries no tracking number.
    /// Runs once, after every bucket has been received.
    pub fn finish(&mut self, record: &mut DraftRecord) -> MappingResult<()> {
        if !self.packages_added {
            return Ok(());
        }
        let tracked = record
            .line_column(PACKAGE_SUBLIST, 1, PACKAGE_TRACKING_COLUMN)
            .map_or(false, |v| !v.is_empty());
        if !tracked && record.line_count(PACKAGE_SUBLIST) > 0 {
            debug!("Removing untracked first package line");
            record.remove_line(PACKAGE_SUBLIST, 1)?;
        }
        Ok(())
    }
}
