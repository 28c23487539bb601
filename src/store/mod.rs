//! # Record Store Boundary
//!
//! The engine never talks to a backing system directly. Everything it needs
//! from the record store is expressed by [`RecordStore`]; failures are
//! reported through an [`ErrorSink`].
//!
//! * `record` - draft records, field values and sublist line editing
//! * `error_sink` - fire-and-forget error reporting
//! * `memory` - in-memory reference store used by tests and the CLI

pub mod error_sink;
#[cfg(feature = "mock")]
pub mod memory;
pub mod record;

pub use error_sink::{ErrorLogEntry, ErrorSink, LogErrorSink, MemoryErrorSink};
#[cfg(feature = "mock")]
pub use memory::InMemoryRecordStore;
pub use record::{DraftRecord, FieldValue, Line, RecordId, Sublist};

use crate::error::StoreResult;

/// Operations the mapping engine requires from the backing record store.
///
/// Every call is blocking. Records are assembled as a [`DraftRecord`] and
/// persisted with a single [`RecordStore::submit`].
pub trait RecordStore {
    /// Starts a new, empty record of `record_type`.
    fn create_record(&mut self, record_type: &str) -> StoreResult<DraftRecord>;

    /// Derives a `target_type` record from an existing `source_type` record,
    /// carrying its lines forward.
    fn transform_record(
        &mut self,
        source_type: &str,
        source_id: &RecordId,
        target_type: &str,
    ) -> StoreResult<DraftRecord>;

    /// Persists a draft and returns the id assigned to it.
    fn submit(&mut self, record: DraftRecord) -> StoreResult<RecordId>;

    /// First record of `record_type` whose `key_field` equals `value`.
    fn search(
        &self,
        record_type: &str,
        key_field: &str,
        value: &str,
    ) -> StoreResult<Option<RecordId>>;

    /// Line ordinal of the first non-header line on any transaction with the
    /// internal type `code` whose `column` equals `value`.
    fn find_transaction_line(
        &self,
        code: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<i64>>;

    /// Whether a transaction with the internal type `code` exists under `id`.
    fn transaction_exists(&self, id: &RecordId, code: &str) -> StoreResult<bool>;

    /// Single field of a stored record, as text.
    fn lookup_field(
        &self,
        record_type: &str,
        id: &RecordId,
        field: &str,
    ) -> StoreResult<Option<String>>;

    /// Company-wide date pattern, if one is configured.
    fn company_date_format(&self) -> StoreResult<Option<String>>;
}
