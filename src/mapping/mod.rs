//! # Mapping Engine
//!
//! Turns an external JSON payload into mutations of a target record.
//!
//! ## Components
//!
//! * `extractor` - finds every occurrence of a property in the payload
//! * `transformer` - converts raw values to the declared field type
//! * `date_format` - company date pattern rendering
//! * `grouper` - binds mapping fields to values and buckets them by line
//! * `record_builder` - header fields, join records, addresses and new lines
//! * `line_matcher` - lines on records derived from a source transaction
//!
//! ## Flow
//!
//! 1. Extract each mapped property from the payload
//! 2. Bind values to mapping fields and assign header, line or address buckets
//! 3. Group instances by `(line, join)` in first-appearance order
//! 4. Apply each bucket to the in-memory record
//! 5. Submit the record once

pub mod date_format;
pub mod extractor;
pub mod grouper;
pub mod line_matcher;
pub mod record_builder;
pub mod transformer;

pub use date_format::{format_date, DEFAULT_DATE_FORMAT};
pub use extractor::{extract, ExtractedOccurrence, ParentTag};
pub use grouper::{
    collect_instances, group, group_instances, sublist_defaults, FieldInstance, GroupedBucket,
};
pub use line_matcher::LineMatcher;
pub use record_builder::RecordBuilder;
pub use transformer::{transform, RequestContext};
