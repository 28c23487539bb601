//! Create and transform entry points

use log::{debug, error, info, warn};
use serde_json::Value;
use std::fmt;

use super::request::IntegrationRequest;
use super::tables::{self, CREATED_FROM_FIELD, ITEM_SUBLIST, PACKAGE_SUBLIST, RECEIVE_COLUMN, STATUS_FIELD};
use super::IntegrationResponse;
use crate::config::EngineConfig;
use crate::error::{MappingError, MappingResult};
use crate::mapping::{
    collect_instances, group_instances, sublist_defaults, LineMatcher, RecordBuilder,
    RequestContext,
};
use crate::schema::{prepare_schema, IntegrationProject, MappingField, SchemaStore};
use crate::store::{ErrorLogEntry, ErrorSink, FieldValue, RecordId, RecordStore};

/// Record type display text that defers to the project's transaction type
const TRANSACTION_RECORD_TYPE: &str = "Transaction";
const NOT_CONFIGURED: &str = "Integration Project record was not configured properly.";

/// Progress of one request through a flow. Failures are logged with the
/// stage they happened in; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Loading,
    Grouping,
    MutatingHeader,
    MutatingLines,
    Submitting,
    Done,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStage::Loading => "loading",
            FlowStage::Grouping => "grouping",
            FlowStage::MutatingHeader => "mutating header",
            FlowStage::MutatingLines => "mutating lines",
            FlowStage::Submitting => "submitting",
            FlowStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

fn enter(stage: &mut FlowStage, next: FlowStage) {
    if *stage != next {
        debug!("Flow stage: {} -> {}", stage, next);
        *stage = next;
    }
}

/// Entry points of the mapping engine.
///
/// One service handles one request at a time. The record store is not
/// transactional: join records created before a failure are kept.
pub struct IntegrationService<'a> {
    schemas: &'a dyn SchemaStore,
    records: &'a mut dyn RecordStore,
    errors: &'a dyn ErrorSink,
    config: EngineConfig,
}

impl<'a> IntegrationService<'a> {
    pub fn new(
        schemas: &'a dyn SchemaStore,
        records: &'a mut dyn RecordStore,
        errors: &'a dyn ErrorSink,
        config: EngineConfig,
    ) -> Self {
        Self {
            schemas,
            records,
            errors,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Maps a request according to its mapping project: derived item
    /// receipts and fulfillments go through the transform flow, every other
    /// record type through the create flow.
    pub fn post(&mut self, request: &IntegrationRequest) -> IntegrationResponse {
        info!("Received integration request");
        match self.dispatch(request) {
            Ok(id) => IntegrationResponse::success(id),
            Err(e) => self.fail(e, request.document_id.clone()),
        }
    }

    /// Create flow with the configured mapping project.
    pub fn create_record(&mut self, payload: &Value, record_type: &str) -> IntegrationResponse {
        let project_id = self.config.mapping_project_id.clone();
        let mut stage = FlowStage::Loading;
        match self.run_create(payload, &project_id, record_type, &mut stage) {
            Ok(id) => IntegrationResponse::success(id),
            Err(e) => {
                warn!("Create flow failed while {}: {}", stage, e);
                self.fail(e, None)
            }
        }
    }

    /// Transform flow with the configured mapping project.
    pub fn transform_record(
        &mut self,
        payload: &Value,
        source_type: &str,
        target_type: &str,
    ) -> IntegrationResponse {
        let project_id = self.config.mapping_project_id.clone();
        let mut stage = FlowStage::Loading;
        match self.run_transform(payload, &project_id, source_type, target_type, &mut stage) {
            Ok(id) => IntegrationResponse::success(id),
            Err(e) => {
                warn!("Transform flow failed while {}: {}", stage, e);
                self.fail(e, None)
            }
        }
    }

    fn dispatch(&mut self, request: &IntegrationRequest) -> MappingResult<RecordId> {
        // Step 1: Validate input
        request.validate_input()?;

        // Step 2: Resolve the mapping project
        let project_id = request
            .project_id
            .clone()
            .unwrap_or_else(|| self.config.mapping_project_id.clone());
        let project = self
            .schemas
            .load_project(&project_id)?
            .ok_or_else(|| MappingError::configuration(NOT_CONFIGURED))?;
        let target_type = resolve_record_type(&project)?;
        info!("Project {} maps to record type '{}'", project_id, target_type);

        // Step 3: Run the flow for the target type
        let mut stage = FlowStage::Loading;
        let result = match tables::transform_source_for(&target_type) {
            Some(source_type) => {
                self.run_transform(&request.data, &project_id, source_type, &target_type, &mut stage)
            }
            None => self.run_create(&request.data, &project_id, &target_type, &mut stage),
        };
        if let Err(e) = &result {
            warn!("Flow for '{}' failed while {}: {}", target_type, stage, e);
        }
        result
    }

    fn run_create(
        &mut self,
        payload: &Value,
        project_id: &str,
        record_type: &str,
        stage: &mut FlowStage,
    ) -> MappingResult<RecordId> {
        let ctx = self.request_context()?;
        let fields = self.load_schema(project_id)?;

        enter(stage, FlowStage::Grouping);
        let instances = collect_instances(&fields, payload);
        let defaults = sublist_defaults(&instances);
        let buckets = group_instances(instances);
        info!(
            "Grouped payload into {} buckets for new {} record",
            buckets.len(),
            record_type
        );

        enter(stage, FlowStage::MutatingHeader);
        let id = RecordBuilder::new(&mut *self.records, &ctx).build(
            &buckets,
            record_type,
            &defaults,
        )?;
        enter(stage, FlowStage::Done);
        info!("Created {} record {}", record_type, id);
        Ok(id)
    }

    fn run_transform(
        &mut self,
        payload: &Value,
        project_id: &str,
        source_type: &str,
        target_type: &str,
        stage: &mut FlowStage,
    ) -> MappingResult<RecordId> {
        let ctx = self.request_context()?;
        let fields = self.load_schema(project_id)?;
        let source_code = tables::code_for_record_type(source_type).ok_or_else(|| {
            MappingError::configuration("This transaction transformation is not supported.")
        })?;

        enter(stage, FlowStage::Grouping);
        let instances = collect_instances(&fields, payload);

        let created_from = instances
            .iter()
            .find(|i| i.target() == CREATED_FROM_FIELD)
            .map(|i| i.value_text())
            .filter(|reference| !reference.is_empty())
            .ok_or_else(|| {
                MappingError::precondition(
                    "This transaction could not be transformed, missing -createdfrom- property.",
                )
            })?;
        let source_id = self
            .resolve_source(source_type, source_code, &created_from)?
            .ok_or_else(|| {
                MappingError::precondition(format!(
                    "The source transaction -{}- is not in the system, transformation cannot be performed.",
                    created_from
                ))
            })?;

        let status = self
            .records
            .lookup_field(source_type, &source_id, STATUS_FIELD)?
            .unwrap_or_default();
        if !tables::can_order_be_fulfilled(&status) {
            return Err(MappingError::precondition(format!(
                "This order cannot be fulfilled it's status is: {}",
                status
            )));
        }

        let defaults = sublist_defaults(&instances);
        let buckets = group_instances(instances);
        info!(
            "Transforming {} {} into {} with {} buckets",
            source_type,
            source_id,
            target_type,
            buckets.len()
        );

        enter(stage, FlowStage::MutatingHeader);
        let mut record = self
            .records
            .transform_record(source_type, &source_id, target_type)?;

        // Only lines named by the payload are received
        if target_type == tables::ITEM_RECEIPT || target_type == tables::ITEM_FULFILLMENT {
            for index in 1..=record.line_count(ITEM_SUBLIST) {
                record.set_line_value(ITEM_SUBLIST, index, RECEIVE_COLUMN, FieldValue::text("F"))?;
            }
        }

        let mut matcher = LineMatcher::new(&ctx, source_code);
        for bucket in &buckets {
            if bucket.is_line() {
                enter(stage, FlowStage::MutatingLines);
                let sublist = if bucket.join.is_empty() {
                    PACKAGE_SUBLIST
                } else {
                    bucket.join.as_str()
                };
                matcher.receive(&*self.records, &mut record, sublist, bucket, &defaults)?;
            } else {
                enter(stage, FlowStage::MutatingHeader);
                RecordBuilder::new(&mut *self.records, &ctx)
                    .reserving(CREATED_FROM_FIELD)
                    .apply_bucket(&mut record, bucket, &defaults)?;
            }
        }
        matcher.finish(&mut record)?;

        enter(stage, FlowStage::Submitting);
        let id = self.records.submit(record)?;
        enter(stage, FlowStage::Done);
        info!("Created {} record {} from {} {}", target_type, id, source_type, source_id);
        Ok(id)
    }

    /// A numeric reference is tried as an internal id first; anything else,
    /// or an unknown id, is searched as a document number.
    fn resolve_source(
        &self,
        source_type: &str,
        source_code: &str,
        reference: &str,
    ) -> MappingResult<Option<RecordId>> {
        if reference.chars().all(|c| c.is_ascii_digit()) {
            let id = RecordId::new(reference);
            if self.records.transaction_exists(&id, source_code)? {
                return Ok(Some(id));
            }
            debug!("No {} with internal id {}", source_type, reference);
        }

        let column = tables::lookup_column_for(CREATED_FROM_FIELD).unwrap_or("numbertext");
        Ok(self.records.search(tables::TRANSACTION, column, reference)?)
    }

    fn request_context(&self) -> MappingResult<RequestContext> {
        let date_format = self
            .records
            .company_date_format()?
            .filter(|pattern| !pattern.trim().is_empty())
            .unwrap_or_else(|| self.config.default_date_format.clone());
        Ok(RequestContext::new(date_format))
    }

    fn load_schema(&self, project_id: &str) -> MappingResult<Vec<MappingField>> {
        let fields = prepare_schema(self.schemas.load_mapping_fields(project_id)?)?;
        info!("Loaded {} mapping fields for project {}", fields.len(), project_id);
        Ok(fields)
    }

    fn fail(&mut self, err: MappingError, document_id: Option<String>) -> IntegrationResponse {
        let message = err.user_message();
        let entry =
            ErrorLogEntry::new(message.clone(), self.config.script_id.clone()).with_document(document_id, None);

        if self.config.log_errors {
            self.errors.log_error(&entry);
        }
        if self.config.persist_error_records {
            self.persist_error_record(&entry);
        }
        IntegrationResponse::failure(message)
    }

    fn persist_error_record(&mut self, entry: &ErrorLogEntry) {
        let persisted = self
            .records
            .create_record(&self.config.error_record_type)
            .and_then(|mut record| {
                record.set_field(tables::ERROR_LOG_NAME_FIELD, FieldValue::text(entry.script_id.as_str()));
                if let Some(document_id) = &entry.document_id {
                    record.set_field(
                        tables::ERROR_LOG_TRANSACTION_ID_FIELD,
                        FieldValue::text(document_id.as_str()),
                    );
                }
                if let Some(internal_id) = &entry.document_internal_id {
                    record.set_field(
                        tables::ERROR_LOG_TRANSACTION_INTERNAL_ID_FIELD,
                        FieldValue::text(internal_id.as_str()),
                    );
                }
                record.set_field(tables::ERROR_LOG_MESSAGE_FIELD, FieldValue::text(entry.message.as_str()));
                self.records.submit(record)
            });

        if let Err(e) = persisted {
            error!("Error record could not be stored: {}", e);
        }
    }
}

/// Target record type of a project. `"Transaction"` projects name their
/// transaction by display text.
pub fn resolve_record_type(project: &IntegrationProject) -> MappingResult<String> {
    if project.record_type != TRANSACTION_RECORD_TYPE {
        let record_type: String = project
            .record_type
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if record_type.is_empty() {
            return Err(MappingError::configuration(NOT_CONFIGURED));
        }
        return Ok(record_type);
    }

    project
        .transaction_type
        .as_deref()
        .and_then(tables::record_type_for_transaction_name)
        .map(str::to_string)
        .ok_or_else(|| MappingError::configuration(NOT_CONFIGURED))
}
