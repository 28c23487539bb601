use serde::{Deserialize, Serialize};

use super::field_type::{AddressType, FieldType};
use crate::error::{MappingError, MappingResult};

/// One declared mapping between an external JSON property and a field of the
/// target record.
///
/// `external_path` is either a bare leaf name (`"sku"`) or `"parent.leaf"`,
/// where `parent` is the key of the object or array the leaf must sit in.
/// Fields carrying a `lookup_field` are references resolved against
/// `join_record_type` instead of being written literally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappingField {
    pub target_field_id: String,
    pub external_path: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_sublist_field: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub lookup_field: Option<String>,
    #[serde(default)]
    pub join_record_type: Option<String>,
    #[serde(default)]
    pub is_address_field: bool,
    #[serde(default)]
    pub address_type: Option<AddressType>,
}

impl MappingField {
    /// Create a plain string header mapping
    pub fn new(target_field_id: &str, external_path: &str) -> Self {
        Self {
            target_field_id: target_field_id.to_string(),
            external_path: external_path.to_string(),
            field_type: FieldType::String,
            is_sublist_field: false,
            default_value: None,
            lookup_field: None,
            join_record_type: None,
            is_address_field: false,
            address_type: None,
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn sublist(mut self) -> Self {
        self.is_sublist_field = true;
        self
    }

    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn with_lookup(mut self, lookup_field: &str) -> Self {
        self.lookup_field = Some(lookup_field.to_string());
        self
    }

    pub fn with_join(mut self, record_type: &str) -> Self {
        self.join_record_type = Some(record_type.to_lowercase());
        self
    }

    pub fn address(mut self, address_type: AddressType) -> Self {
        self.is_address_field = true;
        self.address_type = Some(address_type);
        self
    }

    /// Expected parent tag; empty when the path is a bare leaf name.
    pub fn parent_tag(&self) -> &str {
        match self.external_path.split_once('.') {
            Some((parent, _)) => parent,
            None => "",
        }
    }

    /// Property name searched for in the payload.
    pub fn leaf_name(&self) -> &str {
        match self.external_path.split_once('.') {
            Some((_, leaf)) => leaf,
            None => &self.external_path,
        }
    }

    /// Join record type, empty when the field has none.
    pub fn join(&self) -> &str {
        self.join_record_type.as_deref().unwrap_or("")
    }

    /// Lookup property, `None` when blank.
    pub fn lookup(&self) -> Option<&str> {
        self.lookup_field.as_deref().filter(|l| !l.trim().is_empty())
    }

    /// Default value, `None` when blank.
    pub fn default_text(&self) -> Option<&str> {
        self.default_value.as_deref().filter(|d| !d.is_empty())
    }

    /// Checks the declaration and lower-cases the join type.
    pub fn normalized(mut self) -> MappingResult<Self> {
        if self.target_field_id.trim().is_empty() {
            return Err(MappingError::schema(format!(
                "Mapping for external path '{}' has no target field",
                self.external_path
            )));
        }
        if self.external_path.split('.').count() > 2 {
            return Err(MappingError::schema(format!(
                "External path '{}' of field '{}' has more than two segments",
                self.external_path, self.target_field_id
            )));
        }
        if self.is_address_field && self.address_type.is_none() {
            return Err(MappingError::schema(format!(
                "Address field '{}' has no address type",
                self.target_field_id
            )));
        }
        self.join_record_type = self
            .join_record_type
            .map(|join| join.trim().to_lowercase())
            .filter(|join| !join.is_empty());
        Ok(self)
    }
}

/// Validate a loaded schema, rejecting empty schemas and malformed rows.
pub fn prepare_schema(fields: Vec<MappingField>) -> MappingResult<Vec<MappingField>> {
    if fields.is_empty() {
        return Err(MappingError::schema(
            "Schema of the integration project is missing.",
        ));
    }
    fields.into_iter().map(MappingField::normalized).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_external_path() {
        let field = MappingField::new("custbody_ref", "order.reference");
        assert_eq!(field.parent_tag(), "order");
        assert_eq!(field.leaf_name(), "reference");

        let bare = MappingField::new("memo", "note");
        assert_eq!(bare.parent_tag(), "");
        assert_eq!(bare.leaf_name(), "note");
    }

    #[test]
    fn deserializes_schema_rows() {
        let row = serde_json::json!({
            "targetFieldId": "shipaddr1",
            "externalPath": "shipping.line1",
            "fieldType": "Free-Form Text",
            "isAddressField": true,
            "addressType": "shippingaddress",
            "joinRecordType": "Customer"
        });
        let field: MappingField = serde_json::from_value(row).unwrap();
        let field = field.normalized().unwrap();
        assert_eq!(field.address_type, Some(AddressType::Shipping));
        assert_eq!(field.join(), "customer");
        assert!(field.lookup().is_none());
    }

    #[test]
    fn rejects_address_field_without_type() {
        let mut field = MappingField::new("billaddr1", "billing.line1");
        field.is_address_field = true;
        assert!(field.normalized().is_err());
    }

    #[test]
    fn rejects_empty_schema() {
        let err = prepare_schema(Vec::new()).unwrap_err();
        assert_eq!(err.user_message(), "Schema of the integration project is missing.");
    }

    #[test]
    fn blank_default_is_ignored() {
        let field = MappingField::new("memo", "note").with_default("");
        assert!(field.default_text().is_none());
    }
}
