use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::error::MappingError;

/// Declared type of a mapped field. Selects the value conversion applied
/// before the value is written to the target record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    #[default]
    String,
    Date,
    Integer,
    Float,
    /// Minor-unit integer amounts (cents) scaled down by 100
    ScaledCurrency,
    Phone,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::ScaledCurrency => "scaled-currency",
            FieldType::Phone => "phone",
            FieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = MappingError;

    /// Accepts the canonical names plus the display labels used by the
    /// schema records ("Free-Form Text", "Stripe Currency", "Check Box", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "string" | "text" | "free-form text" => Ok(FieldType::String),
            "date" => Ok(FieldType::Date),
            "integer" | "integer number" => Ok(FieldType::Integer),
            "float" | "decimal" | "decimal number" => Ok(FieldType::Float),
            "scaled-currency" | "scaled currency" | "stripe currency" => {
                Ok(FieldType::ScaledCurrency)
            }
            "phone" | "phone number" => Ok(FieldType::Phone),
            "boolean" | "check box" | "checkbox" => Ok(FieldType::Boolean),
            other => Err(MappingError::schema(format!(
                "Unknown field type '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = MappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

/// Address block a field belongs to. The code is negated to form the
/// bucket line number, keeping address buckets apart from header (0) and
/// line (>0) buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum AddressType {
    Shipping,
    Billing,
}

impl AddressType {
    pub fn code(&self) -> i64 {
        match self {
            AddressType::Shipping => 1,
            AddressType::Billing => 2,
        }
    }

    /// Bucket line number for fields of this address block.
    pub fn line(&self) -> i64 {
        self.code() * -1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::Shipping => "shippingaddress",
            AddressType::Billing => "billingaddress",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shippingaddress" | "shipping" => Ok(AddressType::Shipping),
            "billingaddress" | "billing" => Ok(AddressType::Billing),
            other => Err(MappingError::schema(format!(
                "Unknown address type '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for AddressType {
    type Error = MappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AddressType> for String {
    fn from(value: AddressType) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_labels() {
        assert_eq!("Stripe Currency".parse::<FieldType>().unwrap(), FieldType::ScaledCurrency);
        assert_eq!("Check Box".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert_eq!("DATE".parse::<FieldType>().unwrap(), FieldType::Date);
        assert!("rich text".parse::<FieldType>().is_err());
    }

    #[test]
    fn address_lines_are_negative() {
        assert_eq!("shippingaddress".parse::<AddressType>().unwrap().line(), -1);
        assert_eq!("billingaddress".parse::<AddressType>().unwrap().line(), -2);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&FieldType::ScaledCurrency).unwrap();
        assert_eq!(json, "\"scaled-currency\"");
        let parsed: FieldType = serde_json::from_str("\"phone number\"").unwrap();
        assert_eq!(parsed, FieldType::Phone);
        assert!(serde_json::from_str::<FieldType>("\"blob\"").is_err());
    }
}
