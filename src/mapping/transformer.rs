//! Conversion of raw external values into the representation a field type requires

use serde_json::Value;

use super::date_format::{self, DEFAULT_DATE_FORMAT};
use crate::error::TransformError;
use crate::schema::FieldType;
use crate::store::FieldValue;

/// Settings resolved once at the start of a request and read by every value
/// conversion in that request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    date_format: String,
}

impl RequestContext {
    pub fn new(date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        let date_format = if date_format.trim().is_empty() {
            DEFAULT_DATE_FORMAT.to_string()
        } else {
            date_format
        };
        Self { date_format }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

/// Text form of a raw payload value. `null` becomes the empty string.
pub fn value_text(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a raw value counts as "no value".
pub fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Converts `raw` for a field of type `field_type`.
///
/// Blank input stays blank for every type. Non-blank input that cannot be
/// read as a number or date is an error.
pub fn transform(
    raw: &Value,
    field_type: FieldType,
    ctx: &RequestContext,
) -> Result<FieldValue, TransformError> {
    if is_blank(raw) && field_type != FieldType::Boolean {
        return Ok(FieldValue::Text(String::new()));
    }

    match field_type {
        FieldType::String => Ok(passthrough(raw)),
        FieldType::Date => transform_date(raw, ctx),
        FieldType::Integer => parse_integer(raw).map(FieldValue::Integer),
        FieldType::Float => parse_float(raw).map(FieldValue::Float),
        FieldType::ScaledCurrency => {
            parse_integer(raw).map(|minor| FieldValue::Float(minor as f64 / 100.0))
        }
        FieldType::Phone => Ok(FieldValue::Text(
            value_text(raw)
                .chars()
                .filter(|c| !matches!(c, '(' | ')' | '-') && !c.is_whitespace())
                .collect(),
        )),
        FieldType::Boolean => {
            let checked = match raw {
                Value::Bool(b) => *b,
                Value::String(s) => s == "T",
                _ => false,
            };
            Ok(FieldValue::Text(if checked { "T" } else { "F" }.to_string()))
        }
    }
}

fn passthrough(raw: &Value) -> FieldValue {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Float(n.as_f64().unwrap_or_default()),
        },
        other => FieldValue::Text(value_text(other)),
    }
}

fn transform_date(raw: &Value, ctx: &RequestContext) -> Result<FieldValue, TransformError> {
    let text = value_text(raw);
    // Ten digit values are Unix timestamps in seconds
    let parsed = if text.len() == 10 && text.chars().all(|c| c.is_ascii_digit()) {
        text.parse::<i64>()
            .ok()
            .and_then(date_format::from_epoch_seconds)
    } else {
        date_format::parse_date_text(&text)
    };

    parsed
        .map(|dt| FieldValue::Text(date_format::format_date(&dt, ctx.date_format(), true)))
        .ok_or(TransformError::InvalidDate(text))
}

/// Base-10 integer read the way loosely typed sources produce them: leading
/// whitespace and trailing garbage are ignored, fractions are truncated.
pub fn parse_integer(raw: &Value) -> Result<i64, TransformError> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| TransformError::InvalidInteger(n.to_string())),
        Value::String(s) => {
            let trimmed = s.trim_start();
            let (sign, rest) = match trimmed.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits
                .parse::<i64>()
                .map(|n| n * sign)
                .map_err(|_| TransformError::InvalidInteger(s.clone()))
        }
        other => Err(TransformError::InvalidInteger(value_text(other))),
    }
}

fn parse_float(raw: &Value) -> Result<f64, TransformError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TransformError::InvalidFloat(n.to_string())),
        Value::String(s) => float_prefix(s.trim_start())
            .parse::<f64>()
            .map_err(|_| TransformError::InvalidFloat(s.clone())),
        other => Err(TransformError::InvalidFloat(value_text(other))),
    }
}

/// Longest leading `[+-]digits[.digits][e[+-]digits]` run of `s`.
fn float_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = if matches!(bytes.first(), Some(b'+' | b'-')) { 1 } else { 0 };
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return "";
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new("MM/DD/YYYY")
    }

    #[test]
    fn phone_numbers_are_stripped() {
        let out = transform(&json!("(555) 123-4567"), FieldType::Phone, &ctx()).unwrap();
        assert_eq!(out, FieldValue::Text("5551234567".to_string()));
    }

    #[test]
    fn boolean_only_accepts_true_and_t() {
        let cases = [
            (json!(true), "T"),
            (json!("T"), "T"),
            (json!(false), "F"),
            (json!("true"), "F"),
            (json!("t"), "F"),
            (json!(1), "F"),
            (json!(null), "F"),
            (json!(""), "F"),
        ];
        for (input, expected) in cases {
            let out = transform(&input, FieldType::Boolean, &ctx()).unwrap();
            assert_eq!(out, FieldValue::Text(expected.to_string()), "input {}", input);
        }
    }

    #[test]
    fn ten_digit_dates_are_epoch_seconds() {
        let out = transform(&json!("1700000000"), FieldType::Date, &ctx()).unwrap();
        assert_eq!(out, FieldValue::Text("11/14/2023".to_string()));

        let numeric = transform(&json!(1700000000), FieldType::Date, &ctx()).unwrap();
        assert_eq!(numeric, out);
    }

    #[test]
    fn other_dates_are_parsed_as_text() {
        let out = transform(&json!("2024-02-29T08:00:00Z"), FieldType::Date, &ctx()).unwrap();
        assert_eq!(out, FieldValue::Text("02/29/2024".to_string()));

        // Ten characters but not a timestamp
        let iso = transform(&json!("2024-02-29"), FieldType::Date, &ctx()).unwrap();
        assert_eq!(iso, FieldValue::Text("02/29/2024".to_string()));

        assert!(transform(&json!("someday"), FieldType::Date, &ctx()).is_err());
    }

    #[test]
    fn integers_parse_leading_digits() {
        assert_eq!(
            transform(&json!("42 units"), FieldType::Integer, &ctx()).unwrap(),
            FieldValue::Integer(42)
        );
        assert_eq!(
            transform(&json!(7.9), FieldType::Integer, &ctx()).unwrap(),
            FieldValue::Integer(7)
        );
        assert_eq!(
            transform(&json!("abc"), FieldType::Integer, &ctx()),
            Err(TransformError::InvalidInteger("abc".to_string()))
        );
    }

    #[test]
    fn floats_parse_leading_number() {
        let cases = [
            (json!("12.5 kg"), 12.5),
            (json!("  -0.25lb"), -0.25),
            (json!(".5"), 0.5),
            (json!("3."), 3.0),
            (json!("1e3 g"), 1000.0),
            (json!("7e"), 7.0),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                transform(&raw, FieldType::Float, &ctx()).unwrap(),
                FieldValue::Float(expected),
                "{}",
                raw
            );
        }
        assert_eq!(
            transform(&json!("abc"), FieldType::Float, &ctx()),
            Err(TransformError::InvalidFloat("abc".to_string()))
        );
        assert!(transform(&json!("-."), FieldType::Float, &ctx()).is_err());
    }

    #[test]
    fn scaled_currency_divides_minor_units() {
        assert_eq!(
            transform(&json!(1999), FieldType::ScaledCurrency, &ctx()).unwrap(),
            FieldValue::Float(19.99)
        );
        assert_eq!(
            transform(&json!("250"), FieldType::ScaledCurrency, &ctx()).unwrap(),
            FieldValue::Float(2.5)
        );
    }

    #[test]
    fn floats_and_strings() {
        assert_eq!(
            transform(&json!("12.75"), FieldType::Float, &ctx()).unwrap(),
            FieldValue::Float(12.75)
        );
        assert!(transform(&json!("n/a"), FieldType::Float, &ctx()).is_err());
        assert_eq!(
            transform(&json!("Acme"), FieldType::String, &ctx()).unwrap(),
            FieldValue::Text("Acme".to_string())
        );
        assert_eq!(
            transform(&json!(3), FieldType::String, &ctx()).unwrap(),
            FieldValue::Integer(3)
        );
    }

    #[test]
    fn blank_values_stay_blank() {
        for field_type in [FieldType::Integer, FieldType::Date, FieldType::Float] {
            assert_eq!(
                transform(&json!(""), field_type, &ctx()).unwrap(),
                FieldValue::Text(String::new())
            );
        }
    }
}
