//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, LoanId, TitleId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    NegativeCount,
    CountTooLarge,
    EmptyName,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::NegativeCount => "negative_count",
            ErrorCode::CountTooLarge => "count_too_large",
            ErrorCode::EmptyName => "empty_name",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn empty_name_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must not be empty"))
        .with_code(ErrorCode::EmptyName)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_title_id(value: &str, field: FieldName) -> Result<TitleId, Error> {
    parse_uuid(value, field).map(TitleId::from_uuid)
}

pub(crate) fn parse_loan_id(value: &str, field: FieldName) -> Result<LoanId, Error> {
    parse_uuid(value, field).map(LoanId::from_uuid)
}

/// Accept a signed copy count from a payload, rejecting negatives.
pub(crate) fn parse_copy_count(value: i64, field: FieldName) -> Result<u32, Error> {
    let name = field.as_str();
    if value < 0 {
        return Err(
            ValidationError::new(name, format!("{name} must not be negative"))
                .with_value(ErrorCode::NegativeCount, value.to_string()),
        );
    }
    // Copy counters are stored as 32-bit signed integers.
    if value > i64::from(i32::MAX) {
        return Err(
            ValidationError::new(name, format!("{name} must not exceed {}", i32::MAX))
                .with_value(ErrorCode::CountTooLarge, value.to_string()),
        );
    }
    u32::try_from(value).map_err(|_| {
        ValidationError::new(name, format!("{name} is out of range"))
            .with_value(ErrorCode::CountTooLarge, value.to_string())
    })
}
