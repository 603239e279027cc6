// crates/bankws-core/src/fields.rs
// ============================================================================
// Module: Field Mapping Helpers
// Description: Typed reads of child elements shared by the xmldata models.
// Purpose: Convert validated element trees into model values.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Models are mapped only after schema validation, so these helpers rarely
//! fail; they still return [`FieldError`] instead of assuming validity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::xml::XmlElement;
use crate::xs;
use crate::xs::XsDate;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure to map one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field {field}: {message}")]
pub struct FieldError {
    /// Element local name.
    pub field: &'static str,
    /// What was wrong.
    pub message: String,
}

impl FieldError {
    /// Builds a field error.
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Readers
// ============================================================================

/// Reads a mandatory text child.
pub(crate) fn required_text(element: &XmlElement, name: &'static str) -> Result<String, FieldError> {
    element.child_text(name).map(str::to_string).ok_or_else(|| FieldError::new(name, "missing"))
}

/// Reads an optional text child.
pub(crate) fn optional_text(element: &XmlElement, name: &str) -> Option<String> {
    element.child_text(name).map(str::to_string)
}

/// Reads a mandatory child with surrounding whitespace removed.
///
/// ISO 20022 codes and identifiers are tokens, unlike the `xs:string`
/// fields of the xmldata messages, which are read verbatim.
pub(crate) fn required_token(
    element: &XmlElement,
    name: &'static str,
) -> Result<String, FieldError> {
    optional_token(element, name).ok_or_else(|| FieldError::new(name, "missing"))
}

/// Reads an optional child with surrounding whitespace removed.
pub(crate) fn optional_token(element: &XmlElement, name: &str) -> Option<String> {
    element.child_text(name).map(|text| text.trim().to_string())
}

/// Reads an optional `xs:boolean` child.
pub(crate) fn optional_bool(
    element: &XmlElement,
    name: &'static str,
) -> Result<Option<bool>, FieldError> {
    element
        .child_text(name)
        .map(|text| xs::parse_boolean(text).ok_or_else(|| FieldError::new(name, "not a boolean")))
        .transpose()
}

/// Reads an optional `xs:double` child.
pub(crate) fn optional_double(
    element: &XmlElement,
    name: &'static str,
) -> Result<Option<f64>, FieldError> {
    element
        .child_text(name)
        .map(|text| xs::parse_double(text).ok_or_else(|| FieldError::new(name, "not a double")))
        .transpose()
}

/// Reads an optional `xs:long` child.
pub(crate) fn optional_long(
    element: &XmlElement,
    name: &'static str,
) -> Result<Option<i64>, FieldError> {
    element
        .child_text(name)
        .map(|text| xs::parse_long(text).ok_or_else(|| FieldError::new(name, "not a long")))
        .transpose()
}

/// Reads an optional `xs:base64Binary` child.
pub(crate) fn optional_base64(
    element: &XmlElement,
    name: &'static str,
) -> Result<Option<Vec<u8>>, FieldError> {
    element
        .child_text(name)
        .map(|text| xs::parse_base64(text).ok_or_else(|| FieldError::new(name, "not base64")))
        .transpose()
}

/// Reads a mandatory `xs:dateTime` child.
pub(crate) fn required_date_time(
    element: &XmlElement,
    name: &'static str,
) -> Result<XsDateTime, FieldError> {
    let text = element.child_text(name).ok_or_else(|| FieldError::new(name, "missing"))?;
    XsDateTime::parse(text).map_err(|err| FieldError::new(name, err.to_string()))
}

/// Reads an optional `xs:dateTime` child.
pub(crate) fn optional_date_time(
    element: &XmlElement,
    name: &'static str,
) -> Result<Option<XsDateTime>, FieldError> {
    element
        .child_text(name)
        .map(|text| XsDateTime::parse(text).map_err(|err| FieldError::new(name, err.to_string())))
        .transpose()
}

/// Reads an optional `xs:date` child.
pub(crate) fn optional_date(
    element: &XmlElement,
    name: &'static str,
) -> Result<Option<XsDate>, FieldError> {
    element
        .child_text(name)
        .map(|text| XsDate::parse(text).map_err(|err| FieldError::new(name, err.to_string())))
        .transpose()
}
