// crates/bankws-core/src/xs.rs
// ============================================================================
// Module: XML Schema Lexical Types
// Description: Parsing and formatting of xs:dateTime, xs:date and scalar types.
// Purpose: Keep lexical forms intact across parse and serialize.
// Dependencies: base64, thiserror, time
// ============================================================================

//! ## Overview
//! The xmldata documents use a handful of XML Schema built-in types. Date
//! values keep their original lexical form so that a parsed document
//! serializes back to the same text; the parsed value is available for
//! comparisons and arithmetic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lexical parse failures for schema types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XsError {
    /// Value does not match the lexical space of the type.
    #[error("invalid {type_name} value: {value}")]
    Lexical {
        /// Schema type name.
        type_name: &'static str,
        /// Offending value.
        value: String,
    },
    /// Value cannot be formatted.
    #[error("cannot format {type_name}: {message}")]
    Format {
        /// Schema type name.
        type_name: &'static str,
        /// Underlying error.
        message: String,
    },
}

impl XsError {
    /// Builds a lexical error.
    fn lexical(type_name: &'static str, value: &str) -> Self {
        Self::Lexical {
            type_name,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Date Time
// ============================================================================

/// Parsed value of an `xs:dateTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    /// Timestamp with an explicit offset.
    Offset(OffsetDateTime),
    /// Timestamp without timezone information.
    Local(PrimitiveDateTime),
}

/// `xs:dateTime` value that preserves its lexical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsDateTime {
    /// Lexical representation as read or formatted.
    lexical: String,
    /// Parsed value.
    value: DateTimeValue,
}

impl XsDateTime {
    /// Parses an `xs:dateTime` lexical value.
    ///
    /// # Errors
    ///
    /// Returns [`XsError::Lexical`] when the value is not a valid dateTime.
    pub fn parse(text: &str) -> Result<Self, XsError> {
        let trimmed = text.trim();
        if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Ok(Self {
                lexical: trimmed.to_string(),
                value: DateTimeValue::Offset(value),
            });
        }
        let local = parse_local_date_time(trimmed)
            .ok_or_else(|| XsError::lexical("dateTime", trimmed))?;
        Ok(Self {
            lexical: trimmed.to_string(),
            value: DateTimeValue::Local(local),
        })
    }

    /// Formats an offset timestamp as RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns [`XsError::Format`] when the year is outside the RFC 3339 range.
    pub fn from_offset(value: OffsetDateTime) -> Result<Self, XsError> {
        let lexical = value.format(&Rfc3339).map_err(|err| XsError::Format {
            type_name: "dateTime",
            message: err.to_string(),
        })?;
        Ok(Self {
            lexical,
            value: DateTimeValue::Offset(value),
        })
    }

    /// Returns the lexical form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.lexical
    }

    /// Returns the parsed value.
    #[must_use]
    pub const fn value(&self) -> DateTimeValue {
        self.value
    }

    /// Returns the value as an offset timestamp, reading local values as UTC.
    #[must_use]
    pub const fn assume_utc(&self) -> OffsetDateTime {
        match self.value {
            DateTimeValue::Offset(value) => value,
            DateTimeValue::Local(value) => value.assume_utc(),
        }
    }
}

impl fmt::Display for XsDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}

/// Parses a dateTime without offset, with or without fractional seconds.
fn parse_local_date_time(text: &str) -> Option<PrimitiveDateTime> {
    let plain = time::format_description::parse("[year]-[month]-[day]T[hour]:[minute]:[second]")
        .ok()?;
    if let Ok(value) = PrimitiveDateTime::parse(text, &plain) {
        return Some(value);
    }
    let fractional = time::format_description::parse(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
    )
    .ok()?;
    PrimitiveDateTime::parse(text, &fractional).ok()
}

// ============================================================================
// SECTION: Date
// ============================================================================

/// `xs:date` value that preserves its lexical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsDate {
    /// Lexical representation.
    lexical: String,
    /// Calendar date (timezone suffix ignored).
    date: Date,
}

impl XsDate {
    /// Parses an `xs:date` lexical value with an optional timezone suffix.
    ///
    /// # Errors
    ///
    /// Returns [`XsError::Lexical`] when the value is not a valid date.
    pub fn parse(text: &str) -> Result<Self, XsError> {
        let trimmed = text.trim();
        let without_zone = strip_zone(trimmed);
        let format = time::format_description::parse("[year]-[month]-[day]")
            .map_err(|err| XsError::Format {
                type_name: "date",
                message: err.to_string(),
            })?;
        let date =
            Date::parse(without_zone, &format).map_err(|_| XsError::lexical("date", trimmed))?;
        Ok(Self {
            lexical: trimmed.to_string(),
            date,
        })
    }

    /// Formats a calendar date as `YYYY-MM-DD`.
    #[must_use]
    pub fn from_date(date: Date) -> Self {
        let lexical =
            format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day());
        Self {
            lexical,
            date,
        }
    }

    /// Returns the lexical form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.lexical
    }

    /// Returns the calendar date.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }
}

impl fmt::Display for XsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}

/// Removes a trailing `Z` or `+hh:mm`/`-hh:mm` timezone from a date.
fn strip_zone(text: &str) -> &str {
    if let Some(stripped) = text.strip_suffix('Z') {
        return stripped;
    }
    if text.len() > 6 {
        let split = text.len() - 6;
        if let Some(zone) = text.get(split..) {
            let bytes = zone.as_bytes();
            if (bytes[0] == b'+' || bytes[0] == b'-') && bytes[3] == b':' {
                return &text[..split];
            }
        }
    }
    text
}

// ============================================================================
// SECTION: Scalars
// ============================================================================

/// Parses an `xs:boolean`.
#[must_use]
pub fn parse_boolean(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Formats an `xs:boolean` in canonical form.
#[must_use]
pub const fn format_boolean(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Parses an `xs:double`, including `INF`, `-INF` and `NaN`.
#[must_use]
pub fn parse_double(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed {
        "INF" | "+INF" => return Some(f64::INFINITY),
        "-INF" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }
    if !is_decimal_lexical(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Formats an `xs:double`.
#[must_use]
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "INF".to_string() } else { "-INF".to_string() }
    } else {
        value.to_string()
    }
}

/// Checks the `[+-]digits[.digits][(e|E)[+-]digits]` shape of a double.
fn is_decimal_lexical(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(index) => (&body[..index], Some(&body[index + 1..])),
        None => (body, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (mantissa, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    if !whole.bytes().all(|byte| byte.is_ascii_digit())
        || !fraction.bytes().all(|byte| byte.is_ascii_digit())
    {
        return false;
    }
    match exponent {
        None => true,
        Some(exponent) => {
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
        }
    }
}

/// Parses an `xs:long`.
#[must_use]
pub fn parse_long(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Decodes an `xs:base64Binary`, ignoring embedded whitespace.
#[must_use]
pub fn parse_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
    STANDARD.decode(compact.as_bytes()).ok()
}

/// Encodes bytes as `xs:base64Binary`.
#[must_use]
pub fn format_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn date_time_keeps_lexical_form_with_offset() {
        let value = XsDateTime::parse("2008-09-18T10:00:00.123+03:00").unwrap();
        assert_eq!(value.as_str(), "2008-09-18T10:00:00.123+03:00");
        assert!(matches!(value.value(), DateTimeValue::Offset(_)));
    }

    #[test]
    fn date_time_without_zone_is_local() {
        let value = XsDateTime::parse("2011-02-01T12:30:45").unwrap();
        assert!(matches!(value.value(), DateTimeValue::Local(_)));
        let fractional = XsDateTime::parse("2011-02-01T12:30:45.5").unwrap();
        assert!(matches!(fractional.value(), DateTimeValue::Local(_)));
    }

    #[test]
    fn date_time_rejects_garbage() {
        assert!(XsDateTime::parse("yesterday").is_err());
        assert!(XsDateTime::parse("2011-02-01").is_err());
        assert!(XsDateTime::parse("2011-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn date_accepts_timezone_suffix() {
        assert_eq!(XsDate::parse("2011-02-01Z").unwrap().date().day(), 1);
        assert_eq!(XsDate::parse("2011-02-01+02:00").unwrap().as_str(), "2011-02-01+02:00");
        assert!(XsDate::parse("2011-02-30").is_err());
    }

    #[test]
    fn boolean_accepts_numeric_forms() {
        assert_eq!(parse_boolean("1"), Some(true));
        assert_eq!(parse_boolean("false"), Some(false));
        assert_eq!(parse_boolean("TRUE"), None);
    }

    #[test]
    fn double_lexical_space() {
        assert_eq!(parse_double("1.5E3"), Some(1500.0));
        assert_eq!(parse_double("-.5"), Some(-0.5));
        assert_eq!(parse_double("INF"), Some(f64::INFINITY));
        assert!(parse_double("NaN").is_some_and(f64::is_nan));
        assert_eq!(parse_double("inf"), None);
        assert_eq!(parse_double("1,5"), None);
        assert_eq!(parse_double("."), None);
        assert_eq!(format_double(f64::NEG_INFINITY), "-INF");
        assert_eq!(format_double(1234.5), "1234.5");
    }

    #[test]
    fn long_rejects_fractions() {
        assert_eq!(parse_long("+42"), Some(42));
        assert_eq!(parse_long("4.2"), None);
        assert_eq!(parse_long(""), None);
    }

    #[test]
    fn base64_ignores_line_breaks() {
        assert_eq!(parse_base64("aGVs\nbG8=").unwrap(), b"hello");
        assert!(parse_base64("not base64!").is_none());
    }
}
