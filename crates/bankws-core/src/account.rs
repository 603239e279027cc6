// crates/bankws-core/src/account.rs
// ============================================================================
// Module: Finnish Account Numbers
// Description: IBAN and BBAN validation and normalization.
// Purpose: Turn user-entered account numbers into machine format.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Finnish domestic account numbers (BBAN) consist of a six-digit branch
//! part and an account part of two to eight digits. The machine format pads
//! the account part to eight digits: after the first digit for branches
//! starting with `4` or `5`, in front otherwise. The final digit is a Luhn
//! mod-10 check over all fourteen digits.
//!
//! Finnish IBANs are `FI` + two check digits + the 14-digit machine format.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of a Finnish IBAN.
const FI_IBAN_LENGTH: usize = 18;

/// Numeric value of the letters `FI` per ISO 13616.
const FI_COUNTRY_DIGITS: &str = "1518";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Account number failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// IBAN structure or check digits are wrong.
    #[error("invalid iban: {0}")]
    InvalidIban(String),
    /// Number does not match a supported Finnish bank layout.
    #[error("unsupported account number: {0}")]
    Unsupported(String),
    /// Luhn check digit does not match.
    #[error("invalid account number: check digit mismatch")]
    CheckDigit,
}

// ============================================================================
// SECTION: Account Number
// ============================================================================

/// Normalized Finnish account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountNumber {
    /// Six-digit branch part.
    branch: String,
    /// Eight-digit zero-filled account part.
    account: String,
}

impl AccountNumber {
    /// Parses a Finnish BBAN (`123456-785`) or IBAN (`FI21 1234 5600 0007 85`).
    ///
    /// # Errors
    ///
    /// Returns [`AccountError`] for invalid IBANs, unsupported layouts or
    /// failing check digits.
    pub fn parse(input: &str) -> Result<Self, AccountError> {
        let compact: String = input.chars().filter(|ch| !ch.is_whitespace()).collect();
        let domestic = if compact.starts_with("FI") {
            validate_iban(&compact)?;
            compact.get(4..).unwrap_or_default().to_string()
        } else {
            compact
        };
        let (branch, raw_account) = split_bban(&domestic)
            .ok_or_else(|| AccountError::Unsupported(input.trim().to_string()))?;
        let account = zero_fill(branch, raw_account);
        let candidate = format!("{branch}{account}");
        if !luhn_valid(&candidate) {
            return Err(AccountError::CheckDigit);
        }
        Ok(Self {
            branch: branch.to_string(),
            account,
        })
    }

    /// Returns the branch part.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the zero-filled account part.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Returns the 14-digit machine format.
    #[must_use]
    pub fn machine_format(&self) -> String {
        format!("{}{}", self.branch, self.account)
    }

    /// Returns the Finnish IBAN for this account.
    #[must_use]
    pub fn to_iban(&self) -> String {
        let bban = self.machine_format();
        let check = 98 - mod97(&format!("{bban}{FI_COUNTRY_DIGITS}00"));
        format!("FI{check:02}{bban}")
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.branch, self.account)
    }
}

impl FromStr for AccountNumber {
    type Err = AccountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Validates a Finnish IBAN (18 characters, mod-97 check digits).
///
/// # Errors
///
/// Returns [`AccountError::InvalidIban`] when structure or check digits fail.
pub fn validate_iban(iban: &str) -> Result<(), AccountError> {
    if !iban.is_ascii() {
        return Err(AccountError::InvalidIban("iban must be ascii".to_string()));
    }
    if iban.len() != FI_IBAN_LENGTH || !iban.starts_with("FI") {
        return Err(AccountError::InvalidIban("finnish iban has 18 characters".to_string()));
    }
    let digits = iban
        .get(4..)
        .ok_or_else(|| AccountError::InvalidIban("finnish iban has 18 characters".to_string()))?;
    let number = format!("{digits}{FI_COUNTRY_DIGITS}00");
    if !number.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(AccountError::InvalidIban("iban must be numeric after FI".to_string()));
    }
    let expected = format!("{:02}", 98 - mod97(&number));
    if iban.get(2..4) != Some(expected.as_str()) {
        return Err(AccountError::InvalidIban("check digits mismatch".to_string()));
    }
    Ok(())
}

/// Returns true when the digit string passes the Luhn mod-10 check.
#[must_use]
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (position, ch) in digits.chars().rev().enumerate() {
        let Some(digit) = ch.to_digit(10) else {
            return false;
        };
        if position % 2 == 1 {
            let doubled = digit * 2;
            sum += doubled / 10 + doubled % 10;
        } else {
            sum += digit;
        }
    }
    sum % 10 == 0
}

/// Computes a decimal string modulo 97 digit by digit.
fn mod97(digits: &str) -> u32 {
    digits.chars().filter_map(|ch| ch.to_digit(10)).fold(0, |acc, digit| (acc * 10 + digit) % 97)
}

/// Splits a BBAN into branch and account parts.
fn split_bban(text: &str) -> Option<(&str, &str)> {
    if text.len() < 8 || !text.is_ascii() {
        return None;
    }
    let (branch, rest) = text.split_at(6);
    if !branch.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let bytes = branch.as_bytes();
    let supported = match bytes[0] {
        b'3' => bytes[1] != b'2' && bytes[1] != b'5',
        b'7' | b'9' => false,
        _ => true,
    };
    if !supported {
        return None;
    }
    let account = rest.strip_prefix('-').unwrap_or(rest);
    if !(2..=8).contains(&account.len()) || !account.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some((branch, account))
}

/// Zero-fills the account part to eight digits per bank group.
fn zero_fill(branch: &str, account: &str) -> String {
    if branch.starts_with('4') || branch.starts_with('5') {
        let (head, tail) = account.split_at(1);
        format!("{head}{tail:0>7}")
    } else {
        format!("{account:0>8}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn parses_short_bban_with_dash() {
        let account = AccountNumber::parse("123456-785").unwrap();
        assert_eq!(account.branch(), "123456");
        assert_eq!(account.account(), "00000785");
        assert_eq!(account.machine_format(), "12345600000785");
    }

    #[test]
    fn savings_bank_group_fills_after_first_digit() {
        let account = AccountNumber::parse("423456-781").unwrap();
        assert_eq!(account.account(), "70000081");
    }

    #[test]
    fn parses_iban_with_spaces() {
        let account = AccountNumber::parse("FI21 1234 5600 0007 85").unwrap();
        assert_eq!(account.machine_format(), "12345600000785");
        assert_eq!(account.to_iban(), "FI2112345600000785");
    }

    #[test]
    fn iban_check_digits_are_verified() {
        assert!(validate_iban("FI2112345600000785").is_ok());
        assert!(matches!(validate_iban("FI2212345600000785"), Err(AccountError::InvalidIban(_))));
        assert!(validate_iban("FI21123456").is_err());
    }

    #[test]
    fn multibyte_iban_input_is_rejected() {
        let input = "FI1\u{e9}1234567890123";
        assert_eq!(input.len(), FI_IBAN_LENGTH);
        assert!(matches!(validate_iban(input), Err(AccountError::InvalidIban(_))));
        assert!(matches!(AccountNumber::parse(input), Err(AccountError::InvalidIban(_))));
        assert!(AccountNumber::parse("12345\u{e9}-785").is_err());
    }

    #[test]
    fn unsupported_branches_are_rejected() {
        assert!(matches!(AccountNumber::parse("723456-785"), Err(AccountError::Unsupported(_))));
        assert!(matches!(AccountNumber::parse("325456-785"), Err(AccountError::Unsupported(_))));
        assert!(matches!(AccountNumber::parse("123456-7"), Err(AccountError::Unsupported(_))));
    }

    #[test]
    fn wrong_check_digit_is_rejected() {
        assert_eq!(AccountNumber::parse("123456-786"), Err(AccountError::CheckDigit));
    }

    #[test]
    fn luhn_examples() {
        assert!(luhn_valid("79927398713"));
        assert!(!luhn_valid("79927398710"));
        assert!(!luhn_valid("12a"));
        assert!(!luhn_valid(""));
    }
}
