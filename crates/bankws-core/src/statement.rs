// crates/bankws-core/src/statement.rs
// ============================================================================
// Module: Transaction List Records
// Description: Parser for the fixed-width answer to a `TP1 3ST` query.
// Purpose: Turn the bank's account statement lines into typed records.
// Dependencies: bigdecimal, thiserror, time
// ============================================================================

//! ## Overview
//! A transaction query is answered with one record per line. Character 0
//! is the material identifier and characters 1..3 the record type:
//!
//! | type | record |
//! |------|--------|
//! | `00` | basic record: account and customer data |
//! | `10` | transaction |
//! | `11` | extra information of the preceding transaction |
//! | `40` | balance |
//! | `70` | information; its presence means the query had problems |
//!
//! Other record types are skipped. Amounts are exact decimals with two
//! fraction digits; dates are `YYMMDD` in the 2000s.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;
use time::Date;
use time::Month;
use time::PrimitiveDateTime;
use time::Time;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Statement parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// A field holds an unparsable value.
    #[error("line {line}: invalid {field}: {value:?}")]
    InvalidField {
        /// One-based line number.
        line: usize,
        /// Field name.
        field: &'static str,
        /// Offending text.
        value: String,
    },
    /// An extra record appears before any transaction.
    #[error("line {0}: extra record without a transaction")]
    OrphanExtraRecord(usize),
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Basic record describing the queried account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicRecord {
    /// Account number in machine format.
    pub account: String,
    /// First day of the queried range.
    pub query_start: Option<Date>,
    /// Last day of the queried range.
    pub query_end: Date,
    /// When the bank generated the answer.
    pub generated_at: PrimitiveDateTime,
    /// Customer identifier.
    pub customer_id: String,
    /// ISO currency code of the account.
    pub currency: String,
    /// Account name.
    pub account_name: String,
    /// Credit limit as printed.
    pub account_limit: String,
    /// Account owner.
    pub account_owner: String,
    /// Bank name.
    pub bank: String,
}

/// Kind of booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMarker {
    /// `1`: deposit.
    Deposit,
    /// `2`: withdrawal.
    Withdrawal,
    /// `3`: correction of a deposit.
    DepositCorrection,
    /// `4`: correction of a withdrawal.
    WithdrawalCorrection,
    /// Any other marker.
    Unknown(char),
}

impl TransactionMarker {
    /// Maps a marker character.
    #[must_use]
    pub const fn from_char(marker: char) -> Self {
        match marker {
            '1' => Self::Deposit,
            '2' => Self::Withdrawal,
            '3' => Self::DepositCorrection,
            '4' => Self::WithdrawalCorrection,
            other => Self::Unknown(other),
        }
    }
}

/// One booked transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Booking time of day.
    pub booking_time: Option<Time>,
    /// Bank archive identifier.
    pub archive_id: String,
    /// Registration date.
    pub registration_date: Option<Date>,
    /// Value date.
    pub value_date: Option<Date>,
    /// Payment date.
    pub payment_date: Option<Date>,
    /// Booking kind.
    pub marker: TransactionMarker,
    /// Booking code.
    pub code: String,
    /// Booking description.
    pub description: String,
    /// Signed amount.
    pub amount: BigDecimal,
    /// Receipt code.
    pub receipt_code: char,
    /// Transfer method.
    pub transfer_method: char,
    /// Payer or payee name.
    pub name: Option<String>,
    /// Source of the name.
    pub name_source: char,
    /// Counterparty account.
    pub counterparty_account: String,
    /// Counterparty account changed in the bank's systems.
    pub account_changed: bool,
    /// Reference number.
    pub reference: String,
    /// Form number.
    pub form_number: String,
    /// Level identifier.
    pub level_id: char,
}

/// Extra information attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraInfo {
    /// `00`: free-form message lines.
    FreeMessage(Vec<String>),
    /// `01`: number of aggregated transactions.
    TransactionCount(u32),
    /// `02`: invoice details.
    Invoice {
        /// Customer number.
        customer_number: String,
        /// Invoice number.
        invoice_number: String,
        /// Invoice date as printed.
        invoice_date: String,
    },
    /// `03`: card payment.
    Card {
        /// Masked card number.
        card_number: String,
        /// Shop archive reference.
        shop_reference: String,
    },
    /// `04`: correction of an earlier booking.
    Correction {
        /// Archive identifier of the corrected booking.
        original_archive_id: String,
    },
    /// `05`: foreign currency details.
    Currency {
        /// Signed equivalent amount.
        amount: BigDecimal,
        /// ISO currency code.
        currency: String,
        /// Exchange rate.
        exchange_rate: BigDecimal,
        /// Rate reference.
        rate_reference: String,
    },
    /// `06`: originator information.
    Originator {
        /// First line.
        first: String,
        /// Second line.
        second: String,
    },
    /// `07`: additional lines from the bank.
    BankMessage(Vec<String>),
    /// `08`: payment subject.
    PaymentSubject {
        /// Subject code.
        code: String,
        /// Subject description.
        description: String,
    },
    /// `09`: name specifier.
    NameSpecifier(String),
    /// Unrecognized information type.
    Other {
        /// Information type.
        information_type: String,
        /// Remaining record text.
        raw: String,
    },
}

/// Transaction with its extra records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Booking.
    pub record: TransactionRecord,
    /// Attached extra information in order.
    pub extras: Vec<ExtraInfo>,
}

/// Account balance at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    /// Balance date.
    pub date: Date,
    /// Booked balance.
    pub balance: BigDecimal,
    /// Available balance.
    pub available: BigDecimal,
}

/// Problem report from the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationRecord {
    /// Bank identifier.
    pub bank_id: String,
    /// Message lines.
    pub messages: Vec<String>,
}

/// Parsed transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionList {
    /// Basic record.
    pub basic: Option<BasicRecord>,
    /// Transactions in order.
    pub transactions: Vec<Transaction>,
    /// Balance record.
    pub balance: Option<BalanceRecord>,
    /// Information records.
    pub information: Vec<InformationRecord>,
}

impl TransactionList {
    /// Parses the statement text.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError`] for unparsable fields or orphan extra records.
    pub fn parse(text: &str) -> Result<Self, StatementError> {
        let mut list = Self::default();
        for (index, raw_line) in text.lines().enumerate() {
            let line = Line::new(index + 1, raw_line);
            match line.slice(1, 3).as_str() {
                "00" => list.basic = Some(parse_basic(&line)?),
                "10" => list.transactions.push(Transaction {
                    record: parse_transaction(&line)?,
                    extras: Vec::new(),
                }),
                "11" => {
                    let extra = parse_extra(&line)?;
                    let transaction = list
                        .transactions
                        .last_mut()
                        .ok_or(StatementError::OrphanExtraRecord(line.number))?;
                    transaction.extras.push(extra);
                }
                "40" => list.balance = Some(parse_balance(&line)?),
                "70" => list.information.push(parse_information(&line)?),
                _ => {}
            }
        }
        Ok(list)
    }

    /// Returns true when the bank reported no problems.
    #[must_use]
    pub fn is_problem_free(&self) -> bool {
        self.information.is_empty()
    }
}

// ============================================================================
// SECTION: Record Parsers
// ============================================================================

/// Parses a `00` record.
fn parse_basic(line: &Line) -> Result<BasicRecord, StatementError> {
    let start = line.slice(26, 32);
    Ok(BasicRecord {
        account: line.trimmed(9, 23),
        query_start: if is_blank_date(&start) {
            None
        } else {
            Some(line.date("query start date", &start)?)
        },
        query_end: line.date("query end date", &line.slice(32, 38))?,
        generated_at: line.date_time("generation time", &line.slice(38, 48))?,
        customer_id: line.trimmed(48, 65),
        currency: line.trimmed(96, 99),
        account_name: line.trimmed(99, 129),
        account_limit: line.trimmed(129, 147),
        account_owner: line.trimmed(147, 182),
        bank: line.trimmed(182, 222),
    })
}

/// Parses a `10` record.
fn parse_transaction(line: &Line) -> Result<TransactionRecord, StatementError> {
    let name = line.trimmed(108, 143);
    Ok(TransactionRecord {
        booking_time: line.time("booking time", &line.slice(6, 12))?,
        archive_id: line.trimmed(12, 30),
        registration_date: line.optional_date("registration date", &line.slice(30, 36))?,
        value_date: line.optional_date("value date", &line.slice(36, 42))?,
        payment_date: line.optional_date("payment date", &line.slice(42, 48))?,
        marker: TransactionMarker::from_char(line.char_at(48)),
        code: line.trimmed(49, 52),
        description: line.trimmed(52, 87),
        amount: line.amount("amount", line.char_at(87), &line.slice(88, 106))?,
        receipt_code: line.char_at(106),
        transfer_method: line.char_at(107),
        name: if name.is_empty() { None } else { Some(name) },
        name_source: line.char_at(143),
        counterparty_account: line.trimmed(144, 158),
        account_changed: line.char_at(158) != ' ',
        reference: line.trimmed(159, 179),
        form_number: line.trimmed(179, 187),
        level_id: line.char_at(187),
    })
}

/// Parses an `11` record.
fn parse_extra(line: &Line) -> Result<ExtraInfo, StatementError> {
    let information_type = line.slice(6, 8);
    let extra = match information_type.as_str() {
        "00" => ExtraInfo::FreeMessage(line.chunks(8, 35)?),
        "01" => {
            let raw = line.slice(8, 16);
            let count = raw.trim().parse::<u32>().map_err(|_| line.invalid("transaction count", &raw))?;
            ExtraInfo::TransactionCount(count)
        }
        "02" => ExtraInfo::Invoice {
            customer_number: line.trimmed(8, 18),
            invoice_number: line.trimmed(19, 34),
            invoice_date: line.trimmed(35, 41),
        },
        "03" => ExtraInfo::Card {
            card_number: line.trimmed(8, 27),
            shop_reference: line.trimmed(28, 42),
        },
        "04" => ExtraInfo::Correction {
            original_archive_id: line.trimmed(8, 26),
        },
        "05" => ExtraInfo::Currency {
            amount: line.amount("currency amount", line.char_at(8), &line.slice(9, 27))?,
            currency: line.trimmed(28, 31),
            exchange_rate: line.exchange_rate(&line.slice(32, 43))?,
            rate_reference: line.trimmed(43, 49),
        },
        "06" => ExtraInfo::Originator {
            first: line.trimmed(8, 43),
            second: line.trimmed(43, 78),
        },
        "07" => ExtraInfo::BankMessage(line.chunks(8, 35)?),
        "08" => ExtraInfo::PaymentSubject {
            code: line.trimmed(8, 11),
            description: line.trimmed(12, 43),
        },
        "09" => ExtraInfo::NameSpecifier(line.trimmed(8, 43)),
        _ => ExtraInfo::Other {
            raw: line.slice(8, line.len()),
            information_type,
        },
    };
    Ok(extra)
}

/// Parses a `40` record.
fn parse_balance(line: &Line) -> Result<BalanceRecord, StatementError> {
    Ok(BalanceRecord {
        date: line.date("balance date", &line.slice(6, 12))?,
        balance: line.amount("balance", line.char_at(12), &line.slice(13, 31))?,
        available: line.amount("available balance", line.char_at(31), &line.slice(32, 50))?,
    })
}

/// Parses a `70` record.
fn parse_information(line: &Line) -> Result<InformationRecord, StatementError> {
    Ok(InformationRecord {
        bank_id: line.trimmed(6, 9),
        messages: line.chunks(9, 80)?,
    })
}

/// Returns true for an empty or all-zero `YYMMDD` field.
fn is_blank_date(text: &str) -> bool {
    text.trim().is_empty() || text.bytes().all(|byte| byte == b'0')
}

// ============================================================================
// SECTION: Line Access
// ============================================================================

/// One record line addressed by character position.
struct Line {
    /// One-based line number.
    number: usize,
    /// Characters of the line.
    chars: Vec<char>,
}

impl Line {
    /// Wraps a line.
    fn new(number: usize, text: &str) -> Self {
        Self {
            number,
            chars: text.chars().collect(),
        }
    }

    /// Returns the line length in characters.
    fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns characters `[start, end)`, truncated at the line end.
    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        if start >= end {
            return String::new();
        }
        self.chars[start..end].iter().collect()
    }

    /// Returns a trimmed slice.
    fn trimmed(&self, start: usize, end: usize) -> String {
        self.slice(start, end).trim().to_string()
    }

    /// Returns one character, space when past the line end.
    fn char_at(&self, index: usize) -> char {
        self.chars.get(index).copied().unwrap_or(' ')
    }

    /// Builds an invalid-field error.
    fn invalid(&self, field: &'static str, value: &str) -> StatementError {
        StatementError::InvalidField {
            line: self.number,
            field,
            value: value.to_string(),
        }
    }

    /// Reads the record length from characters 3..6.
    fn record_length(&self) -> Result<usize, StatementError> {
        let raw = self.slice(3, 6);
        raw.trim().parse::<usize>().map_err(|_| self.invalid("record length", &raw))
    }

    /// Splits the record body into fixed-size trimmed chunks.
    fn chunks(&self, offset: usize, size: usize) -> Result<Vec<String>, StatementError> {
        let count = self.record_length()?.saturating_sub(offset) / size;
        Ok((0..count)
            .map(|index| self.trimmed(offset + index * size, offset + (index + 1) * size))
            .collect())
    }

    /// Parses a `YYMMDD` date.
    fn date(&self, field: &'static str, text: &str) -> Result<Date, StatementError> {
        let digits = two_digit_groups(text, 3).ok_or_else(|| self.invalid(field, text))?;
        build_date(digits[0], digits[1], digits[2]).ok_or_else(|| self.invalid(field, text))
    }

    /// Parses a `YYMMDD` date that may be blank.
    fn optional_date(&self, field: &'static str, text: &str) -> Result<Option<Date>, StatementError> {
        if is_blank_date(text) {
            return Ok(None);
        }
        self.date(field, text).map(Some)
    }

    /// Parses a `YYMMDDHHMM` timestamp.
    fn date_time(&self, field: &'static str, text: &str) -> Result<PrimitiveDateTime, StatementError> {
        let digits = two_digit_groups(text, 5).ok_or_else(|| self.invalid(field, text))?;
        let date =
            build_date(digits[0], digits[1], digits[2]).ok_or_else(|| self.invalid(field, text))?;
        let time = Time::from_hms(digits[3], digits[4], 0).map_err(|_| self.invalid(field, text))?;
        Ok(PrimitiveDateTime::new(date, time))
    }

    /// Parses an `HHMMSS` time that may be blank.
    fn time(&self, field: &'static str, text: &str) -> Result<Option<Time>, StatementError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let digits = two_digit_groups(text, 3).ok_or_else(|| self.invalid(field, text))?;
        Time::from_hms(digits[0], digits[1], digits[2])
            .map(Some)
            .map_err(|_| self.invalid(field, text))
    }

    /// Parses a signed amount with two implied decimals.
    fn amount(&self, field: &'static str, sign: char, digits: &str) -> Result<BigDecimal, StatementError> {
        let trimmed = digits.trim();
        if trimmed.len() < 3 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(self.invalid(field, digits));
        }
        let negative = match sign {
            '+' | ' ' => false,
            '-' => true,
            _ => return Err(self.invalid(field, &format!("{sign}{digits}"))),
        };
        let (whole, cents) = trimmed.split_at(trimmed.len() - 2);
        let whole = whole.trim_start_matches('0');
        let whole = if whole.is_empty() { "0" } else { whole };
        let text = if negative { format!("-{whole}.{cents}") } else { format!("{whole}.{cents}") };
        BigDecimal::from_str(&text).map_err(|_| self.invalid(field, digits))
    }

    /// Parses an exchange rate with four integer and seven fraction digits.
    fn exchange_rate(&self, digits: &str) -> Result<BigDecimal, StatementError> {
        if digits.len() != 11 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(self.invalid("exchange rate", digits));
        }
        let (whole, fraction) = digits.split_at(4);
        let whole = whole.trim_start_matches('0');
        let whole = if whole.is_empty() { "0" } else { whole };
        BigDecimal::from_str(&format!("{whole}.{fraction}"))
            .map_err(|_| self.invalid("exchange rate", digits))
    }
}

/// Splits `count` two-digit groups out of a digit string.
fn two_digit_groups(text: &str, count: usize) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() != count * 2 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(bytes.chunks(2).map(|pair| (pair[0] - b'0') * 10 + (pair[1] - b'0')).collect())
}

/// Builds a date in the 2000s.
fn build_date(year: u8, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(2000 + i32::from(year), month, day).ok()
}
