// crates/bankws-core/src/camt.rs
// ============================================================================
// Module: Debit Credit Notification
// Description: camt.054.001.02 bank-to-customer notification reader.
// Purpose: Read incoming and outgoing payment notifications downloaded from the bank.
// Dependencies: bigdecimal, thiserror
// ============================================================================

//! ## Overview
//! [`DebitCreditNotification`] reads the entries a bank reports for an
//! account, including batch details and the remittance information of each
//! underlying transaction. Codes and identifiers are read as tokens.
//!
//! Invariants:
//! - Every entry has an amount, a currency and a credit/debit indicator.
//! - Batches keep their transactions in document order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::fields::FieldError;
use crate::fields::optional_token;
use crate::fields::required_token;
use crate::xml::XmlElement;
use crate::xml::XmlError;
use crate::xs::XsDate;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Namespace of camt.054.001.02 documents.
pub const CAMT_054_NS: &str = "urn:iso:std:iso:20022:tech:xsd:camt.054.001.02";

/// File type under which the bank publishes notifications.
pub const CAMT_054_FILE_TYPE: &str = "camt.054.001.02";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Notification reading failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CamtError {
    /// Document is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// Document has the wrong root element.
    #[error("not a debit credit notification: {0}")]
    WrongRoot(String),
    /// Field is missing or invalid.
    #[error(transparent)]
    Field(#[from] FieldError),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Direction of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditDebit {
    /// Money in.
    Credit,
    /// Money out.
    Debit,
}

impl FromStr for CreditDebit {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "CRDT" => Ok(Self::Credit),
            "DBIT" => Ok(Self::Debit),
            other => Err(FieldError::new("CdtDbtInd", format!("unknown indicator {other}"))),
        }
    }
}

/// Batch booked as a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBatch {
    /// Payment information id of the originating instruction.
    pub payment_information_id: Option<String>,
    /// Declared number of transactions.
    pub transaction_count: Option<String>,
}

/// One underlying transaction of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTransaction {
    /// Servicer reference.
    pub servicer_reference: Option<String>,
    /// Instruction id.
    pub instruction_id: Option<String>,
    /// End-to-end id.
    pub end_to_end_id: Option<String>,
    /// Instructed amount.
    pub amount: Option<BigDecimal>,
    /// Currency of the instructed amount.
    pub currency: Option<String>,
    /// Debtor name.
    pub debtor_name: Option<String>,
    /// Creditor name.
    pub creditor_name: Option<String>,
    /// Creditor IBAN.
    pub creditor_account: Option<String>,
    /// Ultimate creditor name.
    pub ultimate_creditor_name: Option<String>,
    /// Unstructured remittance lines.
    pub unstructured: Vec<String>,
    /// Structured creditor reference.
    pub creditor_reference: Option<String>,
    /// Acceptance time as sent.
    pub accepted: Option<String>,
    /// Interbank settlement date.
    pub settlement_date: Option<XsDate>,
}

/// One booked entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
    /// Entry amount.
    pub amount: BigDecimal,
    /// Currency of the amount.
    pub currency: String,
    /// Credit or debit.
    pub direction: CreditDebit,
    /// Entry status, usually `BOOK`.
    pub status: Option<String>,
    /// Booking date.
    pub booking_date: Option<XsDate>,
    /// Servicer reference of the entry.
    pub servicer_reference: Option<String>,
    /// Proprietary bank transaction code.
    pub bank_transaction_code: Option<String>,
    /// Batch details, when the entry groups several transactions.
    pub batch: Option<EntryBatch>,
    /// Underlying transactions.
    pub transactions: Vec<EntryTransaction>,
}

/// Entries reported for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification id.
    pub id: String,
    /// Creation time as sent.
    pub created: Option<String>,
    /// Account IBAN.
    pub account_iban: Option<String>,
    /// Booked entries.
    pub entries: Vec<NotificationEntry>,
}

impl Notification {
    /// Returns credits minus debits over every entry.
    #[must_use]
    pub fn net_amount(&self) -> BigDecimal {
        self.entries.iter().fold(BigDecimal::from(0), |sum, entry| match entry.direction {
            CreditDebit::Credit => sum + &entry.amount,
            CreditDebit::Debit => sum - &entry.amount,
        })
    }
}

/// A camt.054 bank-to-customer debit credit notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitCreditNotification {
    /// Message id.
    pub message_id: String,
    /// Creation time as sent.
    pub created: String,
    /// Message recipient id.
    pub recipient_id: Option<String>,
    /// Additional header information.
    pub additional_info: Option<String>,
    /// Per-account notifications.
    pub notifications: Vec<Notification>,
}

impl DebitCreditNotification {
    /// Parses a notification document.
    ///
    /// # Errors
    ///
    /// Returns [`CamtError`] for malformed XML, a wrong root or missing
    /// mandatory fields.
    pub fn from_xml(xml: &str) -> Result<Self, CamtError> {
        let document = XmlElement::parse(xml)?;
        if !document.is(CAMT_054_NS, "Document") {
            return Err(CamtError::WrongRoot(document.name));
        }
        let body = document
            .child("BkToCstmrDbtCdtNtfctn")
            .ok_or_else(|| CamtError::WrongRoot("Document without BkToCstmrDbtCdtNtfctn".to_string()))?;
        let header = body.child("GrpHdr").ok_or_else(|| FieldError::new("GrpHdr", "missing"))?;
        Ok(Self {
            message_id: required_token(header, "MsgId")?,
            created: required_token(header, "CreDtTm")?,
            recipient_id: header
                .path(&["MsgRcpt", "Id"])
                .and_then(|id| id.descendant("Id"))
                .map(|id| id.text.trim().to_string()),
            additional_info: header.child_text("AddtlInf").map(str::to_string),
            notifications: body
                .children_named("Ntfctn")
                .map(read_notification)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

// ============================================================================
// SECTION: Readers
// ============================================================================

/// Reads one `Ntfctn` block.
fn read_notification(element: &XmlElement) -> Result<Notification, CamtError> {
    Ok(Notification {
        id: required_token(element, "Id")?,
        created: optional_token(element, "CreDtTm"),
        account_iban: element.path(&["Acct", "Id", "IBAN"]).map(|iban| iban.text.trim().to_string()),
        entries: element.children_named("Ntry").map(read_entry).collect::<Result<Vec<_>, _>>()?,
    })
}

/// Reads one `Ntry` block.
fn read_entry(element: &XmlElement) -> Result<NotificationEntry, CamtError> {
    let amount = element.child("Amt").ok_or_else(|| FieldError::new("Amt", "missing"))?;
    let currency = amount
        .attribute("Ccy")
        .map(str::to_string)
        .ok_or_else(|| FieldError::new("Amt", "missing currency"))?;
    let details = element.child("NtryDtls");
    let batch = details.and_then(|node| node.child("Btch")).map(|batch| EntryBatch {
        payment_information_id: optional_token(batch, "PmtInfId"),
        transaction_count: optional_token(batch, "NbOfTxs"),
    });
    let transactions = details
        .map(|node| node.children_named("TxDtls").map(read_transaction).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    Ok(NotificationEntry {
        amount: parse_amount("Amt", &amount.text)?,
        currency,
        direction: required_token(element, "CdtDbtInd")?.parse()?,
        status: optional_token(element, "Sts"),
        booking_date: element
            .path(&["BookgDt", "Dt"])
            .map(|date| parse_date("BookgDt", &date.text))
            .transpose()?,
        servicer_reference: optional_token(element, "AcctSvcrRef"),
        bank_transaction_code: element
            .path(&["BkTxCd", "Prtry", "Cd"])
            .map(|code| code.text.trim().to_string()),
        batch,
        transactions,
    })
}

/// Reads one `TxDtls` block.
fn read_transaction(element: &XmlElement) -> Result<EntryTransaction, CamtError> {
    let references = element.child("Refs");
    let instructed = element.path(&["AmtDtls", "InstdAmt", "Amt"]);
    let parties = element.child("RltdPties");
    let remittance = element.child("RmtInf");
    let party_name = |name: &str| {
        parties
            .and_then(|node| node.path(&[name, "Nm"]))
            .map(|node| node.text.trim().to_string())
    };
    Ok(EntryTransaction {
        servicer_reference: references.and_then(|node| optional_token(node, "AcctSvcrRef")),
        instruction_id: references.and_then(|node| optional_token(node, "InstrId")),
        end_to_end_id: references.and_then(|node| optional_token(node, "EndToEndId")),
        amount: instructed.map(|node| parse_amount("InstdAmt", &node.text)).transpose()?,
        currency: instructed.and_then(|node| node.attribute("Ccy")).map(str::to_string),
        debtor_name: party_name("Dbtr"),
        creditor_name: party_name("Cdtr"),
        creditor_account: parties
            .and_then(|node| node.path(&["CdtrAcct", "Id", "IBAN"]))
            .map(|iban| iban.text.trim().to_string()),
        ultimate_creditor_name: party_name("UltmtCdtr"),
        unstructured: remittance
            .map(|node| node.children_named("Ustrd").map(|line| line.text.clone()).collect())
            .unwrap_or_default(),
        creditor_reference: remittance
            .and_then(|node| node.path(&["Strd", "CdtrRefInf", "Ref"]))
            .map(|reference| reference.text.trim().to_string()),
        accepted: element
            .path(&["RltdDts", "AccptncDtTm"])
            .map(|time| time.text.trim().to_string()),
        settlement_date: element
            .path(&["RltdDts", "IntrBkSttlmDt"])
            .map(|date| parse_date("IntrBkSttlmDt", &date.text))
            .transpose()?,
    })
}

/// Parses a decimal amount.
fn parse_amount(field: &'static str, text: &str) -> Result<BigDecimal, FieldError> {
    BigDecimal::from_str(text.trim()).map_err(|_| FieldError::new(field, "not a decimal amount"))
}

/// Parses an `xs:date`.
fn parse_date(field: &'static str, text: &str) -> Result<XsDate, FieldError> {
    XsDate::parse(text).map_err(|err| FieldError::new(field, err.to_string()))
}
