// crates/bankws-core/src/sepa.rs
// ============================================================================
// Module: SEPA Payment Documents
// Description: pain.001.001.02 credit transfer builder and pain.002.001.02 reader.
// Purpose: Produce upload content for SEPA payments and read their status reports.
// Dependencies: bigdecimal, thiserror, time
// ============================================================================

//! ## Overview
//! [`PaymentInitiation`] renders a customer credit transfer initiation with
//! group header totals computed from the contained transfers.
//! [`PaymentStatusReport`] reads the bank's status report for an earlier
//! initiation.
//!
//! Invariants:
//! - Amounts are positive and carry at most two fraction digits.
//! - A party has at most [`MAX_ADDRESS_LINES`] address lines.
//! - Every payment instruction holds at least one transfer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;
use time::Date;

use crate::account::AccountError;
use crate::account::validate_iban;
use crate::fields::FieldError;
use crate::fields::optional_token;
use crate::fields::required_token;
use crate::xml::XmlElement;
use crate::xml::XmlError;
use crate::xs::XsDate;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Namespace of the credit transfer initiation.
pub const PAIN_001_NS: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.02";

/// Namespace of the payment status report.
pub const PAIN_002_NS: &str = "urn:iso:std:iso:20022:tech:xsd:pain.002.001.02";

/// Upload file type for SEPA payments.
pub const SEPA_FILE_TYPE: &str = "pain.001.001.02";

/// Maximum postal address lines per party.
pub const MAX_ADDRESS_LINES: usize = 5;

/// Group status reported for a rejected initiation.
const STATUS_REJECTED: &str = "RJCT";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// SEPA document failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SepaError {
    /// Party has more address lines than allowed.
    #[error("party {party} has {count} address lines, at most 5 allowed")]
    TooManyAddressLines {
        /// Party name.
        party: String,
        /// Lines supplied.
        count: usize,
    },
    /// Initiation or instruction has nothing to pay.
    #[error("{0} is empty")]
    Empty(&'static str),
    /// Amount is not positive or has more than two decimals.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// Account IBAN is invalid.
    #[error(transparent)]
    Account(#[from] AccountError),
    /// Document could not be read or written.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// Report has the wrong root element.
    #[error("not a payment status report: {0}")]
    WrongRoot(String),
    /// Report field is missing or invalid.
    #[error(transparent)]
    Field(#[from] FieldError),
}

// ============================================================================
// SECTION: Codes
// ============================================================================

/// Grouping of transfers in the initiation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// `MIXD`: mixed grouping.
    #[default]
    Mixed,
    /// `GRPD`: grouped.
    Grouped,
    /// `SNGL`: single.
    Single,
}

impl Grouping {
    /// Returns the ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Mixed => "MIXD",
            Self::Grouped => "GRPD",
            Self::Single => "SNGL",
        }
    }
}

/// Payment method of an instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    /// `TRF`: credit transfer.
    #[default]
    Transfer,
    /// `CHK`: cheque.
    Cheque,
    /// `TRA`: transfer advice.
    TransferAdvice,
}

impl PaymentMethod {
    /// Returns the ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Transfer => "TRF",
            Self::Cheque => "CHK",
            Self::TransferAdvice => "TRA",
        }
    }
}

/// Service level of an instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceLevel {
    /// `SEPA`.
    #[default]
    Sepa,
    /// `SDVA`: same day value.
    SameDayValue,
    /// `PRPT`: priority.
    Priority,
}

impl ServiceLevel {
    /// Returns the ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Sepa => "SEPA",
            Self::SameDayValue => "SDVA",
            Self::Priority => "PRPT",
        }
    }
}

/// Priority of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionPriority {
    /// `NORM`.
    Normal,
    /// `HIGH`.
    High,
}

impl InstructionPriority {
    /// Returns the ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Normal => "NORM",
            Self::High => "HIGH",
        }
    }
}

// ============================================================================
// SECTION: Initiation Model
// ============================================================================

/// Named party with optional postal address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    /// Party name.
    pub name: String,
    /// Free-form address lines.
    pub address_lines: Vec<String>,
    /// ISO country code.
    pub country: Option<String>,
}

impl Party {
    /// Creates a party without address.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address_lines: Vec::new(),
            country: None,
        }
    }

    /// Adds an address line.
    #[must_use]
    pub fn with_address_line(mut self, line: impl Into<String>) -> Self {
        self.address_lines.push(line.into());
        self
    }

    /// Sets the country code.
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Renders the party under `name`.
    fn to_element(&self, name: &str) -> Result<XmlElement, SepaError> {
        if self.address_lines.len() > MAX_ADDRESS_LINES {
            return Err(SepaError::TooManyAddressLines {
                party: self.name.clone(),
                count: self.address_lines.len(),
            });
        }
        let mut party = XmlElement::new(Some(PAIN_001_NS), name);
        party.push_leaf("Nm", self.name.as_str());
        if !self.address_lines.is_empty() || self.country.is_some() {
            let mut address = XmlElement::new(Some(PAIN_001_NS), "PstlAdr");
            for line in &self.address_lines {
                address.push_leaf("AdrLine", line.as_str());
            }
            address.push_optional_leaf("Ctry", self.country.as_deref());
            party.push(address);
        }
        Ok(party)
    }
}

/// One credit transfer to a creditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditTransfer {
    /// Instruction id for the debtor's bank.
    pub instruction_id: Option<String>,
    /// End-to-end id carried to the creditor.
    pub end_to_end_id: String,
    /// Transfer priority.
    pub priority: Option<InstructionPriority>,
    /// Instructed amount.
    pub amount: BigDecimal,
    /// Currency of the amount.
    pub currency: String,
    /// Creditor bank BIC.
    pub creditor_bic: String,
    /// Creditor.
    pub creditor: Party,
    /// Creditor IBAN.
    pub creditor_iban: String,
    /// Purpose code.
    pub purpose: Option<String>,
    /// Unstructured remittance information.
    pub remittance: Option<String>,
}

/// Payment instruction from one debtor account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstruction {
    /// Instruction id.
    pub id: Option<String>,
    /// Payment method.
    pub method: PaymentMethod,
    /// Service level.
    pub service_level: ServiceLevel,
    /// Requested execution date.
    pub execution_date: Date,
    /// Debtor.
    pub debtor: Party,
    /// Debtor identifier assigned by the bank.
    pub debtor_id: String,
    /// Debtor IBAN.
    pub debtor_iban: String,
    /// Debtor account currency.
    pub debtor_currency: String,
    /// Debtor bank BIC.
    pub debtor_bic: String,
    /// Ultimate debtor name.
    pub ultimate_debtor: Option<String>,
    /// Charge bearer code.
    pub charge_bearer: String,
    /// Transfers.
    pub transfers: Vec<CreditTransfer>,
}

/// Customer credit transfer initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInitiation {
    /// Message id.
    pub message_id: String,
    /// Creation time.
    pub created: XsDateTime,
    /// Grouping.
    pub grouping: Grouping,
    /// Initiating party.
    pub initiating_party: Party,
    /// Payment instructions.
    pub payments: Vec<PaymentInstruction>,
}

impl PaymentInitiation {
    /// Returns the number of transfers across all instructions.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.payments.iter().map(|payment| payment.transfers.len()).sum()
    }

    /// Returns the sum of all instructed amounts.
    #[must_use]
    pub fn control_sum(&self) -> BigDecimal {
        self.payments
            .iter()
            .flat_map(|payment| payment.transfers.iter())
            .fold(BigDecimal::from(0), |sum, transfer| sum + &transfer.amount)
    }

    /// Builds the document tree.
    ///
    /// # Errors
    ///
    /// Returns [`SepaError`] for empty payments, bad amounts, invalid IBANs
    /// or too many address lines.
    pub fn to_element(&self) -> Result<XmlElement, SepaError> {
        if self.payments.is_empty() {
            return Err(SepaError::Empty("payment initiation"));
        }
        if self.payments.iter().any(|payment| payment.transfers.is_empty()) {
            return Err(SepaError::Empty("payment instruction"));
        }
        let mut message = XmlElement::new(Some(PAIN_001_NS), "pain.001.001.02");
        message.push(self.group_header()?);
        for payment in &self.payments {
            message.push(payment_element(payment)?);
        }
        let mut document = XmlElement::new(Some(PAIN_001_NS), "Document");
        document.push(message);
        Ok(document)
    }

    /// Serializes the document.
    ///
    /// # Errors
    ///
    /// Returns [`SepaError`] when the model is invalid or writing fails.
    pub fn to_xml(&self) -> Result<String, SepaError> {
        Ok(self.to_element()?.to_document()?)
    }

    /// Builds the group header.
    fn group_header(&self) -> Result<XmlElement, SepaError> {
        let mut header = XmlElement::new(Some(PAIN_001_NS), "GrpHdr");
        header.push_leaf("MsgId", self.message_id.as_str());
        header.push_leaf("CreDtTm", self.created.as_str());
        header.push_leaf("NbOfTxs", self.transaction_count().to_string());
        header.push_leaf("CtrlSum", format_amount(&self.control_sum())?);
        header.push_leaf("Grpg", self.grouping.code());
        header.push(self.initiating_party.to_element("InitgPty")?);
        Ok(header)
    }
}

/// Renders one payment instruction.
fn payment_element(payment: &PaymentInstruction) -> Result<XmlElement, SepaError> {
    validate_iban(&payment.debtor_iban)?;
    let mut element = XmlElement::new(Some(PAIN_001_NS), "PmtInf");
    element.push_optional_leaf("PmtInfId", payment.id.as_deref());
    element.push_leaf("PmtMtd", payment.method.code());
    element.push(nested(&["PmtTpInf", "SvcLvl", "Cd"], payment.service_level.code()));
    element.push_leaf("ReqdExctnDt", XsDate::from_date(payment.execution_date).as_str());
    let mut debtor = payment.debtor.to_element("Dbtr")?;
    debtor.push(nested(&["Id", "OrgId", "BkPtyId"], &payment.debtor_id));
    element.push(debtor);
    let mut account = nested(&["DbtrAcct", "Id", "IBAN"], &payment.debtor_iban);
    account.push_leaf("Ccy", payment.debtor_currency.as_str());
    element.push(account);
    element.push(nested(&["DbtrAgt", "FinInstnId", "BIC"], &payment.debtor_bic));
    if let Some(ultimate) = &payment.ultimate_debtor {
        element.push(nested(&["UltmtDbtr", "Nm"], ultimate));
    }
    element.push_leaf("ChrgBr", payment.charge_bearer.as_str());
    for transfer in &payment.transfers {
        element.push(transfer_element(transfer)?);
    }
    Ok(element)
}

/// Renders one credit transfer.
fn transfer_element(transfer: &CreditTransfer) -> Result<XmlElement, SepaError> {
    validate_iban(&transfer.creditor_iban)?;
    let mut element = XmlElement::new(Some(PAIN_001_NS), "CdtTrfTxInf");
    let mut payment_id = XmlElement::new(Some(PAIN_001_NS), "PmtId");
    payment_id.push_optional_leaf("InstrId", transfer.instruction_id.as_deref());
    payment_id.push_leaf("EndToEndId", transfer.end_to_end_id.as_str());
    element.push(payment_id);
    if let Some(priority) = transfer.priority {
        element.push(nested(&["PmtTpInf", "InstrPrty"], priority.code()));
    }
    let amount = XmlElement::new(Some(PAIN_001_NS), "InstdAmt")
        .with_attribute("Ccy", transfer.currency.as_str())
        .with_text(format_amount(&transfer.amount)?);
    let mut amount_wrapper = XmlElement::new(Some(PAIN_001_NS), "Amt");
    amount_wrapper.push(amount);
    element.push(amount_wrapper);
    element.push(nested(&["CdtrAgt", "FinInstnId", "BIC"], &transfer.creditor_bic));
    element.push(transfer.creditor.to_element("Cdtr")?);
    element.push(nested(&["CdtrAcct", "Id", "IBAN"], &transfer.creditor_iban));
    if let Some(purpose) = &transfer.purpose {
        element.push(nested(&["Purp", "Cd"], purpose));
    }
    if let Some(remittance) = &transfer.remittance {
        element.push(nested(&["RmtInf", "Ustrd"], remittance));
    }
    Ok(element)
}

/// Builds a chain of single-child elements ending in a text leaf.
fn nested(names: &[&str], text: &str) -> XmlElement {
    names
        .iter()
        .rev()
        .fold(None, |inner: Option<XmlElement>, name| {
            let mut element = XmlElement::new(Some(PAIN_001_NS), *name);
            match inner {
                Some(child) => element.push(child),
                None => element.text = text.to_string(),
            }
            Some(element)
        })
        .unwrap_or_default()
}

/// Formats a positive amount with exactly two decimals.
fn format_amount(amount: &BigDecimal) -> Result<String, SepaError> {
    let scaled = amount.with_scale(2);
    if &scaled != amount || scaled <= BigDecimal::from(0) {
        return Err(SepaError::InvalidAmount(amount.to_string()));
    }
    Ok(scaled.to_string())
}

// ============================================================================
// SECTION: Status Report
// ============================================================================

/// Status of one original transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    /// Original end-to-end id.
    pub original_end_to_end_id: Option<String>,
    /// Original transaction id.
    pub original_transaction_id: Option<String>,
    /// Transaction status code.
    pub status: Option<String>,
    /// Reason code.
    pub reason_code: Option<String>,
    /// Additional reason text.
    pub additional_info: Vec<String>,
    /// Instructed amount.
    pub amount: Option<BigDecimal>,
    /// Currency of the amount.
    pub currency: Option<String>,
    /// Requested execution date.
    pub requested_execution_date: Option<String>,
    /// Debtor account (IBAN or BBAN).
    pub debtor_account: Option<String>,
    /// Creditor IBAN.
    pub creditor_account: Option<String>,
}

/// Payment status report for an earlier initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusReport {
    /// Report message id.
    pub message_id: String,
    /// Report creation time as sent.
    pub created: String,
    /// Original message id.
    pub original_message_id: Option<String>,
    /// Original message name id.
    pub original_message_name_id: Option<String>,
    /// Original creation time.
    pub original_created: Option<String>,
    /// Original number of transactions.
    pub original_transaction_count: Option<String>,
    /// Group status code.
    pub group_status: Option<String>,
    /// Group reason code.
    pub reason_code: Option<String>,
    /// Group additional reason text.
    pub additional_info: Vec<String>,
    /// Per-transaction statuses.
    pub transactions: Vec<TransactionStatus>,
}

impl PaymentStatusReport {
    /// Parses a report document.
    ///
    /// # Errors
    ///
    /// Returns [`SepaError`] for malformed XML, a wrong root or missing header fields.
    pub fn from_xml(xml: &str) -> Result<Self, SepaError> {
        let document = XmlElement::parse(xml)?;
        if !document.is(PAIN_002_NS, "Document") {
            return Err(SepaError::WrongRoot(document.name));
        }
        let report = document
            .child("pain.002.001.02")
            .ok_or_else(|| SepaError::WrongRoot("Document without pain.002.001.02".to_string()))?;
        let header = report
            .child("GrpHdr")
            .ok_or_else(|| FieldError::new("GrpHdr", "missing"))?;
        let original = report.child("OrgnlGrpInfAndSts");
        let reason = original.and_then(|element| element.child("StsRsnInf"));
        Ok(Self {
            message_id: required_token(header, "MsgId")?,
            created: required_token(header, "CreDtTm")?,
            original_message_id: original
                .and_then(|element| optional_token(element, "OrgnlMsgId")),
            original_message_name_id: original
                .and_then(|element| optional_token(element, "OrgnlMsgNmId")),
            original_created: original
                .and_then(|element| optional_token(element, "OrgnlCreDtTm")),
            original_transaction_count: original
                .and_then(|element| optional_token(element, "OrgnlNbOfTxs")),
            group_status: original.and_then(|element| optional_token(element, "GrpSts")),
            reason_code: reason
                .and_then(|element| element.path(&["StsRsn", "Cd"]))
                .map(|code| code.text.trim().to_string()),
            additional_info: reason.map(additional_info).unwrap_or_default(),
            transactions: report.children_named("TxInfAndSts").map(transaction_status).collect(),
        })
    }

    /// Returns true when the whole initiation was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.group_status.as_deref() == Some(STATUS_REJECTED)
    }
}

/// Collects `AddtlStsRsnInf` texts.
fn additional_info(element: &XmlElement) -> Vec<String> {
    element.children_named("AddtlStsRsnInf").map(|info| info.text.trim().to_string()).collect()
}

/// Reads one `TxInfAndSts` block.
fn transaction_status(element: &XmlElement) -> TransactionStatus {
    let amount = element.descendant("InstdAmt");
    let reason = element.descendant("StsRsnInf");
    let debtor_account = element.descendant("DbtrAcct").and_then(|account| {
        account.descendant("IBAN").or_else(|| account.descendant("BBAN")).map(|id| id.text.trim().to_string())
    });
    TransactionStatus {
        original_end_to_end_id: optional_token(element, "OrgnlEndToEndId"),
        original_transaction_id: optional_token(element, "OrgnlTxId"),
        status: optional_token(element, "TxSts"),
        reason_code: reason
            .and_then(|info| info.descendant("Cd"))
            .map(|code| code.text.trim().to_string()),
        additional_info: reason.map(additional_info).unwrap_or_default(),
        amount: amount.and_then(|value| BigDecimal::from_str(value.text.trim()).ok()),
        currency: amount.and_then(|value| value.attribute("Ccy")).map(str::to_string),
        requested_execution_date: element.descendant("ReqdExctnDt").map(|date| date.text.trim().to_string()),
        debtor_account,
        creditor_account: element
            .descendant("CdtrAcct")
            .and_then(|account| account.descendant("IBAN"))
            .map(|iban| iban.text.trim().to_string()),
    }
}

#[cfg(test)]
mod tests;
