// crates/bankws-core/src/sepa/tests.rs
// ============================================================================
// Module: SEPA Document Tests
// Description: Unit tests for the pain.001 builder and the pain.002 reader.
// Purpose: Pin group totals, element layout and status extraction.
// Dependencies: bankws-core, bigdecimal, time
// ============================================================================

//! ## Overview
//! Builds a two-transfer initiation and reads a partially rejected report.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::str::FromStr;

use bigdecimal::BigDecimal;
use time::Date;
use time::Month;

use super::CreditTransfer;
use super::Grouping;
use super::InstructionPriority;
use super::PAIN_001_NS;
use super::Party;
use super::PaymentInitiation;
use super::PaymentInstruction;
use super::PaymentMethod;
use super::PaymentStatusReport;
use super::SepaError;
use super::ServiceLevel;
use crate::account::AccountError;
use crate::xml::XmlElement;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Transfer of `amount` to a fixed creditor.
fn transfer(end_to_end_id: &str, amount: &str) -> CreditTransfer {
    CreditTransfer {
        instruction_id: None,
        end_to_end_id: end_to_end_id.to_string(),
        priority: Some(InstructionPriority::Normal),
        amount: BigDecimal::from_str(amount).unwrap(),
        currency: "EUR".to_string(),
        creditor_bic: "NDEAFIHH".to_string(),
        creditor: Party::new("Supplier Ltd").with_country("FI"),
        creditor_iban: "FI2112345600000785".to_string(),
        purpose: None,
        remittance: Some("Invoice 1232".to_string()),
    }
}

/// Initiation with one instruction holding the given transfers.
fn initiation(transfers: Vec<CreditTransfer>) -> PaymentInitiation {
    PaymentInitiation {
        message_id: "MSG-1".to_string(),
        created: XsDateTime::parse("2024-03-01T10:00:00").unwrap(),
        grouping: Grouping::Mixed,
        initiating_party: Party::new("Example Oy"),
        payments: vec![PaymentInstruction {
            id: Some("PMT-1".to_string()),
            method: PaymentMethod::Transfer,
            service_level: ServiceLevel::Sepa,
            execution_date: Date::from_calendar_date(2024, Month::March, 4).unwrap(),
            debtor: Party::new("Example Oy").with_address_line("Street 1").with_country("FI"),
            debtor_id: "1000000001".to_string(),
            debtor_iban: "FI2112345600000785".to_string(),
            debtor_currency: "EUR".to_string(),
            debtor_bic: "OKOYFIHH".to_string(),
            ultimate_debtor: None,
            charge_bearer: "SLEV".to_string(),
            transfers,
        }],
    }
}

// ============================================================================
// SECTION: Initiation
// ============================================================================

#[test]
fn group_header_totals_cover_all_transfers() {
    let document = initiation(vec![transfer("E2E-1", "100.10"), transfer("E2E-2", "0.9")]);
    assert_eq!(document.transaction_count(), 2);
    assert_eq!(document.control_sum(), BigDecimal::from_str("101.00").unwrap());
    let root = document.to_element().unwrap();
    assert!(root.is(PAIN_001_NS, "Document"));
    let header = root.path(&["pain.001.001.02", "GrpHdr"]).unwrap();
    assert_eq!(header.child_text("NbOfTxs"), Some("2"));
    assert_eq!(header.child_text("CtrlSum"), Some("101.00"));
    assert_eq!(header.child_text("Grpg"), Some("MIXD"));
}

#[test]
fn transfer_layout_follows_pain_001() {
    let xml = initiation(vec![transfer("E2E-1", "12.5")]).to_xml().unwrap();
    let root = XmlElement::parse(&xml).unwrap();
    let payment = root.path(&["pain.001.001.02", "PmtInf"]).unwrap();
    assert_eq!(payment.path(&["PmtTpInf", "SvcLvl", "Cd"]).unwrap().text, "SEPA");
    assert_eq!(payment.child_text("ReqdExctnDt"), Some("2024-03-04"));
    assert_eq!(payment.path(&["Dbtr", "Id", "OrgId", "BkPtyId"]).unwrap().text, "1000000001");
    assert_eq!(payment.path(&["Dbtr", "PstlAdr", "AdrLine"]).unwrap().text, "Street 1");
    assert_eq!(payment.path(&["DbtrAcct", "Id", "IBAN"]).unwrap().text, "FI2112345600000785");
    assert_eq!(payment.path(&["DbtrAcct", "Ccy"]).unwrap().text, "EUR");
    let transfer = payment.child("CdtTrfTxInf").unwrap();
    let amount = transfer.path(&["Amt", "InstdAmt"]).unwrap();
    assert_eq!(amount.text, "12.50");
    assert_eq!(amount.attribute("Ccy"), Some("EUR"));
    assert_eq!(transfer.path(&["PmtTpInf", "InstrPrty"]).unwrap().text, "NORM");
    assert_eq!(transfer.path(&["RmtInf", "Ustrd"]).unwrap().text, "Invoice 1232");
    assert!(transfer.child("Purp").is_none());
}

#[test]
fn invalid_initiations_are_refused() {
    assert_eq!(initiation(Vec::new()).to_element(), Err(SepaError::Empty("payment instruction")));
    let mut no_payments = initiation(Vec::new());
    no_payments.payments.clear();
    assert_eq!(no_payments.to_element(), Err(SepaError::Empty("payment initiation")));
    let fractional = initiation(vec![transfer("E2E-1", "1.005")]);
    assert!(matches!(fractional.to_element(), Err(SepaError::InvalidAmount(_))));
    let zero = initiation(vec![transfer("E2E-1", "0")]);
    assert!(matches!(zero.to_element(), Err(SepaError::InvalidAmount(_))));
    let mut bad_iban = transfer("E2E-1", "1");
    bad_iban.creditor_iban = "FI2212345600000785".to_string();
    assert!(matches!(
        initiation(vec![bad_iban]).to_element(),
        Err(SepaError::Account(AccountError::InvalidIban(_)))
    ));
}

#[test]
fn address_lines_are_capped() {
    let mut document = initiation(vec![transfer("E2E-1", "1")]);
    let mut party = Party::new("Long Address Oy");
    for line in 0..6 {
        party = party.with_address_line(format!("line {line}"));
    }
    document.initiating_party = party;
    assert_eq!(
        document.to_element(),
        Err(SepaError::TooManyAddressLines {
            party: "Long Address Oy".to_string(),
            count: 6
        })
    );
}

// ============================================================================
// SECTION: Status Report
// ============================================================================

/// Partially rejected status report.
const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pain.002.001.02">
  <pain.002.001.02>
    <GrpHdr>
      <MsgId>RPT-1</MsgId>
      <CreDtTm>2024-03-01T11:00:00</CreDtTm>
    </GrpHdr>
    <OrgnlGrpInfAndSts>
      <OrgnlMsgId>MSG-1</OrgnlMsgId>
      <OrgnlMsgNmId>pain.001.001.02</OrgnlMsgNmId>
      <OrgnlNbOfTxs>2</OrgnlNbOfTxs>
      <GrpSts>PART</GrpSts>
    </OrgnlGrpInfAndSts>
    <TxInfAndSts>
      <OrgnlEndToEndId>E2E-2</OrgnlEndToEndId>
      <TxSts>RJCT</TxSts>
      <StsRsnInf>
        <StsRsn><Cd>AC01</Cd></StsRsn>
        <AddtlStsRsnInf>Incorrect account number</AddtlStsRsnInf>
      </StsRsnInf>
      <OrgnlTxRef>
        <Amt><InstdAmt Ccy="EUR">0.90</InstdAmt></Amt>
        <ReqdExctnDt>2024-03-04</ReqdExctnDt>
        <DbtrAcct><Id><IBAN>FI2112345600000785</IBAN></Id></DbtrAcct>
        <CdtrAcct><Id><IBAN>FI2112345600000785</IBAN></Id></CdtrAcct>
      </OrgnlTxRef>
    </TxInfAndSts>
  </pain.002.001.02>
</Document>"#;

#[test]
fn status_report_is_read() {
    let report = PaymentStatusReport::from_xml(REPORT).unwrap();
    assert_eq!(report.message_id, "RPT-1");
    assert_eq!(report.original_message_id.as_deref(), Some("MSG-1"));
    assert_eq!(report.group_status.as_deref(), Some("PART"));
    assert!(!report.is_rejected());
    assert_eq!(report.transactions.len(), 1);
    let status = &report.transactions[0];
    assert_eq!(status.original_end_to_end_id.as_deref(), Some("E2E-2"));
    assert_eq!(status.status.as_deref(), Some("RJCT"));
    assert_eq!(status.reason_code.as_deref(), Some("AC01"));
    assert_eq!(status.additional_info, vec!["Incorrect account number".to_string()]);
    assert_eq!(status.amount, Some(BigDecimal::from_str("0.90").unwrap()));
    assert_eq!(status.currency.as_deref(), Some("EUR"));
    assert_eq!(status.requested_execution_date.as_deref(), Some("2024-03-04"));
    assert_eq!(status.debtor_account.as_deref(), Some("FI2112345600000785"));
}

#[test]
fn rejected_group_is_detected() {
    let report = PaymentStatusReport::from_xml(&REPORT.replace("PART", "RJCT")).unwrap();
    assert!(report.is_rejected());
}

#[test]
fn wrong_document_is_refused() {
    let xml = REPORT.replace("pain.002.001.02\"", "pain.001.001.02\"");
    assert!(matches!(PaymentStatusReport::from_xml(&xml), Err(SepaError::WrongRoot(_))));
    let xml = REPORT.replace("<MsgId>RPT-1</MsgId>", "");
    assert!(matches!(PaymentStatusReport::from_xml(&xml), Err(SepaError::Field(_))));
}
