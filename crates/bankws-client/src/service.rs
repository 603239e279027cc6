// crates/bankws-client/src/service.rs
// ============================================================================
// Module: WebService Client
// Description: The corporate file service operations over SOAP.
// Purpose: Run file, payment and certificate operations against one bank.
// Dependencies: bankws-config, bankws-core, thiserror
// ============================================================================

//! ## Overview
//! [`WebService`] turns one operation into one exchange: build the
//! `ApplicationRequest`, let the configured [`RequestSigner`] sign it,
//! validate it, take a request id, wrap it in a SOAP envelope, post it, then
//! unwrap, validate and verify the `ApplicationResponse`. Certificate
//! enrollment follows the same path against the bank's certificate service
//! with `CertApplicationRequest`/`CertApplicationResponse` documents.
//! Invariants:
//! - The SOAP-level `ResponseCode` must be `00`; code `12` reports the
//!   bank's schema diagnostics taken from the response content.
//! - A response is returned only after schema validation, verification and
//!   an accepted application-level code.
//! - Every exchange that got as far as sending is written to the exchange
//!   log, including failed ones.
//!
//! Security posture: response documents are untrusted until validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;

use bankws_config::BankWsConfig;
use bankws_config::ClientConfig;
use bankws_config::RequestIdStoreKind;
use bankws_core::AccountError;
use bankws_core::AccountNumber;
use bankws_core::ApplicationRequest;
use bankws_core::ApplicationResponse;
use bankws_core::CamtError;
use bankws_core::CertApplicationRequest;
use bankws_core::CertApplicationResponse;
use bankws_core::CertError;
use bankws_core::ContentError;
use bankws_core::DebitCreditNotification;
use bankws_core::FileListFilter;
use bankws_core::PaymentInitiation;
use bankws_core::PaymentStatusReport;
use bankws_core::RequestContext;
use bankws_core::RequestError;
use bankws_core::ResponseError;
use bankws_core::SepaError;
use bankws_core::StatementError;
use bankws_core::TransactionList;
use bankws_core::UploadFile;
use bankws_core::XsDate;
use bankws_core::XsDateTime;
use bankws_core::XsError;
use bankws_core::response::RESPONSE_CODE_OK;
use bankws_core::response::RESPONSE_CODE_SCHEMA_FAILURE;
use bankws_core::response::salvage_content;
use bankws_core::sepa::SEPA_FILE_TYPE;
use thiserror::Error;
use time::OffsetDateTime;
use time::UtcOffset;

use crate::bank::Bank;
use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::log::ExchangeLog;
use crate::log::ExchangeOutcome;
use crate::log::ExchangeRecord;
use crate::log::JsonLineLog;
use crate::log::NullLog;
use crate::log::sha256_hex;
use crate::request_id::JsonFileStore;
use crate::request_id::MemoryStore;
use crate::request_id::RequestIdError;
use crate::request_id::RequestIdGenerator;
use crate::request_id::RequestIdStore;
use crate::sign::RequestSigner;
use crate::sign::SignError;
use crate::soap;
use crate::soap::Operation;
use crate::soap::RequestHeader;
use crate::soap::SoapError;
use crate::transport::HttpTransport;
use crate::transport::HttpTransportConfig;
use crate::transport::Transport;
use crate::transport::TransportError;
use crate::verify::ResponseVerifier;
use crate::verify::StructuralVerifier;
use crate::verify::VerificationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File type of the transaction query.
pub const TRANSACTION_QUERY_FILE_TYPE: &str = "TP1 3ST";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures of a WebService operation.
#[derive(Debug, Error)]
pub enum WsError {
    /// Configuration cannot produce a client.
    #[error("client configuration error: {0}")]
    Config(String),
    /// Request could not be built.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// Request could not be signed.
    #[error(transparent)]
    Sign(#[from] SignError),
    /// Certificate service message could not be built or read.
    #[error(transparent)]
    Certificate(#[from] CertError),
    /// Bank has no certificate service endpoint.
    #[error("bank {0} has no certificate service endpoint")]
    NoCertificateService(String),
    /// Timestamp could not be formatted.
    #[error(transparent)]
    Timestamp(#[from] XsError),
    /// No request id available.
    #[error(transparent)]
    RequestId(#[from] RequestIdError),
    /// HTTP exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Envelope could not be read, or the service returned a fault.
    #[error(transparent)]
    Soap(#[from] SoapError),
    /// Answer is not UTF-8.
    #[error("{0} is not utf-8")]
    NotUtf8(&'static str),
    /// SOAP-level response code other than `00`.
    #[error("bank did not accept the request: {code}: {text}")]
    Rejected {
        /// Response code.
        code: String,
        /// Response text.
        text: String,
    },
    /// Bank rejected the uploaded material against its schema.
    #[error("bank schema validation failed: {text}")]
    SchemaFailure {
        /// Response text.
        text: String,
        /// Bank diagnostics from the response content, when readable.
        details: Option<String>,
    },
    /// Application response failed validation.
    #[error(transparent)]
    Response(#[from] ResponseError),
    /// Application response failed verification.
    #[error(transparent)]
    Verification(#[from] VerificationError),
    /// Application-level response code other than `00`.
    #[error("request was not accepted by the bank: {code}: {text}")]
    NotAccepted {
        /// Response code.
        code: String,
        /// Response text.
        text: String,
    },
    /// Response carries no content where content is expected.
    #[error("response has no content")]
    MissingContent,
    /// Response content could not be unpacked.
    #[error(transparent)]
    Content(#[from] ContentError),
    /// Transaction list could not be parsed.
    #[error(transparent)]
    Statement(#[from] StatementError),
    /// Payment document could not be built or read.
    #[error(transparent)]
    Sepa(#[from] SepaError),
    /// Notification document could not be read.
    #[error(transparent)]
    Notification(#[from] CamtError),
    /// Account number is invalid.
    #[error(transparent)]
    Account(#[from] AccountError),
    /// Exchange log could not be written.
    #[error("exchange log failed: {0}")]
    Log(String),
}

// ============================================================================
// SECTION: WebService
// ============================================================================

/// Client of one customer at one bank.
pub struct WebService {
    /// Customer identity and request defaults.
    client: ClientConfig,
    /// Receiving bank.
    bank: Bank,
    /// HTTP transport.
    transport: Box<dyn Transport>,
    /// Request id source.
    request_ids: RequestIdGenerator,
    /// Time source.
    clock: Box<dyn Clock>,
    /// Response verifier.
    verifier: Box<dyn ResponseVerifier>,
    /// Request signer; requests go unsigned when absent.
    signer: Option<Box<dyn RequestSigner>>,
    /// Exchange log.
    log: Box<dyn ExchangeLog>,
}

impl WebService {
    /// Creates a client with in-memory request ids, the system clock,
    /// structural verification, no signer and no exchange log.
    #[must_use]
    pub fn new(client: ClientConfig, bank: Bank, transport: Box<dyn Transport>) -> Self {
        Self {
            client,
            bank,
            transport,
            request_ids: RequestIdGenerator::in_memory(),
            clock: Box::new(SystemClock::new()),
            verifier: Box::new(StructuralVerifier::new()),
            signer: None,
            log: Box::new(NullLog),
        }
    }

    /// Builds the client described by a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the configuration is invalid, TLS material
    /// cannot be loaded or the exchange log cannot be opened.
    pub fn from_config(config: &BankWsConfig) -> Result<Self, WsError> {
        config.validate().map_err(|err| WsError::Config(err.to_string()))?;
        let bank = Bank::from_config(&config.bank)
            .ok_or_else(|| WsError::Config("bank endpoints are incomplete".to_string()))?;
        let transport = HttpTransport::new(HttpTransportConfig::from_config(config))?;
        let store: Box<dyn RequestIdStore> = match config.request_ids.store {
            RequestIdStoreKind::Memory => Box::new(MemoryStore::new()),
            RequestIdStoreKind::File => Box::new(JsonFileStore::new(&config.request_ids.path)),
        };
        let fallback = match config.client.fallback_offset_seconds() {
            Ok(Some(seconds)) => UtcOffset::from_whole_seconds(seconds)
                .map_err(|err| WsError::Config(format!("client.fallback_utc_offset: {err}")))?,
            Ok(None) => UtcOffset::UTC,
            Err(err) => return Err(WsError::Config(err.to_string())),
        };
        let mut service = Self::new(config.client.clone(), bank, Box::new(transport))
            .with_request_ids(RequestIdGenerator::new(store))
            .with_clock(Box::new(SystemClock::with_fallback_offset(fallback)))
            .with_verifier(Box::new(StructuralVerifier::from_config(&config.verification)));
        if let Some(path) = &config.log.path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| WsError::Log(format!("{}: {err}", path.display())))?;
            service = service.with_log(Box::new(JsonLineLog::new(file)));
        }
        Ok(service)
    }

    /// Replaces the request id generator.
    #[must_use]
    pub fn with_request_ids(mut self, request_ids: RequestIdGenerator) -> Self {
        self.request_ids = request_ids;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the response verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Box<dyn ResponseVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Signs every outgoing `ApplicationRequest` with `signer`.
    #[must_use]
    pub fn with_signer(mut self, signer: Box<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replaces the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replaces the exchange log.
    #[must_use]
    pub fn with_log(mut self, log: Box<dyn ExchangeLog>) -> Self {
        self.log = log;
        self
    }

    /// Returns the receiving bank.
    #[must_use]
    pub const fn bank(&self) -> &Bank {
        &self.bank
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Uploads a file.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the bank does not accept the file.
    pub fn upload_file(&self, upload: UploadFile) -> Result<ApplicationResponse, WsError> {
        let now = self.clock.now();
        let request = ApplicationRequest::upload_file(&self.context(now)?, upload)?;
        self.exchange(Operation::UploadFile, request, now)
    }

    /// Downloads one file by its bank reference.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the bank does not accept the request.
    pub fn download_file(&self, file_reference: &str) -> Result<ApplicationResponse, WsError> {
        let now = self.clock.now();
        let request = ApplicationRequest::download_file(
            &self.context(now)?,
            file_reference,
            XsDate::from_date(now.date()),
        );
        self.exchange(Operation::DownloadFile, request, now)
    }

    /// Lists the files available at the bank.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the bank does not accept the request.
    pub fn download_file_list(
        &self,
        filter: FileListFilter,
    ) -> Result<ApplicationResponse, WsError> {
        let now = self.clock.now();
        let request = ApplicationRequest::download_file_list(&self.context(now)?, filter);
        self.exchange(Operation::DownloadFileList, request, now)
    }

    /// Queries the day's transactions of an account.
    ///
    /// `only_new` restricts the answer to transactions not reported before.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the answer cannot be parsed.
    pub fn transaction_query(
        &self,
        account: &AccountNumber,
        only_new: bool,
    ) -> Result<TransactionList, WsError> {
        let filter = u8::from(!only_new);
        let query = format!(
            "$$TP1 3ST {} {} {filter}",
            account.branch(),
            account.account()
        );
        let today = XsDate::from_date(self.clock.now().date());
        let response = self.upload_file(UploadFile {
            target_id: self.client.target_id.clone(),
            user_filename: format!("Query_{}.xml", today.as_str()),
            file_type: TRANSACTION_QUERY_FILE_TYPE.to_string(),
            content: query.into_bytes(),
            compress: false,
        })?;
        let text = response.content_text()?.ok_or(WsError::MissingContent)?;
        Ok(TransactionList::parse(&text)?)
    }

    /// Uploads a pain.001 credit transfer initiation.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the document is invalid or the bank refuses it.
    pub fn submit_sepa_payment(
        &self,
        initiation: &PaymentInitiation,
    ) -> Result<ApplicationResponse, WsError> {
        let document = initiation.to_xml()?;
        self.upload_file(UploadFile {
            target_id: self.client.target_id.clone(),
            user_filename: format!("{}.xml", initiation.message_id),
            file_type: SEPA_FILE_TYPE.to_string(),
            content: document.into_bytes(),
            compress: true,
        })
    }

    /// Downloads a pain.002 status report and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the report cannot be read.
    pub fn download_payment_status(
        &self,
        file_reference: &str,
    ) -> Result<PaymentStatusReport, WsError> {
        let response = self.download_file(file_reference)?;
        let text = response.content_text()?.ok_or(WsError::MissingContent)?;
        Ok(PaymentStatusReport::from_xml(&text)?)
    }

    /// Downloads a camt.054 debit credit notification and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the notification cannot be read.
    pub fn download_notification(
        &self,
        file_reference: &str,
    ) -> Result<DebitCreditNotification, WsError> {
        let response = self.download_file(file_reference)?;
        let text = response.content_text()?.ok_or(WsError::MissingContent)?;
        Ok(DebitCreditNotification::from_xml(&text)?)
    }

    // ------------------------------------------------------------------------
    // Certificate Service
    // ------------------------------------------------------------------------

    /// Enrolls for a signing certificate with a DER PKCS#10 request and the
    /// one-time transfer key delivered by the bank.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the request is invalid, the exchange fails or
    /// the answer holds no certificate.
    pub fn get_certificate(
        &self,
        signing_request: Vec<u8>,
        transfer_key: &str,
    ) -> Result<CertApplicationResponse, WsError> {
        let now = self.clock.now();
        let request = CertApplicationRequest::with_transfer_key(
            &self.context(now)?,
            signing_request,
            transfer_key,
        )?;
        let response = self.certificate_exchange(Operation::GetCertificate, &request, now)?;
        if response.certificates.is_empty() {
            return Err(WsError::MissingContent);
        }
        Ok(response)
    }

    /// Fetches the bank's own service certificates.
    ///
    /// # Errors
    ///
    /// Returns [`WsError`] when the exchange fails or the bank refuses the request.
    pub fn get_service_certificates(&self) -> Result<CertApplicationResponse, WsError> {
        let now = self.clock.now();
        let request = CertApplicationRequest::service_certificates(&self.context(now)?);
        self.certificate_exchange(Operation::GetServiceCertificates, &request, now)
    }

    // ------------------------------------------------------------------------
    // Exchange
    // ------------------------------------------------------------------------

    /// Shared request header fields.
    fn context(&self, now: OffsetDateTime) -> Result<RequestContext, WsError> {
        Ok(RequestContext {
            customer_id: self.client.customer_id.clone(),
            environment: self.client.environment,
            timestamp: XsDateTime::from_offset(now)?,
            software_id: self.client.software_id.clone(),
        })
    }

    /// Signs, validates and sends one file service request.
    fn exchange(
        &self,
        operation: Operation,
        mut request: ApplicationRequest,
        now: OffsetDateTime,
    ) -> Result<ApplicationResponse, WsError> {
        if let Some(signer) = &self.signer {
            signer.sign(&mut request)?;
        }
        let request_xml = request.to_xml()?;
        let url = self.bank.endpoint(self.client.environment);
        self.send(operation, url, &request_xml, now, |document, record| {
            self.accept_response(document, record)
        })
    }

    /// Validates and sends one certificate service request.
    fn certificate_exchange(
        &self,
        operation: Operation,
        request: &CertApplicationRequest,
        now: OffsetDateTime,
    ) -> Result<CertApplicationResponse, WsError> {
        let url = self
            .bank
            .certificate_endpoint(self.client.environment)
            .ok_or_else(|| WsError::NoCertificateService(self.bank.bic.clone()))?;
        let request_xml = request.to_xml()?;
        self.send(operation, url, &request_xml, now, |document, record| {
            self.accept_certificate_response(document, record)
        })
    }

    /// Wraps a serialized request, posts it and logs the exchange.
    fn send<T>(
        &self,
        operation: Operation,
        url: &str,
        request_xml: &str,
        now: OffsetDateTime,
        accept: impl FnOnce(&str, &mut ExchangeRecord) -> Result<T, WsError>,
    ) -> Result<T, WsError> {
        let header = RequestHeader {
            sender_id: self.client.customer_id.clone(),
            request_id: self.request_ids.next_id(now.date())?,
            timestamp: XsDateTime::from_offset(now)?,
            language: self.client.language.code().to_string(),
            user_agent: self.client.software_id.clone(),
            receiver_id: self.bank.bic.clone(),
        };
        let envelope = soap::build_envelope(operation, &header, request_xml.as_bytes())?;
        let mut record = ExchangeRecord {
            unix_millis: unix_millis(now),
            operation: operation.name().to_string(),
            request_id: header.request_id.clone(),
            outcome: ExchangeOutcome::Failed,
            http_status: None,
            response_code: None,
            response_text: None,
            request_bytes: envelope.len(),
            response_bytes: 0,
            response_sha256: None,
            warnings: Vec::new(),
            error: None,
        };
        let result = self
            .round_trip(operation, url, &envelope, &mut record)
            .and_then(|document| accept(&document, &mut record));
        record.outcome = match &result {
            Ok(_) => ExchangeOutcome::Accepted,
            Err(_) if record.response_code.is_some() => ExchangeOutcome::Rejected,
            Err(_) => ExchangeOutcome::Failed,
        };
        record.error = result.as_ref().err().map(ToString::to_string);
        self.log.record(&record).map_err(|err| WsError::Log(err.to_string()))?;
        result
    }

    /// Posts the envelope and returns the accepted application response document.
    fn round_trip(
        &self,
        operation: Operation,
        url: &str,
        envelope: &str,
        record: &mut ExchangeRecord,
    ) -> Result<String, WsError> {
        let answer = self.transport.post(url, envelope.as_bytes())?;
        record.http_status = Some(answer.status);
        let body = String::from_utf8(answer.body).map_err(|_| WsError::NotUtf8("soap envelope"))?;
        let soap = soap::parse_envelope(operation, &body)?;
        record.response_code = Some(soap.header.response_code.clone());
        record.response_text = Some(soap.header.response_text.clone());
        record.response_bytes = soap.application_response.len();
        record.response_sha256 = Some(sha256_hex(&soap.application_response));
        let document = String::from_utf8(soap.application_response)
            .map_err(|_| WsError::NotUtf8("application response"))?;

        if soap.header.response_code != RESPONSE_CODE_OK {
            if soap.header.response_code == RESPONSE_CODE_SCHEMA_FAILURE {
                let details = salvage_content(&document)
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
                return Err(WsError::SchemaFailure {
                    text: soap.header.response_text,
                    details,
                });
            }
            return Err(WsError::Rejected {
                code: soap.header.response_code,
                text: soap.header.response_text,
            });
        }
        Ok(document)
    }

    /// Validates, verifies and checks the code of an `ApplicationResponse`.
    fn accept_response(
        &self,
        document: &str,
        record: &mut ExchangeRecord,
    ) -> Result<ApplicationResponse, WsError> {
        let response = ApplicationResponse::from_xml(document)?;
        record.warnings =
            response.consistency_issues().iter().map(ToString::to_string).collect();
        self.verifier.verify(&response)?;
        if !response.is_accepted() {
            record.response_code = Some(response.response_code.clone());
            record.response_text = Some(response.response_text.clone());
            return Err(WsError::NotAccepted {
                code: response.response_code,
                text: response.response_text,
            });
        }
        Ok(response)
    }

    /// Validates, verifies and checks the code of a `CertApplicationResponse`.
    fn accept_certificate_response(
        &self,
        document: &str,
        record: &mut ExchangeRecord,
    ) -> Result<CertApplicationResponse, WsError> {
        let response = CertApplicationResponse::from_xml(document)?;
        self.verifier.verify_certificate_response(&response)?;
        if !response.is_accepted() {
            record.response_code = Some(response.response_code.clone());
            record.response_text = Some(response.response_text.clone());
            return Err(WsError::NotAccepted {
                code: response.response_code,
                text: response.response_text,
            });
        }
        Ok(response)
    }
}

/// Milliseconds since the Unix epoch.
fn unix_millis(now: OffsetDateTime) -> i64 {
    now.unix_timestamp().saturating_mul(1000).saturating_add(i64::from(now.millisecond()))
}
