// crates/bankws-core/src/request.rs
// ============================================================================
// Module: ApplicationRequest Model
// Description: Typed ApplicationRequest with builders for each operation.
// Purpose: Produce the xmldata payload carried inside WebService calls.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`ApplicationRequest`] mirrors the bxd.fi request message. The
//! constructors [`ApplicationRequest::upload_file`],
//! [`ApplicationRequest::download_file`] and
//! [`ApplicationRequest::download_file_list`] fill the fields each command
//! needs; [`ApplicationRequest::to_xml`] validates before writing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::content;
use crate::content::ContentError;
use crate::content::GZIP_METHOD;
use crate::fields;
use crate::fields::FieldError;
use crate::schema::APPLICATION_REQUEST;
use crate::schema::DSIG_NS;
use crate::schema::ValidationReport;
use crate::schema::XMLDATA_NS;
use crate::schema::validate_document;
use crate::xml::XmlElement;
use crate::xml::XmlError;
use crate::xs;
use crate::xs::XsDate;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while building, reading or writing an `ApplicationRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Document is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// Document violates the schema.
    #[error("schema validation failed: {0}")]
    Schema(ValidationReport),
    /// A validated field could not be mapped.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Content could not be packed.
    #[error(transparent)]
    Content(#[from] ContentError),
    /// Unknown enumeration value.
    #[error("unknown {kind}: {value}")]
    UnknownValue {
        /// Enumeration name.
        kind: &'static str,
        /// Offending value.
        value: String,
    },
}

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Bank environment a request targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Customer test environment.
    #[default]
    Test,
    /// Production environment.
    Production,
}

impl Environment {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "TEST",
            Self::Production => "PRODUCTION",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TEST" => Ok(Self::Test),
            "PRODUCTION" => Ok(Self::Production),
            _ => Err(RequestError::UnknownValue {
                kind: "environment",
                value: value.to_string(),
            }),
        }
    }
}

/// Command carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Upload a file to the bank.
    UploadFile,
    /// Download one or more files.
    DownloadFile,
    /// List files available for download.
    DownloadFileList,
}

impl Command {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UploadFile => "UploadFile",
            Self::DownloadFile => "DownloadFile",
            Self::DownloadFileList => "DownloadFileList",
        }
    }
}

/// Status filter of a file list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileListStatus {
    /// Files not downloaded yet.
    #[default]
    New,
    /// Files already downloaded.
    Downloaded,
    /// Every file.
    All,
}

impl FileListStatus {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Downloaded => "DLD",
            Self::All => "ALL",
        }
    }
}

impl FromStr for FileListStatus {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "DLD" => Ok(Self::Downloaded),
            "ALL" => Ok(Self::All),
            _ => Err(RequestError::UnknownValue {
                kind: "file status",
                value: value.to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Operation Parameters
// ============================================================================

/// Header fields shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Customer identifier assigned by the bank.
    pub customer_id: String,
    /// Target environment.
    pub environment: Environment,
    /// Creation time.
    pub timestamp: XsDateTime,
    /// Identifier of the sending software.
    pub software_id: String,
}

/// Parameters of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Target folder at the bank.
    pub target_id: String,
    /// File name recorded at the bank.
    pub user_filename: String,
    /// File type, for example `pain.001.001.02`.
    pub file_type: String,
    /// Unpacked payload.
    pub content: Vec<u8>,
    /// Whether to gzip the payload before sending.
    pub compress: bool,
}

/// Parameters of a file list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListFilter {
    /// Status filter.
    pub status: FileListStatus,
    /// Earliest file date.
    pub start_date: Option<XsDate>,
    /// Latest file date.
    pub end_date: Option<XsDate>,
    /// Folder restriction.
    pub target_id: Option<String>,
    /// File type restriction.
    pub file_type: Option<String>,
}

// ============================================================================
// SECTION: ApplicationRequest
// ============================================================================

/// The xmldata request sent inside a WebService call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRequest {
    /// Customer identifier.
    pub customer_id: String,
    /// Command name.
    pub command: Option<String>,
    /// Creation time.
    pub timestamp: XsDateTime,
    /// Earliest date of interest.
    pub start_date: Option<XsDate>,
    /// Latest date of interest.
    pub end_date: Option<XsDate>,
    /// Status filter.
    pub status: Option<String>,
    /// Service identifier.
    pub service_id: Option<String>,
    /// Target environment.
    pub environment: Environment,
    /// Requested file references; empty when absent.
    pub file_references: Vec<String>,
    /// File name recorded at the bank.
    pub user_filename: Option<String>,
    /// Target folder.
    pub target_id: Option<String>,
    /// Execution serial.
    pub execution_serial: Option<String>,
    /// Whether content is encrypted.
    pub encryption: Option<bool>,
    /// Encryption method.
    pub encryption_method: Option<String>,
    /// Whether content is (or should be returned) compressed.
    pub compression: Option<bool>,
    /// Compression method.
    pub compression_method: Option<String>,
    /// Total amount of the material.
    pub amount_total: Option<f64>,
    /// Transaction count of the material.
    pub transaction_count: Option<i64>,
    /// Identifier of the sending software.
    pub software_id: String,
    /// Opaque customer extension.
    pub customer_extension: Option<XmlElement>,
    /// File type.
    pub file_type: Option<String>,
    /// Packed content bytes.
    pub content: Option<Vec<u8>>,
    /// Enveloped signature, set by a signer.
    pub signature: Option<XmlElement>,
}

impl ApplicationRequest {
    /// Creates a request with the shared header fields and the given command.
    #[must_use]
    pub fn new(context: &RequestContext, command: Command) -> Self {
        Self {
            customer_id: context.customer_id.clone(),
            command: Some(command.as_str().to_string()),
            timestamp: context.timestamp.clone(),
            start_date: None,
            end_date: None,
            status: None,
            service_id: None,
            environment: context.environment,
            file_references: Vec::new(),
            user_filename: None,
            target_id: None,
            execution_serial: None,
            encryption: None,
            encryption_method: None,
            compression: None,
            compression_method: None,
            amount_total: None,
            transaction_count: None,
            software_id: context.software_id.clone(),
            customer_extension: None,
            file_type: None,
            content: None,
            signature: None,
        }
    }

    /// Builds an `UploadFile` request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Content`] when compression fails.
    pub fn upload_file(context: &RequestContext, upload: UploadFile) -> Result<Self, RequestError> {
        let mut request = Self::new(context, Command::UploadFile);
        request.user_filename = Some(upload.user_filename);
        request.target_id = Some(upload.target_id);
        request.file_type = Some(upload.file_type);
        if upload.compress {
            request.compression = Some(true);
            request.compression_method = Some(GZIP_METHOD.to_string());
            request.content = Some(content::gzip(&upload.content)?);
        } else {
            request.compression = Some(false);
            request.content = Some(upload.content);
        }
        Ok(request)
    }

    /// Builds a `DownloadFile` request for one file reference.
    #[must_use]
    pub fn download_file(
        context: &RequestContext,
        file_reference: impl Into<String>,
        start_date: XsDate,
    ) -> Self {
        let mut request = Self::new(context, Command::DownloadFile);
        request.start_date = Some(start_date);
        request.file_references = vec![file_reference.into()];
        request.compression = Some(false);
        request
    }

    /// Builds a `DownloadFileList` request.
    #[must_use]
    pub fn download_file_list(context: &RequestContext, filter: FileListFilter) -> Self {
        let mut request = Self::new(context, Command::DownloadFileList);
        request.start_date = filter.start_date;
        request.end_date = filter.end_date;
        request.status = Some(filter.status.as_str().to_string());
        request.target_id = filter.target_id;
        request.file_type = filter.file_type;
        request
    }

    /// Parses and validates a request document.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] for malformed or invalid documents.
    pub fn from_xml(xml: &str) -> Result<Self, RequestError> {
        let root = XmlElement::parse(xml)?;
        let report = validate_document(&root, &APPLICATION_REQUEST);
        if !report.is_valid() {
            return Err(RequestError::Schema(report));
        }
        let environment = fields::required_text(&root, "Environment")?.parse::<Environment>()?;
        let file_references = root
            .child("FileReferences")
            .map(|container| {
                container.children_named("FileReference").map(|node| node.text.clone()).collect()
            })
            .unwrap_or_default();
        Ok(Self {
            customer_id: fields::required_text(&root, "CustomerId")?,
            command: fields::optional_text(&root, "Command"),
            timestamp: fields::required_date_time(&root, "Timestamp")?,
            start_date: fields::optional_date(&root, "StartDate")?,
            end_date: fields::optional_date(&root, "EndDate")?,
            status: fields::optional_text(&root, "Status"),
            service_id: fields::optional_text(&root, "ServiceId"),
            environment,
            file_references,
            user_filename: fields::optional_text(&root, "UserFilename"),
            target_id: fields::optional_text(&root, "TargetId"),
            execution_serial: fields::optional_text(&root, "ExecutionSerial"),
            encryption: fields::optional_bool(&root, "Encryption")?,
            encryption_method: fields::optional_text(&root, "EncryptionMethod"),
            compression: fields::optional_bool(&root, "Compression")?,
            compression_method: fields::optional_text(&root, "CompressionMethod"),
            amount_total: fields::optional_double(&root, "AmountTotal")?,
            transaction_count: fields::optional_long(&root, "TransactionCount")?,
            software_id: fields::required_text(&root, "SoftwareId")?,
            customer_extension: root.child("CustomerExtension").cloned(),
            file_type: fields::optional_text(&root, "FileType"),
            content: fields::optional_base64(&root, "Content")?,
            signature: root.children.iter().find(|child| child.is(DSIG_NS, "Signature")).cloned(),
        })
    }

    /// Builds the element tree in schema order.
    #[must_use]
    pub fn to_element(&self) -> XmlElement {
        let mut root = XmlElement::new(Some(XMLDATA_NS), "ApplicationRequest");
        root.push_leaf("CustomerId", self.customer_id.as_str());
        root.push_optional_leaf("Command", self.command.as_deref());
        root.push_leaf("Timestamp", self.timestamp.as_str());
        root.push_optional_leaf("StartDate", self.start_date.as_ref().map(XsDate::as_str));
        root.push_optional_leaf("EndDate", self.end_date.as_ref().map(XsDate::as_str));
        root.push_optional_leaf("Status", self.status.as_deref());
        root.push_optional_leaf("ServiceId", self.service_id.as_deref());
        root.push_leaf("Environment", self.environment.as_str());
        if !self.file_references.is_empty() {
            let mut container = XmlElement::new(Some(XMLDATA_NS), "FileReferences");
            for reference in &self.file_references {
                container.push_leaf("FileReference", reference.as_str());
            }
            root.push(container);
        }
        root.push_optional_leaf("UserFilename", self.user_filename.as_deref());
        root.push_optional_leaf("TargetId", self.target_id.as_deref());
        root.push_optional_leaf("ExecutionSerial", self.execution_serial.as_deref());
        root.push_optional_leaf("Encryption", self.encryption.map(xs::format_boolean));
        root.push_optional_leaf("EncryptionMethod", self.encryption_method.as_deref());
        root.push_optional_leaf("Compression", self.compression.map(xs::format_boolean));
        root.push_optional_leaf("CompressionMethod", self.compression_method.as_deref());
        if let Some(amount) = self.amount_total {
            root.push_leaf("AmountTotal", xs::format_double(amount));
        }
        if let Some(count) = self.transaction_count {
            root.push_leaf("TransactionCount", count.to_string());
        }
        root.push_leaf("SoftwareId", self.software_id.as_str());
        if let Some(extension) = &self.customer_extension {
            root.push(extension.clone());
        }
        root.push_optional_leaf("FileType", self.file_type.as_deref());
        if let Some(content) = &self.content {
            root.push_leaf("Content", xs::format_base64(content));
        }
        if let Some(signature) = &self.signature {
            root.push(signature.clone());
        }
        root
    }

    /// Serializes the request after validating the produced tree.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Schema`] when a field breaks a schema facet.
    pub fn to_xml(&self) -> Result<String, RequestError> {
        let root = self.to_element();
        let report = validate_document(&root, &APPLICATION_REQUEST);
        if !report.is_valid() {
            return Err(RequestError::Schema(report));
        }
        Ok(root.to_document()?)
    }
}
