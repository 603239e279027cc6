// crates/bankws-core/src/response.rs
// ============================================================================
// Module: ApplicationResponse Model
// Description: Typed ApplicationResponse with validating parse and serialize.
// Purpose: Represent the bank's answer to a WebService request.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ApplicationResponse`] is the bxd.fi xmldata message returned for every
//! WebService operation. Parsing validates against
//! [`crate::schema::APPLICATION_RESPONSE`] and rejects the document on any
//! violation. Serialization builds the element tree, validates it with the
//! same table and only then writes it, so a producer can never emit a
//! document a consumer would reject.
//!
//! Invariants:
//! - Empty `file_descriptors`/`user_file_types` vectors mean the container is
//!   absent; a present container always holds at least one entry.
//! - `Signature` and `CustomerExtension` subtrees are carried opaquely.
//! - Parse then serialize then parse yields an equal value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::content::ContentError;
use crate::content::ContentPacking;
use crate::content::GZIP_METHOD;
use crate::content::into_text;
use crate::fields;
use crate::fields::FieldError;
use crate::schema::APPLICATION_RESPONSE;
use crate::schema::DSIG_NS;
use crate::schema::ValidationReport;
use crate::schema::XMLDATA_NS;
use crate::schema::validate_document;
use crate::signature::SignatureError;
use crate::signature::SignatureInfo;
use crate::xml::XmlElement;
use crate::xml::XmlError;
use crate::xs;
use crate::xs::XsDate;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Response code meaning the request was accepted.
pub const RESPONSE_CODE_OK: &str = "00";

/// Response code meaning the uploaded material failed schema validation.
pub const RESPONSE_CODE_SCHEMA_FAILURE: &str = "12";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while reading or writing an `ApplicationResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// Document is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// Document violates the schema.
    #[error("schema validation failed: {0}")]
    Schema(ValidationReport),
    /// A validated field could not be mapped.
    #[error(transparent)]
    Field(#[from] FieldError),
}

// ============================================================================
// SECTION: File Descriptors
// ============================================================================

/// Known file status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// `WFP`: waiting for processing.
    WaitingForProcessing,
    /// `WFC`: waiting for confirmation.
    WaitingForConfirmation,
    /// `FWD`: forwarded to processing.
    Forwarded,
    /// `DLD`: downloaded.
    Downloaded,
    /// `DEL`: deleted.
    Deleted,
    /// `NEW`: new, not yet downloaded.
    New,
    /// `KIN`: key-in confirmation.
    KeyIn,
}

impl FileStatus {
    /// Maps a status code to a known status.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "WFP" => Some(Self::WaitingForProcessing),
            "WFC" => Some(Self::WaitingForConfirmation),
            "FWD" => Some(Self::Forwarded),
            "DLD" => Some(Self::Downloaded),
            "DEL" => Some(Self::Deleted),
            "NEW" => Some(Self::New),
            "KIN" => Some(Self::KeyIn),
            _ => None,
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::WaitingForProcessing => "WFP",
            Self::WaitingForConfirmation => "WFC",
            Self::Forwarded => "FWD",
            Self::Downloaded => "DLD",
            Self::Deleted => "DEL",
            Self::New => "NEW",
            Self::KeyIn => "KIN",
        }
    }
}

/// One entry of a feedback file's action history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAction {
    /// Action code.
    pub action_code: String,
    /// When the action happened.
    pub action_timestamp: XsDateTime,
}

/// Attributes of the feedback file produced for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackFileAttributes {
    /// Reference of the feedback file.
    pub reference: String,
    /// File type of the feedback file.
    pub file_type: String,
    /// Feedback file status.
    pub status: Option<String>,
    /// Feedback date.
    pub date: Option<XsDate>,
    /// Feedback timestamp.
    pub timestamp: Option<XsDateTime>,
    /// Action history; empty when absent.
    pub action_history: Vec<FileAction>,
}

/// Metadata for one file available through the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Bank-assigned file reference.
    pub file_reference: String,
    /// Target folder.
    pub target_id: String,
    /// Service identifier.
    pub service_id: Option<String>,
    /// Owner name of the service identifier.
    pub service_id_owner_name: Option<String>,
    /// Name given by the uploader.
    pub user_filename: Option<String>,
    /// Reference of the file this one answers.
    pub parent_file_reference: Option<String>,
    /// File type.
    pub file_type: String,
    /// When the file was stored.
    pub file_timestamp: XsDateTime,
    /// Status code.
    pub status: String,
    /// Sub-status code.
    pub sub_status: Option<String>,
    /// Feedback file attributes.
    pub feedback: Option<FeedbackFileAttributes>,
}

impl FileDescriptor {
    /// Returns the status as a known code, if recognized.
    #[must_use]
    pub fn status_kind(&self) -> Option<FileStatus> {
        FileStatus::from_code(&self.status)
    }
}

/// Service bound to a user file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeService {
    /// Service identifier.
    pub service_id: String,
    /// Owner name of the service identifier.
    pub service_id_owner_name: Option<String>,
    /// Service type.
    pub service_type: Option<String>,
    /// Human-readable service text.
    pub service_id_text: Option<String>,
}

/// File type the customer may exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFileType {
    /// File type.
    pub file_type: String,
    /// Descriptive name.
    pub file_type_name: Option<String>,
    /// Transfer direction.
    pub direction: Option<String>,
    /// Bound services; empty when absent.
    pub services: Vec<FileTypeService>,
}

// ============================================================================
// SECTION: Consistency
// ============================================================================

/// Semantic issue the schema does not catch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyIssue {
    /// `Encrypted` is true but no `EncryptionMethod` is given.
    #[error("encrypted content without encryption method")]
    EncryptedWithoutMethod,
    /// `EncryptionMethod` is given while `Encrypted` is not true.
    #[error("encryption method given for unencrypted content")]
    EncryptionMethodWithoutFlag,
    /// `Compressed` is true but no `CompressionMethod` is given.
    #[error("compressed content without compression method")]
    CompressedWithoutMethod,
    /// `CompressionMethod` is given while `Compressed` is not true.
    #[error("compression method given for uncompressed content")]
    CompressionMethodWithoutFlag,
    /// `CompressionMethod` names an unsupported algorithm.
    #[error("unsupported compression method {0}")]
    UnsupportedCompressionMethod(String),
}

// ============================================================================
// SECTION: ApplicationResponse
// ============================================================================

/// The bank's xmldata answer to a WebService request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationResponse {
    /// Customer identifier.
    pub customer_id: String,
    /// Creation time.
    pub timestamp: XsDateTime,
    /// Outcome code; `00` means accepted.
    pub response_code: String,
    /// Outcome text.
    pub response_text: String,
    /// Execution serial echoed from the request.
    pub execution_serial: Option<String>,
    /// Whether content is encrypted.
    pub encrypted: Option<bool>,
    /// Encryption method.
    pub encryption_method: Option<String>,
    /// Whether content is compressed.
    pub compressed: Option<bool>,
    /// Compression method.
    pub compression_method: Option<String>,
    /// Total amount of the contained material.
    pub amount_total: Option<f64>,
    /// Transaction count of the contained material.
    pub transaction_count: Option<i64>,
    /// Opaque customer extension.
    pub customer_extension: Option<XmlElement>,
    /// File descriptors; empty when the container is absent.
    pub file_descriptors: Vec<FileDescriptor>,
    /// User file types; empty when the container is absent.
    pub user_file_types: Vec<UserFileType>,
    /// File type of the content.
    pub file_type: Option<String>,
    /// Raw content bytes (base64 decoded, still packed).
    pub content: Option<Vec<u8>>,
    /// Opaque enveloped signature.
    pub signature: Option<XmlElement>,
}

impl ApplicationResponse {
    /// Creates a response holding only the mandatory fields.
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        timestamp: XsDateTime,
        response_code: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            timestamp,
            response_code: response_code.into(),
            response_text: response_text.into(),
            execution_serial: None,
            encrypted: None,
            encryption_method: None,
            compressed: None,
            compression_method: None,
            amount_total: None,
            transaction_count: None,
            customer_extension: None,
            file_descriptors: Vec::new(),
            user_file_types: Vec::new(),
            file_type: None,
            content: None,
            signature: None,
        }
    }

    /// Parses and validates a document.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Xml`] for malformed XML and
    /// [`ResponseError::Schema`] with every violation for invalid documents.
    pub fn from_xml(xml: &str) -> Result<Self, ResponseError> {
        let root = XmlElement::parse(xml)?;
        Self::from_element(&root)
    }

    /// Validates and maps a parsed root element.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Schema`] when the element violates the schema.
    pub fn from_element(root: &XmlElement) -> Result<Self, ResponseError> {
        let report = validate_document(root, &APPLICATION_RESPONSE);
        if !report.is_valid() {
            return Err(ResponseError::Schema(report));
        }
        let file_descriptors = match root.child("FileDescriptors") {
            Some(container) => container
                .children_named("FileDescriptor")
                .map(read_file_descriptor)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let user_file_types = match root.child("UserFileTypes") {
            Some(container) => container
                .children_named("UserFileType")
                .map(read_user_file_type)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            customer_id: fields::required_text(root, "CustomerId")?,
            timestamp: fields::required_date_time(root, "Timestamp")?,
            response_code: fields::required_text(root, "ResponseCode")?,
            response_text: fields::required_text(root, "ResponseText")?,
            execution_serial: fields::optional_text(root, "ExecutionSerial"),
            encrypted: fields::optional_bool(root, "Encrypted")?,
            encryption_method: fields::optional_text(root, "EncryptionMethod"),
            compressed: fields::optional_bool(root, "Compressed")?,
            compression_method: fields::optional_text(root, "CompressionMethod"),
            amount_total: fields::optional_double(root, "AmountTotal")?,
            transaction_count: fields::optional_long(root, "TransactionCount")?,
            customer_extension: root.child("CustomerExtension").cloned(),
            file_descriptors,
            user_file_types,
            file_type: fields::optional_text(root, "FileType"),
            content: fields::optional_base64(root, "Content")?,
            signature: root.children.iter().find(|child| child.is(DSIG_NS, "Signature")).cloned(),
        })
    }

    /// Builds the element tree in schema order.
    #[must_use]
    pub fn to_element(&self) -> XmlElement {
        let mut root = XmlElement::new(Some(XMLDATA_NS), "ApplicationResponse");
        root.push_leaf("CustomerId", self.customer_id.as_str());
        root.push_leaf("Timestamp", self.timestamp.as_str());
        root.push_leaf("ResponseCode", self.response_code.as_str());
        root.push_leaf("ResponseText", self.response_text.as_str());
        root.push_optional_leaf("ExecutionSerial", self.execution_serial.as_deref());
        root.push_optional_leaf("Encrypted", self.encrypted.map(xs::format_boolean));
        root.push_optional_leaf("EncryptionMethod", self.encryption_method.as_deref());
        root.push_optional_leaf("Compressed", self.compressed.map(xs::format_boolean));
        root.push_optional_leaf("CompressionMethod", self.compression_method.as_deref());
        if let Some(amount) = self.amount_total {
            root.push_leaf("AmountTotal", xs::format_double(amount));
        }
        if let Some(count) = self.transaction_count {
            root.push_leaf("TransactionCount", count.to_string());
        }
        if let Some(extension) = &self.customer_extension {
            root.push(extension.clone());
        }
        if !self.file_descriptors.is_empty() {
            let mut container = XmlElement::new(Some(XMLDATA_NS), "FileDescriptors");
            for descriptor in &self.file_descriptors {
                container.push(write_file_descriptor(descriptor));
            }
            root.push(container);
        }
        if !self.user_file_types.is_empty() {
            let mut container = XmlElement::new(Some(XMLDATA_NS), "UserFileTypes");
            for file_type in &self.user_file_types {
                container.push(write_user_file_type(file_type));
            }
            root.push(container);
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

    /// Serializes the response after validating the produced tree.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Schema`] when a field breaks a schema facet
    /// and [`ResponseError::Xml`] when writing fails.
    pub fn to_xml(&self) -> Result<String, ResponseError> {
        let root = self.to_element();
        let report = validate_document(&root, &APPLICATION_RESPONSE);
        if !report.is_valid() {
            return Err(ResponseError::Schema(report));
        }
        Ok(root.to_document()?)
    }

    /// Returns true when the bank accepted the request.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.response_code == RESPONSE_CODE_OK
    }

    /// Lists semantic issues between paired flags and methods.
    #[must_use]
    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();
        match (self.encrypted, self.encryption_method.is_some()) {
            (Some(true), false) => issues.push(ConsistencyIssue::EncryptedWithoutMethod),
            (Some(false) | None, true) => {
                issues.push(ConsistencyIssue::EncryptionMethodWithoutFlag);
            }
            _ => {}
        }
        match (self.compressed, self.compression_method.as_deref()) {
            (Some(true), None) => issues.push(ConsistencyIssue::CompressedWithoutMethod),
            (Some(true), Some(method)) if !method.trim().eq_ignore_ascii_case(GZIP_METHOD) => {
                issues.push(ConsistencyIssue::UnsupportedCompressionMethod(method.to_string()));
            }
            (Some(false) | None, Some(_)) => {
                issues.push(ConsistencyIssue::CompressionMethodWithoutFlag);
            }
            _ => {}
        }
        issues
    }

    /// Returns the flags describing how `content` is packed.
    #[must_use]
    pub fn packing(&self) -> ContentPacking<'_> {
        ContentPacking {
            encrypted: self.encrypted,
            encryption_method: self.encryption_method.as_deref(),
            compressed: self.compressed,
            compression_method: self.compression_method.as_deref(),
        }
    }

    /// Returns the content with compression undone.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] for encrypted or undecodable content.
    pub fn decoded_content(&self) -> Result<Option<Vec<u8>>, ContentError> {
        self.content.as_deref().map(|content| self.packing().unpack(content)).transpose()
    }

    /// Returns the decoded content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] for undecodable or non-UTF-8 content.
    pub fn content_text(&self) -> Result<Option<String>, ContentError> {
        self.decoded_content()?.map(into_text).transpose()
    }

    /// Returns the structural signature summary, if signed.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the signature element is malformed.
    pub fn signature_info(&self) -> Result<Option<SignatureInfo>, SignatureError> {
        self.signature.as_ref().map(SignatureInfo::from_element).transpose()
    }
}

/// Extracts and unpacks `Content` from a document that may fail validation.
///
/// Used to surface the bank's diagnostics when it rejects uploaded material.
#[must_use]
pub fn salvage_content(xml: &str) -> Option<Vec<u8>> {
    let root = XmlElement::parse(xml).ok()?;
    let content = xs::parse_base64(root.child_text("Content")?)?;
    let compressed = root.child_text("Compressed").and_then(xs::parse_boolean);
    let packing = ContentPacking {
        encrypted: root.child_text("Encrypted").and_then(xs::parse_boolean),
        encryption_method: root.child_text("EncryptionMethod"),
        compressed,
        compression_method: root.child_text("CompressionMethod"),
    };
    packing.unpack(&content).ok()
}

// ============================================================================
// SECTION: Mapping Helpers
// ============================================================================

/// Maps a `FileDescriptor` element.
fn read_file_descriptor(element: &XmlElement) -> Result<FileDescriptor, FieldError> {
    Ok(FileDescriptor {
        file_reference: fields::required_text(element, "FileReference")?,
        target_id: fields::required_text(element, "TargetId")?,
        service_id: fields::optional_text(element, "ServiceId"),
        service_id_owner_name: fields::optional_text(element, "ServiceIdOwnerName"),
        user_filename: fields::optional_text(element, "UserFilename"),
        parent_file_reference: fields::optional_text(element, "ParentFileReference"),
        file_type: fields::required_text(element, "FileType")?,
        file_timestamp: fields::required_date_time(element, "FileTimestamp")?,
        status: fields::required_text(element, "Status")?,
        sub_status: fields::optional_text(element, "SubStatus"),
        feedback: element.child("FeedbackFileAttributes").map(read_feedback).transpose()?,
    })
}

/// Maps a `FeedbackFileAttributes` element.
fn read_feedback(element: &XmlElement) -> Result<FeedbackFileAttributes, FieldError> {
    let action_history = match element.child("FileActionHistory") {
        Some(history) => history
            .children_named("FileAction")
            .map(|action| {
                Ok(FileAction {
                    action_code: fields::required_text(action, "ActionCode")?,
                    action_timestamp: fields::required_date_time(action, "ActionTimestamp")?,
                })
            })
            .collect::<Result<Vec<_>, FieldError>>()?,
        None => Vec::new(),
    };
    Ok(FeedbackFileAttributes {
        reference: fields::required_text(element, "FeedbackFileReference")?,
        file_type: fields::required_text(element, "FeedbackFileType")?,
        status: fields::optional_text(element, "FeedbackFileStatus"),
        date: fields::optional_date(element, "FeedbackFileDate")?,
        timestamp: fields::optional_date_time(element, "FeedbackFileTimestamp")?,
        action_history,
    })
}

/// Maps a `UserFileType` element.
fn read_user_file_type(element: &XmlElement) -> Result<UserFileType, FieldError> {
    let services = match element.child("FileTypeServices") {
        Some(container) => container
            .children_named("FileTypeService")
            .map(|service| {
                Ok(FileTypeService {
                    service_id: fields::required_text(service, "ServiceId")?,
                    service_id_owner_name: fields::optional_text(service, "ServiceIdOwnerName"),
                    service_type: fields::optional_text(service, "ServiceType"),
                    service_id_text: fields::optional_text(service, "ServiceIdText"),
                })
            })
            .collect::<Result<Vec<_>, FieldError>>()?,
        None => Vec::new(),
    };
    Ok(UserFileType {
        file_type: fields::required_text(element, "FileType")?,
        file_type_name: fields::optional_text(element, "FileTypeName"),
        direction: fields::optional_text(element, "Direction"),
        services,
    })
}

/// Builds a `FileDescriptor` element.
fn write_file_descriptor(descriptor: &FileDescriptor) -> XmlElement {
    let mut element = XmlElement::new(Some(XMLDATA_NS), "FileDescriptor");
    element.push_leaf("FileReference", descriptor.file_reference.as_str());
    element.push_leaf("TargetId", descriptor.target_id.as_str());
    element.push_optional_leaf("ServiceId", descriptor.service_id.as_deref());
    element.push_optional_leaf("ServiceIdOwnerName", descriptor.service_id_owner_name.as_deref());
    element.push_optional_leaf("UserFilename", descriptor.user_filename.as_deref());
    element.push_optional_leaf("ParentFileReference", descriptor.parent_file_reference.as_deref());
    element.push_leaf("FileType", descriptor.file_type.as_str());
    element.push_leaf("FileTimestamp", descriptor.file_timestamp.as_str());
    element.push_leaf("Status", descriptor.status.as_str());
    element.push_optional_leaf("SubStatus", descriptor.sub_status.as_deref());
    if let Some(feedback) = &descriptor.feedback {
        let mut node = XmlElement::new(Some(XMLDATA_NS), "FeedbackFileAttributes");
        node.push_leaf("FeedbackFileReference", feedback.reference.as_str());
        node.push_leaf("FeedbackFileType", feedback.file_type.as_str());
        node.push_optional_leaf("FeedbackFileStatus", feedback.status.as_deref());
        node.push_optional_leaf("FeedbackFileDate", feedback.date.as_ref().map(XsDate::as_str));
        node.push_optional_leaf(
            "FeedbackFileTimestamp",
            feedback.timestamp.as_ref().map(XsDateTime::as_str),
        );
        if !feedback.action_history.is_empty() {
            let mut history = XmlElement::new(Some(XMLDATA_NS), "FileActionHistory");
            for action in &feedback.action_history {
                let mut entry = XmlElement::new(Some(XMLDATA_NS), "FileAction");
                entry.push_leaf("ActionCode", action.action_code.as_str());
                entry.push_leaf("ActionTimestamp", action.action_timestamp.as_str());
                history.push(entry);
            }
            node.push(history);
        }
        element.push(node);
    }
    element
}

/// Builds a `UserFileType` element.
fn write_user_file_type(file_type: &UserFileType) -> XmlElement {
    let mut element = XmlElement::new(Some(XMLDATA_NS), "UserFileType");
    element.push_leaf("FileType", file_type.file_type.as_str());
    element.push_optional_leaf("FileTypeName", file_type.file_type_name.as_deref());
    element.push_optional_leaf("Direction", file_type.direction.as_deref());
    if !file_type.services.is_empty() {
        let mut services = XmlElement::new(Some(XMLDATA_NS), "FileTypeServices");
        for service in &file_type.services {
            let mut node = XmlElement::new(Some(XMLDATA_NS), "FileTypeService");
            node.push_leaf("ServiceId", service.service_id.as_str());
            node.push_optional_leaf("ServiceIdOwnerName", service.service_id_owner_name.as_deref());
            node.push_optional_leaf("ServiceType", service.service_type.as_deref());
            node.push_optional_leaf("ServiceIdText", service.service_id_text.as_deref());
            services.push(node);
        }
        element.push(services);
    }
    element
}

#[cfg(test)]
mod tests;
