// crates/bankws-core/src/schema.rs
// ============================================================================
// Module: xmldata Schema Validation
// Description: Declarative particle tables and a sequence validator.
// Purpose: Enforce element order, cardinality and facets of bxd.fi documents.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The `ApplicationResponse` and `ApplicationRequest` schemas are expressed as
//! static [`Particle`] tables. [`validate_document`] walks an [`XmlElement`]
//! against a table and collects every [`Violation`] with its path, so a
//! caller sees all problems of a rejected document at once.
//!
//! Invariants:
//! - Sequences are matched greedily in declaration order.
//! - String lengths are counted in characters.
//! - Containers declared with `min_occurs = 1` children reject empty content.
//! - `Any` content (signatures, extensions) is accepted without inspection.
//!
//! The tables mirror `schemas/ApplicationResponse_20080918.xsd`; the
//! certificate service messages use the same machinery in their own
//! namespace.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::xml::XmlElement;
use crate::xs;

// ============================================================================
// SECTION: Namespaces
// ============================================================================

/// Namespace of the bxd.fi xmldata messages.
pub const XMLDATA_NS: &str = "http://bxd.fi/xmldata/";

/// Namespace of the certificate service messages.
pub const CERT_XMLDATA_NS: &str = "http://op.fi/mlp/xmldata/";

/// XML Digital Signature namespace.
pub const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Published schema for `ApplicationResponse`.
pub const APPLICATION_RESPONSE_XSD: &str =
    include_str!("../schemas/ApplicationResponse_20080918.xsd");

/// Upper bound on collected violations per document.
const MAX_VIOLATIONS: usize = 256;

// ============================================================================
// SECTION: Content Model
// ============================================================================

/// Simple type of a text-only element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleType {
    /// `xs:string` restricted by length.
    Text {
        /// Minimum length in characters.
        min_len: usize,
        /// Maximum length in characters.
        max_len: usize,
    },
    /// `xs:boolean`.
    Boolean,
    /// `xs:double`.
    Double,
    /// `xs:long`.
    Long,
    /// `xs:dateTime`.
    DateTime,
    /// `xs:date`.
    Date,
    /// `xs:base64Binary`.
    Base64Binary,
}

impl SimpleType {
    /// Returns the schema name used in diagnostics.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Text {
                ..
            } => "string",
            Self::Boolean => "boolean",
            Self::Double => "double",
            Self::Long => "long",
            Self::DateTime => "dateTime",
            Self::Date => "date",
            Self::Base64Binary => "base64Binary",
        }
    }
}

/// Content model of an element.
#[derive(Debug, Clone, Copy)]
pub enum ContentModel {
    /// Text-only content of a simple type.
    Simple(SimpleType),
    /// Ordered child sequence.
    Sequence(&'static [Particle]),
    /// Arbitrary well-formed content.
    Any,
}

/// Upper occurrence bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    /// At most this many occurrences.
    Bounded(u32),
    /// No upper bound.
    Unbounded,
}

impl MaxOccurs {
    /// Returns true when `count` occurrences are allowed.
    #[must_use]
    pub const fn allows(self, count: u32) -> bool {
        match self {
            Self::Bounded(max) => count <= max,
            Self::Unbounded => true,
        }
    }
}

/// Element declaration inside a sequence.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// Local element name.
    pub name: &'static str,
    /// Namespace URI.
    pub namespace: &'static str,
    /// Minimum occurrences.
    pub min_occurs: u32,
    /// Maximum occurrences.
    pub max_occurs: MaxOccurs,
    /// Content model.
    pub content: ContentModel,
}

impl Particle {
    /// Declares a mandatory single element.
    #[must_use]
    pub const fn required(name: &'static str, content: ContentModel) -> Self {
        Self {
            name,
            namespace: XMLDATA_NS,
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
            content,
        }
    }

    /// Declares an optional single element.
    #[must_use]
    pub const fn optional(name: &'static str, content: ContentModel) -> Self {
        Self {
            name,
            namespace: XMLDATA_NS,
            min_occurs: 0,
            max_occurs: MaxOccurs::Bounded(1),
            content,
        }
    }

    /// Declares an element occurring one or more times.
    #[must_use]
    pub const fn repeated(name: &'static str, content: ContentModel) -> Self {
        Self {
            name,
            namespace: XMLDATA_NS,
            min_occurs: 1,
            max_occurs: MaxOccurs::Unbounded,
            content,
        }
    }

    /// Moves the declaration into another namespace.
    #[must_use]
    pub const fn in_namespace(mut self, namespace: &'static str) -> Self {
        self.namespace = namespace;
        self
    }

    /// Returns true when the element matches this declaration.
    fn matches(&self, element: &XmlElement) -> bool {
        element.is(self.namespace, self.name)
    }
}

/// Shorthand for a length-restricted string.
const fn text(min_len: usize, max_len: usize) -> ContentModel {
    ContentModel::Simple(SimpleType::Text {
        min_len,
        max_len,
    })
}

/// `xs:dateTime` content.
const DATE_TIME: ContentModel = ContentModel::Simple(SimpleType::DateTime);
/// `xs:date` content.
const DATE: ContentModel = ContentModel::Simple(SimpleType::Date);
/// `xs:boolean` content.
const BOOLEAN: ContentModel = ContentModel::Simple(SimpleType::Boolean);
/// `xs:double` content.
const DOUBLE: ContentModel = ContentModel::Simple(SimpleType::Double);
/// `xs:long` content.
const LONG: ContentModel = ContentModel::Simple(SimpleType::Long);
/// `xs:base64Binary` content.
const BASE64: ContentModel = ContentModel::Simple(SimpleType::Base64Binary);

/// Optional enveloped XML-DSig signature.
const SIGNATURE: Particle = Particle {
    name: "Signature",
    namespace: DSIG_NS,
    min_occurs: 0,
    max_occurs: MaxOccurs::Bounded(1),
    content: ContentModel::Any,
};

// ============================================================================
// SECTION: ApplicationResponse Tables
// ============================================================================

/// `FileAction` entry of a feedback action history.
const FILE_ACTION: [Particle; 2] = [
    Particle::required("ActionCode", text(1, 35)),
    Particle::required("ActionTimestamp", DATE_TIME),
];

/// `FileActionHistory` container.
const FILE_ACTION_HISTORY: [Particle; 1] =
    [Particle::repeated("FileAction", ContentModel::Sequence(&FILE_ACTION))];

/// `FeedbackFileAttributes` sequence.
const FEEDBACK_FILE_ATTRIBUTES: [Particle; 6] = [
    Particle::required("FeedbackFileReference", text(1, 32)),
    Particle::required("FeedbackFileType", text(1, 40)),
    Particle::optional("FeedbackFileStatus", text(1, 10)),
    Particle::optional("FeedbackFileDate", DATE),
    Particle::optional("FeedbackFileTimestamp", DATE_TIME),
    Particle::optional("FileActionHistory", ContentModel::Sequence(&FILE_ACTION_HISTORY)),
];

/// `FileDescriptor` sequence.
const FILE_DESCRIPTOR: [Particle; 11] = [
    Particle::required("FileReference", text(1, 32)),
    Particle::required("TargetId", text(1, 80)),
    Particle::optional("ServiceId", text(1, 256)),
    Particle::optional("ServiceIdOwnerName", text(1, 256)),
    Particle::optional("UserFilename", text(1, 80)),
    Particle::optional("ParentFileReference", text(1, 32)),
    Particle::required("FileType", text(1, 40)),
    Particle::required("FileTimestamp", DATE_TIME),
    Particle::required("Status", text(1, 10)),
    Particle::optional("SubStatus", text(1, 35)),
    Particle::optional("FeedbackFileAttributes", ContentModel::Sequence(&FEEDBACK_FILE_ATTRIBUTES)),
];

/// `FileDescriptors` container.
const FILE_DESCRIPTORS: [Particle; 1] =
    [Particle::repeated("FileDescriptor", ContentModel::Sequence(&FILE_DESCRIPTOR))];

/// `FileTypeService` sequence.
const FILE_TYPE_SERVICE: [Particle; 4] = [
    Particle::required("ServiceId", text(1, 256)),
    Particle::optional("ServiceIdOwnerName", text(1, 256)),
    Particle::optional("ServiceType", text(1, 35)),
    Particle::optional("ServiceIdText", text(1, 80)),
];

/// `FileTypeServices` container.
const FILE_TYPE_SERVICES: [Particle; 1] =
    [Particle::repeated("FileTypeService", ContentModel::Sequence(&FILE_TYPE_SERVICE))];

/// `UserFileType` sequence.
const USER_FILE_TYPE: [Particle; 4] = [
    Particle::required("FileType", text(1, 40)),
    Particle::optional("FileTypeName", text(1, 80)),
    Particle::optional("Direction", text(1, 10)),
    Particle::optional("FileTypeServices", ContentModel::Sequence(&FILE_TYPE_SERVICES)),
];

/// `UserFileTypes` container.
const USER_FILE_TYPES: [Particle; 1] =
    [Particle::repeated("UserFileType", ContentModel::Sequence(&USER_FILE_TYPE))];

/// `ApplicationResponse` sequence.
const APPLICATION_RESPONSE_FIELDS: [Particle; 17] = [
    Particle::required("CustomerId", text(1, 16)),
    Particle::required("Timestamp", DATE_TIME),
    Particle::required("ResponseCode", text(1, 16)),
    Particle::required("ResponseText", text(1, 80)),
    Particle::optional("ExecutionSerial", text(1, 32)),
    Particle::optional("Encrypted", BOOLEAN),
    Particle::optional("EncryptionMethod", text(1, 35)),
    Particle::optional("Compressed", BOOLEAN),
    Particle::optional("CompressionMethod", text(1, 35)),
    Particle::optional("AmountTotal", DOUBLE),
    Particle::optional("TransactionCount", LONG),
    Particle::optional("CustomerExtension", ContentModel::Any),
    Particle::optional("FileDescriptors", ContentModel::Sequence(&FILE_DESCRIPTORS)),
    Particle::optional("UserFileTypes", ContentModel::Sequence(&USER_FILE_TYPES)),
    Particle::optional("FileType", text(1, 40)),
    Particle::optional("Content", BASE64),
    SIGNATURE,
];

/// Root declaration of `ApplicationResponse`.
pub const APPLICATION_RESPONSE: Particle = Particle::required(
    "ApplicationResponse",
    ContentModel::Sequence(&APPLICATION_RESPONSE_FIELDS),
);

// ============================================================================
// SECTION: ApplicationRequest Tables
// ============================================================================

/// `FileReferences` container of a request.
const FILE_REFERENCES: [Particle; 1] = [Particle::repeated("FileReference", text(1, 32))];

/// `ApplicationRequest` sequence.
const APPLICATION_REQUEST_FIELDS: [Particle; 23] = [
    Particle::required("CustomerId", text(1, 16)),
    Particle::optional("Command", text(1, 32)),
    Particle::required("Timestamp", DATE_TIME),
    Particle::optional("StartDate", DATE),
    Particle::optional("EndDate", DATE),
    Particle::optional("Status", text(1, 10)),
    Particle::optional("ServiceId", text(1, 256)),
    Particle::required("Environment", text(1, 10)),
    Particle::optional("FileReferences", ContentModel::Sequence(&FILE_REFERENCES)),
    Particle::optional("UserFilename", text(1, 80)),
    Particle::optional("TargetId", text(1, 80)),
    Particle::optional("ExecutionSerial", text(1, 32)),
    Particle::optional("Encryption", BOOLEAN),
    Particle::optional("EncryptionMethod", text(1, 35)),
    Particle::optional("Compression", BOOLEAN),
    Particle::optional("CompressionMethod", text(1, 35)),
    Particle::optional("AmountTotal", DOUBLE),
    Particle::optional("TransactionCount", LONG),
    Particle::required("SoftwareId", text(1, 80)),
    Particle::optional("CustomerExtension", ContentModel::Any),
    Particle::optional("FileType", text(1, 40)),
    Particle::optional("Content", BASE64),
    SIGNATURE,
];

/// Root declaration of `ApplicationRequest`.
pub const APPLICATION_REQUEST: Particle = Particle::required(
    "ApplicationRequest",
    ContentModel::Sequence(&APPLICATION_REQUEST_FIELDS),
);

// ============================================================================
// SECTION: Certificate Service Tables
// ============================================================================

/// Mandatory element of a certificate service message.
const fn cert_required(name: &'static str, content: ContentModel) -> Particle {
    Particle::required(name, content).in_namespace(CERT_XMLDATA_NS)
}

/// Optional element of a certificate service message.
const fn cert_optional(name: &'static str, content: ContentModel) -> Particle {
    Particle::optional(name, content).in_namespace(CERT_XMLDATA_NS)
}

/// `CertApplicationRequest` sequence.
const CERT_APPLICATION_REQUEST_FIELDS: [Particle; 15] = [
    cert_required("CustomerId", text(1, 16)),
    cert_required("Timestamp", DATE_TIME),
    cert_required("Environment", text(1, 10)),
    cert_required("SoftwareId", text(1, 80)),
    cert_optional("Command", text(1, 32)),
    cert_optional("ExecutionSerial", text(1, 32)),
    cert_optional("Encryption", BOOLEAN),
    cert_optional("EncryptionMethod", text(1, 35)),
    cert_optional("Compression", BOOLEAN),
    cert_optional("CompressionMethod", text(1, 35)),
    cert_required("Service", text(1, 10)),
    cert_optional("Content", BASE64),
    cert_optional("TransferKey", text(1, 16)),
    cert_optional("SerialNumber", text(1, 64)),
    SIGNATURE,
];

/// Root declaration of `CertApplicationRequest`.
pub const CERT_APPLICATION_REQUEST: Particle = cert_required(
    "CertApplicationRequest",
    ContentModel::Sequence(&CERT_APPLICATION_REQUEST_FIELDS),
);

/// One issued certificate.
const CERTIFICATE: [Particle; 3] = [
    cert_required("Name", text(1, 256)),
    cert_required("Certificate", BASE64),
    cert_optional("CertificateFormat", text(1, 35)),
];

/// `Certificates` container.
const CERTIFICATES: [Particle; 1] = [Particle::repeated(
    "Certificate",
    ContentModel::Sequence(&CERTIFICATE),
)
.in_namespace(CERT_XMLDATA_NS)];

/// `CertApplicationResponse` sequence.
const CERT_APPLICATION_RESPONSE_FIELDS: [Particle; 10] = [
    cert_required("CustomerId", text(1, 16)),
    cert_required("Timestamp", DATE_TIME),
    cert_required("ResponseCode", text(1, 16)),
    cert_required("ResponseText", text(1, 80)),
    cert_optional("Encrypted", BOOLEAN),
    cert_optional("EncryptionMethod", text(1, 35)),
    cert_optional("Compressed", BOOLEAN),
    cert_optional("CompressionMethod", text(1, 35)),
    cert_optional("Certificates", ContentModel::Sequence(&CERTIFICATES)),
    SIGNATURE,
];

/// Root declaration of `CertApplicationResponse`.
pub const CERT_APPLICATION_RESPONSE: Particle = cert_required(
    "CertApplicationResponse",
    ContentModel::Sequence(&CERT_APPLICATION_RESPONSE_FIELDS),
);

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Kind of schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    /// Root element has the wrong name or namespace.
    #[error("root element must be {expected}, found {found}")]
    WrongRoot {
        /// Expected `{namespace}name`.
        expected: String,
        /// Found `{namespace}name`.
        found: String,
    },
    /// Required element is absent.
    #[error("missing required element {element}")]
    Missing {
        /// Missing local name.
        element: String,
    },
    /// Element is out of order, repeated too often, or undeclared.
    #[error("unexpected element {element}")]
    Unexpected {
        /// Unexpected local name.
        element: String,
    },
    /// Text is shorter than the minimum length.
    #[error("value length {actual} is below minimum {min}")]
    TooShort {
        /// Minimum length.
        min: usize,
        /// Actual length.
        actual: usize,
    },
    /// Text is longer than the maximum length.
    #[error("value length {actual} exceeds maximum {max}")]
    TooLong {
        /// Maximum length.
        max: usize,
        /// Actual length.
        actual: usize,
    },
    /// Text is outside the lexical space of its type.
    #[error("invalid {type_name} value")]
    InvalidValue {
        /// Schema type name.
        type_name: &'static str,
    },
    /// Simple-typed element carries child elements.
    #[error("text-only element must not contain child elements")]
    UnexpectedChildren,
    /// Element-only content carries text.
    #[error("element-only content must not contain text")]
    UnexpectedText,
}

/// Violation located at an element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Slash-separated element path, with `[n]` for repeated elements.
    pub path: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Collected violations in document order.
    violations: Vec<Violation>,
    /// Set when violations were dropped past [`MAX_VIOLATIONS`].
    truncated: bool,
}

impl ValidationReport {
    /// Returns true when no violation was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the collected violations.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true when some violations were dropped.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Records one violation.
    fn record(&mut self, path: &str, kind: ViolationKind) {
        if self.violations.len() >= MAX_VIOLATIONS {
            self.truncated = true;
            return;
        }
        self.violations.push(Violation {
            path: path.to_string(),
            kind,
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("valid");
        }
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        if self.truncated {
            f.write_str("; further violations omitted")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a document root against a root declaration.
#[must_use]
pub fn validate_document(root: &XmlElement, declaration: &Particle) -> ValidationReport {
    let mut report = ValidationReport::default();
    if !declaration.matches(root) {
        report.record(
            &root.name,
            ViolationKind::WrongRoot {
                expected: format!("{{{}}}{}", declaration.namespace, declaration.name),
                found: format!("{{{}}}{}", root.namespace.as_deref().unwrap_or(""), root.name),
            },
        );
        return report;
    }
    validate_content(root, declaration.content, declaration.name, &mut report);
    report
}

/// Validates an element's content against its model.
fn validate_content(
    element: &XmlElement,
    content: ContentModel,
    path: &str,
    report: &mut ValidationReport,
) {
    match content {
        ContentModel::Any => {}
        ContentModel::Simple(simple) => validate_simple(element, simple, path, report),
        ContentModel::Sequence(particles) => validate_sequence(element, particles, path, report),
    }
}

/// Validates element-only sequence content.
fn validate_sequence(
    element: &XmlElement,
    particles: &[Particle],
    path: &str,
    report: &mut ValidationReport,
) {
    if !element.text.trim().is_empty() {
        report.record(path, ViolationKind::UnexpectedText);
    }
    let children = &element.children;
    let mut index = 0;
    for particle in particles {
        let mut count: u32 = 0;
        while let Some(child) = children.get(index) {
            if !particle.matches(child) || !particle.max_occurs.allows(count + 1) {
                break;
            }
            count += 1;
            let child_path = if particle.max_occurs == MaxOccurs::Bounded(1) {
                format!("{path}/{}", particle.name)
            } else {
                format!("{path}/{}[{count}]", particle.name)
            };
            validate_content(child, particle.content, &child_path, report);
            index += 1;
        }
        if count < particle.min_occurs {
            report.record(
                path,
                ViolationKind::Missing {
                    element: particle.name.to_string(),
                },
            );
        }
    }
    for child in children.iter().skip(index) {
        report.record(
            path,
            ViolationKind::Unexpected {
                element: child.name.clone(),
            },
        );
    }
}

/// Validates text-only content.
fn validate_simple(
    element: &XmlElement,
    simple: SimpleType,
    path: &str,
    report: &mut ValidationReport,
) {
    if !element.children.is_empty() {
        report.record(path, ViolationKind::UnexpectedChildren);
        return;
    }
    let value = element.text.as_str();
    let valid = match simple {
        SimpleType::Text {
            min_len,
            max_len,
        } => {
            let actual = value.chars().count();
            if actual < min_len {
                report.record(
                    path,
                    ViolationKind::TooShort {
                        min: min_len,
                        actual,
                    },
                );
            } else if actual > max_len {
                report.record(
                    path,
                    ViolationKind::TooLong {
                        max: max_len,
                        actual,
                    },
                );
            }
            true
        }
        SimpleType::Boolean => xs::parse_boolean(value).is_some(),
        SimpleType::Double => xs::parse_double(value).is_some(),
        SimpleType::Long => xs::parse_long(value).is_some(),
        SimpleType::DateTime => xs::XsDateTime::parse(value).is_ok(),
        SimpleType::Date => xs::XsDate::parse(value).is_ok(),
        SimpleType::Base64Binary => xs::parse_base64(value).is_some(),
    };
    if !valid {
        report.record(
            path,
            ViolationKind::InvalidValue {
                type_name: simple.type_name(),
            },
        );
    }
}
