// crates/bankws-client/tests/common/mod.rs
// ============================================================================
// Module: Client Test Utilities
// Description: Local mock bank and client builders for service tests.
// Purpose: Run WebService operations end to end against tiny_http.
// Dependencies: bankws-client, bankws-config, bankws-core, tiny_http, time
// ============================================================================

//! ## Overview
//! [`MockBank`] answers each incoming request with the next scripted reply
//! and keeps the received bodies; [`service`] builds a client pointed at it
//! with a fixed clock. [`ScriptedTransport`] does the same without a socket
//! for clients built from configuration, which only speak https.

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

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use bankws_client::Bank;
use bankws_client::Clock;
use bankws_client::FixedClock;
use bankws_client::HttpExchange;
use bankws_client::HttpTransport;
use bankws_client::HttpTransportConfig;
use bankws_client::Transport;
use bankws_client::TransportError;
use bankws_client::WebService;
use bankws_config::ClientConfig;
use bankws_config::Language;
use bankws_core::ApplicationResponse;
use bankws_core::CertApplicationResponse;
use bankws_core::Environment;
use bankws_core::XmlElement;
use bankws_core::XsDateTime;
use bankws_core::xs;
use time::Date;
use time::Month;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::Time;
use time::UtcOffset;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Documents
// ============================================================================

/// Instant the fixed clock starts at.
pub fn start_time() -> OffsetDateTime {
    PrimitiveDateTime::new(
        Date::from_calendar_date(2024, Month::March, 1).unwrap(),
        Time::from_hms(10, 0, 0).unwrap(),
    )
    .assume_offset(UtcOffset::from_hms(2, 0, 0).unwrap())
}

/// Accepted application response with no payload.
pub fn accepted() -> ApplicationResponse {
    ApplicationResponse::new(
        "1000000001",
        XsDateTime::parse("2024-03-01T10:00:01+02:00").unwrap(),
        "00",
        "OK.",
    )
}

/// SOAP answer to `output_element` with the given header code and document.
pub fn envelope(output_element: &str, code: &str, text: &str, document: &str) -> String {
    let encoded = xs::format_base64(document.as_bytes());
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <cor:{output_element} xmlns:cor="http://bxd.fi/CorporateFileService" xmlns:mod="http://model.bxd.fi">
      <mod:ResponseHeader>
        <mod:SenderId>OKOYFIHH</mod:SenderId>
        <mod:RequestId>echo</mod:RequestId>
        <mod:Timestamp>2024-03-01T10:00:01+02:00</mod:Timestamp>
        <mod:ResponseCode>{code}</mod:ResponseCode>
        <mod:ResponseText>{text}</mod:ResponseText>
        <mod:ReceiverId>1000000001</mod:ReceiverId>
      </mod:ResponseHeader>
      <mod:ApplicationResponse>{encoded}</mod:ApplicationResponse>
    </cor:{output_element}>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

/// Certificate service answer to `output_element` carrying `response`.
pub fn certificate_envelope(output_element: &str, response: &CertApplicationResponse) -> String {
    let encoded = xs::format_base64(response.to_xml().unwrap().as_bytes());
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <opc:{output_element} xmlns:opc="http://mlp.op.fi/OPCertificateService" xmlns:x="http://op.fi/mlp/xmldata/">
      <x:CertificateResponseHeader>
        <x:SenderId>OKOYFIHH</x:SenderId>
        <x:RequestId>echo</x:RequestId>
        <x:Timestamp>2024-03-01T10:00:01+02:00</x:Timestamp>
        <x:ResponseCode>00</x:ResponseCode>
        <x:ResponseText>OK</x:ResponseText>
      </x:CertificateResponseHeader>
      <x:ApplicationResponse>{encoded}</x:ApplicationResponse>
    </opc:{output_element}>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

/// Accepted SOAP answer carrying `response`.
pub fn accepted_envelope(output_element: &str, response: &ApplicationResponse) -> String {
    envelope(output_element, "00", "OK", &response.to_xml().unwrap())
}

/// Decoded `ApplicationRequest` of a received envelope.
pub fn sent_request(body: &str) -> XmlElement {
    let root = XmlElement::parse(body).unwrap();
    let payload = root.descendant("ApplicationRequest").unwrap();
    let bytes = xs::parse_base64(&payload.text).unwrap();
    XmlElement::parse(&String::from_utf8(bytes).unwrap()).unwrap()
}

/// `RequestHeader` of a received envelope.
pub fn sent_header(body: &str) -> XmlElement {
    let root = XmlElement::parse(body).unwrap();
    root.descendant("RequestHeader").unwrap().clone()
}

// ============================================================================
// SECTION: Mock Bank
// ============================================================================

/// Scripted local HTTP server.
pub struct MockBank {
    /// Base URL of the server.
    pub url: String,
    /// Bodies of received requests.
    pub received: Arc<Mutex<Vec<String>>>,
    /// Server thread.
    handle: thread::JoinHandle<()>,
}

impl MockBank {
    /// Starts a server answering with `replies` in order, one per request.
    pub fn start(replies: Vec<(u16, String)>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let url = format!("http://{}/services/CorporateFileService", server.server_addr().to_ip().unwrap());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handle = thread::spawn(move || {
            for (status, body) in replies {
                let Ok(mut request) = server.recv() else {
                    return;
                };
                let mut content = String::new();
                request.as_reader().read_to_string(&mut content).unwrap();
                sink.lock().unwrap().push(content);
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(Header::from_bytes(&b"Content-Type"[..], &b"text/xml"[..]).unwrap());
                request.respond(response).unwrap();
            }
        });
        Self {
            url,
            received,
            handle,
        }
    }

    /// Waits for the scripted replies to be served and returns the received bodies.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().unwrap();
        self.received.lock().unwrap().clone()
    }
}

// ============================================================================
// SECTION: Clients
// ============================================================================

/// Customer settings used by every test client.
pub fn client_config() -> ClientConfig {
    ClientConfig {
        customer_id: "1000000001".to_string(),
        environment: Environment::Test,
        software_id: "bankws-tests".to_string(),
        language: Language::En,
        target_id: "target".to_string(),
        fallback_utc_offset: None,
    }
}

/// Client pointed at `bank` with a fixed clock.
pub fn service(bank: &MockBank, clock: Arc<FixedClock>) -> WebService {
    let transport = HttpTransport::new(HttpTransportConfig {
        allow_http: true,
        timeout_ms: 5_000,
        ..HttpTransportConfig::default()
    })
    .unwrap();
    WebService::new(
        client_config(),
        Bank::new("OKOYFIHH", "https://unused.example/ws", bank.url.clone())
            .with_certificate_service("https://unused.example/cert", bank.url.clone()),
        Box::new(transport),
    )
    .with_clock(Box::new(SharedClock(clock)))
}

/// Clock handle shared between a test and its client.
struct SharedClock(Arc<FixedClock>);

impl Clock for SharedClock {
    fn now(&self) -> OffsetDateTime {
        self.0.now()
    }
}

// ============================================================================
// SECTION: Scripted Transport
// ============================================================================

/// In-process transport answering with scripted bodies.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    /// Remaining replies, served front first.
    replies: Arc<Mutex<Vec<String>>>,
    /// URLs and bodies of posted envelopes.
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    /// Transport answering with `replies` in order, status 200.
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            sent: Arc::default(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn post(&self, url: &str, envelope: &[u8]) -> Result<HttpExchange, TransportError> {
        let body = String::from_utf8(envelope.to_vec()).unwrap();
        self.sent.lock().unwrap().push((url.to_string(), body));
        let reply = self.replies.lock().unwrap().remove(0);
        Ok(HttpExchange {
            status: 200,
            body: reply.into_bytes(),
        })
    }
}

// ============================================================================
// SECTION: Shared Buffer
// ============================================================================

/// Thread-safe byte buffer for exchange log tests.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    /// Written bytes.
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Returns the written lines.
    pub fn lines(&self) -> Vec<String> {
        let guard = self.inner.lock().unwrap();
        String::from_utf8_lossy(&guard).lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
