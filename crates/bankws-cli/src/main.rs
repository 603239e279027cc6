// crates/bankws-cli/src/main.rs
// ============================================================================
// Module: Bankws CLI Entry Point
// Description: Command dispatcher for offline document tools and bank operations.
// Purpose: Inspect bank documents and run WebService operations from a shell.
// Dependencies: bankws-client, bankws-config, bankws-core, clap, serde_json, time
// ============================================================================

//! ## Overview
//! `bankws` has two groups of commands. Offline commands (`validate`,
//! `inspect`, `account`, `statement`, `config`) read local files and never
//! touch the network. Online commands (`upload`, `download`, `list`,
//! `transactions`, `payment-status`, `notification`, `certificate`,
//! `service-certificates`) load `bankws.toml` and talk to the bank.
//! Reports are printed as pretty JSON on stdout; errors go to stderr with a
//! failure exit code.
//!
//! Security posture: input files are untrusted and read with size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use bankws_client::WebService;
use bankws_config::BankWsConfig;
use bankws_config::config_toml_example;
use bankws_core::AccountNumber;
use bankws_core::ApplicationResponse;
use bankws_core::CertApplicationResponse;
use bankws_core::DebitCreditNotification;
use bankws_core::FileListFilter;
use bankws_core::FileListStatus;
use bankws_core::PaymentStatusReport;
use bankws_core::ResponseError;
use bankws_core::TransactionList;
use bankws_core::UploadFile;
use bankws_core::XsDate;
use bankws_core::camt::CreditDebit;
use bankws_core::statement::ExtraInfo;
use bankws_core::statement::TransactionMarker;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an XML document read from disk.
const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a file uploaded to the bank.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a statement text file.
const MAX_STATEMENT_BYTES: usize = 8 * 1024 * 1024;
/// Maximum size of a certificate signing request.
const MAX_SIGNING_REQUEST_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bankws", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an `ApplicationResponse` document against the schema.
    Validate(DocumentArgs),
    /// Summarize an `ApplicationResponse` document.
    Inspect(DocumentArgs),
    /// Normalize a Finnish account number.
    Account(AccountCommand),
    /// Parse a TP1 3ST transaction statement.
    Statement(DocumentArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Upload a file to the bank.
    Upload(UploadCommand),
    /// Download a file by reference.
    Download(DownloadCommand),
    /// List files available for download.
    List(ListCommand),
    /// Query account transactions.
    Transactions(TransactionsCommand),
    /// Download a SEPA payment status report.
    PaymentStatus(PaymentStatusCommand),
    /// Download a camt.054 debit credit notification.
    Notification(PaymentStatusCommand),
    /// Enroll a signing certificate with a one-time transfer key.
    Certificate(CertificateCommand),
    /// Fetch the bank's own service certificates.
    ServiceCertificates(ServiceCertificatesCommand),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigArgs),
    /// Print a canonical example configuration.
    Example,
}

/// A single local input document.
#[derive(Args, Debug)]
struct DocumentArgs {
    /// Path to the document.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

/// Arguments for the account command.
#[derive(Args, Debug)]
struct AccountCommand {
    /// BBAN (`123456-785`) or IBAN (`FI21 1234 5600 0007 85`).
    #[arg(value_name = "ACCOUNT")]
    account: String,
}

/// Config file selection shared by every online command.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Config file path (defaults to `BANKWS_CONFIG` or bankws.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for uploads.
#[derive(Args, Debug)]
struct UploadCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// File to upload.
    #[arg(value_name = "PATH")]
    path: PathBuf,
    /// Bank file type, for example `pain.001.001.02`.
    #[arg(long, value_name = "TYPE")]
    file_type: String,
    /// Filename reported to the bank (defaults to the file's name).
    #[arg(long, value_name = "NAME")]
    filename: Option<String>,
    /// Target folder (defaults to `client.target_id`).
    #[arg(long, value_name = "TARGET")]
    target: Option<String>,
    /// Send the content without gzip compression.
    #[arg(long, action = ArgAction::SetTrue)]
    no_compress: bool,
}

/// Arguments for downloads.
#[derive(Args, Debug)]
struct DownloadCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// File reference from a file list.
    #[arg(value_name = "REFERENCE")]
    reference: String,
    /// Write the decoded content here instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// File list status filter.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum StatusArg {
    /// Files not downloaded yet.
    New,
    /// Files already downloaded.
    Dld,
    /// Every file.
    All,
}

impl From<StatusArg> for FileListStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::New => Self::New,
            StatusArg::Dld => Self::Downloaded,
            StatusArg::All => Self::All,
        }
    }
}

/// Arguments for file lists.
#[derive(Args, Debug)]
struct ListCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Status filter.
    #[arg(long, value_enum, default_value_t = StatusArg::New)]
    status: StatusArg,
    /// File type filter.
    #[arg(long, value_name = "TYPE")]
    file_type: Option<String>,
    /// Earliest file date (`YYYY-MM-DD`).
    #[arg(long, value_name = "DATE")]
    start_date: Option<String>,
    /// Latest file date (`YYYY-MM-DD`).
    #[arg(long, value_name = "DATE")]
    end_date: Option<String>,
}

/// Arguments for transaction queries.
#[derive(Args, Debug)]
struct TransactionsCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Account to query.
    #[arg(long, value_name = "ACCOUNT")]
    account: String,
    /// Include transactions already reported.
    #[arg(long, action = ArgAction::SetTrue)]
    all: bool,
}

/// Arguments for downloads parsed as a report.
#[derive(Args, Debug)]
struct PaymentStatusCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// File reference of the report.
    #[arg(value_name = "REFERENCE")]
    reference: String,
}

/// Arguments for certificate enrollment.
#[derive(Args, Debug)]
struct CertificateCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// DER-encoded PKCS#10 signing request.
    #[arg(long, value_name = "PATH")]
    csr: PathBuf,
    /// Sixteen digit transfer key delivered by the bank.
    #[arg(long, value_name = "KEY")]
    transfer_key: String,
    /// Directory receiving one PEM file per issued certificate.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

/// Arguments for the service certificate query.
#[derive(Args, Debug)]
struct ServiceCertificatesCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Directory receiving one PEM file per certificate.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a printable message.
#[derive(Debug)]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.message),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Validate(args) => command_validate(&args),
        Commands::Inspect(args) => command_inspect(&args),
        Commands::Account(command) => command_account(&command),
        Commands::Statement(args) => command_statement(&args),
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Upload(command) => command_upload(command),
        Commands::Download(command) => command_download(&command),
        Commands::List(command) => command_list(command),
        Commands::Transactions(command) => command_transactions(&command),
        Commands::PaymentStatus(command) => command_payment_status(&command),
        Commands::Notification(command) => command_notification(&command),
        Commands::Certificate(command) => command_certificate(command),
        Commands::ServiceCertificates(command) => command_service_certificates(&command),
    }
}

/// Emits the top-level help message.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Offline Commands
// ============================================================================

/// Validates a response document and lists every violation.
fn command_validate(args: &DocumentArgs) -> CliResult<ExitCode> {
    let xml = read_text(&args.path, MAX_DOCUMENT_BYTES)?;
    match ApplicationResponse::from_xml(&xml) {
        Ok(_) => {
            write_line(&format!("{}: valid", args.path.display()))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ResponseError::Schema(report)) => {
            write_line(&format!("{}: invalid", args.path.display()))?;
            for violation in report.violations() {
                write_line(&format!("  {violation}"))?;
            }
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(CliError::new(format!("{}: {err}", args.path.display()))),
    }
}

/// Prints a JSON summary of a response document.
fn command_inspect(args: &DocumentArgs) -> CliResult<ExitCode> {
    let xml = read_text(&args.path, MAX_DOCUMENT_BYTES)?;
    let response = ApplicationResponse::from_xml(&xml)
        .map_err(|err| CliError::new(format!("{}: {err}", args.path.display())))?;
    write_json(&response_summary(&response))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the machine and IBAN forms of an account number.
fn command_account(command: &AccountCommand) -> CliResult<ExitCode> {
    let account =
        AccountNumber::parse(&command.account).map_err(|err| CliError::new(err.to_string()))?;
    write_json(&account_summary(&account))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints a JSON summary of a statement file.
fn command_statement(args: &DocumentArgs) -> CliResult<ExitCode> {
    let text = read_text(&args.path, MAX_STATEMENT_BYTES)?;
    let list = TransactionList::parse(&text)
        .map_err(|err| CliError::new(format!("{}: {err}", args.path.display())))?;
    write_json(&statement_summary(&list))?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            load_config(&args)?;
            write_line("config ok")?;
        }
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Online Commands
// ============================================================================

/// Uploads a local file.
fn command_upload(command: UploadCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let content = read_bytes_with_limit(&command.path, MAX_UPLOAD_BYTES)?;
    let user_filename = match command.filename {
        Some(name) => name,
        None => file_name(&command.path)?,
    };
    let upload = UploadFile {
        target_id: command.target.unwrap_or_else(|| config.client.target_id.clone()),
        user_filename,
        file_type: command.file_type,
        content,
        compress: !command.no_compress,
    };
    let response = connect(&config)?.upload_file(upload).map_err(request_failed)?;
    write_json(&response_summary(&response))?;
    Ok(ExitCode::SUCCESS)
}

/// Downloads one file and writes its decoded content.
fn command_download(command: &DownloadCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let response = connect(&config)?.download_file(&command.reference).map_err(request_failed)?;
    let content = response
        .decoded_content()
        .map_err(|err| CliError::new(err.to_string()))?
        .ok_or_else(|| CliError::new("response has no content".to_string()))?;
    match &command.output {
        Some(path) => {
            fs::write(path, &content)
                .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?;
            write_line(&format!("wrote {} bytes to {}", content.len(), path.display()))?;
        }
        None => write_stdout_bytes(&content)
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Lists downloadable files.
fn command_list(command: ListCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let filter = FileListFilter {
        status: command.status.into(),
        start_date: command.start_date.as_deref().map(parse_date).transpose()?,
        end_date: command.end_date.as_deref().map(parse_date).transpose()?,
        target_id: None,
        file_type: command.file_type,
    };
    let response = connect(&config)?.download_file_list(filter).map_err(request_failed)?;
    write_json(&response_summary(&response))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs a transaction query for one account.
fn command_transactions(command: &TransactionsCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let account =
        AccountNumber::parse(&command.account).map_err(|err| CliError::new(err.to_string()))?;
    let list = connect(&config)?
        .transaction_query(&account, !command.all)
        .map_err(request_failed)?;
    write_json(&statement_summary(&list))?;
    Ok(ExitCode::SUCCESS)
}

/// Downloads and summarizes a payment status report.
fn command_payment_status(command: &PaymentStatusCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let report = connect(&config)?
        .download_payment_status(&command.reference)
        .map_err(request_failed)?;
    write_json(&payment_status_summary(&report))?;
    Ok(if report.is_rejected() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Downloads and summarizes a debit credit notification.
fn command_notification(command: &PaymentStatusCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let notification = connect(&config)?
        .download_notification(&command.reference)
        .map_err(request_failed)?;
    write_json(&notification_summary(&notification))?;
    Ok(ExitCode::SUCCESS)
}

/// Enrolls a signing certificate.
fn command_certificate(command: CertificateCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let signing_request = read_bytes_with_limit(&command.csr, MAX_SIGNING_REQUEST_BYTES)?;
    let response = connect(&config)?
        .get_certificate(signing_request, &command.transfer_key)
        .map_err(request_failed)?;
    finish_certificates(&response, command.output_dir.as_deref())
}

/// Fetches the bank's service certificates.
fn command_service_certificates(command: &ServiceCertificatesCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let response = connect(&config)?.get_service_certificates().map_err(request_failed)?;
    finish_certificates(&response, command.output_dir.as_deref())
}

/// Writes PEM files when requested and prints the certificate summary.
fn finish_certificates(
    response: &CertApplicationResponse,
    output_dir: Option<&Path>,
) -> CliResult<ExitCode> {
    if let Some(dir) = output_dir {
        write_pem_files(response, dir)?;
    }
    write_json(&certificate_summary(response))?;
    Ok(if response.is_accepted() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Writes `<name>.pem` for every certificate into `dir`.
fn write_pem_files(response: &CertApplicationResponse, dir: &Path) -> CliResult<()> {
    for certificate in &response.certificates {
        let name = pem_file_name(&certificate.name)?;
        let path = dir.join(name);
        fs::write(&path, certificate.to_pem())
            .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?;
    }
    Ok(())
}

/// File name for a certificate, refusing names that leave the directory.
fn pem_file_name(name: &str) -> CliResult<String> {
    let usable = !name.is_empty()
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        && !name.starts_with('.');
    if usable {
        Ok(format!("{name}.pem"))
    } else {
        Err(CliError::new(format!("certificate name {name:?} is not a safe file name")))
    }
}

/// Loads and validates the configuration.
fn load_config(args: &ConfigArgs) -> CliResult<BankWsConfig> {
    BankWsConfig::load(args.config.as_deref()).map_err(|err| CliError::new(err.to_string()))
}

/// Builds the WebService client.
fn connect(config: &BankWsConfig) -> CliResult<WebService> {
    WebService::from_config(config).map_err(|err| CliError::new(err.to_string()))
}

/// Maps a failed operation to a CLI error.
fn request_failed(err: bankws_client::WsError) -> CliError {
    CliError::new(format!("request failed: {err}"))
}

/// Parses a `YYYY-MM-DD` argument.
fn parse_date(text: &str) -> CliResult<XsDate> {
    XsDate::parse(text).map_err(|err| CliError::new(format!("invalid date {text}: {err}")))
}

/// Returns the final path component as UTF-8.
fn file_name(path: &Path) -> CliResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CliError::new(format!("{}: no usable file name", path.display())))
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// JSON summary of an application response.
fn response_summary(response: &ApplicationResponse) -> Value {
    let files: Vec<Value> = response
        .file_descriptors
        .iter()
        .map(|file| {
            json!({
                "file_reference": file.file_reference,
                "target_id": file.target_id,
                "file_type": file.file_type,
                "file_timestamp": file.file_timestamp.as_str(),
                "status": file.status,
                "user_filename": file.user_filename,
            })
        })
        .collect();
    let file_types: Vec<Value> = response
        .user_file_types
        .iter()
        .map(|file_type| {
            json!({
                "file_type": file_type.file_type,
                "name": file_type.file_type_name,
                "direction": file_type.direction,
            })
        })
        .collect();
    let issues: Vec<String> =
        response.consistency_issues().iter().map(ToString::to_string).collect();
    let signature = match response.signature_info() {
        Ok(Some(info)) => json!({
            "signature_method": info.signature_method,
            "references": info.references.len(),
            "certificate_sha256": info.certificate_fingerprint(),
        }),
        Ok(None) => Value::Null,
        Err(err) => json!({ "error": err.to_string() }),
    };
    json!({
        "customer_id": response.customer_id,
        "timestamp": response.timestamp.as_str(),
        "response_code": response.response_code,
        "response_text": response.response_text,
        "accepted": response.is_accepted(),
        "file_type": response.file_type,
        "content_bytes": response.content.as_ref().map(Vec::len),
        "files": files,
        "user_file_types": file_types,
        "consistency_issues": issues,
        "signature": signature,
    })
}

/// JSON summary of an account number.
fn account_summary(account: &AccountNumber) -> Value {
    json!({
        "branch": account.branch(),
        "account": account.account(),
        "machine_format": account.machine_format(),
        "iban": account.to_iban(),
    })
}

/// JSON summary of a transaction statement.
fn statement_summary(list: &TransactionList) -> Value {
    let transactions: Vec<Value> = list
        .transactions
        .iter()
        .map(|transaction| {
            let record = &transaction.record;
            json!({
                "archive_id": record.archive_id,
                "payment_date": record.payment_date.map(|date| date.to_string()),
                "kind": marker_label(record.marker),
                "description": record.description,
                "amount": record.amount.to_string(),
                "name": record.name,
                "reference": record.reference,
                "messages": free_messages(&transaction.extras),
            })
        })
        .collect();
    json!({
        "account": list.basic.as_ref().map(|basic| basic.account.clone()),
        "currency": list.basic.as_ref().map(|basic| basic.currency.clone()),
        "transactions": transactions,
        "balance": list.balance.as_ref().map(|balance| json!({
            "date": balance.date.to_string(),
            "balance": balance.balance.to_string(),
            "available": balance.available.to_string(),
        })),
        "notices": list
            .information
            .iter()
            .flat_map(|notice| notice.messages.iter().cloned())
            .collect::<Vec<String>>(),
    })
}

/// JSON summary of a payment status report.
fn payment_status_summary(report: &PaymentStatusReport) -> Value {
    let transactions: Vec<Value> = report
        .transactions
        .iter()
        .map(|status| {
            json!({
                "end_to_end_id": status.original_end_to_end_id,
                "status": status.status,
                "reason_code": status.reason_code,
                "info": status.additional_info,
            })
        })
        .collect();
    json!({
        "message_id": report.message_id,
        "original_message_id": report.original_message_id,
        "group_status": report.group_status,
        "rejected": report.is_rejected(),
        "reason_code": report.reason_code,
        "info": report.additional_info,
        "transactions": transactions,
    })
}

/// JSON summary of a certificate service response.
fn certificate_summary(response: &CertApplicationResponse) -> Value {
    let certificates: Vec<Value> = response
        .certificates
        .iter()
        .map(|certificate| {
            json!({
                "name": certificate.name,
                "format": certificate.format,
                "der_bytes": certificate.certificate.len(),
                "sha256": certificate.fingerprint(),
            })
        })
        .collect();
    json!({
        "customer_id": response.customer_id,
        "timestamp": response.timestamp.as_str(),
        "response_code": response.response_code,
        "response_text": response.response_text,
        "accepted": response.is_accepted(),
        "certificates": certificates,
    })
}

/// JSON summary of a debit credit notification.
fn notification_summary(notification: &DebitCreditNotification) -> Value {
    let accounts: Vec<Value> = notification
        .notifications
        .iter()
        .map(|account| {
            let entries: Vec<Value> = account
                .entries
                .iter()
                .map(|entry| {
                    json!({
                        "amount": entry.amount.to_string(),
                        "currency": entry.currency,
                        "direction": match entry.direction {
                            CreditDebit::Credit => "credit",
                            CreditDebit::Debit => "debit",
                        },
                        "booking_date": entry.booking_date.as_ref().map(ToString::to_string),
                        "servicer_reference": entry.servicer_reference,
                        "transactions": entry.transactions.len(),
                    })
                })
                .collect();
            json!({
                "id": account.id,
                "iban": account.account_iban,
                "net_amount": account.net_amount().to_string(),
                "entries": entries,
            })
        })
        .collect();
    json!({
        "message_id": notification.message_id,
        "created": notification.created,
        "notifications": accounts,
    })
}

/// Label of a booking kind.
fn marker_label(marker: TransactionMarker) -> String {
    match marker {
        TransactionMarker::Deposit => "deposit".to_string(),
        TransactionMarker::Withdrawal => "withdrawal".to_string(),
        TransactionMarker::DepositCorrection => "deposit_correction".to_string(),
        TransactionMarker::WithdrawalCorrection => "withdrawal_correction".to_string(),
        TransactionMarker::Unknown(code) => format!("unknown:{code}"),
    }
}

/// Free-form message lines of a transaction.
fn free_messages(extras: &[ExtraInfo]) -> Vec<String> {
    extras
        .iter()
        .filter_map(|extra| match extra {
            ExtraInfo::FreeMessage(lines) => Some(lines.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

// ============================================================================
// SECTION: Input
// ============================================================================

/// Reads a file, refusing anything larger than `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let describe = |err: std::io::Error| CliError::new(format!("{}: {err}", path.display()));
    let file = File::open(path).map_err(describe)?;
    let size = file.metadata().map_err(describe)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(too_large(path, max_bytes));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(describe)?;
    if bytes.len() > max_bytes {
        return Err(too_large(path, max_bytes));
    }
    Ok(bytes)
}

/// Reads a UTF-8 text file with a size limit.
fn read_text(path: &Path, max_bytes: usize) -> CliResult<String> {
    let bytes = read_bytes_with_limit(path, max_bytes)?;
    String::from_utf8(bytes)
        .map_err(|_| CliError::new(format!("{}: file is not utf-8", path.display())))
}

/// Size limit failure for `path`.
fn too_large(path: &Path, max_bytes: usize) -> CliError {
    CliError::new(format!("{}: file exceeds {max_bytes} bytes", path.display()))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a message line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Writes a line to stdout, mapping output failures.
fn write_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a pretty JSON value to stdout.
fn write_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("json output failed: {err}")))?;
    write_line(&text)
}

/// Writes a message line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
