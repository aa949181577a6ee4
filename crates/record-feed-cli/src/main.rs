// crates/record-feed-cli/src/main.rs
// ============================================================================
// Module: Record Feed CLI Entry Point
// Description: Command dispatcher for the record feed server and store tools.
// Purpose: Launch the HTTP service and inspect its configuration and data.
// Dependencies: clap, record-feed-config, record-feed-server, tokio
// ============================================================================

//! ## Overview
//! `record-feed serve` runs the HTTP service until Ctrl-C. `config validate`
//! checks a config file without starting anything, and `store list` prints
//! the stored records through a read-only connection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use record_feed_cli::serve_policy::ALLOW_NON_LOOPBACK_ENV;
use record_feed_cli::serve_policy::BindOutcome;
use record_feed_cli::serve_policy::enforce_local_only;
use record_feed_cli::serve_policy::resolve_allow_non_loopback;
use record_feed_config::RecordFeedConfig;
use record_feed_core::Record;
use record_feed_server::FeedServer;
use record_feed_store_sqlite::SqliteRecordStore;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "record-feed", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the record feed HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Record store utilities.
    Store {
        /// Selected store subcommand.
        #[command(subcommand)]
        command: StoreCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to record-feed.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the `SQLite` database path.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Override the bind address.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
    /// Allow binding to non-loopback addresses (the service has no auth).
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a record feed configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to record-feed.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Print every stored record, newest first, as JSON.
    List(StoreListCommand),
}

/// Arguments for `store list`.
#[derive(Args, Debug)]
struct StoreListCommand {
    /// Optional config file path (defaults to record-feed.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the `SQLite` database path.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
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
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("record-feed {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
        Commands::Store {
            command,
        } => command_store(command).await,
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = RecordFeedConfig::load_or_default(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if let Some(db) = command.db {
        config.store.path = db;
    }
    if let Some(bind) = command.bind {
        config.server.bind = bind;
    }
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?
        || config.server.allow_non_loopback;
    let bind_outcome = enforce_local_only(&config.server, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    config.server.allow_non_loopback = allow_non_loopback;
    config.validate().map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if bind_outcome.network_exposed {
        warn_network_exposure(&bind_outcome)?;
    }
    prepare_store_dir(&config.store.path)?;

    let server = tokio::task::spawn_blocking(move || FeedServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("record-feed: serving on http://{}", bind_outcome.bind_addr))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|err| CliError::new(format!("server failed: {err}")))?;

    Ok(ExitCode::SUCCESS)
}

/// Emits a warning banner when the server is network-exposed.
fn warn_network_exposure(outcome: &BindOutcome) -> CliResult<()> {
    let audit_status = if outcome.audit_enabled { "enabled" } else { "disabled" };
    let lines = [
        "record-feed: WARNING: network exposure enabled".to_string(),
        format!("  bind: {}", outcome.bind_addr),
        "  auth: none (every client can insert records)".to_string(),
        format!("  audit: {audit_status}"),
        format!("  opt-in: --allow-non-loopback, {ALLOW_NON_LOOPBACK_ENV}, or config"),
    ];
    for line in lines {
        write_stderr_line(&line).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

/// Creates the database parent directory when it is missing.
///
/// A failure is reported but not fatal; the server starts with its schema
/// pending and answers store requests with `500` until the path is usable.
fn prepare_store_dir(path: &Path) -> CliResult<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(());
    };
    if let Err(err) = fs::create_dir_all(parent) {
        write_stderr_line(&format!(
            "record-feed: WARNING: cannot create store directory {}: {err}",
            parent.display()
        ))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = RecordFeedConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config valid").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Dispatches store subcommands.
async fn command_store(command: StoreCommand) -> CliResult<ExitCode> {
    match command {
        StoreCommand::List(command) => command_store_list(command).await,
    }
}

/// Executes the `store list` command.
async fn command_store_list(command: StoreListCommand) -> CliResult<ExitCode> {
    let mut config = RecordFeedConfig::load_or_default(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if let Some(db) = command.db {
        config.store.path = db;
    }
    let records = tokio::task::spawn_blocking(move || -> Result<Vec<Record>, String> {
        let store = SqliteRecordStore::new(config.store.to_sqlite_config())
            .map_err(|err| err.to_string())?;
        store.list_read_only().map_err(|err| err.to_string())
    })
    .await
    .map_err(|err| CliError::new(format!("store list failed: join failed: {err}")))?
    .map_err(|err| CliError::new(format!("store list failed: {err}")))?;
    let payload = serde_json::to_string_pretty(&records)
        .map_err(|err| CliError::new(format!("store list failed: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
