//! mcp-server-chart: MCP server exposing chart generation tools
//!
//! Runs the chart tool catalog over stdio, server-sent events, or stateless
//! streamable HTTP.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use mcp_server_chart::bootstrap::{self, Launch, TransportSelection, DEFAULT_HOST, DEFAULT_PORT};
use mcp_server_chart::config;
use mcp_server_chart::mcp::transport::shutdown_signal;

/// MCP server exposing chart generation tools.
///
/// When the PORT environment variable is set the server runs in cloud mode:
/// streamable HTTP on HOST (default 0.0.0.0) at /mcp, ignoring the
/// transport flags.
#[derive(Parser, Debug)]
#[command(name = "mcp-server-chart")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Transport protocol
    #[arg(short, long, value_enum, default_value_t = TransportSelection::Stdio)]
    transport: TransportSelection,

    /// Host for the sse and streamable transports
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port for the sse and streamable transports
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Endpoint path (default: /sse for sse, /mcp for streamable)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber. Logs go to stderr because stdout
/// carries protocol messages in stdio mode.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nConfig is read from: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting mcp-server-chart"
    );

    let launch = Launch::resolve(
        |key| std::env::var(key).ok(),
        args.transport,
        &args.host,
        args.port,
        args.endpoint.as_deref(),
    );

    let dispatcher = match bootstrap::build_dispatcher(&cfg) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!(error = %e, "Failed to build server");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(bootstrap::run(&launch, dispatcher, shutdown_signal()));

    // A pending stdin read would otherwise hold the runtime open
    runtime.shutdown_timeout(Duration::from_secs(1));

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
