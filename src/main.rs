use anyhow::Result;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Notion, Telegram and local fact memory for Model Context Protocol clients
///
/// Serves MCP over stdio by default, or over HTTP/SSE when a port is given.
#[derive(Parser, Debug)]
#[command(name = "engram-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serve MCP over HTTP/SSE on this port instead of stdio
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind when --port is given
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Environment file to load (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log to file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout carries the protocol, so logs go to stderr or a file
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(log_file.is_none())
        .with_file(true)
        .with_line_number(true);

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, args.log_file)?;

    info!("Starting engram-mcp v{}", env!("CARGO_PKG_VERSION"));

    engram_mcp::ConfigLoader::load_env_file(args.env_file.as_deref())?;

    let config = match engram_mcp::ConfigLoader::new().and_then(|loader| loader.load()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Configuration loaded: {:?}", config);

    if config.notion_api_key.is_none() {
        warn!("NOTION_API_KEY not set; Notion tools will report an error");
    }
    if config.telegram.is_none() {
        warn!("Telegram credentials not set; send_alert will report an error");
    }

    let store = engram_mcp::FactStore::new(config.memory_path.clone());
    match store.init() {
        Ok(()) => info!("Fact memory at {}", store.path().display()),
        Err(e) => warn!("Failed to initialize fact memory at {}: {}", store.path().display(), e),
    }

    let toolbox = Arc::new(engram_mcp::Toolbox::from_config(config)?);
    let server = engram_mcp::McpServer::new(toolbox);

    match args.port {
        Some(port) => server.run_http(SocketAddr::new(args.host, port)).await?,
        None => {
            info!("engram-mcp ready to accept MCP requests on stdio");
            server.run_stdio().await?;
        }
    }

    info!("engram-mcp shut down");

    Ok(())
}
