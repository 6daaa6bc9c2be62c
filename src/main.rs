//! dualserve - start paired HTTP and HTTPS servers from a config file
//!
//! Usage:
//!     dualserve --config <path>
//!
//! See --help for more options.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use dualserve::config::{load_config, normalize_options};
use dualserve::util::init_logging;
use dualserve::{create_servers, ServerOptions};

/// Start paired HTTP and HTTPS servers that share a single request handler.
#[derive(Parser, Debug)]
#[command(name = "dualserve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(&cli.config).with_context(|| {
        format!(
            "failed to load configuration from '{}'",
            cli.config.display()
        )
    })?;

    // Initialize logging (CLI level overrides config)
    init_logging(&config.global, cli.log_level.as_deref());

    // The binary serves a built-in responder; embedders use the library API
    // and bring their own handler.
    let options = ServerOptions {
        handler: Some(Arc::new(respond)),
        http: config.http,
        https: config.https,
    };

    // If --validate flag, just normalize and exit
    if cli.validate {
        let plan = normalize_options(options).context("configuration is invalid")?;
        info!("configuration is valid");
        println!("Configuration is valid.");
        if let Some(http) = &plan.http {
            println!(
                "  http: port {} on {}",
                http.port,
                http.ip.as_deref().unwrap_or("all interfaces")
            );
        }
        if let Some(https) = &plan.https {
            println!(
                "  https: port {} on {}, certificates in {}",
                https.port,
                https.ip.as_deref().unwrap_or("all interfaces"),
                https.tls.root.display()
            );
        }
        return Ok(());
    }

    info!(config_path = %cli.config.display(), "dualserve starting");

    run(options)
}

/// Run the servers with the given options.
fn run(options: ServerOptions) -> Result<()> {
    // Create tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(options).await })
}

/// Async entry point.
async fn run_async(options: ServerOptions) -> Result<()> {
    let servers = create_servers(options).await?;

    if let Some(server) = &servers.http {
        info!(addr = %server.local_addr(), "http server ready");
    }
    if let Some(server) = &servers.https {
        info!(addr = %server.local_addr(), "https server ready");
    }

    info!("dualserve is running");
    info!("press Ctrl+C to stop");

    // Wait for shutdown signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("received shutdown signal");
        }
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    }

    servers.stop();
    info!("dualserve stopped");
    Ok(())
}

/// Built-in responder: echoes the method and path of every request.
async fn respond(request: Request<Incoming>) -> Response<Full<Bytes>> {
    let body = format!("dualserve: {} {}\n", request.method(), request.uri().path());
    Response::new(Full::new(Bytes::from(body)))
}
