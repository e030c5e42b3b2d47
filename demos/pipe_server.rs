//! Pipe broadcast server
//!
//! Run with: cargo run --example pipe_server [BIND_ADDR] [--pipe PATH]
//!
//! Examples:
//!   cargo run --example pipe_server                          # 0.0.0.0:8083, /tmp/pipecast.pipe
//!   cargo run --example pipe_server localhost                # 127.0.0.1:8083
//!   cargo run --example pipe_server 127.0.0.1:9090           # custom port
//!   cargo run --example pipe_server --pipe /run/feed.pipe    # custom pipe
//!
//! ## Feeding lines
//!
//! Any process that writes lines into the pipe:
//!   echo "hello subscribers" > /tmp/pipecast.pipe
//!   tail -f app.log > /tmp/pipecast.pipe
//!
//! ## Subscribing
//!
//! Any WebSocket client:
//!   websocat ws://localhost:8083

use std::net::SocketAddr;
use std::path::PathBuf;

use pipecast::{PipecastServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8083
/// - "localhost:9090" -> 127.0.0.1:9090
/// - "127.0.0.1" -> 127.0.0.1:8083
/// - "0.0.0.0:8083" -> 0.0.0.0:8083
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = pipecast::server::DEFAULT_PORT;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: pipe_server [BIND_ADDR] [--pipe PATH]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8083)");
    eprintln!("  --pipe PATH  Named pipe to read lines from (default: /tmp/pipecast.pipe)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  pipe_server                          # 0.0.0.0:8083, /tmp/pipecast.pipe");
    eprintln!("  pipe_server localhost:9090           # custom port");
    eprintln!("  pipe_server --pipe /run/feed.pipe    # custom pipe path");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut pipe_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pipe" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("Error: --pipe requires a path");
                    eprintln!();
                    print_usage();
                    std::process::exit(1);
                };
                pipe_path = Some(PathBuf::from(path));
                i += 2;
            }
            addr_str => {
                match parse_bind_addr(addr_str) {
                    Ok(addr) => bind_addr = Some(addr),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        eprintln!();
                        print_usage();
                        std::process::exit(1);
                    }
                }
                i += 1;
            }
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pipecast=debug".parse()?)
                .add_directive("pipe_server=debug".parse()?),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Some(addr) = bind_addr {
        config = config.bind(addr);
    }
    if let Some(path) = pipe_path {
        config = config.pipe_path(path);
    }

    println!("Starting pipecast server on {}", config.bind_addr);
    println!();
    println!("=== Feed lines ===");
    println!("echo \"hello subscribers\" > {}", config.pipe_path.display());
    println!("tail -f app.log > {}", config.pipe_path.display());
    println!();
    println!("=== Subscribe ===");
    println!("websocat ws://localhost:{}", config.bind_addr.port());
    println!();

    let server = PipecastServer::new(config);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            let stats = server.stats().snapshot();
            println!(
                "\nShutting down: {} lines broadcast, {} subscribers total, {} reaped",
                stats.lines_broadcast, stats.subscribers_connected, stats.peers_reaped
            );
        }
    }

    Ok(())
}
