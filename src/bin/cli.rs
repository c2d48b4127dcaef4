//! cqlink CLI Client
//!
//! Command-line interface for talking to a CQL native protocol server.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use cqlink::{Connection, ConnectionConfig, CqlError};
use tracing_subscriber::{fmt, EnvFilter};

/// cqlink CLI
#[derive(Parser, Debug)]
#[command(name = "cqlink-cli")]
#[command(about = "CLI for CQL native protocol servers")]
#[command(version)]
struct Args {
    /// Server address (host or host:port, default port 9042)
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "1000")]
    connect_timeout_ms: u64,

    /// Receive timeout in milliseconds (0 waits forever)
    #[arg(long, default_value = "1000")]
    recv_timeout_ms: u64,

    /// CQL_VERSION requested in STARTUP
    #[arg(long, default_value = "3.0.0")]
    cql_version: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the options the server advertises
    Options,

    /// Run a statement (only USE results are printed)
    Query {
        /// The CQL statement
        cql: String,
    },
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.verbose { "info,cqlink=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CqlError> {
    let recv_timeout = match args.recv_timeout_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };

    let config = ConnectionConfig::builder()
        .address(&args.host)
        .connect_timeout(Duration::from_millis(args.connect_timeout_ms))
        .recv_timeout(recv_timeout)
        .cql_version(&args.cql_version)
        .build();

    tracing::info!("cqlink v{} connecting to {}", cqlink::VERSION, config.socket_address());
    let mut conn = Connection::connect(&config)?;

    let outcome = match args.command {
        Commands::Options => {
            for (name, values) in conn.supported() {
                println!("{}: {}", name, values.join(", "));
            }
            Ok(())
        }
        Commands::Query { cql } => conn.query(&cql).map(|keyspace| {
            println!("keyspace: {}", keyspace);
        }),
    };

    let closed = conn.close();
    outcome?;
    closed
}
