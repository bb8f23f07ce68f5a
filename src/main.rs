//! hyview - inspect file metadata from a Hydrus client

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hyview::{ApiError, ClientConfig, FilesService, HydrusClient};

/// CLI command
#[derive(Debug)]
enum Command {
    /// Full metadata by file id
    Metadata { ids: Vec<u64> },
    /// Basic metadata by file id
    Basic { ids: Vec<u64> },
    /// Basic metadata by hash
    Hash { hashes: Vec<String> },
    /// Show the server's API version
    Version,
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"hyview - inspect file metadata from a Hydrus client

USAGE:
    hyview metadata <file_id>...
    hyview basic <file_id>...
    hyview hash <sha256>...
    hyview version
    hyview help

ENVIRONMENT:
    HYDRUS_API_URL       Client API URL (default http://127.0.0.1:45869)
    HYDRUS_ACCESS_KEY    Client API access key (required)
    HYDRUS_TIMEOUT_SECS  Request timeout in seconds (default 30)
    HYDRUS_CHUNK_SIZE    File ids per metadata request (default 256)
    RUST_LOG             Log filter, e.g. debug or hyview=trace (default info)
"#
    );
}

fn parse_ids(args: &[String]) -> Result<Vec<u64>> {
    if args.is_empty() {
        return Err(anyhow!("At least one file id is required"));
    }
    args.iter()
        .map(|arg| {
            arg.parse::<u64>()
                .with_context(|| format!("Invalid file id: {}", arg))
        })
        .collect()
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "metadata" => Ok(Command::Metadata {
            ids: parse_ids(&args[2..])?,
        }),
        "basic" => Ok(Command::Basic {
            ids: parse_ids(&args[2..])?,
        }),
        "hash" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: hyview hash <sha256>..."));
            }
            Ok(Command::Hash {
                hashes: args[2..].to_vec(),
            })
        }
        "version" => Ok(Command::Version),
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    if let Command::Help = command {
        print_help();
        return Ok(());
    }

    let config = ClientConfig::from_env()?;
    info!(api_url = %config.api_url, chunk_size = config.chunk_size, "Connecting to client API");

    let client = HydrusClient::new(&config).context("Failed to create API client")?;
    let files = FilesService::with_chunk_size(Arc::new(client), config.chunk_size);

    let result = match command {
        Command::Metadata { ids } => print_json(&files.get_file_metadata(&ids).await?),
        Command::Basic { ids } => {
            let found = files.get_basic_files_by_id(&ids).await?;
            if found.len() < ids.len() {
                info!(requested = ids.len(), found = found.len(), "Some files were not returned");
            }
            print_json(&found)
        }
        Command::Hash { hashes } => print_json(&files.get_basic_files_by_hash(&hashes).await?),
        Command::Version => print_json(&files.api_version().await?),
        Command::Help => Ok(()),
    };

    if let Err(e) = &result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_transport) {
            error!(error = %e, api_url = %config.api_url, "Client API unreachable");
        } else {
            error!(error = %e, "Command failed");
        }
    }
    files.cache().log_metrics();
    result
}
