//! selfconfig CLI - JSON bridge for host processes
//!
//! Commands: scope-hash, config-id, read-config, countries
//! Outputs one JSON document to stdout; logs go to stderr
//! Exit codes: 0 success, 2 rejected input or config not found, 1 failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use selfconfig_core::{
    service::{ConfigIdRequest, ReadConfigRequest, ScopeHashRequest, ValidationStatus},
    ConfigService, JsonRpcClient, NetworkRegistry, ReaderConfig,
};

#[derive(Parser)]
#[command(name = "selfconfig-cli", version)]
#[command(about = "selfconfig CLI - scope hashes, config ids and on-chain config reads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory of extra network descriptor JSON files
    #[arg(short, long, default_value = "networks")]
    networks_dir: PathBuf,

    /// Per-request RPC timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Verbose logging to stderr. Repeat for more (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash an endpoint and scope seed
    ScopeHash {
        /// Contract address (0x...) or https:// URL
        #[arg(short, long)]
        endpoint: String,

        /// Scope seed, at most 20 lowercase characters
        #[arg(short, long)]
        seed: String,
    },

    /// Generate a config id and check whether it is deployed
    ConfigId {
        /// JSON payload (ConfigIdRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Read a deployed config
    ReadConfig {
        /// Config id (0x + 64 hex)
        #[arg(short, long)]
        config_id: String,

        /// Network name
        #[arg(long, default_value = "mainnet")]
        network: String,
    },

    /// List country codes
    Countries {
        /// Filter by code or name
        #[arg(short, long)]
        search: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => println!("{}", serde_json::json!({ "error": format!("serialization failed: {e}") })),
    }
}

fn fail(error: String) -> ExitCode {
    println!("{}", serde_json::json!({ "error": error }));
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let networks = match NetworkRegistry::load_from_dir(&cli.networks_dir) {
        Ok(r) => r,
        Err(e) => return fail(format!("Failed to load networks: {e}")),
    };
    let client = match JsonRpcClient::new(ReaderConfig { timeout_secs: cli.timeout_secs }) {
        Ok(c) => c,
        Err(e) => return fail(e.to_string()),
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return fail(format!("Failed to start async runtime: {e}")),
    };

    let service = ConfigService::new(networks, client);

    match cli.command {
        Commands::ScopeHash { endpoint, seed } => {
            let response = service.generate_scope_hash(&ScopeHashRequest { endpoint, seed });
            print_json(&response);
            if response.validation == ValidationStatus::Valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::ConfigId { payload } => {
            let request: ConfigIdRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    println!("{}", serde_json::json!({ "error": format!("Invalid payload: {e}") }));
                    return ExitCode::from(2);
                }
            };

            let response = runtime.block_on(service.generate_config_id(&request));
            print_json(&response);
            match response.error_kind.as_deref() {
                None => ExitCode::SUCCESS,
                Some("validation") | Some("unknown_network") => ExitCode::from(2),
                // id was produced; only the existence check failed
                Some(_) => ExitCode::FAILURE,
            }
        }

        Commands::ReadConfig { config_id, network } => {
            let response = runtime.block_on(service.read_config(&ReadConfigRequest { config_id, network }));
            print_json(&response);
            match response.error_kind.as_deref() {
                None => ExitCode::SUCCESS,
                Some("not_found") | Some("malformed_id") | Some("unknown_network") => ExitCode::from(2),
                Some(_) => ExitCode::FAILURE,
            }
        }

        Commands::Countries { search } => {
            print_json(&service.list_country_codes(search.as_deref()));
            ExitCode::SUCCESS
        }
    }
}
