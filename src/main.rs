//! hive-client command line.
//!
//! Keys come from `HIVE_{OWNER,ACTIVE,POSTING,MEMO}_WIF`; they are never
//! accepted as arguments.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use hive_client::blockchain::{KeyStore, Operation, SignedTransaction};
use hive_client::config::{load_config, HiveConfig};
use hive_client::observability::logging::init_logging;
use hive_client::rpc::Params;
use hive_client::{BroadcastOptions, HiveClient};

#[derive(Parser)]
#[command(name = "hive-client")]
#[command(about = "Talk to Hive API nodes: raw calls, votes, authority checks", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node URL, repeatable. Replaces the configured node list.
    #[arg(short, long = "node")]
    nodes: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dynamic global properties
    Props,
    /// Raw JSON-RPC call, e.g. `call condenser_api.get_accounts '[["alice"]]'`
    Call {
        method: String,
        /// JSON array or object; API default when omitted
        params: Option<String>,
    },
    /// Print the public keys of the keys found in the environment
    Pubkey,
    /// Vote on a post
    Vote {
        voter: String,
        author: String,
        permlink: String,
        /// Basis points, -10000..=10000
        #[arg(long, default_value_t = 10_000, allow_negative_numbers = true)]
        weight: i16,
        /// Wait for block inclusion
        #[arg(long)]
        sync: bool,
        /// Report duplicates in the result instead of failing
        #[arg(long)]
        lenient: bool,
        /// Check authorities with the node first
        #[arg(long)]
        verify: bool,
    },
    /// Check a signed transaction (JSON) against the keys in the environment
    Verify { transaction: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HiveConfig::default(),
    };
    if !cli.nodes.is_empty() {
        config.nodes.urls = cli.nodes.clone();
    }
    init_logging(&config.observability);

    match cli.command {
        Commands::Pubkey => {
            let keys = KeyStore::from_env()?;
            if keys.is_empty() {
                eprintln!("No HIVE_*_WIF variables set");
            }
            for entry in keys.entries() {
                println!("{:<8} {}", entry.role().as_str(), entry.public_key());
            }
        }
        Commands::Props => {
            let client = HiveClient::new(config)?;
            let props = client
                .call("condenser_api.get_dynamic_global_properties", Params::empty())
                .await?;
            print_json(&props)?;
        }
        Commands::Call { method, params } => {
            let client = HiveClient::new(config)?;
            let params = match params {
                Some(raw) => Params::from(serde_json::from_str::<Value>(&raw)?),
                None => Params::empty(),
            };
            print_json(&client.call(&method, params).await?)?;
        }
        Commands::Vote {
            voter,
            author,
            permlink,
            weight,
            sync,
            lenient,
            verify,
        } => {
            let keys = KeyStore::from_env()?;
            let mut options = BroadcastOptions::from_config(&config);
            options.synchronous |= sync;
            options.strict &= !lenient;
            options.verify |= verify;

            let client = HiveClient::new(config)?;
            let vote = Operation::vote(&voter, &author, &permlink, weight)?;
            let result = client.submit(vec![vote], &keys, options).await?;

            println!("transaction {}", result.transaction_id);
            match (result.included, result.block_num) {
                (true, Some(block)) => println!("included in block {}", block),
                (true, None) => println!("included"),
                (false, _) => println!("accepted, not yet included"),
            }
            if let Some(err) = result.error {
                println!("note: {}", err);
            }
        }
        Commands::Verify { transaction } => {
            let keys = KeyStore::from_env()?;
            let tx: SignedTransaction = serde_json::from_str(&transaction)?;
            let client = HiveClient::new(config)?;
            let valid = client.verify(&tx, &keys).await?;
            println!("{}", valid);
            if !valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
