//! Main entry point for the Safe launcher.
//!
//! The binary predicts, encodes, estimates, deploys and relays Safe wallet
//! creations, polls the gateway for the result, and prints where the user
//! should be sent afterwards. Collaborators are selected from the
//! configuration file.

use clap::{Parser, Subcommand};
use safe_config::Config;
use std::path::{Path, PathBuf};

mod commands;
mod factory_registry;

use commands::{CreationArgs, Launcher};

/// Command-line arguments for the launcher.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/demo.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List supported chains
	Chains,
	/// Predict the address of a new wallet
	Predict(CreationArgs),
	/// Print the encoded creation transaction
	Encode(CreationArgs),
	/// Estimate gas for the creation transaction
	Estimate {
		#[command(flatten)]
		creation: CreationArgs,
		/// Sender of the creation transaction
		#[arg(long, value_parser = commands::parse_address)]
		from: alloy_primitives::Address,
	},
	/// Deploy a wallet with the configured account
	Deploy {
		#[command(flatten)]
		creation: CreationArgs,
		/// RPC endpoint used for signing, defaults to the chain's RPC URI
		#[arg(long)]
		rpc_url: Option<String>,
	},
	/// Submit the creation transaction to the relay
	Relay(CreationArgs),
	/// Wait until the gateway reports a wallet
	Poll {
		#[arg(long)]
		chain: String,
		#[arg(long, value_parser = commands::parse_address)]
		address: alloy_primitives::Address,
	},
	/// Compute where to send the user after creation
	Redirect {
		/// Chain short name, e.g. `eth`
		#[arg(long, default_value = "")]
		prefix: String,
		#[arg(long)]
		address: String,
		/// Redirect hint; repeated values are allowed, only the first counts
		#[arg(long)]
		redirect: Vec<String>,
	},
	/// Relay a creation, wait for it, and print the redirect
	Create {
		#[command(flatten)]
		creation: CreationArgs,
		#[arg(long)]
		redirect: Option<String>,
	},
}

/// Main entry point for the launcher.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Runs the requested command
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	match args.command {
		Command::Redirect {
			prefix,
			address,
			redirect,
		} => commands::redirect(&prefix, &address, &redirect),
		Command::Chains => load(&args.config).await?.chains().await,
		Command::Predict(creation) => load(&args.config).await?.predict(&creation).await,
		Command::Encode(creation) => load(&args.config).await?.encode(&creation).await,
		Command::Estimate { creation, from } => {
			load(&args.config).await?.estimate(&creation, from).await
		},
		Command::Deploy { creation, rpc_url } => {
			load(&args.config).await?.deploy(&creation, rpc_url).await
		},
		Command::Relay(creation) => load(&args.config).await?.relay(&creation).await,
		Command::Poll { chain, address } => load(&args.config).await?.poll(&chain, address).await,
		Command::Create { creation, redirect } => {
			load(&args.config).await?.create(&creation, redirect).await
		},
	}
}

/// Loads configuration and wires the launcher from it.
async fn load(path: &Path) -> Result<Launcher, Box<dyn std::error::Error>> {
	let config = Config::from_file(path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);
	Launcher::from_config(config)
}
