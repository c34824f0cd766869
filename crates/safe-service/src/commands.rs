//! Subcommand handlers for the launcher.
//!
//! Each handler resolves the chain, runs one orchestrator operation and
//! prints the result as JSON on stdout. Logs go to stderr so the output can
//! be piped.

use crate::factory_registry::{build_gateway, build_relay};
use alloy_primitives::{Address, Bytes, U256};
use safe_config::Config;
use safe_core::{
	resolve_redirect, CreationOrchestrator, DeploymentPoller, PollPolicy, RedirectHint,
	TracingAnalytics,
};
use safe_gateway::ChainRegistry;
use safe_provider::implementations::evm::alloy::{AlloyChainProvider, AlloyFactoryConnector};
use safe_types::chain::features;
use safe_types::{
	ChainDescriptor, Connection, CreationParameters, InvalidVersion, ParameterError, SafeVersion,
};
use std::error::Error;
use std::sync::Arc;

pub fn parse_address(s: &str) -> Result<Address, String> {
	s.trim()
		.parse()
		.map_err(|e| format!("invalid address '{}': {}", s, e))
}

/// Accepts decimal or `0x`-prefixed hex.
pub fn parse_u256(s: &str) -> Result<U256, String> {
	s.trim()
		.parse()
		.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Arguments shared by every command that builds a creation transaction.
#[derive(clap::Args, Debug, Clone)]
pub struct CreationArgs {
	/// Chain id, e.g. `22040`
	#[arg(long)]
	pub chain: String,

	/// Comma-separated owner addresses
	#[arg(long, value_delimiter = ',', required = true, value_parser = parse_address)]
	pub owners: Vec<Address>,

	/// Confirmations required to execute a transaction
	#[arg(long, default_value_t = 1)]
	pub threshold: u64,

	/// Salt nonce mixed into the wallet address
	#[arg(long, default_value = "0", value_parser = parse_u256)]
	pub salt_nonce: U256,

	/// Wallet version; defaults to the configured or recommended one
	#[arg(long)]
	pub safe_version: Option<String>,
}

impl CreationArgs {
	pub fn parameters(&self) -> Result<CreationParameters, ParameterError> {
		CreationParameters::new(self.owners.clone(), self.threshold, self.salt_nonce)
	}

	pub fn version(&self) -> Result<Option<SafeVersion>, InvalidVersion> {
		self.safe_version.as_deref().map(str::parse).transpose()
	}
}

fn redirect_hint(values: &[String]) -> Option<RedirectHint> {
	match values {
		[] => None,
		[single] => Some(RedirectHint::Single(single.clone())),
		many => Some(RedirectHint::Many(many.to_vec())),
	}
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn Error>> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

/// Prints where to send the user after creating `prefix:address`.
pub fn redirect(prefix: &str, address: &str, hints: &[String]) -> Result<(), Box<dyn Error>> {
	let hint = redirect_hint(hints);
	let target = resolve_redirect(prefix, address, hint.as_ref()).perform(&TracingAnalytics);
	print_json(&serde_json::json!({
		"href": target.href(),
		"target": target,
	}))
}

/// Collaborators wired from configuration.
pub struct Launcher {
	config: Config,
	chains: ChainRegistry,
	orchestrator: CreationOrchestrator,
}

impl Launcher {
	pub fn from_config(config: Config) -> Result<Self, Box<dyn Error>> {
		let gateway = build_gateway(&config.gateway)?;
		let poller = DeploymentPoller::new(gateway.clone(), PollPolicy::from(&config.polling));

		let connector = Arc::new(AlloyFactoryConnector::new(config.creation.payment_receiver));
		let mut orchestrator =
			CreationOrchestrator::new(connector, poller, config.creation.payment_receiver)
				.with_default_version(config.creation.default_version());
		if let Some(relay) = &config.relay {
			orchestrator = orchestrator.with_relay(build_relay(relay)?);
		}

		let chains = ChainRegistry::new(gateway, config.chains.clone());
		Ok(Self {
			config,
			chains,
			orchestrator,
		})
	}

	async fn chain(&self, chain_id: &str) -> Result<ChainDescriptor, Box<dyn Error>> {
		Ok(self.chains.chain(chain_id).await?)
	}

	fn rpc_url(&self, chain: &ChainDescriptor) -> String {
		match &self.config.rpc.api_key {
			Some(key) => key.with_exposed(|key| chain.rpc_uri.resolve(Some(key))),
			None => chain.rpc_uri.resolve(None),
		}
	}

	fn provider(&self, chain: &ChainDescriptor) -> Result<AlloyChainProvider, Box<dyn Error>> {
		let provider = match &self.config.rpc.api_key {
			Some(key) => key.with_exposed(|key| AlloyChainProvider::for_chain(chain, Some(key))),
			None => AlloyChainProvider::for_chain(chain, None),
		}?;
		Ok(provider)
	}

	pub async fn chains(&self) -> Result<(), Box<dyn Error>> {
		let chains = self.chains.chains().await?;
		let summary: Vec<_> = chains
			.iter()
			.map(|chain| {
				serde_json::json!({
					"chainId": chain.chain_id,
					"chainName": chain.chain_name,
					"shortName": chain.short_name,
					"isTestnet": chain.is_testnet,
					"version": chain.latest_safe_version(),
				})
			})
			.collect();
		print_json(&summary)
	}

	pub async fn predict(&self, args: &CreationArgs) -> Result<(), Box<dyn Error>> {
		let chain = self.chain(&args.chain).await?;
		let provider = self.provider(&chain)?;
		let address = self
			.orchestrator
			.predict_address(&provider, &args.parameters()?, &chain, args.version()?)
			.await?;
		print_json(&serde_json::json!({
			"address": address,
			"safe": format!("{}:{}", chain.short_name, address.to_checksum(None)),
			"explorer": chain.explorer_address_url(&address),
		}))
	}

	async fn encoded(&self, args: &CreationArgs) -> Result<(Address, Bytes), Box<dyn Error>> {
		let chain = self.chain(&args.chain).await?;
		let version = self.orchestrator.resolve_version(&chain, args.version()?);
		let data =
			self.orchestrator
				.encode_creation_transaction(&args.parameters()?, &chain, Some(version))?;
		let to = chain
			.deployment(version)
			.and_then(|deployment| deployment.safe_proxy_factory_address)
			.unwrap_or_default();
		Ok((to, data))
	}

	pub async fn encode(&self, args: &CreationArgs) -> Result<(), Box<dyn Error>> {
		let (to, data) = self.encoded(args).await?;
		print_json(&serde_json::json!({ "to": to, "data": data }))
	}

	pub async fn estimate(&self, args: &CreationArgs, from: Address) -> Result<(), Box<dyn Error>> {
		let chain = self.chain(&args.chain).await?;
		let provider = self.provider(&chain)?;
		let gas = self
			.orchestrator
			.estimate_creation_gas(&chain, &provider, from, &args.parameters()?, args.version()?)
			.await?;
		print_json(&serde_json::json!({ "gas": gas }))
	}

	pub async fn deploy(
		&self,
		args: &CreationArgs,
		rpc_url: Option<String>,
	) -> Result<(), Box<dyn Error>> {
		let account = self
			.config
			.account
			.as_ref()
			.ok_or("Deploying requires an [account] section with a private key")?;
		let chain = self.chain(&args.chain).await?;

		let version = match &args.safe_version {
			Some(version) => version.clone(),
			None => self.orchestrator.resolve_version(&chain, None).to_string(),
		};
		let connection = Connection {
			rpc_url: rpc_url.unwrap_or_else(|| self.rpc_url(&chain)),
			private_key: account.private_key.clone(),
		};

		let handle = self
			.orchestrator
			.deploy(&connection, &chain, &args.parameters()?, &version)
			.await?;
		print_json(&serde_json::json!({
			"wallet": handle,
			"explorer": chain.explorer_tx_url(&handle.transaction_hash.to_string()),
		}))
	}

	pub async fn relay(&self, args: &CreationArgs) -> Result<(), Box<dyn Error>> {
		let chain = self.chain(&args.chain).await?;
		self.ensure_sponsored(&chain, &args.owners).await?;

		let ticket = self
			.orchestrator
			.relay_creation(
				&chain,
				args.owners.clone(),
				args.threshold,
				args.salt_nonce,
				args.version()?,
			)
			.await?;
		print_json(&ticket)
	}

	async fn ensure_sponsored(
		&self,
		chain: &ChainDescriptor,
		owners: &[Address],
	) -> Result<(), Box<dyn Error>> {
		if !chain.has_feature(features::RELAYING) {
			return Err(format!("{} does not support sponsored creation", chain.chain_name).into());
		}
		let remaining = self.orchestrator.least_remaining_relays(chain, owners).await?;
		if remaining == 0 {
			return Err("No sponsored transactions left for these owners".into());
		}
		tracing::info!(remaining, "Sponsored transactions available");
		Ok(())
	}

	pub async fn poll(&self, chain_id: &str, address: Address) -> Result<(), Box<dyn Error>> {
		let info = self.orchestrator.poller().poll_status(chain_id, address).await?;
		print_json(&info)
	}

	pub async fn create(
		&self,
		args: &CreationArgs,
		redirect: Option<String>,
	) -> Result<(), Box<dyn Error>> {
		let chain = self.chain(&args.chain).await?;
		self.ensure_sponsored(&chain, &args.owners).await?;

		let provider = self.provider(&chain)?;
		let hint = redirect.map(RedirectHint::Single);
		let outcome = self
			.orchestrator
			.create_and_await(
				&provider,
				&chain,
				&args.parameters()?,
				args.version()?,
				hint.as_ref(),
			)
			.await?;

		let target = outcome.redirect.map(|r| r.perform(&TracingAnalytics));
		print_json(&serde_json::json!({
			"address": outcome.pending.address,
			"taskId": outcome.ticket.task_id,
			"stage": outcome.stage,
			"wallet": outcome.wallet,
			"redirect": target.as_ref().map(|t| t.href()),
		}))
	}
}
