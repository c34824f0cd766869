//! Configuration module for the Safe launcher.
//!
//! Configuration is read from a TOML file. Any `${VAR_NAME}` placeholder is
//! replaced with the value of the environment variable before parsing, and
//! `${VAR_NAME:-default}` falls back to `default` when the variable is unset.
//! The parsed configuration is validated before it is returned.

use alloy_primitives::Address;
use regex::Regex;
use safe_types::{ChainDescriptor, SafeVersion, SecretString};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Only the message; the default rendering repeats the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the launcher.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Identity of this launcher instance, used in log output.
	pub service: ServiceConfig,
	/// Gateway used for wallet status and chain configuration.
	pub gateway: ImplementationConfig,
	/// Relay used for sponsored creation. Relaying is disabled when absent.
	pub relay: Option<ImplementationConfig>,
	/// Backoff schedule for deployment polling.
	#[serde(default)]
	pub polling: PollingConfig,
	/// Parameters fixed for every creation transaction.
	#[serde(default)]
	pub creation: CreationConfig,
	/// RPC endpoint options.
	#[serde(default)]
	pub rpc: RpcConfig,
	/// Signing account for direct deployments.
	pub account: Option<AccountConfig>,
	/// Chains appended to the list reported by the gateway.
	#[serde(default)]
	pub chains: Vec<ChainDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
	pub id: String,
}

/// Selects one of several implementations of a collaborator.
///
/// ```toml
/// [gateway]
/// primary = "http"
/// [gateway.implementations.http]
/// base_url = "https://safe-client.safe.global"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ImplementationConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Implementation name to raw TOML configuration.
	pub implementations: HashMap<String, toml::Value>,
}

impl ImplementationConfig {
	/// Raw configuration of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Exponential backoff schedule used while waiting for a wallet to be indexed.
///
/// The defaults wait roughly four to five minutes in the worst case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollingConfig {
	/// Delay before the second attempt.
	#[serde(default = "default_initial_delay_ms")]
	pub initial_delay_ms: u64,
	/// Upper bound for any single delay.
	#[serde(default = "default_max_delay_ms")]
	pub max_delay_ms: u64,
	/// Growth factor applied to the delay after each retry.
	#[serde(default = "default_multiplier")]
	pub multiplier: f64,
	/// Total number of attempts, including the first one.
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
}

fn default_initial_delay_ms() -> u64 {
	750
}

fn default_max_delay_ms() -> u64 {
	20_000
}

fn default_multiplier() -> f64 {
	2.0
}

fn default_max_attempts() -> u32 {
	19
}

impl Default for PollingConfig {
	fn default() -> Self {
		Self {
			initial_delay_ms: default_initial_delay_ms(),
			max_delay_ms: default_max_delay_ms(),
			multiplier: default_multiplier(),
			max_attempts: default_max_attempts(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreationConfig {
	/// `paymentReceiver` passed to `setup`. Defaults to the zero address.
	#[serde(default)]
	pub payment_receiver: Address,
	/// Version used when neither the caller nor the chain picks one.
	pub default_version: Option<String>,
}

impl CreationConfig {
	pub fn default_version(&self) -> Option<SafeVersion> {
		self.default_version.as_deref().and_then(|v| v.parse().ok())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcConfig {
	/// Key appended to `API_KEY_PATH` RPC URIs.
	pub api_key: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
	/// Hex-encoded private key of the deployer.
	pub private_key: SecretString,
}

/// Replaces `${VAR}` and `${VAR:-default}` placeholders with environment values.
///
/// Input is capped at 1MB so the regex scan stays bounded.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut output = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};

		output.push_str(&input[last..whole.start()]);
		output.push_str(&value);
		last = whole.end();
	}
	output.push_str(&input[last..]);

	Ok(output)
}

impl Config {
	/// Loads and validates configuration from a file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Looks up a configured chain by id.
	pub fn chain(&self, chain_id: &str) -> Option<&ChainDescriptor> {
		self.chains.iter().find(|c| c.chain_id == chain_id)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		validate_implementation("gateway", &self.gateway)?;
		if let Some(ref relay) = self.relay {
			validate_implementation("relay", relay)?;
		}

		self.validate_polling()?;

		if let Some(ref version) = self.creation.default_version {
			SafeVersion::from_str(version)
				.map_err(|e| ConfigError::Validation(format!("creation.default_version: {}", e)))?;
		}

		if let Some(ref account) = self.account {
			if account.private_key.is_empty() {
				return Err(ConfigError::Validation(
					"account.private_key cannot be empty".into(),
				));
			}
		}

		self.validate_chains()
	}

	fn validate_polling(&self) -> Result<(), ConfigError> {
		let polling = &self.polling;
		if polling.max_attempts == 0 {
			return Err(ConfigError::Validation(
				"polling.max_attempts must be at least 1".into(),
			));
		}
		if polling.max_attempts > 100 {
			return Err(ConfigError::Validation(
				"polling.max_attempts cannot exceed 100".into(),
			));
		}
		if polling.initial_delay_ms == 0 {
			return Err(ConfigError::Validation(
				"polling.initial_delay_ms must be greater than 0".into(),
			));
		}
		if polling.max_delay_ms < polling.initial_delay_ms {
			return Err(ConfigError::Validation(format!(
				"polling.max_delay_ms ({}) must not be below polling.initial_delay_ms ({})",
				polling.max_delay_ms, polling.initial_delay_ms
			)));
		}
		if polling.multiplier.is_nan() || polling.multiplier < 1.0 {
			return Err(ConfigError::Validation(
				"polling.multiplier must be at least 1.0".into(),
			));
		}
		Ok(())
	}

	fn validate_chains(&self) -> Result<(), ConfigError> {
		let mut seen = HashSet::new();
		for chain in &self.chains {
			if chain.numeric_chain_id().is_none() {
				return Err(ConfigError::Validation(format!(
					"Chain id '{}' is not a decimal number",
					chain.chain_id
				)));
			}
			if !seen.insert(chain.chain_id.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Chain {} is configured more than once",
					chain.chain_id
				)));
			}
			if chain.short_name.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Chain {} must have a shortName",
					chain.chain_id
				)));
			}
			if chain.contract_addresses.safe_proxy_factory_address.is_none() {
				return Err(ConfigError::Validation(format!(
					"Chain {} must have safeProxyFactoryAddress",
					chain.chain_id
				)));
			}
		}
		Ok(())
	}
}

fn validate_implementation(
	section: &str,
	config: &ImplementationConfig,
) -> Result<(), ConfigError> {
	if config.primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if config.primary_config().is_none() {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, config.primary
		)));
	}
	Ok(())
}

/// Parses configuration from a TOML string, resolving environment variables
/// and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
