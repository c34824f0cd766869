//! Wallet creation orchestration.
//!
//! The orchestrator resolves the contract set for a chain and version,
//! encodes the creation transaction, and hands it to the collaborator that
//! sends it: a signer-backed factory for direct deployments, or the relay
//! service for sponsored ones. Every failure is logged here and returned to
//! the caller unchanged in kind.

use crate::poller::{DeploymentPoller, PollError};
use alloy_primitives::{Address, Bytes, U256};
use safe_contracts::{ContractError, CreationPayload, ReadOnlyContracts};
use safe_gateway::{RelayError, RelayInterface, RelayRequest};
use safe_provider::{
	proxy_creation_code, ChainProvider, FactoryConnector, FactoryError, ProviderError,
};
use safe_types::{
	short_address, truncate_id, ChainDescriptor, Connection, CreationParameters,
	InvalidVersion, ParameterError, RelayTicket, SafeVersion, WalletHandle,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

pub mod lifecycle;

pub use lifecycle::CreationOutcome;

/// Errors that can occur while creating a wallet.
#[derive(Debug, Error)]
pub enum CreationError {
	/// The requested version is not on the allowlist.
	#[error(transparent)]
	InvalidVersion(#[from] InvalidVersion),
	/// Owners or threshold are inconsistent.
	#[error("Invalid creation parameters: {0}")]
	InvalidParameters(#[from] ParameterError),
	/// No wallet factory could be obtained for the connection.
	#[error("Failed to connect wallet factory: {0}")]
	Connection(#[source] FactoryError),
	/// The chain lacks contracts needed to encode the creation.
	#[error("Encoding error: {0}")]
	Encoding(#[from] ContractError),
	/// Reading from the chain failed.
	#[error("Provider error: {0}")]
	Provider(#[from] ProviderError),
	/// The relay refused or could not be reached.
	#[error("Relay error: {0}")]
	Relay(#[from] RelayError),
	/// The deployment transaction failed.
	#[error("Deployment failed: {0}")]
	Deployment(#[source] FactoryError),
	/// The gateway never reported the wallet.
	#[error(transparent)]
	Poll(#[from] PollError),
}

/// Coordinates wallet creation across chain, relay and gateway.
pub struct CreationOrchestrator {
	connector: Arc<dyn FactoryConnector>,
	relay: Option<Arc<dyn RelayInterface>>,
	poller: DeploymentPoller,
	payment_receiver: Address,
	default_version: Option<SafeVersion>,
}

impl CreationOrchestrator {
	pub fn new(
		connector: Arc<dyn FactoryConnector>,
		poller: DeploymentPoller,
		payment_receiver: Address,
	) -> Self {
		Self {
			connector,
			relay: None,
			poller,
			payment_receiver,
			default_version: None,
		}
	}

	pub fn with_relay(mut self, relay: Arc<dyn RelayInterface>) -> Self {
		self.relay = Some(relay);
		self
	}

	/// Version used when a call does not name one, ahead of the chain's
	/// recommendation.
	pub fn with_default_version(mut self, version: Option<SafeVersion>) -> Self {
		self.default_version = version;
		self
	}

	pub fn poller(&self) -> &DeploymentPoller {
		&self.poller
	}

	/// Receiver of the (zero) setup payment.
	pub fn payment_receiver(&self) -> Address {
		self.payment_receiver
	}

	/// Version to use on `chain` when the caller passes `requested`.
	pub fn resolve_version(
		&self,
		chain: &ChainDescriptor,
		requested: Option<SafeVersion>,
	) -> SafeVersion {
		requested
			.or(self.default_version)
			.unwrap_or_else(|| chain.latest_safe_version())
	}

	fn payload(
		&self,
		params: &CreationParameters,
		chain: &ChainDescriptor,
		version: SafeVersion,
	) -> Result<(ReadOnlyContracts, CreationPayload), CreationError> {
		params.validate().map_err(|e| {
			tracing::error!(error = %e, "Rejected creation parameters");
			e
		})?;
		let contracts = ReadOnlyContracts::new(chain, version).map_err(|e| {
			tracing::error!(error = %e, "Missing contracts for wallet creation");
			e
		})?;
		let payload = contracts.creation_payload(params, self.payment_receiver);
		Ok((contracts, payload))
	}

	/// Deploys a wallet by sending the creation transaction from `connection`.
	#[instrument(skip_all, fields(chain_id = %chain.chain_id, version = %version))]
	pub async fn deploy(
		&self,
		connection: &Connection,
		chain: &ChainDescriptor,
		params: &CreationParameters,
		version: &str,
	) -> Result<WalletHandle, CreationError> {
		let version: SafeVersion = version.parse().map_err(|e: InvalidVersion| {
			tracing::error!(error = %e, "Rejected wallet version");
			e
		})?;
		params.validate().map_err(|e| {
			tracing::error!(error = %e, "Rejected creation parameters");
			e
		})?;

		let factory = self
			.connector
			.connect(connection, chain, version)
			.await
			.map_err(|e| {
				tracing::error!(error = %e, "Failed to connect wallet factory");
				CreationError::Connection(e)
			})?;
		if factory.version() != version {
			tracing::error!(connected = %factory.version(), %version, "Factory serves another version");
			return Err(CreationError::Connection(FactoryError::Connection(format!(
				"factory serves Safe {}, expected {version}",
				factory.version()
			))));
		}
		tracing::info!(
			factory = %factory.address(),
			%version,
			"Deploying wallet through proxy factory"
		);

		let handle = factory.deploy(params).await.map_err(|e| {
			tracing::error!(error = %e, "Error creating the wallet");
			CreationError::Deployment(e)
		})?;

		tracing::info!(
			safe = %short_address(&handle.address),
			tx_hash = %handle.transaction_hash,
			"Wallet deployed"
		);
		Ok(handle)
	}

	/// Counterfactual address of the wallet `params` would create.
	///
	/// Pure when the chain caches the proxy creation code; otherwise the code
	/// is read from the factory through `provider`.
	#[instrument(skip_all, fields(chain_id = %chain.chain_id))]
	pub async fn predict_address(
		&self,
		provider: &dyn ChainProvider,
		params: &CreationParameters,
		chain: &ChainDescriptor,
		version: Option<SafeVersion>,
	) -> Result<Address, CreationError> {
		let version = self.resolve_version(chain, version);
		let (contracts, payload) = self.payload(params, chain, version)?;

		let code = proxy_creation_code(provider, chain, contracts.proxy_factory())
			.await
			.map_err(|e| {
				tracing::error!(error = %e, "Failed to read proxy creation code");
				e
			})?;
		let address = payload.predict_address(&code);

		tracing::debug!(safe = %short_address(&address), %version, "Predicted wallet address");
		Ok(address)
	}

	/// Encodes `setup` wrapped in `createProxyWithNonce` for `chain`.
	pub fn encode_creation_transaction(
		&self,
		params: &CreationParameters,
		chain: &ChainDescriptor,
		version: Option<SafeVersion>,
	) -> Result<Bytes, CreationError> {
		let version = self.resolve_version(chain, version);
		let (_, payload) = self.payload(params, chain, version)?;
		Ok(payload.data)
	}

	/// Estimates gas for sending the creation transaction from `from`.
	#[instrument(skip_all, fields(chain_id = %chain.chain_id, from = %short_address(&from)))]
	pub async fn estimate_creation_gas(
		&self,
		chain: &ChainDescriptor,
		provider: &dyn ChainProvider,
		from: Address,
		params: &CreationParameters,
		version: Option<SafeVersion>,
	) -> Result<u64, CreationError> {
		let version = self.resolve_version(chain, version);
		let (_, payload) = self.payload(params, chain, version)?;

		let gas = provider
			.estimate_gas(from, payload.to, payload.data)
			.await
			.map_err(|e| {
				tracing::error!(error = %e, "Gas estimation failed");
				e
			})?;
		tracing::debug!(gas, %version, "Estimated creation gas");
		Ok(gas)
	}

	/// Submits the creation transaction to the relay service.
	#[instrument(skip_all, fields(chain_id = %chain.chain_id, threshold = threshold))]
	pub async fn relay_creation(
		&self,
		chain: &ChainDescriptor,
		owners: Vec<Address>,
		threshold: u64,
		salt_nonce: U256,
		version: Option<SafeVersion>,
	) -> Result<RelayTicket, CreationError> {
		let relay = self.relay.as_ref().ok_or_else(|| {
			tracing::error!("Relay requested but none is configured");
			RelayError::Configuration("no relay configured".to_string())
		})?;

		let params = CreationParameters {
			owners,
			threshold,
			salt_nonce,
		};
		let version = self.resolve_version(chain, version);
		let (_, payload) = self.payload(&params, chain, version)?;

		let request = RelayRequest {
			to: payload.to,
			data: payload.data,
			version,
			gas_limit: None,
		};
		let ticket = relay.relay(&chain.chain_id, &request).await.map_err(|e| {
			tracing::error!(error = %e, "Error relaying wallet creation");
			e
		})?;

		tracing::info!(task_id = %truncate_id(&ticket.task_id), %version, "Relayed wallet creation");
		Ok(ticket)
	}

	/// Fewest sponsored transactions left among `owners` on `chain`.
	///
	/// A creation is only sponsored when every owner still has quota, so the
	/// smallest remaining count is what decides.
	#[instrument(skip_all, fields(chain_id = %chain.chain_id, owners = owners.len()))]
	pub async fn least_remaining_relays(
		&self,
		chain: &ChainDescriptor,
		owners: &[Address],
	) -> Result<u32, CreationError> {
		let relay = self.relay.as_ref().ok_or_else(|| {
			RelayError::Configuration("no relay configured".to_string())
		})?;

		let mut least = u32::MAX;
		for owner in owners {
			let quota = relay.remaining_relays(&chain.chain_id, *owner).await.map_err(|e| {
				tracing::warn!(owner = %short_address(owner), error = %e, "Failed to read relay quota");
				e
			})?;
			least = least.min(quota.remaining);
		}
		if owners.is_empty() {
			least = 0;
		}

		tracing::debug!(remaining = least, "Read relay quota");
		Ok(least)
	}
}
