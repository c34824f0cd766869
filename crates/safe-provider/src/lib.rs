//! Chain access for wallet creation.
//!
//! Two seams live here. [`ChainProvider`] is the read side (chain id, gas
//! estimation, `eth_call`, code lookup) used to predict and estimate.
//! [`WalletFactory`] is the write side: a signer-backed handle on the proxy
//! factory that deploys a wallet and waits for it to land. Factories are
//! produced per connection by a [`FactoryConnector`].

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use safe_contracts::{ContractError, ProxyFactoryContract};
use safe_types::{ChainDescriptor, Connection, CreationParameters, SafeVersion, WalletHandle};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while reading from a chain.
#[derive(Debug, Error)]
pub enum ProviderError {
	/// The RPC URL could not be parsed.
	#[error("Invalid RPC URL: {0}")]
	InvalidUrl(String),
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// A call or estimation reverted or returned unusable data.
	#[error("Call failed: {0}")]
	Call(String),
}

/// Errors that can occur while connecting to or deploying through the factory.
#[derive(Debug, Error)]
pub enum FactoryError {
	/// The connection could not be turned into a signing provider.
	#[error("Connection error: {0}")]
	Connection(String),
	/// The RPC endpoint serves a different chain than the descriptor.
	#[error("Connected to chain {actual}, expected {expected}")]
	ChainMismatch { expected: String, actual: u64 },
	/// The chain lacks a contract needed for creation.
	#[error(transparent)]
	Contract(#[from] ContractError),
	/// Error reported by the underlying provider.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// The creation transaction was mined but reverted.
	#[error("Creation transaction {0} reverted")]
	Reverted(String),
	/// The transaction succeeded but no code exists at the predicted address.
	#[error("No wallet code found at {0}")]
	NotDeployed(Address),
}

/// Read access to an EVM chain.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ChainProvider: Send + Sync {
	/// Chain id reported by the endpoint.
	async fn chain_id(&self) -> Result<u64, ProviderError>;

	/// Estimates gas for a call from `from` to `to` with calldata `data`.
	async fn estimate_gas(&self, from: Address, to: Address, data: Bytes)
		-> Result<u64, ProviderError>;

	/// Executes a read-only call and returns the raw return data.
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError>;

	/// Deployed bytecode at `address`; empty when nothing is deployed.
	async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError>;
}

/// Signer-backed handle on a chain's proxy factory.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WalletFactory: Send + Sync {
	/// Address of the proxy factory contract.
	fn address(&self) -> Address;

	/// Wallet version this factory deploys.
	fn version(&self) -> SafeVersion;

	/// Deploys a wallet and waits for the creation transaction to be mined.
	async fn deploy(&self, params: &CreationParameters) -> Result<WalletHandle, FactoryError>;
}

/// Produces [`WalletFactory`] instances for a connection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FactoryConnector: Send + Sync {
	async fn connect(
		&self,
		connection: &Connection,
		chain: &ChainDescriptor,
		version: SafeVersion,
	) -> Result<Box<dyn WalletFactory>, FactoryError>;
}

/// Returns the proxy factory's creation code.
///
/// Uses the copy cached in the chain descriptor when present and otherwise
/// calls `proxyCreationCode()` on the factory.
pub async fn proxy_creation_code(
	provider: &dyn ChainProvider,
	chain: &ChainDescriptor,
	factory: &ProxyFactoryContract,
) -> Result<Bytes, ProviderError> {
	if let Some(code) = factory.cached_creation_code() {
		return Ok(code.clone());
	}

	tracing::debug!(
		chain_id = %chain.chain_id,
		factory = %factory.address(),
		"Fetching proxy creation code"
	);
	let data = provider
		.call(factory.address(), factory.encode_proxy_creation_code())
		.await?;
	factory
		.decode_proxy_creation_code(&data)
		.map_err(|e| ProviderError::Call(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, bytes};
	use safe_contracts::ReadOnlyContracts;

	fn chain(cached_code: Option<&str>) -> ChainDescriptor {
		serde_json::from_value(serde_json::json!({
			"chainId": "22040",
			"chainName": "AirDAO Testnet",
			"shortName": "ambtest",
			"rpcUri": { "authentication": "NO_AUTHENTICATION", "value": "http://127.0.0.1:8545" },
			"blockExplorerUriTemplate": {
				"address": "https://explorer/address/{{address}}",
				"txHash": "https://explorer/tx/{{txHash}}",
				"api": "https://explorer/api"
			},
			"nativeCurrency": { "name": "Amber", "symbol": "AMB", "decimals": 18 },
			"contractAddresses": {
				"safeSingletonAddress": "0x41675C099F32341bf84BFc5382aF534df5C7461a",
				"safeProxyFactoryAddress": "0x4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67",
				"fallbackHandlerAddress": "0xfd0732Dc9E303f09fCEf3a7388Ad10A83459Ec99",
				"proxyCreationCode": cached_code
			}
		}))
		.unwrap()
	}

	#[tokio::test]
	async fn test_cached_creation_code_skips_provider() {
		let chain = chain(Some("0x6080"));
		let contracts = ReadOnlyContracts::new(&chain, SafeVersion::V1_4_1).unwrap();

		let mut provider = MockChainProvider::new();
		provider.expect_call().times(0);

		let code = proxy_creation_code(&provider, &chain, contracts.proxy_factory())
			.await
			.unwrap();
		assert_eq!(code, bytes!("6080"));
	}

	#[tokio::test]
	async fn test_creation_code_fetched_from_factory() {
		let chain = chain(None);
		let contracts = ReadOnlyContracts::new(&chain, SafeVersion::V1_4_1).unwrap();
		let factory = contracts.proxy_factory().clone();
		let request = factory.encode_proxy_creation_code();

		// ABI-encoded `bytes` return holding 0x6080
		let mut encoded = vec![0u8; 96];
		encoded[31] = 0x20;
		encoded[63] = 0x02;
		encoded[64] = 0x60;
		encoded[65] = 0x80;

		let mut provider = MockChainProvider::new();
		provider
			.expect_call()
			.withf(move |to, data| {
				*to == address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67")
					&& *data == request
			})
			.times(1)
			.returning(move |_, _| Ok(Bytes::from(encoded.clone())));

		let code = proxy_creation_code(&provider, &chain, &factory)
			.await
			.unwrap();
		assert_eq!(code, bytes!("6080"));
	}

	#[tokio::test]
	async fn test_undecodable_creation_code() {
		let chain = chain(None);
		let contracts = ReadOnlyContracts::new(&chain, SafeVersion::V1_4_1).unwrap();

		let mut provider = MockChainProvider::new();
		provider
			.expect_call()
			.returning(|_, _| Ok(Bytes::from(vec![0x01])));

		let result = proxy_creation_code(&provider, &chain, contracts.proxy_factory()).await;
		assert!(matches!(result, Err(ProviderError::Call(_))));
	}
}
