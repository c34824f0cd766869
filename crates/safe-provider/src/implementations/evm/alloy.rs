//! Alloy-backed chain provider and wallet factory.
//!
//! Reads go through a plain HTTP provider. Deployments go through a provider
//! with the recommended fillers and a local signer, so nonce, gas and fees are
//! filled in before `createProxyWithNonce` is sent.

use crate::{
	proxy_creation_code, ChainProvider, FactoryConnector, FactoryError, ProviderError,
	WalletFactory,
};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport_http::Http;
use async_trait::async_trait;
use safe_contracts::ReadOnlyContracts;
use safe_types::{
	short_address, ChainDescriptor, Connection, CreationParameters, SafeVersion, WalletHandle,
};
use std::sync::Arc;

type DynProvider = Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>;

/// [`ChainProvider`] over an alloy HTTP provider.
#[derive(Clone)]
pub struct AlloyChainProvider {
	provider: DynProvider,
}

impl AlloyChainProvider {
	/// Creates a read-only provider for `rpc_url`.
	pub fn new(rpc_url: &str) -> Result<Self, ProviderError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", rpc_url, e)))?;
		let provider = ProviderBuilder::new().on_http(url);
		Ok(Self {
			provider: Arc::new(provider) as DynProvider,
		})
	}

	/// Creates a read-only provider for a chain's public RPC endpoint.
	pub fn for_chain(chain: &ChainDescriptor, api_key: Option<&str>) -> Result<Self, ProviderError> {
		Self::new(&chain.rpc_uri.resolve(api_key))
	}

	fn from_provider(provider: DynProvider) -> Self {
		Self { provider }
	}
}

#[async_trait]
impl ChainProvider for AlloyChainProvider {
	async fn chain_id(&self) -> Result<u64, ProviderError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| ProviderError::Network(format!("Failed to get chain id: {}", e)))
	}

	async fn estimate_gas(
		&self,
		from: Address,
		to: Address,
		data: Bytes,
	) -> Result<u64, ProviderError> {
		let request = TransactionRequest::default()
			.from(from)
			.to(to)
			.input(data.into());
		self.provider
			.estimate_gas(&request)
			.await
			.map_err(|e| ProviderError::Call(format!("Gas estimation failed: {}", e)))
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
		let request = TransactionRequest::default().to(to).input(data.into());
		self.provider
			.call(&request)
			.await
			.map_err(|e| ProviderError::Call(format!("Call to {} failed: {}", to, e)))
	}

	async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
		self.provider
			.get_code_at(address)
			.await
			.map_err(|e| ProviderError::Network(format!("Failed to get code: {}", e)))
	}
}

/// Deploys wallets by sending `createProxyWithNonce` from a local signer.
pub struct AlloyWalletFactory {
	chain: ChainDescriptor,
	contracts: ReadOnlyContracts,
	provider: AlloyChainProvider,
	signer_address: Address,
	payment_receiver: Address,
}

impl AlloyWalletFactory {
	pub fn new(
		connection: &Connection,
		chain: &ChainDescriptor,
		version: SafeVersion,
		payment_receiver: Address,
	) -> Result<Self, FactoryError> {
		let contracts = ReadOnlyContracts::new(chain, version)?;

		let signer: PrivateKeySigner = connection.private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| FactoryError::Connection("Invalid private key format".to_string()))
		})?;
		let signer = signer.with_chain_id(chain.numeric_chain_id());
		let signer_address = signer.address();

		let url = connection.rpc_url.parse().map_err(|e| {
			FactoryError::Connection(format!("Invalid RPC URL {}: {}", connection.rpc_url, e))
		})?;
		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(EthereumWallet::from(signer))
			.on_http(url);

		Ok(Self {
			chain: chain.clone(),
			contracts,
			provider: AlloyChainProvider::from_provider(Arc::new(provider) as DynProvider),
			signer_address,
			payment_receiver,
		})
	}

	async fn ensure_chain(&self) -> Result<(), FactoryError> {
		let actual = self.provider.chain_id().await?;
		if self.chain.numeric_chain_id() != Some(actual) {
			return Err(FactoryError::ChainMismatch {
				expected: self.chain.chain_id.clone(),
				actual,
			});
		}
		Ok(())
	}
}

#[async_trait]
impl WalletFactory for AlloyWalletFactory {
	fn address(&self) -> Address {
		self.contracts.proxy_factory().address()
	}

	fn version(&self) -> SafeVersion {
		self.contracts.version()
	}

	async fn deploy(&self, params: &CreationParameters) -> Result<WalletHandle, FactoryError> {
		self.ensure_chain().await?;

		let payload = self.contracts.creation_payload(params, self.payment_receiver);
		let code =
			proxy_creation_code(&self.provider, &self.chain, self.contracts.proxy_factory())
				.await?;
		let predicted = payload.predict_address(&code);

		let request = TransactionRequest::default()
			.from(self.signer_address)
			.to(payload.to)
			.input(payload.data.into());

		let pending = self
			.provider
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| ProviderError::Network(format!("Failed to send transaction: {}", e)))?;
		let tx_hash = *pending.tx_hash();
		tracing::info!(
			tx_hash = %tx_hash,
			chain_id = %self.chain.chain_id,
			safe = %short_address(&predicted),
			"Submitted creation transaction"
		);

		let receipt = pending
			.get_receipt()
			.await
			.map_err(|e| ProviderError::Network(format!("Failed to get receipt: {}", e)))?;
		if !receipt.status() {
			return Err(FactoryError::Reverted(tx_hash.to_string()));
		}

		if self.provider.get_code(predicted).await?.is_empty() {
			return Err(FactoryError::NotDeployed(predicted));
		}

		Ok(WalletHandle {
			address: predicted,
			chain_id: self.chain.numeric_chain_id().unwrap_or_default(),
			version: self.contracts.version(),
			transaction_hash: tx_hash,
		})
	}
}

/// [`FactoryConnector`] producing [`AlloyWalletFactory`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlloyFactoryConnector {
	payment_receiver: Address,
}

impl AlloyFactoryConnector {
	pub fn new(payment_receiver: Address) -> Self {
		Self { payment_receiver }
	}
}

#[async_trait]
impl FactoryConnector for AlloyFactoryConnector {
	async fn connect(
		&self,
		connection: &Connection,
		chain: &ChainDescriptor,
		version: SafeVersion,
	) -> Result<Box<dyn WalletFactory>, FactoryError> {
		let factory = AlloyWalletFactory::new(connection, chain, version, self.payment_receiver)?;
		tracing::debug!(
			chain_id = %chain.chain_id,
			signer = %short_address(&factory.signer_address),
			"Connected wallet factory"
		);
		Ok(Box::new(factory))
	}
}
