//! Chain- and version-scoped read-only contract bindings.

use crate::{address::predict_safe_address, ContractError, ISafe, ISafeProxyFactory, ISafeV100};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use safe_types::{ChainDescriptor, CreationParameters, SafeVersion};

/// Arguments of the singleton's `setup` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupParams {
	pub owners: Vec<Address>,
	pub threshold: U256,
	pub to: Address,
	pub data: Bytes,
	pub fallback_handler: Address,
	pub payment_token: Address,
	pub payment: U256,
	pub payment_receiver: Address,
}

impl SetupParams {
	/// Setup arguments for a plain creation: no delegate call, no payment.
	pub fn for_creation(
		params: &CreationParameters,
		fallback_handler: Address,
		payment_receiver: Address,
	) -> Self {
		Self {
			owners: params.owners.clone(),
			threshold: U256::from(params.threshold),
			to: Address::ZERO,
			data: Bytes::new(),
			fallback_handler,
			payment_token: Address::ZERO,
			payment: U256::ZERO,
			payment_receiver,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeSingletonContract {
	address: Address,
	version: SafeVersion,
}

impl SafeSingletonContract {
	pub fn address(&self) -> Address {
		self.address
	}

	pub fn version(&self) -> SafeVersion {
		self.version
	}

	/// Encodes `setup` with the signature matching this singleton's version.
	pub fn encode_setup(&self, setup: &SetupParams) -> Bytes {
		let encoded = if self.version.has_fallback_handler() {
			ISafe::setupCall {
				owners: setup.owners.clone(),
				threshold: setup.threshold,
				to: setup.to,
				data: setup.data.clone(),
				fallbackHandler: setup.fallback_handler,
				paymentToken: setup.payment_token,
				payment: setup.payment,
				paymentReceiver: setup.payment_receiver,
			}
			.abi_encode()
		} else {
			ISafeV100::setupCall {
				owners: setup.owners.clone(),
				threshold: setup.threshold,
				to: setup.to,
				data: setup.data.clone(),
				paymentToken: setup.payment_token,
				payment: setup.payment,
				paymentReceiver: setup.payment_receiver,
			}
			.abi_encode()
		};
		encoded.into()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyFactoryContract {
	address: Address,
	creation_code: Option<Bytes>,
}

impl ProxyFactoryContract {
	pub fn address(&self) -> Address {
		self.address
	}

	/// `proxyCreationCode()` as cached in the chain descriptor, if any.
	pub fn cached_creation_code(&self) -> Option<&Bytes> {
		self.creation_code.as_ref()
	}

	pub fn encode_create_proxy_with_nonce(
		&self,
		singleton: Address,
		initializer: Bytes,
		salt_nonce: U256,
	) -> Bytes {
		ISafeProxyFactory::createProxyWithNonceCall {
			singleton,
			initializer,
			saltNonce: salt_nonce,
		}
		.abi_encode()
		.into()
	}

	pub fn encode_proxy_creation_code(&self) -> Bytes {
		ISafeProxyFactory::proxyCreationCodeCall {}
			.abi_encode()
			.into()
	}

	/// Decodes the return data of a `proxyCreationCode()` call.
	pub fn decode_proxy_creation_code(&self, data: &[u8]) -> Result<Bytes, ContractError> {
		ISafeProxyFactory::proxyCreationCodeCall::abi_decode_returns(data, true)
			.map(|ret| ret._0)
			.map_err(|e| ContractError::Encoding(format!("Invalid proxyCreationCode return: {}", e)))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackHandlerContract {
	address: Address,
}

impl FallbackHandlerContract {
	pub fn address(&self) -> Address {
		self.address
	}
}

/// Fully encoded creation transaction plus the pieces needed to predict its
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationPayload {
	/// Proxy factory receiving the call.
	pub to: Address,
	/// `createProxyWithNonce` calldata.
	pub data: Bytes,
	pub singleton: Address,
	pub initializer: Bytes,
	pub salt_nonce: U256,
}

impl CreationPayload {
	/// Address the proxy will be deployed at, given the factory's creation code.
	pub fn predict_address(&self, proxy_creation_code: &[u8]) -> Address {
		predict_safe_address(
			self.to,
			self.singleton,
			&self.initializer,
			self.salt_nonce,
			proxy_creation_code,
		)
	}
}

/// Read-only bindings for the contracts involved in wallet creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyContracts {
	version: SafeVersion,
	singleton: SafeSingletonContract,
	proxy_factory: ProxyFactoryContract,
	fallback_handler: FallbackHandlerContract,
}

impl ReadOnlyContracts {
	/// Resolves the contract addresses `version` was deployed at on `chain`.
	///
	/// L2 chains use the L2 singleton when one is configured.
	pub fn new(chain: &ChainDescriptor, version: SafeVersion) -> Result<Self, ContractError> {
		let deployment =
			chain
				.deployment(version)
				.ok_or_else(|| ContractError::VersionNotDeployed {
					version,
					chain_id: chain.chain_id.clone(),
				})?;
		let missing = |contract: &'static str| ContractError::MissingAddress {
			contract,
			chain_id: chain.chain_id.clone(),
		};

		let singleton_address = if chain.l2 {
			deployment
				.safe_singleton_l2_address
				.or(deployment.safe_singleton_address)
		} else {
			deployment.safe_singleton_address
		}
		.ok_or_else(|| missing("safe singleton"))?;

		let proxy_factory_address = deployment
			.safe_proxy_factory_address
			.ok_or_else(|| missing("proxy factory"))?;

		let fallback_handler_address = match deployment.fallback_handler_address {
			Some(address) => address,
			None if !version.has_fallback_handler() => Address::ZERO,
			None => return Err(missing("fallback handler")),
		};

		Ok(Self {
			version,
			singleton: SafeSingletonContract {
				address: singleton_address,
				version,
			},
			proxy_factory: ProxyFactoryContract {
				address: proxy_factory_address,
				creation_code: deployment.proxy_creation_code,
			},
			fallback_handler: FallbackHandlerContract {
				address: fallback_handler_address,
			},
		})
	}

	pub fn version(&self) -> SafeVersion {
		self.version
	}

	pub fn safe_singleton(&self) -> &SafeSingletonContract {
		&self.singleton
	}

	pub fn proxy_factory(&self) -> &ProxyFactoryContract {
		&self.proxy_factory
	}

	pub fn fallback_handler(&self) -> &FallbackHandlerContract {
		&self.fallback_handler
	}

	/// Encodes `setup` wrapped in `createProxyWithNonce`.
	pub fn creation_payload(
		&self,
		params: &CreationParameters,
		payment_receiver: Address,
	) -> CreationPayload {
		let setup =
			SetupParams::for_creation(params, self.fallback_handler.address(), payment_receiver);
		let initializer = self.singleton.encode_setup(&setup);
		let data = self.proxy_factory.encode_create_proxy_with_nonce(
			self.singleton.address(),
			initializer.clone(),
			params.salt_nonce,
		);

		tracing::trace!(
			version = %self.version,
			factory = %self.proxy_factory.address(),
			calldata_len = data.len(),
			"Encoded creation payload"
		);

		CreationPayload {
			to: self.proxy_factory.address(),
			data,
			singleton: self.singleton.address(),
			initializer,
			salt_nonce: params.salt_nonce,
		}
	}
}
