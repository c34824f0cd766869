//! Gateway and relay clients for the Safe launcher.
//!
//! The gateway indexes deployed wallets and serves the list of supported
//! chains; the relay submits sponsored transactions on the user's behalf.
//! Both are reached through traits so the orchestration layer can be driven
//! by any implementation, including mocks in tests.

use alloy_primitives::Address;
use async_trait::async_trait;
use safe_types::{ChainDescriptor, ImplementationRegistry, WalletInfo};
use thiserror::Error;

pub mod registry;
pub mod relay;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

pub use registry::ChainRegistry;
pub use relay::{RelayError, RelayFactory, RelayInterface, RelayQuota, RelayRequest};

#[cfg(any(test, feature = "testing"))]
pub use relay::MockRelayInterface;

/// Outcome of a failed wallet status lookup.
///
/// The variants separate "keep waiting" from "waiting will not help" so that
/// pollers can stop early instead of exhausting their retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
	/// The gateway has not indexed the wallet yet.
	#[error("Wallet not deployed yet")]
	NotDeployed,
	/// Temporary failure (timeouts, rate limiting, 5xx responses).
	#[error("Temporary gateway failure: {0}")]
	Transient(String),
	/// The gateway rejected the address itself.
	#[error("Invalid wallet address: {0}")]
	InvalidAddress(String),
	/// The gateway could not be reached at all.
	#[error("Gateway unreachable: {0}")]
	Unreachable(String),
	/// The gateway answered with a body that does not describe a wallet.
	#[error("Malformed gateway response: {0}")]
	Malformed(String),
}

impl StatusError {
	/// Whether retrying the lookup later can succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, StatusError::NotDeployed | StatusError::Transient(_))
	}
}

/// Errors that can occur while loading chain configuration.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The gateway returned a non-success status.
	#[error("Gateway returned {status}: {message}")]
	Http { status: u16, message: String },
	/// The response body could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The requested chain is neither configured nor served by the gateway.
	#[error("Unknown chain: {0}")]
	UnknownChain(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for gateway clients.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GatewayInterface: Send + Sync {
	/// Fetches the indexed state of a wallet.
	///
	/// Fails with [`StatusError::NotDeployed`] until the wallet has been
	/// deployed and indexed.
	async fn get_wallet_info(
		&self,
		chain_id: &str,
		address: Address,
	) -> Result<WalletInfo, StatusError>;

	/// Fetches every chain the gateway supports.
	async fn get_chains(&self) -> Result<Vec<ChainDescriptor>, GatewayError>;
}

/// Type alias for gateway factory functions.
pub type GatewayFactory = fn(&toml::Value) -> Result<Box<dyn GatewayInterface>, GatewayError>;

/// Registry trait for gateway implementations.
pub trait GatewayRegistry: ImplementationRegistry<Factory = GatewayFactory> {}

/// Get all registered gateway implementations.
pub fn get_all_implementations() -> Vec<(&'static str, GatewayFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Get all registered relay implementations.
pub fn get_all_relay_implementations() -> Vec<(&'static str, RelayFactory)> {
	use implementations::http;

	vec![(http::RelayRegistry::NAME, http::RelayRegistry::factory())]
}
