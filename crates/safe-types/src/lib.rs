//! Common types module for the Safe launcher.
//!
//! This module defines the data model shared by every crate in the workspace:
//! chain descriptors, protocol versions, creation parameters and the views of
//! a wallet returned by the gateway and by a direct deployment.

/// Chain descriptors as reported by the gateway or loaded from configuration.
pub mod chain;
/// Creation parameters, pending deployments and the creation lifecycle.
pub mod creation;
/// Registry trait for configuration-selected implementations.
pub mod registry;
/// Secure string wrapper for private keys and API keys.
pub mod secret_string;
/// Utility functions for display formatting.
pub mod utils;
/// Safe protocol version allowlist.
pub mod version;
/// Wallet views: gateway info, deployment handles, relay tickets.
pub mod wallet;

pub use chain::{
	BlockExplorerUriTemplate, ChainDescriptor, ContractAddresses, GasPrice, NativeCurrency,
	RpcAuthentication, RpcUri, SafeDeployment,
};
pub use creation::{
	Connection, CreationParameters, CreationStage, ParameterError, PendingDeployment,
};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{short_address, truncate_id};
pub use version::{InvalidVersion, SafeVersion};
pub use wallet::{AddressInfo, RelayTicket, WalletHandle, WalletInfo};
