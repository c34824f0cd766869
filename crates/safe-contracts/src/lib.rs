//! Read-only Safe contract bindings.
//!
//! This module encodes the calls needed to create a wallet without a signer
//! or a network connection: the singleton's `setup` initializer wrapped in the
//! proxy factory's `createProxyWithNonce`, and the CREATE2 derivation of the
//! resulting proxy address.

use alloy_sol_types::sol;
use safe_types::SafeVersion;
use thiserror::Error;

pub mod address;
pub mod bindings;

pub use address::predict_safe_address;
pub use bindings::{
	CreationPayload, FallbackHandlerContract, ProxyFactoryContract, ReadOnlyContracts,
	SafeSingletonContract, SetupParams,
};

/// Errors that can occur while building contract bindings or payloads.
#[derive(Debug, Error)]
pub enum ContractError {
	/// The chain descriptor does not list a required system contract.
	#[error("Chain {chain_id} has no {contract} address configured")]
	MissingAddress {
		contract: &'static str,
		chain_id: String,
	},
	/// The chain lists no contracts for the requested release.
	#[error("Safe {version} is not deployed on chain {chain_id}")]
	VersionNotDeployed {
		version: SafeVersion,
		chain_id: String,
	},
	/// ABI encoding or decoding failed.
	#[error("Encoding error: {0}")]
	Encoding(String),
}

// Solidity definitions for the subset of the Safe contracts used at creation.
sol! {
	/// Safe singleton, versions 1.1.1 and later.
	interface ISafe {
		function setup(
			address[] owners,
			uint256 threshold,
			address to,
			bytes data,
			address fallbackHandler,
			address paymentToken,
			uint256 payment,
			address paymentReceiver
		) external;
	}

	/// Safe singleton 1.0.0, which has no fallback handler argument.
	interface ISafeV100 {
		function setup(
			address[] owners,
			uint256 threshold,
			address to,
			bytes data,
			address paymentToken,
			uint256 payment,
			address paymentReceiver
		) external;
	}

	/// Proxy factory deploying wallets through CREATE2.
	interface ISafeProxyFactory {
		function createProxyWithNonce(address singleton, bytes initializer, uint256 saltNonce) external returns (address proxy);
		function proxyCreationCode() external pure returns (bytes memory);
	}
}
