//! Sponsored transaction relay.
//!
//! The relay accepts an encoded `createProxyWithNonce` call and submits it
//! on the user's behalf. It answers with a task identifier only; whether the
//! task eventually lands on chain is observed through the gateway.

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use safe_types::{ImplementationRegistry, RelayTicket, SafeVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the relay service.
#[derive(Debug, Error)]
pub enum RelayError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The relay refused the request.
	#[error("Relay rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	/// The response body could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Body of a relay submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
	/// Proxy factory address.
	pub to: Address,
	/// Encoded `createProxyWithNonce` call.
	pub data: Bytes,
	/// Wallet version the call was encoded for.
	pub version: SafeVersion,
	/// Optional gas limit, serialized as a decimal string.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_limit: Option<String>,
}

/// Sponsored transactions still available to an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelayQuota {
	pub remaining: u32,
	pub limit: u32,
}

/// Trait defining the interface for relay clients.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RelayInterface: Send + Sync {
	/// Submits a creation transaction for sponsored execution.
	async fn relay(&self, chain_id: &str, request: &RelayRequest)
		-> Result<RelayTicket, RelayError>;

	/// Returns how many sponsored transactions `address` may still submit.
	async fn remaining_relays(
		&self,
		chain_id: &str,
		address: Address,
	) -> Result<RelayQuota, RelayError>;
}

/// Type alias for relay factory functions.
pub type RelayFactory = fn(&toml::Value) -> Result<Box<dyn RelayInterface>, RelayError>;

/// Registry trait for relay implementations.
pub trait RelayRegistry: ImplementationRegistry<Factory = RelayFactory> {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_request_serialization() {
		let request = RelayRequest {
			to: address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67"),
			data: Bytes::from(vec![0x16, 0x88, 0xf0, 0xb9]),
			version: SafeVersion::V1_3_0,
			gas_limit: None,
		};
		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["version"], "1.3.0");
		assert_eq!(json["data"], "0x1688f0b9");
		assert!(json.get("gasLimit").is_none());

		let with_gas = RelayRequest {
			gas_limit: Some("250000".to_string()),
			..request
		};
		let json = serde_json::to_value(&with_gas).unwrap();
		assert_eq!(json["gasLimit"], "250000");
	}
}
