//! Views of a wallet after creation has been requested.

use crate::version::SafeVersion;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Address with the optional display metadata the gateway attaches to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
	pub value: Address,
	pub name: Option<String>,
	pub logo_uri: Option<String>,
}

/// Wallet state as indexed by the gateway.
///
/// Only returned once the wallet exists on chain and has been indexed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
	pub address: AddressInfo,
	pub chain_id: String,
	pub nonce: u64,
	pub threshold: u64,
	pub owners: Vec<AddressInfo>,
	pub implementation: AddressInfo,
	pub version: Option<String>,
	pub fallback_handler: Option<AddressInfo>,
}

/// Result of a direct, self-signed deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHandle {
	pub address: Address,
	pub chain_id: u64,
	pub version: SafeVersion,
	pub transaction_hash: B256,
}

/// Task identifier returned by the relay service.
///
/// Tracking the task is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTicket {
	pub task_id: String,
}
