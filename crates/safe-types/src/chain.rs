//! Chain descriptors for the networks a wallet can be created on.
//!
//! The layout mirrors the chain configuration served by the gateway so that
//! descriptors fetched over HTTP and descriptors loaded from configuration
//! deserialize into the same type.

use crate::version::SafeVersion;
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature flags advertised by a chain.
pub mod features {
	pub const CONTRACT_INTERACTION: &str = "CONTRACT_INTERACTION";
	pub const DOMAIN_LOOKUP: &str = "DOMAIN_LOOKUP";
	pub const EIP1271: &str = "EIP1271";
	pub const EIP1559: &str = "EIP1559";
	pub const RELAYING: &str = "RELAYING";
	pub const SAFE_APPS: &str = "SAFE_APPS";
}

/// How an RPC URI expects to be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcAuthentication {
	/// The API key is appended to the URI path.
	ApiKeyPath,
	#[default]
	NoAuthentication,
	#[serde(other)]
	Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcUri {
	#[serde(default)]
	pub authentication: RpcAuthentication,
	pub value: String,
}

impl RpcUri {
	/// Resolves the URI, appending the API key for path-authenticated endpoints.
	pub fn resolve(&self, api_key: Option<&str>) -> String {
		match (self.authentication, api_key) {
			(RpcAuthentication::ApiKeyPath, Some(key)) => format!("{}{}", self.value, key),
			_ => self.value.clone(),
		}
	}
}

/// Block explorer URI templates with `{{address}}` / `{{txHash}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockExplorerUriTemplate {
	pub address: String,
	pub tx_hash: String,
	pub api: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	pub logo_uri: Option<String>,
}

/// Gas price source for a chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GasPrice {
	#[serde(rename_all = "camelCase")]
	Oracle {
		uri: String,
		gas_parameter: String,
		gwei_factor: String,
	},
	#[serde(rename_all = "camelCase")]
	Fixed { wei_value: String },
	#[serde(rename = "FIXED_1559", rename_all = "camelCase")]
	Fixed1559 {
		max_fee_per_gas: String,
		max_priority_fee_per_gas: String,
	},
	#[serde(other)]
	Unknown,
}

/// Addresses of the Safe system contracts deployed on a chain.
///
/// Every field is optional because the gateway reports `null` for contracts
/// that were never deployed on a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
	pub safe_singleton_address: Option<Address>,
	/// Singleton emitting events for L2 indexing. Preferred on L2 chains.
	#[serde(default)]
	pub safe_singleton_l2_address: Option<Address>,
	pub safe_proxy_factory_address: Option<Address>,
	pub multi_send_address: Option<Address>,
	pub multi_send_call_only_address: Option<Address>,
	pub fallback_handler_address: Option<Address>,
	pub sign_message_lib_address: Option<Address>,
	pub create_call_address: Option<Address>,
	pub simulate_tx_accessor_address: Option<Address>,
	#[serde(default)]
	pub safe_web_authn_signer_factory_address: Option<Address>,
	/// Cached `proxyCreationCode()` of the proxy factory.
	///
	/// When present, counterfactual addresses are derived without touching
	/// the network.
	#[serde(default)]
	pub proxy_creation_code: Option<Bytes>,
	/// Creation contracts of releases other than the recommended one.
	///
	/// The top-level addresses belong to the chain's recommended version
	/// only; any other version must be listed here to be usable.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub deployments: BTreeMap<SafeVersion, SafeDeployment>,
}

/// Creation contracts of one Safe release on a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDeployment {
	pub safe_singleton_address: Option<Address>,
	#[serde(default)]
	pub safe_singleton_l2_address: Option<Address>,
	pub safe_proxy_factory_address: Option<Address>,
	#[serde(default)]
	pub fallback_handler_address: Option<Address>,
	#[serde(default)]
	pub proxy_creation_code: Option<Bytes>,
}

/// Descriptor of a supported network.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
	/// Decimal chain id, kept as a string the way the gateway reports it.
	pub chain_id: String,
	pub chain_name: String,
	/// Prefix used in `<prefix>:<address>` wallet identifiers.
	pub short_name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub l2: bool,
	#[serde(default)]
	pub is_testnet: bool,
	pub chain_logo_uri: Option<String>,
	pub transaction_service: Option<String>,
	pub rpc_uri: RpcUri,
	pub safe_apps_rpc_uri: Option<RpcUri>,
	pub public_rpc_uri: Option<RpcUri>,
	pub block_explorer_uri_template: BlockExplorerUriTemplate,
	pub native_currency: NativeCurrency,
	pub ens_registry_address: Option<Address>,
	#[serde(default)]
	pub gas_price: Vec<GasPrice>,
	#[serde(default)]
	pub disabled_wallets: Vec<String>,
	#[serde(default)]
	pub features: Vec<String>,
	pub recommended_master_copy_version: Option<String>,
	#[serde(default)]
	pub contract_addresses: ContractAddresses,
}

impl ChainDescriptor {
	/// Parses the chain id as an EVM chain id.
	pub fn numeric_chain_id(&self) -> Option<u64> {
		self.chain_id.parse().ok()
	}

	pub fn has_feature(&self, feature: &str) -> bool {
		self.features.iter().any(|f| f == feature)
	}

	/// Version to use when the caller does not request one.
	///
	/// Falls back to [`SafeVersion::LATEST`] when the chain does not recommend
	/// a version or recommends one outside the allowlist.
	pub fn latest_safe_version(&self) -> SafeVersion {
		self.recommended_master_copy_version
			.as_deref()
			.and_then(|v| v.parse().ok())
			.unwrap_or(SafeVersion::LATEST)
	}

	/// Creation contracts of `version` on this chain.
	///
	/// An explicit `deployments` entry wins. Otherwise the top-level
	/// addresses are used, but only for the recommended version.
	pub fn deployment(&self, version: SafeVersion) -> Option<SafeDeployment> {
		let contracts = &self.contract_addresses;
		if let Some(deployment) = contracts.deployments.get(&version) {
			return Some(deployment.clone());
		}
		(version == self.latest_safe_version()).then(|| SafeDeployment {
			safe_singleton_address: contracts.safe_singleton_address,
			safe_singleton_l2_address: contracts.safe_singleton_l2_address,
			safe_proxy_factory_address: contracts.safe_proxy_factory_address,
			fallback_handler_address: contracts.fallback_handler_address,
			proxy_creation_code: contracts.proxy_creation_code.clone(),
		})
	}

	pub fn explorer_address_url(&self, address: &Address) -> String {
		self.block_explorer_uri_template
			.address
			.replace("{{address}}", &address.to_checksum(None))
	}

	pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
		self.block_explorer_uri_template
			.tx_hash
			.replace("{{txHash}}", tx_hash)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	fn gateway_chain_json() -> serde_json::Value {
		serde_json::json!({
			"chainId": "22040",
			"chainName": "AirDAO Testnet",
			"shortName": "ambtest",
			"l2": false,
			"isTestnet": true,
			"description": "AirDAO Testnet",
			"chainLogoUri": null,
			"transactionService": "http://127.0.0.1:8000/api/v1/",
			"rpcUri": { "authentication": "NO_AUTHENTICATION", "value": "https://network.ambrosus-test.io" },
			"safeAppsRpcUri": { "authentication": "NO_AUTHENTICATION", "value": "https://network.ambrosus-test.io" },
			"publicRpcUri": null,
			"blockExplorerUriTemplate": {
				"address": "https://testnet.airdao.io/explorer/address/{{address}}",
				"txHash": "https://testnet.airdao.io/explorer/tx/{{txHash}}",
				"api": "https://testnet.airdao.io/explorer"
			},
			"nativeCurrency": { "name": "AirDAO", "symbol": "AMB", "decimals": 18, "logoUri": null },
			"ensRegistryAddress": null,
			"gasPrice": [
				{ "type": "FIXED", "weiValue": "0" },
				{ "type": "FIXED_1559", "maxFeePerGas": "100", "maxPriorityFeePerGas": "1" },
				{ "type": "SOMETHING_NEW" }
			],
			"disabledWallets": [],
			"features": ["SAFE_APPS", "EIP1559"],
			"theme": { "textColor": "#ffffff", "backgroundColor": "#000000" },
			"contractAddresses": {
				"safeSingletonAddress": "0xc0cFF0D4C6b1EC02EEF42D831D1C10f75759EfE0",
				"safeProxyFactoryAddress": "0x3e030482A27371eF35CCc5a60Cf38A888CFe985b",
				"multiSendAddress": null,
				"multiSendCallOnlyAddress": null,
				"fallbackHandlerAddress": "0x53bD692DeFfd097b2955168eF4b382db5De32790",
				"signMessageLibAddress": null,
				"createCallAddress": null,
				"simulateTxAccessorAddress": null,
				"safeWebAuthnSignerFactoryAddress": null
			}
		})
	}

	#[test]
	fn test_deserialize_gateway_chain() {
		let chain: ChainDescriptor = serde_json::from_value(gateway_chain_json()).unwrap();

		assert_eq!(chain.numeric_chain_id(), Some(22040));
		assert_eq!(chain.short_name, "ambtest");
		assert!(chain.has_feature(features::SAFE_APPS));
		assert!(!chain.has_feature(features::RELAYING));
		assert_eq!(chain.gas_price.len(), 3);
		assert_eq!(chain.gas_price[2], GasPrice::Unknown);
		assert_eq!(
			chain.contract_addresses.safe_proxy_factory_address,
			Some(address!("3e030482A27371eF35CCc5a60Cf38A888CFe985b"))
		);
		assert!(chain.contract_addresses.proxy_creation_code.is_none());
	}

	#[test]
	fn test_latest_version_falls_back() {
		let mut chain: ChainDescriptor = serde_json::from_value(gateway_chain_json()).unwrap();
		assert_eq!(chain.latest_safe_version(), SafeVersion::LATEST);

		chain.recommended_master_copy_version = Some("1.3.0".to_string());
		assert_eq!(chain.latest_safe_version(), SafeVersion::V1_3_0);

		chain.recommended_master_copy_version = Some("9.9.9".to_string());
		assert_eq!(chain.latest_safe_version(), SafeVersion::LATEST);
	}

	#[test]
	fn test_deployment_is_version_scoped() {
		let mut chain: ChainDescriptor = serde_json::from_value(gateway_chain_json()).unwrap();

		let latest = chain.deployment(SafeVersion::V1_4_1).unwrap();
		assert_eq!(
			latest.safe_singleton_address,
			Some(address!("c0cFF0D4C6b1EC02EEF42D831D1C10f75759EfE0"))
		);
		assert!(chain.deployment(SafeVersion::V1_3_0).is_none());

		let mut json = gateway_chain_json();
		json["contractAddresses"]["deployments"] = serde_json::json!({
			"1.3.0": {
				"safeSingletonAddress": "0x3333333333333333333333333333333333333333",
				"safeProxyFactoryAddress": "0x4444444444444444444444444444444444444444"
			}
		});
		chain = serde_json::from_value(json).unwrap();
		let legacy = chain.deployment(SafeVersion::V1_3_0).unwrap();
		assert_eq!(
			legacy.safe_singleton_address,
			Some(address!("3333333333333333333333333333333333333333"))
		);
		assert!(legacy.fallback_handler_address.is_none());

		// The top-level set follows the recommended version.
		chain.recommended_master_copy_version = Some("1.1.1".to_string());
		assert!(chain.deployment(SafeVersion::V1_4_1).is_none());
		assert!(chain.deployment(SafeVersion::V1_1_1).is_some());
	}

	#[test]
	fn test_explorer_templates() {
		let chain: ChainDescriptor = serde_json::from_value(gateway_chain_json()).unwrap();
		let addr = address!("53bD692DeFfd097b2955168eF4b382db5De32790");

		assert_eq!(
			chain.explorer_address_url(&addr),
			"https://testnet.airdao.io/explorer/address/0x53bD692DeFfd097b2955168eF4b382db5De32790"
		);
		assert_eq!(
			chain.explorer_tx_url("0xabc"),
			"https://testnet.airdao.io/explorer/tx/0xabc"
		);
	}

	#[test]
	fn test_rpc_uri_api_key_path() {
		let uri = RpcUri {
			authentication: RpcAuthentication::ApiKeyPath,
			value: "https://mainnet.example.io/v3/".to_string(),
		};
		assert_eq!(uri.resolve(Some("key")), "https://mainnet.example.io/v3/key");
		assert_eq!(uri.resolve(None), "https://mainnet.example.io/v3/");

		let open = RpcUri {
			authentication: RpcAuthentication::NoAuthentication,
			value: "https://rpc.example.io".to_string(),
		};
		assert_eq!(open.resolve(Some("key")), "https://rpc.example.io");
	}
}
