//! Counterfactual wallet addresses.
//!
//! The proxy factory deploys with CREATE2 using
//! `salt = keccak256(keccak256(initializer) ++ uint256(saltNonce))` and
//! `initCode = proxyCreationCode ++ uint256(singleton)`, so the address is a
//! pure function of its inputs.

use alloy_primitives::{keccak256, Address, U256};

/// Computes the address `createProxyWithNonce` will deploy the proxy at.
pub fn predict_safe_address(
	factory: Address,
	singleton: Address,
	initializer: &[u8],
	salt_nonce: U256,
	proxy_creation_code: &[u8],
) -> Address {
	let mut salt_preimage = Vec::with_capacity(64);
	salt_preimage.extend_from_slice(keccak256(initializer).as_slice());
	salt_preimage.extend_from_slice(&salt_nonce.to_be_bytes::<32>());
	let salt = keccak256(&salt_preimage);

	let mut init_code = Vec::with_capacity(proxy_creation_code.len() + 32);
	init_code.extend_from_slice(proxy_creation_code);
	init_code.extend_from_slice(&[0u8; 12]); // Left-pad singleton to 32 bytes
	init_code.extend_from_slice(singleton.as_slice());

	factory.create2(salt.0, keccak256(&init_code).0)
}
