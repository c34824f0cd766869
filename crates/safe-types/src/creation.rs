//! Wallet creation inputs and lifecycle.
//!
//! `CreationParameters` are validated once at construction; every later stage
//! (encoding, prediction, relay, deployment) can rely on the owner/threshold
//! invariant holding.

use crate::secret_string::SecretString;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised when creation parameters violate the owner/threshold invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
	#[error("At least one owner is required")]
	NoOwners,
	#[error("Threshold {threshold} must be between 1 and {owners}")]
	ThresholdOutOfRange { threshold: u64, owners: usize },
	#[error("Owner {0} is listed more than once")]
	DuplicateOwner(Address),
	#[error("The zero address cannot be an owner")]
	ZeroOwner,
}

/// Owners, threshold and salt nonce for a new wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationParameters {
	pub owners: Vec<Address>,
	pub threshold: u64,
	/// Mixed into the CREATE2 salt so one owner set can deploy many wallets.
	pub salt_nonce: U256,
}

impl CreationParameters {
	/// Builds validated creation parameters.
	pub fn new(
		owners: Vec<Address>,
		threshold: u64,
		salt_nonce: U256,
	) -> Result<Self, ParameterError> {
		let params = Self {
			owners,
			threshold,
			salt_nonce,
		};
		params.validate()?;
		Ok(params)
	}

	/// Checks `1 <= threshold <= owners.len()` and owner uniqueness.
	///
	/// Exposed separately because parameters may also arrive through serde.
	pub fn validate(&self) -> Result<(), ParameterError> {
		if self.owners.is_empty() {
			return Err(ParameterError::NoOwners);
		}
		if self.threshold == 0 || self.threshold > self.owners.len() as u64 {
			return Err(ParameterError::ThresholdOutOfRange {
				threshold: self.threshold,
				owners: self.owners.len(),
			});
		}

		let mut seen = HashSet::with_capacity(self.owners.len());
		for owner in &self.owners {
			if owner.is_zero() {
				return Err(ParameterError::ZeroOwner);
			}
			if !seen.insert(owner) {
				return Err(ParameterError::DuplicateOwner(*owner));
			}
		}

		Ok(())
	}
}

/// Polling key for a wallet whose creation transaction has been submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeployment {
	pub chain_id: String,
	pub address: Address,
}

/// Signing connection used for direct deployments.
#[derive(Debug, Clone)]
pub struct Connection {
	pub rpc_url: String,
	pub private_key: SecretString,
}

/// Stage of a wallet creation flow.
///
/// Reconstructed per request; nothing about it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationStage {
	Predicted,
	Submitted,
	PollingDeployment,
	Deployed,
	TimedOut,
}

impl CreationStage {
	pub fn is_terminal(&self) -> bool {
		matches!(self, CreationStage::Deployed | CreationStage::TimedOut)
	}

	/// Whether `next` directly follows this stage.
	pub fn can_transition_to(&self, next: CreationStage) -> bool {
		matches!(
			(self, next),
			(CreationStage::Predicted, CreationStage::Submitted)
				| (CreationStage::Submitted, CreationStage::PollingDeployment)
				| (CreationStage::PollingDeployment, CreationStage::Deployed)
				| (CreationStage::PollingDeployment, CreationStage::TimedOut)
		)
	}

	/// Moves to `next`, returning the current stage unchanged if the move is illegal.
	pub fn advance(self, next: CreationStage) -> Result<CreationStage, CreationStage> {
		if self.can_transition_to(next) {
			Ok(next)
		} else {
			Err(self)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const ALICE: Address = address!("1111111111111111111111111111111111111111");
	const BOB: Address = address!("2222222222222222222222222222222222222222");

	#[test]
	fn test_valid_parameters() {
		let params = CreationParameters::new(vec![ALICE, BOB], 2, U256::from(7)).unwrap();
		assert_eq!(params.threshold, 2);
		assert_eq!(params.owners.len(), 2);
	}

	#[test]
	fn test_threshold_bounds() {
		assert_eq!(
			CreationParameters::new(vec![ALICE], 0, U256::ZERO).unwrap_err(),
			ParameterError::ThresholdOutOfRange {
				threshold: 0,
				owners: 1
			}
		);
		assert!(matches!(
			CreationParameters::new(vec![ALICE, BOB], 3, U256::ZERO),
			Err(ParameterError::ThresholdOutOfRange { threshold: 3, .. })
		));
	}

	#[test]
	fn test_owner_checks() {
		assert_eq!(
			CreationParameters::new(vec![], 1, U256::ZERO).unwrap_err(),
			ParameterError::NoOwners
		);
		assert_eq!(
			CreationParameters::new(vec![ALICE, ALICE], 1, U256::ZERO).unwrap_err(),
			ParameterError::DuplicateOwner(ALICE)
		);
		assert_eq!(
			CreationParameters::new(vec![Address::ZERO], 1, U256::ZERO).unwrap_err(),
			ParameterError::ZeroOwner
		);
	}

	#[test]
	fn test_stage_transitions() {
		let stage = CreationStage::Predicted
			.advance(CreationStage::Submitted)
			.and_then(|s| s.advance(CreationStage::PollingDeployment))
			.and_then(|s| s.advance(CreationStage::TimedOut))
			.unwrap();
		assert!(stage.is_terminal());

		assert_eq!(
			CreationStage::Predicted.advance(CreationStage::Deployed),
			Err(CreationStage::Predicted)
		);
		assert!(!CreationStage::Deployed.can_transition_to(CreationStage::Submitted));
	}
}
