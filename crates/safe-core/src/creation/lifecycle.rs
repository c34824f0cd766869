//! End-to-end sponsored creation.
//!
//! Predicts the address, submits through the relay, waits for the gateway to
//! index the wallet and computes where to send the user. The stage reached is
//! reported even when the gateway gives up, since the wallet may still appear
//! later.

use super::{CreationError, CreationOrchestrator};
use crate::poller::PollError;
use crate::redirect::{resolve_redirect, Redirect, RedirectHint};
use alloy_primitives::Address;
use safe_provider::ChainProvider;
use safe_types::{
	short_address, truncate_id, ChainDescriptor, CreationParameters, CreationStage,
	PendingDeployment, RelayTicket, SafeVersion, WalletInfo,
};
use tracing::instrument;

/// Result of [`CreationOrchestrator::create_and_await`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationOutcome {
	pub pending: PendingDeployment,
	pub ticket: RelayTicket,
	pub stage: CreationStage,
	/// Present once the gateway has indexed the wallet.
	pub wallet: Option<WalletInfo>,
	/// Present once the wallet is deployed.
	pub redirect: Option<Redirect>,
}

fn advance(stage: CreationStage, next: CreationStage) -> CreationStage {
	match stage.advance(next) {
		Ok(next) => {
			tracing::debug!(from = ?stage, to = ?next, "Creation stage changed");
			next
		},
		Err(current) => {
			tracing::warn!(from = ?current, to = ?next, "Ignored invalid creation stage change");
			current
		},
	}
}

impl CreationOrchestrator {
	/// Relays a creation and waits until the wallet is indexed.
	///
	/// A poll that runs out of attempts yields an outcome in
	/// [`CreationStage::TimedOut`]; a rejected poll is an error.
	#[instrument(skip_all, fields(chain_id = %chain.chain_id))]
	pub async fn create_and_await(
		&self,
		provider: &dyn ChainProvider,
		chain: &ChainDescriptor,
		params: &CreationParameters,
		version: Option<SafeVersion>,
		redirect_hint: Option<&RedirectHint>,
	) -> Result<CreationOutcome, CreationError> {
		let version = self.resolve_version(chain, version);
		let address: Address = self
			.predict_address(provider, params, chain, Some(version))
			.await?;
		let mut stage = CreationStage::Predicted;

		let ticket = self
			.relay_creation(
				chain,
				params.owners.clone(),
				params.threshold,
				params.salt_nonce,
				Some(version),
			)
			.await?;
		stage = advance(stage, CreationStage::Submitted);

		let pending = PendingDeployment {
			chain_id: chain.chain_id.clone(),
			address,
		};
		stage = advance(stage, CreationStage::PollingDeployment);
		tracing::debug!(
			safe = %short_address(&address),
			max_attempts = self.poller().policy().max_attempts,
			"Waiting for the wallet to be indexed"
		);

		match self.poller().poll_pending(&pending).await {
			Ok(info) => {
				let stage = advance(stage, CreationStage::Deployed);
				let redirect = resolve_redirect(
					&chain.short_name,
					&address.to_checksum(None),
					redirect_hint,
				);
				tracing::info!(
					safe = %short_address(&address),
					task_id = %truncate_id(&ticket.task_id),
					"Wallet created"
				);
				Ok(CreationOutcome {
					pending,
					ticket,
					stage,
					wallet: Some(info),
					redirect: Some(redirect),
				})
			},
			Err(PollError::DeploymentTimeout { attempts, last_error }) => {
				tracing::warn!(
					safe = %short_address(&address),
					attempts,
					error = %last_error,
					"Wallet creation is taking longer than expected"
				);
				Ok(CreationOutcome {
					pending,
					ticket,
					stage: advance(stage, CreationStage::TimedOut),
					wallet: None,
					redirect: None,
				})
			},
			Err(e) => Err(e.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::tests::{chain, orchestrator, params, PREDICTED};
	use super::*;
	use crate::redirect::NavigationTarget;
	use safe_gateway::{MockGatewayInterface, MockRelayInterface, StatusError};
	use safe_provider::{MockChainProvider, MockFactoryConnector};

	fn relay() -> MockRelayInterface {
		let mut relay = MockRelayInterface::new();
		relay.expect_relay().times(1).returning(|_, _| {
			Ok(RelayTicket {
				task_id: "0xtask".to_string(),
			})
		});
		relay
	}

	fn wallet_info() -> WalletInfo {
		serde_json::from_value(serde_json::json!({
			"address": { "value": PREDICTED },
			"chainId": "22040",
			"nonce": 0,
			"threshold": 1,
			"owners": [{ "value": "0x1111111111111111111111111111111111111111" }],
			"implementation": { "value": "0xc0cFF0D4C6b1EC02EEF42D831D1C10f75759EfE0" },
			"version": "1.4.1"
		}))
		.unwrap()
	}

	#[tokio::test(start_paused = true)]
	async fn test_create_and_await_deployed() {
		let mut gateway = MockGatewayInterface::new();
		let mut calls = 0;
		gateway
			.expect_get_wallet_info()
			.withf(|_, address| *address == PREDICTED)
			.times(2)
			.returning(move |_, _| {
				calls += 1;
				if calls == 1 {
					Err(StatusError::NotDeployed)
				} else {
					Ok(wallet_info())
				}
			});

		let orchestrator = orchestrator(MockFactoryConnector::new(), gateway, Some(relay()));
		let hint = RedirectHint::from("/apps/open?appUrl=https://app");
		let outcome = orchestrator
			.create_and_await(
				&MockChainProvider::new(),
				&chain(true),
				&params(),
				None,
				Some(&hint),
			)
			.await
			.unwrap();

		assert_eq!(outcome.stage, CreationStage::Deployed);
		assert_eq!(outcome.pending.address, PREDICTED);
		assert_eq!(outcome.ticket.task_id, "0xtask");
		assert_eq!(outcome.wallet, Some(wallet_info()));

		let redirect = outcome.redirect.unwrap();
		assert_eq!(
			redirect.target,
			NavigationTarget::Url {
				href: format!(
					"/apps/open?appUrl=https://app&safe=ambtest:{}",
					PREDICTED.to_checksum(None)
				)
			}
		);
		assert_eq!(redirect.effects.len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_create_and_await_timed_out() {
		let mut gateway = MockGatewayInterface::new();
		gateway
			.expect_get_wallet_info()
			.times(19)
			.returning(|_, _| Err(StatusError::NotDeployed));

		let orchestrator = orchestrator(MockFactoryConnector::new(), gateway, Some(relay()));
		let outcome = orchestrator
			.create_and_await(&MockChainProvider::new(), &chain(true), &params(), None, None)
			.await
			.unwrap();

		assert_eq!(outcome.stage, CreationStage::TimedOut);
		assert!(outcome.wallet.is_none());
		assert!(outcome.redirect.is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn test_create_and_await_rejected() {
		let mut gateway = MockGatewayInterface::new();
		gateway
			.expect_get_wallet_info()
			.times(1)
			.returning(|_, _| Err(StatusError::Unreachable("connection refused".into())));

		let orchestrator = orchestrator(MockFactoryConnector::new(), gateway, Some(relay()));
		let result = orchestrator
			.create_and_await(&MockChainProvider::new(), &chain(true), &params(), None, None)
			.await;

		assert!(matches!(
			result,
			Err(CreationError::Poll(PollError::Rejected(StatusError::Unreachable(_))))
		));
	}

	#[test]
	fn test_stage_changes() {
		assert_eq!(
			advance(CreationStage::Predicted, CreationStage::Submitted),
			CreationStage::Submitted
		);
		assert_eq!(
			advance(CreationStage::Predicted, CreationStage::Deployed),
			CreationStage::Predicted
		);
	}
}
