//! Waits for the gateway to index a freshly created wallet.
//!
//! The first lookup runs immediately. Retries follow an exponential schedule
//! (750ms, 1.5s, 3s, ... capped at 20s, no jitter by default) and stop after a
//! fixed number of attempts. Only [`StatusError`]s that say "not yet" are
//! retried; anything that waiting cannot fix ends the poll at once.

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use safe_config::PollingConfig;
use safe_gateway::{GatewayInterface, StatusError};
use safe_types::{short_address, PendingDeployment, WalletInfo};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`DeploymentPoller::poll_status`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
	/// Every attempt failed with a retryable status.
	#[error("Wallet not indexed after {attempts} attempts: {last_error}")]
	DeploymentTimeout {
		attempts: u32,
		last_error: StatusError,
	},
	/// The gateway answered in a way retrying cannot fix.
	#[error("Wallet status lookup rejected: {0}")]
	Rejected(StatusError),
}

/// Retry schedule for status polling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
	pub initial_delay: Duration,
	pub max_delay: Duration,
	pub multiplier: f64,
	/// Total lookups, including the immediate first one.
	pub max_attempts: u32,
}

impl Default for PollPolicy {
	fn default() -> Self {
		Self {
			initial_delay: Duration::from_millis(750),
			max_delay: Duration::from_millis(20_000),
			multiplier: 2.0,
			max_attempts: 19,
		}
	}
}

impl From<&PollingConfig> for PollPolicy {
	fn from(config: &PollingConfig) -> Self {
		Self {
			initial_delay: Duration::from_millis(config.initial_delay_ms),
			max_delay: Duration::from_millis(config.max_delay_ms),
			multiplier: config.multiplier,
			max_attempts: config.max_attempts,
		}
	}
}

impl PollPolicy {
	fn backoff(&self) -> BoundedBackoff {
		let inner = ExponentialBackoffBuilder::new()
			.with_initial_interval(self.initial_delay)
			.with_randomization_factor(0.0)
			.with_multiplier(self.multiplier)
			.with_max_interval(self.max_delay)
			.with_max_elapsed_time(None)
			.build();
		let retries = self.max_attempts.saturating_sub(1);
		BoundedBackoff {
			inner,
			retries,
			remaining: retries,
		}
	}
}

/// Exponential backoff that gives up after a fixed number of retries.
struct BoundedBackoff {
	inner: ExponentialBackoff,
	retries: u32,
	remaining: u32,
}

impl Backoff for BoundedBackoff {
	fn next_backoff(&mut self) -> Option<Duration> {
		if self.remaining == 0 {
			return None;
		}
		self.remaining -= 1;
		self.inner.next_backoff()
	}

	fn reset(&mut self) {
		self.remaining = self.retries;
		self.inner.reset();
	}
}

/// Polls the gateway until a wallet shows up.
#[derive(Clone)]
pub struct DeploymentPoller {
	gateway: Arc<dyn GatewayInterface>,
	policy: PollPolicy,
}

impl DeploymentPoller {
	pub fn new(gateway: Arc<dyn GatewayInterface>, policy: PollPolicy) -> Self {
		Self { gateway, policy }
	}

	pub fn policy(&self) -> &PollPolicy {
		&self.policy
	}

	/// Looks the wallet up until the gateway returns it.
	///
	/// Attempts run strictly one after another. Dropping the returned future
	/// abandons the poll.
	pub async fn poll_status(
		&self,
		chain_id: &str,
		address: alloy_primitives::Address,
	) -> Result<WalletInfo, PollError> {
		let attempts = AtomicU32::new(0);
		let counter = &attempts;
		let gateway = &self.gateway;
		let started = tokio::time::Instant::now();

		let lookup = move || {
			counter.fetch_add(1, Ordering::Relaxed);
			async move {
				gateway
					.get_wallet_info(chain_id, address)
					.await
					.map_err(|e| {
						if e.is_retryable() {
							backoff::Error::transient(e)
						} else {
							backoff::Error::permanent(e)
						}
					})
			}
		};

		let notify = move |e: StatusError, delay: Duration| {
			tracing::info!(
				safe = %short_address(&address),
				attempt = counter.load(Ordering::Relaxed),
				retry_in_ms = delay.as_millis() as u64,
				error = %e,
				"Waiting for gateway to provide wallet information"
			);
		};

		let result = backoff::future::retry_notify(self.policy.backoff(), lookup, notify).await;
		let attempts = attempts.load(Ordering::Relaxed);

		match result {
			Ok(info) => {
				tracing::info!(
					chain_id = %chain_id,
					safe = %short_address(&address),
					attempts,
					elapsed_ms = started.elapsed().as_millis() as u64,
					"Wallet indexed"
				);
				Ok(info)
			},
			Err(e) if e.is_retryable() => {
				tracing::warn!(
					chain_id = %chain_id,
					safe = %short_address(&address),
					attempts,
					error = %e,
					"Gave up waiting for wallet"
				);
				Err(PollError::DeploymentTimeout {
					attempts,
					last_error: e,
				})
			},
			Err(e) => {
				tracing::error!(
					chain_id = %chain_id,
					safe = %short_address(&address),
					error = %e,
					"Wallet status lookup rejected"
				);
				Err(PollError::Rejected(e))
			},
		}
	}

	/// Polls for a [`PendingDeployment`].
	pub async fn poll_pending(&self, pending: &PendingDeployment) -> Result<WalletInfo, PollError> {
		self.poll_status(&pending.chain_id, pending.address).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, Address};
	use safe_gateway::MockGatewayInterface;
	use std::sync::atomic::AtomicUsize;

	const SAFE: Address = address!("a9e7c109b555ebe38e1a5b8d0db855d6adac0a19");

	fn wallet_info() -> WalletInfo {
		serde_json::from_value(serde_json::json!({
			"address": { "value": "0xa9e7c109b555ebe38e1a5b8d0db855d6adac0a19" },
			"chainId": "22040",
			"nonce": 0,
			"threshold": 1,
			"owners": [{ "value": "0x1111111111111111111111111111111111111111" }],
			"implementation": { "value": "0xc0cFF0D4C6b1EC02EEF42D831D1C10f75759EfE0" },
			"version": "1.4.1"
		}))
		.unwrap()
	}

	fn poller(gateway: MockGatewayInterface) -> DeploymentPoller {
		DeploymentPoller::new(Arc::new(gateway), PollPolicy::default())
	}

	#[tokio::test(start_paused = true)]
	async fn test_resolves_after_transient_failures() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();

		let mut gateway = MockGatewayInterface::new();
		gateway
			.expect_get_wallet_info()
			.withf(|chain_id, address| chain_id == "22040" && *address == SAFE)
			.returning(move |_, _| match counter.fetch_add(1, Ordering::SeqCst) {
				0 => Err(StatusError::NotDeployed),
				1 => Err(StatusError::Transient("HTTP 503".into())),
				_ => Ok(wallet_info()),
			});

		let started = tokio::time::Instant::now();
		let info = poller(gateway).poll_status("22040", SAFE).await.unwrap();

		assert_eq!(info, wallet_info());
		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert!(started.elapsed() >= Duration::from_millis(750 + 1500));
	}

	#[tokio::test(start_paused = true)]
	async fn test_times_out_after_max_attempts() {
		let mut gateway = MockGatewayInterface::new();
		gateway
			.expect_get_wallet_info()
			.times(19)
			.returning(|_, _| Err(StatusError::NotDeployed));

		let result = poller(gateway).poll_status("22040", SAFE).await;
		assert_eq!(
			result,
			Err(PollError::DeploymentTimeout {
				attempts: 19,
				last_error: StatusError::NotDeployed,
			})
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_delays_grow_and_cap() {
		let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
		let recorder = stamps.clone();
		let started = tokio::time::Instant::now();

		let mut gateway = MockGatewayInterface::new();
		gateway.expect_get_wallet_info().returning(move |_, _| {
			recorder.lock().unwrap().push(started.elapsed());
			Err(StatusError::NotDeployed)
		});

		let policy = PollPolicy {
			max_attempts: 8,
			..PollPolicy::default()
		};
		let result = DeploymentPoller::new(Arc::new(gateway), policy)
			.poll_status("22040", SAFE)
			.await;
		assert!(matches!(result, Err(PollError::DeploymentTimeout { attempts: 8, .. })));

		let stamps = stamps.lock().unwrap();
		let gaps: Vec<u128> = stamps
			.windows(2)
			.map(|w| (w[1] - w[0]).as_millis())
			.collect();
		assert_eq!(stamps[0], Duration::ZERO);
		assert_eq!(gaps, vec![750, 1500, 3000, 6000, 12000, 20000, 20000]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_permanent_error_fails_fast() {
		let mut gateway = MockGatewayInterface::new();
		gateway
			.expect_get_wallet_info()
			.times(1)
			.returning(|_, _| Err(StatusError::InvalidAddress("bad checksum".into())));

		let started = tokio::time::Instant::now();
		let result = poller(gateway).poll_status("22040", SAFE).await;

		assert_eq!(
			result,
			Err(PollError::Rejected(StatusError::InvalidAddress(
				"bad checksum".into()
			)))
		);
		assert_eq!(started.elapsed(), Duration::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn test_poll_pending() {
		let mut gateway = MockGatewayInterface::new();
		gateway
			.expect_get_wallet_info()
			.times(1)
			.returning(|_, _| Ok(wallet_info()));

		let pending = PendingDeployment {
			chain_id: "22040".to_string(),
			address: SAFE,
		};
		assert!(poller(gateway).poll_pending(&pending).await.is_ok());
	}

	#[test]
	fn test_policy_from_config() {
		let config = PollingConfig {
			initial_delay_ms: 100,
			max_delay_ms: 1000,
			multiplier: 1.5,
			max_attempts: 4,
		};
		let policy = PollPolicy::from(&config);
		assert_eq!(policy.initial_delay, Duration::from_millis(100));
		assert_eq!(policy.max_attempts, 4);

		let mut backoff = policy.backoff();
		let delays: Vec<_> = std::iter::from_fn(|| backoff.next_backoff()).collect();
		assert_eq!(
			delays,
			vec![
				Duration::from_millis(100),
				Duration::from_millis(150),
				Duration::from_millis(225)
			]
		);
	}
}
