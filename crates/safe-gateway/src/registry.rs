//! Chain descriptor lookup.
//!
//! Descriptors come from two places: the gateway's chain list, and chains
//! supplied in configuration for networks the gateway does not serve yet.
//! Configured descriptors take precedence over gateway entries with the same
//! chain id.

use crate::{GatewayError, GatewayInterface};
use safe_types::ChainDescriptor;
use std::sync::Arc;

/// Resolves chain descriptors from the gateway plus injected extras.
pub struct ChainRegistry {
	gateway: Arc<dyn GatewayInterface>,
	extra: Vec<ChainDescriptor>,
}

impl ChainRegistry {
	pub fn new(gateway: Arc<dyn GatewayInterface>, extra: Vec<ChainDescriptor>) -> Self {
		Self { gateway, extra }
	}

	/// Returns every known chain.
	///
	/// Gateway chains come first in gateway order, with configured chains
	/// replacing same-id entries or appended at the end.
	pub async fn chains(&self) -> Result<Vec<ChainDescriptor>, GatewayError> {
		let mut chains = self.gateway.get_chains().await.map_err(|e| {
			tracing::error!(error = %e, "Failed to load chain configurations");
			e
		})?;

		for extra in &self.extra {
			match chains.iter_mut().find(|c| c.chain_id == extra.chain_id) {
				Some(existing) => *existing = extra.clone(),
				None => chains.push(extra.clone()),
			}
		}

		tracing::debug!(count = chains.len(), "Loaded chain configurations");
		Ok(chains)
	}

	/// Looks up a single chain by its decimal id.
	///
	/// Configured chains are answered without contacting the gateway.
	pub async fn chain(&self, chain_id: &str) -> Result<ChainDescriptor, GatewayError> {
		if let Some(chain) = self.extra.iter().find(|c| c.chain_id == chain_id) {
			return Ok(chain.clone());
		}

		self.chains()
			.await?
			.into_iter()
			.find(|c| c.chain_id == chain_id)
			.ok_or_else(|| GatewayError::UnknownChain(chain_id.to_string()))
	}
}
