//! Registry of gateway and relay implementations.
//!
//! Each crate lists its implementations through `get_all_implementations`;
//! the configuration's `primary` key picks one of them by name.

use safe_config::ImplementationConfig;
use safe_gateway::{GatewayFactory, GatewayInterface, RelayFactory, RelayInterface};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, OnceLock};

/// Implementations available to the launcher, keyed by configuration name.
pub struct FactoryRegistry {
	pub gateway: HashMap<String, GatewayFactory>,
	pub relay: HashMap<String, RelayFactory>,
}

impl FactoryRegistry {
	fn new() -> Self {
		Self {
			gateway: HashMap::new(),
			relay: HashMap::new(),
		}
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, registering every implementation on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in safe_gateway::get_all_implementations() {
			tracing::debug!("Registering gateway implementation: {}", name);
			registry.gateway.insert(name.to_string(), factory);
		}

		for (name, factory) in safe_gateway::get_all_relay_implementations() {
			tracing::debug!("Registering relay implementation: {}", name);
			registry.relay.insert(name.to_string(), factory);
		}

		registry
	})
}

/// Looks up the factory for `config.primary` and its configuration table.
macro_rules! select_primary {
	($factories:expr, $config:expr, $type_name:literal) => {{
		let factory = $factories.get(&$config.primary).ok_or_else(|| {
			let mut available: Vec<_> = $factories.keys().cloned().collect();
			available.sort();
			format!(
				"Unknown {} implementation '{}'. Available: [{}]",
				$type_name,
				$config.primary,
				available.join(", ")
			)
		})?;
		let table = $config.primary_config().ok_or_else(|| {
			format!(
				"No configuration for {} implementation '{}'",
				$type_name, $config.primary
			)
		})?;
		(factory, table)
	}};
}

pub fn build_gateway(
	config: &ImplementationConfig,
) -> Result<Arc<dyn GatewayInterface>, Box<dyn Error>> {
	let (factory, table) = select_primary!(get_registry().gateway, config, "gateway");
	tracing::info!(implementation = %config.primary, "Using gateway");
	Ok(Arc::from(factory(table)?))
}

pub fn build_relay(
	config: &ImplementationConfig,
) -> Result<Arc<dyn RelayInterface>, Box<dyn Error>> {
	let (factory, table) = select_primary!(get_registry().relay, config, "relay");
	tracing::info!(implementation = %config.primary, "Using relay");
	Ok(Arc::from(factory(table)?))
}
