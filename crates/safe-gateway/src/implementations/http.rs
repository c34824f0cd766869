//! HTTP clients for the gateway and relay REST APIs.
//!
//! Both clients share one configuration shape:
//!
//! ```toml
//! [gateway.implementations.http]
//! base_url = "https://gateway.example.org"
//! timeout_seconds = 30
//! ```

use crate::relay::{RelayError, RelayInterface, RelayQuota, RelayRequest};
use crate::{GatewayError, GatewayInterface, StatusError};
use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::StatusCode;
use safe_types::{short_address, ChainDescriptor, RelayTicket, WalletInfo};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on chain list pages followed before giving up.
const MAX_CHAIN_PAGES: usize = 50;

fn default_timeout_seconds() -> u64 {
	30
}

/// Configuration accepted by [`HttpGateway`] and [`HttpRelay`].
#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
	/// Service root, without the `/v1` suffix.
	pub base_url: String,
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

impl HttpClientConfig {
	fn build_client(&self) -> Result<(reqwest::Client, String), String> {
		if self.base_url.trim().is_empty() {
			return Err("base_url cannot be empty".to_string());
		}
		if self.timeout_seconds == 0 {
			return Err("timeout_seconds must be greater than 0".to_string());
		}
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.timeout(Duration::from_secs(self.timeout_seconds))
			.build()
			.map_err(|e| format!("Failed to build HTTP client: {}", e))?;
		Ok((client, self.base_url.trim_end_matches('/').to_string()))
	}
}

/// One page of the gateway's chain list.
#[derive(Debug, Deserialize)]
struct Page<T> {
	next: Option<String>,
	results: Vec<T>,
}

/// Gateway client speaking the `/v1/chains` REST API.
pub struct HttpGateway {
	client: reqwest::Client,
	base_url: String,
}

impl HttpGateway {
	pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		}
	}

	fn classify_send_error(err: reqwest::Error) -> StatusError {
		if err.is_connect() {
			StatusError::Unreachable(err.to_string())
		} else {
			StatusError::Transient(err.to_string())
		}
	}
}

#[async_trait]
impl GatewayInterface for HttpGateway {
	async fn get_wallet_info(
		&self,
		chain_id: &str,
		address: Address,
	) -> Result<WalletInfo, StatusError> {
		let url = format!(
			"{}/v1/chains/{}/safes/{}",
			self.base_url,
			chain_id,
			address.to_checksum(None)
		);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(Self::classify_send_error)?;

		let status = response.status();
		if status.is_success() {
			return response
				.json::<WalletInfo>()
				.await
				.map_err(|e| StatusError::Malformed(e.to_string()));
		}

		let body = response.text().await.unwrap_or_default();
		tracing::debug!(
			chain_id = %chain_id,
			safe = %short_address(&address),
			status = status.as_u16(),
			"Wallet status lookup failed"
		);

		Err(match status {
			StatusCode::NOT_FOUND => StatusError::NotDeployed,
			StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
				StatusError::InvalidAddress(body)
			},
			_ => StatusError::Transient(format!("HTTP {}: {}", status.as_u16(), body)),
		})
	}

	async fn get_chains(&self) -> Result<Vec<ChainDescriptor>, GatewayError> {
		let mut chains = Vec::new();
		let mut next = Some(format!("{}/v1/chains", self.base_url));
		let mut pages = 0;

		while let Some(url) = next.take() {
			if pages == MAX_CHAIN_PAGES {
				tracing::warn!(pages, "Chain list pagination limit reached");
				break;
			}
			pages += 1;

			let response = self
				.client
				.get(&url)
				.send()
				.await
				.map_err(|e| GatewayError::Network(e.to_string()))?;

			let status = response.status();
			if !status.is_success() {
				return Err(GatewayError::Http {
					status: status.as_u16(),
					message: response.text().await.unwrap_or_default(),
				});
			}

			let page: Page<ChainDescriptor> = response
				.json()
				.await
				.map_err(|e| GatewayError::Decode(e.to_string()))?;
			chains.extend(page.results);
			next = page.next;
		}

		Ok(chains)
	}
}

/// Relay client speaking the `/v1/chains/{id}/relay` REST API.
pub struct HttpRelay {
	client: reqwest::Client,
	base_url: String,
}

impl HttpRelay {
	pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		}
	}

	async fn rejected(response: reqwest::Response) -> RelayError {
		let status = response.status().as_u16();
		RelayError::Rejected {
			status,
			message: response.text().await.unwrap_or_default(),
		}
	}
}

#[async_trait]
impl RelayInterface for HttpRelay {
	async fn relay(
		&self,
		chain_id: &str,
		request: &RelayRequest,
	) -> Result<RelayTicket, RelayError> {
		let url = format!("{}/v1/chains/{}/relay", self.base_url, chain_id);
		let response = self
			.client
			.post(&url)
			.json(request)
			.send()
			.await
			.map_err(|e| RelayError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(Self::rejected(response).await);
		}

		response
			.json::<RelayTicket>()
			.await
			.map_err(|e| RelayError::Decode(e.to_string()))
	}

	async fn remaining_relays(
		&self,
		chain_id: &str,
		address: Address,
	) -> Result<RelayQuota, RelayError> {
		let url = format!(
			"{}/v1/chains/{}/relay/{}",
			self.base_url,
			chain_id,
			address.to_checksum(None)
		);
		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| RelayError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(Self::rejected(response).await);
		}

		response
			.json::<RelayQuota>()
			.await
			.map_err(|e| RelayError::Decode(e.to_string()))
	}
}

/// Factory function to create an HTTP gateway client from configuration.
pub fn create_gateway(config: &toml::Value) -> Result<Box<dyn GatewayInterface>, GatewayError> {
	let config: HttpClientConfig = config
		.clone()
		.try_into()
		.map_err(|e| GatewayError::Configuration(format!("Invalid gateway config: {}", e)))?;
	let (client, base_url) = config.build_client().map_err(GatewayError::Configuration)?;
	Ok(Box::new(HttpGateway::new(client, base_url)))
}

/// Factory function to create an HTTP relay client from configuration.
pub fn create_relay(config: &toml::Value) -> Result<Box<dyn RelayInterface>, RelayError> {
	let config: HttpClientConfig = config
		.clone()
		.try_into()
		.map_err(|e| RelayError::Configuration(format!("Invalid relay config: {}", e)))?;
	let (client, base_url) = config.build_client().map_err(RelayError::Configuration)?;
	Ok(Box::new(HttpRelay::new(client, base_url)))
}

/// Registry for the HTTP gateway implementation.
pub struct Registry;

impl safe_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::GatewayFactory;

	fn factory() -> Self::Factory {
		create_gateway
	}
}

impl crate::GatewayRegistry for Registry {}

/// Registry for the HTTP relay implementation.
pub struct RelayRegistry;

impl safe_types::ImplementationRegistry for RelayRegistry {
	const NAME: &'static str = "http";
	type Factory = crate::RelayFactory;

	fn factory() -> Self::Factory {
		create_relay
	}
}

impl crate::relay::RelayRegistry for RelayRegistry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, Bytes};
	use axum::extract::{Json, Path, Query};
	use axum::http::StatusCode as AxumStatus;
	use axum::routing::{get, post};
	use axum::Router;
	use safe_types::SafeVersion;
	use std::collections::HashMap;

	const SAFE: Address = address!("a9e7c109b555ebe38e1a5b8d0db855d6adac0a19");

	async fn serve(listener: tokio::net::TcpListener, app: Router) -> String {
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		format!("http://{}", addr)
	}

	async fn bind() -> tokio::net::TcpListener {
		tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap()
	}

	fn wallet_json(address: &str) -> serde_json::Value {
		serde_json::json!({
			"address": { "value": address },
			"chainId": "22040",
			"nonce": 0,
			"threshold": 1,
			"owners": [{ "value": "0x1111111111111111111111111111111111111111" }],
			"implementation": { "value": "0xc0cFF0D4C6b1EC02EEF42D831D1C10f75759EfE0" },
			"version": "1.4.1",
			"fallbackHandler": null
		})
	}

	fn chain_json(chain_id: &str) -> serde_json::Value {
		serde_json::json!({
			"chainId": chain_id,
			"chainName": format!("Chain {}", chain_id),
			"shortName": format!("c{}", chain_id),
			"rpcUri": { "authentication": "NO_AUTHENTICATION", "value": "http://127.0.0.1:8545" },
			"blockExplorerUriTemplate": {
				"address": "https://explorer/address/{{address}}",
				"txHash": "https://explorer/tx/{{txHash}}",
				"api": "https://explorer/api"
			},
			"nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 }
		})
	}

	fn gateway(base_url: &str) -> HttpGateway {
		HttpGateway::new(reqwest::Client::new(), base_url)
	}

	#[tokio::test]
	async fn test_wallet_info_found() {
		let app = Router::new().route(
			"/v1/chains/{chain_id}/safes/{address}",
			get(|Path((chain_id, address)): Path<(String, String)>| async move {
				assert_eq!(chain_id, "22040");
				Json(wallet_json(&address))
			}),
		);
		let base = serve(bind().await, app).await;

		let info = gateway(&base).get_wallet_info("22040", SAFE).await.unwrap();
		assert_eq!(info.address.value, SAFE);
		assert_eq!(info.threshold, 1);
		assert_eq!(info.version.as_deref(), Some("1.4.1"));
	}

	#[tokio::test]
	async fn test_wallet_status_classification() {
		let app = Router::new().route(
			"/v1/chains/{chain_id}/safes/{address}",
			get(|Path((chain_id, _)): Path<(String, String)>| async move {
				match chain_id.as_str() {
					"404" => (AxumStatus::NOT_FOUND, "not found".to_string()),
					"422" => (AxumStatus::UNPROCESSABLE_ENTITY, "bad checksum".to_string()),
					"503" => (AxumStatus::SERVICE_UNAVAILABLE, "busy".to_string()),
					_ => (AxumStatus::OK, "not json".to_string()),
				}
			}),
		);
		let base = serve(bind().await, app).await;
		let gateway = gateway(&base);

		assert_eq!(
			gateway.get_wallet_info("404", SAFE).await,
			Err(StatusError::NotDeployed)
		);
		assert_eq!(
			gateway.get_wallet_info("422", SAFE).await,
			Err(StatusError::InvalidAddress("bad checksum".to_string()))
		);
		assert!(matches!(
			gateway.get_wallet_info("503", SAFE).await,
			Err(StatusError::Transient(msg)) if msg.contains("503")
		));
		assert!(matches!(
			gateway.get_wallet_info("200", SAFE).await,
			Err(StatusError::Malformed(_))
		));
	}

	#[tokio::test]
	async fn test_unreachable_gateway() {
		let listener = bind().await;
		let base = format!("http://{}", listener.local_addr().unwrap());
		drop(listener);

		let result = gateway(&base).get_wallet_info("1", SAFE).await;
		assert!(matches!(result, Err(StatusError::Unreachable(_))));
		assert!(!result.unwrap_err().is_retryable());
	}

	#[tokio::test]
	async fn test_chain_list_follows_pages() {
		let listener = bind().await;
		let base = format!("http://{}", listener.local_addr().unwrap());
		let next_base = base.clone();
		let app = Router::new().route(
			"/v1/chains",
			get(move |Query(query): Query<HashMap<String, String>>| {
				let next_base = next_base.clone();
				async move {
					match query.get("cursor").map(String::as_str) {
						None => Json(serde_json::json!({
							"count": 3,
							"next": format!("{}/v1/chains?cursor=2", next_base),
							"previous": null,
							"results": [chain_json("1"), chain_json("100")]
						})),
						Some(_) => Json(serde_json::json!({
							"count": 3,
							"next": null,
							"previous": null,
							"results": [chain_json("22040")]
						})),
					}
				}
			}),
		);
		serve(listener, app).await;

		let chains = gateway(&base).get_chains().await.unwrap();
		let ids: Vec<_> = chains.iter().map(|c| c.chain_id.as_str()).collect();
		assert_eq!(ids, vec!["1", "100", "22040"]);
	}

	#[tokio::test]
	async fn test_chain_list_http_error() {
		let app = Router::new().route(
			"/v1/chains",
			get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
		);
		let base = serve(bind().await, app).await;

		assert!(matches!(
			gateway(&base).get_chains().await,
			Err(GatewayError::Http { status: 500, .. })
		));
	}

	#[tokio::test]
	async fn test_relay_submission() {
		let app = Router::new()
			.route(
				"/v1/chains/{chain_id}/relay",
				post(|Json(body): Json<serde_json::Value>| async move {
					assert_eq!(body["version"], "1.3.0");
					let to: Address = body["to"].as_str().unwrap().parse().unwrap();
					assert_eq!(to, address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67"));
					Json(serde_json::json!({ "taskId": "0xtask" }))
				}),
			)
			.route(
				"/v1/chains/{chain_id}/relay/{address}",
				get(|| async { Json(serde_json::json!({ "remaining": 4, "limit": 5 })) }),
			);
		let base = serve(bind().await, app).await;
		let relay = HttpRelay::new(reqwest::Client::new(), base);

		let ticket = relay
			.relay(
				"5",
				&RelayRequest {
					to: address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67"),
					data: Bytes::from(vec![0x16, 0x88, 0xf0, 0xb9]),
					version: SafeVersion::V1_3_0,
					gas_limit: None,
				},
			)
			.await
			.unwrap();
		assert_eq!(ticket.task_id, "0xtask");

		let quota = relay.remaining_relays("5", SAFE).await.unwrap();
		assert_eq!(quota, RelayQuota { remaining: 4, limit: 5 });
	}

	#[tokio::test]
	async fn test_relay_rejection() {
		let app = Router::new().route(
			"/v1/chains/{chain_id}/relay",
			post(|| async { (AxumStatus::TOO_MANY_REQUESTS, "limit reached") }),
		);
		let base = serve(bind().await, app).await;
		let relay = HttpRelay::new(reqwest::Client::new(), base);

		let result = relay
			.relay(
				"5",
				&RelayRequest {
					to: SAFE,
					data: Bytes::new(),
					version: SafeVersion::V1_4_1,
					gas_limit: Some("100000".to_string()),
				},
			)
			.await;
		assert!(matches!(
			result,
			Err(RelayError::Rejected { status: 429, message }) if message == "limit reached"
		));
	}

	#[test]
	fn test_factories_validate_config() {
		let valid: toml::Value = toml::from_str("base_url = \"http://localhost:8001/\"").unwrap();
		assert!(create_gateway(&valid).is_ok());
		assert!(create_relay(&valid).is_ok());

		let missing: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		assert!(matches!(
			create_gateway(&missing),
			Err(GatewayError::Configuration(_))
		));

		let zero: toml::Value =
			toml::from_str("base_url = \"http://localhost\"\ntimeout_seconds = 0").unwrap();
		assert!(matches!(create_relay(&zero), Err(RelayError::Configuration(_))));
	}
}
