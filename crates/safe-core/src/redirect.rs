//! Where to send the user once a wallet exists.
//!
//! [`resolve_redirect`] is pure: analytics that accompany a redirect are
//! returned as [`Effect`]s and only run when the caller hands the
//! [`Redirect`] to an [`AnalyticsSink`].

use serde::Serialize;
use std::collections::BTreeMap;

/// Prefix of in-app routes that may receive the new wallet.
pub const APPS_PATH: &str = "/apps";
/// Dashboard of a single wallet.
pub const HOME_PATH: &str = "/home";
/// Query key carrying `<prefix>:<address>`.
pub const SAFE_QUERY_KEY: &str = "safe";

/// Redirect hint as received from a query string, which may repeat keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectHint {
	Single(String),
	Many(Vec<String>),
}

impl RedirectHint {
	/// The hint that counts: the value itself, or the first of many.
	pub fn first(&self) -> Option<&str> {
		match self {
			RedirectHint::Single(hint) => Some(hint),
			RedirectHint::Many(hints) => hints.first().map(String::as_str),
		}
	}
}

impl From<String> for RedirectHint {
	fn from(hint: String) -> Self {
		RedirectHint::Single(hint)
	}
}

impl From<&str> for RedirectHint {
	fn from(hint: &str) -> Self {
		RedirectHint::Single(hint.to_string())
	}
}

impl From<Vec<String>> for RedirectHint {
	fn from(hints: Vec<String>) -> Self {
		RedirectHint::Many(hints)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigationTarget {
	/// Application root.
	Root,
	/// Structured route, query encoded by the router.
	Route {
		pathname: String,
		query: BTreeMap<String, String>,
	},
	/// Literal URL, query already appended.
	Url { href: String },
}

impl NavigationTarget {
	/// Renders the target as a path with query string.
	pub fn href(&self) -> String {
		match self {
			NavigationTarget::Root => "/".to_string(),
			NavigationTarget::Route { pathname, query } => {
				if query.is_empty() {
					return pathname.clone();
				}
				let query = query
					.iter()
					.map(|(k, v)| format!("{}={}", k, v))
					.collect::<Vec<_>>()
					.join("&");
				format!("{}?{}", pathname, query)
			},
			NavigationTarget::Url { href } => href.clone(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalyticsEvent {
	SharedAppOpenAfterSafeCreation,
}

impl AnalyticsEvent {
	pub fn category(&self) -> &'static str {
		match self {
			AnalyticsEvent::SharedAppOpenAfterSafeCreation => "safe-apps",
		}
	}

	pub fn action(&self) -> &'static str {
		match self {
			AnalyticsEvent::SharedAppOpenAfterSafeCreation => "Open shared app after Safe creation",
		}
	}
}

/// Side effect requested by a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
	Track(AnalyticsEvent),
}

/// Receives analytics events.
pub trait AnalyticsSink {
	fn track(&self, event: AnalyticsEvent);
}

/// Sink that records events as structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
	fn track(&self, event: AnalyticsEvent) {
		tracing::info!(
			category = event.category(),
			action = event.action(),
			"Analytics event"
		);
	}
}

/// Navigation target plus the effects to run alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
	pub target: NavigationTarget,
	pub effects: Vec<Effect>,
}

impl Redirect {
	/// Runs the effects and returns the target.
	pub fn perform(self, sink: &dyn AnalyticsSink) -> NavigationTarget {
		for effect in &self.effects {
			match effect {
				Effect::Track(event) => sink.track(*event),
			}
		}
		self.target
	}
}

/// Computes where to go after creating the wallet at `address`.
///
/// Hints outside the apps section are ignored in favour of the wallet
/// dashboard. An apps hint gets the wallet appended to its query and a
/// tracking effect.
pub fn resolve_redirect(
	chain_prefix: &str,
	address: &str,
	redirect_hint: Option<&RedirectHint>,
) -> Redirect {
	if chain_prefix.is_empty() {
		return Redirect {
			target: NavigationTarget::Root,
			effects: Vec::new(),
		};
	}

	let safe = format!("{}:{}", chain_prefix, address);

	match redirect_hint.and_then(RedirectHint::first) {
		Some(hint) if hint.starts_with(APPS_PATH) => {
			let separator = if hint.contains('?') { '&' } else { '?' };
			Redirect {
				target: NavigationTarget::Url {
					href: format!("{}{}{}={}", hint, separator, SAFE_QUERY_KEY, safe),
				},
				effects: vec![Effect::Track(AnalyticsEvent::SharedAppOpenAfterSafeCreation)],
			}
		},
		_ => Redirect {
			target: NavigationTarget::Route {
				pathname: HOME_PATH.to_string(),
				query: BTreeMap::from([(SAFE_QUERY_KEY.to_string(), safe)]),
			},
			effects: Vec::new(),
		},
	}
}
