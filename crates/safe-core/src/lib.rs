//! Core wallet creation logic for the Safe launcher.
//!
//! This crate ties the collaborators together: the [`CreationOrchestrator`]
//! encodes, estimates, deploys and relays wallet creations, the
//! [`DeploymentPoller`] waits for the gateway to index the result, and
//! [`resolve_redirect`] decides where the user lands afterwards.

pub mod creation;
pub mod poller;
pub mod redirect;

pub use creation::{CreationError, CreationOrchestrator, CreationOutcome};
pub use poller::{DeploymentPoller, PollError, PollPolicy};
pub use redirect::{
	resolve_redirect, AnalyticsEvent, AnalyticsSink, Effect, NavigationTarget, Redirect,
	RedirectHint, TracingAnalytics,
};
