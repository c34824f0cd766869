//! Registry trait for configuration-selected implementations.
//!
//! Collaborators such as the gateway and relay clients can have several
//! implementations. Each one exposes a `Registry` that names it for the
//! `primary = "..."` key of its configuration section and hands out a factory.

pub trait ImplementationRegistry {
	/// Name used in configuration, e.g. `"http"` for `[gateway.implementations.http]`.
	const NAME: &'static str;

	/// Factory function type, defined by the crate that owns the interface.
	type Factory;

	fn factory() -> Self::Factory;
}
