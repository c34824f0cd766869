//! Safe protocol versions understood by the launcher.
//!
//! Only versions with a known contract layout can be used to create a wallet.
//! Anything else is rejected when parsed, before any network call is made.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a version string is not in the allowlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid Safe version: {0}")]
pub struct InvalidVersion(pub String);

/// Released Safe singleton versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafeVersion {
	V1_0_0,
	V1_1_1,
	V1_2_0,
	V1_3_0,
	V1_4_1,
}

impl SafeVersion {
	/// Version used when neither the caller nor the chain picks one.
	pub const LATEST: SafeVersion = SafeVersion::V1_4_1;

	/// Every supported version, oldest first.
	pub const ALL: [SafeVersion; 5] = [
		SafeVersion::V1_0_0,
		SafeVersion::V1_1_1,
		SafeVersion::V1_2_0,
		SafeVersion::V1_3_0,
		SafeVersion::V1_4_1,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			SafeVersion::V1_0_0 => "1.0.0",
			SafeVersion::V1_1_1 => "1.1.1",
			SafeVersion::V1_2_0 => "1.2.0",
			SafeVersion::V1_3_0 => "1.3.0",
			SafeVersion::V1_4_1 => "1.4.1",
		}
	}

	/// Whether `setup` takes a fallback handler argument.
	///
	/// The 1.0.0 singleton predates fallback handlers.
	pub fn has_fallback_handler(&self) -> bool {
		*self >= SafeVersion::V1_1_1
	}
}

impl fmt::Display for SafeVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SafeVersion {
	type Err = InvalidVersion;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// The gateway reports L2 singletons as e.g. "1.3.0+L2"
		let base = s.trim().split('+').next().unwrap_or_default();
		SafeVersion::ALL
			.into_iter()
			.find(|v| v.as_str() == base)
			.ok_or_else(|| InvalidVersion(s.to_string()))
	}
}

impl Serialize for SafeVersion {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for SafeVersion {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}
