//! Panel identity and restoration tuple.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned panel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
	/// Wraps a host-provided identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4().to_string())
	}

	/// Returns the identifier text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PanelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Everything needed to recreate a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRecord {
	/// Panel identifier.
	pub id: PanelId,
	/// Protocol the panel is bound to.
	#[serde(rename = "protocolName", default, skip_serializing_if = "Option::is_none")]
	pub bound_protocol: Option<String>,
}
