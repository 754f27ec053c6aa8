//! Per-panel settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default capacity of a panel's inbound state queue.
const DEFAULT_INBOUND_CAPACITY: usize = 256;
/// Default budget for request/response exchanges.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Settings applied to every panel instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
	/// Capacity of the single-consumer inbound queue shared by all state channels.
	pub inbound_capacity: usize,
	/// Budget for `new-protocol` and `get-protocol-by-name` requests, in milliseconds.
	pub request_timeout_ms: u64,
}

impl Default for PanelConfig {
	fn default() -> Self {
		Self {
			inbound_capacity: DEFAULT_INBOUND_CAPACITY,
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
		}
	}
}

impl PanelConfig {
	/// Inbound queue capacity, never zero.
	pub fn inbound_capacity(&self) -> usize {
		self.inbound_capacity.max(1)
	}

	/// Request budget as a [`Duration`].
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}
