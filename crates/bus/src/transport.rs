//! The transport trait and its message types.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use stepdeck_wire::{Command, Request};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::ready_gate::ReadyGate;

/// One inbound state message, still in its raw text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
	/// State topic the message was published on.
	pub topic: String,
	/// Raw JSON text.
	pub payload: String,
}

/// Identifier of one registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Monotonic subscription id source.
#[derive(Debug, Default)]
pub struct SubscriptionIds {
	next: AtomicU64,
}

impl SubscriptionIds {
	/// Creates a source starting at 0.
	pub const fn new() -> Self {
		Self { next: AtomicU64::new(0) }
	}

	/// Returns the next unique id.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&self) -> SubscriptionId {
		SubscriptionId(self.next.fetch_add(1, Ordering::Relaxed))
	}
}

/// Pub/sub client surface consumed by panels.
///
/// Every message delivered to a sink preserves the publication order of its
/// topic. No ordering holds across topics.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Routes every message published on `topic` into `sink`.
	fn subscribe(&self, topic: &str, sink: mpsc::Sender<Inbound>) -> Result<SubscriptionId>;

	/// Removes a subscription. Unknown ids are ignored.
	fn unsubscribe(&self, id: SubscriptionId);

	/// Sends a command without waiting for any acknowledgment.
	fn publish(&self, command: Command) -> Result<()>;

	/// Sends a request and waits for its single response.
	async fn request(&self, request: Request) -> Result<Value>;

	/// Gate that opens once the transport can carry commands.
	fn ready(&self) -> &ReadyGate;
}
