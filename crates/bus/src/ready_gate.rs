//! Transport readiness gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Gate that holds callers back until the transport is connected.
///
/// Once opened it stays open.
#[derive(Debug, Clone, Default)]
pub struct ReadyGate {
	/// Set once the transport has connected.
	open: Arc<AtomicBool>,
	/// Wakes waiters when the gate opens.
	notify: Arc<Notify>,
}

impl ReadyGate {
	/// Creates a closed gate.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a gate that is already open.
	pub fn opened() -> Self {
		let gate = Self::default();
		gate.open();
		gate
	}

	/// Opens the gate and releases every waiter.
	pub fn open(&self) {
		if !self.open.swap(true, Ordering::SeqCst) {
			tracing::debug!("transport ready");
		}
		self.notify.notify_waiters();
	}

	/// Returns true once the gate is open.
	pub fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}

	/// Waits until the gate is open.
	pub async fn wait(&self) {
		loop {
			// Register interest before checking the flag to avoid a lost wakeup.
			let notified = self.notify.notified();

			if self.is_open() {
				return;
			}

			notified.await;
		}
	}
}
