//! Which panel has focus.

use std::sync::Arc;

use tokio::sync::watch;

use crate::record::PanelId;

/// Shared focus source handed to every panel of one workbench.
#[derive(Debug, Clone)]
pub struct FocusTracker {
	tx: Arc<watch::Sender<Option<PanelId>>>,
}

impl Default for FocusTracker {
	fn default() -> Self {
		Self::new()
	}
}

impl FocusTracker {
	/// Creates a tracker with nothing focused.
	pub fn new() -> Self {
		let (tx, _) = watch::channel(None);
		Self { tx: Arc::new(tx) }
	}

	/// Moves focus to `id`.
	pub fn focus(&self, id: PanelId) {
		self.tx.send_if_modified(|focused| {
			if focused.as_ref() == Some(&id) {
				return false;
			}
			tracing::debug!(panel = %id, "focus changed");
			*focused = Some(id);
			true
		});
	}

	/// Clears focus if `id` holds it.
	pub fn blur(&self, id: &PanelId) {
		self.tx.send_if_modified(|focused| {
			if focused.as_ref() != Some(id) {
				return false;
			}
			*focused = None;
			true
		});
	}

	/// Clears focus.
	pub fn clear(&self) {
		self.tx.send_if_modified(|focused| focused.take().is_some());
	}

	/// Currently focused panel.
	pub fn current(&self) -> Option<PanelId> {
		self.tx.borrow().clone()
	}

	/// Observes focus changes.
	pub fn subscribe(&self) -> watch::Receiver<Option<PanelId>> {
		self.tx.subscribe()
	}
}
