//! Inbound state installation.
//!
//! [`StateMirror`] owns a panel's [`ProtocolState`] and is the only writer to
//! it. Every subscribed channel feeds one bounded queue, so messages keep
//! their per-channel publication order while arriving in no particular order
//! across channels.

use std::sync::Arc;

use stepdeck_bus::{Inbound, SubscriptionId, Transport};
use stepdeck_wire::{PayloadError, StateChannel, StateUpdate, decode};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error::PanelError;
use crate::state::{LoadPhase, ProtocolState};

/// Outcome of one inbound state message.
#[derive(Debug)]
pub enum Applied {
	/// The payload decoded and was installed.
	Installed {
		/// Channel the payload arrived on.
		channel: StateChannel,
		/// Whether the installed value differs from the previous one.
		changed: bool,
	},
	/// The payload was malformed; the previous value is kept.
	Rejected(PayloadError),
	/// The topic is not one this mirror tracks.
	Ignored,
	/// The mirror was disposed.
	Dropped,
}

impl Applied {
	/// Returns true when the snapshot changed.
	pub fn changed(&self) -> bool {
		matches!(self, Self::Installed { changed: true, .. })
	}
}

/// Local mirror of the remote protocol store.
pub struct StateMirror {
	state: ProtocolState,
	subscriptions: Vec<SubscriptionId>,
	transport: Arc<dyn Transport>,
	phase_tx: watch::Sender<LoadPhase>,
	lifecycle: CancellationToken,
}

impl StateMirror {
	/// Creates an empty mirror for a panel bound to `bound_protocol`.
	pub fn new(transport: Arc<dyn Transport>, bound_protocol: Option<String>, lifecycle: CancellationToken) -> Self {
		let (phase_tx, _) = watch::channel(LoadPhase::Empty);
		Self {
			state: ProtocolState::new(bound_protocol),
			subscriptions: Vec::new(),
			transport,
			phase_tx,
			lifecycle,
		}
	}

	/// Routes every message on `channel` into `sink`.
	pub fn subscribe(&mut self, channel: StateChannel, sink: mpsc::Sender<Inbound>) -> Result<(), PanelError> {
		if self.is_disposed() {
			return Ok(());
		}
		let id = self
			.transport
			.subscribe(&channel.topic(), sink)
			.map_err(|source| PanelError::Subscribe { channel, source })?;
		self.subscriptions.push(id);
		Ok(())
	}

	/// Subscribes every channel a panel mirrors.
	pub fn subscribe_panel_channels(&mut self, sink: &mpsc::Sender<Inbound>) -> Result<(), PanelError> {
		for channel in StateChannel::PANEL {
			self.subscribe(channel, sink.clone())?;
		}
		Ok(())
	}

	/// Decodes and installs one raw state message.
	pub fn apply_state_message(&mut self, topic: &str, payload: &str) -> Applied {
		if self.is_disposed() {
			return Applied::Dropped;
		}
		let Some(channel) = StateChannel::from_topic(topic).filter(|channel| StateChannel::PANEL.contains(channel)) else {
			tracing::trace!(%topic, "ignoring untracked state topic");
			return Applied::Ignored;
		};
		let update = match decode(channel, payload) {
			Ok(update) => update,
			Err(error) => {
				tracing::warn!(channel = %channel, %error, "malformed state payload, keeping previous value");
				return Applied::Rejected(error);
			}
		};

		let before = self.state.phase();
		let changed = match update {
			StateUpdate::ActiveProtocol(name) => self.state.set_active_protocol(name),
			StateUpdate::Steps(steps) => self.state.set_steps(steps),
			StateUpdate::StepNumber(index) => self.state.set_current_step_index(index),
			StateUpdate::Schema(schema) => self.state.set_schema(schema),
			StateUpdate::Protocols(_) => false,
		};
		let after = self.state.phase();
		if before != after {
			tracing::debug!(channel = %channel, from = ?before, to = ?after, "load phase changed");
			self.phase_tx.send_replace(after);
		}
		Applied::Installed { channel, changed }
	}

	/// Returns true once schema, steps and step number are all present.
	pub fn is_ready(&self) -> bool {
		self.state.is_ready()
	}

	/// Current load phase.
	pub fn phase(&self) -> LoadPhase {
		self.state.phase()
	}

	/// Observes load phase transitions.
	pub fn watch_phase(&self) -> watch::Receiver<LoadPhase> {
		self.phase_tx.subscribe()
	}

	/// Read-only snapshot.
	pub fn state(&self) -> &ProtocolState {
		&self.state
	}

	/// Binds the panel to `name`. Returns true when the binding changed.
	pub fn bind(&mut self, name: String) -> bool {
		if self.is_disposed() {
			return false;
		}
		self.state.bind(name)
	}

	/// Unsubscribes every channel. Later calls do nothing.
	pub fn dispose(&mut self) {
		for id in self.subscriptions.drain(..) {
			self.transport.unsubscribe(id);
		}
		self.lifecycle.cancel();
	}

	/// Returns true after [`dispose`](Self::dispose).
	pub fn is_disposed(&self) -> bool {
		self.lifecycle.is_cancelled()
	}
}
