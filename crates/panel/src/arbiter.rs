//! Active-instance arbitration.
//!
//! Many panels may be open at once but the remote store has one active
//! protocol. Only the focused panel whose bound protocol differs from the
//! active one asks for a switch, and it asks once per observation.

use stepdeck_wire::Command;
use tokio::sync::watch;

use crate::dispatcher::{CommandDispatcher, Dispatch};
use crate::error::DispatchError;
use crate::record::PanelId;
use crate::state::ProtocolState;

/// Outcome of one arbitration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
	/// Another panel, or none, has focus.
	Unfocused,
	/// The panel has no protocol yet.
	Unbound,
	/// The bound protocol is already active.
	Synchronized,
	/// A switch for this observation was already sent.
	AlreadyRequested,
	/// A switch was attempted.
	Requested(Dispatch),
}

/// Decides when one panel requests a protocol switch.
pub struct ActiveInstanceArbiter {
	panel: PanelId,
	focus: watch::Receiver<Option<PanelId>>,
	last_request: Option<(String, Option<String>)>,
}

impl ActiveInstanceArbiter {
	/// Creates an arbiter for `panel` observing `focus`.
	pub fn new(panel: PanelId, focus: watch::Receiver<Option<PanelId>>) -> Self {
		Self {
			panel,
			focus,
			last_request: None,
		}
	}

	/// Returns true when this panel holds focus.
	pub fn has_focus(&self) -> bool {
		self.focus.borrow().as_ref() == Some(&self.panel)
	}

	/// Resolves on the next focus change. Returns false once the focus source is gone.
	pub async fn focus_changed(&mut self) -> bool {
		self.focus.changed().await.is_ok()
	}

	/// Runs one arbitration pass against the current snapshot.
	pub fn evaluate(&mut self, state: &ProtocolState, dispatcher: &mut CommandDispatcher) -> Result<Arbitration, DispatchError> {
		self.focus.mark_unchanged();
		if !self.has_focus() {
			self.last_request = None;
			return Ok(Arbitration::Unfocused);
		}
		let Some(bound) = state.bound_protocol() else {
			return Ok(Arbitration::Unbound);
		};
		let active = state.active_protocol();
		if active == Some(bound) {
			self.last_request = None;
			return Ok(Arbitration::Synchronized);
		}
		if self.last_request.as_ref().is_some_and(|(b, a)| b == bound && a.as_deref() == active) {
			return Ok(Arbitration::AlreadyRequested);
		}
		self.switch_to(bound, active, dispatcher).map(Arbitration::Requested)
	}

	/// Requests a switch to `bound` regardless of focus.
	pub fn switch_to(&mut self, bound: &str, active: Option<&str>, dispatcher: &mut CommandDispatcher) -> Result<Dispatch, DispatchError> {
		let dispatch = dispatcher.send_ungated(Command::change_protocol(bound))?;
		if dispatch.is_sent() {
			tracing::debug!(panel = %self.panel, protocol = %bound, ?active, "requested protocol switch");
			self.last_request = Some((bound.to_owned(), active.map(str::to_owned)));
		}
		Ok(dispatch)
	}
}
