//! Outbound commands.
//!
//! Commands are unacknowledged: a [`Dispatch::Sent`] only means the
//! transport accepted the message. The local snapshot is never touched here;
//! any effect shows up later as a republished state channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use stepdeck_bus::{Transport, TransportError};
use stepdeck_wire::{Action, Command, Request, StateChannel};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::state::LoadPhase;

/// Why a command was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
	/// The panel has not loaded schema, steps and step number yet.
	NotReady,
	/// The panel was disposed.
	Disposed,
	/// An identical put is still waiting for its republication.
	Coalesced,
	/// There are no steps to act on.
	Empty,
}

/// Result of a dispatch attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
	/// The transport accepted the command.
	Sent,
	/// Nothing was sent.
	Suppressed(Suppression),
}

impl Dispatch {
	/// Returns true when the command went out.
	pub fn is_sent(self) -> bool {
		self == Self::Sent
	}
}

/// Sends puts, triggers and requests on behalf of one panel.
pub struct CommandDispatcher {
	transport: Arc<dyn Transport>,
	phase: watch::Receiver<LoadPhase>,
	lifecycle: CancellationToken,
	in_flight_puts: HashMap<String, Value>,
	request_timeout: Duration,
}

impl CommandDispatcher {
	/// Creates a dispatcher gated on `phase` and stopped by `lifecycle`.
	pub fn new(
		transport: Arc<dyn Transport>,
		phase: watch::Receiver<LoadPhase>,
		lifecycle: CancellationToken,
		request_timeout: Duration,
	) -> Self {
		Self {
			transport,
			phase,
			lifecycle,
			in_flight_puts: HashMap::new(),
			request_timeout,
		}
	}

	/// Sets a state channel to an absolute value.
	pub fn put(&mut self, channel: StateChannel, value: Value) -> Result<Dispatch, DispatchError> {
		self.send(Command::put(channel, value))
	}

	/// Fires an action.
	pub fn trigger(&mut self, action: Action, payload: Value) -> Result<Dispatch, DispatchError> {
		self.send(Command::trigger(action, payload))
	}

	/// Fires an action that is allowed before the panel is ready.
	pub fn trigger_ungated(&mut self, action: Action, payload: Value) -> Result<Dispatch, DispatchError> {
		self.send_ungated(Command::trigger(action, payload))
	}

	/// Sends a command once the panel is ready.
	pub fn send(&mut self, command: Command) -> Result<Dispatch, DispatchError> {
		if !self.lifecycle.is_cancelled() && *self.phase.borrow() != LoadPhase::Ready {
			tracing::debug!(channel = %command.channel, "command suppressed before readiness");
			return Ok(Dispatch::Suppressed(Suppression::NotReady));
		}
		self.send_ungated(command)
	}

	/// Sends a command regardless of readiness.
	pub fn send_ungated(&mut self, command: Command) -> Result<Dispatch, DispatchError> {
		if self.lifecycle.is_cancelled() {
			tracing::debug!(channel = %command.channel, "command suppressed after dispose");
			return Ok(Dispatch::Suppressed(Suppression::Disposed));
		}
		if command.is_put() && self.in_flight_puts.get(&command.channel) == Some(&command.payload) {
			tracing::debug!(channel = %command.channel, "coalesced duplicate put");
			return Ok(Dispatch::Suppressed(Suppression::Coalesced));
		}

		let in_flight = command.is_put().then(|| (command.channel.clone(), command.payload.clone()));
		let channel = command.channel.clone();
		if let Err(source) = self.transport.publish(command) {
			tracing::warn!(%channel, error = %source, "failed to send command");
			return Err(DispatchError::Send { channel, source });
		}
		tracing::trace!(%channel, "command sent");
		if let Some((channel, payload)) = in_flight {
			self.in_flight_puts.insert(channel, payload);
		}
		Ok(Dispatch::Sent)
	}

	/// Sends a request and waits for its response within the configured budget.
	pub async fn request(&self, request: Request) -> Result<Value, DispatchError> {
		if self.lifecycle.is_cancelled() {
			return Err(DispatchError::Disposed);
		}
		let channel = request.channel.clone();
		let timeout = self.request_timeout;
		tokio::select! {
			() = self.lifecycle.cancelled() => Err(DispatchError::Disposed),
			result = tokio::time::timeout(timeout, self.transport.request(request)) => match result {
				Ok(Ok(value)) => Ok(value),
				Ok(Err(source)) => Err(DispatchError::Request { channel, source }),
				Err(_) => {
					let source = TransportError::Timeout { channel: channel.clone(), timeout };
					Err(DispatchError::Request { channel, source })
				}
			},
		}
	}

	/// Records a republication of `channel`, releasing its coalesced put.
	pub fn observe(&mut self, channel: StateChannel) {
		self.in_flight_puts.remove(&channel.put_topic());
	}

	/// Returns true once the panel is ready.
	pub fn is_ready(&self) -> bool {
		*self.phase.borrow() == LoadPhase::Ready
	}

	/// Returns true after the owning panel was disposed.
	pub fn is_disposed(&self) -> bool {
		self.lifecycle.is_cancelled()
	}
}
