//! In-process broker.
//!
//! [`LocalBroker`] routes state messages to subscribers by exact topic,
//! retains the last message per topic and replays it to late subscribers,
//! records every outbound command, and answers requests through registered
//! [`Responder`]s. It never interprets commands itself.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use stepdeck_wire::{Command, Request, StateChannel};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{Result, TransportError};
use crate::ready_gate::ReadyGate;
use crate::transport::{Inbound, SubscriptionId, SubscriptionIds, Transport};

/// Request handler keyed by request channel.
pub type Responder = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

struct Subscriber {
	topic: String,
	sink: mpsc::Sender<Inbound>,
}

#[derive(Default)]
struct BrokerState {
	closed: bool,
	subscribers: BTreeMap<SubscriptionId, Subscriber>,
	retained: HashMap<String, String>,
	published: Vec<Command>,
	requests: Vec<Request>,
	responders: HashMap<String, Responder>,
}

/// In-process pub/sub broker implementing [`Transport`].
pub struct LocalBroker {
	state: Mutex<BrokerState>,
	ids: SubscriptionIds,
	ready: ReadyGate,
}

impl Default for LocalBroker {
	fn default() -> Self {
		Self::new()
	}
}

impl LocalBroker {
	/// Creates a broker whose ready gate is already open.
	pub fn new() -> Self {
		Self::with_gate(ReadyGate::opened())
	}

	/// Creates a broker whose ready gate opens only on [`ReadyGate::open`].
	pub fn pending() -> Self {
		Self::with_gate(ReadyGate::new())
	}

	fn with_gate(ready: ReadyGate) -> Self {
		Self {
			state: Mutex::new(BrokerState::default()),
			ids: SubscriptionIds::new(),
			ready,
		}
	}

	/// Publishes a raw state message, retaining it for late subscribers.
	///
	/// Returns the number of subscribers the message was delivered to.
	pub fn publish_state(&self, topic: &str, payload: impl Into<String>) -> usize {
		let payload = payload.into();
		let mut state = self.state.lock();
		state.retained.insert(topic.to_string(), payload.clone());

		let mut delivered = 0;
		let mut gone = Vec::new();
		for (id, subscriber) in state.subscribers.iter().filter(|(_, s)| s.topic == topic) {
			let msg = Inbound {
				topic: topic.to_string(),
				payload: payload.clone(),
			};
			match subscriber.sink.try_send(msg) {
				Ok(()) => delivered += 1,
				Err(TrySendError::Full(_)) => {
					tracing::warn!(%topic, subscription = id.0, "subscriber queue full, dropping state message");
				}
				Err(TrySendError::Closed(_)) => gone.push(*id),
			}
		}
		for id in gone {
			state.subscribers.remove(&id);
		}
		delivered
	}

	/// Publishes a JSON state value on a known channel.
	pub fn publish_json(&self, channel: StateChannel, value: &Value) -> usize {
		self.publish_state(&channel.topic(), value.to_string())
	}

	/// Registers the handler answering requests on `channel`.
	pub fn respond(&self, channel: impl Into<String>, responder: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static) {
		self.state.lock().responders.insert(channel.into(), Arc::new(responder));
	}

	/// Returns and clears the outbound command log.
	pub fn take_published(&self) -> Vec<Command> {
		std::mem::take(&mut self.state.lock().published)
	}

	/// Returns a copy of the outbound command log.
	pub fn published(&self) -> Vec<Command> {
		self.state.lock().published.clone()
	}

	/// Returns a copy of the request log.
	pub fn requests(&self) -> Vec<Request> {
		self.state.lock().requests.clone()
	}

	/// Number of live subscriptions on `topic`.
	pub fn subscriber_count(&self, topic: &str) -> usize {
		self.state.lock().subscribers.values().filter(|s| s.topic == topic).count()
	}

	/// Closes the broker; later publishes and requests fail with [`TransportError::Closed`].
	pub fn close(&self) {
		let mut state = self.state.lock();
		state.closed = true;
		state.subscribers.clear();
	}
}

#[async_trait]
impl Transport for LocalBroker {
	fn subscribe(&self, topic: &str, sink: mpsc::Sender<Inbound>) -> Result<SubscriptionId> {
		let mut state = self.state.lock();
		if state.closed {
			return Err(TransportError::Closed);
		}
		let id = self.ids.next();
		if let Some(payload) = state.retained.get(topic) {
			let replay = Inbound {
				topic: topic.to_string(),
				payload: payload.clone(),
			};
			if sink.try_send(replay).is_err() {
				tracing::warn!(%topic, subscription = id.0, "could not replay retained state");
			}
		}
		state.subscribers.insert(
			id,
			Subscriber {
				topic: topic.to_string(),
				sink,
			},
		);
		Ok(id)
	}

	fn unsubscribe(&self, id: SubscriptionId) {
		self.state.lock().subscribers.remove(&id);
	}

	fn publish(&self, command: Command) -> Result<()> {
		let mut state = self.state.lock();
		if state.closed {
			return Err(TransportError::Closed);
		}
		tracing::trace!(channel = %command.channel, kind = ?command.kind, "broker.publish");
		state.published.push(command);
		Ok(())
	}

	async fn request(&self, request: Request) -> Result<Value> {
		let responder = {
			let mut state = self.state.lock();
			if state.closed {
				return Err(TransportError::Closed);
			}
			state.requests.push(request.clone());
			state.responders.get(&request.channel).cloned()
		};
		let Some(responder) = responder else {
			return Err(TransportError::NoResponder { channel: request.channel });
		};
		responder(&request.payload)
	}

	fn ready(&self) -> &ReadyGate {
		&self.ready
	}
}
