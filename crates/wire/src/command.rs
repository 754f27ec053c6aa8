//! Outbound command and request shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::channel::{Action, RequestKind, StateChannel};

/// Kind of outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
	/// Absolute state set; repeating it has no further effect.
	Put,
	/// Action request whose effect is only observed through later republication.
	Trigger,
}

/// One outbound message. Commands are never acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
	/// Put or trigger.
	pub kind: CommandKind,
	/// Destination topic.
	pub channel: String,
	/// JSON body.
	pub payload: Value,
}

impl Command {
	/// Builds a put against a state channel.
	pub fn put(channel: StateChannel, payload: Value) -> Self {
		Self {
			kind: CommandKind::Put,
			channel: channel.put_topic(),
			payload,
		}
	}

	/// Builds a trigger for an action.
	pub fn trigger(action: Action, payload: Value) -> Self {
		Self {
			kind: CommandKind::Trigger,
			channel: action.topic(),
			payload,
		}
	}

	/// `step-model/put-step-number {stepNumber}`.
	pub fn step_number(step_number: usize) -> Self {
		Self::put(StateChannel::StepNumber, json!({ "stepNumber": step_number }))
	}

	/// `step-model/insert-step {stepNumber}`; the new step lands after `step_number`.
	pub fn insert_step(step_number: usize) -> Self {
		Self::trigger(Action::InsertStep, json!({ "stepNumber": step_number }))
	}

	/// `step-model/delete-step {stepNumber}`.
	pub fn delete_step(step_number: usize) -> Self {
		Self::trigger(Action::DeleteStep, json!({ "stepNumber": step_number }))
	}

	/// `step-model/update-step {key, val, stepNumber}`.
	pub fn update_step(step_number: usize, key: &str, val: Value) -> Self {
		Self::trigger(Action::UpdateStep, json!({ "key": key, "val": val, "stepNumber": step_number }))
	}

	/// `protocol-model/change-protocol {name}`.
	pub fn change_protocol(name: &str) -> Self {
		Self::trigger(Action::ChangeProtocol, json!({ "name": name }))
	}

	/// Returns true for put commands.
	pub fn is_put(&self) -> bool {
		self.kind == CommandKind::Put
	}
}

/// Request awaiting a single response from the protocol service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Destination topic.
	pub channel: String,
	/// JSON body.
	pub payload: Value,
}

impl Request {
	/// Builds a request of the given kind.
	pub fn new(kind: RequestKind, payload: Value) -> Self {
		Self {
			channel: kind.topic(),
			payload,
		}
	}

	/// `protocol-model/new-protocol {}`.
	pub fn new_protocol() -> Self {
		Self::new(RequestKind::NewProtocol, json!({}))
	}

	/// `protocol-model/get-protocol-by-name {name}`.
	pub fn protocol_by_name(name: &str) -> Self {
		Self::new(RequestKind::GetProtocolByName, json!({ "name": name }))
	}
}
