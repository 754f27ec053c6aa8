//! State payload decoding.
//!
//! Step and schema payloads arrive as arrays of partial fragments. Each
//! fragment is merged left-to-right into one record: later keys overwrite
//! earlier ones but keep the position of their first appearance.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::channel::StateChannel;
use crate::error::{PayloadError, Result};
use crate::schema::{STEP_FIELD, Schema};

/// One step row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
	ordinal: usize,
	fields: Map<String, Value>,
}

impl Step {
	/// Creates a step at position `ordinal`.
	pub fn new(ordinal: usize, fields: Map<String, Value>) -> Self {
		Self { ordinal, fields }
	}

	/// Position of the step when it was received.
	pub const fn ordinal(&self) -> usize {
		self.ordinal
	}

	/// Merged step fields as received.
	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}

	/// Returns a field value; `step` always yields the ordinal.
	pub fn value(&self, key: &str) -> Value {
		if key == STEP_FIELD {
			return Value::from(self.ordinal);
		}
		self.fields.get(key).cloned().unwrap_or(Value::Null)
	}
}

/// Protocol identity as published on the skeleton channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSkeleton {
	/// Protocol name.
	pub name: String,
}

/// A decoded state payload.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
	/// Name of the globally active protocol.
	ActiveProtocol(String),
	/// Every known protocol.
	Protocols(Vec<ProtocolSkeleton>),
	/// Step rows.
	Steps(Vec<Step>),
	/// Current step index.
	StepNumber(usize),
	/// Step schema.
	Schema(Schema),
}

#[derive(Deserialize)]
struct StepNumberPayload {
	#[serde(rename = "stepNumber")]
	step_number: usize,
}

/// Decodes a raw payload received on `channel`.
pub fn decode(channel: StateChannel, raw: &str) -> Result<StateUpdate> {
	match channel {
		StateChannel::ProtocolSkeleton => {
			let skeleton: ProtocolSkeleton = parse_as(channel, raw)?;
			Ok(StateUpdate::ActiveProtocol(skeleton.name))
		}
		StateChannel::ProtocolSkeletons => Ok(StateUpdate::Protocols(parse_as(channel, raw)?)),
		StateChannel::Steps => decode_steps(raw).map(StateUpdate::Steps),
		StateChannel::StepNumber => {
			let payload: StepNumberPayload = parse_as(channel, raw)?;
			Ok(StateUpdate::StepNumber(payload.step_number))
		}
		StateChannel::Schema => decode_schema(raw).map(StateUpdate::Schema),
	}
}

/// Decodes a `step-model/steps` payload.
///
/// Each array element is one step, given either as an array of fragments, an
/// object whose values are fragments, or a flat record with no nested objects.
pub fn decode_steps(raw: &str) -> Result<Vec<Step>> {
	let channel = StateChannel::Steps;
	let Value::Array(items) = parse_as::<Value>(channel, raw)? else {
		return Err(PayloadError::Shape {
			channel,
			expected: "an array of steps",
		});
	};
	items
		.iter()
		.enumerate()
		.map(|(ordinal, container)| Ok(Step::new(ordinal, merge_fragments(channel, container)?)))
		.collect()
}

/// Decodes a `schema-model/schema` payload, an array or object of schema fragments.
pub fn decode_schema(raw: &str) -> Result<Schema> {
	let channel = StateChannel::Schema;
	let value = parse_as::<Value>(channel, raw)?;
	Ok(Schema::from_merged(&merge_fragments(channel, &value)?))
}

/// Merges the fragments held by `container` into one record.
pub fn merge_fragments(channel: StateChannel, container: &Value) -> Result<Map<String, Value>> {
	let fragments: Vec<&Value> = match container {
		Value::Array(items) => items.iter().collect(),
		Value::Object(map) if map.values().any(Value::is_object) => map.values().collect(),
		Value::Object(_) => vec![container],
		_ => {
			return Err(PayloadError::Shape {
				channel,
				expected: "an array or object of fragments",
			});
		}
	};

	let mut merged = Map::new();
	for fragment in fragments {
		match fragment {
			Value::Object(fields) => {
				for (key, value) in fields {
					merged.insert(key.clone(), value.clone());
				}
			}
			Value::Null => {}
			other => tracing::trace!(%channel, fragment = %other, "skipping non-object fragment"),
		}
	}
	Ok(merged)
}

fn parse_as<T: serde::de::DeserializeOwned>(channel: StateChannel, raw: &str) -> Result<T> {
	serde_json::from_str(raw).map_err(|source| PayloadError::Json { channel, source })
}
