//! Channel taxonomy.
//!
//! State channels are addressed as `<domain>/<key>`, put commands as
//! `<domain>/put-<key>`, and triggers and requests as `<domain>/<action>`.

use std::fmt;

/// Domain owning step rows and the current step pointer.
pub const STEP_MODEL: &str = "step-model";
/// Domain owning the step schema.
pub const SCHEMA_MODEL: &str = "schema-model";
/// Domain owning protocol selection and the protocol list.
pub const PROTOCOL_MODEL: &str = "protocol-model";

/// Inbound broadcast state channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChannel {
	/// Skeleton of the globally active protocol (`{name}`).
	ProtocolSkeleton,
	/// Skeletons of every known protocol (`[{name}, ...]`).
	ProtocolSkeletons,
	/// Step rows of the active protocol.
	Steps,
	/// Index of the current step (`{stepNumber}`).
	StepNumber,
	/// Schema fragments describing step fields.
	Schema,
}

impl StateChannel {
	/// Channels mirrored by a single protocol panel.
	pub const PANEL: [Self; 4] = [Self::ProtocolSkeleton, Self::Steps, Self::StepNumber, Self::Schema];

	/// Returns the owning domain.
	pub const fn domain(self) -> &'static str {
		match self {
			Self::ProtocolSkeleton | Self::ProtocolSkeletons => PROTOCOL_MODEL,
			Self::Steps | Self::StepNumber => STEP_MODEL,
			Self::Schema => SCHEMA_MODEL,
		}
	}

	/// Returns the state key within the domain.
	pub const fn key(self) -> &'static str {
		match self {
			Self::ProtocolSkeleton => "protocol-skeleton",
			Self::ProtocolSkeletons => "protocol-skeletons",
			Self::Steps => "steps",
			Self::StepNumber => "step-number",
			Self::Schema => "schema",
		}
	}

	/// Returns the state topic, e.g. `step-model/steps`.
	pub fn topic(self) -> String {
		format!("{}/{}", self.domain(), self.key())
	}

	/// Returns the put topic, e.g. `step-model/put-step-number`.
	pub fn put_topic(self) -> String {
		format!("{}/put-{}", self.domain(), self.key())
	}

	/// Resolves a state topic back to its channel.
	pub fn from_topic(topic: &str) -> Option<Self> {
		let (domain, key) = topic.split_once('/')?;
		[Self::ProtocolSkeleton, Self::ProtocolSkeletons, Self::Steps, Self::StepNumber, Self::Schema]
			.into_iter()
			.find(|channel| channel.domain() == domain && channel.key() == key)
	}
}

impl fmt::Display for StateChannel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.domain(), self.key())
	}
}

/// Fire-and-forget actions interpreted by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	/// Insert a new step after `stepNumber`.
	InsertStep,
	/// Delete the step at `stepNumber`.
	DeleteStep,
	/// Set one field of the step at `stepNumber`.
	UpdateStep,
	/// Make the named protocol globally active.
	ChangeProtocol,
}

impl Action {
	/// Returns the owning domain.
	pub const fn domain(self) -> &'static str {
		match self {
			Self::InsertStep | Self::DeleteStep | Self::UpdateStep => STEP_MODEL,
			Self::ChangeProtocol => PROTOCOL_MODEL,
		}
	}

	/// Returns the action name.
	pub const fn name(self) -> &'static str {
		match self {
			Self::InsertStep => "insert-step",
			Self::DeleteStep => "delete-step",
			Self::UpdateStep => "update-step",
			Self::ChangeProtocol => "change-protocol",
		}
	}

	/// Returns the trigger topic, e.g. `step-model/insert-step`.
	pub fn topic(self) -> String {
		format!("{}/{}", self.domain(), self.name())
	}
}

/// Request/response exchanges with the protocol service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
	/// Create an empty protocol; responds with its skeleton.
	NewProtocol,
	/// Fetch the full serialized protocol by name.
	GetProtocolByName,
}

impl RequestKind {
	/// Returns the request name.
	pub const fn name(self) -> &'static str {
		match self {
			Self::NewProtocol => "new-protocol",
			Self::GetProtocolByName => "get-protocol-by-name",
		}
	}

	/// Returns the request topic.
	pub fn topic(self) -> String {
		format!("{PROTOCOL_MODEL}/{}", self.name())
	}
}
