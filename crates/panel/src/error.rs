//! Panel error types.

use stepdeck_bus::TransportError;
use stepdeck_wire::StateChannel;
use thiserror::Error;

/// A command or request that could not be handed to the transport.
#[derive(Debug, Error)]
pub enum DispatchError {
	/// The transport refused an outbound command.
	#[error("failed to send {channel}: {source}")]
	Send {
		/// Destination topic.
		channel: String,
		/// Transport failure.
		#[source]
		source: TransportError,
	},
	/// A request failed or timed out.
	#[error("request to {channel} failed: {source}")]
	Request {
		/// Request topic.
		channel: String,
		/// Transport failure.
		#[source]
		source: TransportError,
	},
	/// The panel was disposed before the request completed.
	#[error("panel disposed")]
	Disposed,
}

/// An edit value rejected before it reached the remote store.
#[derive(Debug, Error)]
pub enum EditError {
	/// The value cannot be represented in the column's cell type.
	#[error("invalid value for {key}: expected {expected}, got {value}")]
	InvalidValue {
		/// Column key.
		key: String,
		/// Expected cell type.
		expected: &'static str,
		/// Offending value.
		value: String,
	},
	/// The update could not be dispatched.
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
}

/// A save that was abandoned.
#[derive(Debug, Error)]
pub enum SaveError {
	/// No file is bound to the panel.
	#[error("no file bound to panel")]
	MissingBoundFile,
	/// The panel has no protocol to save yet.
	#[error("panel is not bound to a protocol")]
	Unbound,
	/// The protocol could not be fetched.
	#[error("failed to fetch protocol: {0}")]
	Fetch(#[source] DispatchError),
	/// The fetched protocol could not be encoded.
	#[error("failed to encode protocol: {0}")]
	Encode(#[source] serde_json::Error),
	/// The bound file rejected the write.
	#[error("failed to write protocol file: {0}")]
	Write(#[source] std::io::Error),
}

/// Failures surfaced by [`PanelInstance`](crate::PanelInstance).
#[derive(Debug, Error)]
pub enum PanelError {
	/// A state channel subscription was refused.
	#[error("failed to subscribe to {channel}: {source}")]
	Subscribe {
		/// Channel being subscribed.
		channel: StateChannel,
		/// Transport failure.
		#[source]
		source: TransportError,
	},
	/// The `new-protocol` response did not carry a protocol skeleton.
	#[error("unexpected new-protocol response: {0}")]
	NewProtocol(#[source] serde_json::Error),
	/// Dispatch failure.
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	/// Edit failure.
	#[error(transparent)]
	Edit(#[from] EditError),
	/// Save failure.
	#[error(transparent)]
	Save(#[from] SaveError),
}
