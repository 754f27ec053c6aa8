//! Payload decoding errors.

use thiserror::Error;

use crate::channel::StateChannel;

/// A state payload that could not be installed.
#[derive(Debug, Error)]
pub enum PayloadError {
	/// The payload is not valid JSON or does not match the channel's record type.
	#[error("malformed payload on {channel}: {source}")]
	Json {
		/// Channel the payload arrived on.
		channel: StateChannel,
		/// The underlying decode error.
		#[source]
		source: serde_json::Error,
	},

	/// The payload is valid JSON with the wrong structure.
	#[error("malformed payload on {channel}: expected {expected}")]
	Shape {
		/// Channel the payload arrived on.
		channel: StateChannel,
		/// Human-readable description of the expected structure.
		expected: &'static str,
	},
}

impl PayloadError {
	/// Returns the channel the payload arrived on.
	pub fn channel(&self) -> StateChannel {
		match self {
			Self::Json { channel, .. } | Self::Shape { channel, .. } => *channel,
		}
	}
}

/// Result type for payload decoding.
pub type Result<T> = std::result::Result<T, PayloadError>;
