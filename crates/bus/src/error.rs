//! Transport errors.

use std::time::Duration;

use thiserror::Error;

/// Failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
	/// The connection to the remote store is closed.
	#[error("transport closed")]
	Closed,
	/// Nothing answers requests on the channel.
	#[error("no responder for {channel}")]
	NoResponder {
		/// Request channel.
		channel: String,
	},
	/// A request did not complete in time.
	#[error("request to {channel} timed out after {timeout:?}")]
	Timeout {
		/// Request channel.
		channel: String,
		/// Elapsed budget.
		timeout: Duration,
	},
	/// The remote side answered with an error.
	#[error("remote error on {channel}: {message}")]
	Remote {
		/// Request channel.
		channel: String,
		/// Remote error text.
		message: String,
	},
}

/// Result type for transport operations.
pub type Result<T, E = TransportError> = std::result::Result<T, E>;
