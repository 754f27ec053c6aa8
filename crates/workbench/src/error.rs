//! Workbench and configuration errors.

use std::path::PathBuf;

use stepdeck_bus::TransportError;
use stepdeck_panel::{PanelError, PanelId};
use thiserror::Error;

/// Errors that can occur when loading workbench configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or fields.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

/// Errors surfaced by the [`Workbench`](crate::Workbench).
#[derive(Debug, Error)]
pub enum WorkbenchError {
	/// A panel failed to open or bootstrap.
	#[error(transparent)]
	Panel(#[from] PanelError),

	/// A panel with this id is already open.
	#[error("panel {0} is already open")]
	Duplicate(PanelId),

	/// No open panel has this id.
	#[error("no open panel {0}")]
	UnknownPanel(PanelId),

	/// The panel's event loop has stopped.
	#[error("panel {0} is closed")]
	Closed(PanelId),

	/// The protocol catalog could not subscribe.
	#[error("failed to subscribe protocol catalog: {0}")]
	Catalog(#[source] TransportError),
}

/// Result type for workbench operations.
pub type Result<T, E = WorkbenchError> = std::result::Result<T, E>;
