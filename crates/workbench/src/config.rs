//! Workbench settings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stepdeck_panel::PanelConfig;

use crate::error::ConfigError;

/// Host-level settings, usually read from a TOML file.
///
/// ```toml
/// namespace = "stepdeck"
/// menu_label = "Protocols"
///
/// [panel]
/// request_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkbenchConfig {
	/// Prefix of every registered command id.
	pub namespace: String,
	/// Label of the protocol menu.
	pub menu_label: String,
	/// Label of the command that opens a panel on a new protocol.
	pub new_protocol_label: String,
	/// Settings applied to every panel.
	pub panel: PanelConfig,
}

impl Default for WorkbenchConfig {
	fn default() -> Self {
		Self {
			namespace: "stepdeck".into(),
			menu_label: "Protocols".into(),
			new_protocol_label: "New Protocol".into(),
			panel: PanelConfig::default(),
		}
	}
}

impl WorkbenchConfig {
	/// Parses settings from TOML text. Missing keys take their defaults.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// Reads and parses a settings file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}
}
