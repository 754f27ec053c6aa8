//! Protocol menu.
//!
//! Every protocol published on `protocol-model/protocol-skeletons` gets one
//! launch command, registered once, and the protocol menu is rebuilt from the
//! current list on every publication.

use stepdeck_wire::{PayloadError, StateChannel, StateUpdate, decode};

use crate::config::WorkbenchConfig;

/// Command that opens a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
	/// Namespaced command id.
	pub id: String,
	/// Menu label.
	pub label: String,
	/// Protocol to open, or `None` for a new protocol.
	pub protocol: Option<String>,
}

/// Host command and menu surface.
pub trait CommandRegistry: Send {
	/// Returns true when `id` is registered.
	fn has_command(&self, id: &str) -> bool;

	/// Registers a command.
	fn add_command(&mut self, command: LaunchCommand);

	/// Replaces the menu `label` with the commands `ids`, in order.
	fn replace_menu(&mut self, label: &str, ids: &[String]);
}

/// Tracks known protocols and keeps the host menu in step with them.
#[derive(Debug, Clone)]
pub struct ProtocolCatalog {
	namespace: String,
	menu_label: String,
	new_protocol_label: String,
	protocols: Vec<String>,
}

impl ProtocolCatalog {
	/// Creates an empty catalog.
	pub fn new(config: &WorkbenchConfig) -> Self {
		Self {
			namespace: config.namespace.clone(),
			menu_label: config.menu_label.clone(),
			new_protocol_label: config.new_protocol_label.clone(),
			protocols: Vec::new(),
		}
	}

	/// Command id launching `protocol`.
	pub fn command_id(&self, protocol: &str) -> String {
		format!("{}:{protocol}", self.namespace)
	}

	/// Command id launching a panel on a new protocol.
	pub fn open_command_id(&self) -> String {
		format!("{}:open", self.namespace)
	}

	/// Known protocol names, in publication order.
	pub fn protocols(&self) -> &[String] {
		&self.protocols
	}

	/// Registers the new-protocol command unless it already exists.
	pub fn register_open(&self, registry: &mut dyn CommandRegistry) {
		let id = self.open_command_id();
		if registry.has_command(&id) {
			return;
		}
		registry.add_command(LaunchCommand {
			id,
			label: self.new_protocol_label.clone(),
			protocol: None,
		});
	}

	/// Applies a raw skeleton list. Returns how many commands were added.
	///
	/// A malformed payload leaves the catalog and the menu untouched.
	pub fn apply_skeletons(&mut self, payload: &str, registry: &mut dyn CommandRegistry) -> Result<usize, PayloadError> {
		let StateUpdate::Protocols(skeletons) = decode(StateChannel::ProtocolSkeletons, payload)? else {
			return Ok(0);
		};

		let mut added = 0;
		let mut ids = Vec::with_capacity(skeletons.len());
		for skeleton in &skeletons {
			let id = self.command_id(&skeleton.name);
			if !registry.has_command(&id) {
				registry.add_command(LaunchCommand {
					id: id.clone(),
					label: skeleton.name.clone(),
					protocol: Some(skeleton.name.clone()),
				});
				added += 1;
			}
			ids.push(id);
		}
		registry.replace_menu(&self.menu_label, &ids);

		self.protocols = skeletons.into_iter().map(|skeleton| skeleton.name).collect();
		tracing::debug!(protocols = self.protocols.len(), added, "protocol menu rebuilt");
		Ok(added)
	}
}
