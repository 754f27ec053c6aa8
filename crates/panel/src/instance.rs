//! One open protocol panel.
//!
//! A [`PanelInstance`] wires a [`StateMirror`], a [`CommandDispatcher`] and an
//! [`ActiveInstanceArbiter`] to one inbound queue and drives them from a
//! single event loop ([`PanelInstance::run`]). Nothing else touches the
//! snapshot, so handlers never race each other.

use std::io;
use std::sync::Arc;

use serde_json::Value;
use stepdeck_bus::{Inbound, Transport};
use stepdeck_wire::{ProtocolSkeleton, Request, StateChannel};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::arbiter::{ActiveInstanceArbiter, Arbitration};
use crate::config::PanelConfig;
use crate::dispatcher::CommandDispatcher;
use crate::error::{DispatchError, EditError, PanelError, SaveError};
use crate::focus::FocusTracker;
use crate::grid::{EditEntry, EditSession, GridView, SchemaGridProjector};
use crate::mirror::{Applied, StateMirror};
use crate::navigator::StepNavigator;
use crate::record::{PanelId, PanelRecord};
use crate::state::{LoadPhase, ProtocolState};

/// What a panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
	/// Still waiting for schema, steps or step number.
	Loading(LoadPhase),
	/// The step table.
	Grid(GridView),
}

/// Host surface a panel renders into.
pub trait PanelMount: Send {
	/// Replaces the panel contents.
	fn present(&mut self, view: &PanelView);
}

/// Host file a panel saves its protocol into.
pub trait ProtocolFile: Send {
	/// Replaces the file contents and persists them.
	fn write_text(&mut self, text: &str) -> io::Result<()>;
}

/// User gesture routed to a panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
	/// Next step, inserting one past the last.
	Advance,
	/// Previous step, wrapping to the last.
	Retreat,
	/// Delete the current step.
	RemoveCurrent,
	/// Open an editor on a cell.
	BeginEdit {
		/// Row step.
		step: usize,
		/// Column key.
		key: String,
	},
	/// Commit the open editor.
	CommitEdit {
		/// Edited value.
		value: Value,
	},
	/// Close the open editor without committing.
	CancelEdit,
	/// Write the protocol to the bound file.
	Save,
}

/// One open view of a step protocol.
pub struct PanelInstance {
	id: PanelId,
	mirror: StateMirror,
	dispatcher: CommandDispatcher,
	arbiter: ActiveInstanceArbiter,
	inbound: mpsc::Receiver<Inbound>,
	mount: Box<dyn PanelMount>,
	file: Option<Box<dyn ProtocolFile>>,
	editing: Option<EditSession>,
	last_view: Option<PanelView>,
	lifecycle: CancellationToken,
	closed: bool,
}

impl PanelInstance {
	/// Creates a panel and subscribes it to every state channel it mirrors.
	pub fn open(
		id: PanelId,
		bound_protocol: Option<String>,
		transport: Arc<dyn Transport>,
		focus: &FocusTracker,
		mount: Box<dyn PanelMount>,
		file: Option<Box<dyn ProtocolFile>>,
		config: &PanelConfig,
	) -> Result<Self, PanelError> {
		let lifecycle = CancellationToken::new();
		let mut mirror = StateMirror::new(transport.clone(), bound_protocol, lifecycle.clone());
		let dispatcher = CommandDispatcher::new(transport, mirror.watch_phase(), lifecycle.clone(), config.request_timeout());
		let (sink, inbound) = mpsc::channel(config.inbound_capacity());
		if let Err(error) = mirror.subscribe_panel_channels(&sink) {
			mirror.dispose();
			return Err(error);
		}
		tracing::debug!(panel = %id, bound = ?mirror.state().bound_protocol(), "panel opened");

		let mut panel = Self {
			arbiter: ActiveInstanceArbiter::new(id.clone(), focus.subscribe()),
			id,
			mirror,
			dispatcher,
			inbound,
			mount,
			file,
			editing: None,
			last_view: None,
			lifecycle,
			closed: false,
		};
		panel.present();
		Ok(panel)
	}

	/// Panel identifier.
	pub fn id(&self) -> &PanelId {
		&self.id
	}

	/// Restoration tuple for this panel.
	pub fn record(&self) -> PanelRecord {
		PanelRecord {
			id: self.id.clone(),
			bound_protocol: self.mirror.state().bound_protocol().map(str::to_owned),
		}
	}

	/// Read-only snapshot.
	pub fn state(&self) -> &ProtocolState {
		self.mirror.state()
	}

	/// Last view pushed to the mount.
	pub fn view(&self) -> Option<&PanelView> {
		self.last_view.as_ref()
	}

	/// Open cell editor, if any.
	pub fn editing(&self) -> Option<&EditSession> {
		self.editing.as_ref()
	}

	/// Token whose cancellation stops the panel.
	pub fn lifecycle(&self) -> CancellationToken {
		self.lifecycle.clone()
	}

	/// Returns true once the panel stopped.
	pub fn is_disposed(&self) -> bool {
		self.lifecycle.is_cancelled()
	}

	/// Loads the panel's protocol.
	///
	/// An unbound panel asks for a new protocol and binds to it. A bound panel
	/// asks the store to switch to its protocol. Returns the resulting record.
	pub async fn bootstrap(&mut self) -> Result<PanelRecord, PanelError> {
		if self.is_disposed() {
			return Ok(self.record());
		}
		match self.mirror.state().bound_protocol() {
			Some(bound) => {
				let active = self.mirror.state().active_protocol();
				self.arbiter.switch_to(bound, active, &mut self.dispatcher)?;
			}
			None => {
				let response = self.dispatcher.request(Request::new_protocol()).await?;
				let skeleton = parse_skeleton(response).map_err(PanelError::NewProtocol)?;
				tracing::info!(panel = %self.id, protocol = %skeleton.name, "bound to new protocol");
				self.mirror.bind(skeleton.name);
				self.arbitrate()?;
				self.present();
			}
		}
		Ok(self.record())
	}

	/// Applies one inbound state message.
	pub fn handle_inbound(&mut self, message: Inbound) -> Result<(), PanelError> {
		let Applied::Installed { channel, changed } = self.mirror.apply_state_message(&message.topic, &message.payload) else {
			return Ok(());
		};
		self.dispatcher.observe(channel);
		if channel == StateChannel::ProtocolSkeleton {
			self.arbitrate()?;
		}
		if changed {
			self.close_stale_editor();
			self.present();
		}
		Ok(())
	}

	/// Applies every queued inbound message without waiting. Returns how many were taken.
	pub fn drain_inbound(&mut self) -> usize {
		let mut taken = 0;
		while let Ok(message) = self.inbound.try_recv() {
			taken += 1;
			if let Err(error) = self.handle_inbound(message) {
				tracing::warn!(panel = %self.id, %error, "failed to apply state");
			}
		}
		taken
	}

	/// Re-runs arbitration after focus moved.
	pub fn handle_focus_change(&mut self) -> Result<Arbitration, PanelError> {
		Ok(self.arbitrate()?)
	}

	/// Applies one user gesture.
	pub async fn handle_intent(&mut self, intent: Intent) -> Result<(), PanelError> {
		if self.is_disposed() {
			return Ok(());
		}
		match intent {
			Intent::Save => self.save().await?,
			Intent::CancelEdit => self.editing = None,
			_ if !self.mirror.state().is_active_view() => {
				tracing::debug!(panel = %self.id, ?intent, "ignoring intent, protocol not active");
			}
			Intent::Advance => {
				self.navigator().advance()?;
			}
			Intent::Retreat => {
				self.navigator().retreat()?;
			}
			Intent::RemoveCurrent => {
				self.navigator().remove_current()?;
			}
			Intent::BeginEdit { step, key } => {
				let entry = SchemaGridProjector::begin_edit(&mut self.navigator(), step, &key)?;
				match entry {
					EditEntry::Entered(session) => self.editing = Some(session),
					other => tracing::debug!(panel = %self.id, step, %key, entry = ?other, "edit not entered"),
				}
			}
			Intent::CommitEdit { value } => {
				let Some(session) = self.editing.take() else {
					tracing::debug!(panel = %self.id, "commit without open editor");
					return Ok(());
				};
				let result = SchemaGridProjector::commit_edit(&mut self.navigator(), &session, value);
				if matches!(result, Err(EditError::InvalidValue { .. })) {
					self.editing = Some(session);
				}
				result?;
			}
		}
		Ok(())
	}

	/// Fetches the protocol and writes it to the bound file.
	pub async fn save(&mut self) -> Result<(), SaveError> {
		if self.file.is_none() {
			tracing::error!(panel = %self.id, "no file bound to panel, not saving");
			return Err(SaveError::MissingBoundFile);
		}
		let Some(name) = self.mirror.state().bound_protocol().map(str::to_owned) else {
			return Err(SaveError::Unbound);
		};
		let protocol = self
			.dispatcher
			.request(Request::protocol_by_name(&name))
			.await
			.map_err(SaveError::Fetch)?;
		let text = serde_json::to_string(&protocol).map_err(SaveError::Encode)?;
		let file = self.file.as_mut().ok_or(SaveError::MissingBoundFile)?;
		file.write_text(&text).map_err(SaveError::Write)?;
		tracing::info!(panel = %self.id, protocol = %name, bytes = text.len(), "protocol saved");
		Ok(())
	}

	/// Pushes the current view to the mount unless it is unchanged.
	pub fn present(&mut self) {
		if self.is_disposed() {
			return;
		}
		let view = match SchemaGridProjector::project(self.mirror.state()) {
			Some(grid) => PanelView::Grid(grid),
			None => PanelView::Loading(self.mirror.phase()),
		};
		if self.last_view.as_ref() == Some(&view) {
			return;
		}
		self.mount.present(&view);
		self.last_view = Some(view);
	}

	/// Stops the panel. Later calls do nothing.
	pub fn dispose(&mut self) {
		if self.closed {
			return;
		}
		self.closed = true;
		self.mirror.dispose();
		self.inbound.close();
		self.editing = None;
		tracing::debug!(panel = %self.id, "panel disposed");
	}

	/// Runs the panel until it is disposed or its intent stream ends.
	pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) {
		let lifecycle = self.lifecycle.clone();
		let mut focus_open = true;
		loop {
			tokio::select! {
				biased;
				() = lifecycle.cancelled() => break,
				message = self.inbound.recv() => match message {
					Some(message) => {
						if let Err(error) = self.handle_inbound(message) {
							tracing::warn!(panel = %self.id, %error, "failed to apply state");
						}
					}
					None => break,
				},
				open = self.arbiter.focus_changed(), if focus_open => {
					if !open {
						focus_open = false;
					} else if let Err(error) = self.handle_focus_change() {
						tracing::warn!(panel = %self.id, %error, "arbitration failed");
					}
				}
				intent = intents.recv() => match intent {
					Some(intent) => {
						if let Err(error) = self.handle_intent(intent).await {
							tracing::warn!(panel = %self.id, %error, "intent failed");
						}
					}
					None => break,
				},
			}
		}
		self.dispose();
	}

	fn navigator(&mut self) -> StepNavigator<'_> {
		StepNavigator::new(self.mirror.state(), &mut self.dispatcher)
	}

	fn arbitrate(&mut self) -> Result<Arbitration, DispatchError> {
		self.arbiter.evaluate(self.mirror.state(), &mut self.dispatcher)
	}

	fn close_stale_editor(&mut self) {
		let Some(session) = &self.editing else {
			return;
		};
		let state = self.mirror.state();
		let still_current = state.ready().is_some_and(|ready| ready.current == session.step);
		if !still_current || !state.is_active_view() {
			tracing::debug!(panel = %self.id, step = session.step, key = %session.key, "closing stale editor");
			self.editing = None;
		}
	}
}

/// Accepts the skeleton either as an object or as JSON text.
fn parse_skeleton(response: Value) -> Result<ProtocolSkeleton, serde_json::Error> {
	match response {
		Value::String(text) => serde_json::from_str(&text),
		other => serde_json::from_value(other),
	}
}
