//! Panel launcher.
//!
//! The [`Workbench`] opens panels once the transport is ready, gives each one
//! its own event loop task, records restoration tuples, and keeps the
//! protocol menu in step with the published protocol list.

use std::collections::HashMap;
use std::sync::Arc;

use stepdeck_bus::Transport;
use stepdeck_panel::{FocusTracker, Intent, PanelId, PanelInstance, PanelMount, PanelRecord, ProtocolFile};
use stepdeck_wire::StateChannel;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CommandRegistry, ProtocolCatalog};
use crate::config::WorkbenchConfig;
use crate::error::{Result, WorkbenchError};
use crate::registry::RestorationStore;

/// Host surfaces handed to a new panel.
pub struct PanelSurface {
	/// Where the panel renders.
	pub mount: Box<dyn PanelMount>,
	/// Where the panel saves, if anywhere.
	pub file: Option<Box<dyn ProtocolFile>>,
}

impl PanelSurface {
	/// A surface without a bound file.
	pub fn new(mount: Box<dyn PanelMount>) -> Self {
		Self { mount, file: None }
	}

	/// Binds a file for saving.
	pub fn with_file(mut self, file: Box<dyn ProtocolFile>) -> Self {
		self.file = Some(file);
		self
	}
}

/// Handle to a running panel.
///
/// Dropping every clone of the handle ends the panel's event loop.
#[derive(Debug, Clone)]
pub struct PanelHandle {
	id: PanelId,
	record: PanelRecord,
	intents: mpsc::Sender<Intent>,
	lifecycle: CancellationToken,
}

impl PanelHandle {
	/// Panel identifier.
	pub fn id(&self) -> &PanelId {
		&self.id
	}

	/// Restoration tuple recorded at launch.
	pub fn record(&self) -> &PanelRecord {
		&self.record
	}

	/// Queues a user gesture.
	pub async fn send(&self, intent: Intent) -> Result<()> {
		self.intents
			.send(intent)
			.await
			.map_err(|_| WorkbenchError::Closed(self.id.clone()))
	}

	/// Returns true once the panel stopped.
	pub fn is_closed(&self) -> bool {
		self.lifecycle.is_cancelled() || self.intents.is_closed()
	}
}

struct OpenPanel {
	lifecycle: CancellationToken,
	task: JoinHandle<()>,
}

/// Opens, restores and closes protocol panels.
pub struct Workbench {
	transport: Arc<dyn Transport>,
	focus: FocusTracker,
	config: WorkbenchConfig,
	store: Arc<dyn RestorationStore>,
	panels: HashMap<PanelId, OpenPanel>,
	shutdown: CancellationToken,
}

impl Workbench {
	/// Creates a workbench over `transport`.
	pub fn new(transport: Arc<dyn Transport>, config: WorkbenchConfig, store: Arc<dyn RestorationStore>) -> Self {
		Self {
			transport,
			focus: FocusTracker::new(),
			config,
			store,
			panels: HashMap::new(),
			shutdown: CancellationToken::new(),
		}
	}

	/// Focus source shared by every panel.
	pub fn focus(&self) -> &FocusTracker {
		&self.focus
	}

	/// Settings in effect.
	pub fn config(&self) -> &WorkbenchConfig {
		&self.config
	}

	/// Ids of panels whose event loop is still running, sorted.
	pub fn open_panels(&self) -> Vec<PanelId> {
		let mut ids: Vec<_> = self
			.panels
			.iter()
			.filter(|(_, open)| !open.task.is_finished())
			.map(|(id, _)| id.clone())
			.collect();
		ids.sort();
		ids
	}

	/// Persisted restoration tuples.
	pub fn records(&self) -> Vec<PanelRecord> {
		self.store.records()
	}

	/// Opens a panel on `protocol`, or on a new protocol when `None`.
	///
	/// Waits for the transport to become ready. The new panel takes focus.
	pub async fn launch(&mut self, id: Option<PanelId>, protocol: Option<String>, surface: PanelSurface) -> Result<PanelHandle> {
		self.transport.ready().wait().await;
		self.prune_finished();
		let id = id.unwrap_or_else(PanelId::generate);
		if self.panels.contains_key(&id) {
			return Err(WorkbenchError::Duplicate(id));
		}

		let mut panel = PanelInstance::open(
			id.clone(),
			protocol,
			self.transport.clone(),
			&self.focus,
			surface.mount,
			surface.file,
			&self.config.panel,
		)?;
		self.store.save(panel.record());
		self.focus.focus(id.clone());

		let record = match panel.bootstrap().await {
			Ok(record) => record,
			Err(error) => {
				tracing::warn!(panel = %id, %error, "panel bootstrap failed");
				panel.dispose();
				self.focus.blur(&id);
				self.store.forget(&id);
				return Err(error.into());
			}
		};
		self.store.save(record.clone());

		let (intents, rx) = mpsc::channel(self.config.panel.inbound_capacity());
		let lifecycle = panel.lifecycle();
		let task = tokio::spawn(panel.run(rx));
		self.panels.insert(
			id.clone(),
			OpenPanel {
				lifecycle: lifecycle.clone(),
				task,
			},
		);
		tracing::info!(panel = %id, protocol = ?record.bound_protocol, "panel launched");
		Ok(PanelHandle {
			id,
			record,
			intents,
			lifecycle,
		})
	}

	/// Relaunches panels from persisted tuples. Panels that fail to open are skipped.
	pub async fn restore(
		&mut self,
		records: Vec<PanelRecord>,
		mut surface_for: impl FnMut(&PanelRecord) -> PanelSurface,
	) -> Vec<PanelHandle> {
		let mut handles = Vec::with_capacity(records.len());
		for record in records {
			let surface = surface_for(&record);
			match self.launch(Some(record.id.clone()), record.bound_protocol.clone(), surface).await {
				Ok(handle) => handles.push(handle),
				Err(error) => tracing::warn!(panel = %record.id, %error, "failed to restore panel"),
			}
		}
		handles
	}

	/// Stops a panel and forgets its restoration tuple.
	pub async fn close(&mut self, id: &PanelId) -> Result<()> {
		let Some(open) = self.panels.remove(id) else {
			return Err(WorkbenchError::UnknownPanel(id.clone()));
		};
		self.store.forget(id);
		self.focus.blur(id);
		stop(id, open).await;
		tracing::info!(panel = %id, "panel closed");
		Ok(())
	}

	/// Stops every panel, keeping restoration tuples for the next session.
	pub async fn shutdown(&mut self) {
		self.shutdown.cancel();
		for (id, open) in self.panels.drain() {
			stop(&id, open).await;
		}
	}

	/// Drops entries whose event loop ended on its own. Their records are kept.
	fn prune_finished(&mut self) {
		self.panels.retain(|id, open| {
			let running = !open.task.is_finished();
			if !running {
				tracing::debug!(panel = %id, "pruning finished panel");
			}
			running
		});
	}

	/// Keeps `registry` in step with the published protocol list until shutdown.
	pub fn spawn_catalog<R>(&self, mut registry: R) -> Result<JoinHandle<R>>
	where
		R: CommandRegistry + 'static,
	{
		let mut catalog = ProtocolCatalog::new(&self.config);
		catalog.register_open(&mut registry);

		let (sink, mut inbound) = mpsc::channel(self.config.panel.inbound_capacity());
		let subscription = self
			.transport
			.subscribe(&StateChannel::ProtocolSkeletons.topic(), sink)
			.map_err(WorkbenchError::Catalog)?;
		let transport = self.transport.clone();
		let shutdown = self.shutdown.clone();

		Ok(tokio::spawn(async move {
			loop {
				tokio::select! {
					biased;
					() = shutdown.cancelled() => break,
					message = inbound.recv() => {
						let Some(message) = message else { break };
						if let Err(error) = catalog.apply_skeletons(&message.payload, &mut registry) {
							tracing::warn!(%error, "malformed protocol list");
						}
					}
				}
			}
			transport.unsubscribe(subscription);
			registry
		}))
	}
}

async fn stop(id: &PanelId, open: OpenPanel) {
	open.lifecycle.cancel();
	if let Err(error) = open.task.await {
		tracing::warn!(panel = %id, %error, "panel task ended abnormally");
	}
}
