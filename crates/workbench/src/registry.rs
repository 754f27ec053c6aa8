//! Restoration tuples of open panels.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use stepdeck_panel::{PanelId, PanelRecord};

/// Persistence for panel restoration tuples.
pub trait RestorationStore: Send + Sync {
	/// Upserts one record.
	fn save(&self, record: PanelRecord);

	/// Removes one record.
	fn forget(&self, id: &PanelId);

	/// Returns every record.
	fn records(&self) -> Vec<PanelRecord>;
}

/// In-memory restoration store.
#[derive(Debug, Default, Clone)]
pub struct PanelRegistry {
	inner: Arc<RwLock<HashMap<PanelId, PanelRecord>>>,
}

impl PanelRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns snapshots sorted by panel id.
	pub fn snapshots(&self) -> Vec<PanelRecord> {
		let mut records: Vec<_> = self.inner.read().values().cloned().collect();
		records.sort_by(|a, b| a.id.cmp(&b.id));
		records
	}
}

impl RestorationStore for PanelRegistry {
	fn save(&self, record: PanelRecord) {
		self.inner.write().insert(record.id.clone(), record);
	}

	fn forget(&self, id: &PanelId) {
		self.inner.write().remove(id);
	}

	fn records(&self) -> Vec<PanelRecord> {
		self.snapshots()
	}
}
