//! Local read model of one protocol panel.

use stepdeck_wire::{Schema, Step};

/// Load progress of the three readiness fields.
///
/// Transitions depend only on which of schema, steps and step number are
/// present, never on the order they arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
	/// None of schema, steps or step number has arrived.
	Empty,
	/// Some but not all have arrived.
	PartiallyLoaded,
	/// All three are present.
	Ready,
}

/// Snapshot owned by exactly one panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolState {
	schema: Option<Schema>,
	steps: Option<Vec<Step>>,
	current_step_index: Option<usize>,
	active_protocol: Option<String>,
	bound_protocol: Option<String>,
}

/// Borrowed view of a ready snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ReadyState<'a> {
	/// Step schema.
	pub schema: &'a Schema,
	/// Step rows.
	pub steps: &'a [Step],
	/// Current step, clamped to the last step when steps are present.
	pub current: usize,
}

impl ReadyState<'_> {
	/// Index of the last step, if any.
	pub fn last(&self) -> Option<usize> {
		self.steps.len().checked_sub(1)
	}
}

impl ProtocolState {
	/// Creates an empty snapshot for a panel bound to `bound_protocol`.
	pub fn new(bound_protocol: Option<String>) -> Self {
		Self {
			bound_protocol,
			..Self::default()
		}
	}

	/// Current schema.
	pub fn schema(&self) -> Option<&Schema> {
		self.schema.as_ref()
	}

	/// Current steps.
	pub fn steps(&self) -> Option<&[Step]> {
		self.steps.as_deref()
	}

	/// Current step index as published.
	pub fn current_step_index(&self) -> Option<usize> {
		self.current_step_index
	}

	/// Globally active protocol.
	pub fn active_protocol(&self) -> Option<&str> {
		self.active_protocol.as_deref()
	}

	/// Protocol this panel is bound to.
	pub fn bound_protocol(&self) -> Option<&str> {
		self.bound_protocol.as_deref()
	}

	/// Returns the current load phase.
	pub fn phase(&self) -> LoadPhase {
		let present = [self.schema.is_some(), self.steps.is_some(), self.current_step_index.is_some()]
			.into_iter()
			.filter(|present| *present)
			.count();
		match present {
			0 => LoadPhase::Empty,
			3 => LoadPhase::Ready,
			_ => LoadPhase::PartiallyLoaded,
		}
	}

	/// Returns true when schema, steps and step number are all present.
	pub fn is_ready(&self) -> bool {
		self.phase() == LoadPhase::Ready
	}

	/// Returns the ready view, or `None` before readiness.
	pub fn ready(&self) -> Option<ReadyState<'_>> {
		let (Some(schema), Some(steps), Some(index)) = (&self.schema, &self.steps, self.current_step_index) else {
			return None;
		};
		let current = match steps.len().checked_sub(1) {
			Some(last) if index > last => last,
			_ => index,
		};
		Some(ReadyState { schema, steps, current })
	}

	/// Returns true when this panel's protocol is the active one.
	pub fn is_active_view(&self) -> bool {
		self.bound_protocol.is_some() && self.bound_protocol == self.active_protocol
	}

	pub(crate) fn set_schema(&mut self, schema: Schema) -> bool {
		replace_if_changed(&mut self.schema, schema)
	}

	pub(crate) fn set_steps(&mut self, steps: Vec<Step>) -> bool {
		let changed = replace_if_changed(&mut self.steps, steps);
		if changed {
			self.note_clamp();
		}
		changed
	}

	pub(crate) fn set_current_step_index(&mut self, index: usize) -> bool {
		let changed = replace_if_changed(&mut self.current_step_index, index);
		if changed {
			self.note_clamp();
		}
		changed
	}

	pub(crate) fn set_active_protocol(&mut self, name: String) -> bool {
		replace_if_changed(&mut self.active_protocol, name)
	}

	/// Returns true when the published step number lies beyond the last step.
	pub fn is_clamped(&self) -> bool {
		match (&self.steps, self.current_step_index) {
			(Some(steps), Some(index)) => steps.len().checked_sub(1).is_some_and(|last| index > last),
			_ => false,
		}
	}

	fn note_clamp(&self) {
		if let (true, Some(steps), Some(index)) = (self.is_clamped(), &self.steps, self.current_step_index) {
			tracing::debug!(index, last = steps.len() - 1, "step number beyond last step, clamping");
		}
	}

	pub(crate) fn bind(&mut self, name: String) -> bool {
		replace_if_changed(&mut self.bound_protocol, name)
	}
}

fn replace_if_changed<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
	if slot.as_ref() == Some(&value) {
		return false;
	}
	*slot = Some(value);
	true
}
