//! Step navigation.

use serde_json::Value;
use stepdeck_wire::Command;

use crate::dispatcher::{CommandDispatcher, Dispatch, Suppression};
use crate::error::DispatchError;
use crate::state::{ProtocolState, ReadyState};

/// Maps navigation gestures onto step commands.
///
/// Advancing past the last step inserts a new one after it, and retreating
/// from the first step wraps around to the last.
pub struct StepNavigator<'a> {
	state: &'a ProtocolState,
	dispatcher: &'a mut CommandDispatcher,
}

impl<'a> StepNavigator<'a> {
	/// Borrows a snapshot and its dispatcher.
	pub fn new(state: &'a ProtocolState, dispatcher: &'a mut CommandDispatcher) -> Self {
		Self { state, dispatcher }
	}

	/// Snapshot the navigator reads from.
	pub fn state(&self) -> &'a ProtocolState {
		self.state
	}

	/// Moves to the next step, inserting one when already at the last.
	pub fn advance(&mut self) -> Result<Dispatch, DispatchError> {
		let (current, last) = match self.position() {
			Ok(position) => position,
			Err(suppressed) => return Ok(suppressed),
		};
		if current == last {
			self.dispatcher.send(Command::insert_step(last))
		} else {
			self.dispatcher.send(Command::step_number(current + 1))
		}
	}

	/// Moves to the previous step, wrapping to the last from the first.
	pub fn retreat(&mut self) -> Result<Dispatch, DispatchError> {
		let (current, last) = match self.position() {
			Ok(position) => position,
			Err(suppressed) => return Ok(suppressed),
		};
		let target = if current == 0 { last } else { current - 1 };
		self.dispatcher.send(Command::step_number(target))
	}

	/// Deletes the current step.
	pub fn remove_current(&mut self) -> Result<Dispatch, DispatchError> {
		match self.position() {
			Ok((current, _)) => self.dispatcher.send(Command::delete_step(current)),
			Err(suppressed) => Ok(suppressed),
		}
	}

	/// Selects step `step_number`.
	pub fn jump_to(&mut self, step_number: usize) -> Result<Dispatch, DispatchError> {
		if self.state.ready().is_none() {
			return Ok(Dispatch::Suppressed(Suppression::NotReady));
		}
		self.dispatcher.send(Command::step_number(step_number))
	}

	/// Sets one field of one step.
	pub fn update_field(&mut self, step_number: usize, key: &str, value: Value) -> Result<Dispatch, DispatchError> {
		if self.state.ready().is_none() {
			return Ok(Dispatch::Suppressed(Suppression::NotReady));
		}
		self.dispatcher.send(Command::update_step(step_number, key, value))
	}

	fn position(&self) -> Result<(usize, usize), Dispatch> {
		let Some(ReadyState { current, steps, .. }) = self.state.ready() else {
			return Err(Dispatch::Suppressed(Suppression::NotReady));
		};
		match steps.len().checked_sub(1) {
			Some(last) => Ok((current, last)),
			None => {
				tracing::debug!("navigation suppressed, protocol has no steps");
				Err(Dispatch::Suppressed(Suppression::Empty))
			}
		}
	}
}
