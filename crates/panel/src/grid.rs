//! Schema-driven step table.
//!
//! The schema decides the columns and their cell kinds; steps become rows.
//! Edits are intercepted before they reach a cell: a row other than the
//! current step is selected instead of edited, and committed values are
//! coerced to the cell kind before they are sent as an `update-step`.

use serde_json::{Number, Value};
use stepdeck_wire::{STEP_FIELD, Schema, SchemaFieldType};

use crate::dispatcher::Dispatch;
use crate::error::{DispatchError, EditError};
use crate::navigator::StepNavigator;
use crate::state::ProtocolState;

/// How a column's cells are rendered and edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
	/// Free text.
	String,
	/// Integer and real numbers share one numeric cell.
	Numeric,
	/// Checkbox.
	Boolean,
}

impl CellKind {
	/// Cell kind for a field. The `step` column is always a string cell.
	pub fn for_field(name: &str, field_type: SchemaFieldType) -> Self {
		if name == STEP_FIELD {
			return Self::String;
		}
		match field_type {
			SchemaFieldType::Integer | SchemaFieldType::Number => Self::Numeric,
			SchemaFieldType::Boolean => Self::Boolean,
			SchemaFieldType::String | SchemaFieldType::Unknown => Self::String,
		}
	}
}

/// One table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
	/// Schema field name.
	pub name: String,
	/// Header text.
	pub label: String,
	/// Cell kind.
	pub cell: CellKind,
	/// Declared field type.
	pub field_type: SchemaFieldType,
	/// Whether cells accept edits.
	pub editable: bool,
}

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
	/// Step ordinal.
	pub step: usize,
	/// Cell values in column order; missing fields are null.
	pub cells: Vec<Value>,
	/// Whether this row is the current step.
	pub current: bool,
}

/// Whether the table accepts input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
	/// The panel's protocol is active.
	Interactive,
	/// Another protocol is active; the table is dimmed and ignores input.
	Background,
}

/// Projected table.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
	/// Columns in schema order.
	pub columns: Vec<Column>,
	/// Rows in step order.
	pub rows: Vec<Row>,
	/// Highlighted row.
	pub highlighted: Option<usize>,
	/// Input mode.
	pub interaction: Interaction,
}

/// Result of trying to enter edit mode on a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEntry {
	/// The panel is not ready.
	NotReady,
	/// The table is in the background.
	Disabled,
	/// The row was not current; it was selected instead.
	Redirected {
		/// Requested step.
		to: usize,
		/// Outcome of the selection put.
		dispatch: Dispatch,
	},
	/// The column is read-only.
	ReadOnly,
	/// No such column.
	UnknownColumn,
	/// No such row.
	UnknownRow,
	/// Edit mode entered.
	Entered(EditSession),
}

/// An open cell editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
	/// Step being edited.
	pub step: usize,
	/// Field being edited.
	pub key: String,
	/// Declared field type.
	pub field_type: SchemaFieldType,
	/// Cell kind.
	pub cell: CellKind,
	/// Value when the editor opened.
	pub original: Value,
}

/// Result of committing an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
	/// The value did not change; nothing was sent.
	Unchanged,
	/// The table went to the background while the editor was open.
	Discarded,
	/// An `update-step` was attempted.
	Submitted(Dispatch),
}

/// Projects a snapshot into a [`GridView`] and routes cell edits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaGridProjector;

impl SchemaGridProjector {
	/// Columns for `schema`, in schema order.
	pub fn columns(schema: &Schema) -> Vec<Column> {
		schema
			.iter()
			.map(|(name, descriptor)| Column {
				name: name.to_owned(),
				label: name.to_owned(),
				cell: CellKind::for_field(name, descriptor.field_type),
				field_type: descriptor.field_type,
				editable: descriptor.editable && name != STEP_FIELD,
			})
			.collect()
	}

	/// Projects the snapshot, or `None` before readiness.
	pub fn project(state: &ProtocolState) -> Option<GridView> {
		let ready = state.ready()?;
		let columns = Self::columns(ready.schema);
		let highlighted = ready.last().map(|_| ready.current);
		let rows = ready
			.steps
			.iter()
			.enumerate()
			.map(|(index, step)| Row {
				step: step.ordinal(),
				cells: columns.iter().map(|column| step.value(&column.name)).collect(),
				current: Some(index) == highlighted,
			})
			.collect();
		Some(GridView {
			columns,
			rows,
			highlighted,
			interaction: interaction(state),
		})
	}

	/// Attempts to open an editor on cell (`step`, `key`).
	pub fn begin_edit(nav: &mut StepNavigator<'_>, step: usize, key: &str) -> Result<EditEntry, DispatchError> {
		let state = nav.state();
		let Some(ready) = state.ready() else {
			return Ok(EditEntry::NotReady);
		};
		if interaction(state) == Interaction::Background {
			return Ok(EditEntry::Disabled);
		}
		let Some(row) = ready.steps.get(step) else {
			return Ok(EditEntry::UnknownRow);
		};
		if step != ready.current {
			let dispatch = nav.jump_to(step)?;
			return Ok(EditEntry::Redirected { to: step, dispatch });
		}
		let Some(descriptor) = ready.schema.get(key) else {
			return Ok(EditEntry::UnknownColumn);
		};
		if !descriptor.editable || key == STEP_FIELD {
			return Ok(EditEntry::ReadOnly);
		}
		Ok(EditEntry::Entered(EditSession {
			step,
			key: key.to_owned(),
			field_type: descriptor.field_type,
			cell: CellKind::for_field(key, descriptor.field_type),
			original: row.value(key),
		}))
	}

	/// Commits an editor's value as an `update-step`.
	pub fn commit_edit(nav: &mut StepNavigator<'_>, session: &EditSession, value: Value) -> Result<EditOutcome, EditError> {
		if interaction(nav.state()) == Interaction::Background {
			return Ok(EditOutcome::Discarded);
		}
		let value = coerce(session, value)?;
		if same_value(session.cell, &session.original, &value) {
			return Ok(EditOutcome::Unchanged);
		}
		let dispatch = nav.update_field(session.step, &session.key, value)?;
		Ok(EditOutcome::Submitted(dispatch))
	}
}

fn interaction(state: &ProtocolState) -> Interaction {
	if state.is_active_view() {
		Interaction::Interactive
	} else {
		Interaction::Background
	}
}

fn coerce(session: &EditSession, value: Value) -> Result<Value, EditError> {
	let invalid = |expected: &'static str, value: &Value| EditError::InvalidValue {
		key: session.key.clone(),
		expected,
		value: value.to_string(),
	};
	match (session.cell, session.field_type) {
		(CellKind::Numeric, SchemaFieldType::Integer) => match &value {
			Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
			Value::Number(n) => n.as_f64().and_then(whole).ok_or_else(|| invalid("integer", &value)),
			Value::String(text) => {
				let text = text.trim();
				text.parse::<i64>()
					.map(Value::from)
					.ok()
					.or_else(|| text.parse::<f64>().ok().and_then(whole))
					.ok_or_else(|| invalid("integer", &value))
			}
			_ => Err(invalid("integer", &value)),
		},
		(CellKind::Numeric, _) => match &value {
			Value::Number(_) => Ok(value),
			Value::String(text) => text
				.trim()
				.parse::<f64>()
				.ok()
				.and_then(Number::from_f64)
				.map(Value::Number)
				.ok_or_else(|| invalid("number", &value)),
			_ => Err(invalid("number", &value)),
		},
		(CellKind::Boolean, _) => match &value {
			Value::Bool(_) => Ok(value),
			Value::String(text) if text.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
			Value::String(text) if text.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
			_ => Err(invalid("boolean", &value)),
		},
		(CellKind::String, _) => match value {
			Value::String(_) => Ok(value),
			Value::Null => Ok(Value::String(String::new())),
			Value::Number(n) => Ok(Value::String(n.to_string())),
			Value::Bool(b) => Ok(Value::String(b.to_string())),
			other => Err(invalid("string", &other)),
		},
	}
}

fn whole(value: f64) -> Option<Value> {
	(value.fract() == 0.0 && value.abs() < 9.0e15).then(|| Value::from(value as i64))
}

fn same_value(cell: CellKind, original: &Value, value: &Value) -> bool {
	match (original, value) {
		(Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
		(Value::Number(_) | Value::Bool(_), Value::String(text)) if cell == CellKind::String => original.to_string() == *text,
		(Value::Null, Value::String(text)) if cell == CellKind::String => text.is_empty(),
		_ => original == value,
	}
}
