//! Step schema descriptors.
//!
//! Raw schema field types arrive as free-form strings. [`SchemaFieldType::from_raw`]
//! is a total mapping onto a closed variant: a missing type is a string, and any
//! unrecognised type is [`SchemaFieldType::Unknown`].

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Implicit ordinal field present on every step.
pub const STEP_FIELD: &str = "step";

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaFieldType {
	/// Free text. Also the type of fields that declare none.
	#[default]
	String,
	/// Whole numbers.
	Integer,
	/// Real numbers.
	Number,
	/// True/false flags.
	Boolean,
	/// A declared type this crate does not recognise.
	Unknown,
}

impl SchemaFieldType {
	/// Maps a raw type string onto the closed variant.
	pub fn from_raw(raw: Option<&str>) -> Self {
		let Some(raw) = raw else {
			return Self::String;
		};
		match raw.trim().to_ascii_lowercase().as_str() {
			"" | "string" => Self::String,
			"integer" => Self::Integer,
			"number" => Self::Number,
			"boolean" => Self::Boolean,
			_ => Self::Unknown,
		}
	}

	/// Returns true for integer and number fields.
	pub const fn is_numeric(self) -> bool {
		matches!(self, Self::Integer | Self::Number)
	}
}

/// Per-field type and editability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaFieldDescriptor {
	/// Declared field type.
	pub field_type: SchemaFieldType,
	/// Whether the field may be edited from the table.
	pub editable: bool,
}

impl SchemaFieldDescriptor {
	/// Builds a descriptor from one schema entry.
	///
	/// The `step` field is never editable, whatever the entry declares.
	pub fn from_entry(name: &str, entry: &Map<String, Value>) -> Self {
		let field_type = match entry.get("type") {
			None | Some(Value::Null) => SchemaFieldType::String,
			Some(Value::String(raw)) => SchemaFieldType::from_raw(Some(raw)),
			Some(_) => SchemaFieldType::Unknown,
		};
		let editable = name != STEP_FIELD && entry.get("editable").and_then(Value::as_bool).unwrap_or(true);
		Self { field_type, editable }
	}
}

/// Ordered schema; iteration order is column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
	fields: IndexMap<String, SchemaFieldDescriptor>,
}

impl Schema {
	/// Builds a schema from a merged fragment map, skipping entries that are not objects.
	pub fn from_merged(merged: &Map<String, Value>) -> Self {
		let fields = merged
			.iter()
			.filter_map(|(name, entry)| {
				let entry = entry.as_object()?;
				Some((name.clone(), SchemaFieldDescriptor::from_entry(name, entry)))
			})
			.collect();
		Self { fields }
	}

	/// Returns the descriptor for a field.
	pub fn get(&self, name: &str) -> Option<&SchemaFieldDescriptor> {
		self.fields.get(name)
	}

	/// Iterates fields in column order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaFieldDescriptor)> {
		self.fields.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
	}

	/// Number of fields.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Returns true when the schema has no fields.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

impl FromIterator<(String, SchemaFieldDescriptor)> for Schema {
	fn from_iter<I: IntoIterator<Item = (String, SchemaFieldDescriptor)>>(iter: I) -> Self {
		let mut fields = IndexMap::new();
		for (name, mut descriptor) in iter {
			if name == STEP_FIELD {
				descriptor.editable = false;
			}
			fields.insert(name, descriptor);
		}
		Self { fields }
	}
}
