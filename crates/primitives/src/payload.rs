use std::fmt;

use crate::{Fingerprint, Table, Value};

/// Data carried by a source item or produced by a transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Table(Table),
	Value(Value),
}

/// Discriminant of a [`Payload`], used by sources that only accept one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
	Table,
	Value,
}

impl Payload {
	pub const fn kind(&self) -> PayloadKind {
		match self {
			Self::Table(_) => PayloadKind::Table,
			Self::Value(_) => PayloadKind::Value,
		}
	}

	pub fn as_table(&self) -> Option<&Table> {
		match self {
			Self::Table(t) => Some(t),
			Self::Value(_) => None,
		}
	}

	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Self::Value(v) => Some(v),
			Self::Table(_) => None,
		}
	}

	/// Content fingerprint of this payload.
	pub fn fingerprint(&self) -> Fingerprint {
		Fingerprint::of_payload(self)
	}
}

impl From<Table> for Payload {
	fn from(table: Table) -> Self {
		Self::Table(table)
	}
}

impl From<Value> for Payload {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

impl fmt::Display for PayloadKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Table => f.write_str("table"),
			Self::Value => f.write_str("value"),
		}
	}
}
