use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use weir_primitives::Value;
use weir_reactive::{Event, PropagationError, Signal};

use crate::element::Observable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl Level {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Trace => "trace",
			Self::Debug => "debug",
			Self::Info => "info",
			Self::Warn => "warn",
			Self::Error => "error",
		}
	}

	/// Reads a level from a level name or a numeric severity (`10` debug through `40` error).
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::String(s) => s.parse().ok(),
			Value::Int(n) => match *n {
				..10 => Some(Self::Trace),
				10..20 => Some(Self::Debug),
				20..30 => Some(Self::Info),
				30..40 => Some(Self::Warn),
				_ => Some(Self::Error),
			},
			_ => None,
		}
	}
}

impl FromStr for Level {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"trace" => Ok(Self::Trace),
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warn" | "warning" => Ok(Self::Warn),
			"error" => Ok(Self::Error),
			_ => Err(format!("unknown log level {s:?}")),
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
	pub level: Level,
	pub message: String,
}

/// Named in-memory record sink supplied by the host program.
///
/// Views watching a logger refresh whenever a record is appended.
#[derive(Debug)]
pub struct Logger {
	name: String,
	records: RwLock<Vec<Record>>,
	updated: Signal,
}

impl Logger {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			records: RwLock::new(Vec::new()),
			updated: Signal::new(),
		}
	}

	pub fn log(&self, level: Level, message: impl Into<String>) -> Result<(), PropagationError> {
		self.records.write().push(Record {
			level,
			message: message.into(),
		});
		self.updated.emit(&Event::new(&self.name))
	}

	pub fn info(&self, message: impl Into<String>) -> Result<(), PropagationError> {
		self.log(Level::Info, message)
	}

	pub fn warn(&self, message: impl Into<String>) -> Result<(), PropagationError> {
		self.log(Level::Warn, message)
	}

	pub fn records(&self) -> Vec<Record> {
		self.records.read().clone()
	}

	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Observable for Logger {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}
