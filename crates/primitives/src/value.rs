use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};


/// A node of an already-parsed specification document.
///
/// Mappings keep document order. Any serde format can produce a `Value`, which is how
/// external loaders hand specifications to the constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	List(Vec<Value>),
	Map(IndexMap<String, Value>),
}

impl Value {
	/// Returns an empty mapping.
	pub fn map() -> Self {
		Self::Map(IndexMap::new())
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Returns the value as a float, widening integers.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(f) => Some(*f),
			Self::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}

	/// Looks up `key` when this value is a mapping.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_map()?.get(key)
	}

	/// Short name of the variant, used in diagnostics.
	pub const fn type_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Map(_) => "map",
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(x) => write!(f, "{x}"),
			Self::String(s) => write!(f, "{s:?}"),
			Self::List(items) => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
			Self::Map(map) => {
				f.write_str("{")?;
				for (i, (k, v)) in map.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{k}: {v}")?;
				}
				f.write_str("}")
			}
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Self::Int(i64::from(i))
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Self::Float(f)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::String(s)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}
}

impl From<IndexMap<String, Value>> for Value {
	fn from(map: IndexMap<String, Value>) -> Self {
		Self::Map(map)
	}
}
