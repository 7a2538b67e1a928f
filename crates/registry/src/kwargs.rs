use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use indexmap::IndexMap;
use weir_primitives::Value;

use crate::ConstructError;
use crate::element::{DataProvider, Observable, Opt, Tool, View};
use crate::logger::Logger;
use crate::param::ParamKind;


/// A `(label, field)` tooltip pair.
pub type Tooltip = (String, String);

/// A keyword argument after reference resolution.
#[derive(Clone)]
pub enum Resolved {
	Source(Option<Arc<dyn DataProvider>>),
	Sources(IndexMap<String, Arc<dyn DataProvider>>),
	Opts(Vec<Arc<dyn Opt>>),
	Views(Vec<Arc<dyn View>>),
	Tools(Vec<Arc<dyn Tool>>),
	Dependencies(Vec<Arc<dyn Observable>>),
	Logger(Arc<Logger>),
	Tooltips(Vec<Tooltip>),
	Scalar(Value),
}

impl Resolved {
	pub fn kind(&self) -> ParamKind {
		match self {
			Self::Source(_) => ParamKind::Source,
			Self::Sources(_) => ParamKind::Sources,
			Self::Opts(_) => ParamKind::Opts,
			Self::Views(_) => ParamKind::Views,
			Self::Tools(_) => ParamKind::Tools,
			Self::Dependencies(_) => ParamKind::Dependencies,
			Self::Logger(_) => ParamKind::Logger,
			Self::Tooltips(_) => ParamKind::Tooltips,
			Self::Scalar(_) => ParamKind::Scalar,
		}
	}

	fn describe(&self) -> String {
		match self {
			Self::Scalar(v) => v.type_name().to_string(),
			other => format!("{:?}", other.kind()).to_lowercase(),
		}
	}
}

impl fmt::Debug for Resolved {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Source(s) => f.debug_tuple("Source").field(&s.as_ref().map(|s| s.name())).finish(),
			Self::Sources(map) => f
				.debug_map()
				.entries(map.iter().map(|(k, v)| (k, v.name())))
				.finish(),
			Self::Opts(v) => f.debug_list().entries(v.iter().map(|o| o.name())).finish(),
			Self::Views(v) => f.debug_list().entries(v.iter().map(|o| o.name())).finish(),
			Self::Tools(v) => f.debug_list().entries(v.iter().map(|o| o.name())).finish(),
			Self::Dependencies(v) => f.debug_list().entries(v.iter().map(|o| o.name())).finish(),
			Self::Logger(l) => f.debug_tuple("Logger").field(&l.name()).finish(),
			Self::Tooltips(t) => f.debug_tuple("Tooltips").field(t).finish(),
			Self::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
		}
	}
}

/// Resolved keyword arguments for one element, consumed by its constructor.
///
/// Constructors `take_*` what they understand; absent reference lists default to empty.
/// Calling [`Kwargs::finish`] afterwards rejects leftovers.
#[derive(Debug, Clone, Default)]
pub struct Kwargs {
	element: String,
	entries: IndexMap<String, Resolved>,
}

impl Kwargs {
	pub fn new(element: impl Into<String>) -> Self {
		Self {
			element: element.into(),
			entries: IndexMap::new(),
		}
	}

	/// Name of the element these arguments belong to.
	pub fn element(&self) -> &str {
		&self.element
	}

	pub fn insert(&mut self, name: impl Into<String>, value: Resolved) {
		self.entries.insert(name.into(), value);
	}

	pub fn with(mut self, name: impl Into<String>, value: Resolved) -> Self {
		self.insert(name, value);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Resolved> {
		self.entries.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn mismatch(&self, param: &str, expected: &'static str, found: &Resolved) -> ConstructError {
		ConstructError::InvalidParam {
			element: self.element.clone(),
			param: param.to_string(),
			expected,
			found: found.describe(),
		}
	}

	pub fn take_source(&mut self, name: &str) -> Result<Option<Arc<dyn DataProvider>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None | Some(Resolved::Scalar(Value::Null)) => Ok(None),
			Some(Resolved::Source(source)) => Ok(source),
			Some(other) => Err(self.mismatch(name, "a source", &other)),
		}
	}

	pub fn take_sources(&mut self, name: &str) -> Result<IndexMap<String, Arc<dyn DataProvider>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(IndexMap::new()),
			Some(Resolved::Sources(map)) => Ok(map),
			Some(other) => Err(self.mismatch(name, "a mapping of sources", &other)),
		}
	}

	pub fn take_opts(&mut self, name: &str) -> Result<Vec<Arc<dyn Opt>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(Vec::new()),
			Some(Resolved::Opts(opts)) => Ok(opts),
			Some(other) => Err(self.mismatch(name, "opts", &other)),
		}
	}

	pub fn take_views(&mut self, name: &str) -> Result<Vec<Arc<dyn View>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(Vec::new()),
			Some(Resolved::Views(views)) => Ok(views),
			Some(other) => Err(self.mismatch(name, "views", &other)),
		}
	}

	pub fn take_tools(&mut self, name: &str) -> Result<Vec<Arc<dyn Tool>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(Vec::new()),
			Some(Resolved::Tools(tools)) => Ok(tools),
			Some(other) => Err(self.mismatch(name, "tools", &other)),
		}
	}

	pub fn take_dependencies(&mut self, name: &str) -> Result<Vec<Arc<dyn Observable>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(Vec::new()),
			Some(Resolved::Dependencies(deps)) => Ok(deps),
			Some(other) => Err(self.mismatch(name, "dependencies", &other)),
		}
	}

	pub fn take_logger(&mut self, name: &str) -> Result<Option<Arc<Logger>>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(None),
			Some(Resolved::Logger(logger)) => Ok(Some(logger)),
			Some(other) => Err(self.mismatch(name, "a logger", &other)),
		}
	}

	pub fn take_tooltips(&mut self, name: &str) -> Result<Vec<Tooltip>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(Vec::new()),
			Some(Resolved::Tooltips(tips)) => Ok(tips),
			Some(other) => Err(self.mismatch(name, "tooltips", &other)),
		}
	}

	pub fn take_scalar(&mut self, name: &str) -> Result<Option<Value>, ConstructError> {
		match self.entries.shift_remove(name) {
			None => Ok(None),
			Some(Resolved::Scalar(value)) => Ok(Some(value)),
			Some(other) => Err(self.mismatch(name, "a plain value", &other)),
		}
	}

	pub fn take_str(&mut self, name: &str) -> Result<Option<String>, ConstructError> {
		match self.take_scalar(name)? {
			None | Some(Value::Null) => Ok(None),
			Some(Value::String(s)) => Ok(Some(s)),
			Some(other) => Err(self.mismatch(name, "a string", &Resolved::Scalar(other))),
		}
	}

	pub fn take_bool(&mut self, name: &str) -> Result<Option<bool>, ConstructError> {
		match self.take_scalar(name)? {
			None | Some(Value::Null) => Ok(None),
			Some(Value::Bool(b)) => Ok(Some(b)),
			Some(other) => Err(self.mismatch(name, "a boolean", &Resolved::Scalar(other))),
		}
	}

	pub fn take_int(&mut self, name: &str) -> Result<Option<i64>, ConstructError> {
		match self.take_scalar(name)? {
			None | Some(Value::Null) => Ok(None),
			Some(Value::Int(n)) => Ok(Some(n)),
			Some(other) => Err(self.mismatch(name, "an integer", &Resolved::Scalar(other))),
		}
	}

	/// Reads a strictly positive integer, as used for capacity bounds.
	pub fn take_positive(&mut self, name: &str) -> Result<Option<NonZeroUsize>, ConstructError> {
		let Some(n) = self.take_int(name)? else {
			return Ok(None);
		};
		usize::try_from(n)
			.ok()
			.and_then(NonZeroUsize::new)
			.map(Some)
			.ok_or_else(|| ConstructError::InvalidParam {
				element: self.element.clone(),
				param: name.to_string(),
				expected: "a positive integer",
				found: n.to_string(),
			})
	}

	/// Reads a string or a list of strings.
	pub fn take_strings(&mut self, name: &str) -> Result<Option<Vec<String>>, ConstructError> {
		let value = match self.take_scalar(name)? {
			None | Some(Value::Null) => return Ok(None),
			Some(value) => value,
		};
		match value {
			Value::String(s) => Ok(Some(vec![s])),
			Value::List(items) if items.iter().all(|v| v.as_str().is_some()) => Ok(Some(
				items
					.into_iter()
					.filter_map(|v| match v {
						Value::String(s) => Some(s),
						_ => None,
					})
					.collect(),
			)),
			other => Err(self.mismatch(name, "a list of strings", &Resolved::Scalar(other))),
		}
	}

	/// Consumes the remaining arguments as plain values.
	pub fn into_rest(self) -> Result<IndexMap<String, Value>, ConstructError> {
		let mut rest = IndexMap::with_capacity(self.entries.len());
		for (name, value) in self.entries {
			match value {
				Resolved::Scalar(v) => {
					rest.insert(name, v);
				}
				other => {
					return Err(ConstructError::InvalidParam {
						element: self.element,
						param: name,
						expected: "a plain value",
						found: other.describe(),
					});
				}
			}
		}
		Ok(rest)
	}

	/// Fails if any argument was left unconsumed.
	pub fn finish(self) -> Result<(), ConstructError> {
		match self.entries.into_keys().next() {
			None => Ok(()),
			Some(param) => Err(ConstructError::UnexpectedParam {
				element: self.element,
				param,
			}),
		}
	}
}
