use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use weir_primitives::{Fingerprint, Payload, Value};
use weir_reactive::{BoxError, PropagationError, Signal, Source};

use crate::ConstructError;
use crate::kwargs::Tooltip;
use crate::param::ParamSpec;
use crate::widgets::{WidgetFactory, generate_widgets};

/// Opaque render object handed to the host. The core never inspects it.
pub type RenderHandle = Arc<dyn Any + Send + Sync>;

/// Anything with a name and an "updated" signal.
pub trait Observable: Send + Sync {
	fn name(&self) -> &str;
	fn updated(&self) -> &Signal;
}

/// An element views and transforms can read data from: a source or a transform.
pub trait DataProvider: Observable {
	/// Current output addressed by `key`, `None` when there is nothing yet.
	fn data(&self, key: Option<&str>) -> Result<Option<Arc<Payload>>, BoxError>;

	fn fingerprint(&self, key: Option<&str>) -> Result<Option<Fingerprint>, BoxError>;
}

pub trait Transform: DataProvider {
	fn type_tag(&self) -> &'static str;
}

pub trait Tool: Send + Sync {
	fn name(&self) -> &str;

	fn type_tag(&self) -> &'static str;

	fn tooltips(&self) -> &[Tooltip] {
		&[]
	}
}

/// A named bundle of visual options.
pub trait Opt: Observable {
	fn type_tag(&self) -> &'static str;

	/// Snapshot of the option entries, in declaration order.
	fn opts(&self) -> IndexMap<String, Value>;

	/// Replaces one entry and fires "updated".
	fn set(&self, key: &str, value: Value) -> Result<(), PropagationError>;
}

/// A display element. Its "updated" signal fires after every refresh.
pub trait View: Observable {
	fn type_tag(&self) -> &'static str;

	/// Re-reads upstream data and notifies downstream.
	fn update(&self) -> Result<(), PropagationError>;

	/// Number of refreshes since construction.
	fn refresh_count(&self) -> u64;

	fn render(&self) -> RenderHandle;

	/// Tools attached to the view, in declaration order.
	fn tools(&self) -> &[Arc<dyn Tool>] {
		&[]
	}

	/// Merged option entries of every attached opt.
	fn opts_dict(&self) -> Result<IndexMap<String, Value>, ConstructError> {
		Ok(IndexMap::new())
	}
}

/// Interactive panel owned by the main controller.
pub trait ControlPanel: Send + Sync {
	fn name(&self) -> &str;

	fn type_tag(&self) -> &'static str;

	fn header(&self) -> &str;

	/// Declared parameters, used for widget generation.
	fn params(&self) -> &'static [ParamSpec];

	/// Parameter names left out of generated widgets.
	fn excluded(&self) -> &[&str] {
		&[]
	}

	fn render(&self) -> RenderHandle;

	fn as_any(&self) -> &dyn Any;
}

impl dyn ControlPanel {
	pub fn downcast_ref<T: ControlPanel + 'static>(&self) -> Option<&T> {
		self.as_any().downcast_ref::<T>()
	}

	/// Widgets for every visible, non-excluded parameter.
	pub fn widgets<F: WidgetFactory>(&self, factory: &F) -> IndexMap<&'static str, F::Widget> {
		generate_widgets(self.params(), self.excluded(), factory)
	}
}

/// Merges opt dictionaries in order.
///
/// Overlapping keys whose values are both lists are concatenated; any other overlap is an
/// error naming the opt and the view.
pub fn merge_opts(view: &str, opts: &[Arc<dyn Opt>]) -> Result<IndexMap<String, Value>, ConstructError> {
	let mut merged: IndexMap<String, Value> = IndexMap::new();
	for opt in opts {
		for (key, value) in opt.opts() {
			let Some(existing) = merged.get_mut(&key) else {
				merged.insert(key, value);
				continue;
			};
			match (existing, value) {
				(Value::List(existing), Value::List(more)) => existing.extend(more),
				_ => {
					return Err(ConstructError::InvalidConfiguration(format!(
						"overlapping key {key:?} in opt {:?} on view {view:?}",
						opt.name()
					)));
				}
			}
		}
	}
	Ok(merged)
}

impl Observable for Source {
	fn name(&self) -> &str {
		Source::name(self)
	}

	fn updated(&self) -> &Signal {
		Source::updated(self)
	}
}

impl DataProvider for Source {
	fn data(&self, key: Option<&str>) -> Result<Option<Arc<Payload>>, BoxError> {
		Ok(self.get(key)?)
	}

	fn fingerprint(&self, key: Option<&str>) -> Result<Option<Fingerprint>, BoxError> {
		Ok(Source::fingerprint(self, key)?)
	}
}
