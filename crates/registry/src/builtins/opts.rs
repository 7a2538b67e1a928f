use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use weir_primitives::Value;
use weir_reactive::{Event, PropagationError, Signal};

use crate::def::element;
use crate::{ConstructError, Constructor, ElementInit, Observable, Opt};

element!(GENERIC_OPT {
	tag: "generic",
	type_name: "GenericOpt",
	description: "Every keyword argument becomes an option entry",
	params: &[],
	ctor: Constructor::Opt(generic_opt),
});

#[derive(Debug)]
pub struct GenericOpt {
	name: String,
	entries: RwLock<IndexMap<String, Value>>,
	updated: Signal,
}

impl GenericOpt {
	pub fn new(name: impl Into<String>, entries: IndexMap<String, Value>) -> Self {
		Self {
			name: name.into(),
			entries: RwLock::new(entries),
			updated: Signal::new(),
		}
	}
}

impl Observable for GenericOpt {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}

impl Opt for GenericOpt {
	fn type_tag(&self) -> &'static str {
		"generic"
	}

	fn opts(&self) -> IndexMap<String, Value> {
		self.entries.read().clone()
	}

	fn set(&self, key: &str, value: Value) -> Result<(), PropagationError> {
		self.entries.write().insert(key.to_string(), value);
		self.updated.emit(&Event::new(&self.name))
	}
}

fn generic_opt(init: ElementInit) -> Result<Arc<dyn Opt>, ConstructError> {
	let ElementInit { name, kwargs, .. } = init;
	let entries = kwargs.into_rest()?;
	Ok(Arc::new(GenericOpt::new(name, entries)))
}
