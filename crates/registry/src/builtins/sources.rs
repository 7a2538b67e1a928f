use std::sync::Arc;

use weir_primitives::PayloadKind;
use weir_reactive::Source;

use crate::def::element;
use crate::{Bounds, ConstructError, Constructor, ElementInit, ParamSpec};

const PARAMS: &[ParamSpec] = &[ParamSpec::scalar("max_items")
	.doc("Maximum number of items kept; the oldest is evicted first")
	.bounds(Bounds::Integer { min: Some(1), max: None })];

element!(TABLE_SOURCE {
	tag: "table",
	type_name: "TableSource",
	description: "Keyed tables",
	params: PARAMS,
	ctor: Constructor::Source(table_source),
});

element!(GENERIC_SOURCE {
	tag: "generic",
	type_name: "GenericSource",
	description: "Keyed payloads of any shape",
	params: PARAMS,
	ctor: Constructor::Source(generic_source),
});

fn build(init: ElementInit, accepts: Option<PayloadKind>) -> Result<Arc<Source>, ConstructError> {
	let ElementInit { name, mut kwargs, .. } = init;
	let max_items = kwargs.take_positive("max_items")?;
	kwargs.finish()?;

	let mut source = Source::new(name);
	if let Some(kind) = accepts {
		source = source.with_accepts(kind);
	}
	if let Some(max) = max_items {
		source = source.with_max_items(max);
	}
	Ok(Arc::new(source))
}

fn table_source(init: ElementInit) -> Result<Arc<Source>, ConstructError> {
	build(init, Some(PayloadKind::Table))
}

fn generic_source(init: ElementInit) -> Result<Arc<Source>, ConstructError> {
	build(init, None)
}
