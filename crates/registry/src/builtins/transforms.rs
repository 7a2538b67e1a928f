use std::sync::Arc;

use parking_lot::Mutex;
use weir_primitives::{Fingerprint, Payload, Table};
use weir_reactive::{BoxError, Cache, Cached, Event, PropagationError, Signal, Subscription};

use super::watch;
use crate::def::element;
use crate::{Bounds, ConstructError, Constructor, DataProvider, ElementInit, Observable, ParamKind, ParamSpec, Transform};

element!(TABLE_TRANSFORM {
	tag: "table",
	type_name: "TableSelect",
	description: "Selects one keyed table of the upstream",
	params: &[
		ParamSpec::new("source", ParamKind::Source).hidden(),
		ParamSpec::scalar("table").doc("Key of the table to select").bounds(Bounds::Text),
	],
	ctor: Constructor::Transform(table_transform),
});

element!(SELECT_TRANSFORM {
	tag: "select",
	type_name: "SelectColumns",
	description: "Keeps the listed columns, in the given order",
	params: &[
		ParamSpec::new("source", ParamKind::Source).hidden(),
		ParamSpec::scalar("columns").doc("Column names to keep"),
	],
	ctor: Constructor::Transform(select_transform),
});

element!(SORT_TRANSFORM {
	tag: "sort",
	type_name: "SortRows",
	description: "Stable sort of rows by one column",
	params: &[
		ParamSpec::new("source", ParamKind::Source).hidden(),
		ParamSpec::scalar("by").doc("Column to sort by").bounds(Bounds::Text),
		ParamSpec::scalar("descending").bounds(Bounds::Toggle),
	],
	ctor: Constructor::Transform(sort_transform),
});

/// A payload-to-payload step applied by [`Derived`].
pub trait Operation: Send + Sync + 'static {
	const TAG: &'static str;

	/// Canonical rendering of the parameters; identical strings share cache entries.
	fn params(&self) -> String;

	/// Upstream key to read. `None` forwards the key the caller asked for.
	fn input_key(&self) -> Option<&str> {
		None
	}

	fn apply(&self, input: &Payload) -> Result<Payload, BoxError>;
}

/// Transform computing `O` over one upstream, memoized in the graph cache.
///
/// On an upstream update the output for the written key is recomputed eagerly before the
/// update is forwarded, so an operation failure is attributed to this transform.
pub struct Derived<O> {
	name: String,
	op: O,
	op_id: String,
	upstream: Option<Arc<dyn DataProvider>>,
	cache: Arc<Cache>,
	updated: Signal,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl<O: Operation> Derived<O> {
	pub fn new(name: impl Into<String>, op: O, upstream: Option<Arc<dyn DataProvider>>, cache: Arc<Cache>) -> Arc<Self> {
		let op_id = format!("{}:{}", O::TAG, op.params());
		let derived = Arc::new(Self {
			name: name.into(),
			op,
			op_id,
			upstream,
			cache,
			updated: Signal::new(),
			subscriptions: Mutex::new(Vec::new()),
		});
		if let Some(upstream) = &derived.upstream {
			let subs = watch(&derived, [upstream.updated()], Self::on_update);
			derived.subscriptions.lock().extend(subs);
		}
		derived
	}

	pub fn op(&self) -> &O {
		&self.op
	}

	/// Cache identity: `"{tag}:{params}"`.
	pub fn op_id(&self) -> &str {
		&self.op_id
	}

	fn compute(&self, key: Option<&str>) -> Result<Option<Cached>, BoxError> {
		let Some(upstream) = &self.upstream else {
			return Ok(None);
		};
		let key = self.op.input_key().or(key);
		let Some(input_fp) = upstream.fingerprint(key)? else {
			return Ok(None);
		};
		let cached = self.cache.get_or_compute(&self.op_id, &[input_fp], || -> Result<Payload, BoxError> {
			let input = upstream
				.data(key)?
				.ok_or_else(|| format!("{:?} has no data for {key:?}", upstream.name()))?;
			self.op.apply(&input)
		})?;
		Ok(Some(cached))
	}

	fn on_update(&self, event: &Event) -> Result<(), PropagationError> {
		self.compute(event.key())
			.map_err(|err| PropagationError::new(&self.name, event, err))?;
		self.updated.emit(&event.forwarded(&self.name))
	}
}

impl<O: Operation> Observable for Derived<O> {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}

impl<O: Operation> DataProvider for Derived<O> {
	fn data(&self, key: Option<&str>) -> Result<Option<Arc<Payload>>, BoxError> {
		Ok(self.compute(key)?.map(|c| c.output))
	}

	fn fingerprint(&self, key: Option<&str>) -> Result<Option<Fingerprint>, BoxError> {
		Ok(self.compute(key)?.map(|c| c.fingerprint))
	}
}

impl<O: Operation> Transform for Derived<O> {
	fn type_tag(&self) -> &'static str {
		O::TAG
	}
}

fn expect_table<'a>(op: &str, input: &'a Payload) -> Result<&'a Table, BoxError> {
	input
		.as_table()
		.ok_or_else(|| format!("{op} expects a table, got a {} payload", input.kind()).into())
}

/// Passes one keyed item of the upstream through unchanged.
#[derive(Debug, Clone)]
pub struct TableSelect {
	pub table: String,
}

impl Operation for TableSelect {
	const TAG: &'static str = "table";

	fn params(&self) -> String {
		format!("table={}", self.table)
	}

	fn input_key(&self) -> Option<&str> {
		Some(&self.table)
	}

	fn apply(&self, input: &Payload) -> Result<Payload, BoxError> {
		Ok(input.clone())
	}
}

#[derive(Debug, Clone)]
pub struct SelectColumns {
	pub columns: Vec<String>,
}

impl Operation for SelectColumns {
	const TAG: &'static str = "select";

	fn params(&self) -> String {
		format!("columns={}", self.columns.join(","))
	}

	fn apply(&self, input: &Payload) -> Result<Payload, BoxError> {
		let table = expect_table(Self::TAG, input)?;
		let names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
		Ok(table.select(&names)?.into())
	}
}

#[derive(Debug, Clone)]
pub struct SortRows {
	pub by: String,
	pub descending: bool,
}

impl Operation for SortRows {
	const TAG: &'static str = "sort";

	fn params(&self) -> String {
		format!("by={},descending={}", self.by, self.descending)
	}

	fn apply(&self, input: &Payload) -> Result<Payload, BoxError> {
		let table = expect_table(Self::TAG, input)?;
		Ok(table.sort_by(&self.by, self.descending)?.into())
	}
}

fn required(element: &str, param: &'static str) -> ConstructError {
	ConstructError::MissingParam {
		element: element.to_string(),
		param,
	}
}

fn table_transform(init: ElementInit) -> Result<Arc<dyn Transform>, ConstructError> {
	let ElementInit { name, mut kwargs, cache } = init;
	let upstream = kwargs.take_source("source")?;
	let table = kwargs.take_str("table")?.ok_or_else(|| required(&name, "table"))?;
	kwargs.finish()?;
	Ok(Derived::new(name, TableSelect { table }, upstream, cache))
}

fn select_transform(init: ElementInit) -> Result<Arc<dyn Transform>, ConstructError> {
	let ElementInit { name, mut kwargs, cache } = init;
	let upstream = kwargs.take_source("source")?;
	let columns = kwargs.take_strings("columns")?.ok_or_else(|| required(&name, "columns"))?;
	kwargs.finish()?;
	Ok(Derived::new(name, SelectColumns { columns }, upstream, cache))
}

fn sort_transform(init: ElementInit) -> Result<Arc<dyn Transform>, ConstructError> {
	let ElementInit { name, mut kwargs, cache } = init;
	let upstream = kwargs.take_source("source")?;
	let by = kwargs.take_str("by")?.ok_or_else(|| required(&name, "by"))?;
	let descending = kwargs.take_bool("descending")?.unwrap_or(false);
	kwargs.finish()?;
	Ok(Derived::new(name, SortRows { by, descending }, upstream, cache))
}
