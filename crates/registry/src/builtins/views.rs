use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use weir_primitives::{Payload, Value};
use weir_reactive::{BoxError, Event, PropagationError, Signal, Subscription};

use super::watch;
use crate::def::element;
use crate::{
	Bounds, ConstructError, Constructor, DataProvider, ElementInit, Level, Logger, Observable, Opt, ParamKind, ParamSpec,
	Record, RenderHandle, Tool, Tooltip, View, merge_opts,
};

element!(TABLE_VIEW {
	tag: "table",
	type_name: "TableView",
	description: "Latest upstream table",
	params: &[
		ParamSpec::new("source", ParamKind::Source).hidden(),
		ParamSpec::scalar("table").doc("Upstream key to display").bounds(Bounds::Text),
		ParamSpec::new("opts", ParamKind::Opts).hidden(),
		ParamSpec::new("tools", ParamKind::Tools).hidden(),
		ParamSpec::new("dependencies", ParamKind::Dependencies).hidden(),
	],
	ctor: Constructor::View(table_view),
});

element!(COMPARE_VIEW {
	tag: "compare",
	type_name: "CompareView",
	description: "Latest payloads of several upstreams side by side",
	params: &[
		ParamSpec::new("sources", ParamKind::Sources).doc("Upstream per role"),
		ParamSpec::new("opts", ParamKind::Opts).hidden(),
		ParamSpec::new("tools", ParamKind::Tools).hidden(),
	],
	ctor: Constructor::View(compare_view),
});

element!(LOGGING_VIEW {
	tag: "logging",
	type_name: "LoggingView",
	description: "Records of one logger at or above a level",
	params: &[
		ParamSpec::new("logger", ParamKind::Logger).hidden(),
		ParamSpec::scalar("level")
			.doc("Lowest level shown")
			.bounds(Bounds::Choice(&["trace", "debug", "info", "warn", "error"])),
		ParamSpec::new("dependencies", ParamKind::Dependencies).hidden(),
	],
	ctor: Constructor::View(logging_view),
});

element!(OVERLAY_VIEW {
	tag: "overlay",
	type_name: "OverlayView",
	description: "Composes other views",
	params: &[
		ParamSpec::new("views", ParamKind::Views).hidden(),
		ParamSpec::new("opts", ParamKind::Opts).hidden(),
	],
	ctor: Constructor::View(overlay_view),
});

/// Shared refresh plumbing of the builtin views.
trait Refresh: Observable {
	/// Re-reads upstream state. `event` is the notification being handled, if any.
	fn refresh(&self, event: Option<&Event>) -> Result<(), BoxError>;
}

fn on_update<V: Refresh>(view: &V, event: &Event) -> Result<(), PropagationError> {
	view.refresh(Some(event))
		.map_err(|err| PropagationError::new(view.name(), event, err))?;
	view.updated().emit(&event.forwarded(view.name()))
}

fn update_now<V: Refresh>(view: &V) -> Result<(), PropagationError> {
	view.refresh(None).map_err(|cause| PropagationError {
		element: view.name().to_string(),
		chain: vec![view.name().to_string()],
		cause,
	})?;
	view.updated().emit(&Event::new(view.name()))
}

fn tooltips_of(tools: &[Arc<dyn Tool>]) -> Vec<Tooltip> {
	tools.iter().flat_map(|t| t.tooltips().iter().cloned()).collect()
}

fn merged_or_empty(view: &str, opts: &[Arc<dyn Opt>]) -> IndexMap<String, Value> {
	merge_opts(view, opts).unwrap_or_else(|err| {
		tracing::warn!(view, error = %err, "rendering without opts");
		IndexMap::new()
	})
}

/// Render frame of a [`TableView`].
#[derive(Debug, Clone)]
pub struct TableFrame {
	pub view: String,
	pub payload: Option<Arc<Payload>>,
	pub opts: IndexMap<String, Value>,
	/// Tooltips of every attached tool, in order.
	pub tooltips: Vec<Tooltip>,
}

/// Holds the latest payload of its source.
///
/// Without a `table` key the view follows the item written last when its source holds
/// several.
///
/// When attached opts stop merging after an [`Opt::set`], frames carry no opts and
/// [`View::opts_dict`] reports the overlap.
pub struct TableView {
	name: String,
	source: Option<Arc<dyn DataProvider>>,
	key: Option<String>,
	opts: Vec<Arc<dyn Opt>>,
	tools: Vec<Arc<dyn Tool>>,
	latest: RwLock<Option<Arc<Payload>>>,
	refreshes: AtomicU64,
	updated: Signal,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl TableView {
	pub fn latest(&self) -> Option<Arc<Payload>> {
		self.latest.read().clone()
	}
}

impl Refresh for TableView {
	fn refresh(&self, event: Option<&Event>) -> Result<(), BoxError> {
		let data = match &self.source {
			Some(source) => {
				let written = event
					.filter(|e| e.emitter() == source.name())
					.and_then(Event::key);
				source.data(self.key.as_deref().or(written))?
			}
			None => None,
		};
		*self.latest.write() = data;
		self.refreshes.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}
}

impl Observable for TableView {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}

impl View for TableView {
	fn type_tag(&self) -> &'static str {
		"table"
	}

	fn update(&self) -> Result<(), PropagationError> {
		update_now(self)
	}

	fn refresh_count(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	fn render(&self) -> RenderHandle {
		Arc::new(TableFrame {
			view: self.name.clone(),
			payload: self.latest(),
			opts: merged_or_empty(&self.name, &self.opts),
			tooltips: tooltips_of(&self.tools),
		})
	}

	fn tools(&self) -> &[Arc<dyn Tool>] {
		&self.tools
	}

	fn opts_dict(&self) -> Result<IndexMap<String, Value>, ConstructError> {
		merge_opts(&self.name, &self.opts)
	}
}

fn table_view(init: ElementInit) -> Result<Arc<dyn View>, ConstructError> {
	let ElementInit { name, mut kwargs, .. } = init;
	let source = kwargs.take_source("source")?;
	let key = kwargs.take_str("table")?;
	let opts = kwargs.take_opts("opts")?;
	let tools = kwargs.take_tools("tools")?;
	let dependencies = kwargs.take_dependencies("dependencies")?;
	kwargs.finish()?;
	merge_opts(&name, &opts)?;

	let view = Arc::new(TableView {
		name,
		source,
		key,
		opts,
		tools,
		latest: RwLock::new(None),
		refreshes: AtomicU64::new(0),
		updated: Signal::new(),
		subscriptions: Mutex::new(Vec::new()),
	});
	let signals = view
		.source
		.iter()
		.map(|s| s.updated())
		.chain(view.opts.iter().map(|o| o.updated()))
		.chain(dependencies.iter().map(|d| d.updated()));
	let subs = watch(&view, signals, on_update::<TableView>);
	view.subscriptions.lock().extend(subs);
	Ok(view)
}

/// Render frame of a [`CompareView`]: the latest payload per role.
#[derive(Debug, Clone)]
pub struct CompareFrame {
	pub view: String,
	pub payloads: IndexMap<String, Option<Arc<Payload>>>,
	pub opts: IndexMap<String, Value>,
	pub tooltips: Vec<Tooltip>,
}

/// Shows several upstreams side by side, one per role.
///
/// A notification re-reads only the role whose upstream emitted it; an explicit update
/// re-reads every role.
///
/// When attached opts stop merging after an [`Opt::set`], frames carry no opts and
/// [`View::opts_dict`] reports the overlap.
pub struct CompareView {
	name: String,
	roles: IndexMap<String, Arc<dyn DataProvider>>,
	opts: Vec<Arc<dyn Opt>>,
	tools: Vec<Arc<dyn Tool>>,
	latest: RwLock<IndexMap<String, Option<Arc<Payload>>>>,
	refreshes: AtomicU64,
	updated: Signal,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl CompareView {
	pub fn roles(&self) -> impl Iterator<Item = (&str, &Arc<dyn DataProvider>)> {
		self.roles.iter().map(|(role, provider)| (role.as_str(), provider))
	}

	pub fn latest(&self, role: &str) -> Option<Arc<Payload>> {
		self.latest.read().get(role).cloned().flatten()
	}
}

impl Refresh for CompareView {
	fn refresh(&self, event: Option<&Event>) -> Result<(), BoxError> {
		let mut read = IndexMap::new();
		for (role, provider) in &self.roles {
			match event {
				None => {
					read.insert(role.clone(), provider.data(None)?);
				}
				Some(event) if event.emitter() == provider.name() => {
					read.insert(role.clone(), provider.data(event.key())?);
				}
				Some(_) => {}
			}
		}
		self.latest.write().extend(read);
		self.refreshes.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}
}

impl Observable for CompareView {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}

impl View for CompareView {
	fn type_tag(&self) -> &'static str {
		"compare"
	}

	fn update(&self) -> Result<(), PropagationError> {
		update_now(self)
	}

	fn refresh_count(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	fn render(&self) -> RenderHandle {
		Arc::new(CompareFrame {
			view: self.name.clone(),
			payloads: self.latest.read().clone(),
			opts: merged_or_empty(&self.name, &self.opts),
			tooltips: tooltips_of(&self.tools),
		})
	}

	fn tools(&self) -> &[Arc<dyn Tool>] {
		&self.tools
	}

	fn opts_dict(&self) -> Result<IndexMap<String, Value>, ConstructError> {
		merge_opts(&self.name, &self.opts)
	}
}

fn compare_view(init: ElementInit) -> Result<Arc<dyn View>, ConstructError> {
	let ElementInit { name, mut kwargs, .. } = init;
	let roles = kwargs.take_sources("sources")?;
	let opts = kwargs.take_opts("opts")?;
	let tools = kwargs.take_tools("tools")?;
	kwargs.finish()?;
	merge_opts(&name, &opts)?;

	let latest = roles.keys().map(|role| (role.clone(), None)).collect();
	let view = Arc::new(CompareView {
		name,
		roles,
		opts,
		tools,
		latest: RwLock::new(latest),
		refreshes: AtomicU64::new(0),
		updated: Signal::new(),
		subscriptions: Mutex::new(Vec::new()),
	});
	let signals = view
		.roles
		.values()
		.map(|p| p.updated())
		.chain(view.opts.iter().map(|o| o.updated()));
	let subs = watch(&view, signals, on_update::<CompareView>);
	view.subscriptions.lock().extend(subs);
	Ok(view)
}

/// Render frame of a [`LoggingView`].
#[derive(Debug, Clone)]
pub struct LogFrame {
	pub view: String,
	pub records: Vec<Record>,
}

/// Shows the records of one logger at or above a level.
pub struct LoggingView {
	name: String,
	logger: Option<Arc<Logger>>,
	level: Level,
	records: RwLock<Vec<Record>>,
	refreshes: AtomicU64,
	updated: Signal,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl LoggingView {
	pub fn level(&self) -> Level {
		self.level
	}

	pub fn records(&self) -> Vec<Record> {
		self.records.read().clone()
	}
}

impl Refresh for LoggingView {
	fn refresh(&self, _event: Option<&Event>) -> Result<(), BoxError> {
		let records = match &self.logger {
			Some(logger) => logger
				.records()
				.into_iter()
				.filter(|r| r.level >= self.level)
				.collect(),
			None => Vec::new(),
		};
		*self.records.write() = records;
		self.refreshes.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}
}

impl Observable for LoggingView {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}

impl View for LoggingView {
	fn type_tag(&self) -> &'static str {
		"logging"
	}

	fn update(&self) -> Result<(), PropagationError> {
		update_now(self)
	}

	fn refresh_count(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	fn render(&self) -> RenderHandle {
		Arc::new(LogFrame {
			view: self.name.clone(),
			records: self.records(),
		})
	}
}

fn logging_view(init: ElementInit) -> Result<Arc<dyn View>, ConstructError> {
	let ElementInit { name, mut kwargs, .. } = init;
	let logger = kwargs.take_logger("logger")?;
	let level = match kwargs.take_scalar("level")? {
		None | Some(Value::Null) => Level::Info,
		Some(value) => Level::from_value(&value).ok_or_else(|| ConstructError::InvalidParam {
			element: name.clone(),
			param: "level".to_string(),
			expected: "a log level",
			found: value.to_string(),
		})?,
	};
	let dependencies = kwargs.take_dependencies("dependencies")?;
	kwargs.finish()?;

	let view = Arc::new(LoggingView {
		name,
		logger,
		level,
		records: RwLock::new(Vec::new()),
		refreshes: AtomicU64::new(0),
		updated: Signal::new(),
		subscriptions: Mutex::new(Vec::new()),
	});
	let signals = view
		.logger
		.iter()
		.map(|l| l.updated())
		.chain(dependencies.iter().map(|d| d.updated()));
	let subs = watch(&view, signals, on_update::<LoggingView>);
	view.subscriptions.lock().extend(subs);
	Ok(view)
}

/// Render frame of an [`OverlayView`]: the members' frames in order.
#[derive(Clone)]
pub struct OverlayFrame {
	pub view: String,
	pub members: Vec<RenderHandle>,
	pub opts: IndexMap<String, Value>,
}

/// Composes other views and refreshes whenever one of them does.
///
/// When attached opts stop merging after an [`Opt::set`], frames carry no opts and
/// [`View::opts_dict`] reports the overlap.
pub struct OverlayView {
	name: String,
	views: Vec<Arc<dyn View>>,
	opts: Vec<Arc<dyn Opt>>,
	refreshes: AtomicU64,
	updated: Signal,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl OverlayView {
	pub fn members(&self) -> &[Arc<dyn View>] {
		&self.views
	}
}

impl Refresh for OverlayView {
	fn refresh(&self, _event: Option<&Event>) -> Result<(), BoxError> {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}
}

impl Observable for OverlayView {
	fn name(&self) -> &str {
		&self.name
	}

	fn updated(&self) -> &Signal {
		&self.updated
	}
}

impl View for OverlayView {
	fn type_tag(&self) -> &'static str {
		"overlay"
	}

	fn update(&self) -> Result<(), PropagationError> {
		update_now(self)
	}

	fn refresh_count(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	fn render(&self) -> RenderHandle {
		Arc::new(OverlayFrame {
			view: self.name.clone(),
			members: self.views.iter().map(|v| v.render()).collect(),
			opts: merged_or_empty(&self.name, &self.opts),
		})
	}

	fn opts_dict(&self) -> Result<IndexMap<String, Value>, ConstructError> {
		merge_opts(&self.name, &self.opts)
	}
}

fn overlay_view(init: ElementInit) -> Result<Arc<dyn View>, ConstructError> {
	let ElementInit { name, mut kwargs, .. } = init;
	let views = kwargs.take_views("views")?;
	let opts = kwargs.take_opts("opts")?;
	kwargs.finish()?;
	merge_opts(&name, &opts)?;

	let view = Arc::new(OverlayView {
		name,
		views,
		opts,
		refreshes: AtomicU64::new(0),
		updated: Signal::new(),
		subscriptions: Mutex::new(Vec::new()),
	});
	let signals = view
		.views
		.iter()
		.map(|v| v.updated())
		.chain(view.opts.iter().map(|o| o.updated()));
	let subs = watch(&view, signals, on_update::<OverlayView>);
	view.subscriptions.lock().extend(subs);
	Ok(view)
}
