use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use weir_primitives::Value;
use weir_reactive::{Cache, PropagationError, Source};

use crate::def::{Constructor, ElementDef, PanelInit};
use crate::element::{ControlPanel, DataProvider, Opt, Tool, Transform, View};
use crate::error::ConstructError;
use crate::kwargs::Kwargs;
use crate::logger::Logger;


/// Named element dictionaries of one constructed application.
#[derive(Default, Clone)]
pub struct Graph {
	pub sources: IndexMap<String, Arc<Source>>,
	pub transforms: IndexMap<String, Arc<dyn Transform>>,
	pub tools: IndexMap<String, Arc<dyn Tool>>,
	pub opts: IndexMap<String, Arc<dyn Opt>>,
	pub views: IndexMap<String, Arc<dyn View>>,
	pub loggers: IndexMap<String, Arc<Logger>>,
}

impl Graph {
	/// Looks `name` up among sources, then transforms.
	pub fn provider(&self, name: &str) -> Option<Arc<dyn DataProvider>> {
		if let Some(source) = self.sources.get(name) {
			return Some(source.clone());
		}
		self.transforms
			.get(name)
			.map(|t| t.clone() as Arc<dyn DataProvider>)
	}
}

impl fmt::Debug for Graph {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Graph")
			.field("sources", &self.sources.keys().collect::<Vec<_>>())
			.field("transforms", &self.transforms.keys().collect::<Vec<_>>())
			.field("tools", &self.tools.keys().collect::<Vec<_>>())
			.field("opts", &self.opts.keys().collect::<Vec<_>>())
			.field("views", &self.views.keys().collect::<Vec<_>>())
			.field("loggers", &self.loggers.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// A control panel waiting for its parent controller to exist.
#[derive(Debug)]
pub struct PendingPanel {
	pub name: String,
	pub def: &'static ElementDef,
	pub kwargs: Kwargs,
}

/// Inputs of a main controller constructor.
#[derive(Debug)]
pub struct MainInit {
	pub tag: &'static str,
	pub panels: Vec<PendingPanel>,
	pub graph: Graph,
	/// Keyword arguments of the `main_controller` section not consumed elsewhere.
	pub settings: IndexMap<String, Value>,
	pub cache: Arc<Cache>,
}

/// Non-owning reference from a control panel to its controller.
#[derive(Clone, Default)]
pub struct ParentHandle(Weak<MainController>);

impl ParentHandle {
	pub fn new(parent: Weak<MainController>) -> Self {
		Self(parent)
	}

	/// Returns the controller while it is alive. Always `None` during panel construction.
	pub fn upgrade(&self) -> Option<Arc<MainController>> {
		self.0.upgrade()
	}
}

impl fmt::Debug for ParentHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ParentHandle")
			.field(&(self.0.strong_count() > 0))
			.finish()
	}
}

/// Root of a constructed application: owns the element graph and the control panels.
pub struct MainController {
	tag: &'static str,
	graph: Graph,
	panels: IndexMap<String, Arc<dyn ControlPanel>>,
	settings: IndexMap<String, Value>,
	cache: Arc<Cache>,
}

impl MainController {
	/// Builds the controller, then instantiates each pending panel with a handle back to it.
	pub fn new(init: MainInit) -> Result<Arc<Self>, ConstructError> {
		let MainInit {
			tag,
			panels: pending,
			graph,
			settings,
			cache,
		} = init;

		let mut failure = None;
		let controller = Arc::new_cyclic(|weak: &Weak<Self>| {
			let mut panels: IndexMap<String, Arc<dyn ControlPanel>> = IndexMap::new();
			for panel in pending {
				match instantiate_panel(panel, weak) {
					Ok(built) => {
						panels.insert(built.name().to_string(), built);
					}
					Err(err) => {
						failure = Some(err);
						break;
					}
				}
			}
			Self {
				tag,
				graph,
				panels,
				settings,
				cache,
			}
		});

		match failure {
			Some(err) => Err(err),
			None => Ok(controller),
		}
	}

	pub fn type_tag(&self) -> &'static str {
		self.tag
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn sources(&self) -> &IndexMap<String, Arc<Source>> {
		&self.graph.sources
	}

	pub fn source(&self, name: &str) -> Option<&Arc<Source>> {
		self.graph.sources.get(name)
	}

	pub fn transforms(&self) -> &IndexMap<String, Arc<dyn Transform>> {
		&self.graph.transforms
	}

	pub fn transform(&self, name: &str) -> Option<&Arc<dyn Transform>> {
		self.graph.transforms.get(name)
	}

	pub fn tools(&self) -> &IndexMap<String, Arc<dyn Tool>> {
		&self.graph.tools
	}

	pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
		self.graph.tools.get(name)
	}

	pub fn opts(&self) -> &IndexMap<String, Arc<dyn Opt>> {
		&self.graph.opts
	}

	pub fn opt(&self, name: &str) -> Option<&Arc<dyn Opt>> {
		self.graph.opts.get(name)
	}

	pub fn views(&self) -> &IndexMap<String, Arc<dyn View>> {
		&self.graph.views
	}

	pub fn view(&self, name: &str) -> Option<&Arc<dyn View>> {
		self.graph.views.get(name)
	}

	pub fn loggers(&self) -> &IndexMap<String, Arc<Logger>> {
		&self.graph.loggers
	}

	pub fn logger(&self, name: &str) -> Option<&Arc<Logger>> {
		self.graph.loggers.get(name)
	}

	pub fn control_panels(&self) -> &IndexMap<String, Arc<dyn ControlPanel>> {
		&self.panels
	}

	pub fn control_panel(&self, name: &str) -> Option<&Arc<dyn ControlPanel>> {
		self.panels.get(name)
	}

	pub fn settings(&self) -> &IndexMap<String, Value> {
		&self.settings
	}

	pub fn setting(&self, name: &str) -> Option<&Value> {
		self.settings.get(name)
	}

	pub fn cache(&self) -> &Arc<Cache> {
		&self.cache
	}

	/// Refreshes every view in declaration order.
	pub fn update(&self) -> Result<(), PropagationError> {
		for view in self.graph.views.values() {
			view.update()?;
		}
		Ok(())
	}
}

fn instantiate_panel(panel: PendingPanel, parent: &Weak<MainController>) -> Result<Arc<dyn ControlPanel>, ConstructError> {
	let PendingPanel { name, def, kwargs } = panel;
	let Constructor::Controller(ctor) = def.ctor else {
		return Err(ConstructError::InvalidConfiguration(format!(
			"control panel {name:?} uses {} implementation {:?}",
			def.kind(),
			def.type_name
		)));
	};
	tracing::debug!(panel = %name, tag = def.tag, "instantiating control panel");
	ctor(PanelInit {
		name,
		kwargs,
		parent: ParentHandle::new(parent.clone()),
	})
}

impl fmt::Debug for MainController {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MainController")
			.field("tag", &self.tag)
			.field("graph", &self.graph)
			.field("panels", &self.panels.keys().collect::<Vec<_>>())
			.field("settings", &self.settings)
			.finish()
	}
}
