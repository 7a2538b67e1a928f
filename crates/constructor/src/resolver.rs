use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap as HashMap;
use weir_primitives::Value;
use weir_reactive::Cache;
use weir_registry::{
	Constructor, ElementDef, ElementInit, ElementKind, ErrorPolicy, Graph, Kwargs, Logger, MainController,
	MainInit, Observable, Opt, ParamKind, ParamSpec, PendingPanel, Registry, Resolved, Tooltip,
};

use crate::error::{Origin, ParseError};

/// Element sections in construction order. Later sections may reference earlier ones.
const ELEMENT_KINDS: [ElementKind; 5] = [
	ElementKind::Source,
	ElementKind::Transform,
	ElementKind::Tool,
	ElementKind::Opt,
	ElementKind::View,
];

const DEFAULT_MAIN: &str = "base";

/// Name used for the main controller entry in errors.
const MAIN_ELEMENT: &str = "main";

/// Lookup target of `source` and `sources` references.
const PROVIDERS: &str = "sources or transforms";

type Declared<'s> = Vec<(ElementKind, Vec<(&'s str, &'s Value)>)>;

/// State of a single `parse` call.
pub(crate) struct SpecResolver<'r> {
	registry: &'r Registry,
	policy: ErrorPolicy,
	cache: Arc<Cache>,
	graph: Graph,
	origins: HashMap<(ElementKind, String), Origin>,
	/// Elements constructed so far; suffix of anonymous opt names.
	created: usize,
}

/// The keyword argument being resolved, for error reporting.
struct Site<'a> {
	section: &'static str,
	element: &'a str,
	param: &'a str,
}

impl Site<'_> {
	fn invalid(&self, reason: impl fmt::Display) -> ParseError {
		ParseError::invalid(self.section, self.element, format!("parameter {:?}: {reason}", self.param))
	}

	fn expected(&self, expected: impl fmt::Display, found: &Value) -> ParseError {
		self.invalid(format!("expected {expected}, got {}", found.type_name()))
	}

	fn unresolved(&self, target: &'static str, reference: &str) -> ParseError {
		ParseError::UnresolvedReference {
			section: self.section,
			element: self.element.to_string(),
			param: self.param.to_string(),
			target,
			reference: reference.to_string(),
		}
	}
}

impl<'r> SpecResolver<'r> {
	pub(crate) fn new(
		registry: &'r Registry,
		policy: ErrorPolicy,
		cache: Arc<Cache>,
		loggers: IndexMap<String, Arc<Logger>>,
	) -> Self {
		Self {
			registry,
			policy,
			cache,
			graph: Graph {
				loggers,
				..Graph::default()
			},
			origins: HashMap::default(),
			created: 0,
		}
	}

	pub(crate) fn run(mut self, spec: &Value) -> Result<Arc<MainController>, ParseError> {
		let root = match spec {
			Value::Map(root) => root,
			other => {
				return Err(ParseError::invalid(
					"specification",
					"root",
					format!("expected a mapping, got {}", other.type_name()),
				));
			}
		};

		for (kind, entries) in self.declare(root)? {
			for (name, body) in entries {
				self.create(kind, name, body)?;
			}
		}
		let panels = self.panels(root.get(ElementKind::Controller.section()))?;
		self.main(root.get(ElementKind::Main.section()), panels)
	}

	/// Collects the element entries of every module and of the top level, claiming their names.
	fn declare<'s>(&mut self, root: &'s IndexMap<String, Value>) -> Result<Declared<'s>, ParseError> {
		let mut layers = Vec::new();
		if let Some(modules) = root.get("modules").map(|m| entries_of(m, "modules")).transpose()?.flatten() {
			for (module, body) in modules {
				let Value::Map(body) = body else {
					return Err(ParseError::invalid(
						"modules",
						module,
						format!("expected a mapping of sections, got {}", body.type_name()),
					));
				};
				layers.push((Origin::Module(module.clone()), body));
			}
		}
		layers.push((Origin::TopLevel, root));

		let mut declared = Vec::with_capacity(ELEMENT_KINDS.len());
		for kind in ELEMENT_KINDS {
			let section = kind.section();
			let mut entries = Vec::new();
			for (origin, layer) in &layers {
				let Some(map) = layer.get(section).map(|s| entries_of(s, section)).transpose()?.flatten() else {
					continue;
				};
				for (name, body) in map {
					self.claim(kind, name, origin.clone())?;
					entries.push((name.as_str(), body));
				}
			}
			declared.push((kind, entries));
		}
		Ok(declared)
	}

	fn claim(&mut self, kind: ElementKind, name: &str, origin: Origin) -> Result<(), ParseError> {
		match self.origins.entry((kind, name.to_string())) {
			Entry::Occupied(existing) => Err(ParseError::NameConflict {
				section: kind.section(),
				name: name.to_string(),
				existing: existing.get().clone(),
				incoming: origin,
			}),
			Entry::Vacant(slot) => {
				slot.insert(origin);
				Ok(())
			}
		}
	}

	/// Constructs one element entry and inserts it into its section of the graph.
	fn create(&mut self, kind: ElementKind, name: &str, body: &Value) -> Result<(), ParseError> {
		let section = kind.section();
		let body = mapping(body, section, name)?;
		let def = self.def_for(kind, name, body)?;
		if matches!(kind, ElementKind::Transform | ElementKind::View) && !body.contains_key("source") {
			tracing::warn!(section, element = name, "the field 'source' is not specified");
		}

		let kwargs = self.resolve_kwargs(kind, name, def, body)?;
		let init = ElementInit {
			name: name.to_string(),
			kwargs,
			cache: self.cache.clone(),
		};
		let construct = |cause| ParseError::Construct {
			section,
			element: name.to_string(),
			cause,
		};
		let key = name.to_string();
		match def.ctor {
			Constructor::Source(ctor) => {
				self.graph.sources.insert(key, ctor(init).map_err(construct)?);
			}
			Constructor::Transform(ctor) => {
				self.graph.transforms.insert(key, ctor(init).map_err(construct)?);
			}
			Constructor::Tool(ctor) => {
				self.graph.tools.insert(key, ctor(init).map_err(construct)?);
			}
			Constructor::Opt(ctor) => {
				self.graph.opts.insert(key, ctor(init).map_err(construct)?);
			}
			Constructor::View(ctor) => {
				self.graph.views.insert(key, ctor(init).map_err(construct)?);
			}
			Constructor::Controller(_) | Constructor::Main(_) => {
				return Err(ParseError::invalid(
					section,
					name,
					format!("type {:?} is a {} implementation", def.tag, def.kind()),
				));
			}
		}

		self.created += 1;
		tracing::trace!(section, element = name, tag = def.tag, "constructed element");
		Ok(())
	}

	fn def_for(
		&self,
		kind: ElementKind,
		name: &str,
		body: &IndexMap<String, Value>,
	) -> Result<&'static ElementDef, ParseError> {
		let section = kind.section();
		let tag = match body.get("type") {
			Some(Value::String(tag)) => tag,
			Some(other) => {
				return Err(ParseError::invalid(
					section,
					name,
					format!("field 'type' must be a string, got {}", other.type_name()),
				));
			}
			None => {
				return Err(ParseError::MissingTypeField {
					section,
					element: name.to_string(),
				});
			}
		};
		self.resolve_tag(kind, name, tag)
	}

	fn resolve_tag(&self, kind: ElementKind, name: &str, tag: &str) -> Result<&'static ElementDef, ParseError> {
		self.registry.resolve(kind, tag).map_err(|_| ParseError::UnknownType {
			section: kind.section(),
			element: name.to_string(),
			tag: tag.to_string(),
		})
	}

	fn resolve_kwargs(
		&mut self,
		kind: ElementKind,
		name: &str,
		def: &ElementDef,
		body: &IndexMap<String, Value>,
	) -> Result<Kwargs, ParseError> {
		let mut kwargs = Kwargs::new(name);
		for (param, raw) in body.iter().filter(|(param, _)| *param != "type") {
			let site = Site {
				section: kind.section(),
				element: name,
				param,
			};
			let resolved = match ParamSpec::kind_of(def.params, param) {
				ParamKind::Source => self.source(&site, raw)?,
				ParamKind::Sources => self.sources(&site, raw)?,
				ParamKind::Opts => self.opts(&site, raw)?,
				ParamKind::Views => Resolved::Views(self.lookup(&site, &self.graph.views, "views", raw)?),
				ParamKind::Tools => Resolved::Tools(self.lookup(&site, &self.graph.tools, "tools", raw)?),
				ParamKind::Dependencies => self.dependencies(&site, raw)?,
				ParamKind::Logger => match self.logger(&site, raw)? {
					Some(logger) => logger,
					None => continue,
				},
				ParamKind::Tooltips => tooltips(&site, raw)?,
				ParamKind::Scalar => Resolved::Scalar(raw.clone()),
			};
			kwargs.insert(param.clone(), resolved);
		}
		Ok(kwargs)
	}

	/// Applies the error policy to a reference that could not be resolved.
	fn tolerate(&self, err: ParseError) -> Result<(), ParseError> {
		match self.policy {
			ErrorPolicy::Raise => Err(err),
			ErrorPolicy::Warn => {
				tracing::warn!(error = %err, "dropping unresolved reference");
				Ok(())
			}
			ErrorPolicy::Ignore => Ok(()),
		}
	}

	fn source(&self, site: &Site<'_>, raw: &Value) -> Result<Resolved, ParseError> {
		match raw {
			Value::Null => Ok(Resolved::Source(None)),
			Value::String(reference) => match self.graph.provider(reference) {
				Some(provider) => Ok(Resolved::Source(Some(provider))),
				None => {
					self.tolerate(site.unresolved(PROVIDERS, reference))?;
					Ok(Resolved::Source(None))
				}
			},
			other => Err(site.expected("a source name", other)),
		}
	}

	fn sources(&self, site: &Site<'_>, raw: &Value) -> Result<Resolved, ParseError> {
		let Value::Map(roles) = raw else {
			return Err(site.expected("a mapping of source names", raw));
		};
		let mut resolved = IndexMap::with_capacity(roles.len());
		for (role, reference) in roles {
			let Some(reference) = reference.as_str() else {
				return Err(site.expected("a mapping of source names", reference));
			};
			match self.graph.provider(reference) {
				Some(provider) => {
					resolved.insert(role.clone(), provider);
				}
				None => self.tolerate(site.unresolved(PROVIDERS, reference))?,
			}
		}
		Ok(Resolved::Sources(resolved))
	}

	fn opts(&mut self, site: &Site<'_>, raw: &Value) -> Result<Resolved, ParseError> {
		let items = match raw {
			Value::List(items) => items.as_slice(),
			single => std::slice::from_ref(single),
		};
		let mut opts = Vec::with_capacity(items.len());
		for item in items {
			match item {
				Value::String(reference) => match self.graph.opts.get(reference) {
					Some(opt) => opts.push(opt.clone()),
					None => self.tolerate(site.unresolved("opts", reference))?,
				},
				Value::Map(inline) => opts.push(self.inline_opt(site, inline)?),
				other => return Err(site.expected("opt names or inline opt definitions", other)),
			}
		}
		Ok(Resolved::Opts(opts))
	}

	/// Constructs `{key: {type: …}}` as a uniquely named opt and adds it to the graph.
	fn inline_opt(&mut self, site: &Site<'_>, inline: &IndexMap<String, Value>) -> Result<Arc<dyn Opt>, ParseError> {
		let Some((key, body)) = inline.first().filter(|_| inline.len() == 1) else {
			return Err(site.invalid(format!(
				"inline opt definitions take exactly one key, got {}",
				inline.len()
			)));
		};
		let name = format!("{key}_{:05}", self.created);
		self.claim(
			ElementKind::Opt,
			&name,
			Origin::Inline {
				owner: site.element.to_string(),
			},
		)?;
		self.create(ElementKind::Opt, &name, body)?;
		self.graph
			.opts
			.get(&name)
			.cloned()
			.ok_or_else(|| site.invalid(format!("inline opt {name:?} was not constructed")))
	}

	fn lookup<T: Clone>(
		&self,
		site: &Site<'_>,
		dict: &IndexMap<String, T>,
		target: &'static str,
		raw: &Value,
	) -> Result<Vec<T>, ParseError> {
		let names = names(raw).ok_or_else(|| site.expected(format!("a name or a list of {target} names"), raw))?;
		let mut found = Vec::with_capacity(names.len());
		for reference in names {
			match dict.get(reference) {
				Some(item) => found.push(item.clone()),
				None => self.tolerate(site.unresolved(target, reference))?,
			}
		}
		Ok(found)
	}

	fn dependencies(&self, site: &Site<'_>, raw: &Value) -> Result<Resolved, ParseError> {
		let Value::Map(sections) = raw else {
			return Err(site.expected("a mapping of section to element names", raw));
		};
		let graph = &self.graph;
		let mut watched: Vec<Arc<dyn Observable>> = Vec::new();
		for (section, names) in sections {
			match section.as_str() {
				"sources" => watched.extend(
					self.lookup(site, &graph.sources, "sources", names)?
						.into_iter()
						.map(|s| s as Arc<dyn Observable>),
				),
				"transforms" => watched.extend(
					self.lookup(site, &graph.transforms, "transforms", names)?
						.into_iter()
						.map(|t| t as Arc<dyn Observable>),
				),
				"opts" => watched.extend(
					self.lookup(site, &graph.opts, "opts", names)?
						.into_iter()
						.map(|o| o as Arc<dyn Observable>),
				),
				"views" => watched.extend(
					self.lookup(site, &graph.views, "views", names)?
						.into_iter()
						.map(|v| v as Arc<dyn Observable>),
				),
				"loggers" => watched.extend(
					self.lookup(site, &graph.loggers, "loggers", names)?
						.into_iter()
						.map(|l| l as Arc<dyn Observable>),
				),
				other => {
					return Err(site.invalid(format!(
						"unknown dependency section {other:?} (expected sources, transforms, opts, views or loggers)"
					)));
				}
			}
		}
		Ok(Resolved::Dependencies(watched))
	}

	fn logger(&self, site: &Site<'_>, raw: &Value) -> Result<Option<Resolved>, ParseError> {
		let reference = raw.as_str().ok_or_else(|| site.expected("a logger name", raw))?;
		match self.graph.loggers.get(reference) {
			Some(logger) => Ok(Some(Resolved::Logger(logger.clone()))),
			None => {
				self.tolerate(site.unresolved("loggers", reference))?;
				Ok(None)
			}
		}
	}

	/// Resolves the `controllers` section into panels the main controller instantiates.
	///
	/// A list of tags is shorthand for `{tag: {type: tag}}`.
	fn panels(&mut self, controllers: Option<&Value>) -> Result<Vec<PendingPanel>, ParseError> {
		let kind = ElementKind::Controller;
		let section = kind.section();
		let entries: Vec<(String, Value)> = match controllers {
			None | Some(Value::Null) => return Ok(Vec::new()),
			Some(Value::List(tags)) => tags
				.iter()
				.map(|tag| match tag {
					Value::String(tag) => {
						let body = IndexMap::from([("type".to_string(), Value::from(tag.as_str()))]);
						Ok((tag.clone(), Value::Map(body)))
					}
					other => Err(ParseError::invalid(
						section,
						section,
						format!("expected controller type names, got {}", other.type_name()),
					)),
				})
				.collect::<Result<_, _>>()?,
			Some(Value::Map(map)) => map.iter().map(|(name, body)| (name.clone(), body.clone())).collect(),
			Some(other) => {
				return Err(ParseError::invalid(
					section,
					section,
					format!("expected a list or a mapping, got {}", other.type_name()),
				));
			}
		};

		let mut panels = Vec::with_capacity(entries.len());
		for (name, body) in entries {
			self.claim(kind, &name, Origin::TopLevel)?;
			let body = mapping(&body, section, &name)?;
			let def = self.def_for(kind, &name, body)?;
			let kwargs = self.resolve_kwargs(kind, &name, def, body)?;
			panels.push(PendingPanel { name, def, kwargs });
		}
		Ok(panels)
	}

	fn main(mut self, spec: Option<&Value>, panels: Vec<PendingPanel>) -> Result<Arc<MainController>, ParseError> {
		let kind = ElementKind::Main;
		let section = kind.section();
		let (def, kwargs) = match spec {
			None | Some(Value::Null) => (self.resolve_tag(kind, MAIN_ELEMENT, DEFAULT_MAIN)?, Kwargs::new(MAIN_ELEMENT)),
			Some(body) => {
				let body = mapping(body, section, MAIN_ELEMENT)?;
				let def = self.def_for(kind, MAIN_ELEMENT, body)?;
				let kwargs = self.resolve_kwargs(kind, MAIN_ELEMENT, def, body)?;
				(def, kwargs)
			}
		};

		let construct = |cause| ParseError::Construct {
			section,
			element: MAIN_ELEMENT.to_string(),
			cause,
		};
		let Constructor::Main(ctor) = def.ctor else {
			return Err(ParseError::invalid(
				section,
				MAIN_ELEMENT,
				format!("type {:?} is a {} implementation", def.tag, def.kind()),
			));
		};
		let settings = kwargs.into_rest().map_err(construct)?;

		tracing::debug!(
			sources = self.graph.sources.len(),
			transforms = self.graph.transforms.len(),
			tools = self.graph.tools.len(),
			opts = self.graph.opts.len(),
			views = self.graph.views.len(),
			panels = panels.len(),
			main = def.tag,
			"constructing main controller"
		);
		let graph = std::mem::take(&mut self.graph);
		ctor(MainInit {
			tag: def.tag,
			panels,
			graph,
			settings,
			cache: self.cache,
		})
		.map_err(construct)
	}
}

/// Entries of a section; `null` counts as an empty section.
fn entries_of<'s>(value: &'s Value, section: &'static str) -> Result<Option<&'s IndexMap<String, Value>>, ParseError> {
	match value {
		Value::Null => Ok(None),
		Value::Map(entries) => Ok(Some(entries)),
		other => Err(ParseError::invalid(
			section,
			section,
			format!("expected a mapping of named entries, got {}", other.type_name()),
		)),
	}
}

fn mapping<'s>(body: &'s Value, section: &'static str, name: &str) -> Result<&'s IndexMap<String, Value>, ParseError> {
	body.as_map().ok_or_else(|| {
		ParseError::invalid(
			section,
			name,
			format!("expected a mapping with a 'type' field, got {}", body.type_name()),
		)
	})
}

/// A single name or a list of names.
fn names(raw: &Value) -> Option<Vec<&str>> {
	match raw {
		Value::String(name) => Some(vec![name.as_str()]),
		Value::List(items) => items.iter().map(Value::as_str).collect(),
		_ => None,
	}
}

fn tooltips(site: &Site<'_>, raw: &Value) -> Result<Resolved, ParseError> {
	let items = raw
		.as_list()
		.ok_or_else(|| site.expected("a list of [label, field] pairs", raw))?;
	items
		.iter()
		.map(|item| match item.as_list() {
			Some([Value::String(label), Value::String(field)]) => Ok((label.clone(), field.clone())),
			_ => Err(site.expected("a [label, field] pair of strings", item)),
		})
		.collect::<Result<Vec<Tooltip>, _>>()
		.map(Resolved::Tooltips)
}
