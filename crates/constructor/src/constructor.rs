use std::sync::Arc;

use indexmap::IndexMap;
use weir_primitives::Value;
use weir_reactive::Cache;
use weir_registry::{ElementDef, Logger, MainController, Registry};

use crate::config::ConstructorConfig;
use crate::error::ParseError;
use crate::resolver::SpecResolver;


/// Builds [`MainController`]s from specifications.
///
/// The registry is discovered once; every [`parse`](Self::parse) call starts from a fresh
/// graph, cache and anonymous-name counter.
pub struct AppConstructor {
	config: ConstructorConfig,
	registry: Registry,
	loggers: IndexMap<String, Arc<Logger>>,
}

impl AppConstructor {
	/// Discovers every registered element implementation, applying `config.errors` to
	/// duplicate tags.
	pub fn new(config: ConstructorConfig) -> Result<Self, ParseError> {
		Self::with_elements(config, [])
	}

	/// Like [`new`](Self::new), with `defs` discovered after the registered implementations.
	///
	/// A def reusing a registered tag shadows it unless `config.errors` is `raise`.
	pub fn with_elements(
		config: ConstructorConfig,
		defs: impl IntoIterator<Item = &'static ElementDef>,
	) -> Result<Self, ParseError> {
		let registry = Registry::builder()
			.with_inventory()
			.extend(defs)
			.build(config.errors)
			.map_err(ParseError::DuplicateType)?;
		Ok(Self::with_registry(config, registry))
	}

	pub fn with_registry(config: ConstructorConfig, registry: Registry) -> Self {
		Self {
			config,
			registry,
			loggers: IndexMap::new(),
		}
	}

	/// Makes `logger` available to `logger` and `dependencies` references under `name`.
	pub fn with_logger(mut self, name: impl Into<String>, logger: Arc<Logger>) -> Self {
		self.loggers.insert(name.into(), logger);
		self
	}

	pub fn config(&self) -> &ConstructorConfig {
		&self.config
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn loggers(&self) -> &IndexMap<String, Arc<Logger>> {
		&self.loggers
	}

	/// Constructs the application described by `spec`.
	///
	/// Sections are built in the order sources, transforms, tools, opts, views; then
	/// control panels and the main controller. Nothing is returned on failure.
	pub fn parse(&self, spec: &Value) -> Result<Arc<MainController>, ParseError> {
		let cache = Arc::new(Cache::with_capacity(self.config.cache_capacity));
		SpecResolver::new(&self.registry, self.config.errors, cache, self.loggers.clone()).run(spec)
	}
}
