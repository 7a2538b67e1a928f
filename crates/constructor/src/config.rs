use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use weir_registry::ErrorPolicy;

use crate::error::ConfigError;


/// Settings of an [`AppConstructor`](crate::AppConstructor).
///
/// ```toml
/// errors = "warn"
/// cache_capacity = 256
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstructorConfig {
	/// Policy for duplicate implementation tags and unresolved references.
	pub errors: ErrorPolicy,
	/// Bound on the transform cache; unbounded when absent.
	pub cache_capacity: Option<NonZeroUsize>,
}

impl ConstructorConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn with_errors(mut self, errors: ErrorPolicy) -> Self {
		self.errors = errors;
		self
	}

	pub fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
		self.cache_capacity = Some(capacity);
		self
	}
}
