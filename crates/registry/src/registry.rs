use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

use crate::def::{ElementDef, ElementReg};
use crate::kind::ElementKind;

#[cfg(test)]
mod tests;

/// What to do when two implementations claim the same tag, or a reference cannot be
/// resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
	/// Fail immediately.
	#[default]
	Raise,
	/// Emit a warning and keep the later definition.
	Warn,
	/// Silently keep the later definition.
	Ignore,
}

/// The same three-way policy as applied to unresolved references.
pub type ErrorPolicy = DuplicatePolicy;

impl DuplicatePolicy {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Raise => "raise",
			Self::Warn => "warn",
			Self::Ignore => "ignore",
		}
	}
}

impl fmt::Display for DuplicatePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for DuplicatePolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"raise" => Ok(Self::Raise),
			"warn" => Ok(Self::Warn),
			"ignore" => Ok(Self::Ignore),
			_ => Err(format!("invalid error policy {s:?}, expected raise, warn or ignore")),
		}
	}
}

/// One tag shadowing recorded during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	pub kind: ElementKind,
	pub tag: &'static str,
	/// Implementation kept for the tag.
	pub winner: &'static str,
	/// Implementation that was shadowed.
	pub loser: &'static str,
	pub policy: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("no {kind} implementation registered for type {tag:?}")]
	UnknownType { kind: ElementKind, tag: String },
	#[error("multiple implementations of {kind} type {tag:?}: current {current}, existing {existing}")]
	DuplicateType {
		kind: ElementKind,
		tag: &'static str,
		existing: &'static str,
		current: &'static str,
	},
}

/// Collects element defs in discovery order before building a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
	defs: Vec<&'static ElementDef>,
}

impl RegistryBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds every def submitted through `inventory`.
	pub fn with_inventory(mut self) -> Self {
		self.defs.extend(inventory::iter::<ElementReg>.into_iter().map(|reg| reg.0));
		self
	}

	/// Adds one def. Later pushes count as later discovery.
	pub fn push(mut self, def: &'static ElementDef) -> Self {
		self.defs.push(def);
		self
	}

	pub fn extend(mut self, defs: impl IntoIterator<Item = &'static ElementDef>) -> Self {
		self.defs.extend(defs);
		self
	}

	pub fn build(self, policy: DuplicatePolicy) -> Result<Registry, RegistryError> {
		let mut tables: HashMap<ElementKind, IndexMap<&'static str, &'static ElementDef>> = HashMap::default();
		let mut collisions = Vec::new();

		for def in self.defs {
			let kind = def.kind();
			let table = tables.entry(kind).or_default();
			if let Some(existing) = table.get(def.tag) {
				if std::ptr::eq(*existing, def) {
					continue;
				}
				match policy {
					DuplicatePolicy::Raise => {
						return Err(RegistryError::DuplicateType {
							kind,
							tag: def.tag,
							existing: existing.type_name,
							current: def.type_name,
						});
					}
					DuplicatePolicy::Warn => {
						tracing::warn!(
							kind = %kind,
							tag = def.tag,
							existing = existing.type_name,
							current = def.type_name,
							"multiple implementations found for the same type; keeping the later one"
						);
					}
					DuplicatePolicy::Ignore => {}
				}
				collisions.push(Collision {
					kind,
					tag: def.tag,
					winner: def.type_name,
					loser: existing.type_name,
					policy,
				});
			}
			table.insert(def.tag, def);
		}

		Ok(Registry {
			tables,
			collisions,
			policy,
		})
	}
}

/// Kind/tag lookup of element implementations.
#[derive(Debug)]
pub struct Registry {
	tables: HashMap<ElementKind, IndexMap<&'static str, &'static ElementDef>>,
	collisions: Vec<Collision>,
	policy: DuplicatePolicy,
}

impl Registry {
	/// Builds the registry from every def submitted through `inventory`.
	pub fn discover(policy: DuplicatePolicy) -> Result<Self, RegistryError> {
		RegistryBuilder::new().with_inventory().build(policy)
	}

	pub fn builder() -> RegistryBuilder {
		RegistryBuilder::new()
	}

	pub fn resolve(&self, kind: ElementKind, tag: &str) -> Result<&'static ElementDef, RegistryError> {
		self.get(kind, tag).ok_or_else(|| RegistryError::UnknownType {
			kind,
			tag: tag.to_string(),
		})
	}

	pub fn get(&self, kind: ElementKind, tag: &str) -> Option<&'static ElementDef> {
		self.tables.get(&kind)?.get(tag).copied()
	}

	/// Registered tags of `kind`, in discovery order.
	pub fn tags(&self, kind: ElementKind) -> Vec<&'static str> {
		self.tables
			.get(&kind)
			.map(|t| t.keys().copied().collect())
			.unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.tables.values().map(IndexMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Every tag shadowing seen while building, under any policy.
	pub fn collisions(&self) -> &[Collision] {
		&self.collisions
	}

	pub fn policy(&self) -> DuplicatePolicy {
		self.policy
	}
}
