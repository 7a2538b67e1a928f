use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use weir_registry::{ConstructError, RegistryError};

/// Where an element name was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
	/// A top-level section of the specification.
	TopLevel,
	/// A section of the named entry under `modules`.
	Module(String),
	/// An anonymous opt declared inline by another element.
	Inline { owner: String },
}

impl fmt::Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TopLevel => write!(f, "top level"),
			Self::Module(name) => write!(f, "module {name:?}"),
			Self::Inline { owner } => write!(f, "inline opt of {owner:?}"),
		}
	}
}

/// Errors that abort [`AppConstructor::parse`](crate::AppConstructor::parse).
///
/// `section` is always the specification section of the offending entry, such as
/// `"views"` or `"main_controller"`.
#[derive(Debug, Error)]
pub enum ParseError {
	#[error("the field 'type' is not specified for {section} entry {element:?}")]
	MissingTypeField { section: &'static str, element: String },

	#[error("{section} entry {element:?}: no implementation registered for type {tag:?}")]
	UnknownType {
		section: &'static str,
		element: String,
		tag: String,
	},

	/// Two implementations share a tag and the duplicate policy is `raise`.
	#[error(transparent)]
	DuplicateType(RegistryError),

	#[error("{section} entry {name:?} is declared twice: at {existing} and at {incoming}")]
	NameConflict {
		section: &'static str,
		name: String,
		existing: Origin,
		incoming: Origin,
	},

	#[error("{section} entry {element:?}: parameter {param:?} refers to unknown {target} entry {reference:?}")]
	UnresolvedReference {
		section: &'static str,
		element: String,
		param: String,
		/// Section(s) the reference was looked up in.
		target: &'static str,
		reference: String,
	},

	#[error("{section} entry {element:?}: {reason}")]
	InvalidConfiguration {
		section: &'static str,
		element: String,
		reason: String,
	},

	#[error("failed to construct {section} entry {element:?}")]
	Construct {
		section: &'static str,
		element: String,
		#[source]
		cause: ConstructError,
	},
}

impl ParseError {
	pub(crate) fn invalid(section: &'static str, element: &str, reason: impl Into<String>) -> Self {
		Self::InvalidConfiguration {
			section,
			element: element.to_string(),
			reason: reason.into(),
		}
	}

	/// Section of the offending entry, when the error is tied to one.
	pub fn section(&self) -> Option<&'static str> {
		match self {
			Self::MissingTypeField { section, .. }
			| Self::UnknownType { section, .. }
			| Self::NameConflict { section, .. }
			| Self::UnresolvedReference { section, .. }
			| Self::InvalidConfiguration { section, .. }
			| Self::Construct { section, .. } => Some(*section),
			Self::DuplicateType(_) => None,
		}
	}
}

/// Errors from [`ConstructorConfig::from_toml_str`](crate::ConstructorConfig::from_toml_str).
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid constructor configuration: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Errors from [`load_spec`](crate::load_spec).
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("invalid JSON in {path}: {error}")]
	Json { path: PathBuf, error: serde_json::Error },

	#[error("invalid TOML in {path}: {error}")]
	Toml { path: PathBuf, error: toml::de::Error },

	#[error("unsupported specification format for {path} (expected .json or .toml)")]
	UnsupportedFormat { path: PathBuf },
}
