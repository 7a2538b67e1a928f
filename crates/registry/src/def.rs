use std::fmt;
use std::sync::Arc;

use weir_reactive::{Cache, Source};

use crate::element::{ControlPanel, Opt, Tool, Transform, View};
use crate::error::ConstructError;
use crate::kind::ElementKind;
use crate::kwargs::Kwargs;
use crate::main_controller::{MainController, MainInit, ParentHandle};
use crate::param::ParamSpec;

/// Where an element implementation was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistrySource {
	/// Shipped with this crate.
	Builtin,
	/// Defined in another crate linked into the program.
	Crate(&'static str),
}

impl fmt::Display for RegistrySource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Builtin => write!(f, "builtin"),
			Self::Crate(name) => write!(f, "crate:{name}"),
		}
	}
}

/// Everything a non-panel element constructor receives.
#[derive(Debug)]
pub struct ElementInit {
	pub name: String,
	pub kwargs: Kwargs,
	/// Memo table shared by the whole graph.
	pub cache: Arc<Cache>,
}

/// Everything a control panel constructor receives.
#[derive(Debug)]
pub struct PanelInit {
	pub name: String,
	pub kwargs: Kwargs,
	pub parent: ParentHandle,
}

pub type SourceCtor = fn(ElementInit) -> Result<Arc<Source>, ConstructError>;
pub type TransformCtor = fn(ElementInit) -> Result<Arc<dyn Transform>, ConstructError>;
pub type ToolCtor = fn(ElementInit) -> Result<Arc<dyn Tool>, ConstructError>;
pub type OptCtor = fn(ElementInit) -> Result<Arc<dyn Opt>, ConstructError>;
pub type ViewCtor = fn(ElementInit) -> Result<Arc<dyn View>, ConstructError>;
pub type ControllerCtor = fn(PanelInit) -> Result<Arc<dyn ControlPanel>, ConstructError>;
pub type MainCtor = fn(MainInit) -> Result<Arc<MainController>, ConstructError>;

/// Kind-specific constructor. The variant determines the element kind of a def.
#[derive(Clone, Copy)]
pub enum Constructor {
	Source(SourceCtor),
	Transform(TransformCtor),
	Tool(ToolCtor),
	Opt(OptCtor),
	View(ViewCtor),
	Controller(ControllerCtor),
	Main(MainCtor),
}

impl Constructor {
	pub const fn kind(&self) -> ElementKind {
		match self {
			Self::Source(_) => ElementKind::Source,
			Self::Transform(_) => ElementKind::Transform,
			Self::Tool(_) => ElementKind::Tool,
			Self::Opt(_) => ElementKind::Opt,
			Self::View(_) => ElementKind::View,
			Self::Controller(_) => ElementKind::Controller,
			Self::Main(_) => ElementKind::Main,
		}
	}
}

impl fmt::Debug for Constructor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Constructor::{:?}", self.kind())
	}
}

/// A registered element implementation.
#[derive(Debug)]
pub struct ElementDef {
	/// Tag used in the `type` field of a specification entry.
	pub tag: &'static str,
	/// Implementation name reported in duplicate diagnostics.
	pub type_name: &'static str,
	pub description: &'static str,
	pub source: RegistrySource,
	/// Declared parameters, in order.
	pub params: &'static [ParamSpec],
	pub ctor: Constructor,
}

impl ElementDef {
	pub const fn kind(&self) -> ElementKind {
		self.ctor.kind()
	}
}

/// Wrapper for `inventory::collect!`.
pub struct ElementReg(pub &'static ElementDef);
inventory::collect!(ElementReg);

/// Declares a builtin [`ElementDef`] static and submits it to the inventory table.
macro_rules! element {
	($static:ident {
		tag: $tag:literal,
		type_name: $type_name:literal,
		description: $desc:literal,
		params: $params:expr,
		ctor: $ctor:expr $(,)?
	}) => {
		pub static $static: $crate::ElementDef = $crate::ElementDef {
			tag: $tag,
			type_name: $type_name,
			description: $desc,
			source: $crate::RegistrySource::Builtin,
			params: $params,
			ctor: $ctor,
		};
		inventory::submit! { $crate::ElementReg(&$static) }
	};
}
pub(crate) use element;
