//! Element registry and application graph.
//!
//! Every element implementation (sources, transforms, tools, opts, views, control panels and
//! main controllers) is described by a static [`ElementDef`] submitted to the `inventory`
//! table via [`ElementReg`]. [`Registry::discover`] collects them into a kind/tag lookup,
//! applying a [`DuplicatePolicy`] when two implementations claim the same tag.
//!
//! Constructed elements live in a [`Graph`] owned by the [`MainController`].

pub mod builtins;
mod def;
mod element;
mod error;
mod kind;
mod kwargs;
mod logger;
mod main_controller;
mod param;
mod registry;
mod widgets;

pub use def::{
	Constructor, ControllerCtor, ElementDef, ElementInit, ElementReg, MainCtor, OptCtor, PanelInit,
	RegistrySource, SourceCtor, ToolCtor, TransformCtor, ViewCtor,
};
pub use element::{ControlPanel, DataProvider, Observable, Opt, RenderHandle, Tool, Transform, View, merge_opts};
pub use error::ConstructError;
pub use kind::ElementKind;
pub use kwargs::{Kwargs, Resolved, Tooltip};
pub use logger::{Level, Logger, Record};
pub use main_controller::{Graph, MainController, MainInit, ParentHandle, PendingPanel};
pub use param::{Bounds, ParamKind, ParamSpec};
pub use registry::{Collision, DuplicatePolicy, ErrorPolicy, Registry, RegistryBuilder, RegistryError};
pub use widgets::{WidgetFactory, generate_widgets};
