use std::any::Any;
use std::sync::Arc;

use weir_primitives::Table;
use weir_reactive::SourceError;

use crate::def::element;
use crate::{Bounds, ConstructError, ControlPanel, Constructor, PanelInit, ParamSpec, ParentHandle, RenderHandle};

const PARAMS: &[ParamSpec] = &[
	ParamSpec::scalar("target")
		.doc("Source receiving published tables")
		.bounds(Bounds::Text),
	ParamSpec::scalar("key")
		.doc("Item key to publish under")
		.bounds(Bounds::Text),
	ParamSpec::scalar("header").bounds(Bounds::Text).hidden(),
];

element!(TABLE_ENTRY_PANEL {
	tag: "table_entry",
	type_name: "TableEntryPanel",
	description: "Publishes tables into a source of the application",
	params: PARAMS,
	ctor: Constructor::Controller(table_entry_panel),
});

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
	#[error("control panel {0:?} outlived its controller")]
	Detached(String),
	#[error("control panel {panel:?}: no source named {target:?}")]
	UnknownTarget { panel: String, target: String },
	#[error(transparent)]
	Source(#[from] SourceError),
}

/// Render frame of a control panel: its header and the visible parameters.
#[derive(Debug, Clone)]
pub struct PanelFrame {
	pub header: String,
	pub params: Vec<&'static str>,
}

/// Control panel that pushes tables into one source of its controller.
#[derive(Debug)]
pub struct TableEntryPanel {
	name: String,
	header: String,
	target: String,
	key: Option<String>,
	parent: ParentHandle,
}

impl TableEntryPanel {
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Sets `table` on the target source, under `key` or the panel's default key.
	pub fn publish(&self, table: Table, key: Option<&str>) -> Result<String, PanelError> {
		let parent = self
			.parent
			.upgrade()
			.ok_or_else(|| PanelError::Detached(self.name.clone()))?;
		let source = parent
			.source(&self.target)
			.ok_or_else(|| PanelError::UnknownTarget {
				panel: self.name.clone(),
				target: self.target.clone(),
			})?;
		Ok(source.set(table, key.or(self.key.as_deref()))?)
	}
}

impl ControlPanel for TableEntryPanel {
	fn name(&self) -> &str {
		&self.name
	}

	fn type_tag(&self) -> &'static str {
		"table_entry"
	}

	fn header(&self) -> &str {
		&self.header
	}

	fn params(&self) -> &'static [ParamSpec] {
		PARAMS
	}

	fn render(&self) -> RenderHandle {
		Arc::new(PanelFrame {
			header: self.header.clone(),
			params: PARAMS.iter().filter(|p| p.is_visible()).map(|p| p.name).collect(),
		})
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

fn table_entry_panel(init: PanelInit) -> Result<Arc<dyn ControlPanel>, ConstructError> {
	let PanelInit { name, mut kwargs, parent } = init;
	let target = kwargs.take_str("target")?.ok_or_else(|| ConstructError::MissingParam {
		element: name.clone(),
		param: "target",
	})?;
	let key = kwargs.take_str("key")?;
	let header = kwargs.take_str("header")?.unwrap_or_else(|| "Table entry".to_string());
	kwargs.finish()?;
	Ok(Arc::new(TableEntryPanel {
		name,
		header,
		target,
		key,
		parent,
	}))
}
