use std::sync::Arc;

use crate::def::element;
use crate::{ConstructError, Constructor, ElementInit, ParamKind, ParamSpec, Tool, Tooltip};

element!(HOVER_TOOL {
	tag: "hover",
	type_name: "HoverTool",
	description: "Shows field values under the pointer",
	params: &[ParamSpec::new("tooltips", ParamKind::Tooltips).doc("`[label, field]` pairs")],
	ctor: Constructor::Tool(hover_tool),
});

#[derive(Debug)]
pub struct HoverTool {
	name: String,
	tooltips: Vec<Tooltip>,
}

impl Tool for HoverTool {
	fn name(&self) -> &str {
		&self.name
	}

	fn type_tag(&self) -> &'static str {
		"hover"
	}

	fn tooltips(&self) -> &[Tooltip] {
		&self.tooltips
	}
}

fn hover_tool(init: ElementInit) -> Result<Arc<dyn Tool>, ConstructError> {
	let ElementInit { name, mut kwargs, .. } = init;
	let tooltips = kwargs.take_tooltips("tooltips")?;
	kwargs.finish()?;
	Ok(Arc::new(HoverTool { name, tooltips }))
}
