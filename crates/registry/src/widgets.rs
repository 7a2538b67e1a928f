use indexmap::IndexMap;

use crate::param::ParamSpec;

#[cfg(test)]
mod tests;

/// Host-provided mapping from a parameter signature to a concrete input widget.
pub trait WidgetFactory {
	type Widget;

	fn widget_for(&self, param: &ParamSpec) -> Self::Widget;
}

/// Builds one widget per visible parameter, keyed by parameter name in declaration order.
///
/// Parameters with negative precedence, names starting with `_`, `name`, and anything in
/// `excluded` are skipped.
pub fn generate_widgets<F: WidgetFactory>(
	params: &[ParamSpec],
	excluded: &[&str],
	factory: &F,
) -> IndexMap<&'static str, F::Widget> {
	params
		.iter()
		.filter(|p| p.is_visible() && !excluded.contains(&p.name))
		.map(|p| (p.name, factory.widget_for(p)))
		.collect()
}
