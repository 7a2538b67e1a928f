use pretty_assertions::assert_eq;

use super::*;
use crate::param::{Bounds, ParamKind};

struct Describe;

impl WidgetFactory for Describe {
	type Widget = String;

	fn widget_for(&self, param: &ParamSpec) -> String {
		match param.bounds {
			Bounds::Integer { .. } => format!("int:{}", param.name),
			Bounds::Choice(options) => format!("select:{}[{}]", param.name, options.join(",")),
			Bounds::Toggle => format!("checkbox:{}", param.name),
			_ => format!("text:{}", param.name),
		}
	}
}

const PARAMS: &[ParamSpec] = &[
	ParamSpec::scalar("name"),
	ParamSpec::scalar("count").bounds(Bounds::Integer { min: Some(0), max: None }),
	ParamSpec::scalar("mode").bounds(Bounds::Choice(&["fast", "slow"])),
	ParamSpec::new("source", ParamKind::Source).hidden(),
	ParamSpec::scalar("_internal"),
	ParamSpec::scalar("enabled").bounds(Bounds::Toggle),
	ParamSpec::scalar("label").bounds(Bounds::Text),
];

#[test]
fn skips_hidden_private_and_excluded() {
	let widgets = generate_widgets(PARAMS, &["label"], &Describe);
	assert_eq!(
		widgets.into_iter().collect::<Vec<_>>(),
		vec![
			("count", "int:count".to_string()),
			("mode", "select:mode[fast,slow]".to_string()),
			("enabled", "checkbox:enabled".to_string()),
		]
	);
}

#[test]
fn no_exclusions_keeps_declaration_order() {
	let names: Vec<_> = generate_widgets(PARAMS, &[], &Describe).into_keys().collect();
	assert_eq!(names, vec!["count", "mode", "enabled", "label"]);
}
