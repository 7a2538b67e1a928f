use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use weir_reactive::Source;

use super::*;
use crate::builtins::{TABLE_SOURCE, TABLE_VIEW};
use crate::{ConstructError, Constructor, ElementInit, RegistrySource};

fn plain_source(init: ElementInit) -> Result<Arc<Source>, ConstructError> {
	Ok(Arc::new(Source::new(init.name)))
}

static FIRST: ElementDef = ElementDef {
	tag: "dup",
	type_name: "FirstSource",
	description: "",
	source: RegistrySource::Crate("tests"),
	params: &[],
	ctor: Constructor::Source(plain_source),
};

static SECOND: ElementDef = ElementDef {
	tag: "dup",
	type_name: "SecondSource",
	description: "",
	source: RegistrySource::Crate("tests"),
	params: &[],
	ctor: Constructor::Source(plain_source),
};

#[test]
fn discovery_finds_builtins() {
	let registry = Registry::discover(DuplicatePolicy::Raise).unwrap();

	let mut sources = registry.tags(ElementKind::Source);
	sources.sort_unstable();
	assert_eq!(sources, vec!["generic", "table"]);

	let mut views = registry.tags(ElementKind::View);
	views.sort_unstable();
	assert_eq!(views, vec!["compare", "logging", "overlay", "table"]);

	assert_eq!(registry.resolve(ElementKind::Main, "base").unwrap().type_name, "MainController");
	assert_eq!(registry.resolve(ElementKind::Controller, "table_entry").unwrap().kind(), ElementKind::Controller);
	assert!(registry.collisions().is_empty());
}

#[test]
fn unknown_tag_names_kind_and_tag() {
	let registry = RegistryBuilder::new().push(&TABLE_SOURCE).build(DuplicatePolicy::Raise).unwrap();
	let err = registry.resolve(ElementKind::Source, "parquet").unwrap_err();
	assert_eq!(
		err,
		RegistryError::UnknownType {
			kind: ElementKind::Source,
			tag: "parquet".to_string()
		}
	);
	assert_eq!(err.to_string(), r#"no source implementation registered for type "parquet""#);
}

#[test]
fn duplicate_tag_raises() {
	let err = RegistryBuilder::new()
		.push(&FIRST)
		.push(&SECOND)
		.build(DuplicatePolicy::Raise)
		.unwrap_err();
	assert_eq!(
		err,
		RegistryError::DuplicateType {
			kind: ElementKind::Source,
			tag: "dup",
			existing: "FirstSource",
			current: "SecondSource",
		}
	);
}

#[rstest]
#[case::warn(DuplicatePolicy::Warn)]
#[case::ignore(DuplicatePolicy::Ignore)]
fn duplicate_tag_keeps_later(#[case] policy: DuplicatePolicy) {
	let registry = RegistryBuilder::new().push(&FIRST).push(&SECOND).build(policy).unwrap();

	assert_eq!(registry.resolve(ElementKind::Source, "dup").unwrap().type_name, "SecondSource");
	assert_eq!(
		registry.collisions(),
		&[Collision {
			kind: ElementKind::Source,
			tag: "dup",
			winner: "SecondSource",
			loser: "FirstSource",
			policy,
		}]
	);
	assert_eq!(registry.tags(ElementKind::Source), vec!["dup"]);
}

#[test]
fn same_tag_across_kinds_is_not_a_collision() {
	let registry = RegistryBuilder::new()
		.push(&TABLE_SOURCE)
		.push(&TABLE_VIEW)
		.build(DuplicatePolicy::Raise)
		.unwrap();
	assert_eq!(registry.len(), 2);
	assert!(registry.collisions().is_empty());
}

#[test]
fn repeated_def_is_not_a_collision() {
	let registry = RegistryBuilder::new()
		.push(&FIRST)
		.extend([&FIRST])
		.build(DuplicatePolicy::Raise)
		.unwrap();
	assert_eq!(registry.len(), 1);
}

#[rstest]
#[case("raise", DuplicatePolicy::Raise)]
#[case("warn", DuplicatePolicy::Warn)]
#[case("ignore", DuplicatePolicy::Ignore)]
fn policy_round_trips_through_str(#[case] text: &str, #[case] policy: DuplicatePolicy) {
	assert_eq!(text.parse::<DuplicatePolicy>().unwrap(), policy);
	assert_eq!(policy.to_string(), text);
}

#[test]
fn invalid_policy_is_rejected() {
	assert!("panic".parse::<DuplicatePolicy>().is_err());
}
