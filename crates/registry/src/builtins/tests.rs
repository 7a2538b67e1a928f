use std::sync::Arc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use weir_primitives::{Payload, Table, Value};
use weir_reactive::{Cache, Source, SourceError};

use super::*;
use crate::{
	ConstructError, Constructor, DataProvider, ElementDef, ElementInit, Kwargs, Level, Logger, Observable, Opt, Resolved,
	Transform, View,
};

fn init(name: &str, kwargs: Kwargs, cache: &Arc<Cache>) -> ElementInit {
	ElementInit {
		name: name.to_string(),
		kwargs,
		cache: cache.clone(),
	}
}

fn kw(name: &str) -> Kwargs {
	Kwargs::new(name)
}

fn scalar(v: impl Into<Value>) -> Resolved {
	Resolved::Scalar(v.into())
}

fn source(def: &ElementDef, name: &str, kwargs: Kwargs) -> Result<Arc<Source>, ConstructError> {
	let Constructor::Source(ctor) = def.ctor else {
		panic!("{} is not a source", def.tag)
	};
	ctor(init(name, kwargs, &Arc::new(Cache::new())))
}

fn transform(def: &ElementDef, name: &str, kwargs: Kwargs, cache: &Arc<Cache>) -> Result<Arc<dyn Transform>, ConstructError> {
	let Constructor::Transform(ctor) = def.ctor else {
		panic!("{} is not a transform", def.tag)
	};
	ctor(init(name, kwargs, cache))
}

fn view(def: &ElementDef, name: &str, kwargs: Kwargs) -> Result<Arc<dyn View>, ConstructError> {
	let Constructor::View(ctor) = def.ctor else {
		panic!("{} is not a view", def.tag)
	};
	ctor(init(name, kwargs, &Arc::new(Cache::new())))
}

fn opt(name: &str, entries: &[(&str, Value)]) -> Arc<dyn Opt> {
	let Constructor::Opt(ctor) = GENERIC_OPT.ctor else {
		panic!("generic opt is not an opt")
	};
	let kwargs = entries
		.iter()
		.fold(kw(name), |k, (key, value)| k.with(*key, Resolved::Scalar(value.clone())));
	ctor(init(name, kwargs, &Arc::new(Cache::new()))).unwrap()
}

fn provider(p: Arc<dyn DataProvider>) -> Resolved {
	Resolved::Source(Some(p))
}

fn people() -> Table {
	Table::from_columns([
		("name", vec![Value::from("b"), Value::from("a"), Value::from("c")]),
		("age", vec![Value::from(30), Value::from(20), Value::from(40)]),
		("city", vec![Value::from("x"), Value::from("y"), Value::from("z")]),
	])
	.unwrap()
}

fn table_of(payload: &Payload) -> &Table {
	payload.as_table().expect("tabular payload")
}

#[test]
fn table_source_is_tabular_and_bounded() {
	let src = source(&TABLE_SOURCE, "raw", kw("raw").with("max_items", scalar(1))).unwrap();
	assert!(matches!(
		src.set(Value::from(1), None),
		Err(SourceError::PayloadMismatch { .. })
	));

	src.set(people(), Some("a")).unwrap();
	src.set(people(), Some("b")).unwrap();
	assert_eq!(src.keys(), vec!["b"]);
}

#[test]
fn generic_source_rejects_unknown_params() {
	let err = source(&GENERIC_SOURCE, "raw", kw("raw").with("format", scalar("csv"))).unwrap_err();
	assert!(matches!(err, ConstructError::UnexpectedParam { ref param, .. } if param == "format"));
}

#[test]
fn chained_transforms_refresh_view_once_per_set() {
	let cache = Arc::new(Cache::new());
	let raw = source(&TABLE_SOURCE, "raw", kw("raw")).unwrap();
	let select = transform(
		&SELECT_TRANSFORM,
		"narrow",
		kw("narrow")
			.with("source", provider(raw.clone()))
			.with("columns", scalar(vec!["name", "age"])),
		&cache,
	)
	.unwrap();
	let sorted = transform(
		&SORT_TRANSFORM,
		"by_age",
		kw("by_age")
			.with("source", provider(select.clone()))
			.with("by", scalar("age")),
		&cache,
	)
	.unwrap();
	let table = view(&TABLE_VIEW, "people", kw("people").with("source", provider(sorted.clone()))).unwrap();
	assert_eq!(table.refresh_count(), 0);

	raw.set(people(), None).unwrap();
	assert_eq!(table.refresh_count(), 1);

	let frame = table.render();
	let frame = frame.downcast_ref::<TableFrame>().unwrap();
	let out = table_of(frame.payload.as_deref().unwrap());
	assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["name", "age"]);
	assert_eq!(
		out.column("age").unwrap().values,
		vec![Value::from(20), Value::from(30), Value::from(40)]
	);

	let misses = cache.stats().misses;
	raw.set(people(), None).unwrap();
	assert_eq!(table.refresh_count(), 2);
	assert_eq!(cache.stats().misses, misses);
}

#[test]
fn plural_upstream_recomputes_the_written_key() {
	let cache = Arc::new(Cache::new());
	let raw = source(&TABLE_SOURCE, "raw", kw("raw")).unwrap();
	let select = transform(
		&SELECT_TRANSFORM,
		"narrow",
		kw("narrow")
			.with("source", provider(raw.clone()))
			.with("columns", scalar(vec!["name"])),
		&cache,
	)
	.unwrap();
	let pinned = view(
		&TABLE_VIEW,
		"pinned",
		kw("pinned")
			.with("source", provider(select.clone()))
			.with("table", scalar("a")),
	)
	.unwrap();
	let latest = view(&TABLE_VIEW, "latest", kw("latest").with("source", provider(select.clone()))).unwrap();

	raw.set(people(), Some("a")).unwrap();
	let ages = Table::from_columns([("name", vec![Value::from("z")]), ("age", vec![Value::from(1)])]).unwrap();
	raw.set(ages, Some("b")).unwrap();
	assert_eq!(pinned.refresh_count(), 2);
	assert_eq!(latest.refresh_count(), 2);

	let frame = pinned.render();
	let frame = frame.downcast_ref::<TableFrame>().unwrap();
	assert_eq!(table_of(frame.payload.as_deref().unwrap()).num_rows(), 3);

	let frame = latest.render();
	let frame = frame.downcast_ref::<TableFrame>().unwrap();
	assert_eq!(
		table_of(frame.payload.as_deref().unwrap()).column("name").unwrap().values,
		vec![Value::from("z")]
	);
}

#[test]
fn table_transform_selects_one_key() {
	let cache = Arc::new(Cache::new());
	let raw = source(&TABLE_SOURCE, "raw", kw("raw")).unwrap();
	let picked = transform(
		&TABLE_TRANSFORM,
		"second",
		kw("second")
			.with("source", provider(raw.clone()))
			.with("table", scalar("two")),
		&cache,
	)
	.unwrap();

	assert!(picked.data(None).unwrap().is_none());
	raw.set(Table::from_columns([("v", vec![Value::from(1)])]).unwrap(), Some("one"))
		.unwrap();
	raw.set(Table::from_columns([("v", vec![Value::from(2)])]).unwrap(), Some("two"))
		.unwrap();

	let out = picked.data(None).unwrap().unwrap();
	assert_eq!(table_of(&out).column("v").unwrap().values, vec![Value::from(2)]);
	assert_eq!(picked.fingerprint(None).unwrap(), raw.fingerprint(Some("two")).unwrap());
}

#[test]
fn transform_failure_names_the_transform() {
	let cache = Arc::new(Cache::new());
	let raw = source(&TABLE_SOURCE, "raw", kw("raw")).unwrap();
	let _select = transform(
		&SELECT_TRANSFORM,
		"narrow",
		kw("narrow")
			.with("source", provider(raw.clone()))
			.with("columns", scalar("missing")),
		&cache,
	)
	.unwrap();

	let err = raw.set(people(), None).unwrap_err();
	let SourceError::Propagation(err) = err else {
		panic!("expected a propagation error, got {err:?}");
	};
	assert_eq!(err.element, "narrow");
	assert_eq!(err.chain, vec!["raw", "narrow"]);
	assert_eq!(raw.len(), 1);
}

#[test]
fn transform_requires_its_parameters() {
	let cache = Arc::new(Cache::new());
	let err = transform(&SORT_TRANSFORM, "s", kw("s"), &cache).err().unwrap();
	assert!(matches!(err, ConstructError::MissingParam { param: "by", .. }));
}

#[test]
fn view_opts_merge_lists_and_reject_other_overlaps() {
	let a = opt("a", &[("hooks", Value::from(vec!["h1"])), ("color", Value::from("red"))]);
	let b = opt("b", &[("hooks", Value::from(vec!["h2"])), ("size", Value::from(3))]);
	let merged = view(&TABLE_VIEW, "v", kw("v").with("opts", Resolved::Opts(vec![a.clone(), b])))
		.unwrap()
		.opts_dict()
		.unwrap();

	let mut expected = IndexMap::new();
	expected.insert("hooks".to_string(), Value::from(vec!["h1", "h2"]));
	expected.insert("color".to_string(), Value::from("red"));
	expected.insert("size".to_string(), Value::from(3));
	assert_eq!(merged, expected);

	let c = opt("c", &[("color", Value::from("blue"))]);
	let err = view(&TABLE_VIEW, "v", kw("v").with("opts", Resolved::Opts(vec![a, c]))).err().unwrap();
	assert_eq!(err.to_string(), r#"overlapping key "color" in opt "c" on view "v""#);
}

#[test]
fn render_drops_opts_that_stop_merging() {
	let a = opt("a", &[("color", Value::from("red"))]);
	let b = opt("b", &[("size", Value::from(3))]);
	let v = view(&TABLE_VIEW, "v", kw("v").with("opts", Resolved::Opts(vec![a, b.clone()]))).unwrap();

	b.set("color", Value::from("blue")).unwrap();
	let frame = v.render();
	let frame = frame.downcast_ref::<TableFrame>().unwrap();
	assert!(frame.opts.is_empty());
	assert!(matches!(v.opts_dict(), Err(ConstructError::InvalidConfiguration(_))));
}

#[test]
fn opt_changes_refresh_views() {
	let style = opt("style", &[("color", Value::from("red"))]);
	let v = view(&TABLE_VIEW, "v", kw("v").with("opts", Resolved::Opts(vec![style.clone()]))).unwrap();

	style.set("color", Value::from("blue")).unwrap();
	assert_eq!(v.refresh_count(), 1);
	assert_eq!(v.opts_dict().unwrap()["color"], Value::from("blue"));
}

#[test]
fn dependencies_trigger_refresh() {
	let raw = source(&GENERIC_SOURCE, "raw", kw("raw")).unwrap();
	let other = source(&GENERIC_SOURCE, "other", kw("other")).unwrap();
	let v = view(
		&TABLE_VIEW,
		"v",
		kw("v")
			.with("source", provider(raw.clone()))
			.with("dependencies", Resolved::Dependencies(vec![other.clone() as Arc<dyn Observable>])),
	)
	.unwrap();

	other.set(Value::from(1), None).unwrap();
	assert_eq!(v.refresh_count(), 1);
}

#[test]
fn logging_view_filters_by_level() {
	let logger = Arc::new(Logger::new("app"));
	let v = view(
		&LOGGING_VIEW,
		"log",
		kw("log")
			.with("logger", Resolved::Logger(logger.clone()))
			.with("level", scalar("warn")),
	)
	.unwrap();

	logger.info("starting").unwrap();
	logger.warn("disk almost full").unwrap();
	logger.log(Level::Error, "disk full").unwrap();
	assert_eq!(v.refresh_count(), 3);

	let frame = v.render();
	let frame = frame.downcast_ref::<LogFrame>().unwrap();
	let messages: Vec<_> = frame.records.iter().map(|r| r.message.as_str()).collect();
	assert_eq!(messages, vec!["disk almost full", "disk full"]);
}

#[test]
fn logging_view_rejects_unknown_level() {
	let err = view(&LOGGING_VIEW, "log", kw("log").with("level", scalar("loud")))
		.err()
		.unwrap();
	assert!(matches!(err, ConstructError::InvalidParam { expected: "a log level", .. }));
}

#[test]
fn overlay_follows_members() {
	let raw = source(&GENERIC_SOURCE, "raw", kw("raw")).unwrap();
	let a = view(&TABLE_VIEW, "a", kw("a").with("source", provider(raw.clone()))).unwrap();
	let b = view(&TABLE_VIEW, "b", kw("b").with("source", provider(raw.clone()))).unwrap();
	let overlay = view(&OVERLAY_VIEW, "both", kw("both").with("views", Resolved::Views(vec![a, b]))).unwrap();

	raw.set(Value::from(1), None).unwrap();
	assert_eq!(overlay.refresh_count(), 2);

	let frame = overlay.render();
	let frame = frame.downcast_ref::<OverlayFrame>().unwrap();
	assert_eq!(frame.members.len(), 2);
}

#[test]
fn dropping_a_view_unsubscribes() {
	let raw = source(&GENERIC_SOURCE, "raw", kw("raw")).unwrap();
	let v = view(&TABLE_VIEW, "v", kw("v").with("source", provider(raw.clone()))).unwrap();
	assert_eq!(raw.updated().subscriber_count(), 1);

	drop(v);
	assert_eq!(raw.updated().subscriber_count(), 0);
	raw.set(Value::from(1), None).unwrap();
}

#[test]
fn explicit_update_refreshes_and_notifies() {
	let raw = source(&GENERIC_SOURCE, "raw", kw("raw")).unwrap();
	raw.set(Value::from(5), None).unwrap();
	let v = view(&TABLE_VIEW, "v", kw("v").with("source", provider(raw.clone()))).unwrap();

	v.update().unwrap();
	assert_eq!(v.refresh_count(), 1);
	let frame = v.render();
	let frame = frame.downcast_ref::<TableFrame>().unwrap();
	assert_eq!(frame.payload.as_deref(), Some(&Payload::from(Value::from(5))));
}

#[test]
fn hover_tool_keeps_tooltips() {
	let Constructor::Tool(ctor) = HOVER_TOOL.ctor else {
		panic!("hover is not a tool")
	};
	let tips = vec![("Name".to_string(), "@name".to_string())];
	let tool = ctor(init(
		"hover",
		kw("hover").with("tooltips", Resolved::Tooltips(tips.clone())),
		&Arc::new(Cache::new()),
	))
	.unwrap();
	assert_eq!(tool.tooltips(), tips.as_slice());
	assert_eq!(tool.type_tag(), "hover");
}

#[test]
fn table_view_exposes_tool_tooltips() {
	let Constructor::Tool(ctor) = HOVER_TOOL.ctor else {
		panic!("hover is not a tool")
	};
	let tips = vec![("Age".to_string(), "@age".to_string())];
	let hover = ctor(init(
		"hover",
		kw("hover").with("tooltips", Resolved::Tooltips(tips.clone())),
		&Arc::new(Cache::new()),
	))
	.unwrap();
	let v = view(&TABLE_VIEW, "v", kw("v").with("tools", Resolved::Tools(vec![hover]))).unwrap();

	assert_eq!(v.tools().len(), 1);
	let frame = v.render();
	let frame = frame.downcast_ref::<TableFrame>().unwrap();
	assert_eq!(frame.tooltips, tips);
}

#[test]
fn compare_view_rereads_only_the_emitting_role() {
	let left = source(&GENERIC_SOURCE, "left", kw("left")).unwrap();
	let right = source(&GENERIC_SOURCE, "right", kw("right")).unwrap();
	let roles: IndexMap<String, Arc<dyn DataProvider>> = IndexMap::from([
		("before".to_string(), left.clone() as Arc<dyn DataProvider>),
		("after".to_string(), right.clone() as Arc<dyn DataProvider>),
	]);
	let v = view(&COMPARE_VIEW, "diff", kw("diff").with("sources", Resolved::Sources(roles))).unwrap();
	let compare = v.render();
	let compare = compare.downcast_ref::<CompareFrame>().unwrap();
	assert_eq!(compare.payloads.keys().collect::<Vec<_>>(), vec!["before", "after"]);

	left.set(Value::from(1), None).unwrap();
	right.set(Value::from(2), None).unwrap();
	assert_eq!(v.refresh_count(), 2);

	let frame = v.render();
	let frame = frame.downcast_ref::<CompareFrame>().unwrap();
	assert_eq!(frame.payloads["before"].as_deref(), Some(&Payload::from(Value::from(1))));
	assert_eq!(frame.payloads["after"].as_deref(), Some(&Payload::from(Value::from(2))));
}
