use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use pretty_assertions::assert_eq;
use weir_primitives::{Table, Value};

use super::*;

fn table(values: Vec<i64>) -> Table {
	Table::from_columns([("x", values.into_iter().map(Value::from).collect())]).unwrap()
}

fn counter(source: &Source) -> (Arc<AtomicUsize>, crate::Subscription) {
	let hits = Arc::new(AtomicUsize::new(0));
	let sub = {
		let hits = hits.clone();
		source.updated().subscribe(move |_| {
			hits.fetch_add(1, Ordering::SeqCst);
			Ok(())
		})
	};
	(hits, sub)
}

#[test]
fn empty_source_gets_nothing() {
	let source = Source::new("src");
	assert_eq!(source.shape(), SourceShape::Empty);
	assert!(source.get(None).unwrap().is_none());
	assert!(source.fingerprint(None).unwrap().is_none());
	assert!(source.is_empty());
}

#[test]
fn keyless_set_on_empty_synthesizes_key() {
	let source = Source::new("src");
	let key = source.set(Value::from(1), None).unwrap();
	assert_eq!(key, "item_00001");
	assert_eq!(source.shape(), SourceShape::Singular);
	assert_eq!(*source.get(None).unwrap().unwrap(), Payload::from(Value::from(1)));
}

#[test]
fn keyless_set_on_singular_overwrites() {
	let source = Source::new("src");
	source.set(Value::from("a"), Some("only")).unwrap();
	let key = source.set(Value::from("b"), None).unwrap();

	assert_eq!(key, "only");
	assert_eq!(source.keys(), vec!["only"]);
	assert_eq!(*source.get(None).unwrap().unwrap(), Payload::from(Value::from("b")));
}

#[test]
fn plural_requires_keys() {
	let source = Source::new("src");
	source.set(Value::from(1), Some("a")).unwrap();
	source.set(Value::from(2), Some("b")).unwrap();
	assert_eq!(source.shape(), SourceShape::Plural);

	assert!(matches!(
		source.get(None),
		Err(SourceError::AmbiguousGet { ref source_name, count: 2 }) if source_name == "src"
	));
	assert!(matches!(source.set(Value::from(3), None), Err(SourceError::MissingKey { count: 2, .. })));
	assert!(matches!(source.fingerprint(None), Err(SourceError::AmbiguousGet { .. })));

	assert_eq!(*source.get(Some("b")).unwrap().unwrap(), Payload::from(Value::from(2)));
	assert!(source.get(Some("zzz")).unwrap().is_none());
}

#[test]
fn failed_set_does_not_notify() {
	let source = Source::new("src");
	source.set(Value::from(1), Some("a")).unwrap();
	source.set(Value::from(2), Some("b")).unwrap();
	let (hits, _sub) = counter(&source);

	source.set(Value::from(3), None).unwrap_err();
	assert_eq!(hits.load(Ordering::SeqCst), 0);
	assert_eq!(source.len(), 2);
}

#[test]
fn fingerprint_tracks_content() {
	let source = Source::new("src");
	source.set(table(vec![1, 2]), Some("t")).unwrap();
	let first = source.fingerprint(Some("t")).unwrap().unwrap();

	source.set(table(vec![1, 2]), Some("t")).unwrap();
	assert_eq!(source.fingerprint(Some("t")).unwrap().unwrap(), first);

	source.set(table(vec![1, 3]), Some("t")).unwrap();
	assert_ne!(source.fingerprint(Some("t")).unwrap().unwrap(), first);
	assert_eq!(first, Payload::from(table(vec![1, 2])).fingerprint());
}

#[test]
fn every_set_notifies_once() {
	let source = Source::new("src");
	let (hits, _sub) = counter(&source);

	source.set(Value::from(1), None).unwrap();
	source.set(Value::from(1), None).unwrap();
	source.set(Value::from(2), Some("other")).unwrap();
	assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn notifications_carry_the_written_key() {
	let source = Source::new("src");
	let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let _sub = {
		let seen = seen.clone();
		source.updated().subscribe(move |event| {
			seen.lock().push(event.key().map(str::to_string));
			Ok(())
		})
	};

	source.set(Value::from(1), None).unwrap();
	source.set(Value::from(2), None).unwrap();
	source.set(Value::from(3), Some("b")).unwrap();
	assert_eq!(
		*seen.lock(),
		vec![
			Some("item_00001".to_string()),
			Some("item_00001".to_string()),
			Some("b".to_string())
		]
	);
}

#[test]
fn table_source_rejects_values() {
	let source = Source::new("tables").with_accepts(PayloadKind::Table);
	let err = source.set(Value::from(1), None).unwrap_err();
	assert!(matches!(
		err,
		SourceError::PayloadMismatch {
			expected: PayloadKind::Table,
			found: PayloadKind::Value,
			..
		}
	));
	assert_eq!(err.to_string(), r#"source "tables" accepts table payloads, got value"#);
	assert!(source.is_empty());
}

#[test]
fn capacity_evicts_oldest() {
	let source = Source::new("src").with_max_items(NonZeroUsize::new(2).unwrap());
	source.set(Value::from(1), Some("a")).unwrap();
	source.set(Value::from(2), Some("b")).unwrap();
	source.set(Value::from(20), Some("b")).unwrap();
	assert_eq!(source.keys(), vec!["a", "b"]);

	source.set(Value::from(3), Some("c")).unwrap();
	assert_eq!(source.keys(), vec!["b", "c"]);
	assert!(!source.contains_key("a"));
}

#[test]
fn subscriber_failure_surfaces_after_store() {
	let source = Source::new("src");
	let _sub = source
		.updated()
		.subscribe(|event| Err(PropagationError::new("view", event, "render failed")));

	let err = source.set(Value::from(1), Some("k")).unwrap_err();
	let SourceError::Propagation(err) = err else {
		panic!("expected propagation error, got {err:?}");
	};
	assert_eq!(err.chain, vec!["src", "view"]);
	assert_eq!(*source.get(Some("k")).unwrap().unwrap(), Payload::from(Value::from(1)));
}

#[test]
fn subscribers_can_read_during_propagation() {
	let source = Arc::new(Source::new("src"));
	let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let _sub = {
		let seen = seen.clone();
		source.updated().subscribe_weak(&source, move |src, _| {
			let value = src.get(None).map_err(|e| PropagationError::new("reader", &Event::new(src.name()), e))?;
			seen.lock().push(value.and_then(|p| p.as_value().and_then(Value::as_int)));
			Ok(())
		})
	};

	source.set(Value::from(7), None).unwrap();
	assert_eq!(*seen.lock(), vec![Some(7)]);
}

#[test]
fn concurrent_writers_are_serialized() {
	let source = Arc::new(Source::new("src"));
	let (hits, _sub) = counter(&source);

	let handles: Vec<_> = (0..4)
		.map(|t| {
			let source = source.clone();
			thread::spawn(move || {
				for i in 0..25 {
					source.set(Value::from(i), Some(&format!("t{t}_{i}"))).unwrap();
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	assert_eq!(source.len(), 100);
	assert_eq!(hits.load(Ordering::SeqCst), 100);
}
