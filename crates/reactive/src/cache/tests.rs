use std::convert::Infallible;

use pretty_assertions::assert_eq;
use weir_primitives::Value;

use super::*;

fn fp(v: i64) -> Fingerprint {
	Fingerprint::of_value(&Value::from(v))
}

#[test]
fn computes_once_per_key() {
	let cache = Cache::new();
	let mut calls = 0;

	for _ in 0..3 {
		let out = cache
			.get_or_compute::<_, Infallible>("double", &[fp(2)], || {
				calls += 1;
				Ok(Payload::from(Value::from(4)))
			})
			.unwrap();
		assert_eq!(*out.output, Payload::from(Value::from(4)));
		assert_eq!(out.fingerprint, Fingerprint::of_value(&Value::from(4)));
	}

	assert_eq!(calls, 1);
	assert_eq!(
		cache.stats(),
		CacheStats {
			hits: 2,
			misses: 1,
			evictions: 0
		}
	);
}

#[test]
fn changed_inputs_recompute() {
	let cache = Cache::new();
	let mut calls = 0;
	let mut run = |input: i64| {
		cache
			.get_or_compute::<_, Infallible>("double", &[fp(input)], || {
				calls += 1;
				Ok(Payload::from(Value::from(input * 2)))
			})
			.unwrap()
	};

	run(1);
	run(2);
	run(1);
	assert_eq!(calls, 2);
	assert_eq!(cache.len(), 2);
}

#[test]
fn op_identity_separates_entries() {
	let cache = Cache::new();
	cache
		.get_or_compute::<_, Infallible>("a", &[fp(1)], || Ok(Value::from(1).into()))
		.unwrap();
	cache
		.get_or_compute::<_, Infallible>("b", &[fp(1)], || Ok(Value::from(2).into()))
		.unwrap();

	assert_eq!(cache.len(), 2);
	let hit = cache.get("b", &[fp(1)]).unwrap();
	assert_eq!(*hit.output, Payload::from(Value::from(2)));
}

#[test]
fn errors_are_not_stored() {
	let cache = Cache::new();
	let err = cache
		.get_or_compute("fails", &[fp(1)], || Err::<Payload, _>("nope"))
		.unwrap_err();
	assert_eq!(err, "nope");
	assert!(cache.is_empty());
}

#[test]
fn capacity_drops_oldest() {
	let cache = Cache::with_capacity(NonZeroUsize::new(2));
	for i in 0..3 {
		cache
			.get_or_compute::<_, Infallible>("id", &[fp(i)], || Ok(Value::from(i).into()))
			.unwrap();
	}

	assert_eq!(cache.len(), 2);
	assert!(cache.get("id", &[fp(0)]).is_none());
	assert!(cache.get("id", &[fp(2)]).is_some());
	assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn nested_computation_can_use_cache() {
	let cache = Cache::new();
	let out = cache
		.get_or_compute::<_, Infallible>("outer", &[fp(1)], || {
			let inner = cache.get_or_compute::<_, Infallible>("inner", &[fp(1)], || Ok(Value::from(10).into()))?;
			Ok((*inner.output).clone())
		})
		.unwrap();

	assert_eq!(*out.output, Payload::from(Value::from(10)));
	assert_eq!(cache.len(), 2);

	cache.clear();
	assert!(cache.is_empty());
}
