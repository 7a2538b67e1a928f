use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use weir_primitives::{Fingerprint, Payload};

#[cfg(test)]
mod tests;

/// Identity of one memoized computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub op: String,
	pub inputs: Vec<Fingerprint>,
}

/// A memoized output together with its own fingerprint.
#[derive(Debug, Clone)]
pub struct Cached {
	pub output: Arc<Payload>,
	pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub evictions: u64,
}

/// Content-addressed memo table shared by every transform of one graph.
///
/// Entries never expire on their own. When a capacity is set, the oldest inserted entry is
/// dropped first.
#[derive(Debug, Default)]
pub struct Cache {
	capacity: Option<NonZeroUsize>,
	entries: Mutex<IndexMap<CacheKey, Cached>>,
	hits: AtomicU64,
	misses: AtomicU64,
	evictions: AtomicU64,
}

impl Cache {
	/// Creates an unbounded cache.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: Option<NonZeroUsize>) -> Self {
		Self {
			capacity,
			..Self::default()
		}
	}

	pub fn capacity(&self) -> Option<NonZeroUsize> {
		self.capacity
	}

	/// Looks up a stored result without counting a hit or a miss.
	pub fn get(&self, op_id: &str, inputs: &[Fingerprint]) -> Option<Cached> {
		let key = CacheKey {
			op: op_id.to_string(),
			inputs: inputs.to_vec(),
		};
		self.entries.lock().get(&key).cloned()
	}

	/// Returns the stored result for `(op_id, inputs)`, calling `compute` only on a miss.
	///
	/// The store lock is released while `compute` runs, so computations may themselves use
	/// the cache. Two racing misses for the same key both compute; the later insert wins.
	pub fn get_or_compute<F, E>(&self, op_id: &str, inputs: &[Fingerprint], compute: F) -> Result<Cached, E>
	where
		F: FnOnce() -> Result<Payload, E>,
	{
		let key = CacheKey {
			op: op_id.to_string(),
			inputs: inputs.to_vec(),
		};
		if let Some(hit) = self.entries.lock().get(&key).cloned() {
			self.hits.fetch_add(1, Ordering::Relaxed);
			return Ok(hit);
		}

		self.misses.fetch_add(1, Ordering::Relaxed);
		let output = compute()?;
		let cached = Cached {
			fingerprint: output.fingerprint(),
			output: Arc::new(output),
		};

		let mut entries = self.entries.lock();
		entries.insert(key, cached.clone());
		if let Some(capacity) = self.capacity {
			while entries.len() > capacity.get() {
				if let Some((evicted, _)) = entries.shift_remove_index(0) {
					self.evictions.fetch_add(1, Ordering::Relaxed);
					tracing::debug!(op = %evicted.op, "evicted cache entry");
				}
			}
		}
		Ok(cached)
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			evictions: self.evictions.load(Ordering::Relaxed),
		}
	}
}
