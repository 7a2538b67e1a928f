use std::num::NonZeroUsize;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{ReentrantMutex, RwLock};
use weir_primitives::{Fingerprint, Payload, PayloadKind};

use crate::signal::{Event, PropagationError, Signal};

#[cfg(test)]
mod tests;

/// Errors raised by [`Source`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("source {source_name:?} holds {count} items; get needs a key")]
	AmbiguousGet { source_name: String, count: usize },
	#[error("source {source_name:?} holds {count} items; set needs a key")]
	MissingKey { source_name: String, count: usize },
	#[error("source {source_name:?} accepts {expected} payloads, got {found}")]
	PayloadMismatch {
		source_name: String,
		expected: PayloadKind,
		found: PayloadKind,
	},
	#[error(transparent)]
	Propagation(#[from] PropagationError),
}

/// How many items a source holds, which decides keyless addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
	Empty,
	Singular,
	Plural,
}

#[derive(Debug)]
struct Item {
	payload: Arc<Payload>,
	fingerprint: Fingerprint,
}

#[derive(Debug, Default)]
struct State {
	items: IndexMap<String, Item>,
	synthesized: u64,
}

/// Named reactive container of keyed payloads.
///
/// Keyless calls address the sole item of a singular source and are rejected once the source
/// is plural. Every stored item carries its content fingerprint.
///
/// Mutations are serialized by a re-entrant writer lock that is held while subscribers run,
/// so a subscriber may read this source (or even write it again) but concurrent writers
/// from other threads wait for the whole propagation pass.
#[derive(Debug)]
pub struct Source {
	name: String,
	accepts: Option<PayloadKind>,
	max_items: Option<NonZeroUsize>,
	writer: ReentrantMutex<()>,
	state: RwLock<State>,
	updated: Signal,
}

impl Source {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			accepts: None,
			max_items: None,
			writer: ReentrantMutex::new(()),
			state: RwLock::new(State::default()),
			updated: Signal::new(),
		}
	}

	/// Restricts the source to payloads of `kind`.
	pub fn with_accepts(mut self, kind: PayloadKind) -> Self {
		self.accepts = Some(kind);
		self
	}

	/// Bounds the number of items; inserting a new key at capacity evicts the oldest item.
	pub fn with_max_items(mut self, max_items: NonZeroUsize) -> Self {
		self.max_items = Some(max_items);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn accepts(&self) -> Option<PayloadKind> {
		self.accepts
	}

	pub fn max_items(&self) -> Option<NonZeroUsize> {
		self.max_items
	}

	/// Signal fired after every successful `set`.
	pub fn updated(&self) -> &Signal {
		&self.updated
	}

	/// Stores `item` and notifies subscribers. Returns the key written.
	///
	/// Without a key: an empty source gets a freshly synthesized key, a singular source has its
	/// sole item overwritten in place, and a plural source fails with
	/// [`SourceError::MissingKey`].
	///
	/// A subscriber failure is returned after the item has been stored.
	pub fn set(&self, item: impl Into<Payload>, key: Option<&str>) -> Result<String, SourceError> {
		let _writer = self.writer.lock();
		let payload = item.into();

		if let Some(expected) = self.accepts
			&& payload.kind() != expected
		{
			return Err(SourceError::PayloadMismatch {
				source_name: self.name.clone(),
				expected,
				found: payload.kind(),
			});
		}

		let fingerprint = payload.fingerprint();
		let key = {
			let mut guard = self.state.write();
			let state = &mut *guard;
			let key = match key {
				Some(key) => key.to_string(),
				None if state.items.len() > 1 => {
					return Err(SourceError::MissingKey {
						source_name: self.name.clone(),
						count: state.items.len(),
					});
				}
				None => match state.items.first() {
					Some((sole, _)) => sole.clone(),
					None => {
						state.synthesized += 1;
						format!("item_{:05}", state.synthesized)
					}
				},
			};

			if !state.items.contains_key(&key)
				&& let Some(max) = self.max_items
				&& state.items.len() >= max.get()
				&& let Some((evicted, _)) = state.items.shift_remove_index(0)
			{
				tracing::debug!(source = %self.name, key = %evicted, "evicted oldest item");
			}

			state.items.insert(
				key.clone(),
				Item {
					payload: Arc::new(payload),
					fingerprint,
				},
			);
			key
		};

		tracing::trace!(source = %self.name, key = %key, %fingerprint, "source updated");
		self.updated.emit(&Event::keyed(&self.name, &key))?;
		Ok(key)
	}

	/// Returns the addressed item, or `None` when the source is empty or `key` is unknown.
	pub fn get(&self, key: Option<&str>) -> Result<Option<Arc<Payload>>, SourceError> {
		let state = self.state.read();
		Ok(self.address(&state, key)?.map(|item| item.payload.clone()))
	}

	/// Fingerprint of the addressed item, with the same addressing rules as [`Source::get`].
	pub fn fingerprint(&self, key: Option<&str>) -> Result<Option<Fingerprint>, SourceError> {
		let state = self.state.read();
		Ok(self.address(&state, key)?.map(|item| item.fingerprint))
	}

	fn address<'s>(&self, state: &'s State, key: Option<&str>) -> Result<Option<&'s Item>, SourceError> {
		match key {
			Some(key) => Ok(state.items.get(key)),
			None => match state.items.len() {
				0 | 1 => Ok(state.items.first().map(|(_, item)| item)),
				count => Err(SourceError::AmbiguousGet {
					source_name: self.name.clone(),
					count,
				}),
			},
		}
	}

	pub fn shape(&self) -> SourceShape {
		match self.state.read().items.len() {
			0 => SourceShape::Empty,
			1 => SourceShape::Singular,
			_ => SourceShape::Plural,
		}
	}

	pub fn len(&self) -> usize {
		self.state.read().items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.state.read().items.contains_key(key)
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> Vec<String> {
		self.state.read().items.keys().cloned().collect()
	}

	pub fn values(&self) -> Vec<Arc<Payload>> {
		self.state.read().items.values().map(|item| item.payload.clone()).collect()
	}

	pub fn items(&self) -> Vec<(String, Arc<Payload>)> {
		self.state
			.read()
			.items
			.iter()
			.map(|(k, item)| (k.clone(), item.payload.clone()))
			.collect()
	}

	pub fn fingerprints(&self) -> IndexMap<String, Fingerprint> {
		self.state
			.read()
			.items
			.iter()
			.map(|(k, item)| (k.clone(), item.fingerprint))
			.collect()
	}
}
