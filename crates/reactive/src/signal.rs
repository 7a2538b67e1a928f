use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;


/// Boxed error carried across element boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Callback = Arc<dyn Fn(&Event) -> Result<(), PropagationError> + Send + Sync>;

/// An "updated" notification.
///
/// The chain lists element names from the mutation point to the current emitter. Events
/// started by a keyed write carry the key written at the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	chain: Vec<Arc<str>>,
	key: Option<Arc<str>>,
}

impl Event {
	pub fn new(origin: &str) -> Self {
		Self {
			chain: vec![Arc::from(origin)],
			key: None,
		}
	}

	/// Event of a write that stored an item under `key`.
	pub fn keyed(origin: &str, key: &str) -> Self {
		Self {
			chain: vec![Arc::from(origin)],
			key: Some(Arc::from(key)),
		}
	}

	/// Key written at the origin, if the mutation was a keyed write.
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	/// Name of the element whose mutation started this propagation pass.
	pub fn origin(&self) -> &str {
		&self.chain[0]
	}

	/// Name of the element that emitted this event.
	pub fn emitter(&self) -> &str {
		&self.chain[self.chain.len() - 1]
	}

	pub fn chain(&self) -> impl Iterator<Item = &str> {
		self.chain.iter().map(|s| &**s)
	}

	/// Returns the event re-emitted by `by` after it handled `self`.
	pub fn forwarded(&self, by: &str) -> Self {
		let mut chain = self.chain.clone();
		chain.push(Arc::from(by));
		Self {
			chain,
			key: self.key.clone(),
		}
	}
}

/// A subscriber failed while handling an update.
///
/// The failure is not caught anywhere in the graph; it surfaces to whoever triggered the
/// mutation.
#[derive(Debug, thiserror::Error)]
#[error("update of {element:?} failed (chain: {})", .chain.join(" -> "))]
pub struct PropagationError {
	pub element: String,
	pub chain: Vec<String>,
	#[source]
	pub cause: BoxError,
}

impl PropagationError {
	/// Builds the error for `element` failing while handling `event`.
	pub fn new(element: &str, event: &Event, cause: impl Into<BoxError>) -> Self {
		let mut chain: Vec<String> = event.chain().map(str::to_string).collect();
		chain.push(element.to_string());
		Self {
			element: element.to_string(),
			chain,
			cause: cause.into(),
		}
	}
}

#[derive(Default)]
struct Subscribers {
	next_id: u64,
	entries: Vec<(u64, Callback)>,
}

/// Publisher side of an "updated" event.
///
/// Subscribers run synchronously, in subscription order, on the emitting thread. The first
/// failure stops the fan-out and is returned to the emitter.
#[derive(Default)]
pub struct Signal {
	subscribers: Arc<Mutex<Subscribers>>,
}

impl Signal {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `callback`; it stays registered until the returned guard is dropped.
	#[must_use = "dropping the subscription unsubscribes immediately"]
	pub fn subscribe<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&Event) -> Result<(), PropagationError> + Send + Sync + 'static,
	{
		let mut subs = self.subscribers.lock();
		subs.next_id += 1;
		let id = subs.next_id;
		subs.entries.push((id, Arc::new(callback)));
		Subscription {
			id,
			signal: Arc::downgrade(&self.subscribers),
		}
	}

	/// Subscribes on behalf of `target` without keeping it alive.
	///
	/// Once `target` is dropped the callback becomes a no-op.
	#[must_use = "dropping the subscription unsubscribes immediately"]
	pub fn subscribe_weak<T, F>(&self, target: &Arc<T>, callback: F) -> Subscription
	where
		T: ?Sized + Send + Sync + 'static,
		F: Fn(&T, &Event) -> Result<(), PropagationError> + Send + Sync + 'static,
	{
		let weak: Weak<T> = Arc::downgrade(target);
		self.subscribe(move |event| match weak.upgrade() {
			Some(target) => callback(&*target, event),
			None => Ok(()),
		})
	}

	/// Notifies every subscriber of `event`.
	pub fn emit(&self, event: &Event) -> Result<(), PropagationError> {
		let callbacks: Vec<Callback> = self
			.subscribers
			.lock()
			.entries
			.iter()
			.map(|(_, cb)| cb.clone())
			.collect();
		for callback in callbacks {
			callback(event)?;
		}
		Ok(())
	}

	pub fn subscriber_count(&self) -> usize {
		self.subscribers.lock().entries.len()
	}
}

impl fmt::Debug for Signal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}

/// Guard for one registered callback. Dropping it unsubscribes.
pub struct Subscription {
	id: u64,
	signal: Weak<Mutex<Subscribers>>,
}

impl Subscription {
	/// Unsubscribes now. Equivalent to dropping the guard.
	pub fn unsubscribe(self) {}

	/// Returns true while the signal this guard belongs to is alive.
	pub fn is_attached(&self) -> bool {
		self.signal.strong_count() > 0
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(subscribers) = self.signal.upgrade() {
			subscribers.lock().entries.retain(|(id, _)| *id != self.id);
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("id", &self.id).finish()
	}
}
