//! Reactive data plumbing.
//!
//! A [`Source`] is a named, keyed container that fingerprints every item it stores and fires
//! its [`Signal`] on each mutation. Downstream elements subscribe to that signal and
//! recompute through a shared [`Cache`]. Propagation is synchronous: by the time
//! [`Source::set`] returns, every transitive subscriber has run.

/// Content-addressed memoization.
pub mod cache;
/// Typed "updated" signal and subscription guards.
pub mod signal;
/// Keyed reactive container.
pub mod source;

pub use cache::{Cache, CacheKey, CacheStats, Cached};
pub use signal::{BoxError, Event, PropagationError, Signal, Subscription};
pub use source::{Source, SourceError, SourceShape};
