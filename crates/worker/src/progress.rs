use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};


const DEFAULT_TASKS: usize = 10;

/// Shared completion counter of a multi-step job.
#[derive(Debug)]
pub struct Progress {
	completed: AtomicUsize,
	num_tasks: AtomicUsize,
	active: AtomicBool,
}

impl Default for Progress {
	fn default() -> Self {
		Self {
			completed: AtomicUsize::new(0),
			num_tasks: AtomicUsize::new(DEFAULT_TASKS),
			active: AtomicBool::new(false),
		}
	}
}

impl Progress {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn completed(&self) -> usize {
		self.completed.load(Ordering::Acquire)
	}

	pub fn num_tasks(&self) -> usize {
		self.num_tasks.load(Ordering::Acquire)
	}

	pub fn set_num_tasks(&self, num_tasks: NonZeroUsize) {
		self.num_tasks.store(num_tasks.get(), Ordering::Release);
	}

	pub fn is_active(&self) -> bool {
		self.active.load(Ordering::Acquire)
	}

	pub fn set_active(&self, active: bool) {
		self.active.store(active, Ordering::Release);
	}

	pub fn increment(&self) {
		self.completed.fetch_add(1, Ordering::AcqRel);
	}

	pub fn reset(&self) {
		self.completed.store(0, Ordering::Release);
	}

	/// Completion percentage in `0..=100`, or `-1` while active with nothing to show yet.
	pub fn value(&self) -> i32 {
		let num_tasks = self.num_tasks().max(1);
		let percent = (self.completed().saturating_mul(100) / num_tasks).min(100) as i32;
		if percent == 0 && self.is_active() { -1 } else { percent }
	}
}
