use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use weir_primitives::Payload;
use weir_reactive::{BoxError, Source, SourceError};

use crate::progress::Progress;


/// What [`populate`] does when a step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepPolicy {
	/// Stop and return the failure.
	#[default]
	Abort,
	/// Record the failure in the report and continue with the next step.
	Skip,
}

#[derive(Debug, thiserror::Error)]
pub enum StepError {
	#[error("producer failed: {0}")]
	Producer(BoxError),
	#[error(transparent)]
	Source(#[from] SourceError),
}

/// A step failed under [`StepPolicy::Abort`].
#[derive(Debug, thiserror::Error)]
#[error("step {step} of {total} failed after {completed} completed steps")]
pub struct PopulateError {
	/// Zero-based index of the failing step.
	pub step: usize,
	pub total: usize,
	pub completed: usize,
	#[source]
	pub cause: StepError,
}

/// Outcome of a population run that was not aborted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationReport {
	pub completed: usize,
	/// Failed steps tolerated by [`StepPolicy::Skip`], with their messages.
	pub skipped: Vec<(usize, String)>,
	/// The token was cancelled before every step ran.
	pub cancelled: bool,
}

/// Runs `steps` in order, writing each produced payload to `source` under `key`.
///
/// The token is checked before every step; a running step is never interrupted.
/// `progress` is reset and sized to the number of steps first, and marked inactive when
/// the run ends.
pub fn populate<I, F>(
	source: &Source,
	key: Option<&str>,
	steps: I,
	token: &CancellationToken,
	policy: StepPolicy,
	progress: &Progress,
) -> Result<PopulationReport, PopulateError>
where
	I: IntoIterator<Item = F>,
	F: FnOnce() -> Result<Payload, BoxError>,
{
	let steps: Vec<F> = steps.into_iter().collect();
	let total = steps.len();
	progress.reset();
	progress.set_num_tasks(NonZeroUsize::new(total).unwrap_or(NonZeroUsize::MIN));
	progress.set_active(true);

	let mut report = PopulationReport::default();
	for (step, produce) in steps.into_iter().enumerate() {
		if token.is_cancelled() {
			tracing::debug!(source = source.name(), step, total, "population cancelled");
			report.cancelled = true;
			break;
		}

		let outcome = produce()
			.map_err(StepError::Producer)
			.and_then(|payload| source.set(payload, key).map_err(StepError::from));
		match outcome {
			Ok(written) => {
				tracing::trace!(source = source.name(), step, key = %written, "population step done");
				report.completed += 1;
			}
			Err(cause) => match policy {
				StepPolicy::Abort => {
					progress.set_active(false);
					return Err(PopulateError {
						step,
						total,
						completed: report.completed,
						cause,
					});
				}
				StepPolicy::Skip => {
					tracing::warn!(source = source.name(), step, error = %cause, "skipping failed population step");
					report.skipped.push((step, cause.to_string()));
				}
			},
		}
		progress.increment();
	}

	progress.set_active(false);
	Ok(report)
}

/// Runs [`populate`] on tokio's blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_population<F>(
	source: Arc<Source>,
	key: Option<String>,
	steps: Vec<F>,
	token: CancellationToken,
	policy: StepPolicy,
	progress: Arc<Progress>,
) -> JoinHandle<Result<PopulationReport, PopulateError>>
where
	F: FnOnce() -> Result<Payload, BoxError> + Send + 'static,
{
	tracing::trace!(source = source.name(), steps = steps.len(), "spawning population");
	tokio::task::spawn_blocking(move || populate(&source, key.as_deref(), steps, &token, policy, &progress))
}
