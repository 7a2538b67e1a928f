//! Element implementations shipped with the registry.
//!
//! Concrete plotting lives in host crates; the views here keep the latest upstream state
//! and hand it over through opaque render frames.

mod controllers;
mod opts;
mod sources;
mod tools;
mod transforms;
mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use weir_reactive::{Event, PropagationError, Signal, Subscription};

pub use controllers::{PanelError, PanelFrame, TABLE_ENTRY_PANEL, TableEntryPanel};
pub use opts::{GENERIC_OPT, GenericOpt};
pub use sources::{GENERIC_SOURCE, TABLE_SOURCE};
pub use tools::{HOVER_TOOL, HoverTool};
pub use transforms::{Derived, Operation, SELECT_TRANSFORM, SORT_TRANSFORM, SelectColumns, SortRows, TABLE_TRANSFORM, TableSelect};
pub use views::{
	COMPARE_VIEW, CompareFrame, CompareView, LOGGING_VIEW, LogFrame, LoggingView, OVERLAY_VIEW, OverlayFrame, OverlayView,
	TABLE_VIEW, TableFrame, TableView,
};

use crate::def::element;
use crate::{Constructor, MainController};

element!(BASE_MAIN {
	tag: "base",
	type_name: "MainController",
	description: "Owns the element graph and instantiates control panels",
	params: &[],
	ctor: Constructor::Main(MainController::new),
});

/// Subscribes `target` to every signal through a weak reference.
fn watch<'a, T>(
	target: &Arc<T>,
	signals: impl IntoIterator<Item = &'a Signal>,
	on_update: fn(&T, &Event) -> Result<(), PropagationError>,
) -> Vec<Subscription>
where
	T: Send + Sync + 'static,
{
	signals
		.into_iter()
		.map(|signal| signal.subscribe_weak(target, on_update))
		.collect()
}
