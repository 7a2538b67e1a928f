use weir_primitives::TableError;
use weir_reactive::{PropagationError, SourceError};

/// Failure while instantiating one element from its resolved keyword arguments.
#[derive(Debug, thiserror::Error)]
pub enum ConstructError {
	#[error("{element:?}: missing required parameter {param:?}")]
	MissingParam { element: String, param: &'static str },
	#[error("{element:?}: parameter {param:?} expects {expected}, got {found}")]
	InvalidParam {
		element: String,
		param: String,
		expected: &'static str,
		found: String,
	},
	#[error("{element:?}: unexpected parameter {param:?}")]
	UnexpectedParam { element: String, param: String },
	#[error("{0}")]
	InvalidConfiguration(String),
	#[error(transparent)]
	Table(#[from] TableError),
	#[error(transparent)]
	Source(#[from] SourceError),
	#[error(transparent)]
	Propagation(#[from] PropagationError),
}
