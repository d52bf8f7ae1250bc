use thiserror::Error;

/// The requested operation isn't supported for these inputs, like legacy mappings for a split game jar.
#[derive(Debug, Error)]
#[error("unsupported operation: {message}")]
pub struct UnsupportedOperationError {
	pub message: String,
}

impl UnsupportedOperationError {
	pub fn new(message: impl Into<String>) -> UnsupportedOperationError {
		UnsupportedOperationError { message: message.into() }
	}
}

/// An operation was called in a state that doesn't allow it, like reading inputs after remapping started.
#[derive(Debug, Error)]
#[error("illegal state: {message}")]
pub struct IllegalStateError {
	pub message: String,
}

impl IllegalStateError {
	pub fn new(message: impl Into<String>) -> IllegalStateError {
		IllegalStateError { message: message.into() }
	}
}
