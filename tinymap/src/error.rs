//! Typed errors for the fatal conditions callers may want to react to.
//!
//! All functions of this crate return [`anyhow::Result`]; these errors are put into the chain, so use
//! [`anyhow::Error::downcast_ref`] to look for them.

use thiserror::Error;

/// The input matches none of the known mapping dialects.
#[derive(Debug, Error)]
#[error("unsupported mapping format: header {header:?} matches no known dialect")]
pub struct UnsupportedFormatError {
	pub header: String,
}

/// A namespace was requested that the mappings don't have.
#[derive(Debug, Error)]
#[error("cannot find namespace {namespace:?}, only got {available:?}")]
pub struct NamespaceNotFoundError {
	pub namespace: String,
	pub available: Vec<String>,
}

/// Two mappings don't share exactly one namespace, and therefore can't be merged.
#[derive(Debug, Error)]
#[error("cannot merge mappings with namespaces {left:?} and {right:?}: expected exactly one shared namespace, got {shared:?}")]
pub struct IncompatibleMergeError {
	pub left: Vec<String>,
	pub right: Vec<String>,
	pub shared: Vec<String>,
}
